//! The working plate: its mesh, object transform and modifier stack.

use thiserror::Error;

use crate::geom::{
    DisplacementError, DisplacementStage, MeshError, PlateDimensions, Point3, PolyMesh,
    SmoothingStage, Tolerance, Transform, Vec3,
};

/// Default plane height used when importing an image as a plate.
pub const DEFAULT_PLANE_HEIGHT: f64 = 112.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlateError {
    #[error("plate `{name}` has non-uniform scale ({x}, {y}, {z})")]
    NonUniformScale { name: String, x: f64, y: f64, z: f64 },
    #[error("plate needs two boundary edges to measure, found {0} edges")]
    MissingEdges(usize),
    #[error("plate edges are zero-length or parallel")]
    DegenerateAxes,
    #[error("image plane needs positive pixel size and height")]
    InvalidImageSize,
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// A stage on the plate's non-destructive stack.
#[derive(Debug, Clone)]
pub enum Modifier {
    Displace(DisplacementStage),
    Smooth(SmoothingStage),
}

impl Modifier {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Displace(stage) => &stage.name,
            Self::Smooth(_) => crate::geom::SMOOTHING_STAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluateOptions {
    pub skip_smoothing: bool,
}

/// Ordered stages, unique by name.
#[derive(Debug, Clone, Default)]
pub struct ModifierStack {
    modifiers: Vec<Modifier>,
}

impl ModifierStack {
    /// Replaces the stage with the same name in place, or appends.
    pub fn set(&mut self, modifier: Modifier) {
        match self.modifiers.iter().position(|m| m.name() == modifier.name()) {
            Some(index) => self.modifiers[index] = modifier,
            None => self.modifiers.push(modifier),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Modifier> {
        let index = self.modifiers.iter().position(|m| m.name() == name)?;
        Some(self.modifiers.remove(index))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Modifier> {
        self.modifiers.iter().find(|m| m.name() == name)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.modifiers.iter().map(Modifier::name).collect()
    }

    /// Runs every stage in order over a copy of `mesh`'s positions.
    pub fn evaluate(
        &self,
        mesh: &PolyMesh,
        options: EvaluateOptions,
    ) -> Result<Vec<Point3>, DisplacementError> {
        let mut positions = mesh.positions.clone();
        for modifier in &self.modifiers {
            match modifier {
                Modifier::Displace(stage) => {
                    let displaced = stage.evaluate(mesh)?;
                    // offsets accumulate over earlier stages
                    for ((p, d), b) in positions.iter_mut().zip(&displaced).zip(&mesh.positions) {
                        *p = *p + (*d - *b);
                    }
                }
                Modifier::Smooth(stage) if !options.skip_smoothing => stage.apply(mesh, &mut positions),
                Modifier::Smooth(_) => {}
            }
        }
        Ok(positions)
    }
}

#[derive(Debug, Clone)]
pub struct Plate {
    pub name: String,
    pub location: Point3,
    /// XYZ euler angles in radians.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub mesh: PolyMesh,
    pub stack: ModifierStack,
}

impl Plate {
    #[must_use]
    pub fn new(name: impl Into<String>, mesh: PolyMesh) -> Self {
        Self {
            name: name.into(),
            location: Point3::ORIGIN,
            rotation: Vec3::ZERO,
            scale: Vec3::new(1.0, 1.0, 1.0),
            mesh,
            stack: ModifierStack::default(),
        }
    }

    /// Single quad `plane_height` tall, width following the pixel aspect,
    /// centred on the origin with UVs over `[0, 1]^2` and normal +Z.
    pub fn image_plane(
        name: impl Into<String>,
        width_px: u32,
        height_px: u32,
        plane_height: f64,
    ) -> Result<Self, PlateError> {
        if width_px == 0 || height_px == 0 || !plane_height.is_finite() || plane_height <= 0.0 {
            return Err(PlateError::InvalidImageSize);
        }
        let hy = 0.5 * plane_height;
        let hx = hy * f64::from(width_px) / f64::from(height_px);
        let mesh = PolyMesh::new(
            vec![
                Point3::new(-hx, -hy, 0.0),
                Point3::new(hx, -hy, 0.0),
                Point3::new(hx, hy, 0.0),
                Point3::new(-hx, hy, 0.0),
            ],
            Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
            vec![vec![0, 1, 2, 3]],
        )?;
        Ok(Self::new(name, mesh))
    }

    /// The common scale factor, or an error when the axes differ.
    pub fn uniform_scale(&self) -> Result<f64, PlateError> {
        let Vec3 { x, y, z } = self.scale;
        let tol = Tolerance::DEFAULT;
        if tol.approx_eq_f64(x, y) && tol.approx_eq_f64(y, z) && x.is_finite() && x != 0.0 {
            Ok(x)
        } else {
            Err(PlateError::NonUniformScale {
                name: self.name.clone(),
                x,
                y,
                z,
            })
        }
    }

    /// Extents from mesh edges 0 and 1, in mesh units. The edge closer to
    /// the X axis gives `lx`.
    pub fn dimensions(&self) -> Result<PlateDimensions, PlateError> {
        let edges = self.mesh.edges();
        if edges.len() < 2 {
            return Err(PlateError::MissingEdges(edges.len()));
        }
        let direction = |i: usize| {
            let (a, b) = edges[i].vertices;
            self.mesh.positions[b] - self.mesh.positions[a]
        };
        let (first, second) = (direction(0), direction(1));
        let (len0, len1) = (first.length(), second.length());
        let tol = Tolerance::ZERO_LENGTH;
        if tol.is_zero_length(len0) || tol.is_zero_length(len1) {
            return Err(PlateError::DegenerateAxes);
        }
        if first.cross(second).length() <= Tolerance::LOOSE.eps * len0 * len1 {
            return Err(PlateError::DegenerateAxes);
        }

        let x_from_first_edge = first.x.abs() / len0 >= second.x.abs() / len1;
        let (lx, ly) = if x_from_first_edge { (len0, len1) } else { (len1, len0) };
        Ok(PlateDimensions {
            lx,
            ly,
            x_from_first_edge,
        })
    }

    /// Centre of the mesh bounds, in mesh units.
    #[must_use]
    pub fn center(&self) -> Point3 {
        self.mesh
            .bounding_box()
            .map_or(Point3::ORIGIN, |b| b.min.lerp(b.max, 0.5))
    }

    /// `T * R * S`.
    #[must_use]
    pub fn world_matrix(&self) -> Transform {
        Transform::from_loc_rot_scale(self.location, self.rotation, self.scale)
    }

    /// `T * S`: the frame fixtures are built against.
    #[must_use]
    pub fn unrotated_world_matrix(&self) -> Transform {
        Transform::from_loc_rot_scale(self.location, Vec3::ZERO, self.scale)
    }

    /// Positions after the modifier stack.
    pub fn evaluate(&self, options: EvaluateOptions) -> Result<Vec<Point3>, DisplacementError> {
        self.stack.evaluate(&self.mesh, options)
    }

    /// Copy of the mesh with the full stack applied.
    pub fn evaluated_mesh(&self) -> Result<PolyMesh, crate::ReliefError> {
        let positions = self.evaluate(EvaluateOptions::default())?;
        Ok(self.mesh.with_positions(positions)?)
    }
}
