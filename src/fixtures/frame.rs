//! Where fixtures go relative to the plate.
//!
//! All locations are offsets from the plate origin in mesh units; `H` is
//! the solid's full height (emboss + base) and `P` the depth of the edge
//! plate (the name plate height when one is requested, else the border).

use std::f64::consts::{FRAC_PI_2, PI};

use serde::Serialize;

use crate::config::{ExternalEdge, ReliefRequest};
use crate::geom::{PlateDimensions, Transform, Vec3};

/// A location and a rotation about the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub offset: [f64; 3],
    /// Radians about +Z.
    pub rotation_z: f64,
}

impl Placement {
    #[must_use]
    pub fn new(offset: Vec3, rotation_z: f64) -> Self {
        Self {
            offset: offset.to_array(),
            rotation_z,
        }
    }

    #[must_use]
    pub fn offset(&self) -> Vec3 {
        Vec3::from_array(self.offset)
    }

    /// World basis for a fixture built against the plate frame `frame`
    /// (the plate's unrotated world matrix).
    #[must_use]
    pub fn basis(&self, frame: Transform) -> Transform {
        frame * Transform::translate(self.offset()) * Transform::rotate_z(self.rotation_z)
    }
}

/// Rotation applied to the wedge and back frames for an external edge.
#[must_use]
pub fn edge_rotation(edge: ExternalEdge) -> f64 {
    match edge {
        ExternalEdge::None | ExternalEdge::Top => 0.0,
        ExternalEdge::Bottom => PI,
        ExternalEdge::Right => -FRAC_PI_2,
        ExternalEdge::Left => FRAC_PI_2,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureLayout {
    pub edge: ExternalEdge,
    pub lx: f64,
    pub ly: f64,
    /// `P`: name plate height, or the border width without a name plate.
    pub plate_y: f64,
    /// Plate height plus the name plate, if any.
    pub size_y: f64,
    /// Length of the edge the edge plate runs along.
    pub edge_size_x: f64,
    /// Edge plate or name plate frame.
    pub edge_plate: Placement,
    /// Present only for an external edge.
    pub wedge: Option<Placement>,
    /// Main back frame.
    pub frame: Placement,
    /// Back frame under the edge plate, external edge only.
    pub edge_frame: Option<Placement>,
}

impl FixtureLayout {
    /// `dims` and every request length are in mesh units.
    #[must_use]
    pub fn compute(request: &ReliefRequest, dims: PlateDimensions) -> Self {
        let PlateDimensions { lx, ly, .. } = dims;
        let w = request.border_width;
        let h = request.total_height();
        let name_y = request.name_plate_y;

        let (plate_y, size_y) = if request.name_plate {
            (name_y, ly + name_y)
        } else {
            (w, ly)
        };
        let edge = request.external_edge;
        let frame_rotation = edge_rotation(edge);
        let lift = 3.0 + request.gap_size + 0.5 * h;

        if edge == ExternalEdge::None {
            let frame_y = if request.name_plate { 0.5 * name_y } else { 0.0 };
            return Self {
                edge,
                lx,
                ly,
                plate_y,
                size_y,
                edge_size_x: lx,
                edge_plate: Placement::new(
                    Vec3::new(0.0, 0.5 * ly + 0.5 * name_y - 0.25 * w, -0.5 * h),
                    0.0,
                ),
                wedge: None,
                frame: Placement::new(Vec3::new(0.0, frame_y, -h), frame_rotation),
                edge_frame: None,
            };
        }

        let (wedge_offset, edge_offset, edge_plate_rotation, edge_size_x) = match edge {
            ExternalEdge::Top => (
                Vec3::new(0.0, 0.5 * ly, -request.emboss_height),
                Vec3::new(0.0, 0.5 * (plate_y - ly), lift),
                PI,
                lx,
            ),
            ExternalEdge::Bottom => (
                Vec3::new(0.0, -0.5 * ly, -request.emboss_height),
                Vec3::new(0.0, 0.5 * (ly - plate_y), lift),
                0.0,
                lx,
            ),
            ExternalEdge::Right => (
                Vec3::new(0.5 * lx, 0.0, -request.emboss_height),
                Vec3::new(0.5 * (plate_y - lx), 0.0, lift),
                FRAC_PI_2,
                ly,
            ),
            ExternalEdge::Left | ExternalEdge::None => (
                Vec3::new(-0.5 * lx, 0.0, -request.emboss_height),
                Vec3::new(0.5 * (lx - plate_y), 0.0, lift),
                -FRAC_PI_2,
                ly,
            ),
        };

        Self {
            edge,
            lx,
            ly,
            plate_y,
            size_y,
            edge_size_x,
            edge_plate: Placement::new(edge_offset, edge_plate_rotation),
            wedge: Some(Placement::new(wedge_offset, frame_rotation)),
            frame: Placement::new(Vec3::new(0.0, 0.0, -h), frame_rotation),
            edge_frame: Some(Placement::new(
                edge_offset + Vec3::new(0.0, 0.0, -0.5 * h),
                frame_rotation,
            )),
        }
    }
}
