//! Auxiliary solids attached to the relief plate.
//!
//! The registry owns every fixture under a stable [`FixtureId`]. Each
//! regeneration computes the full desired set from the request, replaces
//! what exists and drops ids that are no longer wanted, so nothing from an
//! earlier configuration survives.
//!
//! Fixtures record the world basis they were created at plus the inverse of
//! their parent's world matrix at that moment. Their current world matrix is
//! `parent_world * parent_inverse * basis`, which carries them rigidly with
//! later motion of the parent.

mod frame;
mod shapes;

use std::collections::BTreeMap;
use std::f64::consts::PI;

use serde::Serialize;
use thiserror::Error;

use crate::config::{ExternalEdge, ReliefRequest};
use crate::geom::{MeshError, PolyMesh, Transform, Vec3};
use crate::plate::Plate;

pub use frame::{FixtureLayout, Placement, edge_rotation};
pub use shapes::{back_frame, flat_plate, notched_plate, wedge};

/// Height of the extruded name text.
pub const TEXT_EXTRUDE: f64 = 1.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FixtureError {
    #[error("`{0}` has a singular world transform")]
    SingularTransform(String),
    #[error("fixture `{fixture}` refers to missing parent `{parent}`")]
    MissingParent { fixture: String, parent: String },
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Logical fixture slots, one instance each per plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FixtureId {
    Wedge,
    NamePlate,
    NameText,
    BackFrame,
    NamePlateBackFrame,
}

impl FixtureId {
    pub const ALL: [Self; 5] = [
        Self::Wedge,
        Self::NamePlate,
        Self::NameText,
        Self::BackFrame,
        Self::NamePlateBackFrame,
    ];

    #[must_use]
    pub fn object_name(self, plate_name: &str) -> String {
        let suffix = match self {
            Self::Wedge => "wedge",
            Self::NamePlate => "Plate",
            Self::NameText => "FontObject",
            Self::BackFrame => "BackFrameObject",
            Self::NamePlateBackFrame => "PlateBackFrameObject",
        };
        format!("{plate_name}_{suffix}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureParent {
    Plate,
    Fixture(FixtureId),
}

#[derive(Debug, Clone)]
pub enum FixtureGeometry {
    Solid(PolyMesh),
    /// Text body to be meshed by a font backend.
    Text { body: String, size: f64, extrude: f64 },
}

#[derive(Debug, Clone)]
pub struct Fixture {
    pub id: FixtureId,
    pub name: String,
    pub parent: FixtureParent,
    /// World matrix at creation.
    pub basis: Transform,
    /// Inverse of the parent's world matrix at creation.
    pub parent_inverse: Transform,
    pub geometry: FixtureGeometry,
}

impl Fixture {
    #[must_use]
    pub fn mesh(&self) -> Option<&PolyMesh> {
        match &self.geometry {
            FixtureGeometry::Solid(mesh) => Some(mesh),
            FixtureGeometry::Text { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixtureRegistry {
    fixtures: BTreeMap<FixtureId, Fixture>,
}

impl FixtureRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: FixtureId) -> Option<&Fixture> {
        self.fixtures.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fixture> {
        self.fixtures.values()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.fixtures.values().map(|f| f.name.clone()).collect()
    }

    pub fn remove(&mut self, id: FixtureId) -> Option<Fixture> {
        self.fixtures.remove(&id)
    }

    pub fn clear(&mut self) {
        self.fixtures.clear();
    }

    /// Rebuilds the fixture set for `plate` from scratch. `layout` must be
    /// computed from the same request, in mesh units; the plate's scale is
    /// applied through its unrotated world matrix.
    pub fn regenerate(
        &mut self,
        plate: &Plate,
        request: &ReliefRequest,
        layout: &FixtureLayout,
    ) -> Result<Vec<String>, FixtureError> {
        let frame = plate.unrotated_world_matrix();
        let plate_inverse = frame
            .inverse()
            .ok_or_else(|| FixtureError::SingularTransform(plate.name.clone()))?;
        let h = request.total_height();
        let w = request.border_width;

        let mut desired: BTreeMap<FixtureId, Fixture> = BTreeMap::new();
        let mut insert = |id: FixtureId,
                          parent: FixtureParent,
                          basis: Transform,
                          parent_inverse: Transform,
                          geometry: FixtureGeometry| {
            desired.insert(
                id,
                Fixture {
                    id,
                    name: id.object_name(&plate.name),
                    parent,
                    basis,
                    parent_inverse,
                    geometry,
                },
            );
        };

        let edge_basis = layout.edge_plate.basis(frame);
        let name_plate = match (layout.edge, layout.wedge) {
            (ExternalEdge::None, _) | (_, None) if !request.name_plate => None,
            (ExternalEdge::None, _) | (_, None) => Some((
                edge_basis,
                flat_plate([layout.edge_size_x, request.name_plate_y + 0.5 * w, h])?,
            )),
            (_, Some(wedge_at)) => {
                insert(
                    FixtureId::Wedge,
                    FixtureParent::Plate,
                    wedge_at.basis(frame),
                    plate_inverse,
                    FixtureGeometry::Solid(wedge(layout.edge_size_x, w, request.base_height)?),
                );
                Some((
                    edge_basis * Transform::rotate_z(PI),
                    notched_plate([layout.edge_size_x, layout.plate_y, h], w, request.base_height)?,
                ))
            }
        };

        let mut name_plate_inverse = None;
        if let Some((basis, mesh)) = name_plate {
            let inverse = basis.inverse().ok_or_else(|| {
                FixtureError::SingularTransform(FixtureId::NamePlate.object_name(&plate.name))
            })?;
            name_plate_inverse = Some(inverse);
            insert(
                FixtureId::NamePlate,
                FixtureParent::Plate,
                basis,
                plate_inverse,
                FixtureGeometry::Solid(mesh),
            );
            if request.name_plate && !request.name_plate_text.is_empty() {
                let text_at = Placement::new(
                    layout.edge_plate.offset() + Vec3::new(0.0, 0.0, 0.5 * h),
                    layout.edge_plate.rotation_z,
                );
                insert(
                    FixtureId::NameText,
                    FixtureParent::Fixture(FixtureId::NamePlate),
                    text_at.basis(frame),
                    inverse,
                    FixtureGeometry::Text {
                        body: request.name_plate_text.clone(),
                        size: request.name_plate_text_size,
                        extrude: TEXT_EXTRUDE,
                    },
                );
            }
        }

        if request.back_frame {
            let closed = layout.edge == ExternalEdge::None;
            let size_y = if closed { layout.size_y } else { layout.ly };
            insert(
                FixtureId::BackFrame,
                FixtureParent::Plate,
                layout.frame.basis(frame),
                plate_inverse,
                FixtureGeometry::Solid(back_frame(layout.lx, size_y, w, request.gap_size, closed)?),
            );
            if let (Some(edge_frame), Some(inverse)) = (layout.edge_frame, name_plate_inverse) {
                insert(
                    FixtureId::NamePlateBackFrame,
                    FixtureParent::Fixture(FixtureId::NamePlate),
                    edge_frame.basis(frame),
                    inverse,
                    FixtureGeometry::Solid(back_frame(
                        layout.lx,
                        layout.plate_y,
                        w,
                        request.gap_size,
                        false,
                    )?),
                );
            }
        }

        for id in FixtureId::ALL {
            if !desired.contains_key(&id) && self.fixtures.remove(&id).is_some() {
                log::debug!("removed fixture {}", id.object_name(&plate.name));
            }
        }
        self.fixtures.extend(desired);
        log::debug!("regenerated {} fixtures for `{}`", self.fixtures.len(), plate.name);
        Ok(self.names())
    }

    /// Current world matrix of `id` given the plate's present transform.
    pub fn world_transform(&self, id: FixtureId, plate: &Plate) -> Result<Transform, FixtureError> {
        let fixture = self
            .fixtures
            .get(&id)
            .ok_or_else(|| FixtureError::MissingParent {
                fixture: id.object_name(&plate.name),
                parent: plate.name.clone(),
            })?;
        let parent_world = match fixture.parent {
            FixtureParent::Plate => plate.world_matrix(),
            FixtureParent::Fixture(parent) if self.fixtures.contains_key(&parent) => {
                self.world_transform(parent, plate)?
            }
            FixtureParent::Fixture(parent) => {
                return Err(FixtureError::MissingParent {
                    fixture: fixture.name.clone(),
                    parent: parent.object_name(&plate.name),
                });
            }
        };
        Ok(parent_world * fixture.parent_inverse * fixture.basis)
    }

    /// The fixture's solid in world space; `None` for text fixtures.
    pub fn world_mesh(&self, id: FixtureId, plate: &Plate) -> Result<Option<PolyMesh>, FixtureError> {
        let Some(mesh) = self.fixtures.get(&id).and_then(Fixture::mesh) else {
            return Ok(None);
        };
        let world = self.world_transform(id, plate)?;
        let positions = mesh.positions.iter().map(|&p| world.apply_point(p)).collect();
        Ok(Some(mesh.with_positions(positions)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{PlateDimensions, Point3, Tolerance};

    fn setup(request: &ReliefRequest) -> (Plate, FixtureLayout) {
        let mut plate = Plate::image_plane("galaxy", 112, 132, 132.0).unwrap();
        plate.location = Point3::new(5.0, -2.0, 1.0);
        let layout = FixtureLayout::compute(request, PlateDimensions::new(112.0, 132.0));
        (plate, layout)
    }

    #[test]
    fn default_request_builds_closed_back_frame_only() {
        let request = ReliefRequest::default();
        let (plate, layout) = setup(&request);
        let mut registry = FixtureRegistry::new();
        let names = registry.regenerate(&plate, &request, &layout).unwrap();
        assert_eq!(names, vec!["galaxy_BackFrameObject".to_owned()]);
        let frame = registry.get(FixtureId::BackFrame).unwrap();
        assert_eq!(frame.mesh().unwrap().face_count(), 24);
    }

    #[test]
    fn external_edge_with_name_builds_full_set() {
        let request = ReliefRequest {
            external_edge: ExternalEdge::Top,
            name_plate: true,
            ..ReliefRequest::default()
        };
        let (plate, layout) = setup(&request);
        let mut registry = FixtureRegistry::new();
        registry.regenerate(&plate, &request, &layout).unwrap();
        assert_eq!(registry.len(), 5);
        assert_eq!(
            registry.get(FixtureId::NameText).unwrap().parent,
            FixtureParent::Fixture(FixtureId::NamePlate)
        );
        assert_eq!(
            registry.get(FixtureId::NamePlateBackFrame).unwrap().parent,
            FixtureParent::Fixture(FixtureId::NamePlate)
        );
    }

    #[test]
    fn regeneration_drops_fixtures_no_longer_requested() {
        let full = ReliefRequest {
            external_edge: ExternalEdge::Left,
            name_plate: true,
            ..ReliefRequest::default()
        };
        let (plate, layout) = setup(&full);
        let mut registry = FixtureRegistry::new();
        registry.regenerate(&plate, &full, &layout).unwrap();

        let bare = ReliefRequest {
            back_frame: false,
            ..ReliefRequest::default()
        };
        let layout = FixtureLayout::compute(&bare, PlateDimensions::new(112.0, 132.0));
        let names = registry.regenerate(&plate, &bare, &layout).unwrap();
        assert!(names.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn fixtures_start_at_their_creation_basis() {
        let request = ReliefRequest {
            external_edge: ExternalEdge::Bottom,
            name_plate: true,
            ..ReliefRequest::default()
        };
        let (plate, layout) = setup(&request);
        let mut registry = FixtureRegistry::new();
        registry.regenerate(&plate, &request, &layout).unwrap();
        for fixture in registry.iter() {
            let world = registry.world_transform(fixture.id, &plate).unwrap();
            assert!(world.approx_eq(fixture.basis, Tolerance::LOOSE), "{}", fixture.name);
        }
    }

    #[test]
    fn missing_parent_is_reported() {
        let request = ReliefRequest {
            external_edge: ExternalEdge::Right,
            name_plate: true,
            ..ReliefRequest::default()
        };
        let (plate, layout) = setup(&request);
        let mut registry = FixtureRegistry::new();
        registry.regenerate(&plate, &request, &layout).unwrap();
        registry.remove(FixtureId::NamePlate);
        assert!(matches!(
            registry.world_transform(FixtureId::NameText, &plate),
            Err(FixtureError::MissingParent { .. })
        ));
    }
}
