//! Edit-region discovery.
//!
//! Mesh edits that need an operating context run through the first region
//! that accepts them. A region that reports [`RegionError::NotApplicable`]
//! is skipped; any other failure is final. Running out of regions is
//! [`ContextError::NoUsableContext`].

use thiserror::Error;

use crate::geom::{GridCuts, MeshError, PlateDimensions, PolyMesh, subdivide_grid};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegionError {
    #[error("region `{0}` cannot run this operation")]
    NotApplicable(String),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContextError {
    #[error("no usable edit region among {tried} candidates")]
    NoUsableContext { tried: usize },
    #[error("region `{region}` failed: {source}")]
    Failed {
        region: String,
        #[source]
        source: MeshError,
    },
}

/// A place mesh edits can be carried out.
pub trait EditRegion {
    fn label(&self) -> &str;

    /// Applies edge-loop cuts to a single-quad plate.
    fn loop_cut(
        &self,
        mesh: &mut PolyMesh,
        cuts: GridCuts,
        dims: PlateDimensions,
    ) -> Result<(), RegionError>;
}

/// In-process region that edits the mesh directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRegion;

impl EditRegion for LocalRegion {
    fn label(&self) -> &str {
        "local"
    }

    fn loop_cut(
        &self,
        mesh: &mut PolyMesh,
        cuts: GridCuts,
        dims: PlateDimensions,
    ) -> Result<(), RegionError> {
        subdivide_grid(mesh, cuts, dims)?;
        Ok(())
    }
}

/// Runs `op` in the first region that does not decline it and returns the
/// result together with that region's label.
pub fn with_first_region<T>(
    regions: &[&dyn EditRegion],
    mut op: impl FnMut(&dyn EditRegion) -> Result<T, RegionError>,
) -> Result<(T, String), ContextError> {
    for region in regions {
        match op(*region) {
            Ok(value) => return Ok((value, region.label().to_owned())),
            Err(RegionError::NotApplicable(reason)) => {
                log::debug!("skipping region `{}`: {reason}", region.label());
            }
            Err(RegionError::Mesh(source)) => {
                return Err(ContextError::Failed {
                    region: region.label().to_owned(),
                    source,
                });
            }
        }
    }
    Err(ContextError::NoUsableContext {
        tried: regions.len(),
    })
}
