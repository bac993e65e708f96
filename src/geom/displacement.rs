//! Non-destructive height displacement driven by an image and a weight
//! channel.
//!
//! The stage never edits the base mesh. Evaluating it yields displaced
//! positions:
//!
//! ```text
//! z' = z + (sample(uv) - mid_level) * strength * weight
//! ```
//!
//! ```ignore
//! let stage = DisplacementStage::bind("m51", image, &request.displacement_params());
//! let displaced = stage.evaluate(&plate.mesh)?;
//! ```

use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use serde::Serialize;
use thiserror::Error;

use super::core::Point3;
use super::mesh::PolyMesh;
use super::weights::{EMBOSS_CHANNEL, WeightMap};
use crate::image::HeightImage;

/// Stage name on the plate's modifier stack.
pub const DISPLACEMENT_STAGE: &str = "bump";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DisplacementError {
    #[error("displacement needs weight channel `{0}`")]
    MissingWeightChannel(String),
    #[error("weight channel covers {weights} vertices but the mesh has {vertices}")]
    WeightCountMismatch { weights: usize, vertices: usize },
    #[error("mesh has {uvs} uvs for {vertices} vertices")]
    UvCountMismatch { uvs: usize, vertices: usize },
}

/// Axis the offset is applied along, in mesh coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DisplaceDirection {
    X,
    Y,
    #[default]
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacementParams {
    pub emboss_height: f64,
    pub invert: bool,
    /// Box filter width in pixels, at least 1.
    pub filter_size: f64,
}

impl DisplacementParams {
    /// `+1` normally, `-1` when inverted.
    #[must_use]
    pub fn sign(&self) -> f64 {
        if self.invert { -1.0 } else { 1.0 }
    }
}

#[derive(Debug, Clone)]
pub struct DisplacementStage {
    pub name: String,
    /// Texture slot, `Displacement_<plate>`.
    pub texture: String,
    pub image: Arc<HeightImage>,
    pub weight_channel: String,
    pub direction: DisplaceDirection,
    pub strength: f64,
    pub mid_level: f64,
    pub filter_size: f64,
}

impl DisplacementStage {
    #[must_use]
    pub fn bind(plate_name: &str, image: Arc<HeightImage>, params: &DisplacementParams) -> Self {
        let sign = params.sign();
        Self {
            name: DISPLACEMENT_STAGE.to_owned(),
            texture: format!("Displacement_{plate_name}"),
            image,
            weight_channel: EMBOSS_CHANNEL.to_owned(),
            direction: DisplaceDirection::Z,
            strength: params.emboss_height * sign,
            mid_level: sign,
            filter_size: params.filter_size.max(1.0),
        }
    }

    /// Offset for one vertex before it is applied along `direction`.
    #[must_use]
    pub fn offset(&self, uv: [f64; 2], weight: f64) -> f64 {
        if weight == 0.0 {
            return 0.0;
        }
        let sample = self.image.sample_box(uv[0], uv[1], self.filter_size);
        (sample - self.mid_level) * self.strength * weight
    }

    /// Displaced copy of `mesh`'s positions.
    pub fn evaluate(&self, mesh: &PolyMesh) -> Result<Vec<Point3>, DisplacementError> {
        let weights = mesh
            .weight_map(&self.weight_channel)
            .ok_or_else(|| DisplacementError::MissingWeightChannel(self.weight_channel.clone()))?;
        if weights.len() != mesh.vertex_count() {
            return Err(DisplacementError::WeightCountMismatch {
                weights: weights.len(),
                vertices: mesh.vertex_count(),
            });
        }
        if mesh.uvs.len() != mesh.vertex_count() {
            return Err(DisplacementError::UvCountMismatch {
                uvs: mesh.uvs.len(),
                vertices: mesh.vertex_count(),
            });
        }
        Ok(self.displace_all(mesh, weights))
    }

    #[cfg(feature = "parallel")]
    fn displace_all(&self, mesh: &PolyMesh, weights: &WeightMap) -> Vec<Point3> {
        (0..mesh.vertex_count())
            .into_par_iter()
            .map(|i| self.displace_one(mesh, weights, i))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn displace_all(&self, mesh: &PolyMesh, weights: &WeightMap) -> Vec<Point3> {
        (0..mesh.vertex_count())
            .map(|i| self.displace_one(mesh, weights, i))
            .collect()
    }

    fn displace_one(&self, mesh: &PolyMesh, weights: &WeightMap, i: usize) -> Point3 {
        let mut p = mesh.positions[i];
        let offset = self.offset(mesh.uvs[i], weights.get(i));
        match self.direction {
            DisplaceDirection::X => p.x += offset,
            DisplaceDirection::Y => p.y += offset,
            DisplaceDirection::Z => p.z += offset,
        }
        p
    }
}
