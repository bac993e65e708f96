//! Per-vertex relief weight: 0 on the flat border, 1 on the relief, and an
//! optional linear taper between the two.
//!
//! Each of the four plate edges contributes a test unless it is flagged
//! external, in which case the relief runs all the way to that edge.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use serde::{Deserialize, Serialize};

use super::core::Point3;
use super::mesh::PolyMesh;
use super::weights::EMBOSS_CHANNEL;

/// Which plate edges carry no flat border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgeMask {
    pub pos_x: bool,
    pub neg_x: bool,
    pub pos_y: bool,
    pub neg_y: bool,
}

impl EdgeMask {
    pub const NONE: Self = Self {
        pos_x: false,
        neg_x: false,
        pos_y: false,
        neg_y: false,
    };
}

/// Border blend policy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum WeightMode {
    /// Hard border: 0 within the border width, 1 beyond.
    #[default]
    Step,
    /// Linear ramp of width `emboss_height / tan(angle)` after the border.
    /// `angle` is in degrees; 90 degenerates to [`WeightMode::Step`].
    Tapered { angle: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightFieldParams {
    /// Plate centre in mesh coordinates (only x and y are read).
    pub center: Point3,
    pub lx: f64,
    pub ly: f64,
    pub border_width: f64,
    pub external: EdgeMask,
    pub mode: WeightMode,
    pub emboss_height: f64,
}

impl WeightFieldParams {
    /// Width of the taper band, 0 for step mode.
    #[must_use]
    pub fn taper_width(&self) -> f64 {
        match self.mode {
            WeightMode::Step => 0.0,
            WeightMode::Tapered { angle } => {
                let tan = angle.to_radians().tan();
                if !tan.is_finite() || tan.abs() < 1e-9 || angle >= 90.0 {
                    0.0
                } else {
                    (self.emboss_height / tan).abs()
                }
            }
        }
    }

    /// Weight of a vertex at `(x, y)`.
    #[must_use]
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let taper = self.taper_width();
        let half_x = 0.5 * self.lx;
        let half_y = 0.5 * self.ly;
        let cx = self.center.x;
        let cy = self.center.y;

        // inward distance from each edge
        let tests = [
            (self.external.pos_y, cy + half_y - y),
            (self.external.neg_y, y - (cy - half_y)),
            (self.external.pos_x, cx + half_x - x),
            (self.external.neg_x, x - (cx - half_x)),
        ];

        tests
            .iter()
            .filter(|(external, _)| !external)
            .map(|&(_, distance)| edge_ratio(distance, self.border_width, taper))
            .fold(1.0, f64::min)
    }
}

fn edge_ratio(distance: f64, border: f64, taper: f64) -> f64 {
    if distance < border {
        0.0
    } else if taper <= 0.0 {
        1.0
    } else {
        ((distance - border) / taper).clamp(0.0, 1.0)
    }
}

/// Writes the `emboss` channel for every vertex and returns the indices whose
/// weight is exactly 1 (the pure relief vertices).
pub fn apply_weight_field(mesh: &mut PolyMesh, params: &WeightFieldParams) -> Vec<usize> {
    let weights = compute_weights(&mesh.positions, params);
    let pure: Vec<usize> = weights
        .iter()
        .enumerate()
        .filter(|(_, w)| **w == 1.0)
        .map(|(i, _)| i)
        .collect();

    mesh.ensure_weight_map(EMBOSS_CHANNEL).assign(weights);
    log::debug!(
        "weight field: {} of {} vertices at full relief",
        pure.len(),
        mesh.vertex_count()
    );
    pure
}

#[cfg(feature = "parallel")]
fn compute_weights(positions: &[Point3], params: &WeightFieldParams) -> Vec<f64> {
    positions.par_iter().map(|p| params.evaluate(p.x, p.y)).collect()
}

#[cfg(not(feature = "parallel"))]
fn compute_weights(positions: &[Point3], params: &WeightFieldParams) -> Vec<f64> {
    positions.iter().map(|p| params.evaluate(p.x, p.y)).collect()
}
