//! Subdivision sizing: how many loop cuts turn a plate into a near-square
//! grid at a requested face density.
//!
//! With `B = lx * ly * fpu^2` target cells and aspect `A = ly / lx`:
//!
//! ```text
//! nx = round(sqrt(A * B)) - 1    cuts across the ly edge
//! ny = round(sqrt(B / A)) - 1    cuts across the lx edge
//! ```
//!
//! Rounding is round-half-to-even throughout.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SizingError {
    #[error("plate extents must be positive and finite (lx = {lx}, ly = {ly})")]
    InvalidExtent { lx: f64, ly: f64 },
    #[error("faces per unit must be finite and non-negative, got {0}")]
    InvalidDensity(f64),
}

/// Plate extents measured from its two independent boundary edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlateDimensions {
    pub lx: f64,
    pub ly: f64,
    /// True when mesh edge 0 supplied `lx`; otherwise edge 1 did.
    pub x_from_first_edge: bool,
}

impl PlateDimensions {
    #[must_use]
    pub const fn new(lx: f64, ly: f64) -> Self {
        Self {
            lx,
            ly,
            x_from_first_edge: true,
        }
    }
}

/// Interior cut counts. Negative values come out of a zero density and are
/// rejected by the subdivision step, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridCuts {
    pub nx: i64,
    pub ny: i64,
}

impl GridCuts {
    /// `(nx + 1) * (ny + 1)`.
    #[must_use]
    pub fn total_faces(self) -> i64 {
        (self.nx + 1) * (self.ny + 1)
    }
}

pub fn solve_cuts(dims: PlateDimensions, fpu: f64) -> Result<GridCuts, SizingError> {
    let PlateDimensions { lx, ly, .. } = dims;
    if !(lx.is_finite() && ly.is_finite() && lx > 0.0 && ly > 0.0) {
        return Err(SizingError::InvalidExtent { lx, ly });
    }
    if !fpu.is_finite() || fpu < 0.0 {
        return Err(SizingError::InvalidDensity(fpu));
    }

    let b = lx * ly * fpu * fpu;
    let a = ly / lx;
    let nx = (a * b).sqrt().round_ties_even() as i64 - 1;
    let ny = (b / a).sqrt().round_ties_even() as i64 - 1;
    Ok(GridCuts { nx, ny })
}
