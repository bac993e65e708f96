//! Single-pass removal of isolated height spikes.
//!
//! A candidate vertex is a spike when every edge neighbour's evaluated height
//! differs from its own by at least the threshold. Spikes have their *base*
//! height moved toward the neighbours by `reduction * mean |dz|`, so the fix
//! survives re-evaluation of the displacement stage. Detection reads only
//! the evaluated copy; corrections never influence other candidates.

use serde::Serialize;

use super::core::Point3;
use super::mesh::{MeshError, PolyMesh};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeParams {
    pub threshold: f64,
    pub reduction: f64,
    pub invert: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpikeReport {
    pub candidates: usize,
    /// Adjusted vertices in candidate order.
    pub adjusted: Vec<usize>,
    /// Candidates without neighbours, left alone.
    pub isolated: usize,
}

pub fn remove_spikes(
    mesh: &mut PolyMesh,
    evaluated: &[Point3],
    candidates: &[usize],
    params: &SpikeParams,
) -> Result<SpikeReport, MeshError> {
    if evaluated.len() != mesh.vertex_count() {
        return Err(MeshError::VertexCountMismatch {
            expected: mesh.vertex_count(),
            actual: evaluated.len(),
        });
    }

    let neighbors = mesh.vertex_neighbors();
    let mut report = SpikeReport {
        candidates: candidates.len(),
        ..SpikeReport::default()
    };
    let mut corrections = Vec::new();

    for &v in candidates {
        let Some(around) = neighbors.get(v) else {
            continue;
        };
        if around.is_empty() {
            report.isolated += 1;
            continue;
        }
        let z = evaluated[v].z;
        let mut total = 0.0;
        let mut spike = true;
        for &other in around {
            let dz = (z - evaluated[other].z).abs();
            if dz < params.threshold {
                spike = false;
                break;
            }
            total += dz;
        }
        if spike {
            corrections.push((v, params.reduction * total / around.len() as f64));
        }
    }

    for (v, amount) in corrections {
        if params.invert {
            mesh.positions[v].z += amount;
        } else {
            mesh.positions[v].z -= amount;
        }
        report.adjusted.push(v);
    }

    log::debug!(
        "spike filter: {} of {} candidates adjusted",
        report.adjusted.len(),
        report.candidates
    );
    Ok(report)
}
