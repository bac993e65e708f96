//! Turns a flat weighted sheet into a closed solid.
//!
//! 1. take the single top boundary loop
//! 2. extrude it rigidly along the negated mean normal by `emboss + base`
//! 3. take the new (bottom) boundary loop
//! 4. cap it
//! 5. zero the relief weight on the cap and the extruded rim
//! 6. crease both loops
//!
//! The result is checked for open edges before returning.

use serde::Serialize;
use thiserror::Error;

use super::cap::{CapKind, fill_loop};
use super::core::Vec3;
use super::diagnostics::MeshDiagnostics;
use super::mesh::{BoundaryLoop, EdgeTag, MeshError, PolyMesh};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolidifyError {
    #[error("plate has no open boundary to extrude")]
    NoBoundary,
    #[error("expected one boundary loop, found {0}")]
    MultipleBoundaries(usize),
    #[error("cannot derive an extrusion direction from degenerate faces")]
    DegenerateNormal,
    #[error("extrusion depth must be positive, got {0}")]
    InvalidDepth(f64),
    #[error("top loop has {top} vertices but the bottom loop has {bottom}")]
    LoopMismatch { top: usize, bottom: usize },
    #[error("solid is not watertight ({0} open edges)")]
    NotWatertight(usize),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidifyParams<'a> {
    pub emboss_height: f64,
    pub base_height: f64,
    pub weight_channel: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolidifyReport {
    pub top_loop_len: usize,
    pub bottom_loop_len: usize,
    /// Extruded copies of the top loop.
    pub rim_vertices: Vec<usize>,
    /// Bottom loop plus any vertices added inside it.
    pub cap_vertices: Vec<usize>,
    pub crease_edges: Vec<usize>,
    pub offset: [f64; 3],
    pub grid_cap: bool,
}

pub fn solidify(
    mesh: &mut PolyMesh,
    params: &SolidifyParams<'_>,
) -> Result<SolidifyReport, SolidifyError> {
    let depth = params.emboss_height + params.base_height;
    if !depth.is_finite() || depth <= 0.0 {
        return Err(SolidifyError::InvalidDepth(depth));
    }
    // fail before mutating
    mesh.weight_map_mut(params.weight_channel)?;

    let top = single_loop(mesh)?;
    let normal = mesh.average_normal().ok_or(SolidifyError::DegenerateNormal)?;
    let offset = -normal * depth;

    let rim_vertices = extrude_loop(mesh, &top, offset);
    mesh.rebuild_topology();

    let bottom = single_loop(mesh)?;
    if bottom.len() != top.len() {
        return Err(SolidifyError::LoopMismatch {
            top: top.len(),
            bottom: bottom.len(),
        });
    }
    log::debug!("solidify: boundary loop of {} vertices", top.len());

    let fill = fill_loop(mesh, &bottom.vertices);
    mesh.rebuild_topology();

    let mut cap_vertices = bottom.vertices.clone();
    cap_vertices.extend(&fill.interior_vertices);

    let weights = mesh.weight_map_mut(params.weight_channel)?;
    for &v in cap_vertices.iter().chain(&rim_vertices) {
        weights.set(v, 0.0);
    }

    let crease_edges: Vec<usize> = loop_edges(mesh, &top)
        .into_iter()
        .chain(loop_edges(mesh, &bottom))
        .collect();
    mesh.set_edge_tag(&crease_edges, EdgeTag::Crease);

    let diagnostics = MeshDiagnostics::from_mesh(mesh);
    if !diagnostics.is_watertight() {
        return Err(SolidifyError::NotWatertight(diagnostics.open_edge_count));
    }

    Ok(SolidifyReport {
        top_loop_len: top.len(),
        bottom_loop_len: bottom.len(),
        rim_vertices,
        cap_vertices,
        crease_edges,
        offset: offset.to_array(),
        grid_cap: matches!(fill.kind, CapKind::Grid { .. }),
    })
}

fn single_loop(mesh: &PolyMesh) -> Result<BoundaryLoop, SolidifyError> {
    let mut loops = mesh.boundary_loops()?;
    match loops.len() {
        0 => Err(SolidifyError::NoBoundary),
        1 => Ok(loops.remove(0)),
        n => Err(SolidifyError::MultipleBoundaries(n)),
    }
}

/// Copies every loop vertex by `offset` and stitches one side quad per loop
/// edge. Returns the copies in loop order.
fn extrude_loop(mesh: &mut PolyMesh, ring: &BoundaryLoop, offset: Vec3) -> Vec<usize> {
    let copies: Vec<usize> = ring
        .vertices
        .iter()
        .map(|&v| {
            let (position, uv) = (mesh.positions[v] + offset, mesh.uvs[v]);
            mesh.add_vertex(position, uv)
        })
        .collect();

    let n = ring.len();
    for i in 0..n {
        let (a, b) = (ring.vertices[i], ring.vertices[(i + 1) % n]);
        let (a2, b2) = (copies[i], copies[(i + 1) % n]);
        mesh.add_face(vec![b, a, a2, b2]);
    }
    copies
}

/// Edge ids along a loop, looked up against the current topology.
fn loop_edges(mesh: &PolyMesh, ring: &BoundaryLoop) -> Vec<usize> {
    let n = ring.len();
    (0..n)
        .filter_map(|i| mesh.edge_between(ring.vertices[i], ring.vertices[(i + 1) % n]))
        .collect()
}
