//! Edge-loop cuts on a single-quad plate.
//!
//! `nx` cuts split the edge that measured `ly` and `ny` cuts split the edge
//! that measured `lx`, so the plate ends up with `(nx + 1) * (ny + 1)` quads.
//! Positions and UVs are interpolated bilinearly from the four corners and
//! the original winding is kept.

use super::core::Point3;
use super::mesh::{MeshError, PolyMesh};
use super::sizing::{GridCuts, PlateDimensions};

/// Replaces `mesh` with its subdivided grid. Weight channels and edge tags
/// are dropped; both are recomputed by later stages.
pub fn subdivide_grid(
    mesh: &mut PolyMesh,
    cuts: GridCuts,
    dims: PlateDimensions,
) -> Result<(), MeshError> {
    for count in [cuts.nx, cuts.ny] {
        if count < 0 {
            return Err(MeshError::NegativeCutCount(count));
        }
    }
    let corners = match mesh.faces() {
        [face] if face.vertices.len() == 4 => [
            face.vertices[0],
            face.vertices[1],
            face.vertices[2],
            face.vertices[3],
        ],
        faces => return Err(MeshError::NotSingleQuad { faces: faces.len() }),
    };

    let (cuts_u, cuts_v) = if dims.x_from_first_edge {
        (cuts.ny, cuts.nx)
    } else {
        (cuts.nx, cuts.ny)
    };
    let su = usize::try_from(cuts_u).unwrap_or(0) + 1;
    let sv = usize::try_from(cuts_v).unwrap_or(0) + 1;

    let p = corners.map(|c| mesh.positions[c]);
    let uv = corners.map(|c| mesh.uvs[c]);

    let mut positions = Vec::with_capacity((su + 1) * (sv + 1));
    let mut uvs = Vec::with_capacity((su + 1) * (sv + 1));
    for j in 0..=sv {
        let t = j as f64 / sv as f64;
        for i in 0..=su {
            let s = i as f64 / su as f64;
            let w = [(1.0 - s) * (1.0 - t), s * (1.0 - t), s * t, (1.0 - s) * t];
            positions.push(Point3::new(
                w[0] * p[0].x + w[1] * p[1].x + w[2] * p[2].x + w[3] * p[3].x,
                w[0] * p[0].y + w[1] * p[1].y + w[2] * p[2].y + w[3] * p[3].y,
                w[0] * p[0].z + w[1] * p[1].z + w[2] * p[2].z + w[3] * p[3].z,
            ));
            uvs.push([
                w[0] * uv[0][0] + w[1] * uv[1][0] + w[2] * uv[2][0] + w[3] * uv[3][0],
                w[0] * uv[0][1] + w[1] * uv[1][1] + w[2] * uv[2][1] + w[3] * uv[3][1],
            ]);
        }
    }

    let row = su + 1;
    let mut faces = Vec::with_capacity(su * sv);
    for j in 0..sv {
        for i in 0..su {
            let a = j * row + i;
            faces.push(vec![a, a + 1, a + 1 + row, a + row]);
        }
    }

    log::debug!("subdivide_grid: {su} x {sv} quads");
    *mesh = PolyMesh::new(positions, Some(uvs), faces)?;
    Ok(())
}
