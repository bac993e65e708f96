//! Closing an open boundary loop.
//!
//! A loop with four clear corners and matching opposite sides is filled with
//! a quad grid (Coons patch of its four sides); anything else gets a
//! triangle fan around its centroid. Both fills reuse the loop vertices and
//! wind opposite to the loop, so the result shares every loop edge with the
//! faces already bordering it.

use super::core::Point3;
use super::mesh::PolyMesh;

/// Turn angle (cosine) above which a loop vertex counts as a corner.
const CORNER_COS: f64 = 0.866;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapKind {
    Grid { columns: usize, rows: usize },
    Fan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapFill {
    pub kind: CapKind,
    /// Vertices added inside the loop.
    pub interior_vertices: Vec<usize>,
    pub faces: Vec<usize>,
}

/// Fills the loop `ring`, given in boundary order. Does not rebuild topology.
pub fn fill_loop(mesh: &mut PolyMesh, ring: &[usize]) -> CapFill {
    if let Some((start, columns, rows)) = grid_layout(mesh, ring) {
        let rotated: Vec<usize> = ring[start..].iter().chain(&ring[..start]).copied().collect();
        grid_fill(mesh, &rotated, columns, rows)
    } else {
        fan_fill(mesh, ring)
    }
}

/// Finds four corners splitting `ring` into sides `m, n, m, n`.
/// Returns the first corner's position in `ring` and `(m, n)`.
fn grid_layout(mesh: &PolyMesh, ring: &[usize]) -> Option<(usize, usize, usize)> {
    let len = ring.len();
    if len < 4 {
        return None;
    }
    let corners: Vec<usize> = (0..len)
        .filter(|&i| {
            let prev = mesh.positions[ring[(i + len - 1) % len]];
            let here = mesh.positions[ring[i]];
            let next = mesh.positions[ring[(i + 1) % len]];
            match ((here - prev).normalized(), (next - here).normalized()) {
                (Some(a), Some(b)) => a.dot(b) < CORNER_COS,
                _ => false,
            }
        })
        .collect();
    if corners.len() != 4 {
        return None;
    }

    let side = |k: usize| (corners[(k + 1) % 4] + len - corners[k]) % len;
    let (m, n) = (side(0), side(1));
    (m > 0 && n > 0 && side(2) == m && side(3) == n).then_some((corners[0], m, n))
}

fn grid_fill(mesh: &mut PolyMesh, ring: &[usize], m: usize, n: usize) -> CapFill {
    // ring walks c0 -m-> c1 -n-> c2 -m-> c3 -n-> c0
    let bottom = |i: usize| ring[i];
    let right = |j: usize| ring[m + j];
    let top = |i: usize| ring[2 * m + n - i];
    let left = |j: usize| ring[(2 * m + 2 * n - j) % ring.len()];

    let mut grid = vec![0usize; (m + 1) * (n + 1)];
    let at = |i: usize, j: usize| j * (m + 1) + i;
    for i in 0..=m {
        grid[at(i, 0)] = bottom(i);
        grid[at(i, n)] = top(i);
    }
    for j in 0..=n {
        grid[at(0, j)] = left(j);
        grid[at(m, j)] = right(j);
    }

    let corner = [bottom(0), bottom(m), top(m), top(0)];
    let mut interior_vertices = Vec::with_capacity((m.saturating_sub(1)) * (n.saturating_sub(1)));
    for j in 1..n {
        let v = j as f64 / n as f64;
        for i in 1..m {
            let u = i as f64 / m as f64;
            let coons = |get: &dyn Fn(usize) -> [f64; 3]| -> [f64; 3] {
                let mut out = [0.0; 3];
                for k in 0..3 {
                    out[k] = (1.0 - v) * get(bottom(i))[k]
                        + v * get(top(i))[k]
                        + (1.0 - u) * get(left(j))[k]
                        + u * get(right(j))[k]
                        - ((1.0 - u) * (1.0 - v) * get(corner[0])[k]
                            + u * (1.0 - v) * get(corner[1])[k]
                            + u * v * get(corner[2])[k]
                            + (1.0 - u) * v * get(corner[3])[k]);
                }
                out
            };
            let position = coons(&|id| mesh.positions[id].to_array());
            let uv = coons(&|id| [mesh.uvs[id][0], mesh.uvs[id][1], 0.0]);
            let id = mesh.add_vertex(Point3::from_array(position), [uv[0], uv[1]]);
            grid[at(i, j)] = id;
            interior_vertices.push(id);
        }
    }

    let mut faces = Vec::with_capacity(m * n);
    for j in 0..n {
        for i in 0..m {
            faces.push(mesh.add_face(vec![
                grid[at(i, j)],
                grid[at(i, j + 1)],
                grid[at(i + 1, j + 1)],
                grid[at(i + 1, j)],
            ]));
        }
    }

    CapFill {
        kind: CapKind::Grid { columns: m, rows: n },
        interior_vertices,
        faces,
    }
}

fn fan_fill(mesh: &mut PolyMesh, ring: &[usize]) -> CapFill {
    let len = ring.len();
    let inv = 1.0 / len.max(1) as f64;
    let mut center = [0.0; 3];
    let mut uv = [0.0; 2];
    for &id in ring {
        let p = mesh.positions[id];
        center[0] += p.x * inv;
        center[1] += p.y * inv;
        center[2] += p.z * inv;
        uv[0] += mesh.uvs[id][0] * inv;
        uv[1] += mesh.uvs[id][1] * inv;
    }
    let hub = mesh.add_vertex(Point3::from_array(center), uv);

    let faces = (0..len)
        .map(|i| mesh.add_face(vec![ring[(i + 1) % len], ring[i], hub]))
        .collect();

    CapFill {
        kind: CapKind::Fan,
        interior_vertices: vec![hub],
        faces,
    }
}
