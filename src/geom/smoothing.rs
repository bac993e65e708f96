//! Crease-aware relaxation applied after displacement.
//!
//! Each level blends a vertex halfway toward the mean of its neighbours
//! across non-crease edges. Vertices touching two or more crease edges are
//! pinned so the solid's rim stays put.

use super::core::Point3;
use super::mesh::PolyMesh;

pub const SMOOTHING_STAGE: &str = "smooth";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoothingStage {
    pub levels: u32,
}

impl SmoothingStage {
    #[must_use]
    pub const fn new(levels: u32) -> Self {
        Self { levels }
    }

    /// Relaxes `positions` (laid out like `mesh`'s vertices) in place.
    pub fn apply(&self, mesh: &PolyMesh, positions: &mut [Point3]) {
        if self.levels == 0 || positions.len() != mesh.vertex_count() {
            return;
        }

        let mut crease_count = vec![0u32; positions.len()];
        for edge in mesh.edges().iter().filter(|e| e.tag.is_sharp()) {
            crease_count[edge.vertices.0] += 1;
            crease_count[edge.vertices.1] += 1;
        }

        for _ in 0..self.levels {
            let n = positions.len();
            let mut sums = vec![[0.0f64; 3]; n];
            let mut counts = vec![0usize; n];

            for edge in mesh.edges() {
                if edge.tag.is_sharp() {
                    continue;
                }
                let (a, b) = edge.vertices;
                let (pa, pb) = (positions[a], positions[b]);
                sums[a][0] += pb.x;
                sums[a][1] += pb.y;
                sums[a][2] += pb.z;
                counts[a] += 1;
                sums[b][0] += pa.x;
                sums[b][1] += pa.y;
                sums[b][2] += pa.z;
                counts[b] += 1;
            }

            for (i, p) in positions.iter_mut().enumerate() {
                if crease_count[i] >= 2 || counts[i] == 0 {
                    continue;
                }
                let inv = 1.0 / counts[i] as f64;
                *p = Point3::new(
                    0.5 * (p.x + sums[i][0] * inv),
                    0.5 * (p.y + sums[i][1] * inv),
                    0.5 * (p.z + sums[i][2] * inv),
                );
            }
        }
    }
}

impl Default for SmoothingStage {
    fn default() -> Self {
        Self::new(2)
    }
}
