//! Topology checks for solidified plates.
//!
//! A relief solid is only fit for fabrication when every edge is shared by
//! exactly two faces that traverse it in opposite directions.
//!
//! ```ignore
//! let diagnostics = MeshDiagnostics::from_mesh(&plate.mesh);
//! if !diagnostics.is_valid_solid() {
//!     for warning in &diagnostics.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::mesh::PolyMesh;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct MeshDiagnostics {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub face_count: usize,

    /// Edges with a single adjacent face.
    pub open_edge_count: usize,

    /// Edges shared by more than two faces.
    pub non_manifold_edge_count: usize,

    /// Two-face edges whose faces walk them in the same direction.
    pub inconsistent_winding_count: usize,

    /// Faces with a zero-length Newell normal.
    pub degenerate_face_count: usize,

    pub crease_edge_count: usize,

    pub warnings: Vec<String>,
}

impl MeshDiagnostics {
    #[must_use]
    pub fn from_mesh(mesh: &PolyMesh) -> Self {
        let mut diagnostics = Self {
            vertex_count: mesh.vertex_count(),
            edge_count: mesh.edge_count(),
            face_count: mesh.face_count(),
            ..Self::default()
        };

        let mut directed: HashMap<(usize, usize), usize> = HashMap::new();
        for face in mesh.faces() {
            let n = face.vertices.len();
            for i in 0..n {
                *directed
                    .entry((face.vertices[i], face.vertices[(i + 1) % n]))
                    .or_insert(0) += 1;
            }
        }

        for edge in mesh.edges() {
            match edge.faces.len() {
                0 | 1 => diagnostics.open_edge_count += 1,
                2 => {
                    let (a, b) = edge.vertices;
                    let forward = directed.get(&(a, b)).copied().unwrap_or(0);
                    let backward = directed.get(&(b, a)).copied().unwrap_or(0);
                    if forward != 1 || backward != 1 {
                        diagnostics.inconsistent_winding_count += 1;
                    }
                }
                _ => diagnostics.non_manifold_edge_count += 1,
            }
            if edge.tag.is_sharp() {
                diagnostics.crease_edge_count += 1;
            }
        }

        diagnostics.degenerate_face_count = (0..mesh.face_count())
            .filter(|&f| mesh.face_normal(f).is_none())
            .count();

        if diagnostics.open_edge_count > 0 {
            diagnostics.add_warning(format!("mesh has {} open edges", diagnostics.open_edge_count));
        }
        if diagnostics.non_manifold_edge_count > 0 {
            diagnostics.add_warning(format!(
                "mesh has {} non-manifold edges",
                diagnostics.non_manifold_edge_count
            ));
        }
        if diagnostics.inconsistent_winding_count > 0 {
            diagnostics.add_warning("mesh has inconsistent face winding");
        }
        diagnostics
    }

    /// No open edges.
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.open_edge_count == 0
    }

    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    /// Watertight, manifold and consistently wound.
    #[must_use]
    pub fn is_valid_solid(&self) -> bool {
        self.is_watertight() && self.is_manifold() && self.inconsistent_winding_count == 0
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

impl fmt::Display for MeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vertices, {} faces, {} open edges, {} non-manifold edges, {} creases",
            self.vertex_count,
            self.face_count,
            self.open_edge_count,
            self.non_manifold_edge_count,
            self.crease_edge_count
        )
    }
}
