//! Editable polygon mesh used by every relief stage, plus the flat triangle
//! buffers handed to exporters and the wasm surface.
//!
//! `PolyMesh` keeps explicit edge records (with crease tags and the faces
//! that share them) next to the face list. Anything that adds faces must call
//! [`PolyMesh::rebuild_topology`] before querying edges or boundary loops.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use super::core::{BBox, Point3, Vec3};
use super::weights::WeightMap;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("face {face} references missing vertex {vertex}")]
    InvalidIndex { face: usize, vertex: usize },
    #[error("face {0} has fewer than three vertices")]
    DegenerateFace(usize),
    #[error("uv count {uvs} does not match vertex count {vertices}")]
    UvCountMismatch { uvs: usize, vertices: usize },
    #[error("vertex {0} sits on more than one open boundary fan")]
    NonManifoldBoundary(usize),
    #[error("cut count must be non-negative, got {0}")]
    NegativeCutCount(i64),
    #[error("grid subdivision expects a single quad plate, found {faces} faces")]
    NotSingleQuad { faces: usize },
    #[error("expected {expected} vertices, got {actual}")]
    VertexCountMismatch { expected: usize, actual: usize },
    #[error("weight channel `{0}` does not exist")]
    MissingWeightMap(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Elements
// ─────────────────────────────────────────────────────────────────────────────

/// Sharpness hint read by the smoothing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EdgeTag {
    #[default]
    Smooth,
    Crease,
}

impl EdgeTag {
    #[must_use]
    pub fn is_sharp(self) -> bool {
        matches!(self, Self::Crease)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshEdge {
    /// Endpoints, smaller index first.
    pub vertices: (usize, usize),
    pub tag: EdgeTag,
    /// Faces using this edge.
    pub faces: Vec<usize>,
}

impl MeshEdge {
    /// An edge with exactly one adjacent face.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.faces.len() == 1
    }

    #[must_use]
    pub fn other(&self, vertex: usize) -> usize {
        if self.vertices.0 == vertex {
            self.vertices.1
        } else {
            self.vertices.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshFace {
    pub vertices: Vec<usize>,
    pub edges: Vec<usize>,
}

/// An ordered open boundary. `vertices[i] -> vertices[i + 1]` follows the
/// winding of the face that owns each edge.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLoop {
    pub vertices: Vec<usize>,
    pub edges: Vec<usize>,
}

impl BoundaryLoop {
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PolyMesh
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    pub positions: Vec<Point3>,
    pub uvs: Vec<[f64; 2]>,
    edges: Vec<MeshEdge>,
    faces: Vec<MeshFace>,
    edge_lookup: HashMap<(usize, usize), usize>,
    weight_maps: Vec<WeightMap>,
}

impl PolyMesh {
    /// Builds a mesh from polygons. Missing UVs default to `[0, 0]`.
    pub fn new(
        positions: Vec<Point3>,
        uvs: Option<Vec<[f64; 2]>>,
        faces: Vec<Vec<usize>>,
    ) -> Result<Self, MeshError> {
        let uvs = match uvs {
            Some(uvs) if uvs.len() != positions.len() => {
                return Err(MeshError::UvCountMismatch {
                    uvs: uvs.len(),
                    vertices: positions.len(),
                });
            }
            Some(uvs) => uvs,
            None => vec![[0.0, 0.0]; positions.len()],
        };

        for (face_id, face) in faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(MeshError::DegenerateFace(face_id));
            }
            if let Some(&vertex) = face.iter().find(|&&v| v >= positions.len()) {
                return Err(MeshError::InvalidIndex { face: face_id, vertex });
            }
        }

        let mut mesh = Self {
            positions,
            uvs,
            faces: faces
                .into_iter()
                .map(|vertices| MeshFace {
                    vertices,
                    edges: Vec::new(),
                })
                .collect(),
            ..Self::default()
        };
        mesh.rebuild_topology();
        Ok(mesh)
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn edges(&self) -> &[MeshEdge] {
        &self.edges
    }

    #[must_use]
    pub fn faces(&self) -> &[MeshFace] {
        &self.faces
    }

    #[must_use]
    pub fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_lookup.get(&normalized_edge_pair(a, b)).copied()
    }

    /// Appends a vertex; every weight channel gets a 0 slot for it.
    pub fn add_vertex(&mut self, position: Point3, uv: [f64; 2]) -> usize {
        self.positions.push(position);
        self.uvs.push(uv);
        for map in &mut self.weight_maps {
            map.resize(self.positions.len());
        }
        self.positions.len() - 1
    }

    /// Appends a face without touching edge records.
    pub fn add_face(&mut self, vertices: Vec<usize>) -> usize {
        self.faces.push(MeshFace {
            vertices,
            edges: Vec::new(),
        });
        self.faces.len() - 1
    }

    /// Recomputes edges from the face list. Edge ids follow face traversal
    /// order; tags on edges that survive are kept.
    pub fn rebuild_topology(&mut self) {
        let tag_lookup: HashMap<(usize, usize), EdgeTag> = self
            .edges
            .iter()
            .map(|edge| (edge.vertices, edge.tag))
            .collect();

        let mut edge_lookup: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edges: Vec<MeshEdge> = Vec::new();

        for (face_id, face) in self.faces.iter_mut().enumerate() {
            face.edges.clear();
            let n = face.vertices.len();
            for i in 0..n {
                let key = normalized_edge_pair(face.vertices[i], face.vertices[(i + 1) % n]);
                let edge_id = *edge_lookup.entry(key).or_insert_with(|| {
                    edges.push(MeshEdge {
                        vertices: key,
                        tag: tag_lookup.get(&key).copied().unwrap_or_default(),
                        faces: Vec::new(),
                    });
                    edges.len() - 1
                });
                let edge = &mut edges[edge_id];
                if !edge.faces.contains(&face_id) {
                    edge.faces.push(face_id);
                }
                face.edges.push(edge_id);
            }
        }

        self.edges = edges;
        self.edge_lookup = edge_lookup;
    }

    #[must_use]
    pub fn boundary_edges(&self) -> Vec<usize> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_boundary())
            .map(|(i, _)| i)
            .collect()
    }

    /// Orders the open boundary into loops. Each loop starts at its smallest
    /// vertex index. A vertex with two outgoing boundary edges, or a chain that
    /// does not close, is rejected.
    pub fn boundary_loops(&self) -> Result<Vec<BoundaryLoop>, MeshError> {
        let mut next: BTreeMap<usize, usize> = BTreeMap::new();
        for edge_id in self.boundary_edges() {
            let edge = &self.edges[edge_id];
            let face = &self.faces[edge.faces[0]];
            let n = face.vertices.len();
            let directed = (0..n)
                .map(|i| (face.vertices[i], face.vertices[(i + 1) % n]))
                .find(|&(a, b)| normalized_edge_pair(a, b) == edge.vertices)
                .unwrap_or(edge.vertices);
            if next.insert(directed.0, directed.1).is_some() {
                return Err(MeshError::NonManifoldBoundary(directed.0));
            }
        }

        let mut loops = Vec::new();
        while let Some((&start, _)) = next.first_key_value() {
            let mut vertices = vec![start];
            let mut edges = Vec::new();
            let mut current = start;
            loop {
                let Some(following) = next.remove(&current) else {
                    return Err(MeshError::NonManifoldBoundary(current));
                };
                if let Some(edge_id) = self.edge_between(current, following) {
                    edges.push(edge_id);
                }
                if following == start {
                    break;
                }
                vertices.push(following);
                current = following;
            }
            loops.push(BoundaryLoop { vertices, edges });
        }
        Ok(loops)
    }

    /// Sorted, de-duplicated edge neighbours of every vertex.
    #[must_use]
    pub fn vertex_neighbors(&self) -> Vec<Vec<usize>> {
        let mut neighbors = vec![Vec::new(); self.positions.len()];
        for edge in &self.edges {
            let (a, b) = edge.vertices;
            neighbors[a].push(b);
            neighbors[b].push(a);
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        neighbors
    }

    /// Newell normal of a face, `None` when degenerate.
    #[must_use]
    pub fn face_normal(&self, face_id: usize) -> Option<Vec3> {
        let face = self.faces.get(face_id)?;
        let n = face.vertices.len();
        let mut normal = Vec3::ZERO;
        for i in 0..n {
            let a = self.positions[face.vertices[i]];
            let b = self.positions[face.vertices[(i + 1) % n]];
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }
        normal.normalized()
    }

    /// Unit mean of all face normals.
    #[must_use]
    pub fn average_normal(&self) -> Option<Vec3> {
        let sum = (0..self.faces.len())
            .filter_map(|f| self.face_normal(f))
            .fold(Vec3::ZERO, |acc, n| acc + n);
        sum.normalized()
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<BBox> {
        BBox::from_points(self.positions.iter().copied())
    }

    pub fn set_edge_tag(&mut self, edge_ids: &[usize], tag: EdgeTag) {
        for &id in edge_ids {
            if let Some(edge) = self.edges.get_mut(id) {
                edge.tag = tag;
            }
        }
    }

    #[must_use]
    pub fn crease_edges(&self) -> Vec<usize> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.tag.is_sharp())
            .map(|(i, _)| i)
            .collect()
    }

    #[must_use]
    pub fn weight_map(&self, name: &str) -> Option<&WeightMap> {
        self.weight_maps.iter().find(|m| m.name() == name)
    }

    pub fn weight_map_mut(&mut self, name: &str) -> Result<&mut WeightMap, MeshError> {
        self.weight_maps
            .iter_mut()
            .find(|m| m.name() == name)
            .ok_or_else(|| MeshError::MissingWeightMap(name.to_owned()))
    }

    /// Returns the named channel, creating it (all zero) if needed.
    pub fn ensure_weight_map(&mut self, name: &str) -> &mut WeightMap {
        let index = match self.weight_maps.iter().position(|m| m.name() == name) {
            Some(index) => index,
            None => {
                self.weight_maps
                    .push(WeightMap::new(name, self.positions.len(), 0.0));
                self.weight_maps.len() - 1
            }
        };
        &mut self.weight_maps[index]
    }

    /// Copy of this mesh with every position replaced.
    pub fn with_positions(&self, positions: Vec<Point3>) -> Result<Self, MeshError> {
        if positions.len() != self.positions.len() {
            return Err(MeshError::VertexCountMismatch {
                expected: self.positions.len(),
                actual: positions.len(),
            });
        }
        let mut mesh = self.clone();
        mesh.positions = positions;
        Ok(mesh)
    }

    /// Triangulates for export. Triangles pass through, quads split along
    /// their first diagonal, larger polygons fan around an added centroid.
    #[must_use]
    pub fn to_triangle_mesh(&self) -> TriangleMesh {
        let mut positions: Vec<[f64; 3]> = self.positions.iter().map(|p| p.to_array()).collect();
        let mut uvs = self.uvs.clone();
        let mut indices: Vec<u32> = Vec::with_capacity(self.faces.len() * 6);

        for face in &self.faces {
            let v = &face.vertices;
            match v.len() {
                3 => indices.extend([v[0] as u32, v[1] as u32, v[2] as u32]),
                4 => indices.extend([
                    v[0] as u32, v[1] as u32, v[2] as u32,
                    v[0] as u32, v[2] as u32, v[3] as u32,
                ]),
                n => {
                    let inv = 1.0 / n as f64;
                    let mut centroid = [0.0; 3];
                    let mut uv = [0.0; 2];
                    for &id in v {
                        let p = self.positions[id];
                        centroid[0] += p.x * inv;
                        centroid[1] += p.y * inv;
                        centroid[2] += p.z * inv;
                        uv[0] += self.uvs[id][0] * inv;
                        uv[1] += self.uvs[id][1] * inv;
                    }
                    let center = positions.len() as u32;
                    positions.push(centroid);
                    uvs.push(uv);
                    for i in 0..n {
                        indices.extend([v[i] as u32, v[(i + 1) % n] as u32, center]);
                    }
                }
            }
        }

        TriangleMesh {
            positions,
            indices,
            uvs: Some(uvs),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TriangleMesh
// ─────────────────────────────────────────────────────────────────────────────

/// Indexed triangle list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangleMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    pub uvs: Option<Vec<[f64; 2]>>,
}

impl TriangleMesh {
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if all indices are in range and form whole triangles.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len() as u32;
        self.indices.len() % 3 == 0 && self.indices.iter().all(|&i| i < n)
    }

    /// Positions as `[x0, y0, z0, x1, ...]` for JS typed arrays.
    #[must_use]
    pub fn positions_flat(&self) -> Vec<f64> {
        self.positions.iter().flat_map(|p| p.iter().copied()).collect()
    }
}

#[inline]
pub(crate) fn normalized_edge_pair(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}
