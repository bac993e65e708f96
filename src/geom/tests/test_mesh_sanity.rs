use super::grid_plate;
use crate::geom::{MeshError, Point3, PolyMesh};

fn pentagon() -> PolyMesh {
    let positions = (0..5)
        .map(|i| {
            let a = f64::from(i) * std::f64::consts::TAU / 5.0;
            Point3::new(a.cos(), a.sin(), 0.0)
        })
        .collect();
    PolyMesh::new(positions, None, vec![vec![0, 1, 2, 3, 4]]).unwrap()
}

#[test]
fn grid_has_one_boundary_loop() {
    let mesh = grid_plate(4.0, 4.0, 4, 4);
    assert_eq!(mesh.vertex_count(), 25);
    assert_eq!(mesh.face_count(), 16);

    let loops = mesh.boundary_loops().unwrap();
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0].len(), 16);
    assert_eq!(mesh.boundary_edges().len(), 16);
}

#[test]
fn quads_split_into_two_triangles() {
    let mesh = grid_plate(2.0, 2.0, 2, 2);
    let tri = mesh.to_triangle_mesh();
    assert!(tri.has_valid_indices());
    assert_eq!(tri.triangle_count(), 8);
    assert_eq!(tri.vertex_count(), mesh.vertex_count());
    assert_eq!(tri.positions_flat().len(), 27);
}

#[test]
fn ngons_fan_around_centroid() {
    let mesh = pentagon();
    let tri = mesh.to_triangle_mesh();
    assert!(tri.has_valid_indices());
    assert_eq!(tri.triangle_count(), 5);
    assert_eq!(tri.vertex_count(), 6);
    let centroid = tri.positions[5];
    assert!(centroid[0].abs() < 1e-12 && centroid[1].abs() < 1e-12);
}

#[test]
fn rejects_bad_faces() {
    let square = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
    ];
    assert_eq!(
        PolyMesh::new(square.clone(), None, vec![vec![0, 1]]).unwrap_err(),
        MeshError::DegenerateFace(0)
    );
    assert_eq!(
        PolyMesh::new(square.clone(), None, vec![vec![0, 1, 7]]).unwrap_err(),
        MeshError::InvalidIndex { face: 0, vertex: 7 }
    );
    assert_eq!(
        PolyMesh::new(square, Some(vec![[0.0, 0.0]]), vec![vec![0, 1, 2]]).unwrap_err(),
        MeshError::UvCountMismatch { uvs: 1, vertices: 3 }
    );
}

#[test]
fn with_positions_checks_length() {
    let mesh = grid_plate(2.0, 2.0, 2, 2);
    let mut moved = mesh.positions.clone();
    moved[4].z = 1.0;
    let lifted = mesh.with_positions(moved).unwrap();
    assert_eq!(lifted.positions[4].z, 1.0);
    assert_eq!(lifted.face_count(), mesh.face_count());

    assert_eq!(
        mesh.with_positions(Vec::new()).unwrap_err(),
        MeshError::VertexCountMismatch {
            expected: 9,
            actual: 0,
        }
    );
}

#[test]
fn neighbours_follow_edges() {
    let mesh = grid_plate(2.0, 2.0, 2, 2);
    let neighbors = mesh.vertex_neighbors();
    assert_eq!(neighbors[4], vec![1, 3, 5, 7]);
    assert_eq!(neighbors[0].len(), 2);
}
