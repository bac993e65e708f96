use crate::geom::{GridCuts, MeshError, PlateDimensions, Point3, PolyMesh, subdivide_grid};

fn quad() -> PolyMesh {
    PolyMesh::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ],
        Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
        vec![vec![0, 1, 2, 3]],
    )
    .unwrap()
}

#[test]
fn cuts_split_both_axes() {
    let mut mesh = quad();
    let cuts = GridCuts { nx: 1, ny: 3 };
    subdivide_grid(&mut mesh, cuts, PlateDimensions::new(4.0, 2.0)).unwrap();

    assert_eq!(mesh.face_count() as i64, cuts.total_faces());
    assert_eq!(mesh.vertex_count(), 5 * 3);
    assert_eq!(mesh.positions[1], Point3::new(1.0, 0.0, 0.0));
    assert_eq!(mesh.positions[5], Point3::new(0.0, 1.0, 0.0));
    assert_eq!(mesh.uvs[7], [0.5, 0.5]);

    let loops = mesh.boundary_loops().unwrap();
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0].len(), 12);
}

#[test]
fn swapped_axes_cut_the_other_edge() {
    let mut mesh = quad();
    let dims = PlateDimensions {
        lx: 4.0,
        ly: 2.0,
        x_from_first_edge: false,
    };
    subdivide_grid(&mut mesh, GridCuts { nx: 1, ny: 3 }, dims).unwrap();
    assert_eq!(mesh.face_count(), 8);
    assert_eq!(mesh.positions[1], Point3::new(2.0, 0.0, 0.0));
}

#[test]
fn zero_cuts_keep_a_single_quad() {
    let mut mesh = quad();
    subdivide_grid(&mut mesh, GridCuts { nx: 0, ny: 0 }, PlateDimensions::new(4.0, 2.0)).unwrap();
    assert_eq!(mesh.face_count(), 1);
    assert_eq!(mesh.vertex_count(), 4);
}

#[test]
fn rejects_negative_counts_and_grids() {
    let mut mesh = quad();
    let dims = PlateDimensions::new(4.0, 2.0);
    assert_eq!(
        subdivide_grid(&mut mesh, GridCuts { nx: -1, ny: 2 }, dims),
        Err(MeshError::NegativeCutCount(-1))
    );
    subdivide_grid(&mut mesh, GridCuts { nx: 1, ny: 1 }, dims).unwrap();
    assert_eq!(
        subdivide_grid(&mut mesh, GridCuts { nx: 1, ny: 1 }, dims),
        Err(MeshError::NotSingleQuad { faces: 4 })
    );
}
