mod test_displacement_basic;
mod test_mesh_sanity;
mod test_sizing_basic;
mod test_subdivide_basic;

use crate::geom::{GridCuts, PlateDimensions, Point3, PolyMesh, subdivide_grid};

/// `lx` by `ly` plate centred on the origin, cut into a grid with
/// `columns` quads along X and `rows` along Y.
fn grid_plate(lx: f64, ly: f64, columns: i64, rows: i64) -> PolyMesh {
    let (hx, hy) = (0.5 * lx, 0.5 * ly);
    let mut mesh = PolyMesh::new(
        vec![
            Point3::new(-hx, -hy, 0.0),
            Point3::new(hx, -hy, 0.0),
            Point3::new(hx, hy, 0.0),
            Point3::new(-hx, hy, 0.0),
        ],
        Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
        vec![vec![0, 1, 2, 3]],
    )
    .unwrap();
    let cuts = GridCuts {
        nx: rows - 1,
        ny: columns - 1,
    };
    subdivide_grid(&mut mesh, cuts, PlateDimensions::new(lx, ly)).unwrap();
    mesh
}
