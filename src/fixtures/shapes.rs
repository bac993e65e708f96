//! Fixed-topology solids built around their own origin.

use crate::geom::{MeshError, Point3, PolyMesh};

fn solid(verts: Vec<[f64; 3]>, faces: Vec<Vec<usize>>) -> Result<PolyMesh, MeshError> {
    PolyMesh::new(verts.into_iter().map(Point3::from).collect(), None, faces)
}

/// Two frustum keys straddling the edge centre at `±edge_size_x / 4`.
pub fn wedge(edge_size_x: f64, border_width: f64, base_height: f64) -> Result<PolyMesh, MeshError> {
    let shift = 0.25 * edge_size_x;
    let x = [-2.25, 2.25, -1.125, 1.125];
    let y = [2.0 * border_width / 3.0, -border_width];
    let z = [-0.05, -base_height + 0.05];

    let mut verts = Vec::with_capacity(16);
    for s in [shift, -shift] {
        verts.extend([
            [x[0] + s, y[0], z[0]],
            [x[1] + s, y[0], z[0]],
            [x[1] + s, y[1], z[0]],
            [x[0] + s, y[1], z[0]],
            [x[2] + s, y[0], z[1]],
            [x[3] + s, y[0], z[1]],
            [x[3] + s, y[1], z[1]],
            [x[2] + s, y[1], z[1]],
        ]);
    }

    let prism: [[usize; 4]; 6] = [
        [3, 2, 1, 0],
        [0, 4, 7, 3],
        [4, 5, 6, 7],
        [1, 2, 6, 5],
        [0, 1, 5, 4],
        [2, 3, 7, 6],
    ];
    let faces = [0, 8]
        .iter()
        .flat_map(|&base| prism.iter().map(move |f| f.iter().map(|i| i + base).collect()))
        .collect();
    solid(verts, faces)
}

/// Plain box centred on the origin.
pub fn flat_plate(size: [f64; 3]) -> Result<PolyMesh, MeshError> {
    let x = [-0.5 * size[0], 0.5 * size[0]];
    let y = [0.5 * size[1], -0.5 * size[1]];
    let z = [0.5 * size[2], -0.5 * size[2]];
    solid(
        vec![
            [x[0], y[0], z[0]],
            [x[1], y[0], z[0]],
            [x[1], y[1], z[0]],
            [x[0], y[1], z[0]],
            [x[0], y[0], z[1]],
            [x[1], y[0], z[1]],
            [x[1], y[1], z[1]],
            [x[0], y[1], z[1]],
        ],
        vec![
            vec![3, 2, 1, 0],
            vec![4, 5, 6, 7],
            vec![1, 2, 6, 5],
            vec![3, 0, 4, 7],
            vec![0, 1, 5, 4],
            vec![2, 3, 7, 6],
        ],
    )
}

/// Box with two notches along its +Y side that receive the wedge keys.
/// Notch floors sit `base_height` above the bottom.
pub fn notched_plate(
    size: [f64; 3],
    border_width: f64,
    base_height: f64,
) -> Result<PolyMesh, MeshError> {
    let [sx, sy, sz] = size;
    let x = [
        -0.5 * sx,
        0.5 * sx,
        0.25 * sx - 1.75,
        0.25 * sx + 1.75,
        0.25 * sx - 3.5,
        0.25 * sx + 3.5,
        -0.25 * sx - 1.75,
        -0.25 * sx + 1.75,
        -0.25 * sx - 3.5,
        -0.25 * sx + 3.5,
    ];
    let y = [0.5 * sy, -0.5 * sy, 0.5 * sy - 2.0 * border_width / 3.0];
    let z = [0.5 * sz, -0.5 * sz, -0.5 * sz + base_height];

    let verts = vec![
        [x[0], y[0], z[0]],
        [x[1], y[0], z[0]],
        [x[1], y[1], z[0]],
        [x[0], y[1], z[0]],
        [x[0], y[0], z[1]],
        [x[1], y[0], z[1]],
        [x[1], y[1], z[1]],
        [x[0], y[1], z[1]],
        [x[2], y[0], z[1]],
        [x[3], y[0], z[1]],
        [x[3], y[2], z[1]],
        [x[2], y[2], z[1]],
        [x[4], y[0], z[2]],
        [x[5], y[0], z[2]],
        [x[5], y[2], z[2]],
        [x[4], y[2], z[2]],
        [x[6], y[0], z[1]],
        [x[7], y[0], z[1]],
        [x[7], y[2], z[1]],
        [x[6], y[2], z[1]],
        [x[8], y[0], z[2]],
        [x[9], y[0], z[2]],
        [x[9], y[2], z[2]],
        [x[8], y[2], z[2]],
    ];
    let faces = vec![
        vec![3, 2, 1, 0],
        vec![4, 7, 3, 0],
        vec![1, 2, 6, 5],
        vec![7, 6, 2, 3],
        vec![12, 13, 14, 15],
        vec![9, 10, 14, 13],
        vec![12, 15, 11, 8],
        vec![15, 14, 10, 11],
        vec![20, 21, 22, 23],
        vec![17, 18, 22, 21],
        vec![20, 23, 19, 16],
        vec![23, 22, 18, 19],
        vec![4, 16, 19, 18, 17, 8, 11, 10, 9, 5, 6, 7],
        vec![0, 1, 5, 9, 13, 12, 8, 17, 21, 20, 16, 4],
    ];
    solid(verts, faces)
}

/// Channel ring with a one-unit lip, `gap` below the solid. A closed frame
/// gets its far wall; an open one leaves the +Y side free.
pub fn back_frame(
    size_x: f64,
    size_y: f64,
    border_width: f64,
    gap: f64,
    closed: bool,
) -> Result<PolyMesh, MeshError> {
    let w = border_width;
    let x = [
        -0.5 * size_x,
        w / 3.0 - 0.5 * size_x,
        -0.5 * size_x + w,
        0.5 * size_x - w,
        0.5 * size_x - w / 3.0,
        0.5 * size_x,
    ];
    let y = [-0.5 * size_y, w / 3.0 - 0.5 * size_y, -0.5 * size_y + w, 0.5 * size_y];
    let z = [-gap - 1.0, -gap, 1.0];

    let mut verts = vec![
        [x[0], y[3], z[0]],
        [x[2], y[3], z[0]],
        [x[3], y[3], z[0]],
        [x[5], y[3], z[0]],
        [x[0], y[0], z[0]],
        [x[2], y[2], z[0]],
        [x[3], y[2], z[0]],
        [x[5], y[0], z[0]],
        [x[1], y[3], z[1]],
        [x[2], y[3], z[1]],
        [x[3], y[3], z[1]],
        [x[4], y[3], z[1]],
        [x[1], y[1], z[1]],
        [x[2], y[2], z[1]],
        [x[3], y[2], z[1]],
        [x[4], y[1], z[1]],
        [x[0], y[3], z[2]],
        [x[1], y[3], z[2]],
        [x[4], y[3], z[2]],
        [x[5], y[3], z[2]],
        [x[0], y[0], z[2]],
        [x[1], y[1], z[2]],
        [x[4], y[1], z[2]],
        [x[5], y[0], z[2]],
    ];
    let mut faces = vec![
        vec![2, 3, 7, 6],
        vec![6, 7, 4, 5],
        vec![0, 1, 5, 4],
        vec![11, 10, 14, 15],
        vec![13, 12, 15, 14],
        vec![12, 13, 9, 8],
        vec![19, 18, 22, 23],
        vec![21, 20, 23, 22],
        vec![20, 21, 17, 16],
        vec![0, 4, 20, 16],
        vec![4, 7, 23, 20],
        vec![7, 3, 19, 23],
        vec![14, 10, 2, 6],
        vec![13, 14, 6, 5],
        vec![9, 13, 5, 1],
        vec![17, 21, 12, 8],
        vec![21, 22, 15, 12],
        vec![22, 18, 11, 15],
    ];

    if closed {
        for i in [1, 2, 9, 10] {
            verts[i][1] -= w;
        }
        for i in [8, 11, 17, 18] {
            verts[i][1] -= 1.0;
        }
        faces.extend([
            vec![0, 3, 2, 1],
            vec![11, 8, 9, 10],
            vec![19, 16, 17, 18],
            vec![3, 0, 16, 19],
            vec![10, 9, 1, 2],
            vec![18, 17, 8, 11],
        ]);
    } else {
        faces.extend([vec![3, 2, 10, 11, 18, 19], vec![1, 0, 16, 17, 8, 9]]);
    }
    solid(verts, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wedge_is_two_closed_prisms() {
        let mesh = wedge(112.0, 3.0, 3.0).unwrap();
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.face_count(), 12);
        assert!(mesh.boundary_edges().is_empty());
        let xs: Vec<f64> = mesh.positions.iter().map(|p| p.x).collect();
        assert!(xs.iter().any(|x| (x - (28.0 - 2.25)).abs() < 1e-12));
        assert!(xs.iter().any(|x| (x - (-28.0 + 2.25)).abs() < 1e-12));
    }

    #[test]
    fn flat_plate_spans_requested_size() {
        let mesh = flat_plate([100.0, 21.5, 6.0]).unwrap();
        let bbox = mesh.bounding_box().unwrap();
        assert_eq!(bbox.size().to_array(), [100.0, 21.5, 6.0]);
        assert!(mesh.boundary_edges().is_empty());
    }

    #[test]
    fn notched_plate_keeps_two_notches() {
        let mesh = notched_plate([112.0, 3.0, 6.0], 3.0, 3.0).unwrap();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.face_count(), 14);
        let notch_floor = mesh
            .positions
            .iter()
            .filter(|p| (p.z - 0.0).abs() < 1e-12)
            .count();
        assert_eq!(notch_floor, 8);
    }

    #[test]
    fn closed_back_frame_adds_far_wall() {
        let open = back_frame(112.0, 132.0, 3.0, 1.0, false).unwrap();
        let closed = back_frame(112.0, 132.0, 3.0, 1.0, true).unwrap();
        assert_eq!(open.face_count(), 20);
        assert_eq!(closed.face_count(), 24);
        assert_eq!(closed.vertex_count(), 24);
        let lowest = closed.positions.iter().map(|p| p.z).fold(f64::INFINITY, f64::min);
        assert!((lowest + 2.0).abs() < 1e-12);
    }
}
