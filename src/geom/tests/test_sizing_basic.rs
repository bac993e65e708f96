use crate::geom::{GridCuts, PlateDimensions, SizingError, solve_cuts};

#[test]
fn cuts_follow_density_and_aspect() {
    let cuts = solve_cuts(PlateDimensions::new(100.0, 50.0), 2.0).unwrap();
    assert_eq!(cuts, GridCuts { nx: 99, ny: 199 });
    assert_eq!(cuts.total_faces(), 20_000);
}

#[test]
fn square_plate_gets_square_cells() {
    let cuts = solve_cuts(PlateDimensions::new(112.0, 112.0), 2.0).unwrap();
    assert_eq!(cuts.nx, cuts.ny);
    assert_eq!(cuts.nx, 223);
}

#[test]
fn half_way_counts_round_to_even() {
    // sqrt(A * B) = ly * fpu = 2.5
    let cuts = solve_cuts(PlateDimensions::new(1.0, 2.5), 1.0).unwrap();
    assert_eq!(cuts.nx, 1);
    assert_eq!(cuts.ny, 0);
}

#[test]
fn zero_density_yields_negative_counts() {
    let cuts = solve_cuts(PlateDimensions::new(10.0, 20.0), 0.0).unwrap();
    assert_eq!(cuts, GridCuts { nx: -1, ny: -1 });
    assert_eq!(cuts.total_faces(), 0);
}

#[test]
fn rejects_bad_inputs() {
    assert!(matches!(
        solve_cuts(PlateDimensions::new(0.0, 20.0), 2.0),
        Err(SizingError::InvalidExtent { .. })
    ));
    assert!(matches!(
        solve_cuts(PlateDimensions::new(10.0, f64::NAN), 2.0),
        Err(SizingError::InvalidExtent { .. })
    ));
    assert_eq!(
        solve_cuts(PlateDimensions::new(10.0, 20.0), -1.0),
        Err(SizingError::InvalidDensity(-1.0))
    );
}
