use relief_engine::geom::{
    DISPLACEMENT_STAGE, EMBOSS_CHANNEL, GridCuts, MeshDiagnostics, PlateDimensions, Point3,
    PolyMesh, SMOOTHING_STAGE, Tolerance, Transform, Vec3,
};
use relief_engine::image::FALLBACK_WARNING;
use relief_engine::{
    ContextError, EditRegion, ExternalEdge, FixtureId, FixtureRegistry, HeightImage, ImageLibrary,
    Plate, RegionError, ReliefError, ReliefRequest, build_relief, build_relief_in,
};

fn library(name: &str, value: f32) -> ImageLibrary {
    let mut images = ImageLibrary::new();
    images.insert(HeightImage::from_intensity(name, 112, 132, vec![value; 112 * 132]).unwrap());
    images
}

fn coarse_request() -> ReliefRequest {
    ReliefRequest {
        faces_per_unit: 0.5,
        ..ReliefRequest::default()
    }
}

fn plate() -> Plate {
    Plate::image_plane("m51", 112, 132, 132.0).unwrap()
}

#[test]
fn full_density_face_count_summary() {
    let mut plate = plate();
    let dims = plate.dimensions().unwrap();
    assert!((dims.lx - 112.0).abs() < 1e-9);
    assert!((dims.ly - 132.0).abs() < 1e-9);

    let report = build_relief(
        &ReliefRequest::default(),
        &mut plate,
        &library("m51.png", 0.5),
        &mut FixtureRegistry::new(),
    )
    .unwrap();
    assert_eq!(report.summary, "59136 total faces");
    assert_eq!(report.total_faces, 59136);
    assert!(report.diagnostics.is_valid_solid());
}

#[test]
fn coarse_plate_becomes_a_bordered_solid() {
    let mut plate = plate();
    let mut fixtures = FixtureRegistry::new();
    let request = coarse_request();
    let report = build_relief(&request, &mut plate, &library("m51.png", 0.5), &mut fixtures).unwrap();

    assert_eq!(report.cuts.total_faces(), 56 * 66);
    assert_eq!(report.region, "local");
    assert_eq!(report.image, "m51.png");
    assert!(report.warnings.is_empty());
    assert_eq!(report.solidify.top_loop_len, report.solidify.bottom_loop_len);
    assert_eq!(report.stack, vec![DISPLACEMENT_STAGE.to_owned(), SMOOTHING_STAGE.to_owned()]);

    let diagnostics = MeshDiagnostics::from_mesh(&plate.mesh);
    assert!(diagnostics.is_valid_solid());
    assert_eq!(diagnostics.open_edge_count, 0);
    // top and bottom loops are creased
    assert_eq!(diagnostics.crease_edge_count, 2 * report.solidify.top_loop_len);

    let weights = plate.mesh.weight_map(EMBOSS_CHANNEL).unwrap();
    let (hx, hy) = (56.0, 66.0);
    let mut pure = 0;
    for (i, p) in plate.mesh.positions.iter().enumerate() {
        if p.z != 0.0 {
            assert_eq!(weights.get(i), 0.0, "base vertex {i} carries relief");
            continue;
        }
        let inset = (hx - p.x.abs()).min(hy - p.y.abs());
        if inset < request.border_width - 1e-6 {
            assert_eq!(weights.get(i), 0.0, "border vertex {i} carries relief");
        } else if inset > request.border_width + 1e-6 {
            assert_eq!(weights.get(i), 1.0, "relief vertex {i} is flat");
            pure += 1;
        }
    }
    assert!(pure > 0);
    assert!(pure <= report.pure_relief_vertices);

    assert_eq!(fixtures.names(), vec!["m51_BackFrameObject".to_owned()]);
}

#[test]
fn relief_offsets_follow_the_image() {
    let mut plate = plate();
    build_relief(
        &coarse_request(),
        &mut plate,
        &library("m51.png", 1.0),
        &mut FixtureRegistry::new(),
    )
    .unwrap();
    let evaluated = plate
        .evaluate(relief_engine::plate::EvaluateOptions {
            skip_smoothing: true,
        })
        .unwrap();
    let weights = plate.mesh.weight_map(EMBOSS_CHANNEL).unwrap();
    for (i, (p, base)) in evaluated.iter().zip(&plate.mesh.positions).enumerate() {
        // a white image leaves everything at the base surface
        assert!((p.z - base.z).abs() < 1e-9, "vertex {i} moved with weight {}", weights.get(i));
    }
}

#[test]
fn unmatched_plate_falls_back_with_warning() {
    let mut plate = plate();
    let report = build_relief(
        &coarse_request(),
        &mut plate,
        &library("andromeda.png", 0.5),
        &mut FixtureRegistry::new(),
    )
    .unwrap();
    assert_eq!(report.image, "andromeda.png");
    assert_eq!(report.warnings, vec![FALLBACK_WARNING.to_owned()]);
}

#[test]
fn empty_library_is_an_error() {
    let mut plate = plate();
    let result = build_relief(
        &coarse_request(),
        &mut plate,
        &ImageLibrary::new(),
        &mut FixtureRegistry::new(),
    );
    assert!(matches!(result, Err(ReliefError::Image(_))));
}

#[test]
fn spike_pass_runs_before_smoothing() {
    let mut plate = plate();
    let request = ReliefRequest {
        spike_removal: true,
        ..coarse_request()
    };
    let report = build_relief(&request, &mut plate, &library("m51.png", 0.5), &mut FixtureRegistry::new())
        .unwrap();
    let spikes = report.spikes.unwrap();
    assert_eq!(spikes.candidates, report.pure_relief_vertices);
    // a flat image has no spikes
    assert!(spikes.adjusted.is_empty());
    assert_eq!(report.stack.last().map(String::as_str), Some(SMOOTHING_STAGE));
}

#[test]
fn invalid_request_is_rejected_before_editing() {
    let mut plate = plate();
    let request = ReliefRequest {
        noise_filter: 0.5,
        ..coarse_request()
    };
    let result = build_relief(&request, &mut plate, &library("m51.png", 0.5), &mut FixtureRegistry::new());
    assert!(matches!(result, Err(ReliefError::Config(_))));
    assert_eq!(plate.mesh.face_count(), 1);
}

#[test]
fn non_uniform_scale_is_rejected() {
    let mut plate = plate();
    plate.scale = Vec3::new(1.0, 2.0, 1.0);
    let result = build_relief(
        &coarse_request(),
        &mut plate,
        &library("m51.png", 0.5),
        &mut FixtureRegistry::new(),
    );
    assert!(matches!(result, Err(ReliefError::Plate(_))));
}

struct Declining;

impl EditRegion for Declining {
    fn label(&self) -> &str {
        "declining"
    }

    fn loop_cut(&self, _: &mut PolyMesh, _: GridCuts, _: PlateDimensions) -> Result<(), RegionError> {
        Err(RegionError::NotApplicable("no view".to_owned()))
    }
}

#[test]
fn no_usable_region_stops_the_pipeline() {
    let mut plate = plate();
    let result = build_relief_in(
        &coarse_request(),
        &mut plate,
        &library("m51.png", 0.5),
        &mut FixtureRegistry::new(),
        &[&Declining, &Declining],
    );
    assert!(matches!(
        result,
        Err(ReliefError::Context(ContextError::NoUsableContext { tried: 2 }))
    ));
}

fn named_top_request() -> ReliefRequest {
    ReliefRequest {
        external_edge: ExternalEdge::Top,
        name_plate: true,
        name_plate_text: "M51".to_owned(),
        ..coarse_request()
    }
}

fn world_positions(fixtures: &FixtureRegistry, plate: &Plate) -> Vec<(String, Vec<Point3>)> {
    fixtures
        .iter()
        .filter_map(|fixture| {
            fixtures
                .world_mesh(fixture.id, plate)
                .unwrap()
                .map(|mesh| (fixture.name.clone(), mesh.positions))
        })
        .collect()
}

#[test]
fn regenerating_fixtures_is_idempotent() {
    let request = named_top_request();
    let mut plate = plate();
    let mut fixtures = FixtureRegistry::new();
    let first = build_relief(&request, &mut plate, &library("m51.png", 0.5), &mut fixtures).unwrap();
    let before = world_positions(&fixtures, &plate);

    let names = fixtures.regenerate(&plate, &request, &first.layout).unwrap();
    assert_eq!(names, first.fixtures);
    assert_eq!(world_positions(&fixtures, &plate), before);
    assert_eq!(
        names,
        vec![
            "m51_wedge".to_owned(),
            "m51_Plate".to_owned(),
            "m51_FontObject".to_owned(),
            "m51_BackFrameObject".to_owned(),
            "m51_PlateBackFrameObject".to_owned(),
        ]
    );
}

#[test]
fn fixtures_follow_plate_motion() {
    let request = named_top_request();
    let mut plate = plate();
    let mut fixtures = FixtureRegistry::new();
    build_relief(&request, &mut plate, &library("m51.png", 0.5), &mut fixtures).unwrap();

    let old_world = plate.world_matrix();
    let before = world_positions(&fixtures, &plate);
    let old_text = fixtures.world_transform(FixtureId::NameText, &plate).unwrap();

    plate.location = Point3::new(10.0, -4.0, 2.5);
    plate.rotation = Vec3::new(0.0, 0.0, 0.4);
    let motion = plate.world_matrix() * old_world.inverse().unwrap();

    let after = world_positions(&fixtures, &plate);
    assert_eq!(before.len(), after.len());
    for ((name, old), (_, new)) in before.iter().zip(&after) {
        for (a, b) in old.iter().zip(new) {
            assert!(
                Tolerance::LOOSE.approx_eq_point3(motion.apply_point(*a), *b),
                "{name} did not move rigidly"
            );
        }
    }

    let text = fixtures.world_transform(FixtureId::NameText, &plate).unwrap();
    let expected: Transform = motion * old_text;
    assert!(text.approx_eq(expected, Tolerance::LOOSE));
}

#[test]
fn dropping_the_name_plate_removes_its_children() {
    let mut plate = plate();
    let mut fixtures = FixtureRegistry::new();
    build_relief(&named_top_request(), &mut plate, &library("m51.png", 0.5), &mut fixtures).unwrap();
    assert_eq!(fixtures.len(), 5);

    let mut second = self::plate();
    let report = build_relief(&coarse_request(), &mut second, &library("m51.png", 0.5), &mut fixtures)
        .unwrap();
    assert_eq!(report.fixtures, vec!["m51_BackFrameObject".to_owned()]);
    assert!(fixtures.get(FixtureId::NameText).is_none());
}

#[test]
fn request_json_uses_operator_names() {
    let request = ReliefRequest::from_json(r#"{ "Fpu": 0.5, "External_edge": "LEFT" }"#).unwrap();
    assert_eq!(request.faces_per_unit, 0.5);
    assert_eq!(request.external_edge, ExternalEdge::Left);
    assert_eq!(request.border_width, 3.0);
    assert!(ReliefRequest::from_json(r#"{ "Spike_reduction_factor": 2.0 }"#).is_err());
}

#[test]
fn fixtures_scale_with_the_plate() {
    let request = named_top_request();
    let location = Point3::new(5.0, -3.0, 1.0);
    let build = |scale: f64| {
        let mut plate = self::plate();
        plate.location = location;
        plate.scale = Vec3::new(scale, scale, scale);
        let mut fixtures = FixtureRegistry::new();
        build_relief(&request, &mut plate, &library("m51.png", 0.5), &mut fixtures).unwrap();
        (plate, fixtures)
    };
    let (unit_plate, unit_fixtures) = build(1.0);
    let (double_plate, double_fixtures) = build(2.0);

    let unit = world_positions(&unit_fixtures, &unit_plate);
    let double = world_positions(&double_fixtures, &double_plate);
    assert_eq!(unit.len(), double.len());
    for ((name, a), (_, b)) in unit.iter().zip(&double) {
        for (p, q) in a.iter().zip(b) {
            let expected = location + (*p - location) * 2.0;
            assert!(
                Tolerance::LOOSE.approx_eq_point3(expected, *q),
                "{name}: {q:?} is not {expected:?}"
            );
        }
    }

    // the back frame lip overlaps the base by one scaled unit
    for (scale, plate, fixtures) in [
        (1.0, &unit_plate, &unit_fixtures),
        (2.0, &double_plate, &double_fixtures),
    ] {
        let world = plate.world_matrix();
        let solid_bottom = plate
            .mesh
            .positions
            .iter()
            .map(|&p| world.apply_point(p).z)
            .fold(f64::INFINITY, f64::min);
        let frame_top = fixtures
            .world_mesh(FixtureId::BackFrame, plate)
            .unwrap()
            .unwrap()
            .positions
            .iter()
            .map(|p| p.z)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((frame_top - solid_bottom - scale).abs() < 1e-9, "scale {scale}");
    }
}

#[test]
fn zero_smooth_levels_leaves_no_smoothing_stage() {
    let mut plate = plate();
    let request = ReliefRequest {
        smooth_levels: 0,
        ..coarse_request()
    };
    let report = build_relief(&request, &mut plate, &library("m51.png", 0.5), &mut FixtureRegistry::new())
        .unwrap();
    assert_eq!(report.stack, vec![DISPLACEMENT_STAGE.to_owned()]);
    assert!(plate.stack.get(SMOOTHING_STAGE).is_none());
    assert!(plate.stack.get(DISPLACEMENT_STAGE).is_some());

    let smoothed = build_relief(
        &coarse_request(),
        &mut self::plate(),
        &library("m51.png", 0.5),
        &mut FixtureRegistry::new(),
    )
    .unwrap();
    assert_eq!(smoothed.stack.last().map(String::as_str), Some(SMOOTHING_STAGE));
}
