//! Tests for the relief displacement stage.

use std::sync::Arc;

use super::grid_plate;
use crate::geom::{
    DISPLACEMENT_STAGE, DisplacementError, DisplacementParams, DisplacementStage, EMBOSS_CHANNEL,
    PolyMesh,
};
use crate::image::HeightImage;

fn flat_image(value: f32) -> Arc<HeightImage> {
    Arc::new(HeightImage::from_intensity("m51.png", 4, 4, vec![value; 16]).unwrap())
}

fn params(invert: bool) -> DisplacementParams {
    DisplacementParams {
        emboss_height: 3.0,
        invert,
        filter_size: 1.0,
    }
}

fn weighted_grid() -> PolyMesh {
    let mut mesh = grid_plate(4.0, 4.0, 2, 2);
    let weights = mesh.ensure_weight_map(EMBOSS_CHANNEL);
    weights.set(4, 1.0);
    weights.set(1, 0.5);
    mesh
}

#[test]
fn bind_names_stage_and_texture() {
    let stage = DisplacementStage::bind("m51", flat_image(0.5), &params(false));
    assert_eq!(stage.name, DISPLACEMENT_STAGE);
    assert_eq!(stage.texture, "Displacement_m51");
    assert_eq!(stage.weight_channel, EMBOSS_CHANNEL);
    assert_eq!(stage.strength, 3.0);
    assert_eq!(stage.mid_level, 1.0);

    let inverted = DisplacementStage::bind("m51", flat_image(0.5), &params(true));
    assert_eq!(inverted.strength, -3.0);
    assert_eq!(inverted.mid_level, -1.0);
}

#[test]
fn offset_scales_with_sample_and_weight() {
    let stage = DisplacementStage::bind("m51", flat_image(0.25), &params(false));
    assert!((stage.offset([0.5, 0.5], 1.0) + 2.25).abs() < 1e-9);
    assert!((stage.offset([0.5, 0.5], 0.5) + 1.125).abs() < 1e-9);
    assert_eq!(stage.offset([0.5, 0.5], 0.0), 0.0);

    let inverted = DisplacementStage::bind("m51", flat_image(0.25), &params(true));
    assert!((inverted.offset([0.5, 0.5], 1.0) + 3.75).abs() < 1e-9);
}

#[test]
fn evaluate_moves_only_weighted_vertices() {
    let mesh = weighted_grid();
    let stage = DisplacementStage::bind("m51", flat_image(0.25), &params(false));
    let displaced = stage.evaluate(&mesh).unwrap();

    assert_eq!(displaced.len(), mesh.vertex_count());
    for (i, (before, after)) in mesh.positions.iter().zip(&displaced).enumerate() {
        assert_eq!(before.x, after.x);
        assert_eq!(before.y, after.y);
        let expected = match i {
            4 => -2.25,
            1 => -1.125,
            _ => 0.0,
        };
        assert!((after.z - before.z - expected).abs() < 1e-9, "vertex {i}");
    }
}

#[test]
fn wider_filter_smooths_a_step() {
    let mut samples = vec![0.0f32; 16];
    for row in samples.chunks_mut(4) {
        row[2] = 1.0;
        row[3] = 1.0;
    }
    let image = Arc::new(HeightImage::from_intensity("step.png", 4, 4, samples).unwrap());
    let sharp = DisplacementParams {
        filter_size: 1.0,
        ..params(false)
    };
    let wide = DisplacementParams {
        filter_size: 3.0,
        ..params(false)
    };
    let sharp = DisplacementStage::bind("step", Arc::clone(&image), &sharp);
    let wide = DisplacementStage::bind("step", image, &wide);

    // centre of pixel column 1, next to the step
    let uv = [0.375, 0.5];
    let a = sharp.offset(uv, 1.0);
    let b = wide.offset(uv, 1.0);
    assert!((a + 3.0).abs() < 1e-9);
    assert!(b > a);
}

#[test]
fn missing_weight_channel_is_an_error() {
    let mesh = grid_plate(4.0, 4.0, 1, 1);
    let stage = DisplacementStage::bind("m51", flat_image(0.5), &params(false));
    assert_eq!(
        stage.evaluate(&mesh),
        Err(DisplacementError::MissingWeightChannel(EMBOSS_CHANNEL.to_owned()))
    );
}
