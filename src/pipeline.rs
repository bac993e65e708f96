//! The relief pipeline: plate quad in, solid relief with fixtures out.
//!
//! Stages run in a fixed order over one [`Plate`] and return their outputs
//! explicitly; the request is never mutated.
//!
//! 1. size the grid from the plate extents,
//! 2. cut the quad into that grid in the first usable edit region,
//! 3. write the `emboss` weight channel,
//! 4. solidify (extrude, cap, crease, zero rim weights),
//! 5. bind the `bump` displacement to the resolved image,
//! 6. optionally flatten spikes against the unsmoothed evaluation,
//! 7. regenerate fixtures,
//! 8. append the `smooth` stage (unless `smooth_levels` is 0) and check
//!    the result.

use serde::Serialize;
use thiserror::Error;

use crate::config::{ConfigError, ReliefRequest};
use crate::context::{ContextError, EditRegion, LocalRegion, with_first_region};
use crate::fixtures::{FixtureError, FixtureLayout, FixtureRegistry};
use crate::geom::{
    DisplacementError, DisplacementStage, EMBOSS_CHANNEL, GridCuts,
    MeshDiagnostics, MeshError, PlateDimensions, SMOOTHING_STAGE, SizingError, SmoothingStage,
    SolidifyError, SolidifyParams, SolidifyReport, SpikeReport, StageBucket, StageMetrics,
    StageTimingReport, WeightFieldParams, apply_weight_field, remove_spikes, solidify, solve_cuts,
};
use crate::image::{ImageError, ImageLibrary};
use crate::plate::{EvaluateOptions, Modifier, Plate, PlateError};

#[derive(Debug, Error)]
pub enum ReliefError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plate(#[from] PlateError),
    #[error(transparent)]
    Sizing(#[from] SizingError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Solidify(#[from] SolidifyError),
    #[error(transparent)]
    Displacement(#[from] DisplacementError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Fixture(#[from] FixtureError),
}

/// Everything a caller needs to know about one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ReliefReport {
    /// `"<N> total faces"`.
    pub summary: String,
    pub total_faces: i64,
    pub cuts: GridCuts,
    /// Plate extents in mesh units.
    pub dimensions: PlateDimensions,
    /// Edit region that performed the grid cuts.
    pub region: String,
    /// Image bound to the displacement stage.
    pub image: String,
    pub pure_relief_vertices: usize,
    pub solidify: SolidifyReport,
    pub spikes: Option<SpikeReport>,
    pub layout: FixtureLayout,
    pub fixtures: Vec<String>,
    pub stack: Vec<String>,
    pub warnings: Vec<String>,
    pub diagnostics: MeshDiagnostics,
    pub timing: Option<StageTimingReport>,
}

/// Runs the pipeline with the in-process edit region.
pub fn build_relief(
    request: &ReliefRequest,
    plate: &mut Plate,
    images: &ImageLibrary,
    fixtures: &mut FixtureRegistry,
) -> Result<ReliefReport, ReliefError> {
    let local = LocalRegion;
    build_relief_in(request, plate, images, fixtures, &[&local])
}

/// Runs the pipeline, cutting the grid in the first region of `regions`
/// that accepts the edit.
pub fn build_relief_in(
    request: &ReliefRequest,
    plate: &mut Plate,
    images: &ImageLibrary,
    fixtures: &mut FixtureRegistry,
    regions: &[&dyn EditRegion],
) -> Result<ReliefReport, ReliefError> {
    request.validate()?;
    plate.uniform_scale()?;
    let mut metrics = StageMetrics::default();
    metrics.begin();
    let mut warnings = Vec::new();

    // ── sizing ──────────────────────────────────────────────────────────────
    let dims = plate.dimensions()?;
    let cuts = metrics.time(StageBucket::Sizing, || {
        solve_cuts(dims, request.faces_per_unit)
    })?;
    let total_faces = cuts.total_faces();
    let summary = format!("{total_faces} total faces");
    log::info!("{summary}");
    log::debug!("plate {}x{}: nx={} ny={}", dims.lx, dims.ly, cuts.nx, cuts.ny);

    // ── grid ────────────────────────────────────────────────────────────────
    let ((), region) = metrics.time(StageBucket::Subdivision, || {
        with_first_region(regions, |region| region.loop_cut(&mut plate.mesh, cuts, dims))
    })?;

    // ── weights ─────────────────────────────────────────────────────────────
    let params = WeightFieldParams {
        center: plate.center(),
        lx: dims.lx,
        ly: dims.ly,
        border_width: request.border_width,
        external: request.external_edge.mask(),
        mode: request.weight_mode,
        emboss_height: request.emboss_height,
    };
    let pure_relief = metrics.time(StageBucket::WeightField, || {
        apply_weight_field(&mut plate.mesh, &params)
    });
    log::debug!("{} pure relief vertices", pure_relief.len());

    // ── solid ───────────────────────────────────────────────────────────────
    let solid = metrics.time(StageBucket::Solidify, || {
        solidify(
            &mut plate.mesh,
            &SolidifyParams {
                emboss_height: request.emboss_height,
                base_height: request.base_height,
                weight_channel: EMBOSS_CHANNEL,
            },
        )
    })?;
    log::debug!(
        "solidified: loops {}/{}, {} cap vertices",
        solid.top_loop_len,
        solid.bottom_loop_len,
        solid.cap_vertices.len()
    );

    // ── displacement ────────────────────────────────────────────────────────
    let matched = images.resolve(&plate.name)?;
    warnings.extend(matched.warning);
    let image = matched.image.name().to_owned();
    metrics.time(StageBucket::Displacement, || {
        let stage =
            DisplacementStage::bind(&plate.name, matched.image, &request.displacement_params());
        plate.stack.set(Modifier::Displace(stage));
    });

    // ── spikes ──────────────────────────────────────────────────────────────
    let spikes = if request.spike_removal {
        plate.stack.remove(SMOOTHING_STAGE);
        if pure_relief.is_empty() {
            log::warn!("spike removal requested but no vertex carries full relief");
        }
        let report = metrics.time(StageBucket::SpikeFilter, || {
            let evaluated = plate.evaluate(EvaluateOptions {
                skip_smoothing: true,
            })?;
            let report =
                remove_spikes(&mut plate.mesh, &evaluated, &pure_relief, &request.spike_params())?;
            Ok::<_, ReliefError>(report)
        })?;
        log::debug!("flattened {} spikes", report.adjusted.len());
        Some(report)
    } else {
        None
    };

    // ── fixtures ────────────────────────────────────────────────────────────
    let layout = FixtureLayout::compute(request, dims);
    let fixture_names = metrics.time(StageBucket::Fixtures, || {
        fixtures.regenerate(&*plate, request, &layout)
    })?;

    if request.smooth_levels > 0 {
        plate
            .stack
            .set(Modifier::Smooth(SmoothingStage::new(request.smooth_levels)));
    } else {
        plate.stack.remove(SMOOTHING_STAGE);
    }

    // ── checks ──────────────────────────────────────────────────────────────
    let diagnostics = metrics.time(StageBucket::Diagnostics, || {
        MeshDiagnostics::from_mesh(&plate.mesh)
    });
    if !diagnostics.is_valid_solid() {
        log::warn!("relief solid failed validation: {diagnostics}");
        warnings.extend(diagnostics.warnings.iter().cloned());
    }

    Ok(ReliefReport {
        summary,
        total_faces,
        cuts,
        dimensions: dims,
        region,
        image,
        pure_relief_vertices: pure_relief.len(),
        solidify: solid,
        spikes,
        layout,
        fixtures: fixture_names,
        stack: plate.stack.names().into_iter().map(str::to_owned).collect(),
        warnings,
        diagnostics,
        timing: metrics.end(),
    })
}
