//! Opt-in stage timing for the relief pipeline.
//!
//! Timing is only collected when the `mesh_engine_metrics` feature is enabled
//! and the target is not `wasm32` (`std::time::Instant` is unavailable there).
//! Otherwise every call compiles down to invoking the closure.
//!
//! ```ignore
//! let mut metrics = StageMetrics::default();
//! metrics.begin();
//! let cuts = metrics.time(StageBucket::Sizing, || solve_cuts(dims, fpu))?;
//! if let Some(report) = metrics.end() {
//!     println!("sizing: {} ns", report.sizing_ns);
//! }
//! ```

use serde::Serialize;

/// Pipeline stages that accumulate time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageBucket {
    Sizing,
    Subdivision,
    WeightField,
    Solidify,
    Displacement,
    SpikeFilter,
    Fixtures,
    Diagnostics,
}

/// Cumulative nanoseconds per stage.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StageTimingReport {
    pub sizing_ns: u64,
    pub subdivision_ns: u64,
    pub weight_field_ns: u64,
    pub solidify_ns: u64,
    pub displacement_ns: u64,
    pub spike_filter_ns: u64,
    pub fixtures_ns: u64,
    pub diagnostics_ns: u64,
}

impl StageTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.sizing_ns
            .saturating_add(self.subdivision_ns)
            .saturating_add(self.weight_field_ns)
            .saturating_add(self.solidify_ns)
            .saturating_add(self.displacement_ns)
            .saturating_add(self.spike_filter_ns)
            .saturating_add(self.fixtures_ns)
            .saturating_add(self.diagnostics_ns)
    }

    /// Total time in milliseconds, for display.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    #[allow(dead_code)]
    fn bucket_mut(&mut self, bucket: StageBucket) -> &mut u64 {
        match bucket {
            StageBucket::Sizing => &mut self.sizing_ns,
            StageBucket::Subdivision => &mut self.subdivision_ns,
            StageBucket::WeightField => &mut self.weight_field_ns,
            StageBucket::Solidify => &mut self.solidify_ns,
            StageBucket::Displacement => &mut self.displacement_ns,
            StageBucket::SpikeFilter => &mut self.spike_filter_ns,
            StageBucket::Fixtures => &mut self.fixtures_ns,
            StageBucket::Diagnostics => &mut self.diagnostics_ns,
        }
    }
}

/// Accumulator wrapped around each pipeline stage.
///
/// When metrics are disabled all methods are no-ops and [`end`](Self::end)
/// returns `None`.
#[derive(Debug, Default)]
pub struct StageMetrics {
    #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
    report: StageTimingReport,
}

impl StageMetrics {
    /// Resets all counters.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
        {
            self.report = StageTimingReport::default();
        }
    }

    #[must_use]
    pub fn end(&self) -> Option<StageTimingReport> {
        #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Runs `f` and adds its elapsed time to `bucket`.
    pub fn time<R>(&mut self, bucket: StageBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            let slot = self.report.bucket_mut(bucket);
            *slot = slot.saturating_add(nanos);
            result
        }

        #[cfg(not(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_total_sums_all_stages() {
        let report = StageTimingReport {
            sizing_ns: 1000,
            solidify_ns: 2000,
            spike_filter_ns: 3000,
            ..Default::default()
        };
        assert_eq!(report.total_ns(), 6000);
        assert!((report.total_ms() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn time_returns_closure_result() {
        let mut metrics = StageMetrics::default();
        metrics.begin();
        assert_eq!(metrics.time(StageBucket::Solidify, || 42), 42);
        #[cfg(not(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32"))))]
        assert!(metrics.end().is_none());
    }
}
