mod cap;
mod core;
mod diagnostics;
mod displacement;
mod mesh;
mod metrics;
mod sizing;
mod smoothing;
mod solidify;
mod spike;
mod subdivide;
mod weight_field;
mod weights;

pub use cap::{CapFill, CapKind, fill_loop};
pub use core::{BBox, Point3, Tolerance, Transform, Vec3};
pub use diagnostics::MeshDiagnostics;
pub use displacement::{
    DISPLACEMENT_STAGE, DisplaceDirection, DisplacementError, DisplacementParams,
    DisplacementStage,
};
pub use mesh::{BoundaryLoop, EdgeTag, MeshEdge, MeshError, MeshFace, PolyMesh, TriangleMesh};
pub use metrics::{StageBucket, StageMetrics, StageTimingReport};
pub use sizing::{GridCuts, PlateDimensions, SizingError, solve_cuts};
pub use smoothing::{SMOOTHING_STAGE, SmoothingStage};
pub use solidify::{SolidifyError, SolidifyParams, SolidifyReport, solidify};
pub use spike::{SpikeParams, SpikeReport, remove_spikes};
pub use subdivide::subdivide_grid;
pub use weight_field::{EdgeMask, WeightFieldParams, WeightMode, apply_weight_field};
pub use weights::{EMBOSS_CHANNEL, WeightMap};

#[cfg(test)]
mod tests;
