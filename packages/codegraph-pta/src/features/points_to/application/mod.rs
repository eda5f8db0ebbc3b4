//! Application layer for Points-to Analysis
//!
//! - **StagedPipeline**: pre-analysis, precision selection, refined run
//! - **PrecisionReport**: call site fan-out and the precision-critical methods
//! - **PipelineStats**: reachable/PCM/CI counts and per-method node counts

pub mod diagnostics;
pub mod precision_selection;
pub mod staged_pipeline;

pub use diagnostics::{method_node_count, PipelineStats};
pub use precision_selection::{select_precision_critical, CallSiteFanOut, PrecisionReport};
pub use staged_pipeline::{PipelineOutcome, StagedPipeline};
