/*
 * Codegraph PTA - Context-Sensitive Pointer Analysis Engine
 *
 * Feature-First Hexagonal Architecture:
 * - config/     : Presets, YAML loading, validation
 * - errors      : Crate error types
 * - features/   : points_to (domain → ports → infrastructure → application)
 *
 * Pipeline:
 * - Context-insensitive pre-analysis
 * - Precision-critical method selection (Rayon)
 * - Selectively context-sensitive refined run
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Call wiring needs caller + callee coordinates
#![allow(clippy::type_complexity)] // Interning keys are tuples
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::should_implement_trait)] // from_* naming intentional

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Configuration (presets, YAML, validation)
pub mod config;

/// Error types
pub mod errors;

/// Feature modules
pub mod features;

pub use config::{ConfigError, Preset, PtaConfig};
pub use errors::{PtaError, PtaResult};
pub use features::points_to::{
    CancellationToken, PipelineOutcome, PipelineStats, Program, ProgramBuilder,
    PropagationSolver, StagedPipeline,
};
