//! Common test utilities for codegraph-pta
//!
//! Shared fixture programs, solver builders and assertions
//! for the integration tests.

#![allow(dead_code)]

mod fixtures;
mod assertions;
mod builders;

// Re-export all utilities
pub use fixtures::*;
pub use assertions::*;
pub use builders::*;
