//! Configuration System
//!
//! Two levels:
//! - Preset: `PtaConfig::from_preset(Preset::Balanced)` plus builder setters
//! - YAML: versioned document with a preset and partial overrides
//!
//! ```rust,ignore
//! use codegraph_pta::config::{PtaConfig, Preset};
//!
//! let config = PtaConfig::from_preset(Preset::Fast)
//!     .k(2)
//!     .entry_points(["Main.main(java.lang.String[])"]);
//! config.validate()?;
//!
//! let config = PtaConfig::from_yaml_file("pta.yaml")?;
//! ```

pub mod error;
pub mod io;
pub mod patch;
pub mod pta_config;

pub use error::{ConfigError, ConfigResult};
pub use io::ConfigExportV1;
pub use patch::PtaConfigPatch;
pub use pta_config::{ContextKind, Preset, PtaConfig, WorklistOrder, MAX_CONTEXT_DEPTH};
