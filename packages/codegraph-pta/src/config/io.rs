//! Configuration I/O (YAML loading)
//!
//! Schema v1:
//!
//! ```yaml
//! version: 1
//! preset: balanced        # optional, defaults to balanced
//! pta:                    # optional overrides
//!   k: 2
//!   heapMerge: true
//!   entryPoints: ["Main.main(java.lang.String[])"]
//! ```

use super::error::{ConfigError, ConfigResult};
use super::patch::PtaConfigPatch;
use super::pta_config::{Preset, PtaConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1); optional only so its absence can
    /// be reported precisely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Base preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<Preset>,

    /// Fine-grained overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pta: Option<PtaConfigPatch>,
}

impl PtaConfig {
    /// Parse and validate a v1 YAML document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        match export.version {
            None => return Err(ConfigError::MissingVersion),
            Some(v) if !SUPPORTED_VERSIONS.contains(&v) => {
                return Err(ConfigError::UnsupportedVersion {
                    found: v,
                    supported: SUPPORTED_VERSIONS.to_vec(),
                })
            }
            Some(_) => {}
        }

        let base = PtaConfig::from_preset(export.preset.unwrap_or(Preset::Balanced));
        let config = match export.pta {
            Some(patch) => patch.apply(base),
            None => base,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a v1 YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serialize as a complete v1 document
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: Some(1),
            preset: None,
            pta: Some(PtaConfigPatch::from_config(self)),
        };
        Ok(serde_yaml::to_string(&export)?)
    }
}
