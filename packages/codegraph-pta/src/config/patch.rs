//! Partial overrides applied on top of a preset
//!
//! Every field is optional; `None` keeps the preset's value.

use super::pta_config::{ContextKind, PtaConfig, WorklistOrder};
use serde::{Deserialize, Serialize};

/// Patch type for PtaConfig
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PtaConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hk: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_kind: Option<ContextKind>,
    #[serde(alias = "heapMerge", skip_serializing_if = "Option::is_none")]
    pub heap_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heap_merge_threshold: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_types: Option<Vec<String>>,
    #[serde(
        alias = "enforceEmptyContextForIgnoredTypes",
        skip_serializing_if = "Option::is_none"
    )]
    pub enforce_empty_context_for_ignored_types: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored_type_prefixes: Option<Vec<String>>,
    #[serde(alias = "entryPoints", skip_serializing_if = "Option::is_none")]
    pub entry_points: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcm_fanout_threshold: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worklist_order: Option<WorklistOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_budget_ms: Option<u64>,
}

impl PtaConfigPatch {
    /// Apply onto `base`
    pub fn apply(self, mut base: PtaConfig) -> PtaConfig {
        if let Some(v) = self.k {
            base.k = v;
        }
        if let Some(v) = self.hk {
            base.hk = v;
        }
        if let Some(v) = self.context_kind {
            base.context_kind = v;
        }
        if let Some(v) = self.heap_merge {
            base.heap_merge = v;
        }
        if let Some(v) = self.heap_merge_threshold {
            base.heap_merge_threshold = v;
        }
        if let Some(v) = self.merge_types {
            base.merge_types = v;
        }
        if let Some(v) = self.enforce_empty_context_for_ignored_types {
            base.enforce_empty_context_for_ignored_types = v;
        }
        if let Some(v) = self.ignored_type_prefixes {
            base.ignored_type_prefixes = v;
        }
        if let Some(v) = self.entry_points {
            base.entry_points = v;
        }
        if let Some(v) = self.pcm_fanout_threshold {
            base.pcm_fanout_threshold = v;
        }
        if let Some(v) = self.worklist_order {
            base.worklist_order = v;
        }
        if let Some(v) = self.time_budget_ms {
            base.time_budget_ms = Some(v);
        }
        base
    }

    /// Full patch reproducing `config` exactly
    pub fn from_config(config: &PtaConfig) -> Self {
        Self {
            k: Some(config.k),
            hk: Some(config.hk),
            context_kind: Some(config.context_kind),
            heap_merge: Some(config.heap_merge),
            heap_merge_threshold: Some(config.heap_merge_threshold),
            merge_types: Some(config.merge_types.clone()),
            enforce_empty_context_for_ignored_types: Some(
                config.enforce_empty_context_for_ignored_types,
            ),
            ignored_type_prefixes: Some(config.ignored_type_prefixes.clone()),
            entry_points: Some(config.entry_points.clone()),
            pcm_fanout_threshold: Some(config.pcm_fanout_threshold),
            worklist_order: Some(config.worklist_order),
            time_budget_ms: config.time_budget_ms,
        }
    }
}
