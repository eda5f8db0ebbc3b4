//! Pointer analysis configuration
//!
//! Every knob of the staged pipeline in one struct: context depth and
//! flavour, heap merging, ignored types, entry points, the precision
//! selection threshold and solver scheduling.

use super::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound for `k`; deeper strings explode the context universe
pub const MAX_CONTEXT_DEPTH: usize = 8;

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// 1-object, context-insensitive heap, heap merging on
    Fast,
    /// 2-object with 1-object heap, heap merging on
    Balanced,
    /// 3-object with 2-object heap, no merging
    Precise,
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "precise" => Ok(Self::Precise),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Precise => "precise",
        };
        f.write_str(name)
    }
}

/// Kind of context elements used for precision-critical methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    CallSite,
    Object,
}

/// Worklist scheduling; the fixpoint does not depend on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorklistOrder {
    #[default]
    Fifo,
    Lifo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PtaConfig {
    /// Method context depth
    pub k: usize,

    /// Heap context depth (at most `k`)
    pub hk: usize,

    pub context_kind: ContextKind,

    /// Enable heuristic heap abstraction in the refined run
    #[serde(alias = "heapMerge")]
    pub heap_merge: bool,

    /// Types with more allocation sites than this are merged
    pub heap_merge_threshold: usize,

    /// Types that are always merged when `heap_merge` is on
    pub merge_types: Vec<String>,

    /// Force the empty context for library and ignored types
    #[serde(alias = "enforceEmptyContextForIgnoredTypes")]
    pub enforce_empty_context_for_ignored_types: bool,

    /// Type name prefixes treated like library types
    pub ignored_type_prefixes: Vec<String>,

    /// Entry method signatures, `Class.subsig`
    #[serde(alias = "entryPoints")]
    pub entry_points: Vec<String>,

    /// Call sites with more distinct targets than this make their method
    /// precision-critical
    pub pcm_fanout_threshold: usize,

    pub worklist_order: WorklistOrder,

    /// Whole-run budget per solver run (None = unlimited)
    pub time_budget_ms: Option<u64>,
}

impl PtaConfig {
    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.k > MAX_CONTEXT_DEPTH {
            return Err(ConfigError::range_with_hint(
                "k",
                self.k,
                0,
                MAX_CONTEXT_DEPTH,
                "Context depth beyond 8 is never tractable",
            ));
        }

        if self.hk > self.k {
            return Err(ConfigError::range_with_hint(
                "hk",
                self.hk,
                0,
                self.k,
                "Heap context depth cannot exceed method context depth",
            ));
        }

        if self.heap_merge_threshold == 0 || self.heap_merge_threshold > 1_000_000 {
            return Err(ConfigError::range_with_hint(
                "heap_merge_threshold",
                self.heap_merge_threshold,
                1,
                1_000_000,
                "A zero threshold would merge every type",
            ));
        }

        if self.pcm_fanout_threshold == 0 || self.pcm_fanout_threshold > 10_000 {
            return Err(ConfigError::range_with_hint(
                "pcm_fanout_threshold",
                self.pcm_fanout_threshold,
                1,
                10_000,
                "Monomorphic call sites (fan-out 1) are never precision-critical",
            ));
        }

        if self.time_budget_ms == Some(0) {
            return Err(ConfigError::validation(
                "time_budget_ms must be positive or omitted for unlimited",
            ));
        }

        if let Some(blank) = self.entry_points.iter().find(|e| e.trim().is_empty()) {
            return Err(ConfigError::validation(format!(
                "entry_points contains a blank signature: {:?}",
                blank
            )));
        }

        Ok(())
    }

    /// Builder: Set k
    pub fn k(mut self, v: usize) -> Self {
        self.k = v;
        self
    }

    /// Builder: Set hk
    pub fn hk(mut self, v: usize) -> Self {
        self.hk = v;
        self
    }

    /// Builder: Set context_kind
    pub fn context_kind(mut self, v: ContextKind) -> Self {
        self.context_kind = v;
        self
    }

    /// Builder: Set heap_merge
    pub fn heap_merge(mut self, v: bool) -> Self {
        self.heap_merge = v;
        self
    }

    /// Builder: Set heap_merge_threshold
    pub fn heap_merge_threshold(mut self, v: usize) -> Self {
        self.heap_merge_threshold = v;
        self
    }

    /// Builder: Set merge_types
    pub fn merge_types<S: Into<String>>(mut self, v: impl IntoIterator<Item = S>) -> Self {
        self.merge_types = v.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: Set enforce_empty_context_for_ignored_types
    pub fn enforce_empty_context_for_ignored_types(mut self, v: bool) -> Self {
        self.enforce_empty_context_for_ignored_types = v;
        self
    }

    /// Builder: Set ignored_type_prefixes
    pub fn ignored_type_prefixes<S: Into<String>>(
        mut self,
        v: impl IntoIterator<Item = S>,
    ) -> Self {
        self.ignored_type_prefixes = v.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: Set entry_points
    pub fn entry_points<S: Into<String>>(mut self, v: impl IntoIterator<Item = S>) -> Self {
        self.entry_points = v.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: Set pcm_fanout_threshold
    pub fn pcm_fanout_threshold(mut self, v: usize) -> Self {
        self.pcm_fanout_threshold = v;
        self
    }

    /// Builder: Set worklist_order
    pub fn worklist_order(mut self, v: WorklistOrder) -> Self {
        self.worklist_order = v;
        self
    }

    /// Builder: Set time_budget_ms
    pub fn time_budget_ms(mut self, v: Option<u64>) -> Self {
        self.time_budget_ms = v;
        self
    }

    /// Get preset configuration
    pub fn from_preset(preset: Preset) -> Self {
        let jdk_prefixes = ["java.", "javax.", "jdk.", "sun."]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        let string_types = [
            "java.lang.String",
            "java.lang.StringBuilder",
            "java.lang.StringBuffer",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();

        match preset {
            Preset::Fast => Self {
                k: 1,
                hk: 0,
                context_kind: ContextKind::Object,
                heap_merge: true,
                heap_merge_threshold: 32,
                merge_types: string_types,
                enforce_empty_context_for_ignored_types: true,
                ignored_type_prefixes: jdk_prefixes,
                entry_points: Vec::new(),
                pcm_fanout_threshold: 1,
                worklist_order: WorklistOrder::Fifo,
                time_budget_ms: Some(60_000),
            },
            Preset::Balanced => Self {
                k: 2,
                hk: 1,
                context_kind: ContextKind::Object,
                heap_merge: true,
                heap_merge_threshold: 64,
                merge_types: string_types,
                enforce_empty_context_for_ignored_types: true,
                ignored_type_prefixes: jdk_prefixes,
                entry_points: Vec::new(),
                pcm_fanout_threshold: 1,
                worklist_order: WorklistOrder::Fifo,
                time_budget_ms: None,
            },
            Preset::Precise => Self {
                k: 3,
                hk: 2,
                context_kind: ContextKind::Object,
                heap_merge: false,
                heap_merge_threshold: 64,
                merge_types: Vec::new(),
                enforce_empty_context_for_ignored_types: false,
                ignored_type_prefixes: Vec::new(),
                entry_points: Vec::new(),
                pcm_fanout_threshold: 1,
                worklist_order: WorklistOrder::Fifo,
                time_budget_ms: None,
            },
        }
    }
}

impl Default for PtaConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}
