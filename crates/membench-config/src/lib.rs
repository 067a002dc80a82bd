//! Configuration system for membench.
//!
//! Load bench configuration from TOML or YAML files to control the size sweep,
//! the heap scope, settle policy and report output without code changes.
//!
//! # Examples
//!
//! ```
//! use membench_config::BenchConfig;
//!
//! let config = BenchConfig::from_toml_str(r#"
//!     target_kind = "Set"
//!
//!     [[sweep]]
//!     type = "range"
//!     from = 0
//!     to = 9
//!
//!     [[sweep]]
//!     type = "range"
//!     from = 10
//!     to = 100
//!     step = 10
//! "#).unwrap();
//!
//! let sizes = config.sweep_sizes().unwrap();
//! assert_eq!(sizes.len(), 20);
//! assert_eq!(sizes[10], 10);
//! assert_eq!(sizes.last(), Some(&100));
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use membench_config::BenchConfig;
//!
//! let config = BenchConfig::load("membench.toml").unwrap_or_default();
//! assert_eq!(config.warmup_count(), 1);
//! ```

use std::path::{Path, PathBuf};

use membench_core::{HeapScope, QuiescencePolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main bench configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BenchConfig {
    /// Descriptive label for what is being measured.
    #[serde(default)]
    pub target_kind: Option<String>,

    /// Which allocations the probe reads.
    #[serde(default)]
    pub heap_scope: HeapScopeConfig,

    /// Unmeasured builds per cell before the baseline is taken.
    #[serde(default)]
    pub warmup_count: Option<usize>,

    /// Container families to register, by name.
    #[serde(default)]
    pub families: Vec<String>,

    /// Sweep segments, concatenated in order.
    #[serde(default)]
    pub sweep: Vec<SweepSegment>,

    /// Settle loop bounds.
    #[serde(default)]
    pub quiescence: QuiescenceConfig,

    /// Report output.
    #[serde(default)]
    pub output: OutputConfig,
}

impl BenchConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the target kind.
    pub fn with_target_kind(mut self, kind: impl Into<String>) -> Self {
        self.target_kind = Some(kind.into());
        self
    }

    /// Appends a sweep segment.
    pub fn with_segment(mut self, segment: SweepSegment) -> Self {
        self.sweep.push(segment);
        self
    }

    /// Adds a family by name.
    pub fn with_family(mut self, name: impl Into<String>) -> Self {
        self.families.push(name.into());
        self
    }

    /// Returns the warmup count, defaulting to 1.
    pub fn warmup_count(&self) -> usize {
        self.warmup_count.unwrap_or(1)
    }

    /// Returns the configured heap scope.
    pub fn heap_scope(&self) -> HeapScope {
        self.heap_scope.into()
    }

    /// Expands every sweep segment, in order. Empty when no segment is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero step or a reversed range.
    pub fn sweep_sizes(&self) -> Result<Vec<usize>, ConfigError> {
        let mut sizes = Vec::new();
        for segment in &self.sweep {
            sizes.extend(segment.sizes()?);
        }
        Ok(sizes)
    }
}

/// Which allocations the probe reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeapScopeConfig {
    /// Only the measuring thread.
    #[default]
    Thread,

    /// The whole process.
    Process,
}

impl From<HeapScopeConfig> for HeapScope {
    fn from(scope: HeapScopeConfig) -> Self {
        match scope {
            HeapScopeConfig::Thread => HeapScope::Thread,
            HeapScopeConfig::Process => HeapScope::Process,
        }
    }
}

/// One piece of the size sweep.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SweepSegment {
    /// Inclusive stepped range.
    Range(RangeSegment),

    /// Explicit list of sizes.
    Sizes(SizesSegment),
}

impl SweepSegment {
    /// Inclusive range with step 1.
    pub fn range(from: usize, to: usize) -> Self {
        SweepSegment::Range(RangeSegment { from, to, step: 1 })
    }

    /// Inclusive range with the given step.
    pub fn stepped(from: usize, to: usize, step: usize) -> Self {
        SweepSegment::Range(RangeSegment { from, to, step })
    }

    /// Explicit sizes.
    pub fn sizes_of(sizes: impl Into<Vec<usize>>) -> Self {
        SweepSegment::Sizes(SizesSegment {
            sizes: sizes.into(),
        })
    }

    /// Expands this segment.
    pub fn sizes(&self) -> Result<Vec<usize>, ConfigError> {
        match self {
            SweepSegment::Range(range) => range.sizes(),
            SweepSegment::Sizes(list) => Ok(list.sizes.clone()),
        }
    }
}

/// Inclusive `from..=to` range visited every `step` sizes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RangeSegment {
    pub from: usize,
    pub to: usize,
    #[serde(default = "default_step")]
    pub step: usize,
}

fn default_step() -> usize {
    1
}

impl RangeSegment {
    fn sizes(&self) -> Result<Vec<usize>, ConfigError> {
        if self.step == 0 {
            return Err(ConfigError::Invalid(format!(
                "sweep range {}..={} has step 0",
                self.from, self.to
            )));
        }
        if self.from > self.to {
            return Err(ConfigError::Invalid(format!(
                "sweep range {}..={} is reversed",
                self.from, self.to
            )));
        }
        Ok((self.from..=self.to).step_by(self.step).collect())
    }
}

/// Explicit list of sizes, measured in the given order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SizesSegment {
    pub sizes: Vec<usize>,
}

/// Settle loop bounds. Unset fields keep the probe defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct QuiescenceConfig {
    pub tolerance_bytes: Option<u64>,
    pub stable_passes: Option<u32>,
    pub max_passes: Option<u32>,
}

impl QuiescenceConfig {
    /// Builds and validates the probe policy.
    pub fn policy(&self) -> Result<QuiescencePolicy, ConfigError> {
        let mut policy = QuiescencePolicy::default();
        if let Some(bytes) = self.tolerance_bytes {
            policy = policy.with_tolerance_bytes(bytes);
        }
        if let Some(passes) = self.stable_passes {
            policy = policy.with_stable_passes(passes);
        }
        if let Some(passes) = self.max_passes {
            policy = policy.with_max_passes(passes);
        }
        policy
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(policy)
    }
}

/// Report output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Destination file; stdout when unset.
    pub path: Option<PathBuf>,
}

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Csv,
}
