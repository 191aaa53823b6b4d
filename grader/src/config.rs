//! @ai:module:intent Configuration structs for the grading system
//! @ai:module:layer infrastructure
//! @ai:module:public_api GraderConfig, LimitsConfig, ScoringConfig, BatchConfig, PathConfig
//! @ai:module:stateless true

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// @ai:intent Main configuration for the grading system
/// @ai:effects pure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraderConfig {
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub paths: PathConfig,
}

/// @ai:intent Input size limits
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: usize,
}

/// @ai:intent Tunable scoring constants
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Categories scoring below this value get a recommendation
    #[serde(default = "default_recommendation_threshold")]
    pub recommendation_threshold: f64,
    /// Maximum module_usage bonus for optional modules
    #[serde(default = "default_optional_module_bonus")]
    pub optional_module_bonus: f64,
    /// module_usage penalty per module used without its header
    #[serde(default = "default_unincluded_usage_penalty")]
    pub unincluded_usage_penalty: f64,
}

/// @ai:intent Batch execution configuration
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// @ai:intent Path configuration for catalog, rubrics and results
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Module catalog TOML; the built-in catalog is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    /// Scenario rubric TOML; the built-in scenarios are used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<PathBuf>,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_source_bytes: default_max_source_bytes(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            recommendation_threshold: default_recommendation_threshold(),
            optional_module_bonus: default_optional_module_bonus(),
            unincluded_usage_penalty: default_unincluded_usage_penalty(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            scenarios: None,
            results_dir: default_results_dir(),
        }
    }
}

fn default_max_source_bytes() -> usize {
    1024 * 1024
}

fn default_recommendation_threshold() -> f64 {
    6.0
}

fn default_optional_module_bonus() -> f64 {
    1.0
}

fn default_unincluded_usage_penalty() -> f64 {
    0.5
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

impl GraderConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// @ai:intent Load configuration from a file when given, defaults otherwise
    /// @ai:effects fs:read
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// @ai:intent Reject values that make scoring meaningless
    /// @ai:effects pure
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_source_bytes == 0 {
            anyhow::bail!("limits.max_source_bytes must be positive");
        }
        if self.batch.workers == 0 {
            anyhow::bail!("batch.workers must be at least 1");
        }

        let scoring = &self.scoring;
        if !(0.0..=10.0).contains(&scoring.recommendation_threshold) {
            anyhow::bail!("scoring.recommendation_threshold must be within [0, 10]");
        }
        if !(0.0..=10.0).contains(&scoring.optional_module_bonus) {
            anyhow::bail!("scoring.optional_module_bonus must be within [0, 10]");
        }
        if !(0.0..=10.0).contains(&scoring.unincluded_usage_penalty) {
            anyhow::bail!("scoring.unincluded_usage_penalty must be within [0, 10]");
        }

        Ok(())
    }
}
