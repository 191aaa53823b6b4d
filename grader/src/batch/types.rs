//! @ai:module:intent Batch submission and report types
//! @ai:module:layer domain
//! @ai:module:public_api Submission, SubmissionSource, BatchEntry, BatchReport, ToolStats, ScenarioStats, ScenarioRankEntry, ModuleUsage, Consistency
//! @ai:module:stateless true

use crate::evaluator::{EvaluationError, ScoredResult};
use crate::rubric::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// @ai:intent Where a submission's source text comes from
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionSource {
    Text(String),
    File(PathBuf),
}

/// @ai:intent One generated program to grade, tagged with the tool that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub tool_id: String,
    pub scenario_id: String,
    pub source: SubmissionSource,
}

impl Submission {
    pub fn from_text(
        tool_id: impl Into<String>,
        scenario_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            scenario_id: scenario_id.into(),
            source: SubmissionSource::Text(text.into()),
        }
    }

    pub fn from_file(
        tool_id: impl Into<String>,
        scenario_id: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            scenario_id: scenario_id.into(),
            source: SubmissionSource::File(path.into()),
        }
    }

    /// @ai:intent Identifier of this submission: the tool plus the file name or scenario
    /// @ai:example (alpha, basic_gpio, File("tools/alpha/basic_gpio.c")) -> "alpha/basic_gpio.c"
    /// @ai:example (alpha, basic_gpio, Text(..)) -> "alpha/basic_gpio"
    /// @ai:effects pure
    pub fn id(&self) -> String {
        let name = match &self.source {
            SubmissionSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.scenario_id.clone()),
            SubmissionSource::Text(_) => self.scenario_id.clone(),
        };
        format!("{}/{}", self.tool_id, name)
    }

    /// @ai:intent Read the source text, refusing files above the size limit
    /// @ai:effects fs:read
    pub fn load(&self, max_bytes: usize) -> Result<String, EvaluationError> {
        let path = match &self.source {
            SubmissionSource::Text(text) => return Ok(text.clone()),
            SubmissionSource::File(path) => path,
        };

        let unreadable =
            |e: std::io::Error| EvaluationError::SourceUnreadable(format!("{}: {}", path.display(), e));

        let size = std::fs::metadata(path).map_err(unreadable)?.len() as usize;
        if size > max_bytes {
            return Err(EvaluationError::SourceTooLarge {
                size,
                limit: max_bytes,
            });
        }

        let bytes = std::fs::read(path).map_err(unreadable)?;
        String::from_utf8(bytes).map_err(|_| {
            EvaluationError::SourceUnreadable(format!("{}: not valid UTF-8", path.display()))
        })
    }
}

/// @ai:intent A scored (or failed) submission in batch order
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub tool_id: String,
    pub result: ScoredResult,
}

/// @ai:intent Spread classification of a tool's scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    VeryConsistent,
    Consistent,
    ModeratelyConsistent,
    Inconsistent,
}

impl Consistency {
    /// @ai:intent Classify a standard deviation
    /// @ai:example (0.4) -> VeryConsistent
    /// @ai:example (2.5) -> ModeratelyConsistent
    /// @ai:effects pure
    pub fn from_stdev(stdev: f64) -> Self {
        if stdev < 1.0 {
            Consistency::VeryConsistent
        } else if stdev < 2.0 {
            Consistency::Consistent
        } else if stdev < 3.0 {
            Consistency::ModeratelyConsistent
        } else {
            Consistency::Inconsistent
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Consistency::VeryConsistent => "Very Consistent",
            Consistency::Consistent => "Consistent",
            Consistency::ModeratelyConsistent => "Moderately Consistent",
            Consistency::Inconsistent => "Inconsistent",
        }
    }
}

/// @ai:intent Score statistics of one tool across its successfully scored submissions
/// @ai:post NaN statistics when nothing was scored; serialized as null
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolStats {
    pub tool_id: String,
    pub scored: usize,
    pub failed: usize,
    #[serde(with = "nullable_f64")]
    pub mean: f64,
    #[serde(with = "nullable_f64")]
    pub stdev: f64,
    #[serde(with = "nullable_f64")]
    pub min: f64,
    #[serde(with = "nullable_f64")]
    pub max: f64,
    #[serde(with = "nullable_f64")]
    pub median: f64,
    pub category_means: BTreeMap<Category, f64>,
    pub consistency: Option<Consistency>,
}

impl ToolStats {
    pub fn has_scores(&self) -> bool {
        self.scored > 0
    }
}

/// @ai:intent One tool's position in a scenario ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRankEntry {
    pub tool_id: String,
    pub score: f64,
}

/// @ai:intent Score statistics of one scenario across tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStats {
    pub scenario_id: String,
    pub scored: usize,
    pub failed: usize,
    #[serde(with = "nullable_f64")]
    pub mean: f64,
    #[serde(with = "nullable_f64")]
    pub stdev: f64,
    #[serde(with = "nullable_f64")]
    pub min: f64,
    #[serde(with = "nullable_f64")]
    pub max: f64,
    pub ranking: Vec<ScenarioRankEntry>,
}

/// @ai:intent How widely a catalog module was included across tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleUsage {
    pub module_id: String,
    /// Fraction of tools that included the module at least once
    pub frequency: f64,
    pub tools: Vec<String>,
}

/// @ai:intent Outcome of a batch run, entries in submission order
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<BatchEntry>,
    pub tool_stats: BTreeMap<String, ToolStats>,
    pub scenario_stats: BTreeMap<String, ScenarioStats>,
    pub module_usage: Vec<ModuleUsage>,
    pub ranking: Vec<String>,
}

impl BatchReport {
    pub fn failed_entries(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter().filter(|entry| entry.result.is_failed())
    }
}

/// Non-finite values as JSON null, null back as NaN
pub(crate) mod nullable_f64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_consistency_bands() {
        assert_eq!(Consistency::from_stdev(0.0), Consistency::VeryConsistent);
        assert_eq!(Consistency::from_stdev(1.0), Consistency::Consistent);
        assert_eq!(Consistency::from_stdev(2.99), Consistency::ModeratelyConsistent);
        assert_eq!(Consistency::from_stdev(3.0), Consistency::Inconsistent);
        assert_eq!(Consistency::Consistent.label(), "Consistent");
    }

    #[test]
    fn test_load_rejects_large_and_binary_files() {
        let temp = TempDir::new().unwrap();
        let large = temp.path().join("large.c");
        let binary = temp.path().join("binary.c");
        std::fs::write(&large, "x".repeat(100)).unwrap();
        std::fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();

        assert_eq!(
            Submission::from_file("t", "s", &large).load(10),
            Err(EvaluationError::SourceTooLarge { size: 100, limit: 10 })
        );
        assert!(matches!(
            Submission::from_file("t", "s", &binary).load(10),
            Err(EvaluationError::SourceUnreadable(_))
        ));
        assert!(matches!(
            Submission::from_file("t", "s", temp.path().join("missing.c")).load(10),
            Err(EvaluationError::SourceUnreadable(_))
        ));
    }

    #[test]
    fn test_nan_stats_serialize_as_null() {
        let stats = ToolStats {
            tool_id: "tool_a".to_string(),
            scored: 0,
            failed: 2,
            mean: f64::NAN,
            stdev: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            median: f64::NAN,
            category_means: BTreeMap::new(),
            consistency: None,
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["mean"], serde_json::Value::Null);

        let back: ToolStats = serde_json::from_value(json).unwrap();
        assert!(back.mean.is_nan());
        assert!(!back.has_scores());
    }
}
