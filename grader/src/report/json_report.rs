//! @ai:module:intent JSON records for single evaluations and batch runs
//! @ai:module:layer infrastructure
//! @ai:module:public_api EvaluationRecord, BatchRecord, SubmissionRecord, JsonReporter
//! @ai:module:stateless true

use crate::batch::{BatchReport, ModuleUsage, ScenarioStats, ToolStats};
use crate::evaluator::ScoredResult;
use crate::rubric::{Category, CategoryWeights};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// @ai:intent Score block of an evaluation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub total_score: f64,
    pub module_usage_score: f64,
    pub function_correctness_score: f64,
    pub architecture_score: f64,
    pub error_handling_score: f64,
}

impl ScoreRecord {
    /// @ai:intent Score of one category
    /// @ai:effects pure
    pub fn category(&self, category: Category) -> f64 {
        match category {
            Category::ModuleUsage => self.module_usage_score,
            Category::FunctionCorrectness => self.function_correctness_score,
            Category::Architecture => self.architecture_score,
            Category::ErrorHandling => self.error_handling_score,
        }
    }
}

/// @ai:intent Matched catalog identifiers and compliance flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedMetrics {
    pub modules_utilized: Vec<String>,
    pub functions_used: Vec<String>,
    #[serde(default)]
    pub functions_by_module: BTreeMap<String, Vec<String>>,
    pub types_used: BTreeMap<String, Vec<String>>,
    pub constants_used: BTreeMap<String, Vec<String>>,
    pub requirement_compliance: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unincluded_usage: BTreeMap<String, Vec<String>>,
}

/// @ai:intent Serialized outcome of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub scenario: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub submission: String,
    pub scores: ScoreRecord,
    pub detailed_metrics: DetailedMetrics,
    pub recommendations: Vec<String>,
    pub passed: bool,
    pub failure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<CategoryWeights>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub findings: BTreeMap<Category, Vec<String>>,
}

fn listed(map: &BTreeMap<String, std::collections::BTreeSet<String>>) -> BTreeMap<String, Vec<String>> {
    map.iter()
        .map(|(module, names)| (module.clone(), names.iter().cloned().collect()))
        .collect()
}

impl EvaluationRecord {
    /// @ai:intent Project a scored result onto the record layout
    /// @ai:effects pure
    pub fn from_result(result: &ScoredResult) -> Self {
        let matches = result.matches();

        let findings = Category::ALL
            .iter()
            .filter(|&&c| !result.findings(c).is_empty())
            .map(|&c| (c, result.findings(c).to_vec()))
            .collect();

        Self {
            scenario: result.scenario_id().to_string(),
            title: result.scenario_title().map(str::to_string),
            submission: result.submission_id().to_string(),
            scores: ScoreRecord {
                total_score: result.total_score(),
                module_usage_score: round2(result.category_score(Category::ModuleUsage)),
                function_correctness_score: round2(
                    result.category_score(Category::FunctionCorrectness),
                ),
                architecture_score: round2(result.category_score(Category::Architecture)),
                error_handling_score: round2(result.category_score(Category::ErrorHandling)),
            },
            detailed_metrics: DetailedMetrics {
                modules_utilized: matches.modules_included.iter().cloned().collect(),
                functions_used: matches
                    .all_functions()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                functions_by_module: listed(&matches.functions_used),
                types_used: listed(&matches.types_used),
                constants_used: listed(&matches.constants_used),
                requirement_compliance: result.compliance().clone(),
                unincluded_usage: listed(&matches.unincluded_usage),
            },
            recommendations: result.recommendations().to_vec(),
            passed: result.passed(),
            failure: result.failure().map(str::to_string),
            weights: result.weights().copied(),
            findings,
        }
    }
}

/// @ai:intent One batch entry: the tool plus its evaluation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub tool: String,
    #[serde(flatten)]
    pub evaluation: EvaluationRecord,
}

/// @ai:intent Serialized batch run, sufficient to re-render the Markdown report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub generated_at: DateTime<Utc>,
    pub submissions: Vec<SubmissionRecord>,
    pub tool_stats: BTreeMap<String, ToolStats>,
    pub scenario_stats: BTreeMap<String, ScenarioStats>,
    pub module_usage: Vec<ModuleUsage>,
    pub ranking: Vec<String>,
}

impl BatchRecord {
    /// @ai:intent Project a batch report onto the record layout
    /// @ai:effects pure
    pub fn from_report(report: &BatchReport) -> Self {
        Self {
            generated_at: report.generated_at,
            submissions: report
                .entries
                .iter()
                .map(|entry| SubmissionRecord {
                    tool: entry.tool_id.clone(),
                    evaluation: EvaluationRecord::from_result(&entry.result),
                })
                .collect(),
            tool_stats: report.tool_stats.clone(),
            scenario_stats: report.scenario_stats.clone(),
            module_usage: report.module_usage.clone(),
            ranking: report.ranking.clone(),
        }
    }

    /// @ai:intent Load a batch record saved by a previous run
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read results file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse results file: {}", path.display()))
    }
}

/// @ai:intent Trait for JSON report generation
pub trait JsonReporterTrait: Send + Sync {
    /// @ai:intent Write a batch record as JSON
    fn generate(&self, record: &BatchRecord, output_path: &Path) -> Result<()>;
}

/// @ai:intent Writes JSON records to files
pub struct JsonReporter;

impl JsonReporter {
    /// @ai:intent Create a new JSON reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Write a single evaluation record as JSON
    /// @ai:effects fs:write
    pub fn write_evaluation(&self, record: &EvaluationRecord, output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        Ok(())
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporterTrait for JsonReporter {
    /// @ai:intent Generate JSON report to file
    /// @ai:effects fs:write
    fn generate(&self, record: &BatchRecord, output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{build_report, BatchEntry};
    use crate::evaluator::{ScenarioEvaluator, ScenarioEvaluatorTrait};
    use crate::rubric::RubricSet;
    use modgrade_analyzer::ModuleCatalog;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_failed_record_fields() {
        let result = ScoredResult::failed("basic_xyz", "tool_a", "Unknown scenario: basic_xyz");
        let json = serde_json::to_value(EvaluationRecord::from_result(&result)).unwrap();

        assert_eq!(json["scenario"], "basic_xyz");
        assert_eq!(json["submission"], "tool_a");
        assert_eq!(json["scores"]["total_score"], 0.0);
        assert_eq!(json["scores"]["error_handling_score"], 0.0);
        assert_eq!(json["passed"], false);
        assert_eq!(json["failure"], "Unknown scenario: basic_xyz");
        assert!(json["detailed_metrics"]["requirement_compliance"].is_object());
        assert!(json.get("weights").is_none());
        assert!(json.get("title").is_none());
        assert_eq!(json["detailed_metrics"]["functions_used"], serde_json::json!([]));
    }

    #[test]
    fn test_functions_used_is_a_flat_sorted_list() {
        let catalog = Arc::new(ModuleCatalog::builtin().unwrap());
        let rubrics = Arc::new(RubricSet::builtin(&catalog).unwrap());
        let source = "#include \"internal_modules/hal/xgpio_hal.h\"\nint main(void) {\n    xgpio_write_pin(2, 5, 1);\n    xgpio_init_pin(2, 5, 0);\n    return 0;\n}\n";
        let result = ScenarioEvaluator::new(catalog, rubrics)
            .evaluate("tool_a/basic_gpio", source, "basic_gpio")
            .unwrap();

        let json = serde_json::to_value(EvaluationRecord::from_result(&result)).unwrap();
        let metrics = &json["detailed_metrics"];

        assert!(metrics["functions_used"].is_array());
        assert_eq!(
            metrics["functions_used"],
            serde_json::json!(["xgpio_init_pin", "xgpio_write_pin"])
        );
        assert_eq!(
            metrics["functions_by_module"]["xgpio_hal"],
            serde_json::json!(["xgpio_init_pin", "xgpio_write_pin"])
        );
        assert_eq!(json["title"], "Basic GPIO");
    }

    #[test]
    fn test_batch_record_survives_a_save_and_load() {
        let report = build_report(vec![
            BatchEntry {
                tool_id: "alpha".to_string(),
                result: ScoredResult::failed("basic_gpio", "alpha", "source is empty"),
            },
        ]);
        let record = BatchRecord::from_report(&report);

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results.json");
        JsonReporter::new().generate(&record, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"tool\": \"alpha\""));
        assert!(content.contains("\"mean\": null"));

        let loaded = BatchRecord::load(&path).unwrap();
        assert_eq!(loaded.submissions, record.submissions);
        assert_eq!(loaded.ranking, vec!["alpha"]);
        assert!(loaded.tool_stats["alpha"].mean.is_nan());
    }
}
