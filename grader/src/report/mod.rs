//! @ai:module:intent Report generation for evaluations and batch runs
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReportGenerator, JsonReporter, MarkdownReporter, EvaluationRecord, BatchRecord

pub mod json_report;
pub mod markdown_report;

pub use json_report::{
    BatchRecord, DetailedMetrics, EvaluationRecord, JsonReporter, JsonReporterTrait, ScoreRecord,
    SubmissionRecord,
};
pub use markdown_report::{MarkdownReporter, MarkdownReporterTrait};

use anyhow::{Context, Result};
use std::path::Path;

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    json: JsonReporter,
    markdown: MarkdownReporter,
}

impl ReportGenerator {
    /// @ai:intent Create a new report generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            json: JsonReporter::new(),
            markdown: MarkdownReporter::new(),
        }
    }

    /// @ai:intent Write results.json and results.md for a batch
    /// @ai:effects fs:write
    pub fn generate_all(&self, record: &BatchRecord, output_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        self.json.generate(record, &output_dir.join("results.json"))?;
        self.markdown
            .generate(record, &output_dir.join("results.md"))?;

        tracing::info!("Reports generated in {}", output_dir.display());
        Ok(())
    }

    /// @ai:intent Re-render results.md from a saved batch record
    /// @ai:effects fs:write
    pub fn generate_markdown(&self, record: &BatchRecord, output_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let path = output_dir.join("results.md");
        self.markdown.generate(record, &path)?;

        tracing::info!("Markdown report written to {}", path.display());
        Ok(())
    }

    /// @ai:intent Write the JSON and/or Markdown form of a single evaluation
    /// @ai:effects fs:write
    pub fn write_evaluation(
        &self,
        record: &EvaluationRecord,
        json_path: Option<&Path>,
        markdown_path: Option<&Path>,
    ) -> Result<()> {
        if let Some(path) = json_path {
            self.json.write_evaluation(record, path)?;
            tracing::info!("Evaluation JSON written to {}", path.display());
        }

        if let Some(path) = markdown_path {
            self.markdown.write_evaluation(record, path)?;
            tracing::info!("Evaluation report written to {}", path.display());
        }

        Ok(())
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{build_report, BatchEntry};
    use crate::evaluator::ScoredResult;
    use tempfile::TempDir;

    #[test]
    fn test_generate_all_then_rerender() {
        let temp = TempDir::new().unwrap();
        let run_dir = temp.path().join("run");
        let report = build_report(vec![BatchEntry {
            tool_id: "alpha".to_string(),
            result: ScoredResult::failed("basic_gpio", "alpha", "source is empty"),
        }]);
        let generator = ReportGenerator::new();

        generator
            .generate_all(&BatchRecord::from_report(&report), &run_dir)
            .unwrap();
        assert!(run_dir.join("results.json").exists());
        let original = std::fs::read_to_string(run_dir.join("results.md")).unwrap();

        let loaded = BatchRecord::load(&run_dir.join("results.json")).unwrap();
        let rerender_dir = temp.path().join("rerender");
        generator.generate_markdown(&loaded, &rerender_dir).unwrap();

        assert_eq!(
            std::fs::read_to_string(rerender_dir.join("results.md")).unwrap(),
            original
        );
    }

    #[test]
    fn test_write_single_evaluation() {
        let temp = TempDir::new().unwrap();
        let json = temp.path().join("eval.json");
        let md = temp.path().join("eval.md");
        let record = EvaluationRecord::from_result(&ScoredResult::failed("basic_gpio", "alpha", "x"));

        ReportGenerator::new()
            .write_evaluation(&record, Some(&json), Some(&md))
            .unwrap();

        assert!(json.exists());
        assert!(std::fs::read_to_string(md).unwrap().contains("**Result:** FAIL"));
    }
}
