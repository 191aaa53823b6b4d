//! @ai:module:intent Markdown report generation for evaluations and batch runs
//! @ai:module:layer infrastructure
//! @ai:module:public_api MarkdownReporter
//! @ai:module:stateless true

use crate::report::json_report::{BatchRecord, EvaluationRecord};
use crate::rubric::Category;
use anyhow::{Context, Result};
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// @ai:intent Trait for Markdown report generation
pub trait MarkdownReporterTrait: Send + Sync {
    /// @ai:intent Generate Markdown report from a batch record
    fn generate(&self, record: &BatchRecord, output_path: &Path) -> Result<()>;
}

/// @ai:intent Generates Markdown reports from evaluation and batch records
pub struct MarkdownReporter;

/// @ai:intent Format a score, n/a when undefined
/// @ai:example (7.26) -> "7.3"
/// @ai:example (NaN) -> "n/a"
/// @ai:effects pure
fn format_score(value: f64) -> String {
    if value.is_finite() {
        format!("{:.1}", value)
    } else {
        "n/a".to_string()
    }
}

/// @ai:intent Escape characters that would end a Markdown table cell
/// @ai:example ("a|b") -> "a\\|b"
/// @ai:effects pure
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn title_case(id: &str) -> String {
    id.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

impl MarkdownReporter {
    /// @ai:intent Create a new Markdown reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Render a single evaluation report
    /// @ai:effects pure
    pub fn render_evaluation(&self, record: &EvaluationRecord) -> String {
        let mut output = String::new();

        output.push_str(&Self::generate_evaluation_summary(record));
        output.push_str(&Self::generate_category_table(record));
        output.push_str(&Self::generate_compliance_section(record));
        output.push_str(&Self::generate_module_table(record));
        output.push_str(&Self::generate_findings_section(record));
        output.push_str(&Self::generate_recommendations(record));

        output
    }

    /// @ai:intent Render the batch comparison report
    /// @ai:effects pure
    pub fn render_batch(&self, record: &BatchRecord) -> String {
        let mut output = String::new();

        output.push_str(&Self::generate_batch_summary(record));
        output.push_str(&Self::generate_ranking_table(record));
        output.push_str(&Self::generate_scenario_section(record));
        output.push_str(&Self::generate_category_performance(record));
        output.push_str(&Self::generate_module_usage(record));
        output.push_str(&Self::generate_consistency_section(record));
        output.push_str(&Self::generate_failures_section(record));

        output
    }

    /// @ai:intent Write a single evaluation report to file
    /// @ai:effects fs:write
    pub fn write_evaluation(&self, record: &EvaluationRecord, output_path: &Path) -> Result<()> {
        std::fs::write(output_path, self.render_evaluation(record))
            .with_context(|| format!("Failed to write {}", output_path.display()))
    }

    /// @ai:intent Rubric title carried by any submission of the scenario, else the id in title case
    fn scenario_title(record: &BatchRecord, scenario_id: &str) -> String {
        record
            .submissions
            .iter()
            .filter(|s| s.evaluation.scenario == scenario_id)
            .find_map(|s| s.evaluation.title.clone())
            .unwrap_or_else(|| title_case(scenario_id))
    }

    fn generate_evaluation_summary(record: &EvaluationRecord) -> String {
        let mut output = String::new();

        let title = record
            .title
            .clone()
            .unwrap_or_else(|| title_case(&record.scenario));
        writeln!(output, "# {} Evaluation Report", title).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "**Submission:** {}", record.submission).unwrap();
        writeln!(output, "**Scenario:** {}", record.scenario).unwrap();
        writeln!(
            output,
            "**Total Score:** {}/10.0",
            format_score(record.scores.total_score)
        )
        .unwrap();
        writeln!(
            output,
            "**Result:** {}",
            if record.passed { "PASS" } else { "FAIL" }
        )
        .unwrap();
        if let Some(failure) = &record.failure {
            writeln!(output, "**Failure:** {}", failure).unwrap();
        }
        writeln!(output).unwrap();

        output
    }

    fn generate_category_table(record: &EvaluationRecord) -> String {
        let mut output = String::new();

        writeln!(output, "## Category Breakdown").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Category | Score | Weight | Weighted |").unwrap();
        writeln!(output, "|----------|-------|--------|----------|").unwrap();

        for category in Category::ALL {
            let score = record.scores.category(category);
            match &record.weights {
                Some(weights) => writeln!(
                    output,
                    "| {} | {} | {:.0}% | {:.2} |",
                    category.title(),
                    format_score(score),
                    weights.get(category) * 100.0,
                    weights.get(category) * score
                )
                .unwrap(),
                None => writeln!(
                    output,
                    "| {} | {} | - | - |",
                    category.title(),
                    format_score(score)
                )
                .unwrap(),
            }
        }

        writeln!(output).unwrap();
        output
    }

    fn generate_compliance_section(record: &EvaluationRecord) -> String {
        let mut output = String::new();
        let compliance = &record.detailed_metrics.requirement_compliance;

        if compliance.is_empty() {
            return output;
        }

        writeln!(output, "## Requirement Compliance").unwrap();
        writeln!(output).unwrap();
        for (requirement, held) in compliance {
            writeln!(
                output,
                "- {} `{}`",
                if *held { "[x]" } else { "[ ]" },
                requirement
            )
            .unwrap();
        }
        writeln!(output).unwrap();

        output
    }

    fn generate_module_table(record: &EvaluationRecord) -> String {
        let mut output = String::new();
        let metrics = &record.detailed_metrics;

        writeln!(output, "## Module Usage").unwrap();
        writeln!(output).unwrap();

        if metrics.modules_utilized.is_empty() && metrics.unincluded_usage.is_empty() {
            writeln!(output, "No internal modules detected.").unwrap();
            writeln!(output).unwrap();
            return output;
        }

        writeln!(output, "| Module | Functions | Types | Constants |").unwrap();
        writeln!(output, "|--------|-----------|-------|-----------|").unwrap();

        let count = |map: &std::collections::BTreeMap<String, Vec<String>>, module: &str| {
            map.get(module).map(Vec::len).unwrap_or(0)
        };

        for module in &metrics.modules_utilized {
            let functions = metrics
                .functions_by_module
                .get(module)
                .map(|names| names.join(", "))
                .unwrap_or_default();
            writeln!(
                output,
                "| {} | {} | {} | {} |",
                module,
                if functions.is_empty() { "-".to_string() } else { functions },
                count(&metrics.types_used, module),
                count(&metrics.constants_used, module)
            )
            .unwrap();
        }
        writeln!(output).unwrap();

        if !metrics.unincluded_usage.is_empty() {
            writeln!(output, "Used without including the header:").unwrap();
            writeln!(output).unwrap();
            for (module, names) in &metrics.unincluded_usage {
                writeln!(output, "- **{}**: {}", module, names.join(", ")).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn generate_findings_section(record: &EvaluationRecord) -> String {
        let mut output = String::new();

        if record.findings.is_empty() {
            return output;
        }

        writeln!(output, "## Probe Findings").unwrap();
        writeln!(output).unwrap();
        for (category, findings) in &record.findings {
            writeln!(output, "### {}", category.title()).unwrap();
            writeln!(output).unwrap();
            for finding in findings {
                writeln!(output, "- {}", finding).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn generate_recommendations(record: &EvaluationRecord) -> String {
        let mut output = String::new();

        writeln!(output, "## Recommendations").unwrap();
        writeln!(output).unwrap();
        if record.recommendations.is_empty() {
            writeln!(output, "No recommendations.").unwrap();
        }
        for recommendation in &record.recommendations {
            writeln!(output, "- {}", recommendation).unwrap();
        }
        writeln!(output).unwrap();

        output
    }

    fn generate_batch_summary(record: &BatchRecord) -> String {
        let mut output = String::new();
        let failed = record
            .submissions
            .iter()
            .filter(|s| s.evaluation.failure.is_some())
            .count();

        writeln!(output, "# Tool Comparison Report").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "**Generated:** {}",
            record.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
        .unwrap();
        writeln!(output).unwrap();
        writeln!(output, "## Executive Summary").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "{} submissions from {} tools across {} scenarios ({} failed).",
            record.submissions.len(),
            record.tool_stats.len(),
            record.scenario_stats.len(),
            failed
        )
        .unwrap();
        if let Some(leader) = record.ranking.first() {
            if let Some(stats) = record.tool_stats.get(leader).filter(|s| s.has_scores()) {
                writeln!(
                    output,
                    "Top tool: **{}** with an average of {}/10.0.",
                    leader,
                    format_score(stats.mean)
                )
                .unwrap();
            }
        }
        writeln!(output).unwrap();

        output
    }

    fn generate_ranking_table(record: &BatchRecord) -> String {
        let mut output = String::new();

        writeln!(output, "## Overall Ranking").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "| Rank | Tool | Mean | Std Dev | Min | Max | Median | Scored | Failed |"
        )
        .unwrap();
        writeln!(
            output,
            "|------|------|------|---------|-----|-----|--------|--------|--------|"
        )
        .unwrap();

        for (rank, tool) in record.ranking.iter().enumerate() {
            let Some(stats) = record.tool_stats.get(tool) else {
                continue;
            };
            writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                rank + 1,
                tool,
                format_score(stats.mean),
                format_score(stats.stdev),
                format_score(stats.min),
                format_score(stats.max),
                format_score(stats.median),
                stats.scored,
                stats.failed
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    fn generate_scenario_section(record: &BatchRecord) -> String {
        let mut output = String::new();

        writeln!(output, "## Scenario Rankings").unwrap();
        writeln!(output).unwrap();

        for (scenario_id, stats) in &record.scenario_stats {
            writeln!(output, "### {}", Self::scenario_title(record, scenario_id)).unwrap();
            writeln!(output).unwrap();
            writeln!(
                output,
                "Mean {} (std dev {}, range {} - {}), {} scored, {} failed.",
                format_score(stats.mean),
                format_score(stats.stdev),
                format_score(stats.min),
                format_score(stats.max),
                stats.scored,
                stats.failed
            )
            .unwrap();
            writeln!(output).unwrap();
            for (rank, entry) in stats.ranking.iter().enumerate() {
                writeln!(
                    output,
                    "{}. **{}**: {}/10.0",
                    rank + 1,
                    entry.tool_id,
                    format_score(entry.score)
                )
                .unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn generate_category_performance(record: &BatchRecord) -> String {
        let mut output = String::new();

        writeln!(output, "## Category Performance").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "| Tool | {} |",
            Category::ALL.map(|c| c.title()).join(" | ")
        )
        .unwrap();
        writeln!(output, "|------|{}", "------|".repeat(Category::ALL.len())).unwrap();

        for tool in &record.ranking {
            let Some(stats) = record.tool_stats.get(tool) else {
                continue;
            };
            let cells: Vec<String> = Category::ALL
                .iter()
                .map(|c| {
                    format_score(stats.category_means.get(c).copied().unwrap_or(f64::NAN))
                })
                .collect();
            writeln!(output, "| {} | {} |", tool, cells.join(" | ")).unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    fn generate_module_usage(record: &BatchRecord) -> String {
        let mut output = String::new();

        writeln!(output, "## Module Usage").unwrap();
        writeln!(output).unwrap();

        if record.module_usage.is_empty() {
            writeln!(output, "No internal modules were included by any tool.").unwrap();
        }
        for usage in &record.module_usage {
            writeln!(
                output,
                "- **{}**: used by {:.0}% of tools ({})",
                usage.module_id,
                usage.frequency * 100.0,
                usage.tools.join(", ")
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    fn generate_consistency_section(record: &BatchRecord) -> String {
        let mut output = String::new();

        writeln!(output, "## Consistency Analysis").unwrap();
        writeln!(output).unwrap();

        let mut rated: Vec<_> = record
            .tool_stats
            .values()
            .filter_map(|s| s.consistency.map(|c| (s, c)))
            .collect();
        rated.sort_by(|(a, _), (b, _)| a.stdev.total_cmp(&b.stdev).then_with(|| a.tool_id.cmp(&b.tool_id)));

        for (stats, consistency) in rated {
            writeln!(
                output,
                "- **{}**: {} (std dev {})",
                stats.tool_id,
                consistency.label(),
                format_score(stats.stdev)
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    fn generate_failures_section(record: &BatchRecord) -> String {
        let mut output = String::new();
        let failures: Vec<_> = record
            .submissions
            .iter()
            .filter_map(|s| s.evaluation.failure.as_ref().map(|f| (s, f)))
            .collect();

        if failures.is_empty() {
            return output;
        }

        writeln!(output, "## Failed Submissions").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Tool | Scenario | Reason |").unwrap();
        writeln!(output, "|------|----------|--------|").unwrap();
        for (submission, reason) in failures {
            writeln!(
                output,
                "| {} | {} | {} |",
                table_cell(&submission.tool),
                table_cell(&submission.evaluation.scenario),
                table_cell(reason)
            )
            .unwrap();
        }
        writeln!(output).unwrap();

        output
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownReporterTrait for MarkdownReporter {
    /// @ai:intent Generate Markdown report to file
    /// @ai:effects fs:write
    fn generate(&self, record: &BatchRecord, output_path: &Path) -> Result<()> {
        std::fs::write(output_path, self.render_batch(record))
            .with_context(|| format!("Failed to write {}", output_path.display()))
    }
}
