//! @ai:module:intent Statistics and rankings over batch entries
//! @ai:module:layer application
//! @ai:module:public_api mean, sample_stdev, median, tool_stats, scenario_stats, module_usage, rank_tools
//! @ai:module:stateless true

use crate::batch::types::{
    BatchEntry, Consistency, ModuleUsage, ScenarioRankEntry, ScenarioStats, ToolStats,
};
use crate::rubric::Category;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// @ai:intent Arithmetic mean, NaN for no values
/// @ai:effects pure
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// @ai:intent Sample standard deviation; 0 for one value, NaN for none
/// @ai:example ([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) -> 2.138
/// @ai:effects pure
pub fn sample_stdev(values: &[f64]) -> f64 {
    match values.len() {
        0 => f64::NAN,
        1 => 0.0,
        n => {
            let m = mean(values);
            let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
            variance.sqrt()
        }
    }
}

/// @ai:intent Median, NaN for no values
/// @ai:effects pure
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
}

/// @ai:intent Per-tool statistics over successfully scored entries
/// @ai:post every tool appearing in entries has a ToolStats
/// @ai:effects pure
pub fn tool_stats(entries: &[BatchEntry]) -> BTreeMap<String, ToolStats> {
    let mut by_tool: BTreeMap<&str, Vec<&BatchEntry>> = BTreeMap::new();
    for entry in entries {
        by_tool.entry(entry.tool_id.as_str()).or_default().push(entry);
    }

    by_tool
        .into_iter()
        .map(|(tool_id, tool_entries)| {
            let scored: Vec<&BatchEntry> = tool_entries
                .iter()
                .copied()
                .filter(|e| !e.result.is_failed())
                .collect();
            let totals: Vec<f64> = scored.iter().map(|e| e.result.total_score()).collect();

            let category_means = if scored.is_empty() {
                BTreeMap::new()
            } else {
                Category::ALL
                    .iter()
                    .map(|&category| {
                        let values: Vec<f64> = scored
                            .iter()
                            .map(|e| e.result.category_score(category))
                            .collect();
                        (category, mean(&values))
                    })
                    .collect()
            };

            let stdev = sample_stdev(&totals);
            let stats = ToolStats {
                tool_id: tool_id.to_string(),
                scored: scored.len(),
                failed: tool_entries.len() - scored.len(),
                mean: mean(&totals),
                stdev,
                min: min(&totals),
                max: max(&totals),
                median: median(&totals),
                category_means,
                consistency: (!totals.is_empty()).then(|| Consistency::from_stdev(stdev)),
            };

            (tool_id.to_string(), stats)
        })
        .collect()
}

/// @ai:intent Order tools by mean descending, then stdev ascending, then tool id
/// @ai:post tools without any scored submission come last
/// @ai:effects pure
pub fn rank_tools(stats: &BTreeMap<String, ToolStats>) -> Vec<String> {
    let mut tools: Vec<&ToolStats> = stats.values().collect();

    tools.sort_by(|a, b| {
        b.has_scores()
            .cmp(&a.has_scores())
            .then_with(|| compare_desc(a.mean, b.mean))
            .then_with(|| compare_asc(a.stdev, b.stdev))
            .then_with(|| a.tool_id.cmp(&b.tool_id))
    });

    tools.into_iter().map(|t| t.tool_id.clone()).collect()
}

fn compare_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn compare_asc(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// @ai:intent Per-scenario statistics with a tool ranking per scenario
/// @ai:effects pure
pub fn scenario_stats(entries: &[BatchEntry]) -> BTreeMap<String, ScenarioStats> {
    let mut by_scenario: BTreeMap<&str, Vec<&BatchEntry>> = BTreeMap::new();
    for entry in entries {
        by_scenario
            .entry(entry.result.scenario_id())
            .or_default()
            .push(entry);
    }

    by_scenario
        .into_iter()
        .map(|(scenario_id, scenario_entries)| {
            let mut tool_scores: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
            let mut totals = Vec::new();
            let mut failed = 0;

            for entry in &scenario_entries {
                if entry.result.is_failed() {
                    failed += 1;
                    continue;
                }
                let total = entry.result.total_score();
                totals.push(total);
                tool_scores.entry(entry.tool_id.as_str()).or_default().push(total);
            }

            let mut ranking: Vec<ScenarioRankEntry> = tool_scores
                .into_iter()
                .map(|(tool_id, scores)| ScenarioRankEntry {
                    tool_id: tool_id.to_string(),
                    score: mean(&scores),
                })
                .collect();
            ranking.sort_by(|a, b| {
                compare_desc(a.score, b.score).then_with(|| a.tool_id.cmp(&b.tool_id))
            });

            let stats = ScenarioStats {
                scenario_id: scenario_id.to_string(),
                scored: totals.len(),
                failed,
                mean: mean(&totals),
                stdev: sample_stdev(&totals),
                min: min(&totals),
                max: max(&totals),
                ranking,
            };

            (scenario_id.to_string(), stats)
        })
        .collect()
}

/// @ai:intent Fraction of tools including each module, most used first
/// @ai:effects pure
pub fn module_usage(entries: &[BatchEntry]) -> Vec<ModuleUsage> {
    let all_tools: BTreeSet<&str> = entries.iter().map(|e| e.tool_id.as_str()).collect();
    if all_tools.is_empty() {
        return Vec::new();
    }

    let mut users: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for entry in entries.iter().filter(|e| !e.result.is_failed()) {
        for module in &entry.result.matches().modules_included {
            users
                .entry(module.as_str())
                .or_default()
                .insert(entry.tool_id.as_str());
        }
    }

    let mut usage: Vec<ModuleUsage> = users
        .into_iter()
        .map(|(module_id, tools)| ModuleUsage {
            module_id: module_id.to_string(),
            frequency: tools.len() as f64 / all_tools.len() as f64,
            tools: tools.into_iter().map(str::to_string).collect(),
        })
        .collect();

    usage.sort_by(|a, b| {
        compare_desc(a.frequency, b.frequency).then_with(|| a.module_id.cmp(&b.module_id))
    });
    usage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::ScoredResult;
    use pretty_assertions::assert_eq;

    fn failed(tool: &str, scenario: &str) -> BatchEntry {
        BatchEntry {
            tool_id: tool.to_string(),
            result: ScoredResult::failed(scenario, tool, "source is empty"),
        }
    }

    #[test]
    fn test_mean_stdev_median() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert!((sample_stdev(&values) - 2.138).abs() < 1e-3);
        assert_eq!(median(&values), 4.5);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn test_single_and_empty_samples() {
        assert_eq!(sample_stdev(&[7.5]), 0.0);
        assert!(sample_stdev(&[]).is_nan());
        assert!(mean(&[]).is_nan());
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn test_tool_without_scores_ranked_last() {
        let entries = vec![failed("alpha", "basic_gpio"), failed("alpha", "motor_control")];
        let stats = tool_stats(&entries);
        let alpha = &stats["alpha"];

        assert_eq!(alpha.scored, 0);
        assert_eq!(alpha.failed, 2);
        assert!(alpha.mean.is_nan());
        assert_eq!(alpha.consistency, None);
        assert!(alpha.category_means.is_empty());
    }

    fn stats_with(tool: &str, mean: f64, stdev: f64) -> ToolStats {
        ToolStats {
            tool_id: tool.to_string(),
            scored: 2,
            failed: 0,
            mean,
            stdev,
            min: mean,
            max: mean,
            median: mean,
            category_means: BTreeMap::new(),
            consistency: Some(Consistency::from_stdev(stdev)),
        }
    }

    #[test]
    fn test_ranking_tie_breaks() {
        let mut stats = BTreeMap::new();
        for s in [
            stats_with("delta", 7.0, 0.5),
            stats_with("bravo", 7.0, 1.5),
            stats_with("alpha", 7.0, 0.5),
            stats_with("charlie", 8.0, 3.0),
        ] {
            stats.insert(s.tool_id.clone(), s);
        }
        let mut empty = stats_with("aardvark", f64::NAN, f64::NAN);
        empty.scored = 0;
        stats.insert("aardvark".to_string(), empty);

        assert_eq!(
            rank_tools(&stats),
            vec!["charlie", "alpha", "delta", "bravo", "aardvark"]
        );
    }

    #[test]
    fn test_module_usage_ignores_failed_entries() {
        let entries = vec![failed("alpha", "basic_gpio"), failed("bravo", "basic_gpio")];
        assert!(module_usage(&entries).is_empty());
        assert!(module_usage(&[]).is_empty());

        let scenarios = scenario_stats(&entries);
        assert_eq!(scenarios["basic_gpio"].failed, 2);
        assert!(scenarios["basic_gpio"].ranking.is_empty());
    }
}
