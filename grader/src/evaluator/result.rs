//! @ai:module:intent Scored result of one submission against one scenario
//! @ai:module:layer domain
//! @ai:module:public_api ScoredResult, round1
//! @ai:module:depends_on rubric
//! @ai:module:stateless true

use crate::rubric::{Category, CategoryWeights};
use modgrade_analyzer::MatchResult;
use std::collections::BTreeMap;

/// @ai:intent Round to one decimal place
/// @ai:example (6.66) -> 6.7
/// @ai:effects pure
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// @ai:intent Outcome of evaluating one submission; the total is always recomputed
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    scenario_id: String,
    scenario_title: Option<String>,
    submission_id: String,
    category_scores: BTreeMap<Category, f64>,
    weights: Option<CategoryWeights>,
    pass_threshold: f64,
    compliance: BTreeMap<String, bool>,
    recommendations: Vec<String>,
    matches: MatchResult,
    findings: BTreeMap<Category, Vec<String>>,
    failure: Option<String>,
}

/// @ai:intent Inputs of a successful evaluation, assembled by the evaluator
pub(crate) struct ScoredParts {
    pub scenario_id: String,
    pub scenario_title: String,
    pub submission_id: String,
    pub category_scores: BTreeMap<Category, f64>,
    pub weights: CategoryWeights,
    pub pass_threshold: f64,
    pub compliance: BTreeMap<String, bool>,
    pub recommendations: Vec<String>,
    pub matches: MatchResult,
    pub findings: BTreeMap<Category, Vec<String>>,
}

impl ScoredResult {
    pub(crate) fn scored(parts: ScoredParts) -> Self {
        Self {
            scenario_id: parts.scenario_id,
            scenario_title: Some(parts.scenario_title),
            submission_id: parts.submission_id,
            category_scores: parts.category_scores,
            weights: Some(parts.weights),
            pass_threshold: parts.pass_threshold,
            compliance: parts.compliance,
            recommendations: parts.recommendations,
            matches: parts.matches,
            findings: parts.findings,
            failure: None,
        }
    }

    /// @ai:intent Zero-score result for a submission that could not be evaluated
    /// @ai:post result.total_score() == 0.0 && !result.passed()
    /// @ai:effects pure
    pub fn failed(
        scenario_id: impl Into<String>,
        submission_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let reason = reason.into();

        Self {
            scenario_id: scenario_id.into(),
            scenario_title: None,
            submission_id: submission_id.into(),
            category_scores: Category::ALL.iter().map(|&c| (c, 0.0)).collect(),
            weights: None,
            pass_threshold: 0.0,
            compliance: BTreeMap::new(),
            recommendations: vec![format!("Submission could not be evaluated: {}", reason)],
            matches: MatchResult::default(),
            findings: BTreeMap::new(),
            failure: Some(reason),
        }
    }

    pub fn scenario_id(&self) -> &str {
        &self.scenario_id
    }

    /// @ai:intent Rubric title, absent when the scenario was never resolved
    pub fn scenario_title(&self) -> Option<&str> {
        self.scenario_title.as_deref()
    }

    pub fn submission_id(&self) -> &str {
        &self.submission_id
    }

    /// @ai:intent Score of one category, 0 when not scored
    /// @ai:effects pure
    pub fn category_score(&self, category: Category) -> f64 {
        self.category_scores.get(&category).copied().unwrap_or(0.0)
    }

    pub fn category_scores(&self) -> &BTreeMap<Category, f64> {
        &self.category_scores
    }

    pub fn weights(&self) -> Option<&CategoryWeights> {
        self.weights.as_ref()
    }

    pub fn pass_threshold(&self) -> f64 {
        self.pass_threshold
    }

    /// @ai:intent Weighted sum of the category scores, rounded to one decimal
    /// @ai:post 0.0 <= result <= 10.0
    /// @ai:effects pure
    pub fn total_score(&self) -> f64 {
        let Some(weights) = &self.weights else {
            return 0.0;
        };

        let sum: f64 = self
            .category_scores
            .iter()
            .map(|(&category, &score)| weights.get(category) * score)
            .sum();

        round1(sum).clamp(0.0, 10.0)
    }

    /// @ai:intent Check that the submission was scored and reached the pass threshold
    /// @ai:effects pure
    pub fn passed(&self) -> bool {
        self.failure.is_none() && self.total_score() >= self.pass_threshold
    }

    pub fn compliance(&self) -> &BTreeMap<String, bool> {
        &self.compliance
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn matches(&self) -> &MatchResult {
        &self.matches
    }

    /// @ai:intent Probe findings for a category, empty when the category has no probe
    /// @ai:effects pure
    pub fn findings(&self, category: Category) -> &[String] {
        self.findings
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}
