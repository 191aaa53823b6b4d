//! @ai:module:intent Score one submission against a scenario rubric
//! @ai:module:layer application
//! @ai:module:public_api ScenarioEvaluator, ScenarioEvaluatorTrait, EvaluationError, ScoredResult

pub mod checks;
mod recommend;
pub mod result;

pub use checks::{evaluate_check, CheckContext};
pub use result::{round1, ScoredResult};

use crate::config::{LimitsConfig, ScoringConfig};
use crate::rubric::{Category, RubricSet, ScenarioRubric};
use modgrade_analyzer::{
    ArchitectureProbe, ErrorHandlingProbe, Lexer, MatchResult, ModuleCatalog, ProbeTrait,
    SourceMatcher, SourceMatcherTrait,
};
use recommend::RecommendationInput;
use result::ScoredParts;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

const MAX_SCORE: f64 = 10.0;

/// @ai:intent Per-call evaluation failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Source too large: {size} bytes exceeds the {limit} byte limit")]
    SourceTooLarge { size: usize, limit: usize },

    #[error("Source unreadable: {0}")]
    SourceUnreadable(String),
}

/// @ai:intent Trait for scenario evaluation
pub trait ScenarioEvaluatorTrait: Send + Sync {
    /// @ai:intent Score a submission's source text against a scenario
    fn evaluate(
        &self,
        submission_id: &str,
        source: &str,
        scenario_id: &str,
    ) -> Result<ScoredResult, EvaluationError>;
}

/// @ai:intent Combines the matcher, both probes and a rubric into a scored result
pub struct ScenarioEvaluator {
    catalog: Arc<ModuleCatalog>,
    rubrics: Arc<RubricSet>,
    scoring: ScoringConfig,
    limits: LimitsConfig,
    lexer: Lexer,
    matcher: SourceMatcher,
    architecture: ArchitectureProbe,
    error_handling: ErrorHandlingProbe,
}

impl ScenarioEvaluator {
    /// @ai:intent Create an evaluator with default scoring constants and limits
    /// @ai:effects pure
    pub fn new(catalog: Arc<ModuleCatalog>, rubrics: Arc<RubricSet>) -> Self {
        Self::with_config(catalog, rubrics, ScoringConfig::default(), LimitsConfig::default())
    }

    /// @ai:intent Create an evaluator with explicit scoring constants and limits
    /// @ai:effects pure
    pub fn with_config(
        catalog: Arc<ModuleCatalog>,
        rubrics: Arc<RubricSet>,
        scoring: ScoringConfig,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            catalog,
            rubrics,
            scoring,
            limits,
            lexer: Lexer::default(),
            matcher: SourceMatcher::new(),
            architecture: ArchitectureProbe::new(),
            error_handling: ErrorHandlingProbe::new(),
        }
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    pub fn rubrics(&self) -> &RubricSet {
        &self.rubrics
    }

    /// @ai:intent module_usage: required coverage plus optional bonus minus unincluded-usage penalty
    /// @ai:effects pure
    fn module_usage_score(&self, rubric: &ScenarioRubric, matches: &MatchResult) -> f64 {
        let base = if rubric.required_modules.is_empty() {
            tracing::warn!(
                "Scenario {} has no required modules; module usage scored {}",
                rubric.id,
                MAX_SCORE
            );
            MAX_SCORE
        } else {
            MAX_SCORE * fraction_included(&rubric.required_modules, matches)
        };

        let bonus = if rubric.optional_modules.is_empty() {
            0.0
        } else {
            self.scoring.optional_module_bonus
                * fraction_included(&rubric.optional_modules, matches)
        };

        let penalty = self.scoring.unincluded_usage_penalty * matches.unincluded_usage.len() as f64;

        (base + bonus - penalty).clamp(0.0, MAX_SCORE)
    }

    /// @ai:intent function_correctness: matched functions over the expected or required function count
    /// @ai:effects pure
    fn function_correctness_score(&self, rubric: &ScenarioRubric, matches: &MatchResult) -> f64 {
        let (matched, expected) = if rubric.expected_functions.is_empty() {
            let expected: usize = rubric
                .required_modules
                .iter()
                .filter_map(|id| self.catalog.get(id))
                .map(|module| module.functions.len())
                .sum();
            (matches.function_count(), expected)
        } else {
            let matched = rubric
                .expected_functions
                .iter()
                .filter(|f| matches.uses_function(f))
                .count();
            (matched, rubric.expected_functions.len())
        };

        if expected == 0 {
            return MAX_SCORE;
        }

        MAX_SCORE * (matched as f64 / expected as f64).min(1.0)
    }
}

fn fraction_included(modules: &[String], matches: &MatchResult) -> f64 {
    let included = modules.iter().filter(|m| matches.is_included(m)).count();
    included as f64 / modules.len() as f64
}

impl ScenarioEvaluatorTrait for ScenarioEvaluator {
    /// @ai:intent Score a submission's source text against a scenario
    /// @ai:pre scenario_id names a loaded rubric
    /// @ai:post result.total_score() is the rounded weighted sum of the category scores
    /// @ai:effects pure
    fn evaluate(
        &self,
        submission_id: &str,
        source: &str,
        scenario_id: &str,
    ) -> Result<ScoredResult, EvaluationError> {
        let rubric = self
            .rubrics
            .get(scenario_id)
            .ok_or_else(|| EvaluationError::UnknownScenario(scenario_id.to_string()))?;

        if source.len() > self.limits.max_source_bytes {
            return Err(EvaluationError::SourceTooLarge {
                size: source.len(),
                limit: self.limits.max_source_bytes,
            });
        }

        if source.trim().is_empty() {
            return Err(EvaluationError::SourceUnreadable(
                "source is empty".to_string(),
            ));
        }

        let lexed = self.lexer.lex(source);
        let matches = self.matcher.match_lexed(&lexed, &self.catalog);
        let architecture = self.architecture.analyze(&lexed);
        let error_handling = self.error_handling.analyze(&lexed);

        let category_scores = BTreeMap::from([
            (Category::ModuleUsage, self.module_usage_score(rubric, &matches)),
            (
                Category::FunctionCorrectness,
                self.function_correctness_score(rubric, &matches),
            ),
            (Category::Architecture, architecture.score),
            (Category::ErrorHandling, error_handling.score),
        ]);

        let check_ctx = CheckContext::new(&matches, lexed.code(), &category_scores);
        let check_outcomes: Vec<_> = rubric
            .checks
            .iter()
            .map(|check| (check, evaluate_check(check, &check_ctx)))
            .collect();

        let mut compliance = BTreeMap::new();
        for module in &rubric.required_modules {
            compliance.insert(
                format!("required_module:{}", module),
                matches.is_included(module),
            );
        }
        for (check, held) in &check_outcomes {
            compliance.insert(format!("check:{}", check.name), *held);
        }
        for module in matches.unincluded_usage.keys() {
            compliance.insert(format!("header_included:{}", module), false);
        }

        let recommendations = recommend::recommendations(&RecommendationInput {
            rubric,
            catalog: &self.catalog,
            matches: &matches,
            category_scores: &category_scores,
            check_outcomes: &check_outcomes,
            threshold: self.scoring.recommendation_threshold,
        });

        let findings = BTreeMap::from([
            (Category::Architecture, architecture.findings),
            (Category::ErrorHandling, error_handling.findings),
        ]);

        let result = ScoredResult::scored(ScoredParts {
            scenario_id: rubric.id.clone(),
            scenario_title: rubric.display_title(),
            submission_id: submission_id.to_string(),
            category_scores,
            weights: rubric.weights,
            pass_threshold: rubric.pass_threshold,
            compliance,
            recommendations,
            matches,
            findings,
        });

        tracing::debug!(
            "Scored {} on {}: total {:.1}",
            submission_id,
            scenario_id,
            result.total_score()
        );

        Ok(result)
    }
}
