//! @ai:module:intent Evaluate scenario-specific check variants generically
//! @ai:module:layer application
//! @ai:module:public_api CheckContext, evaluate_check
//! @ai:module:depends_on rubric
//! @ai:module:stateless true

use crate::rubric::{Category, CheckKind, Metric, ScenarioCheck};
use modgrade_analyzer::MatchResult;
use std::collections::BTreeMap;

const FRACTION_EPSILON: f64 = 1e-9;

/// @ai:intent Everything a check may inspect about a submission
pub struct CheckContext<'a> {
    pub matches: &'a MatchResult,
    /// Comment-stripped source, lower-cased
    pub code_lower: String,
    pub category_scores: &'a BTreeMap<Category, f64>,
}

impl<'a> CheckContext<'a> {
    pub fn new(
        matches: &'a MatchResult,
        code: &str,
        category_scores: &'a BTreeMap<Category, f64>,
    ) -> Self {
        Self {
            matches,
            code_lower: code.to_lowercase(),
            category_scores,
        }
    }

    fn metric(&self, metric: Metric) -> f64 {
        match metric.category() {
            Some(category) => self.category_scores.get(&category).copied().unwrap_or(0.0),
            None => match metric {
                Metric::ModulesIncluded => self.matches.modules_included.len() as f64,
                Metric::FunctionsUsed => self.matches.function_count() as f64,
                _ => 0.0,
            },
        }
    }
}

/// @ai:intent Decide whether a check holds for a submission
/// @ai:effects pure
pub fn evaluate_check(check: &ScenarioCheck, ctx: &CheckContext<'_>) -> bool {
    match &check.kind {
        CheckKind::RequirementPresence {
            modules,
            identifiers,
            min_fraction,
        } => {
            let total = modules.len() + identifiers.len();
            if total == 0 {
                return true;
            }

            let present = modules
                .iter()
                .filter(|m| ctx.matches.is_included(m))
                .count()
                + identifiers
                    .iter()
                    .filter(|name| ctx.matches.uses_identifier(name))
                    .count();

            present as f64 / total as f64 + FRACTION_EPSILON >= *min_fraction
        }
        CheckKind::NumericThreshold { metric, min } => ctx.metric(*metric) >= *min,
        CheckKind::PatternPresence { patterns } => patterns
            .iter()
            .any(|pattern| ctx.code_lower.contains(&pattern.to_lowercase())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn check(kind: CheckKind) -> ScenarioCheck {
        ScenarioCheck {
            name: "c".to_string(),
            category: Category::Architecture,
            recommendation: "r".to_string(),
            kind,
        }
    }

    fn matches() -> MatchResult {
        MatchResult {
            modules_included: BTreeSet::from(["xgpio_hal".to_string()]),
            functions_used: BTreeMap::from([(
                "xgpio_hal".to_string(),
                BTreeSet::from(["xgpio_init_pin".to_string(), "xgpio_write_pin".to_string()]),
            )]),
            ..Default::default()
        }
    }

    #[test]
    fn test_requirement_presence_fraction() {
        let matches = matches();
        let scores = BTreeMap::new();
        let ctx = CheckContext::new(&matches, "", &scores);

        let all = check(CheckKind::RequirementPresence {
            modules: vec!["xgpio_hal".to_string()],
            identifiers: vec!["xgpio_init_pin".to_string(), "xgpio_deinit_pin".to_string()],
            min_fraction: 1.0,
        });
        assert!(!evaluate_check(&all, &ctx));

        let two_thirds = check(CheckKind::RequirementPresence {
            modules: vec!["xgpio_hal".to_string()],
            identifiers: vec!["xgpio_init_pin".to_string(), "xgpio_deinit_pin".to_string()],
            min_fraction: 2.0 / 3.0,
        });
        assert!(evaluate_check(&two_thirds, &ctx));
    }

    #[test]
    fn test_numeric_threshold() {
        let matches = matches();
        let scores = BTreeMap::from([(Category::ErrorHandling, 4.0)]);
        let ctx = CheckContext::new(&matches, "", &scores);

        let score_check = check(CheckKind::NumericThreshold {
            metric: Metric::ErrorHandling,
            min: 6.0,
        });
        assert!(!evaluate_check(&score_check, &ctx));

        let count_check = check(CheckKind::NumericThreshold {
            metric: Metric::FunctionsUsed,
            min: 2.0,
        });
        assert!(evaluate_check(&count_check, &ctx));
    }

    #[test]
    fn test_pattern_presence_is_case_insensitive() {
        let matches = MatchResult::default();
        let scores = BTreeMap::new();
        let ctx = CheckContext::new(&matches, "void Emergency_Stop(void) {}", &scores);

        let safety = check(CheckKind::PatternPresence {
            patterns: vec!["emergency".to_string(), "overcurrent".to_string()],
        });
        assert!(evaluate_check(&safety, &ctx));

        let timing = check(CheckKind::PatternPresence {
            patterns: vec!["delay".to_string()],
        });
        assert!(!evaluate_check(&timing, &ctx));
    }
}
