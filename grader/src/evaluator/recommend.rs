//! @ai:module:intent Build the ordered recommendation list of a scored submission
//! @ai:module:layer application
//! @ai:module:public_api recommendations
//! @ai:module:depends_on rubric
//! @ai:module:stateless true

use crate::rubric::{Category, ScenarioCheck, ScenarioRubric};
use modgrade_analyzer::{MatchResult, ModuleCatalog};
use std::collections::BTreeMap;

/// @ai:intent Inputs for recommendation generation
pub(crate) struct RecommendationInput<'a> {
    pub rubric: &'a ScenarioRubric,
    pub catalog: &'a ModuleCatalog,
    pub matches: &'a MatchResult,
    pub category_scores: &'a BTreeMap<Category, f64>,
    pub check_outcomes: &'a [(&'a ScenarioCheck, bool)],
    pub threshold: f64,
}

/// @ai:intent Deterministic recommendations in fixed category order
/// @ai:post per category: unmet items, then failed checks in rubric order, then the threshold note
/// @ai:effects pure
pub(crate) fn recommendations(input: &RecommendationInput<'_>) -> Vec<String> {
    let mut out = Vec::new();

    for category in Category::ALL {
        match category {
            Category::ModuleUsage => push_module_items(input, &mut out),
            Category::FunctionCorrectness => push_function_items(input, &mut out),
            Category::Architecture | Category::ErrorHandling => {}
        }

        out.extend(
            input
                .check_outcomes
                .iter()
                .filter(|(check, held)| !held && check.category == category)
                .map(|(check, _)| check.recommendation.clone()),
        );

        let score = input.category_scores.get(&category).copied().unwrap_or(0.0);
        if score < input.threshold {
            out.push(threshold_note(category, score));
        }
    }

    out
}

fn push_module_items(input: &RecommendationInput<'_>, out: &mut Vec<String>) {
    for module in &input.rubric.required_modules {
        if input.matches.is_included(module) {
            continue;
        }

        match input.catalog.get(module) {
            Some(definition) => out.push(format!(
                "Use the {} module (include {})",
                module, definition.header_path
            )),
            None => out.push(format!("Use the {} module", module)),
        }
    }

    for (module, names) in &input.matches.unincluded_usage {
        let header = input
            .catalog
            .get(module)
            .map(|m| m.header_path.as_str())
            .unwrap_or(module.as_str());
        let names: Vec<&str> = names.iter().map(String::as_str).collect();

        out.push(format!(
            "Include {} before using {}",
            header,
            names.join(", ")
        ));
    }
}

fn push_function_items(input: &RecommendationInput<'_>, out: &mut Vec<String>) {
    for function in &input.rubric.expected_functions {
        if !input.matches.uses_function(function) {
            out.push(format!("Call {} where the scenario requires it", function));
        }
    }
}

fn threshold_note(category: Category, score: f64) -> String {
    let advice = match category {
        Category::ModuleUsage => "rely on the internal modules instead of custom implementations",
        Category::FunctionCorrectness => "call the expected module APIs",
        Category::Architecture => {
            "split the logic into functions and pair every initialization with its cleanup"
        }
        Category::ErrorHandling => {
            "add error checking on module return values and an explicit failure path"
        }
    };

    format!("{} scored {:.1}/10: {}", category.title(), score, advice)
}
