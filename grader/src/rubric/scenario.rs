//! @ai:module:intent Scenario rubric definitions: categories, weights and scenario checks
//! @ai:module:layer domain
//! @ai:module:public_api Category, CategoryWeights, ScenarioRubric, ScenarioCheck, CheckKind, Metric
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};

/// Tolerance for the weight sum
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// @ai:intent Scoring category of a scenario evaluation
/// @ai:effects pure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ModuleUsage,
    FunctionCorrectness,
    Architecture,
    ErrorHandling,
}

impl Category {
    /// Fixed reporting order
    pub const ALL: [Category; 4] = [
        Category::ModuleUsage,
        Category::FunctionCorrectness,
        Category::Architecture,
        Category::ErrorHandling,
    ];

    /// @ai:intent Convert category to string representation
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ModuleUsage => "module_usage",
            Category::FunctionCorrectness => "function_correctness",
            Category::Architecture => "architecture",
            Category::ErrorHandling => "error_handling",
        }
    }

    /// @ai:intent Human-readable category title
    /// @ai:effects pure
    pub fn title(&self) -> &'static str {
        match self {
            Category::ModuleUsage => "Module Usage",
            Category::FunctionCorrectness => "Function Correctness",
            Category::Architecture => "Architecture Quality",
            Category::ErrorHandling => "Error Handling",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Per-category weights of a rubric, summing to 1
/// @ai:effects pure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub module_usage: f64,
    pub function_correctness: f64,
    pub architecture: f64,
    pub error_handling: f64,
}

impl CategoryWeights {
    /// @ai:intent Weight of one category
    /// @ai:effects pure
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::ModuleUsage => self.module_usage,
            Category::FunctionCorrectness => self.function_correctness,
            Category::Architecture => self.architecture,
            Category::ErrorHandling => self.error_handling,
        }
    }

    /// @ai:intent Sum of all weights
    /// @ai:effects pure
    pub fn sum(&self) -> f64 {
        Category::ALL.iter().map(|&c| self.get(c)).sum()
    }

    /// @ai:intent Check every weight is in [0,1] and the sum is 1 within tolerance
    /// @ai:effects pure
    pub fn is_valid(&self) -> bool {
        Category::ALL
            .iter()
            .all(|&c| (0.0..=1.0).contains(&self.get(c)))
            && (self.sum() - 1.0).abs() <= WEIGHT_TOLERANCE
    }
}

/// @ai:intent Value a numeric threshold check compares against
/// @ai:effects pure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ModuleUsage,
    FunctionCorrectness,
    Architecture,
    ErrorHandling,
    ModulesIncluded,
    FunctionsUsed,
}

impl Metric {
    /// @ai:intent The category score this metric reads, if any
    /// @ai:effects pure
    pub fn category(&self) -> Option<Category> {
        match self {
            Metric::ModuleUsage => Some(Category::ModuleUsage),
            Metric::FunctionCorrectness => Some(Category::FunctionCorrectness),
            Metric::Architecture => Some(Category::Architecture),
            Metric::ErrorHandling => Some(Category::ErrorHandling),
            Metric::ModulesIncluded | Metric::FunctionsUsed => None,
        }
    }
}

/// @ai:intent Predicate variants a scenario check can evaluate
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckKind {
    /// Holds when the fraction of listed modules included and identifiers used reaches min_fraction
    RequirementPresence {
        #[serde(default)]
        modules: Vec<String>,
        #[serde(default)]
        identifiers: Vec<String>,
        #[serde(default = "default_min_fraction")]
        min_fraction: f64,
    },
    /// Holds when the metric is at least min
    NumericThreshold { metric: Metric, min: f64 },
    /// Holds when any pattern appears, case-insensitively, outside comments
    PatternPresence { patterns: Vec<String> },
}

fn default_min_fraction() -> f64 {
    1.0
}

/// @ai:intent A named scenario-specific check
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCheck {
    pub name: String,
    /// Category the failure recommendation is reported under
    pub category: Category,
    pub recommendation: String,
    #[serde(flatten)]
    pub kind: CheckKind,
}

/// @ai:intent Static grading configuration for one scenario
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRubric {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_modules: Vec<String>,
    #[serde(default)]
    pub optional_modules: Vec<String>,
    /// Denominator of function_correctness when non-empty
    #[serde(default)]
    pub expected_functions: Vec<String>,
    pub weights: CategoryWeights,
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
    #[serde(default, rename = "check")]
    pub checks: Vec<ScenarioCheck>,
}

fn default_pass_threshold() -> f64 {
    6.0
}

impl ScenarioRubric {
    /// @ai:intent Display title, falling back to the id
    /// @ai:example (id "basic_gpio", no title) -> "Basic Gpio"
    /// @ai:effects pure
    pub fn display_title(&self) -> String {
        if !self.title.trim().is_empty() {
            return self.title.clone();
        }

        self.id
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// @ai:intent A rubric with no required modules scores module_usage trivially
    /// @ai:effects pure
    pub fn is_degenerate(&self) -> bool {
        self.required_modules.is_empty()
    }

    /// @ai:intent Checks reported under a category, in rubric order
    /// @ai:effects pure
    pub fn checks_for(&self, category: Category) -> impl Iterator<Item = &ScenarioCheck> {
        self.checks.iter().filter(move |c| c.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(m: f64, f: f64, a: f64, e: f64) -> CategoryWeights {
        CategoryWeights {
            module_usage: m,
            function_correctness: f,
            architecture: a,
            error_handling: e,
        }
    }

    #[test]
    fn test_weight_validation() {
        assert!(weights(0.4, 0.3, 0.2, 0.1).is_valid());
        assert!(weights(0.20, 0.18, 0.35, 0.27).is_valid());
        assert!(!weights(0.4, 0.3, 0.2, 0.2).is_valid());
        assert!(!weights(1.5, -0.5, 0.0, 0.0).is_valid());
    }

    #[test]
    fn test_check_kinds_parse_from_toml() {
        let toml = r#"
name = "timing"
kind = "pattern_presence"
category = "architecture"
patterns = ["delay"]
recommendation = "Add timing"
"#;
        let check: ScenarioCheck = toml::from_str(toml).unwrap();
        assert_eq!(check.category, Category::Architecture);
        assert_eq!(
            check.kind,
            CheckKind::PatternPresence {
                patterns: vec!["delay".to_string()]
            }
        );

        let toml = "name = \"mods\"\nkind = \"requirement_presence\"\ncategory = \"module_usage\"\nmodules = [\"xgpio_hal\"]\nrecommendation = \"r\"\n";
        let check: ScenarioCheck = toml::from_str(toml).unwrap();
        assert!(matches!(
            check.kind,
            CheckKind::RequirementPresence { min_fraction, .. } if min_fraction == 1.0
        ));
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let toml = "name = \"m\"\nkind = \"numeric_threshold\"\ncategory = \"architecture\"\nmetric = \"lines_of_code\"\nmin = 3.0\nrecommendation = \"r\"\n";
        assert!(toml::from_str::<ScenarioCheck>(toml).is_err());
    }

    #[test]
    fn test_display_title_falls_back_to_id() {
        let rubric = ScenarioRubric {
            id: "basic_gpio".to_string(),
            title: String::new(),
            description: String::new(),
            required_modules: vec![],
            optional_modules: vec![],
            expected_functions: vec![],
            weights: weights(0.4, 0.3, 0.2, 0.1),
            pass_threshold: 6.0,
            checks: vec![],
        };
        assert_eq!(rubric.display_title(), "Basic Gpio");
        assert!(rubric.is_degenerate());
    }

    #[test]
    fn test_category_order() {
        let names: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        assert_eq!(
            names,
            vec!["module_usage", "function_correctness", "architecture", "error_handling"]
        );
    }
}
