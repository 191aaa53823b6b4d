//! @ai:module:intent Load scenario rubrics from TOML and validate them against the catalog
//! @ai:module:layer infrastructure
//! @ai:module:public_api RubricSet, RubricError
//! @ai:module:depends_on rubric::scenario
//! @ai:module:stateless true

use super::scenario::{CheckKind, ScenarioRubric};
use modgrade_analyzer::ModuleCatalog;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUILTIN_SCENARIOS: &str = include_str!("../../config/scenarios.toml");

/// @ai:intent Configuration errors in scenario rubrics
#[derive(Error, Debug)]
pub enum RubricError {
    #[error("Failed to read rubric file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rubrics: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Duplicate scenario id: {0}")]
    DuplicateScenario(String),

    #[error("Scenario {scenario}: {message}")]
    Invalid { scenario: String, message: String },

    #[error("Scenario {scenario}: invalid weights ({message})")]
    InvalidWeights { scenario: String, message: String },

    #[error("Scenario {scenario} references unknown module {module}")]
    UnknownModule { scenario: String, module: String },

    #[error("Scenario {scenario} requires module {module}, which declares no functions")]
    EmptyRequiredModule { scenario: String, module: String },

    #[error("Scenario {scenario} expects function {function}, not declared by its required or optional modules")]
    UndeclaredFunction { scenario: String, function: String },

    #[error("Scenario {scenario}, check {check}: {message}")]
    InvalidCheck {
        scenario: String,
        check: String,
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct RubricFile {
    #[serde(rename = "scenario", default)]
    scenarios: Vec<ScenarioRubric>,
}

/// @ai:intent Validated, read-only set of scenario rubrics keyed by id
#[derive(Debug, Clone)]
pub struct RubricSet {
    rubrics: Vec<ScenarioRubric>,
    index: HashMap<String, usize>,
}

impl RubricSet {
    /// @ai:intent Build a rubric set, failing fast on any malformed rubric
    /// @ai:effects pure
    pub fn new(rubrics: Vec<ScenarioRubric>, catalog: &ModuleCatalog) -> Result<Self, RubricError> {
        let mut index = HashMap::with_capacity(rubrics.len());

        for (position, rubric) in rubrics.iter().enumerate() {
            validate_rubric(rubric, catalog)?;

            if index.insert(rubric.id.clone(), position).is_some() {
                return Err(RubricError::DuplicateScenario(rubric.id.clone()));
            }

            if rubric.is_degenerate() {
                tracing::warn!(
                    "Scenario {} has no required modules; module usage will always score 10",
                    rubric.id
                );
            }
        }

        Ok(Self { rubrics, index })
    }

    /// @ai:intent Parse rubrics from TOML text
    /// @ai:effects pure
    pub fn from_toml_str(content: &str, catalog: &ModuleCatalog) -> Result<Self, RubricError> {
        let file: RubricFile = toml::from_str(content)?;
        Self::new(file.scenarios, catalog)
    }

    /// @ai:intent Load rubrics from a TOML file
    /// @ai:effects fs:read
    pub fn load(path: &Path, catalog: &ModuleCatalog) -> Result<Self, RubricError> {
        let content = std::fs::read_to_string(path).map_err(|e| RubricError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content, catalog)
    }

    /// @ai:intent The embedded rubrics for the four reference scenarios
    /// @ai:effects pure
    pub fn builtin(catalog: &ModuleCatalog) -> Result<Self, RubricError> {
        Self::from_toml_str(BUILTIN_SCENARIOS, catalog)
    }

    /// @ai:intent Look up a rubric by scenario id
    /// @ai:effects pure
    pub fn get(&self, scenario_id: &str) -> Option<&ScenarioRubric> {
        self.index.get(scenario_id).map(|&i| &self.rubrics[i])
    }

    /// @ai:intent All rubrics in declaration order
    /// @ai:effects pure
    pub fn all(&self) -> &[ScenarioRubric] {
        &self.rubrics
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rubrics.iter().map(|r| r.id.as_str())
    }

    pub fn contains(&self, scenario_id: &str) -> bool {
        self.index.contains_key(scenario_id)
    }

    pub fn len(&self) -> usize {
        self.rubrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rubrics.is_empty()
    }
}

/// @ai:intent Validate one rubric against the catalog
/// @ai:effects pure
fn validate_rubric(rubric: &ScenarioRubric, catalog: &ModuleCatalog) -> Result<(), RubricError> {
    let scenario = rubric.id.clone();
    let invalid = |message: &str| RubricError::Invalid {
        scenario: scenario.clone(),
        message: message.to_string(),
    };

    if rubric.id.trim().is_empty() {
        return Err(invalid("scenario id is empty"));
    }

    if !rubric.weights.is_valid() {
        return Err(RubricError::InvalidWeights {
            scenario: scenario.clone(),
            message: format!(
                "each weight must be within [0, 1] and the sum must be 1.0, got {:.6}",
                rubric.weights.sum()
            ),
        });
    }

    if !(0.0..=10.0).contains(&rubric.pass_threshold) {
        return Err(invalid("pass_threshold must be within [0, 10]"));
    }

    let mut seen = HashSet::new();
    for module in rubric.required_modules.iter().chain(&rubric.optional_modules) {
        let definition = catalog.get(module).ok_or_else(|| RubricError::UnknownModule {
            scenario: scenario.clone(),
            module: module.clone(),
        })?;

        if !seen.insert(module.as_str()) {
            return Err(invalid(&format!("module {} is listed more than once", module)));
        }

        if rubric.required_modules.contains(module) && definition.functions.is_empty() {
            return Err(RubricError::EmptyRequiredModule {
                scenario: scenario.clone(),
                module: module.clone(),
            });
        }
    }

    for function in &rubric.expected_functions {
        let declared = rubric
            .required_modules
            .iter()
            .chain(&rubric.optional_modules)
            .filter_map(|id| catalog.get(id))
            .any(|module| module.functions.contains(function));

        if !declared {
            return Err(RubricError::UndeclaredFunction {
                scenario: scenario.clone(),
                function: function.clone(),
            });
        }
    }

    let mut check_names = HashSet::new();
    for check in &rubric.checks {
        let check_error = |message: String| RubricError::InvalidCheck {
            scenario: scenario.clone(),
            check: check.name.clone(),
            message,
        };

        if check.name.trim().is_empty() {
            return Err(check_error("check name is empty".to_string()));
        }
        if !check_names.insert(check.name.as_str()) {
            return Err(check_error("check name is used more than once".to_string()));
        }

        match &check.kind {
            CheckKind::RequirementPresence {
                modules,
                identifiers,
                min_fraction,
            } => {
                if modules.is_empty() && identifiers.is_empty() {
                    return Err(check_error("no modules or identifiers listed".to_string()));
                }
                if !(0.0..=1.0).contains(min_fraction) {
                    return Err(check_error("min_fraction must be within [0, 1]".to_string()));
                }
                if let Some(module) = modules.iter().find(|m| !catalog.contains(m)) {
                    return Err(check_error(format!("unknown module {}", module)));
                }
                if let Some(identifier) = identifiers
                    .iter()
                    .find(|name| !catalog.all().iter().any(|m| m.identifiers().any(|i| i == *name)))
                {
                    return Err(check_error(format!(
                        "identifier {} is not declared by any module",
                        identifier
                    )));
                }
            }
            CheckKind::NumericThreshold { min, .. } => {
                if !min.is_finite() {
                    return Err(check_error("min must be a finite number".to_string()));
                }
            }
            CheckKind::PatternPresence { patterns } => {
                if patterns.is_empty() || patterns.iter().any(|p| p.trim().is_empty()) {
                    return Err(check_error("patterns must be non-empty".to_string()));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::scenario::Category;
    use pretty_assertions::assert_eq;

    fn catalog() -> ModuleCatalog {
        ModuleCatalog::builtin().unwrap()
    }

    const MINIMAL: &str = r#"
[[scenario]]
id = "blink"
required_modules = ["xgpio_hal"]
expected_functions = ["xgpio_init_pin"]

[scenario.weights]
module_usage = 0.25
function_correctness = 0.25
architecture = 0.25
error_handling = 0.25
"#;

    #[test]
    fn test_builtin_scenarios_load() {
        let rubrics = RubricSet::builtin(&catalog()).unwrap();

        assert_eq!(
            rubrics.ids().collect::<Vec<_>>(),
            vec!["basic_gpio", "sensor_reading", "motor_control", "protocol_gateway"]
        );

        let gpio = rubrics.get("basic_gpio").unwrap();
        assert_eq!(gpio.weights.get(Category::ModuleUsage), 0.40);
        assert_eq!(gpio.expected_functions.len(), 3);
        assert_eq!(gpio.checks.len(), 2);
        assert_eq!(gpio.pass_threshold, 6.0);

        for rubric in rubrics.all() {
            assert!((rubric.weights.sum() - 1.0).abs() < 1e-6, "{}", rubric.id);
        }
    }

    #[test]
    fn test_minimal_rubric_defaults() {
        let rubrics = RubricSet::from_toml_str(MINIMAL, &catalog()).unwrap();
        let blink = rubrics.get("blink").unwrap();

        assert!(blink.optional_modules.is_empty());
        assert!(blink.checks.is_empty());
        assert_eq!(blink.display_title(), "Blink");
        assert!(rubrics.get("basic_gpio").is_none());
    }

    #[test]
    fn test_duplicate_scenario_rejected() {
        let content = format!("{}\n{}", MINIMAL, MINIMAL);
        let result = RubricSet::from_toml_str(&content, &catalog());
        assert!(matches!(result, Err(RubricError::DuplicateScenario(id)) if id == "blink"));
    }

    #[test]
    fn test_bad_weights_rejected() {
        let content = MINIMAL.replace("error_handling = 0.25", "error_handling = 0.35");
        let result = RubricSet::from_toml_str(&content, &catalog());
        assert!(matches!(result, Err(RubricError::InvalidWeights { .. })));
    }

    #[test]
    fn test_unknown_module_rejected() {
        let content = MINIMAL.replace("[\"xgpio_hal\"]", "[\"xgpio_hal\", \"xwifi\"]");
        let result = RubricSet::from_toml_str(&content, &catalog());
        assert!(matches!(
            result,
            Err(RubricError::UnknownModule { module, .. }) if module == "xwifi"
        ));
    }

    #[test]
    fn test_required_module_without_functions_rejected() {
        let catalog = ModuleCatalog::from_toml_str(
            "[[module]]\nid = \"xgpio_hal\"\nheader = \"hal/xgpio_hal.h\"\ntypes = [\"xgpio_config_t\"]\n",
        )
        .unwrap();
        let content = MINIMAL.replace("expected_functions = [\"xgpio_init_pin\"]", "");
        let result = RubricSet::from_toml_str(&content, &catalog);
        assert!(matches!(result, Err(RubricError::EmptyRequiredModule { .. })));
    }

    #[test]
    fn test_undeclared_expected_function_rejected() {
        let content = MINIMAL.replace("xgpio_init_pin", "xcan_init");
        let result = RubricSet::from_toml_str(&content, &catalog());
        assert!(matches!(
            result,
            Err(RubricError::UndeclaredFunction { function, .. }) if function == "xcan_init"
        ));
    }

    #[test]
    fn test_invalid_checks_rejected() {
        let empty_patterns = format!(
            "{}\n[[scenario.check]]\nname = \"t\"\nkind = \"pattern_presence\"\ncategory = \"architecture\"\npatterns = []\nrecommendation = \"r\"\n",
            MINIMAL
        );
        assert!(matches!(
            RubricSet::from_toml_str(&empty_patterns, &catalog()),
            Err(RubricError::InvalidCheck { .. })
        ));

        let bad_fraction = format!(
            "{}\n[[scenario.check]]\nname = \"t\"\nkind = \"requirement_presence\"\ncategory = \"architecture\"\nmodules = [\"xgpio_hal\"]\nmin_fraction = 1.5\nrecommendation = \"r\"\n",
            MINIMAL
        );
        assert!(matches!(
            RubricSet::from_toml_str(&bad_fraction, &catalog()),
            Err(RubricError::InvalidCheck { .. })
        ));

        let unknown_metric = format!(
            "{}\n[[scenario.check]]\nname = \"t\"\nkind = \"numeric_threshold\"\ncategory = \"architecture\"\nmetric = \"cyclomatic\"\nmin = 1.0\nrecommendation = \"r\"\n",
            MINIMAL
        );
        assert!(matches!(
            RubricSet::from_toml_str(&unknown_metric, &catalog()),
            Err(RubricError::Parse(_))
        ));
    }

    #[test]
    fn test_degenerate_rubric_is_accepted() {
        let content = MINIMAL
            .replace("required_modules = [\"xgpio_hal\"]", "optional_modules = [\"xgpio_hal\"]");
        let rubrics = RubricSet::from_toml_str(&content, &catalog()).unwrap();
        assert!(rubrics.get("blink").unwrap().is_degenerate());
    }

    #[test]
    fn test_load_missing_file() {
        let result = RubricSet::load(Path::new("/nonexistent/scenarios.toml"), &catalog());
        assert!(matches!(result, Err(RubricError::Read { .. })));
    }
}
