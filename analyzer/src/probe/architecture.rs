//! @ai:module:intent Score structural quality: decomposition, resource pairing, naming, user types
//! @ai:module:layer application
//! @ai:module:public_api ArchitectureProbe
//! @ai:module:depends_on probe, lexer
//! @ai:module:stateless true

use super::{acquisition_prefix, release_prefix, ProbeReport, ProbeTrait, ShapeScanner};
use crate::lexer::LexedSource;
use regex::Regex;
use std::collections::BTreeSet;

const DECOMPOSITION_BONUS: f64 = 3.0;
const RICH_DECOMPOSITION_BONUS: f64 = 1.0;
const PAIRING_WEIGHT: f64 = 3.0;
const NAMING_BONUS: f64 = 2.0;
const USER_TYPES_BONUS: f64 = 1.0;

/// @ai:intent Heuristic architecture scorer
pub struct ArchitectureProbe {
    scanner: ShapeScanner,
    handle_regex: Regex,
    snake_case_regex: Regex,
    user_type_regex: Regex,
}

impl ArchitectureProbe {
    /// @ai:intent Create a new architecture probe
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            scanner: ShapeScanner::new(),
            handle_regex: Regex::new(
                r"(\bconst\s+)?\b([A-Za-z_][A-Za-z0-9_]*_t)(?:\s+const)?(?:\s+\**|\s*\*+)\s*(?:const\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*[=;,\[)]",
            )
            .unwrap(),
            snake_case_regex: Regex::new(r"^_?[a-z][a-z0-9]*(?:_[a-z0-9]+)*$").unwrap(),
            user_type_regex: Regex::new(
                r"\btypedef\s+(?:struct|enum|union)\b|\b(?:struct|enum|union)\s+[A-Za-z_][A-Za-z0-9_]*\s*\{",
            )
            .unwrap(),
        }
    }

    /// @ai:intent Names of variables declared with a *_t type, skipping const upper-case tables
    /// @ai:effects pure
    fn handle_names(&self, text: &str) -> BTreeSet<String> {
        self.handle_regex
            .captures_iter(text)
            .filter_map(|cap| {
                let name = cap.get(3)?.as_str();
                let is_const = cap.get(1).is_some();
                let is_upper = name
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');

                if is_const && is_upper {
                    None
                } else {
                    Some(name.to_string())
                }
            })
            .collect()
    }
}

impl Default for ArchitectureProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeTrait for ArchitectureProbe {
    fn name(&self) -> &'static str {
        "architecture"
    }

    /// @ai:intent Score decomposition, init/cleanup pairing, handle naming and user types
    /// @ai:post 0.0 <= result.score <= 10.0
    /// @ai:effects pure
    fn analyze(&self, source: &LexedSource) -> ProbeReport {
        let text = source.stripped();
        let shape = self.scanner.scan(text);
        let mut report = ProbeReport::new();

        let definitions = shape.definitions.len();
        if definitions >= 2 {
            report.add(
                DECOMPOSITION_BONUS,
                format!("Modular decomposition: {} function definitions", definitions),
            );
        }
        if definitions >= 4 {
            report.add(
                RICH_DECOMPOSITION_BONUS,
                "Functionality split across four or more functions",
            );
        }

        let acquired: BTreeSet<String> = shape
            .external_calls()
            .filter_map(|call| acquisition_prefix(&call.name))
            .collect();
        let released: BTreeSet<String> = shape
            .external_calls()
            .filter_map(|call| release_prefix(&call.name))
            .collect();

        if acquired.is_empty() {
            report.note("No resource acquisition calls detected");
        } else {
            let paired = acquired.intersection(&released).count();
            let fraction = paired as f64 / acquired.len() as f64;
            let unreleased: Vec<&str> = acquired
                .difference(&released)
                .map(String::as_str)
                .collect();

            let mut finding = format!(
                "Resource pairing: {} of {} acquired resources released",
                paired,
                acquired.len()
            );
            if !unreleased.is_empty() {
                finding.push_str(&format!(" (unreleased: {})", unreleased.join(", ")));
            }
            report.add(PAIRING_WEIGHT * fraction, finding);
        }

        let handles = self.handle_names(text);
        if !handles.is_empty() {
            let inconsistent: Vec<&str> = handles
                .iter()
                .filter(|name| !self.snake_case_regex.is_match(name))
                .map(String::as_str)
                .collect();

            if inconsistent.is_empty() {
                report.add(
                    NAMING_BONUS,
                    format!("Consistent snake_case naming for {} typed variables", handles.len()),
                );
            } else {
                report.note(format!("Inconsistent variable naming: {}", inconsistent.join(", ")));
            }
        }

        if self.user_type_regex.is_match(text) {
            report.add(USER_TYPES_BONUS, "User-defined struct or enum types");
        }

        report.capped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn analyze(text: &str) -> ProbeReport {
        ArchitectureProbe::new().analyze(&Lexer::default().lex(text))
    }

    #[test]
    fn test_empty_source_scores_zero() {
        assert_eq!(analyze("").score, 0.0);
        assert_eq!(ArchitectureProbe::new().score("garbage ((( {{"), 0.0);
    }

    #[test]
    fn test_full_structure_scores_ten() {
        let text = r#"
typedef struct {
    uint8_t pin;
} led_t;

static int led_setup(led_t *led) {
    return xgpio_init_pin(0, led->pin, NULL);
}

static void led_on(led_t *led) {
    xgpio_write_pin(0, led->pin, 1);
}

static void led_teardown(led_t *led) {
    xgpio_deinit_pin(0, led->pin);
}

int main(void) {
    led_t status_led = { .pin = 5 };
    led_setup(&status_led);
    led_on(&status_led);
    led_teardown(&status_led);
    return 0;
}
"#;
        let report = analyze(text);
        assert_eq!(report.score, 10.0);
        assert!(report.findings.iter().any(|f| f.contains("1 of 1")));
    }

    #[test]
    fn test_unpaired_acquisition_earns_no_pairing_credit() {
        let text = "void a(void) {\n    xgpio_init_pin(1, 2, NULL);\n}\nvoid b(void) {\n    xgpio_write_pin(1, 2, 1);\n}\n";
        let report = analyze(text);

        assert_eq!(report.score, 3.0);
        assert!(report.findings.iter().any(|f| f.contains("unreleased: xgpio")));
    }

    #[test]
    fn test_partial_pairing_is_proportional() {
        let text = "int main(void) {\n    xcan_init(&c);\n    xspi_init(&s);\n    xcan_deinit(&c);\n}\n";
        let report = analyze(text);
        assert!((report.score - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_inconsistent_naming_earns_nothing() {
        let consistent = analyze("int main(void) {\n    xgpio_config_t led_cfg;\n    uint32_t tick_count = 0;\n}\n");
        let inconsistent = analyze("int main(void) {\n    xgpio_config_t ledCfg;\n    uint32_t tick_count = 0;\n}\n");

        assert_eq!(consistent.score, 2.0);
        assert_eq!(inconsistent.score, 0.0);
        assert!(inconsistent.findings.iter().any(|f| f.contains("ledCfg")));
    }

    #[test]
    fn test_const_tables_may_be_upper_case() {
        let report = analyze("static const uint8_t PIN_TABLE[4] = {1, 2, 3, 4};\nuint8_t led_pin = 2;\n");
        assert_eq!(report.score, 2.0);
    }

    #[test]
    fn test_identifier_containing_t_is_not_a_handle() {
        let report = analyze("int main(void) {\n    my_temp = 5;\n}\n");
        assert_eq!(report.score, 0.0);
    }
}
