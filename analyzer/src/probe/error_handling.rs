//! @ai:module:intent Score defensive programming: checked acquisitions and explicit failure paths
//! @ai:module:layer application
//! @ai:module:public_api ErrorHandlingProbe
//! @ai:module:depends_on probe, lexer
//! @ai:module:stateless true

use super::{acquisition_prefix, Invocation, ProbeReport, ProbeTrait, ShapeScanner, TextIndex};
use crate::lexer::LexedSource;
use regex::Regex;
use std::collections::HashMap;

const CHECKED_WEIGHT: f64 = 6.0;
const FAILURE_PATH_BONUS: f64 = 4.0;

/// @ai:intent Heuristic error-handling scorer
pub struct ErrorHandlingProbe {
    scanner: ShapeScanner,
    condition_prefix_regex: Regex,
    condition_start_regex: Regex,
    identifier_regex: Regex,
    return_prefix_regex: Regex,
    assignment_regex: Regex,
    early_return_regexes: Vec<Regex>,
    goto_regex: Regex,
    propagation_regex: Regex,
}

impl ErrorHandlingProbe {
    /// @ai:intent Create a new error-handling probe
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            scanner: ShapeScanner::new(),
            condition_prefix_regex: Regex::new(
                r"^\s*(?:\}\s*)?(?:else\s+)?(?:if|while|switch)\s*\(|^\s*(?:&&|\|\|)",
            )
            .unwrap(),
            condition_start_regex: Regex::new(r"\b(?:if|while|switch)\s*\(").unwrap(),
            identifier_regex: Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*").unwrap(),
            return_prefix_regex: Regex::new(r"^\s*return\b").unwrap(),
            assignment_regex: Regex::new(
                r"\b([A-Za-z_][A-Za-z0-9_]*)\s*(?:\[[^\]]*\])?\s*=\s*(?:\([A-Za-z_][A-Za-z0-9_\s\*]*\)\s*)?$",
            )
            .unwrap(),
            early_return_regexes: vec![
                Regex::new(r"\breturn\s*\(?\s*-\s*[0-9]+").unwrap(),
                Regex::new(r"\breturn\s*\(?\s*[A-Z0-9_]*(?:ERR|FAIL)[A-Z0-9_]*\b").unwrap(),
                Regex::new(r"\breturn\s*\(?\s*(?:false|NULL)\b").unwrap(),
            ],
            goto_regex: Regex::new(r"\bgoto\s+[A-Za-z_][A-Za-z0-9_]*\s*;").unwrap(),
            propagation_regex: Regex::new(
                r"\bif\s*\(\s*!?\s*([A-Za-z_][A-Za-z0-9_]*)[^;{]*\)\s*\{?\s*return\s+([A-Za-z_][A-Za-z0-9_]*)\s*;",
            )
            .unwrap(),
        }
    }

    /// @ai:intent Offsets of every condition keyword, keyed by the identifiers its condition mentions
    /// @ai:post each offset list is ascending
    /// @ai:effects pure
    fn condition_mentions<'a>(
        &self,
        text: &'a str,
        index: &TextIndex,
    ) -> HashMap<&'a str, Vec<usize>> {
        let mut mentions: HashMap<&str, Vec<usize>> = HashMap::new();

        for start in self.condition_start_regex.find_iter(text) {
            let end = index
                .closing_paren(start.end())
                .unwrap_or_else(|| index.statement_end(start.end(), text.len()));

            for identifier in self.identifier_regex.find_iter(&text[start.end()..end]) {
                let offsets = mentions.entry(identifier.as_str()).or_default();
                if offsets.last() != Some(&start.start()) {
                    offsets.push(start.start());
                }
            }
        }

        mentions
    }

    /// @ai:intent Check whether the return value of an acquisition call is inspected
    /// @ai:effects pure
    fn is_checked(
        &self,
        text: &str,
        index: &TextIndex,
        mentions: &HashMap<&str, Vec<usize>>,
        call: &Invocation,
    ) -> bool {
        let prefix = index.statement_before(text, call.start);

        if self.condition_prefix_regex.is_match(prefix) || self.return_prefix_regex.is_match(prefix)
        {
            return true;
        }

        let Some(variable) = self
            .assignment_regex
            .captures(prefix)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str())
        else {
            return false;
        };

        // a later condition tests the variable the result was stored in
        mentions
            .get(variable)
            .and_then(|offsets| offsets.last())
            .is_some_and(|&offset| offset >= call.args_start)
    }

    /// @ai:intent Kinds of explicit failure path present in the source
    /// @ai:effects pure
    fn failure_paths(&self, text: &str) -> Vec<&'static str> {
        let mut kinds = Vec::new();

        if self.early_return_regexes.iter().any(|re| re.is_match(text)) {
            kinds.push("early error return");
        }

        if self.goto_regex.is_match(text) {
            kinds.push("goto cleanup");
        }

        let propagates = self.propagation_regex.captures_iter(text).any(|cap| {
            matches!((cap.get(1), cap.get(2)), (Some(tested), Some(returned)) if tested.as_str() == returned.as_str())
        });
        if propagates {
            kinds.push("status propagation");
        }

        kinds
    }
}

impl Default for ErrorHandlingProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeTrait for ErrorHandlingProbe {
    fn name(&self) -> &'static str {
        "error_handling"
    }

    /// @ai:intent Score the fraction of checked acquisitions plus presence of a failure path
    /// @ai:post 0.0 <= result.score <= 10.0
    /// @ai:effects pure
    fn analyze(&self, source: &LexedSource) -> ProbeReport {
        let text = source.stripped();
        let shape = self.scanner.scan(text);
        let mut report = ProbeReport::new();

        let acquisitions: Vec<&Invocation> = shape
            .external_calls()
            .filter(|call| acquisition_prefix(&call.name).is_some())
            .collect();

        if acquisitions.is_empty() {
            report.note("No acquisition calls to check");
        } else {
            let mentions = self.condition_mentions(text, &shape.index);
            let unchecked: Vec<&str> = acquisitions
                .iter()
                .filter(|call| !self.is_checked(text, &shape.index, &mentions, call))
                .map(|call| call.name.as_str())
                .collect();
            let checked = acquisitions.len() - unchecked.len();
            let fraction = checked as f64 / acquisitions.len() as f64;

            let mut finding = format!(
                "Checked return values: {} of {} acquisition calls",
                checked,
                acquisitions.len()
            );
            if !unchecked.is_empty() {
                finding.push_str(&format!(" (unchecked: {})", unchecked.join(", ")));
            }
            report.add(CHECKED_WEIGHT * fraction, finding);
        }

        let failure_paths = self.failure_paths(text);
        if failure_paths.is_empty() {
            report.note("No explicit failure path");
        } else {
            report.add(
                FAILURE_PATH_BONUS,
                format!("Failure path: {}", failure_paths.join(", ")),
            );
        }

        report.capped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn analyze(text: &str) -> ProbeReport {
        ErrorHandlingProbe::new().analyze(&Lexer::default().lex(text))
    }

    #[test]
    fn test_no_checks_scores_zero() {
        let report = analyze("int main(void) {\n    xgpio_init_pin(2, 5, &cfg);\n    xgpio_write_pin(2, 5, 1);\n}\n");

        assert_eq!(report.score, 0.0);
        assert!(report.findings.iter().any(|f| f.contains("unchecked: xgpio_init_pin")));
    }

    #[test]
    fn test_condition_check_and_early_return() {
        let text = r#"
int main(void) {
    if (xgpio_init_pin(2, 5, &cfg) != 0) {
        return -1;
    }
    return 0;
}
"#;
        assert_eq!(analyze(text).score, 10.0);
    }

    #[test]
    fn test_assigned_status_tested_later() {
        let text = r#"
int setup(void) {
    int status = xcan_init(&can_cfg);
    if (status != XCAN_OK) {
        return status;
    }
    xcan_frame_t frame;
    status = xcan_start();
    return 0;
}
"#;
        let report = analyze(text);
        // xcan_init checked through status; xcan_start assigned but never tested afterwards
        assert!((report.score - 7.0).abs() < 1e-9);
        assert!(report.findings.iter().any(|f| f.contains("status propagation")));
    }

    #[test]
    fn test_returned_directly_counts_as_checked() {
        let text = "int open_bus(void) {\n    return xi2c_init(&cfg);\n}\n";
        assert_eq!(analyze(text).score, 6.0);
    }

    #[test]
    fn test_goto_cleanup_is_a_failure_path() {
        let text = "void f(void) {\n    goto cleanup;\ncleanup:\n    xgpio_deinit_pin(1, 1);\n}\n";
        let report = analyze(text);
        assert_eq!(report.score, 4.0);
        assert!(report.findings.iter().any(|f| f.contains("goto cleanup")));
    }

    #[test]
    fn test_error_constant_return() {
        assert_eq!(analyze("int f(void) { return XGPIO_ERR_BUSY; }").score, 4.0);
        assert_eq!(analyze("bool f(void) { return false; }").score, 4.0);
        assert_eq!(analyze("int f(void) { return 0; }").score, 0.0);
    }

    #[test]
    fn test_status_tested_only_before_the_call_is_unchecked() {
        let text = "int f(void) {\n    if (status) { }\n    status = xspi_open(1);\n    return 1;\n}\n";
        assert_eq!(analyze(text).score, 0.0);
    }

    #[test]
    fn test_unclosed_condition_ends_at_statement() {
        let text = "int f(void) {\n    int rc = xspi_open(1);\n    if (flag\n    ;\n    rc++;\n}\n";
        assert_eq!(analyze(text).score, 0.0);
    }

    #[test]
    fn test_large_generated_source_scales_linearly() {
        let checked = "    v = a_init(); if (v) {}\n".repeat(20_000);
        let unchecked = "    v = a_init(); if (z) {}\n".repeat(20_000);
        let single_line = "v = a_init(); if (z) {} ".repeat(20_000);

        let started = std::time::Instant::now();
        assert_eq!(analyze(&format!("void f(void) {{\n{}}}\n", checked)).score, 6.0);
        assert_eq!(analyze(&format!("void f(void) {{\n{}}}\n", unchecked)).score, 0.0);
        assert_eq!(analyze(&format!("void f(void) {{ {} }}\n", single_line)).score, 0.0);
        assert!(started.elapsed() < std::time::Duration::from_secs(20));
    }

    #[test]
    fn test_commented_checks_do_not_count() {
        let text = "int main(void) {\n    // if (xgpio_init_pin(1, 1, NULL) != 0) return -1;\n    xgpio_init_pin(1, 1, NULL);\n}\n";
        assert_eq!(analyze(text).score, 0.0);
    }
}
