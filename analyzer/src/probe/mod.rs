//! @ai:module:intent Catalog-independent heuristics over source structure
//! @ai:module:layer application
//! @ai:module:public_api ProbeTrait, ProbeReport, ArchitectureProbe, ErrorHandlingProbe
//! @ai:module:depends_on lexer

pub mod architecture;
pub mod error_handling;

pub use architecture::ArchitectureProbe;
pub use error_handling::ErrorHandlingProbe;

use crate::lexer::{LexedSource, Lexer};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Upper bound of every probe score
pub const MAX_PROBE_SCORE: f64 = 10.0;

const ACQUIRE_VERBS: &[&str] = &["init", "create", "open", "alloc", "start"];
const RELEASE_VERBS: &[&str] = &["deinit", "destroy", "close", "free", "release", "stop"];

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "while", "for", "switch", "return", "sizeof", "defined", "alignof", "_Alignof",
];
const STATEMENT_KEYWORDS: &[&str] = &["return", "else", "case", "do"];

/// @ai:intent Score and findings produced by one probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub score: f64,
    pub findings: Vec<String>,
}

impl ProbeReport {
    fn new() -> Self {
        Self {
            score: 0.0,
            findings: Vec::new(),
        }
    }

    fn add(&mut self, increment: f64, finding: impl Into<String>) {
        self.score += increment;
        self.findings.push(finding.into());
    }

    fn note(&mut self, finding: impl Into<String>) {
        self.findings.push(finding.into());
    }

    fn capped(mut self) -> Self {
        self.score = self.score.clamp(0.0, MAX_PROBE_SCORE);
        self
    }
}

/// @ai:intent Trait for heuristic source probes
pub trait ProbeTrait: Send + Sync {
    /// @ai:intent Short name used in reports
    fn name(&self) -> &'static str;

    /// @ai:intent Score a lexed source and explain the score
    /// @ai:post 0.0 <= result.score <= 10.0
    fn analyze(&self, source: &LexedSource) -> ProbeReport;

    /// @ai:intent Score raw source text
    /// @ai:effects pure
    fn score(&self, text: &str) -> f64 {
        self.analyze(&Lexer::default().lex(text)).score
    }
}

/// @ai:intent A named invocation found in stripped source
#[derive(Debug, Clone)]
pub(crate) struct Invocation {
    pub name: String,
    pub start: usize,
    /// Byte offset just after the opening parenthesis
    pub args_start: usize,
    /// True when the name is being declared or defined rather than called
    pub declared: bool,
}

/// @ai:intent Statement boundaries and matched parentheses of a source, built in one pass
#[derive(Debug, Clone, Default)]
pub(crate) struct TextIndex {
    /// Offsets just after each newline, semicolon or brace, ascending
    boundaries: Vec<usize>,
    /// Offset just after an opening parenthesis to the offset of its closing one
    closings: HashMap<usize, usize>,
}

impl TextIndex {
    /// @ai:intent Index a stripped source
    /// @ai:post a group left open at a semicolon or brace has no closing entry
    /// @ai:effects pure
    pub fn new(text: &str) -> Self {
        let mut index = Self::default();
        let mut open: Vec<usize> = Vec::new();

        for (offset, ch) in text.char_indices() {
            match ch {
                '(' => open.push(offset + 1),
                ')' => {
                    if let Some(start) = open.pop() {
                        index.closings.insert(start, offset);
                    }
                }
                ';' | '{' | '}' => {
                    open.clear();
                    index.boundaries.push(offset + 1);
                }
                '\n' => index.boundaries.push(offset + 1),
                _ => {}
            }
        }

        index
    }

    /// @ai:intent Byte offset of the parenthesis closing the group opened just before start
    /// @ai:effects pure
    pub fn closing_paren(&self, start: usize) -> Option<usize> {
        self.closings.get(&start).copied()
    }

    /// @ai:intent Text from the last line start or statement boundary up to offset
    /// @ai:effects pure
    pub fn statement_before<'a>(&self, text: &'a str, offset: usize) -> &'a str {
        let position = self.boundaries.partition_point(|&b| b <= offset);
        let start = match position {
            0 => 0,
            _ => self.boundaries[position - 1],
        };
        &text[start..offset]
    }

    /// Offset of the first newline, semicolon or brace at or after offset
    pub fn statement_end(&self, offset: usize, len: usize) -> usize {
        let position = self.boundaries.partition_point(|&b| b <= offset);
        self.boundaries
            .get(position)
            .map(|&b| b - 1)
            .unwrap_or(len)
    }
}

/// @ai:intent Function definitions and call sites of a source
#[derive(Debug, Clone, Default)]
pub(crate) struct SourceShape {
    pub definitions: BTreeSet<String>,
    pub invocations: Vec<Invocation>,
    pub index: TextIndex,
}

impl SourceShape {
    /// @ai:intent Calls to functions not defined in this source
    /// @ai:effects pure
    pub fn external_calls(&self) -> impl Iterator<Item = &Invocation> {
        self.invocations
            .iter()
            .filter(|inv| !inv.declared && !self.definitions.contains(&inv.name))
    }
}

/// @ai:intent Finds function definitions and call sites in stripped source
pub(crate) struct ShapeScanner {
    invocation_regex: Regex,
}

impl ShapeScanner {
    pub fn new() -> Self {
        Self {
            invocation_regex: Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap(),
        }
    }

    /// @ai:intent Classify every name followed by a parenthesis
    /// @ai:effects pure
    pub fn scan(&self, text: &str) -> SourceShape {
        let mut shape = SourceShape {
            index: TextIndex::new(text),
            ..SourceShape::default()
        };

        for cap in self.invocation_regex.captures_iter(text) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };

            if CONTROL_KEYWORDS.contains(&name.as_str()) {
                continue;
            }

            let args_start = whole.end();
            let is_definition = shape
                .index
                .closing_paren(args_start)
                .map(|close| text[close + 1..].trim_start().starts_with('{'))
                .unwrap_or(false);

            let declared = is_definition
                || preceding_token(shape.index.statement_before(text, name.start()))
                    .is_some_and(|token| !STATEMENT_KEYWORDS.contains(&token));

            if is_definition {
                shape.definitions.insert(name.as_str().to_string());
            }

            shape.invocations.push(Invocation {
                name: name.as_str().to_string(),
                start: name.start(),
                args_start,
                declared,
            });
        }

        shape
    }
}

/// @ai:intent Split a function name into its resource prefix for acquisition verbs
/// @ai:example ("xgpio_init_pin") -> Some("xgpio")
/// @ai:example ("xmem_pool_alloc") -> Some("xmem_pool")
/// @ai:example ("init") -> None
/// @ai:effects pure
pub(crate) fn acquisition_prefix(name: &str) -> Option<String> {
    resource_prefix(name, ACQUIRE_VERBS)
}

/// @ai:intent Split a function name into its resource prefix for release verbs
/// @ai:example ("xgpio_deinit_pin") -> Some("xgpio")
/// @ai:effects pure
pub(crate) fn release_prefix(name: &str) -> Option<String> {
    resource_prefix(name, RELEASE_VERBS)
}

fn resource_prefix(name: &str, verbs: &[&str]) -> Option<String> {
    let segments: Vec<&str> = name.split('_').collect();
    let position = segments
        .iter()
        .position(|segment| verbs.contains(segment))?;

    if position == 0 || segments[..position].iter().all(|s| s.is_empty()) {
        return None;
    }

    Some(segments[..position].join("_"))
}

/// Identifier immediately preceding a name, skipping pointer stars
fn preceding_token(before: &str) -> Option<&str> {
    let trimmed = before.trim_end_matches(|c: char| c.is_whitespace() || c == '*');
    let start = trimmed
        .char_indices()
        .rev()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let token = &trimmed[start..];

    if token.is_empty() || token.starts_with(|c: char| c.is_ascii_digit()) {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_prefixes() {
        assert_eq!(acquisition_prefix("xgpio_init_pin").as_deref(), Some("xgpio"));
        assert_eq!(acquisition_prefix("xmem_pool_alloc").as_deref(), Some("xmem_pool"));
        assert_eq!(acquisition_prefix("xhw_timer_start").as_deref(), Some("xhw_timer"));
        assert_eq!(acquisition_prefix("init"), None);
        assert_eq!(acquisition_prefix("xgpio_deinit_pin"), None);
        assert_eq!(release_prefix("xgpio_deinit_pin").as_deref(), Some("xgpio"));
        assert_eq!(release_prefix("xmem_pool_free").as_deref(), Some("xmem_pool"));
        assert_eq!(release_prefix("xgpio_write_pin"), None);
    }

    #[test]
    fn test_shape_separates_definitions_and_calls() {
        let text = "static int setup(void);\n\
                    static int setup(void) {\n    return xgpio_init_pin(1, 2, &cfg);\n}\n\
                    int main(void) {\n    if (setup() != 0) { return -1; }\n    xgpio_write_pin(1, 2, 1);\n}\n";
        let shape = ShapeScanner::new().scan(text);

        assert_eq!(
            shape.definitions,
            BTreeSet::from(["main".to_string(), "setup".to_string()])
        );

        let external: Vec<&str> = shape.external_calls().map(|c| c.name.as_str()).collect();
        assert_eq!(external, vec!["xgpio_init_pin", "xgpio_write_pin"]);
    }

    #[test]
    fn test_pointer_return_definition() {
        let shape = ShapeScanner::new().scan("uint8_t *buffer_get(void) {\n    return pool;\n}\n");
        assert!(shape.definitions.contains("buffer_get"));
        assert_eq!(shape.external_calls().count(), 0);
    }

    #[test]
    fn test_closing_paren() {
        let index = TextIndex::new("f(a, g(b)) {");
        assert_eq!(index.closing_paren(2), Some(9));
        assert_eq!(index.closing_paren(7), Some(8));
        assert_eq!(TextIndex::new("f(a;").closing_paren(2), None);
        assert_eq!(TextIndex::new("f(a,\n  b)").closing_paren(2), Some(8));
    }

    #[test]
    fn test_statement_bounds() {
        let text = "int a;\n  if (x) { s = f(1); }";
        let index = TextIndex::new(text);
        let call = text.find("f(").unwrap();

        assert_eq!(index.statement_before(text, call), " s = ");
        assert_eq!(index.statement_before(text, 3), "int");
        assert_eq!(index.statement_end(call, text.len()), call + 4);
        assert_eq!(index.statement_end(text.len(), text.len()), text.len());
    }
}
