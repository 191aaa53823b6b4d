//! @ai:module:intent Strip comments and literals from source text and extract includes and identifiers
//! @ai:module:layer application
//! @ai:module:public_api Lexer, LexedSource
//! @ai:module:depends_on language
//! @ai:module:stateless true

use crate::language::{Language, LexicalStyle};
use regex::Regex;
use std::collections::BTreeSet;

/// @ai:intent Source text after lexical preprocessing
#[derive(Debug, Clone)]
pub struct LexedSource {
    pub language: Language,
    /// Comments blanked, literals intact, line structure preserved
    code: String,
    /// Comments and literal contents blanked, line structure preserved
    stripped: String,
    includes: Vec<String>,
    identifiers: BTreeSet<String>,
}

impl LexedSource {
    /// @ai:intent Source with comments removed and string literals kept
    /// @ai:effects pure
    pub fn code(&self) -> &str {
        &self.code
    }

    /// @ai:intent Source with comments and literal contents removed
    /// @ai:effects pure
    pub fn stripped(&self) -> &str {
        &self.stripped
    }

    /// @ai:intent Include paths in order of appearance
    /// @ai:effects pure
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// @ai:intent All distinct identifier tokens outside comments and literals
    /// @ai:effects pure
    pub fn identifiers(&self) -> &BTreeSet<String> {
        &self.identifiers
    }

    /// @ai:intent Check whether a name occurs as a whole identifier token
    /// @ai:example ("xgpio_init_pin") -> true when called in code
    /// @ai:example ("init") -> false when only xgpio_init_pin occurs
    /// @ai:effects pure
    pub fn contains_identifier(&self, name: &str) -> bool {
        self.identifiers.contains(name)
    }
}

/// @ai:intent Lexes source text for one language
pub struct Lexer {
    language: Language,
    include_regex: Regex,
    identifier_regex: Regex,
}

#[derive(Clone, Copy)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Literal(char),
}

impl Lexer {
    /// @ai:intent Create a lexer for the given language
    /// @ai:effects pure
    pub fn new(language: Language) -> Self {
        let style = language.lexical_style();
        let include_pattern = format!(
            r#"(?m)^[ \t]*#[ \t]*{}[ \t]*[<"]([^>"\n]+)[>"]"#,
            regex::escape(style.include_keyword)
        );

        Self {
            language,
            include_regex: Regex::new(&include_pattern).expect("Invalid include regex"),
            identifier_regex: Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b")
                .expect("Invalid identifier regex"),
        }
    }

    /// @ai:intent Preprocess source text into comment-free views, includes and identifiers
    /// @ai:post result.stripped() has the same line count as text
    /// @ai:effects pure
    pub fn lex(&self, text: &str) -> LexedSource {
        let (code, stripped) = strip(text, self.language.lexical_style());

        let includes = self
            .include_regex
            .captures_iter(&code)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str().trim().to_string())
            .collect();

        let identifiers = self
            .identifier_regex
            .find_iter(&stripped)
            .map(|m| m.as_str().to_string())
            .collect();

        LexedSource {
            language: self.language,
            code,
            stripped,
            includes,
            identifiers,
        }
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new(Language::C)
    }
}

/// @ai:intent Blank comments (and literal contents for the second output) keeping newlines
/// @ai:effects pure
fn strip(text: &str, style: &LexicalStyle) -> (String, String) {
    let mut code = String::with_capacity(text.len());
    let mut stripped = String::with_capacity(text.len());
    let mut state = State::Code;
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        let Some(ch) = rest.chars().next() else {
            break;
        };

        match state {
            State::Code => {
                if rest.starts_with(style.line_comment) {
                    push_blank(&mut code, &mut stripped, style.line_comment.len());
                    i += style.line_comment.len();
                    state = State::LineComment;
                    continue;
                }
                if rest.starts_with(style.block_start) {
                    push_blank(&mut code, &mut stripped, style.block_start.len());
                    i += style.block_start.len();
                    state = State::BlockComment;
                    continue;
                }
                if style.string_delimiters.contains(&ch) {
                    state = State::Literal(ch);
                }
                code.push(ch);
                stripped.push(ch);
            }
            State::LineComment => {
                if ch == '\n' {
                    state = State::Code;
                }
                push_blank_char(&mut code, &mut stripped, ch);
            }
            State::BlockComment => {
                if rest.starts_with(style.block_end) {
                    push_blank(&mut code, &mut stripped, style.block_end.len());
                    i += style.block_end.len();
                    state = State::Code;
                    continue;
                }
                push_blank_char(&mut code, &mut stripped, ch);
            }
            State::Literal(delimiter) => {
                if ch == style.escape {
                    code.push(ch);
                    stripped.push(' ');
                    i += ch.len_utf8();
                    if let Some(escaped) = text[i..].chars().next() {
                        code.push(escaped);
                        stripped.push(if escaped == '\n' { '\n' } else { ' ' });
                        i += escaped.len_utf8();
                    }
                    continue;
                }
                if ch == delimiter {
                    state = State::Code;
                    code.push(ch);
                    stripped.push(ch);
                } else if ch == '\n' {
                    // Unterminated literal: recover at end of line.
                    state = State::Code;
                    code.push(ch);
                    stripped.push(ch);
                } else {
                    code.push(ch);
                    stripped.push(' ');
                }
            }
        }

        i += ch.len_utf8();
    }

    (code, stripped)
}

fn push_blank(code: &mut String, stripped: &mut String, width: usize) {
    for _ in 0..width {
        code.push(' ');
        stripped.push(' ');
    }
}

fn push_blank_char(code: &mut String, stripped: &mut String, ch: char) {
    let blank = if ch == '\n' { '\n' } else { ' ' };
    code.push(blank);
    stripped.push(blank);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_line_and_block_comments() {
        let lexer = Lexer::default();
        let lexed = lexer.lex(
            "int a; // xgpio_init_pin(1)\n/* xgpio_write_pin\n   xgpio_deinit_pin */ int b;\n",
        );

        assert!(!lexed.contains_identifier("xgpio_init_pin"));
        assert!(!lexed.contains_identifier("xgpio_write_pin"));
        assert!(!lexed.contains_identifier("xgpio_deinit_pin"));
        assert!(lexed.contains_identifier("a"));
        assert!(lexed.contains_identifier("b"));
        assert_eq!(lexed.stripped().lines().count(), 3);
    }

    #[test]
    fn test_strips_string_literal_contents() {
        let lexer = Lexer::default();
        let lexed = lexer.lex(r#"printf("call xgpio_init_pin \"now\"\n"); char c = '"';"#);

        assert!(!lexed.contains_identifier("xgpio_init_pin"));
        assert!(lexed.contains_identifier("printf"));
        assert!(lexed.contains_identifier("c"));
        assert!(lexed.code().contains("xgpio_init_pin"));
    }

    #[test]
    fn test_extracts_includes_ignoring_commented_ones() {
        let lexer = Lexer::default();
        let lexed = lexer.lex(
            "#include \"internal_modules/hal/xgpio_hal.h\"\n\
             #  include   <stdint.h>\n\
             // #include \"xspi_hal.h\"\n\
             /* #include \"xi2c_hal.h\" */\n",
        );

        assert_eq!(
            lexed.includes(),
            &["internal_modules/hal/xgpio_hal.h".to_string(), "stdint.h".to_string()]
        );
    }

    #[test]
    fn test_identifier_boundaries() {
        let lexer = Lexer::default();
        let lexed = lexer.lex("xgpio_init_pin(2, 5, &cfg); delay(500ms);");

        assert!(lexed.contains_identifier("xgpio_init_pin"));
        assert!(!lexed.contains_identifier("init"));
        assert!(!lexed.contains_identifier("ms"));
    }

    #[test]
    fn test_unterminated_constructs_do_not_panic() {
        let lexer = Lexer::default();
        let lexed = lexer.lex("int x = 1; /* never closed\nxgpio_init_pin();");
        assert!(!lexed.contains_identifier("xgpio_init_pin"));

        let lexed = lexer.lex("char *s = \"open\nxgpio_write_pin();");
        assert!(lexed.contains_identifier("xgpio_write_pin"));

        let lexed = lexer.lex("x = '\\");
        assert!(lexed.contains_identifier("x"));
    }
}
