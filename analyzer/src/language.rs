//! @ai:module:intent Define the source languages accepted for grading and their lexical syntax
//! @ai:module:layer domain
//! @ai:module:public_api Language, LexicalStyle, detect_language, is_supported_file
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::path::Path;

/// @ai:intent Represents a gradable source language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
}

/// @ai:intent Comment, literal and directive syntax for a language
#[derive(Debug, Clone)]
pub struct LexicalStyle {
    pub line_comment: &'static str,
    pub block_start: &'static str,
    pub block_end: &'static str,
    pub string_delimiters: &'static [char],
    pub escape: char,
    pub include_keyword: &'static str,
}

const C_STYLE: LexicalStyle = LexicalStyle {
    line_comment: "//",
    block_start: "/*",
    block_end: "*/",
    string_delimiters: &['"', '\''],
    escape: '\\',
    include_keyword: "include",
};

impl Language {
    /// @ai:intent Get the lexical style for this language
    /// @ai:effects pure
    pub fn lexical_style(&self) -> &'static LexicalStyle {
        // C++ raw strings are rare in generated firmware and are lexed as plain strings.
        match self {
            Language::C | Language::Cpp => &C_STYLE,
        }
    }

    /// @ai:intent Get file extensions for this language
    /// @ai:effects pure
    pub fn extensions(&self) -> &[&str] {
        match self {
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "cc", "cxx", "hpp", "hh", "hxx"],
        }
    }

    /// @ai:intent Get language name as string
    /// @ai:effects pure
    pub fn name(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// @ai:intent Detect the source language from a file path
/// @ai:example ("gpio.c") -> Some(C)
/// @ai:example ("gateway.cpp") -> Some(Cpp)
/// @ai:example ("notes.txt") -> None
/// @ai:effects pure
pub fn detect_language(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?;

    [Language::C, Language::Cpp]
        .into_iter()
        .find(|lang| lang.extensions().contains(&ext))
}

/// @ai:intent Check if a file can be graded based on its extension
/// @ai:effects pure
pub fn is_supported_file(path: &Path) -> bool {
    detect_language(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_c() {
        assert_eq!(detect_language(Path::new("basic_gpio.c")), Some(Language::C));
        assert_eq!(detect_language(Path::new("xgpio_hal.h")), Some(Language::C));
    }

    #[test]
    fn test_detect_cpp() {
        assert_eq!(
            detect_language(Path::new("motor_control.cpp")),
            Some(Language::Cpp)
        );
    }

    #[test]
    fn test_unsupported() {
        assert_eq!(detect_language(Path::new("README.md")), None);
        assert!(!is_supported_file(Path::new("Makefile")));
    }
}
