//! @ai:module:intent Catalog-driven analysis of internal module usage in C sources
//! @ai:module:layer infrastructure
//! @ai:module:public_api catalog, lexer, matcher, probe, scan, language, output, error
//! @ai:module:stateless true
//!
//! # modgrade analyzer
//!
//! Detects which internal modules, functions, types and constants a piece of
//! C/C++ source uses, and scores its structure and error handling with
//! catalog-independent heuristics. The analysis is purely lexical: sources are
//! never compiled or executed.
//!
//! ## Example
//!
//! ```rust,no_run
//! use modgrade_analyzer::{ModuleCatalog, SourceMatcher, SourceMatcherTrait};
//!
//! let catalog = ModuleCatalog::builtin().unwrap();
//! let source = "#include \"xgpio_hal.h\"\nvoid f(void) { xgpio_init_pin(2, 5, 0); }\n";
//! let matches = SourceMatcher::new().match_source(source, &catalog);
//! assert!(matches.is_included("xgpio_hal"));
//! ```

pub mod catalog;
pub mod error;
pub mod language;
pub mod lexer;
pub mod matcher;
pub mod output;
pub mod probe;
pub mod scan;

pub use catalog::{header_matches, ModuleCatalog, ModuleDefinition};
pub use error::{Error, Result};
pub use language::{detect_language, is_supported_file, Language};
pub use lexer::{LexedSource, Lexer};
pub use matcher::{MatchResult, SourceMatcher, SourceMatcherTrait};
pub use output::{format_catalog, format_scan_summary, OutputFormat};
pub use probe::{ArchitectureProbe, ErrorHandlingProbe, ProbeReport, ProbeTrait, MAX_PROBE_SCORE};
pub use scan::{ScanFailure, ScanReport, ScanSummary, Scanner};
