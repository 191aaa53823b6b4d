//! @ai:module:intent Scan source files for catalog usage and probe scores
//! @ai:module:layer application
//! @ai:module:public_api Scanner, ScanReport, ScanSummary, ScanFailure
//! @ai:module:depends_on catalog, matcher, probe, language, error
//! @ai:module:stateless true

use crate::catalog::ModuleCatalog;
use crate::error::{Error, Result};
use crate::language::{detect_language, is_supported_file, Language};
use crate::lexer::Lexer;
use crate::matcher::{MatchResult, SourceMatcher, SourceMatcherTrait};
use crate::probe::{ArchitectureProbe, ErrorHandlingProbe, ProbeReport, ProbeTrait};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent Catalog matches and probe results for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub path: PathBuf,
    pub language: Language,
    pub matches: MatchResult,
    pub architecture: ProbeReport,
    pub error_handling: ProbeReport,
}

/// @ai:intent A file that could not be scanned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub message: String,
}

/// @ai:intent Result of scanning a file or directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    pub reports: Vec<ScanReport>,
    pub failures: Vec<ScanFailure>,
}

impl ScanSummary {
    /// @ai:intent Check if every file was scanned
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// @ai:intent Runs the matcher and both probes over source files
pub struct Scanner {
    matcher: SourceMatcher,
    architecture: ArchitectureProbe,
    error_handling: ErrorHandlingProbe,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            matcher: SourceMatcher::new(),
            architecture: ArchitectureProbe::new(),
            error_handling: ErrorHandlingProbe::new(),
        }
    }

    /// @ai:intent Scan source text that is already in memory
    /// @ai:effects pure
    pub fn scan_text(
        &self,
        path: &Path,
        language: Language,
        text: &str,
        catalog: &ModuleCatalog,
    ) -> ScanReport {
        let lexed = Lexer::new(language).lex(text);

        ScanReport {
            path: path.to_path_buf(),
            language,
            matches: self.matcher.match_lexed(&lexed, catalog),
            architecture: self.architecture.analyze(&lexed),
            error_handling: self.error_handling.analyze(&lexed),
        }
    }

    /// @ai:intent Scan a single source file
    /// @ai:pre path exists and is a supported file type
    /// @ai:effects fs:read
    pub fn scan_file(&self, path: &Path, catalog: &ModuleCatalog) -> Result<ScanReport> {
        let language = detect_language(path)
            .ok_or_else(|| Error::UnsupportedFileType(path.display().to_string()))?;

        let text = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(self.scan_text(path, language, &text, catalog))
    }

    /// @ai:intent Scan every supported file under a directory, in path order
    /// @ai:effects fs:read
    pub fn scan_directory(&self, path: &Path, catalog: &ModuleCatalog) -> Result<ScanSummary> {
        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("not a directory: {}", path.display()),
            )));
        }

        let mut summary = ScanSummary::default();

        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let file_path = entry.path();

            if !is_supported_file(file_path) {
                continue;
            }

            match self.scan_file(file_path, catalog) {
                Ok(report) => summary.reports.push(report),
                Err(e) => summary.failures.push(ScanFailure {
                    path: file_path.to_path_buf(),
                    message: e.to_string(),
                }),
            }
        }

        Ok(summary)
    }

    /// @ai:intent Scan a file or a directory
    /// @ai:effects fs:read
    pub fn scan_path(&self, path: &Path, catalog: &ModuleCatalog) -> Result<ScanSummary> {
        if path.is_dir() {
            self.scan_directory(path, catalog)
        } else {
            Ok(ScanSummary {
                reports: vec![self.scan_file(path, catalog)?],
                failures: Vec::new(),
            })
        }
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}
