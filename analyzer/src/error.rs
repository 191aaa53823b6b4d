//! @ai:module:intent Define error types for catalog loading and source scanning
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for all analyzer operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Failed to parse catalog: {0}")]
    CatalogParse(#[from] toml::de::Error),

    #[error("Duplicate module id in catalog: {0}")]
    DuplicateModule(String),

    #[error("Header {header} is declared by both {first} and {second}")]
    DuplicateHeader {
        header: String,
        first: String,
        second: String,
    },

    #[error("Identifier {identifier} is declared by both {first} and {second}")]
    DuplicateIdentifier {
        identifier: String,
        first: String,
        second: String,
    },

    #[error("Invalid catalog entry {module}: {message}")]
    InvalidModule { module: String, message: String },

    #[error("Module not found in catalog: {0}")]
    ModuleNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
