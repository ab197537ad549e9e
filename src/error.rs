//! Error types and exit codes for vuex-engine

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Main error type for vuex-engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported language for extension: {extension}")]
    UnsupportedLanguage { extension: String },

    #[error("Failed to parse file: {message}")]
    ParseFailure { message: String },

    #[error("File {path} exceeds the {limit} byte parse ceiling")]
    OversizedFile { path: PathBuf, limit: u64 },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Indexing failed: {message}")]
    IndexFailure { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Convert error to an exit code for the diagnostic binary:
    /// - 1: File not found / IO error
    /// - 2: Unsupported language
    /// - 3: Parse failure / oversized file
    /// - 4: Indexing failure
    /// - 6: Configuration error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileNotFound { .. } => ExitCode::from(1),
            Self::UnsupportedLanguage { .. } => ExitCode::from(2),
            Self::ParseFailure { .. } => ExitCode::from(3),
            Self::OversizedFile { .. } => ExitCode::from(3),
            Self::IndexFailure { .. } => ExitCode::from(4),
            Self::ConfigError { .. } => ExitCode::from(6),
            Self::Io(_) => ExitCode::from(1),
        }
    }

    /// Whether this error only means "this file contributes nothing".
    ///
    /// The module graph parser absorbs these and keeps indexing siblings.
    pub fn is_soft_skip(&self) -> bool {
        matches!(
            self,
            Self::ParseFailure { .. } | Self::OversizedFile { .. } | Self::UnsupportedLanguage { .. }
        )
    }
}

/// Result type alias for vuex-engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
