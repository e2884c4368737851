//! The public error type.

use smol_str::SmolStr;
use thiserror::Error;

use super::codes::ErrorCode;

/// Convenience alias used by all fallible compiler entry points.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by compiler entry points.
///
/// Diagnostics attached to a module during parse/resolve are collected on
/// the context (see [`super::DiagnosticCollector`]); this type is for
/// failures of the operation itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("module '{name}' not found")]
    ModuleNotFound { name: SmolStr },

    #[error("module '{name}' revision '{requested}' not found")]
    WrongVersion { name: SmolStr, requested: SmolStr },

    #[error("module '{name}' revision {revision:?} already registered from a different source")]
    ModuleConflict {
        name: SmolStr,
        revision: Option<SmolStr>,
    },

    #[error("namespace '{uri}' already registered by module '{owner}'")]
    DuplicateNamespace { uri: SmolStr, owner: SmolStr },

    #[error("definition '{name}' not found")]
    DefNotFound { name: SmolStr },

    #[error("'{name}' matches objects in multiple modules")]
    MultipleMatches { name: SmolStr },

    #[error("dependency cycle through '{name}'")]
    DependencyCycle { name: SmolStr },

    #[error("identity base cycle through '{name}'")]
    IdentityCycle { name: SmolStr },

    #[error("syntax error at {line}.{col}: {message}")]
    Syntax {
        line: u32,
        col: u32,
        message: String,
    },

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("source for module '{name}' could not be read: {detail}")]
    SourceUnavailable { name: SmolStr, detail: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The diagnostic code this error reports under.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ModuleNotFound { .. } | Self::SourceUnavailable { .. } => {
                ErrorCode::ModuleNotFound
            }
            Self::WrongVersion { .. } => ErrorCode::WrongVersion,
            Self::ModuleConflict { .. } => ErrorCode::ModuleConflict,
            Self::DuplicateNamespace { .. } => ErrorCode::DuplicateNamespace,
            Self::DefNotFound { .. } => ErrorCode::DefNotFound,
            Self::MultipleMatches { .. } => ErrorCode::MultipleMatches,
            Self::DependencyCycle { .. } | Self::IdentityCycle { .. } => ErrorCode::Cycle,
            Self::Syntax { .. } => ErrorCode::InvalidValue,
            Self::InvalidValue(_) => ErrorCode::InvalidValue,
            Self::OperationFailed(_) => ErrorCode::OperationFailed,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }
}
