//! Error types for routine load administration.
//!
//! All failures are represented by [`RoutineLoadError`]. Database-facing
//! failures never abort a run: the catalog layer reports them through the
//! injected [`Reporter`](crate::monitor::Reporter) and degrades to an empty
//! result for that unit of work. Only operator input errors and terminal
//! I/O errors reach the binary.
//!
//! # Error Classification
//!
//! - **Input**: invalid mode or argument typed by the operator. Terminal.
//! - **Database**: connection and query failures. Degrade to fewer results.
//! - **Data**: a missing definition or an unparseable progress descriptor.
//!   The affected job is skipped or left unpatched.
//! - **Io**: the terminal could not be read or written. Terminal.

use std::fmt;

/// Primary error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum RoutineLoadError {
    // ── Input errors, terminal ──────────────────────────────────────────
    /// The operator selected a mode other than `1` or `2`.
    #[error("invalid mode: {0:?}")]
    InvalidMode(String),

    /// An operator-supplied value could not be coerced (e.g. the port).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // ── Database errors, degrade ────────────────────────────────────────
    /// Opening a connection to the cluster failed.
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// An introspection query failed to execute or decode.
    #[error("query error: {0}")]
    QueryError(String),

    // ── Data errors, skip the job ───────────────────────────────────────
    /// `SHOW CREATE ROUTINE LOAD` returned no usable definition text.
    #[error("definition not found: {0}")]
    DefinitionNotFound(String),

    /// The progress descriptor is not a JSON object of integer offsets.
    #[error("progress parse error: {0}")]
    ProgressParseError(String),

    // ── I/O errors, terminal ────────────────────────────────────────────
    /// Reading a prompt answer or writing the report failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Classification of an error for structured logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineLoadErrorKind {
    Input,
    Database,
    Data,
    Io,
}

impl fmt::Display for RoutineLoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutineLoadErrorKind::Input => write!(f, "INPUT"),
            RoutineLoadErrorKind::Database => write!(f, "DATABASE"),
            RoutineLoadErrorKind::Data => write!(f, "DATA"),
            RoutineLoadErrorKind::Io => write!(f, "IO"),
        }
    }
}

impl RoutineLoadError {
    /// Classify the error for logging.
    pub fn kind(&self) -> RoutineLoadErrorKind {
        match self {
            RoutineLoadError::InvalidMode(_) | RoutineLoadError::InvalidArgument(_) => {
                RoutineLoadErrorKind::Input
            }

            RoutineLoadError::ConnectionError(_) | RoutineLoadError::QueryError(_) => {
                RoutineLoadErrorKind::Database
            }

            RoutineLoadError::DefinitionNotFound(_) | RoutineLoadError::ProgressParseError(_) => {
                RoutineLoadErrorKind::Data
            }

            RoutineLoadError::IoError(_) => RoutineLoadErrorKind::Io,
        }
    }
}
