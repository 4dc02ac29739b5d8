use std::time::Duration;

use thiserror::Error;

/// Broad classification of a [`LabError`], used by callers to decide where
/// and how a failure is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Detected before any remote call (syntax, validation, configuration)
    Local,
    /// Transport or service-level failure from the remote API
    Remote,
    /// The job finished but produced nothing usable
    Semantic,
    Timeout,
    Cancelled,
    Storage,
}

/// prompt-lab errors
#[derive(Error, Debug)]
pub enum LabError {
    #[error("Invalid JSON syntax: {0}")]
    InvalidSyntax(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Request Error: {0}")]
    Request(String),

    #[error("HTTP Error: {status_code} - {message}")]
    Http { status_code: u16, message: String },

    #[error("Parsing Error: {0}")]
    Parsing(String),

    #[error("Response Error: {0}")]
    Response(String),

    /// The remote operation reported a failure of its own.
    #[error("Service Error: {0}")]
    Service(String),

    #[error("Video generation completed but no download link was found.")]
    EmptyResult,

    #[error("Failed to fetch video: {0}")]
    MediaFetch(String),

    #[error("Video generation timed out after {polls} polls ({elapsed:?})")]
    Timeout { polls: u32, elapsed: Duration },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Storage Error: {0}")]
    Storage(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LabError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LabError::InvalidSyntax(_) | LabError::Validation(_) | LabError::Config(_) => {
                ErrorKind::Local
            }
            LabError::Request(_)
            | LabError::Http { .. }
            | LabError::Parsing(_)
            | LabError::Response(_)
            | LabError::Service(_)
            | LabError::MediaFetch(_)
            | LabError::Reqwest(_)
            | LabError::Serde(_) => ErrorKind::Remote,
            LabError::EmptyResult => ErrorKind::Semantic,
            LabError::Timeout { .. } => ErrorKind::Timeout,
            LabError::Cancelled => ErrorKind::Cancelled,
            LabError::Storage(_) | LabError::Io(_) => ErrorKind::Storage,
        }
    }

    /// Uniform user-facing rendering. Remote failures carry the `Error:`
    /// prefix callers branch on.
    pub fn user_message(&self) -> String {
        format!("Error: {}", self)
    }
}

/// Result type for prompt-lab operations
pub type LabResult<T> = Result<T, LabError>;
