use std::fmt;

use serde::{Deserialize, Serialize};

/// Where in the pipeline a fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    Configuration,
    Network,
    Timeout,
    Parsing,
    NotFound,
    Server,
    Auth,
    JavaScript,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Configuration => write!(f, "configuration error"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Parsing => write!(f, "parsing error"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::Server => write!(f, "server error"),
            FailureKind::Auth => write!(f, "authentication error"),
            FailureKind::JavaScript => write!(f, "javascript error"),
        }
    }
}

/// A failure carried as a value through the pipeline.
///
/// `message` keeps the user-facing text; `kind` drives classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Configuration, message)
    }

    pub fn parsing(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Parsing, message)
    }

    pub fn not_found(selector: &str) -> Self {
        Self::new(
            FailureKind::NotFound,
            format!("No content found matching selector: {selector}"),
        )
    }

    pub fn http_status(kind: FailureKind, code: u16) -> Self {
        Self::new(kind, format!("HTTP error: {code}"))
    }
}
