use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{classify, ClassifiedError, FetchFailure};

/// Outcome of one fetch invocation, handed to the presentation layer.
///
/// A present `error` always comes with empty `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub content: String,
    pub error: Option<ClassifiedError>,
    pub last_updated: DateTime<Utc>,
}

impl FetchResult {
    pub fn success(content: impl Into<String>, last_updated: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            error: None,
            last_updated,
        }
    }

    pub fn failure(failure: &FetchFailure, last_updated: DateTime<Utc>) -> Self {
        Self {
            content: String::new(),
            error: Some(classify(failure)),
            last_updated,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Content split into one entry per match, as returned by all-matches extraction.
    pub fn matches(&self) -> impl Iterator<Item = &str> {
        self.content.lines().filter(|line| !line.trim().is_empty())
    }
}
