use serde::{Deserialize, Serialize};

use crate::text::truncate_with_ellipsis;
use crate::{FailureKind, FetchFailure};

/// Presentation category of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    Configuration,
    NotFound,
    Timeout,
    Connection,
    Auth,
    Server,
    JavaScript,
    Generic,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "Configuration Error",
            ErrorCategory::NotFound => "Content Not Found",
            ErrorCategory::Timeout => "Timed Out",
            ErrorCategory::Connection => "Connection Error",
            ErrorCategory::Auth => "Authentication Error",
            ErrorCategory::Server => "Server Error",
            ErrorCategory::JavaScript => "JavaScript Error",
            ErrorCategory::Generic => "Error",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "gear",
            ErrorCategory::NotFound => "magnifyingglass",
            ErrorCategory::Timeout => "clock",
            ErrorCategory::Connection => "wifi.slash",
            ErrorCategory::Auth => "lock",
            ErrorCategory::Server => "server.rack",
            ErrorCategory::JavaScript => "curlybraces",
            ErrorCategory::Generic => "exclamationmark.triangle",
        }
    }

    pub fn guidance(self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "Check the monitor settings and correct the highlighted value.",
            ErrorCategory::NotFound => {
                "The selector matched nothing. Verify it against the page, or enable JavaScript rendering for dynamic pages."
            }
            ErrorCategory::Timeout => "The page took too long to respond. Try again later or add wait options.",
            ErrorCategory::Connection => "Check your network connection and that the URL or server is reachable.",
            ErrorCategory::Auth => "The server rejected the API key. Check the key in the monitor settings.",
            ErrorCategory::Server => "The extraction server reported a failure. Check that it is running and healthy.",
            ErrorCategory::JavaScript => {
                "The page failed to render. Try a different load state or a longer wait time."
            }
            ErrorCategory::Generic => "An unexpected error occurred. See the log for details.",
        }
    }
}

/// Size of the area a message is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayContext {
    Compact,
    Expanded,
}

impl DisplayContext {
    fn max_chars(self) -> usize {
        match self {
            DisplayContext::Compact => 50,
            DisplayContext::Expanded => 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    /// Full message; presentation shortens it with [`ClassifiedError::short_message`].
    pub message: String,
    pub guidance: String,
}

impl ClassifiedError {
    pub fn short_message(&self, context: DisplayContext) -> String {
        truncate_with_ellipsis(&self.message, context.max_chars())
    }
}

// Legacy message fragments, checked in priority order.
const MESSAGE_RULES: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::Configuration,
        &["Please enter", "must start with", "Invalid", "requires server mode"],
    ),
    (ErrorCategory::NotFound, &["No content found", "selector"]),
    (ErrorCategory::Timeout, &["Timed out"]),
    (
        ErrorCategory::Connection,
        &["Could not connect", "connection", "Connection"],
    ),
    (ErrorCategory::Auth, &["Authentication", "API key"]),
    (ErrorCategory::Server, &["Server error"]),
    (ErrorCategory::JavaScript, &["JavaScript"]),
];

/// Categorises free text by substring, for messages that arrive without a kind.
pub fn classify_message(message: &str) -> ErrorCategory {
    for (category, needles) in MESSAGE_RULES {
        if needles.iter().any(|needle| message.contains(needle)) {
            return *category;
        }
        // 5xx statuses rank with the server rule.
        if *category == ErrorCategory::Server && mentions_server_status(message) {
            return ErrorCategory::Server;
        }
    }
    ErrorCategory::Generic
}

/// Categorises a pipeline failure, trusting its kind before its text.
pub fn classify(failure: &FetchFailure) -> ClassifiedError {
    let category = match failure.kind {
        FailureKind::Configuration => ErrorCategory::Configuration,
        FailureKind::NotFound => ErrorCategory::NotFound,
        FailureKind::Timeout => ErrorCategory::Timeout,
        FailureKind::Auth => ErrorCategory::Auth,
        FailureKind::JavaScript => ErrorCategory::JavaScript,
        FailureKind::Parsing => ErrorCategory::Generic,
        FailureKind::Network => match classify_message(&failure.message) {
            ErrorCategory::Generic | ErrorCategory::Configuration => ErrorCategory::Connection,
            other => other,
        },
        FailureKind::Server => match classify_message(&failure.message) {
            ErrorCategory::Generic | ErrorCategory::Configuration => ErrorCategory::Server,
            other => other,
        },
    };

    ClassifiedError {
        category,
        message: failure.message.clone(),
        guidance: category.guidance().to_string(),
    }
}

fn mentions_server_status(message: &str) -> bool {
    message.match_indices("HTTP").any(|(idx, _)| {
        let digits: String = message[idx + "HTTP".len()..]
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.len() == 3 && digits.starts_with('5')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_5xx_after_http_marker() {
        assert!(mentions_server_status("HTTP error: 503"));
        assert!(mentions_server_status("upstream HTTP 500"));
        assert!(!mentions_server_status("HTTP error: 404"));
        assert!(!mentions_server_status("error 500"));
    }
}
