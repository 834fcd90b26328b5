//! Snippet core: pure configuration, validation and failure taxonomy. No I/O.
mod classify;
mod config;
mod failure;
mod result;
mod text;
mod validate;

pub use classify::{classify, classify_message, ClassifiedError, DisplayContext, ErrorCategory};
pub use config::{LoadState, MonitorConfiguration, WaitOptions};
pub use failure::{FailureKind, FetchFailure};
pub use result::FetchResult;
pub use text::{collapse_whitespace, prefix_chars, truncate_with_ellipsis};
pub use validate::{validate, ConfigError, MAX_ADDITIONAL_WAIT_SECS};
