use thiserror::Error;
use url::Url;

use crate::{FailureKind, FetchFailure, LoadState, MonitorConfiguration};

/// Upper bound for `additionalWaitTime` accepted at validation time.
pub const MAX_ADDITIONAL_WAIT_SECS: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Please enter a URL")]
    MissingUrl,
    #[error("URL must start with http:// or https://")]
    UrlScheme,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Please enter a CSS selector")]
    MissingSelector,
    #[error("Please enter a server URL")]
    MissingServerUrl,
    #[error("Server URL must start with http:// or https://")]
    ServerUrlScheme,
    #[error("Invalid server URL: {0}")]
    InvalidServerUrl(String),
    #[error("Invalid wait options: JavaScript rendering must be enabled to wait for content")]
    WaitWithoutJavaScript,
    #[error("Invalid load state: {0} (expected domcontentloaded, load or networkidle)")]
    InvalidLoadState(String),
    #[error("Invalid wait selector: must not be blank")]
    BlankWaitSelector,
    #[error("Invalid wait selector: {0} is a number, not a CSS selector")]
    NumericWaitSelector(String),
    #[error("Invalid additional wait time: must be between 0 and 10 seconds")]
    WaitTimeOutOfRange,
    #[error("Invalid wait options: set a load state, a wait selector or an additional wait time")]
    EmptyWaitOptions,
    #[error("JavaScript rendering requires server mode")]
    JavaScriptRequiresServer,
    #[error("Fetching all matches requires server mode")]
    AllMatchesRequiresServer,
    #[error("Wait options require server mode")]
    WaitRequiresServer,
}

impl From<ConfigError> for FetchFailure {
    fn from(err: ConfigError) -> Self {
        FetchFailure::new(FailureKind::Configuration, err.to_string())
    }
}

/// Checks a configuration before any I/O. The first failing rule wins.
///
/// Server-only features are rejected before the URL and selector are looked
/// at, so a direct configuration asking for them always reports the mode
/// conflict.
pub fn validate(config: &MonitorConfiguration) -> Result<(), ConfigError> {
    if !config.use_server {
        if config.use_javascript {
            return Err(ConfigError::JavaScriptRequiresServer);
        }
        if config.fetch_all_matches {
            return Err(ConfigError::AllMatchesRequiresServer);
        }
        if config.wait_options.enabled {
            return Err(ConfigError::WaitRequiresServer);
        }
    }

    check_http_url(
        &config.url,
        ConfigError::MissingUrl,
        ConfigError::UrlScheme,
        ConfigError::InvalidUrl,
    )?;

    if config.selector.trim().is_empty() {
        return Err(ConfigError::MissingSelector);
    }

    if config.use_server {
        check_http_url(
            &config.server_url,
            ConfigError::MissingServerUrl,
            ConfigError::ServerUrlScheme,
            ConfigError::InvalidServerUrl,
        )?;
        if config.wait_options.enabled {
            validate_wait_options(config)?;
        }
    }

    Ok(())
}

fn check_http_url(
    raw: &str,
    missing: ConfigError,
    scheme: ConfigError,
    invalid: fn(String) -> ConfigError,
) -> Result<(), ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(missing);
    }
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return Err(scheme);
    }
    Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
    Ok(())
}

fn validate_wait_options(config: &MonitorConfiguration) -> Result<(), ConfigError> {
    let wait = &config.wait_options;
    if !config.use_javascript {
        return Err(ConfigError::WaitWithoutJavaScript);
    }

    if !wait.load_state.is_empty() && LoadState::parse(&wait.load_state).is_none() {
        return Err(ConfigError::InvalidLoadState(wait.load_state.clone()));
    }

    if !wait.wait_for_selector.is_empty() {
        let selector = wait.wait_for_selector.trim();
        if selector.is_empty() {
            return Err(ConfigError::BlankWaitSelector);
        }
        if is_plain_number(selector) {
            return Err(ConfigError::NumericWaitSelector(selector.to_string()));
        }
    }

    let wait_time = wait.additional_wait_time;
    if !(0.0..=MAX_ADDITIONAL_WAIT_SECS).contains(&wait_time) {
        return Err(ConfigError::WaitTimeOutOfRange);
    }

    if wait.load_state.is_empty() && wait.wait_for_selector.is_empty() && wait_time <= 0.0 {
        return Err(ConfigError::EmptyWaitOptions);
    }

    Ok(())
}

/// Optional sign, digits, at most one decimal point. `nan` and `inf` are selectors.
fn is_plain_number(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    let mut seen_digit = false;
    let mut seen_point = false;
    for ch in digits.chars() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return false,
        }
    }
    seen_digit
}
