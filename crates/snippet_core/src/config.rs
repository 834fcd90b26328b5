use serde::{Deserialize, Serialize};

/// One monitor as supplied by the configuration collaborator.
///
/// Field names follow the collaborator's wire format (`useJavaScript`,
/// `serverURL`, ...). The engine only reads it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorConfiguration {
    pub url: String,
    pub label: String,
    pub selector: String,
    #[serde(rename = "useJavaScript")]
    pub use_javascript: bool,
    pub use_server: bool,
    #[serde(rename = "serverURL")]
    pub server_url: String,
    pub api_key: String,
    pub fetch_all_matches: bool,
    pub wait_options: WaitOptions,
}

impl MonitorConfiguration {
    /// Direct-fetch configuration for `url` and `selector`.
    pub fn direct(url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            selector: selector.into(),
            ..Self::default()
        }
    }

    /// Configuration delegating extraction to the service at `server_url`.
    pub fn delegated(
        url: impl Into<String>,
        selector: impl Into<String>,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            selector: selector.into(),
            use_server: true,
            server_url: server_url.into(),
            ..Self::default()
        }
    }
}

/// How long the delegated service waits for dynamic content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WaitOptions {
    pub enabled: bool,
    /// Empty, or one of the [`LoadState`] names.
    pub load_state: String,
    pub wait_for_selector: String,
    /// Extra delay in seconds after the page is ready.
    pub additional_wait_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    DomContentLoaded,
    Load,
    NetworkIdle,
}

impl LoadState {
    pub const ALL: [LoadState; 3] = [
        LoadState::DomContentLoaded,
        LoadState::Load,
        LoadState::NetworkIdle,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::Load => "load",
            LoadState::NetworkIdle => "networkidle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_state_parses_only_known_names() {
        assert_eq!(LoadState::parse("networkidle"), Some(LoadState::NetworkIdle));
        assert_eq!(LoadState::parse("domcontentloaded"), Some(LoadState::DomContentLoaded));
        assert_eq!(LoadState::parse("Load"), None);
        assert_eq!(LoadState::parse(""), None);
    }
}
