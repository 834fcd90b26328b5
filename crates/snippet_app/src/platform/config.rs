use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use snippet_core::MonitorConfiguration;
use snippet_engine::EngineSettings;
use thiserror::Error;

/// Contents of the monitor file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub monitors: Vec<MonitorConfiguration>,
    pub engine: EngineSettings,
}

impl AppConfig {
    /// Stable key of a monitor: its label, else its URL.
    pub fn key_of(monitor: &MonitorConfiguration) -> String {
        let label = monitor.label.trim();
        if label.is_empty() {
            monitor.url.trim().to_string()
        } else {
            label.to_string()
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigLoadError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

pub(crate) fn load_config(path: &Path) -> Result<AppConfig, ConfigLoadError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_config(text: &str) -> Result<AppConfig, ron::error::SpannedError> {
    ron::from_str(text)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn monitors_use_collaborator_field_names() {
        let text = r#"(
            monitors: [
                (url: "https://example.com", label: "Title", selector: "h1"),
                (
                    url: "https://shop.example.com",
                    selector: ".price",
                    useServer: true,
                    useJavaScript: true,
                    serverURL: "http://localhost:5000",
                    waitOptions: (enabled: true, loadState: "networkidle"),
                ),
            ],
            engine: (
                direct: (request_timeout: 10.0),
                worker: Some((command: "snippet-worker", timeout: 20.0)),
            ),
        )"#;
        let config = parse_config(text).unwrap();

        assert_eq!(config.monitors.len(), 2);
        assert_eq!(AppConfig::key_of(&config.monitors[0]), "Title");
        assert_eq!(AppConfig::key_of(&config.monitors[1]), "https://shop.example.com");
        assert!(config.monitors[1].use_javascript);
        assert_eq!(config.monitors[1].wait_options.load_state, "networkidle");
        assert_eq!(config.engine.direct.request_timeout, Duration::from_secs(10));
        assert_eq!(config.engine.direct.resource_timeout, Duration::from_secs(60));
        let worker = config.engine.worker.expect("worker");
        assert_eq!(worker.command, "snippet-worker");
        assert_eq!(worker.timeout, Duration::from_secs(20));
    }

    #[test]
    fn omitted_engine_settings_use_defaults() {
        let config = parse_config("(monitors: [])").unwrap();
        assert!(config.monitors.is_empty());
        assert_eq!(config.engine, EngineSettings::default());
    }
}
