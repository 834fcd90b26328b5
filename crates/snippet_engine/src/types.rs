use std::collections::BTreeMap;
use std::time::Duration;

use engine_logging::{DiagnosticSink, InvocationId};
use log::Level;
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str = concat!("snippet-monitor/", env!("CARGO_PKG_VERSION"));

/// Timeouts and limits for the direct HTTP path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Longest idle gap while waiting for response data.
    #[serde(with = "secs")]
    pub request_timeout: Duration,
    /// Upper bound on the whole exchange.
    #[serde(with = "secs")]
    pub resource_timeout: Duration,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            resource_timeout: Duration::from_secs(60),
            max_bytes: 5 * 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Settings for calls to the extraction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegatedSettings {
    #[serde(with = "secs")]
    pub request_timeout: Duration,
    #[serde(with = "secs")]
    pub resource_timeout: Duration,
    /// `timeout` field sent to the service, in seconds.
    pub service_timeout_secs: u64,
    /// Clamp applied to `additionalWaitTime` before it is forwarded.
    pub max_wait_secs: f64,
    /// Largest service response body accepted.
    pub max_bytes: u64,
}

impl Default for DelegatedSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            resource_timeout: Duration::from_secs(90),
            service_timeout_secs: 45,
            max_wait_secs: 15.0,
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

/// A local helper program that performs delegated extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    #[serde(with = "secs")]
    pub timeout: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            env: BTreeMap::new(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub direct: FetchSettings,
    pub delegated: DelegatedSettings,
    /// When set, delegated extraction runs through this worker instead of HTTP.
    pub worker: Option<WorkerSettings>,
}

/// Per-invocation context threaded through every component.
#[derive(Clone, Copy)]
pub struct Invocation<'a> {
    pub id: InvocationId,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> Invocation<'a> {
    pub fn new(id: InvocationId, sink: &'a dyn DiagnosticSink) -> Self {
        Self { id, sink }
    }

    pub fn sink(&self) -> &'a dyn DiagnosticSink {
        self.sink
    }

    pub fn debug(&self, line: impl AsRef<str>) {
        self.sink.record(self.id, Level::Debug, line.as_ref());
    }

    pub fn info(&self, line: impl AsRef<str>) {
        self.sink.record(self.id, Level::Info, line.as_ref());
    }

    pub fn warn(&self, line: impl AsRef<str>) {
        self.sink.record(self.id, Level::Warn, line.as_ref());
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
