use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use engine_logging::{DiagnosticSink, InvocationId};
use snippet_core::{validate, ConfigError, FetchFailure, FetchResult, MonitorConfiguration};

use crate::delegated::DelegatedExtractionPath;
use crate::direct::DirectFetchPath;
use crate::types::{EngineSettings, Invocation};

/// Extracted value plus the time it was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub content: String,
    pub date: DateTime<Utc>,
}

/// One way of turning a validated configuration into content.
#[async_trait::async_trait]
pub trait FetchPath: Send + Sync {
    async fn run(
        &self,
        config: &MonitorConfiguration,
        invocation: Invocation<'_>,
    ) -> Result<Extraction, FetchFailure>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    DirectFetch,
    DelegatedExtraction,
}

impl FetchPlan {
    /// Validates `config` and picks the path that serves it.
    pub fn for_config(config: &MonitorConfiguration) -> Result<Self, ConfigError> {
        validate(config)?;
        Ok(if config.use_server {
            FetchPlan::DelegatedExtraction
        } else {
            FetchPlan::DirectFetch
        })
    }
}

/// Entry point: one configuration in, one [`FetchResult`] out.
pub struct Dispatcher {
    direct: Arc<dyn FetchPath>,
    delegated: Arc<dyn FetchPath>,
    sink: Arc<dyn DiagnosticSink>,
    last_invocation: AtomicU64,
}

impl Dispatcher {
    pub fn new(settings: EngineSettings, sink: Arc<dyn DiagnosticSink>) -> Self {
        let direct = Arc::new(DirectFetchPath::new(settings.direct));
        let delegated = Arc::new(DelegatedExtractionPath::from_settings(
            settings.delegated,
            settings.worker,
        ));
        Self::with_paths(direct, delegated, sink)
    }

    pub fn with_paths(
        direct: Arc<dyn FetchPath>,
        delegated: Arc<dyn FetchPath>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            direct,
            delegated,
            sink,
            last_invocation: AtomicU64::new(0),
        }
    }

    fn next_invocation(&self) -> InvocationId {
        self.last_invocation.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub async fn fetch(&self, config: &MonitorConfiguration) -> FetchResult {
        let invocation = Invocation::new(self.next_invocation(), self.sink.as_ref());
        invocation.info(format!(
            "fetch label={:?} url={} selector={:?} server={} js={}",
            config.label, config.url, config.selector, config.use_server, config.use_javascript
        ));

        let outcome = match FetchPlan::for_config(config) {
            Ok(plan) => {
                invocation.debug(format!("plan {plan:?}"));
                let path = match plan {
                    FetchPlan::DirectFetch => &self.direct,
                    FetchPlan::DelegatedExtraction => &self.delegated,
                };
                path.run(config, invocation).await
            }
            Err(err) => Err(FetchFailure::from(err)),
        };

        match outcome {
            Ok(extraction) => {
                invocation.info(format!("success, {} chars", extraction.content.len()));
                FetchResult::success(extraction.content, extraction.date)
            }
            Err(failure) => {
                invocation.warn(format!("{}: {}", failure.kind, failure.message));
                FetchResult::failure(&failure, Utc::now())
            }
        }
    }
}
