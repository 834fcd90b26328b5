use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use snippet_core::{FailureKind, FetchFailure, LoadState, MonitorConfiguration};

use crate::dispatch::{Extraction, FetchPath};
use crate::extract::SelectorSpec;
use crate::fetch::{map_reqwest_error, read_capped};
use crate::process::{ProcessError, ProcessInvocation, ProcessOrchestrator};
use crate::response::parse_output;
use crate::types::{DelegatedSettings, Invocation, WorkerSettings};
use crate::wire::{error_field, ExtractedItem, ExtractionRequest, ExtractionResponse, WaitFor};

pub const SERVER_URL_ENV: &str = "SNIPPET_SERVER_URL";
pub const API_KEY_ENV: &str = "SNIPPET_API_KEY";

/// Carries an [`ExtractionRequest`] to whatever performs the extraction.
#[async_trait::async_trait]
pub trait ExtractionTransport: Send + Sync {
    async fn extract(
        &self,
        config: &MonitorConfiguration,
        request: &ExtractionRequest,
        invocation: Invocation<'_>,
    ) -> Result<Extraction, FetchFailure>;
}

/// Let the extraction service fetch, optionally render, and select.
pub struct DelegatedExtractionPath {
    settings: DelegatedSettings,
    transport: Arc<dyn ExtractionTransport>,
}

impl DelegatedExtractionPath {
    pub fn from_settings(settings: DelegatedSettings, worker: Option<WorkerSettings>) -> Self {
        let transport: Arc<dyn ExtractionTransport> = match worker {
            Some(worker) => Arc::new(WorkerTransport::new(worker)),
            None => Arc::new(HttpTransport::new(settings.clone())),
        };
        Self::with_transport(settings, transport)
    }

    pub fn with_transport(settings: DelegatedSettings, transport: Arc<dyn ExtractionTransport>) -> Self {
        Self {
            settings,
            transport,
        }
    }
}

#[async_trait::async_trait]
impl FetchPath for DelegatedExtractionPath {
    async fn run(
        &self,
        config: &MonitorConfiguration,
        invocation: Invocation<'_>,
    ) -> Result<Extraction, FetchFailure> {
        let request = build_request(config, &self.settings);
        invocation.debug(format!(
            "extraction request first_only={} render_js={} wait_for={:?}",
            request.first_only, request.render_js, request.wait_for
        ));
        self.transport.extract(config, &request, invocation).await
    }
}

pub fn build_request(config: &MonitorConfiguration, settings: &DelegatedSettings) -> ExtractionRequest {
    let wait = &config.wait_options;
    let wait_for = (wait.enabled && config.use_javascript).then(|| {
        let max_wait = settings.max_wait_secs.max(0.0);
        let wait_time = wait.additional_wait_time.max(0.0).min(max_wait);
        let wait_selector = wait.wait_for_selector.trim();
        WaitFor {
            load_state: LoadState::parse(&wait.load_state).map(|state| state.as_str().to_string()),
            wait_for_selector: (!wait_selector.is_empty()).then(|| wait_selector.to_string()),
            wait_time: (wait_time > 0.0).then_some(wait_time),
        }
    });

    ExtractionRequest {
        url: config.url.trim().to_string(),
        selector: SelectorSpec::parse(&config.selector).css,
        timeout: settings.service_timeout_secs,
        first_only: !config.fetch_all_matches,
        render_js: config.use_javascript,
        wait_for,
    }
}

/// Joins the best value of every result with newlines.
pub fn aggregate_results(results: &[ExtractedItem], selector: &str) -> Result<String, FetchFailure> {
    if results.is_empty() {
        return Err(FetchFailure::not_found(selector.trim()));
    }
    let values: Vec<&str> = results.iter().filter_map(ExtractedItem::best_value).collect();
    if values.is_empty() {
        return Err(FetchFailure::parsing("Results contained no text content"));
    }
    Ok(values.join("\n"))
}

/// `POST {serverURL}/extract`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    settings: DelegatedSettings,
}

impl HttpTransport {
    pub fn new(settings: DelegatedSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, FetchFailure> {
        reqwest::Client::builder()
            .read_timeout(self.settings.request_timeout)
            .timeout(self.settings.resource_timeout)
            .build()
            .map_err(|err| FetchFailure::new(FailureKind::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl ExtractionTransport for HttpTransport {
    async fn extract(
        &self,
        config: &MonitorConfiguration,
        request: &ExtractionRequest,
        invocation: Invocation<'_>,
    ) -> Result<Extraction, FetchFailure> {
        let endpoint = format!("{}/extract", config.server_url.trim().trim_end_matches('/'));
        let body = serde_json::to_vec(request)
            .map_err(|err| FetchFailure::parsing(format!("Could not encode request: {err}")))?;

        let mut builder = self
            .build_client()?
            .post(&endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let api_key = config.api_key.trim();
        if !api_key.is_empty() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {api_key}"));
        }

        invocation.debug(format!("POST {endpoint}"));
        let response = builder
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, &endpoint))?;
        let status = response.status();
        let body = read_capped(response, self.settings.max_bytes, &endpoint).await?;

        if !status.is_success() {
            invocation.warn(format!(
                "{endpoint} answered {status}: {}",
                String::from_utf8_lossy(&body)
            ));
            let message =
                error_field(&body).unwrap_or_else(|| format!("HTTP error: {}", status.as_u16()));
            let kind = match status.as_u16() {
                401 | 403 => FailureKind::Auth,
                _ => FailureKind::Server,
            };
            return Err(FetchFailure::new(kind, message));
        }

        let envelope: ExtractionResponse = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(err) => {
                invocation.warn(format!(
                    "malformed extraction response ({err}): {}",
                    String::from_utf8_lossy(&body)
                ));
                return Err(match error_field(&body) {
                    Some(message) => FetchFailure::new(FailureKind::Server, message),
                    None => FetchFailure::parsing("Invalid response format from server"),
                });
            }
        };

        let content = aggregate_results(&envelope.results, &config.selector)?;
        Ok(Extraction {
            content,
            date: Utc::now(),
        })
    }
}

/// Runs a local helper that prints the canonical `{content, error, date}` object.
///
/// The helper gets the serialized request as its last argument and the
/// service address and key through [`SERVER_URL_ENV`] and [`API_KEY_ENV`].
#[derive(Debug, Clone)]
pub struct WorkerTransport {
    settings: WorkerSettings,
    orchestrator: ProcessOrchestrator,
}

impl WorkerTransport {
    pub fn new(settings: WorkerSettings) -> Self {
        Self {
            settings,
            orchestrator: ProcessOrchestrator,
        }
    }

    fn invocation_for(
        &self,
        config: &MonitorConfiguration,
        request_json: String,
    ) -> ProcessInvocation {
        let args = self
            .settings
            .args
            .iter()
            .cloned()
            .chain(std::iter::once(request_json));
        let mut job = ProcessInvocation::new(self.settings.command.clone(), args)
            .with_timeout(self.settings.timeout);
        job.env = self.settings.env.clone();
        job.env
            .insert(SERVER_URL_ENV.to_string(), config.server_url.trim().to_string());
        let api_key = config.api_key.trim();
        if !api_key.is_empty() {
            job.env.insert(API_KEY_ENV.to_string(), api_key.to_string());
        }
        job
    }
}

#[async_trait::async_trait]
impl ExtractionTransport for WorkerTransport {
    async fn extract(
        &self,
        config: &MonitorConfiguration,
        request: &ExtractionRequest,
        invocation: Invocation<'_>,
    ) -> Result<Extraction, FetchFailure> {
        let request_json = serde_json::to_string(request)
            .map_err(|err| FetchFailure::parsing(format!("Could not encode request: {err}")))?;
        let spec = self.invocation_for(config, request_json);

        let output = self
            .orchestrator
            .run(&spec, invocation)
            .await
            .map_err(process_failure)?;
        let parsed = parse_output(&String::from_utf8_lossy(&output.stdout), invocation)?;

        if let Some(message) = parsed.error_message() {
            return Err(FetchFailure::new(FailureKind::Server, message));
        }
        let content = parsed.content.trim();
        if content.is_empty() {
            return Err(FetchFailure::not_found(config.selector.trim()));
        }
        Ok(Extraction {
            content: content.to_string(),
            date: parsed.date,
        })
    }
}

fn process_failure(err: ProcessError) -> FetchFailure {
    match &err {
        ProcessError::Timeout { .. } => FetchFailure::new(FailureKind::Timeout, err.to_string()),
        ProcessError::Failed { stderr, .. } if !stderr.trim().is_empty() => {
            FetchFailure::new(FailureKind::Server, stderr.trim())
        }
        ProcessError::Io { .. } => FetchFailure::new(FailureKind::Network, err.to_string()),
        ProcessError::Spawn { .. } | ProcessError::Failed { .. } => {
            FetchFailure::new(FailureKind::Server, err.to_string())
        }
    }
}
