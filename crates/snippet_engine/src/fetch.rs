use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use snippet_core::{FailureKind, FetchFailure};

use crate::types::{FetchSettings, Invocation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub final_url: String,
    pub content_type: Option<String>,
}

/// Static HTTP GET of a page, no JavaScript.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, invocation: Invocation<'_>) -> Result<FetchOutput, FetchFailure>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, FetchFailure> {
        reqwest::Client::builder()
            .read_timeout(self.settings.request_timeout)
            .timeout(self.settings.resource_timeout)
            .user_agent(self.settings.user_agent.clone())
            .build()
            .map_err(|err| FetchFailure::new(FailureKind::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, invocation: Invocation<'_>) -> Result<FetchOutput, FetchFailure> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchFailure::configuration(format!("Invalid URL: {err}")))?;
        let client = self.build_client()?;

        invocation.debug(format!("GET {parsed}"));
        let response = client
            .get(parsed)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, url))?;

        let status = response.status();
        if !status.is_success() {
            invocation.warn(format!("GET {url} answered {status}"));
            return Err(FetchFailure::http_status(FailureKind::Network, status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let bytes = read_capped(response, self.settings.max_bytes, url).await?;
        invocation.debug(format!("received {} bytes from {final_url}", bytes.len()));

        Ok(FetchOutput {
            bytes,
            final_url,
            content_type,
        })
    }
}

/// Streams a response body, failing once it grows past `max_bytes`.
pub(crate) async fn read_capped(
    response: reqwest::Response,
    max_bytes: u64,
    target: &str,
) -> Result<Vec<u8>, FetchFailure> {
    if let Some(content_len) = response.content_length() {
        if content_len > max_bytes {
            return Err(too_large(max_bytes));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| map_reqwest_error(err, target))?;
        if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
            return Err(too_large(max_bytes));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn too_large(max_bytes: u64) -> FetchFailure {
    FetchFailure::new(
        FailureKind::Network,
        format!("Response too large (limit {max_bytes} bytes)"),
    )
}

pub(crate) fn map_reqwest_error(err: reqwest::Error, target: &str) -> FetchFailure {
    if err.is_timeout() {
        return FetchFailure::new(FailureKind::Timeout, format!("Timed out waiting for {target}"));
    }
    if err.is_connect() {
        return FetchFailure::new(
            FailureKind::Network,
            format!("Could not connect to {target}: {err}"),
        );
    }
    FetchFailure::new(FailureKind::Network, err.to_string())
}
