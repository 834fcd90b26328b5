use std::sync::Arc;

use chrono::Utc;
use scraper::Html;
use snippet_core::{FailureKind, FetchFailure, MonitorConfiguration};

use crate::decode::decode_body;
use crate::dispatch::{Extraction, FetchPath};
use crate::extract::{ContentExtractor, SelectorSpec, TypeAwareExtractor};
use crate::fetch::{Fetcher, ReqwestFetcher};
use crate::preview::document_preview;
use crate::types::{FetchSettings, Invocation};

/// Fetch the page ourselves and run the selector over the static document.
pub struct DirectFetchPath {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn ContentExtractor>,
}

impl DirectFetchPath {
    pub fn new(settings: FetchSettings) -> Self {
        Self::with_parts(
            Arc::new(ReqwestFetcher::new(settings)),
            Arc::new(TypeAwareExtractor),
        )
    }

    pub fn with_parts(fetcher: Arc<dyn Fetcher>, extractor: Arc<dyn ContentExtractor>) -> Self {
        Self { fetcher, extractor }
    }
}

#[async_trait::async_trait]
impl FetchPath for DirectFetchPath {
    async fn run(
        &self,
        config: &MonitorConfiguration,
        invocation: Invocation<'_>,
    ) -> Result<Extraction, FetchFailure> {
        let spec = SelectorSpec::parse(&config.selector);
        let selector = spec.compile()?;
        let output = self.fetcher.fetch(config.url.trim(), invocation).await?;
        let html = decode_body(&output.bytes, output.content_type.as_deref()).map_err(|err| {
            FetchFailure::new(FailureKind::Parsing, format!("Could not decode page: {err}"))
        })?;

        let content = extract_first(
            &html,
            &config.selector,
            &spec,
            &selector,
            self.extractor.as_ref(),
        )?;
        invocation.debug(format!("direct extraction matched {} chars", content.len()));
        Ok(Extraction {
            content,
            date: Utc::now(),
        })
    }
}

/// Runs `selector` over `html` and extracts the first match.
pub fn extract_first(
    html: &str,
    raw_selector: &str,
    spec: &SelectorSpec,
    selector: &scraper::Selector,
    extractor: &dyn ContentExtractor,
) -> Result<String, FetchFailure> {
    let doc = Html::parse_document(html);
    match doc.select(selector).next() {
        Some(element) => Ok(extractor.extract(element, spec).trim().to_string()),
        None => {
            let mut failure = FetchFailure::not_found(raw_selector.trim());
            if let Some(preview) = document_preview(&doc) {
                failure.message = format!("{} (page text: \"{preview}\")", failure.message);
            }
            Err(failure)
        }
    }
}
