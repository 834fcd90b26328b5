//! Snippet engine: fetch orchestration, extraction and worker supervision.
mod decode;
mod delegated;
mod direct;
mod dispatch;
mod engine;
mod extract;
mod fetch;
mod gate;
mod preview;
mod process;
mod response;
mod types;
mod wire;

pub use decode::{decode_body, DecodeError};
pub use delegated::{
    aggregate_results, build_request, DelegatedExtractionPath, ExtractionTransport, HttpTransport,
    WorkerTransport, API_KEY_ENV, SERVER_URL_ENV,
};
pub use direct::{extract_first, DirectFetchPath};
pub use dispatch::{Dispatcher, Extraction, FetchPath, FetchPlan};
pub use engine::EngineHandle;
pub use extract::{visible_text, ContentExtractor, OutputMode, SelectorSpec, TypeAwareExtractor};
pub use fetch::{FetchOutput, Fetcher, ReqwestFetcher};
pub use gate::CompletionGate;
pub use preview::{document_preview, MAX_PREVIEW_CHARS};
pub use process::{merged_path, ProcessError, ProcessInvocation, ProcessOrchestrator, ProcessOutput};
pub use response::{parse_date, parse_output, CanonicalOutput, ParsedOutput};
pub use types::{
    DelegatedSettings, EngineSettings, FetchSettings, Invocation, WorkerSettings,
    DEFAULT_USER_AGENT,
};
pub use wire::{ExtractedItem, ExtractionRequest, ExtractionResponse, WaitFor};
