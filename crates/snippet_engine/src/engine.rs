use std::io;
use std::sync::Arc;

use engine_logging::DiagnosticSink;
use snippet_core::{FetchResult, MonitorConfiguration};

use crate::dispatch::Dispatcher;
use crate::types::EngineSettings;

/// Blocking facade over the async [`Dispatcher`] for synchronous callers.
///
/// Owns its own runtime, so `fetch` must not be called from inside another
/// Tokio runtime.
pub struct EngineHandle {
    runtime: tokio::runtime::Runtime,
    dispatcher: Dispatcher,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings, sink: Arc<dyn DiagnosticSink>) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("snippet-engine")
            .build()?;
        Ok(Self {
            runtime,
            dispatcher: Dispatcher::new(settings, sink),
        })
    }

    /// Runs one invocation to completion.
    pub fn fetch(&self, config: &MonitorConfiguration) -> FetchResult {
        self.runtime.block_on(self.dispatcher.fetch(config))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
