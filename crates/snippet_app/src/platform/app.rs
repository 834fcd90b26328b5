use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use engine_logging::{engine_debug, engine_info, DiagnosticSink, FileSink, LogSink};
use snippet_engine::EngineHandle;

use super::config::{load_config, AppConfig};
use super::logging::{self, LogDestination};
use super::persistence::ResultStore;
use super::report;
use crate::Args;

pub fn run_app(args: Args) -> anyhow::Result<()> {
    let destination = match &args.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    logging::initialize(destination, args.verbose);

    let config = load_config(&args.config)?;
    if config.monitors.is_empty() {
        bail!("{} defines no monitors", args.config.display());
    }

    let sink: Arc<dyn DiagnosticSink> = match &args.diagnostics {
        Some(path) => Arc::new(FileSink::new(path)),
        None => Arc::new(LogSink),
    };
    let engine = EngineHandle::new(config.engine.clone(), sink)
        .context("could not start the fetch runtime")?;
    let mut store = ResultStore::load(&args.state_dir);

    loop {
        let failures = run_round(&engine, &config, &mut store);
        store.save();

        match args.watch {
            Some(secs) => {
                engine_debug!("Next round in {secs}s");
                thread::sleep(Duration::from_secs(secs.max(1)));
            }
            None if failures > 0 => bail!("{failures} of {} monitors failed", config.monitors.len()),
            None => return Ok(()),
        }
    }
}

/// Fetches every monitor once, returning how many failed.
fn run_round(engine: &EngineHandle, config: &AppConfig, store: &mut ResultStore) -> usize {
    let mut failures = 0;
    for monitor in &config.monitors {
        let key = AppConfig::key_of(monitor);
        let result = engine.fetch(monitor);
        if !result.is_success() {
            failures += 1;
        }
        let changed = result.is_success()
            && store
                .previous(&key)
                .is_some_and(|previous| previous.content != result.content);
        if changed {
            engine_info!("Content of {key} changed");
        }
        print!("{}", report::render(&key, &result, changed));
        store.record(&key, result);
    }
    failures
}
