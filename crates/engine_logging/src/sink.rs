use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use log::Level;

/// Identifier of one fetch invocation; every diagnostic line is keyed by it.
pub type InvocationId = u64;

/// Destination for free-text diagnostic lines produced during an invocation.
///
/// Implementations must never fail or block the caller: a sink that cannot
/// record a line drops it.
pub trait DiagnosticSink: Send + Sync {
    /// Records one diagnostic line for `invocation`.
    fn record(&self, invocation: InvocationId, level: Level, line: &str);
}

/// Forwards diagnostic lines to the global `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&self, invocation: InvocationId, level: Level, line: &str) {
        log::log!(level, "[invocation {invocation}] {line}");
    }
}

/// Discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _invocation: InvocationId, _level: Level, _line: &str) {}
}

/// Appends diagnostic lines to a file chosen by the caller.
///
/// The file is opened in append mode for every line, so several sinks may
/// share one path. Write failures are swallowed.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Creates a sink appending to `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path the sink appends to.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl DiagnosticSink for FileSink {
    fn record(&self, invocation: InvocationId, level: Level, line: &str) {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path);
        if let Ok(mut file) = file {
            let _ = writeln!(file, "{level} [invocation {invocation}] {line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sink_appends_lines_keyed_by_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("diag.log"));

        sink.record(3, Level::Info, "first");
        sink.record(4, Level::Warn, "second");

        let text = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["INFO [invocation 3] first", "WARN [invocation 4] second"]);
    }

    #[test]
    fn file_sink_swallows_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let sink = FileSink::new(dir.path());
        sink.record(1, Level::Error, "dropped");
    }
}
