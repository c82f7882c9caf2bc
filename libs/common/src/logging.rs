//! Logging for the publication generator
//!
//! Two halves: process-wide `tracing` initialisation for the CLI, and the
//! [`LogSink`] collaborator the configuration handler reports through. A sink
//! call always carries the process id and username of the request.

use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Level label and its ANSI color
fn level_style(level: Level) -> (&'static str, &'static str) {
    match level {
        Level::TRACE => ("TRACE", "\x1b[35m"),
        Level::DEBUG => ("DEBUG", "\x1b[34m"),
        Level::INFO => ("INFO", "\x1b[32m"),
        Level::WARN => ("WARN", "\x1b[33m"),
        Level::ERROR => ("ERROR", "\x1b[31m"),
    }
}

/// Last path segment of an event target: `gld_pubs::resolver` -> `resolver`
fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

/// Console line: `timestamp [LEVEL] module: message fields`
///
/// Example output: `2025-12-02T00:50:44.809Z [INFO] resolver: Using dictionary file dict.json`
struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let (label, color) = level_style(*metadata.level());
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");

        if writer.has_ansi_escapes() {
            write!(writer, "{} {}[{}]\x1b[0m ", timestamp, color, label)?;
        } else {
            write!(writer, "{} [{}] ", timestamp, label)?;
        }
        write!(writer, "{}: ", short_target(metadata.target()))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Initialize console logging on stderr
///
/// `RUST_LOG` takes precedence over `level`. Stdout stays free for the
/// generated document.
pub fn init(level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(spec) if !spec.trim().is_empty() => EnvFilter::try_new(spec)?,
        _ => EnvFilter::try_new(level)?,
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .event_format(ConsoleFormat);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init()?;

    Ok(())
}

// ============================================================================
// Request log sink
// ============================================================================

/// Destination for request-scoped status and error messages
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, message: &str, process_id: &str, username: &str);

    /// Report progress of a running request
    fn running(&self, message: &str, process_id: &str, username: &str) {
        self.log(Level::INFO, message, process_id, username);
    }
}

/// Forwards sink calls to `tracing` with `process_id` and `username` fields
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, level: Level, message: &str, process_id: &str, username: &str) {
        match level {
            Level::ERROR => tracing::error!(process_id, username, "{}", message),
            Level::WARN => tracing::warn!(process_id, username, "{}", message),
            Level::INFO => tracing::info!(process_id, username, "{}", message),
            Level::DEBUG => tracing::debug!(process_id, username, "{}", message),
            Level::TRACE => tracing::trace!(process_id, username, "{}", message),
        }
    }
}

/// One captured sink call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    pub process_id: String,
    pub username: String,
}

/// Sink that keeps every entry in memory, for embedding hosts and tests
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured entries in emission order
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Captured entries at exactly `level`
    pub fn at_level(&self, level: Level) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .collect()
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, level: Level, message: &str, process_id: &str, username: &str) {
        let entry = LogEntry {
            level,
            message: message.to_string(),
            process_id: process_id.to_string(),
            username: username.to_string(),
        };
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}
