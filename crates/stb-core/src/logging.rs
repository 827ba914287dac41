use std::{
    backtrace::{Backtrace, BacktraceStatus},
    fmt::Write as _,
    fs::{File, OpenOptions},
    path::Path,
    sync::Arc,
};

use chrono::Local;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, format::Writer, time::FormatTime, MakeWriter},
    prelude::*,
    registry::LookupSpan,
    EnvFilter, Layer,
};

use crate::{config::LogConfig, errors::Error, Result};

/// Process-wide log sink used by the router and the failure policy.
pub trait Logger: Send + Sync {
    /// Records the message plus a `stack` field.
    fn error(&self, err: &Error);
    fn info(&self, message: &str);
    fn debug(&self, message: &str);
}

/// `Logger` backed by the global `tracing` subscriber installed by [`init`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, err: &Error) {
        let stack = stack_trace(err);
        tracing::error!(stack = %stack, "{err}");
    }

    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }
}

/// Debug rendering of the error, its source chain, and a backtrace when
/// `RUST_BACKTRACE` asks for one.
fn stack_trace(err: &Error) -> String {
    let mut out = format!("{err:?}");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let _ = write!(out, "\ncaused by: {cause}");
        source = cause.source();
    }
    let bt = Backtrace::capture();
    if bt.status() == BacktraceStatus::Captured {
        let _ = write!(out, "\n{bt}");
    }
    out
}

struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

fn open_append(path: &Path) -> Result<Arc<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Arc::new(file))
}

/// Initialize logging for the bot.
///
/// Console gets colored human-readable lines; the combined log gets every
/// event as a JSON line and the error log only error-level events. Both files
/// are opened in append mode and each event lands in a single write.
pub fn init(cfg: &LogConfig) -> Result<()> {
    // Default: info for everything. Can be overridden with `RUST_LOG`.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.default_level.as_str()));

    let combined = open_append(&cfg.combined_log_path)?;
    let errors = open_append(&cfg.error_log_path)?;

    let console = fmt::layer()
        .with_target(false)
        .with_ansi(true)
        .with_timer(LocalTimestamp);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layers(combined, errors))
        .try_init()
        .map_err(|e| Error::Config(format!("failed to initialize logging: {e}")))
}

/// JSON-lines layers: every enabled event goes to `combined`, error events
/// also go to `errors`.
fn file_layers<S, C, E>(combined: C, errors: E) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    E: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let combined = fmt::layer::<S>()
        .json()
        .with_ansi(false)
        .with_timer(LocalTimestamp)
        .with_writer(combined);
    let errors = fmt::layer::<S>()
        .json()
        .with_ansi(false)
        .with_timer(LocalTimestamp)
        .with_writer(errors)
        .with_filter(LevelFilter::ERROR);
    combined.and_then(errors)
}


#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tracing::{
        field::{Field, Visit},
        Event, Level, Subscriber,
    };
    use serde_json::Value;
    use tracing_subscriber::layer::Context;

    use super::*;

    type Captured = Vec<(Level, Vec<&'static str>)>;

    #[derive(Clone, Default)]
    struct FieldCapture(Arc<Mutex<Captured>>);

    struct FieldNames(Vec<&'static str>);

    impl Visit for FieldNames {
        fn record_debug(&mut self, field: &Field, _value: &dyn std::fmt::Debug) {
            self.0.push(field.name());
        }
    }

    impl<S: Subscriber> Layer<S> for FieldCapture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut names = FieldNames(Vec::new());
            event.record(&mut names);
            self.0
                .lock()
                .unwrap()
                .push((*event.metadata().level(), names.0));
        }
    }

    fn capture(f: impl FnOnce()) -> Captured {
        let layer = FieldCapture::default();
        let subscriber = tracing_subscriber::registry().with(layer.clone());
        tracing::subscriber::with_default(subscriber, f);
        let out = layer.0.lock().unwrap().clone();
        out
    }

    #[test]
    fn error_records_message_and_stack() {
        let events = capture(|| TracingLogger.error(&Error::Transfer("connection reset".into())));
        assert_eq!(events.len(), 1);
        let (level, fields) = &events[0];
        assert_eq!(*level, Level::ERROR);
        assert!(fields.contains(&"message"));
        assert!(fields.contains(&"stack"));
    }

    #[test]
    fn info_and_debug_record_only_the_message() {
        let events = capture(|| {
            TracingLogger.info("bot started");
            TracingLogger.debug("handling /help");
        });
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], (Level::INFO, vec!["message"]));
        assert_eq!(events[1], (Level::DEBUG, vec!["message"]));
    }

    #[test]
    fn stack_includes_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only fs");
        let stack = stack_trace(&Error::Io(io));
        assert!(stack.starts_with("Io("));
        assert!(stack.contains("caused by: read-only fs"));
    }

    fn json_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn files_split_errors_from_everything_else() {
        let dir = tempfile::tempdir().unwrap();
        let combined_path = dir.path().join("combined.log");
        let error_path = dir.path().join("error.log");

        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::INFO)
            .with(file_layers(
                open_append(&combined_path).unwrap(),
                open_append(&error_path).unwrap(),
            ));
        tracing::subscriber::with_default(subscriber, || {
            TracingLogger.info("Bot started successfully!");
            TracingLogger.debug("below the threshold");
            TracingLogger.error(&Error::Transfer("connection reset".into()));
        });

        let combined = json_lines(&combined_path);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[0]["level"], "INFO");
        assert_eq!(combined[0]["fields"]["message"], "Bot started successfully!");
        assert!(combined[0]["fields"].get("stack").is_none());
        assert_eq!(combined[1]["level"], "ERROR");

        let errors = json_lines(&error_path);
        assert_eq!(errors.len(), 1);
        let entry = &errors[0];
        assert_eq!(entry["level"], "ERROR");
        assert_eq!(
            entry["fields"]["message"],
            "error downloading file: connection reset"
        );
        assert!(entry["fields"]["stack"]
            .as_str()
            .unwrap()
            .starts_with("Transfer("));
        assert!(entry["timestamp"].is_string());
        assert_eq!(entry["fields"]["message"], combined[1]["fields"]["message"]);
    }

    #[test]
    fn open_append_creates_parent_dirs_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/combined.log");
        {
            let f = open_append(&path).unwrap();
            std::io::Write::write_all(&mut &*f, b"one\n").unwrap();
        }
        {
            let f = open_append(&path).unwrap();
            std::io::Write::write_all(&mut &*f, b"two\n").unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }
}
