//! Named loggers and the registry that hands them out
//!
//! A logger fans each record out to its attached sinks in attachment order.
//! Fresh loggers carry only a [`NullSink`], so library code that logs without
//! any configuration produces no output.

use std::collections::HashMap;
use std::error::Error as _;
use std::io::{self, Write};
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::record::{Record, RecordFlags};
use super::severity::Severity;
use super::sink::{EmitError, NullSink, Sink};

/// Called with every emission failure; must not panic
pub type ErrorHook = Arc<dyn Fn(&EmitError, &Record) + Send + Sync>;

/// Handle for detaching a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(u64);

struct Attached {
    id: SinkId,
    sink: Arc<dyn Sink>,
    threshold: Severity,
    label: String,
}

/// A named logger
pub struct Logger {
    name: Arc<str>,
    threshold: RwLock<Option<Severity>>,
    sinks: RwLock<Vec<Attached>>,
    next_id: AtomicU64,
    error_hook: RwLock<ErrorHook>,
}

impl Logger {
    /// Create a logger with only a discard sink attached
    pub fn new(name: &str) -> Self {
        let hook: ErrorHook = Arc::new(report_to_stderr);
        let logger = Self {
            name: Arc::from(name),
            threshold: RwLock::new(None),
            sinks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            error_hook: RwLock::new(hook),
        };
        logger.attach(Arc::new(NullSink), Severity::Debug);
        logger
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Minimum severity accepted by the logger, `None` when unset
    pub fn threshold(&self) -> Option<Severity> {
        *self.threshold.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_threshold(&self, severity: Severity) {
        *self.threshold.write().unwrap_or_else(PoisonError::into_inner) = Some(severity);
    }

    pub fn clear_threshold(&self) {
        *self.threshold.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Check whether a record at `severity` passes the logger threshold
    pub fn is_enabled(&self, severity: Severity) -> bool {
        self.threshold().map_or(true, |t| severity >= t)
    }

    /// Attach a sink that receives records at or above `threshold`
    pub fn attach(&self, sink: Arc<dyn Sink>, threshold: Severity) -> SinkId {
        let label = sink.label();
        let mut sinks = self.sinks.write().unwrap_or_else(PoisonError::into_inner);
        self.push(&mut sinks, sink, threshold, label)
    }

    /// Attach a sink unless one with the same label is already attached
    ///
    /// The check and the attach happen under one lock, so concurrent callers
    /// attach a given label at most once.
    pub fn attach_unique(&self, sink: Arc<dyn Sink>, threshold: Severity) -> Option<SinkId> {
        let label = sink.label();
        let mut sinks = self.sinks.write().unwrap_or_else(PoisonError::into_inner);
        if sinks.iter().any(|a| a.label == label) {
            return None;
        }
        Some(self.push(&mut sinks, sink, threshold, label))
    }

    fn push(
        &self,
        sinks: &mut Vec<Attached>,
        sink: Arc<dyn Sink>,
        threshold: Severity,
        label: String,
    ) -> SinkId {
        let id = SinkId(self.next_id.fetch_add(1, Ordering::Relaxed));
        sinks.push(Attached {
            id,
            sink,
            threshold,
            label,
        });
        id
    }

    /// Detach a sink, returning it if it was attached
    pub fn detach(&self, id: SinkId) -> Option<Arc<dyn Sink>> {
        let mut sinks = self.sinks.write().unwrap_or_else(PoisonError::into_inner);
        let index = sinks.iter().position(|a| a.id == id)?;
        Some(sinks.remove(index).sink)
    }

    /// Check if a sink with this label is attached
    pub fn has_sink(&self, label: &str) -> bool {
        self.sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|a| a.label == label)
    }

    /// Labels of the attached sinks, in delivery order
    pub fn sink_labels(&self) -> Vec<String> {
        self.sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|a| a.label.clone())
            .collect()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Replace the hook that reports emission failures
    pub fn set_error_hook(&self, hook: ErrorHook) {
        *self.error_hook.write().unwrap_or_else(PoisonError::into_inner) = hook;
    }

    /// Deliver a record to every sink whose threshold it meets
    ///
    /// Failures are reported through the error hook and never returned.
    pub fn dispatch(&self, record: &Record) {
        if !self.is_enabled(record.severity) {
            return;
        }

        // Snapshot so sinks may log back into this logger.
        let targets: Vec<Arc<dyn Sink>> = self
            .sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|a| record.severity >= a.threshold)
            .map(|a| Arc::clone(&a.sink))
            .collect();

        for sink in targets {
            if let Err(err) = sink.emit(record) {
                let hook = self
                    .error_hook
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                hook(&err, record);
            }
        }
    }

    /// Log a message with explicit flags
    #[track_caller]
    pub fn log_with(&self, severity: Severity, message: impl Into<String>, flags: RecordFlags) {
        if !self.is_enabled(severity) {
            return;
        }
        let location = Location::caller();
        let record = Record::new(severity, message)
            .with_flags(flags)
            .at(location.file(), location.line())
            .with_logger(Arc::clone(&self.name));
        self.dispatch(&record);
    }

    #[track_caller]
    pub fn log(&self, severity: Severity, message: impl Into<String>) {
        self.log_with(severity, message, RecordFlags::default());
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(Severity::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(Severity::Info, message);
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(Severity::Warn, message);
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(Severity::Error, message);
    }

    #[track_caller]
    pub fn critical(&self, message: impl Into<String>) {
        self.log(Severity::Critical, message);
    }

    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(Severity::Fatal, message);
    }
}

/// Default error hook: a short report on stderr
fn report_to_stderr(err: &EmitError, record: &Record) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "--- Logging error ---");
    let _ = writeln!(stderr, "{}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  caused by: {}", cause);
        source = cause.source();
    }
    let _ = writeln!(stderr, "Message: {:?}", record.message);
    let _ = writeln!(
        stderr,
        "Logged from file {}, line {}",
        record.filename(),
        record.line
    );
}

/// Hands out one shared logger per name
#[derive(Default)]
pub struct Registry {
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the logger called `name`, creating it on first use
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        if let Some(logger) = self
            .loggers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(logger);
        }

        let mut loggers = self.loggers.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            loggers
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Logger::new(name))),
        )
    }

    pub fn len(&self) -> usize {
        self.loggers.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
