//! Sink wiring and the `configure` entry point
//!
//! By default the doto logger only has a discard sink, so code using this crate
//! as a library stays quiet. Applications call [`configure`] once at startup to
//! persist everything from DEBUG up to a log file, show INFO and above on the
//! console, and optionally mirror to syslog.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use crate::config::{LogPaths, LoggingOptions};
use crate::logging::{ConsoleEmitter, FileSink, Logger, Registry, RotatingFileSink, Severity, Sink};

/// Name of the application logger
pub const LOGGER_NAME: &str = "doto";

/// Fatal setup failures
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{} *must* be a directory", .0.display())]
    NotADirectory(PathBuf),
}

/// What a configuration call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureReport {
    /// File receiving DEBUG and above
    pub persistent_file: PathBuf,
    /// Whether that file rotates
    pub rotating: bool,
    /// Whether a syslog sink is attached
    pub syslog: bool,
    /// Labels of sinks attached by this call, in order
    pub attached: Vec<String>,
}

fn ensure_dir(path: &Path) -> Result<(), SetupError> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(SetupError::NotADirectory(path.to_path_buf()));
    }
    fs::create_dir_all(path).map_err(|_| SetupError::NotADirectory(path.to_path_buf()))
}

/// Create the config directory and, best effort, the logs directory inside it
pub fn create_log_config_dirs(paths: &LogPaths) -> Result<(), SetupError> {
    ensure_dir(paths.config_dir())?;
    // A missing logs directory shows up when the log file is opened.
    let _ = ensure_dir(paths.logs_dir());
    Ok(())
}

fn attach(logger: &Logger, sink: Arc<dyn Sink>, threshold: Severity, attached: &mut Vec<String>) {
    let label = sink.label();
    if logger.attach_unique(sink, threshold).is_some() {
        attached.push(label);
    }
}

#[cfg(unix)]
fn attach_syslog(logger: &Logger, attached: &mut Vec<String>) -> bool {
    use crate::logging::{syslog_available, SyslogSink, SYSLOG_DEVICE};

    if !syslog_available() {
        return false;
    }

    logger.debug(format!("Logging to {}", SYSLOG_DEVICE));
    match SyslogSink::connect(SYSLOG_DEVICE) {
        Ok(sink) => {
            attach(logger, Arc::new(sink), Severity::Debug, attached);
            true
        }
        Err(e) => {
            logger.debug(format!("Syslog disabled: {:#}", e));
            false
        }
    }
}

#[cfg(not(unix))]
fn attach_syslog(_logger: &Logger, _attached: &mut Vec<String>) -> bool {
    false
}

/// Configure a logger for application use
///
/// Sets the logger threshold to DEBUG, attaches the persistent sink at DEBUG and
/// the console at INFO, and attaches syslog at DEBUG when requested and present.
/// Sinks already attached to the logger (same destination) are not attached
/// again, so repeated calls do not duplicate output.
///
/// Returns [`SetupError`] (inside the `anyhow` error) when the config directory
/// cannot be used.
pub fn try_configure(
    logger: &Logger,
    console: Arc<ConsoleEmitter>,
    paths: &LogPaths,
    options: &LoggingOptions,
) -> Result<ConfigureReport> {
    logger.set_threshold(Severity::Debug);
    create_log_config_dirs(paths)?;

    let mut attached = Vec::new();
    let (persistent_file, rotating) = match options.fixed_file() {
        Some(path) => (path.to_path_buf(), false),
        None => (paths.debug_file().to_path_buf(), true),
    };
    let persistent: Arc<dyn Sink> = if rotating {
        Arc::new(RotatingFileSink::open(&persistent_file)?)
    } else {
        Arc::new(FileSink::open(&persistent_file)?)
    };
    attach(logger, persistent, Severity::Debug, &mut attached);
    attach(logger, console, Severity::Info, &mut attached);

    let syslog = options.use_syslog && attach_syslog(logger, &mut attached);

    Ok(ConfigureReport {
        persistent_file,
        rotating,
        syslog,
        attached,
    })
}

/// Configure a logger for application use, exiting if the config directory is unusable
///
/// Same as [`try_configure`], except that a [`SetupError`] is reported on stderr
/// and terminates the process with status 1. Other failures (such as an
/// unwritable log file) are returned.
pub fn configure(
    logger: &Logger,
    console: Arc<ConsoleEmitter>,
    paths: &LogPaths,
    options: &LoggingOptions,
) -> Result<ConfigureReport> {
    try_configure(logger, console, paths, options).map_err(|err| {
        if let Some(setup) = err.downcast_ref::<SetupError>() {
            let _ = writeln!(io::stderr(), "!!! ERROR - {}", setup);
            process::exit(1);
        }
        err
    })
}

/// Logging state owned by the application's composition root
///
/// Holds the logger registry, the doto logger, its console emitter and the
/// directory layout. Pass `logger()` to components that need to log.
pub struct LoggingContext {
    registry: Registry,
    logger: Arc<Logger>,
    console: Arc<ConsoleEmitter>,
    paths: LogPaths,
}

impl LoggingContext {
    /// Context writing to stdout/stderr with the per-user layout
    pub fn new() -> Self {
        Self::with_parts(ConsoleEmitter::new(), LogPaths::from_home())
    }

    pub fn with_parts(console: ConsoleEmitter, paths: LogPaths) -> Self {
        let registry = Registry::new();
        let logger = registry.get_logger(LOGGER_NAME);
        Self {
            registry,
            logger,
            console: Arc::new(console),
            paths,
        }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn console(&self) -> &Arc<ConsoleEmitter> {
        &self.console
    }

    pub fn paths(&self) -> &LogPaths {
        &self.paths
    }

    /// See [`try_configure`]
    pub fn try_configure(&self, options: &LoggingOptions) -> Result<ConfigureReport> {
        try_configure(&self.logger, Arc::clone(&self.console), &self.paths, options)
    }

    /// See [`configure`]
    pub fn configure(&self, options: &LoggingOptions) -> Result<ConfigureReport> {
        configure(&self.logger, Arc::clone(&self.console), &self.paths, options)
    }
}

impl Default for LoggingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{CaptureStream, ASCTIME_FORMAT};
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::TempDir;

    struct Harness {
        _temp_dir: TempDir,
        ctx: LoggingContext,
        out: CaptureStream,
        err: CaptureStream,
    }

    fn harness() -> Harness {
        let temp_dir = TempDir::new().unwrap();
        let out = CaptureStream::new();
        let err = CaptureStream::new();
        let paths = LogPaths::under(
            temp_dir.path().join(".doto-logs"),
            NaiveDate::from_ymd_opt(2026, 1, 21).unwrap(),
        );
        let ctx = LoggingContext::with_parts(
            ConsoleEmitter::with_streams(out.clone(), err.clone()),
            paths,
        );
        Harness {
            _temp_dir: temp_dir,
            ctx,
            out,
            err,
        }
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_unconfigured_logger_is_silent() {
        let h = harness();
        h.ctx.logger().error("nobody hears this");
        assert!(h.out.contents().is_empty());
        assert!(h.err.contents().is_empty());
        assert!(!h.ctx.paths().config_dir().exists());
    }

    #[test]
    fn test_info_goes_to_stdout_and_rotating_file() {
        let h = harness();
        let report = h.ctx.try_configure(&LoggingOptions::default()).unwrap();
        assert!(report.rotating);
        assert_eq!(report.persistent_file, h.ctx.paths().debug_file());

        h.ctx.logger().info("hello");
        assert_eq!(h.out.contents(), ">>> hello\n");
        assert!(h.err.contents().is_empty());

        let file_lines = lines(h.ctx.paths().debug_file());
        assert_eq!(file_lines.len(), 1);
        let line = &file_lines[0];
        let (stamp, rest) = line.split_at(23);
        assert!(NaiveDateTime::parse_from_str(stamp, ASCTIME_FORMAT).is_ok());
        assert!(rest.starts_with(" setup.rs:"));
        assert!(rest.ends_with(" - INFO - hello"));
    }

    #[test]
    fn test_error_goes_to_stderr() {
        let h = harness();
        h.ctx.try_configure(&LoggingOptions::default()).unwrap();

        h.ctx.logger().error("boom");
        assert_eq!(h.err.contents(), "!!! ERROR - boom\n");
        assert!(h.out.contents().is_empty());
    }

    #[test]
    fn test_debug_reaches_file_but_not_console() {
        let h = harness();
        h.ctx.try_configure(&LoggingOptions::default()).unwrap();

        h.ctx.logger().debug("details");
        assert!(h.out.contents().is_empty());
        let file_lines = lines(h.ctx.paths().debug_file());
        assert!(file_lines[0].ends_with(" - DEBUG - details"));
    }

    #[test]
    fn test_fixed_filename_skips_rotation() {
        let h = harness();
        let fixed = h.ctx.paths().config_dir().join("fixed.log");
        let report = h
            .ctx
            .try_configure(&LoggingOptions::default().with_filename(&fixed))
            .unwrap();
        assert!(!report.rotating);

        h.ctx.logger().warn("careful");
        assert_eq!(h.out.contents(), "*** WARNING - careful\n");
        assert!(lines(&fixed)[0].ends_with(" - WARNING - careful"));
        assert!(!h.ctx.paths().debug_file().exists());
    }

    #[test]
    fn test_configure_twice_does_not_duplicate() {
        let h = harness();
        let fixed = h.ctx.paths().config_dir().join("fixed.log");
        let options = LoggingOptions::default().with_filename(&fixed);

        let first = h.ctx.try_configure(&options).unwrap();
        let second = h.ctx.try_configure(&options).unwrap();
        assert_eq!(first.attached.len(), 2);
        assert!(second.attached.is_empty());

        h.ctx.logger().info("once");
        assert_eq!(h.out.contents(), ">>> once\n");
        assert_eq!(lines(&fixed).len(), 1);
    }

    #[test]
    fn test_sink_order_and_thresholds() {
        let h = harness();
        h.ctx.try_configure(&LoggingOptions::default()).unwrap();
        let labels = h.ctx.logger().sink_labels();
        assert_eq!(labels[0], "null");
        assert!(labels[1].starts_with("rotating:"));
        assert_eq!(labels[2], "console");
        assert_eq!(h.ctx.logger().threshold(), Some(Severity::Debug));
    }

    #[test]
    fn test_config_dir_must_be_a_directory() {
        let h = harness();
        fs::write(h.ctx.paths().config_dir(), "not a dir").unwrap();

        let err = h
            .ctx
            .try_configure(&LoggingOptions::default())
            .unwrap_err();
        let setup = err.downcast_ref::<SetupError>().unwrap();
        assert!(setup.to_string().ends_with("*must* be a directory"));
    }

    #[test]
    fn test_logs_dir_failure_is_not_fatal() {
        let h = harness();
        fs::create_dir_all(h.ctx.paths().config_dir()).unwrap();
        fs::write(h.ctx.paths().logs_dir(), "in the way").unwrap();

        assert!(create_log_config_dirs(h.ctx.paths()).is_ok());

        // The rotating file can't be opened, which is an ordinary I/O error
        let err = h
            .ctx
            .try_configure(&LoggingOptions::default())
            .unwrap_err();
        assert!(err.downcast_ref::<SetupError>().is_none());

        // A fixed file elsewhere still works
        let fixed = h.ctx.paths().config_dir().join("fixed.log");
        assert!(h
            .ctx
            .try_configure(&LoggingOptions::default().with_filename(&fixed))
            .is_ok());
    }

    #[test]
    fn test_unknown_host_keys_are_ignored() {
        let h = harness();
        let options: LoggingOptions =
            toml::from_str("use_syslog = false\nretention_days = 300000000000000").unwrap();
        let report = h.ctx.try_configure(&options).unwrap();
        assert!(report.rotating);

        h.ctx.logger().info("still logging");
        assert_eq!(h.out.contents(), ">>> still logging\n");
    }

    #[test]
    fn test_syslog_is_skipped_when_unavailable() {
        let h = harness();
        let report = h
            .ctx
            .try_configure(&LoggingOptions::default().with_syslog(true))
            .unwrap();
        #[cfg(unix)]
        if !crate::logging::syslog_available() {
            assert!(!report.syslog);
        }
        #[cfg(not(unix))]
        assert!(!report.syslog);
    }

    #[test]
    fn test_context_logger_comes_from_registry() {
        let h = harness();
        let again = h.ctx.registry().get_logger(LOGGER_NAME);
        assert!(Arc::ptr_eq(h.ctx.logger(), &again));
    }
}
