//! The sink capability and the discard sink

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::record::Record;

/// Failure while delivering a record to a sink
///
/// Emission errors never reach the caller of a log method; the logger hands
/// them to its error hook instead.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to write to console stream")]
    Write(#[source] io::Error),

    #[error("failed to flush console stream")]
    Flush(#[source] io::Error),

    #[error("failed to write log file {}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to rotate log file {}", path.display())]
    Rotate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to send to syslog at {}", path.display())]
    Syslog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A destination for log records
pub trait Sink: Send + Sync {
    /// Format and deliver one record
    fn emit(&self, record: &Record) -> Result<(), EmitError>;

    /// Identity of the destination, e.g. `console` or `file:/var/log/app.log`
    ///
    /// Two sinks with the same label write to the same place.
    fn label(&self) -> String;
}

/// Accepts and drops every record
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl Sink for NullSink {
    #[inline]
    fn emit(&self, _record: &Record) -> Result<(), EmitError> {
        Ok(())
    }

    fn label(&self) -> String {
        "null".to_string()
    }
}
