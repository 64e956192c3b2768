//! Logging core for doto
//!
//! Provides the console emitter with level-aware formatting and line wrapping,
//! named loggers with pluggable sinks, file, rotating-file and syslog sinks,
//! and a `tracing` layer that feeds them.

mod console;
mod file_writer;
mod format;
mod layer;
mod logger;
mod record;
mod severity;
mod sink;
#[cfg(unix)]
mod syslog;
mod wrap;

pub use console::{
    CaptureStream, ConsoleEmitter, ConsoleStream, StreamError, TextEncoding, WriterStream,
};
pub use file_writer::{FileSink, RotatingFileSink, DEFAULT_BACKUP_COUNT, DEFAULT_MAX_BYTES};
pub use format::{
    FormatterTable, Template, ASCTIME_FORMAT, DEBUG_FORMAT, DEFAULT_CONSOLE_FORMAT,
    ERROR_CONSOLE_FORMAT, FILE_INFO_FORMAT, INFO_FORMAT, RAW_FORMAT, WARN_CONSOLE_FORMAT,
};
pub use layer::{init_tracing, DotoLayer};
pub use logger::{ErrorHook, Logger, Registry, SinkId};
pub use record::{Record, RecordFlags, UNKNOWN_FILE};
pub use severity::{ParseSeverityError, Severity};
pub use sink::{EmitError, NullSink, Sink};
#[cfg(unix)]
pub use syslog::{
    encode_priority, priority, syslog_available, SyslogSink, FACILITY_USER, SYSLOG_DEVICE,
};
pub use wrap::{split_lines, wrap, Wrapper, DEFAULT_WIDTH};
