//! Log records and per-record flags

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local};

use super::severity::Severity;

/// File name used when the front end supplies no source location
pub const UNKNOWN_FILE: &str = "(unknown file)";

/// Per-call switches that alter how the console renders one record
///
/// All flags default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFlags {
    /// Bypass the level template and print the message alone
    pub raw: bool,
    /// Strip trailing whitespace and omit the line terminator
    pub no_newline: bool,
    /// Wrap the message body at the console width
    pub textwrap: bool,
    /// When wrapping, keep all wrapped lines in one block
    pub no_splitlines: bool,
}

impl RecordFlags {
    pub fn with_raw(mut self) -> Self {
        self.raw = true;
        self
    }

    pub fn with_no_newline(mut self) -> Self {
        self.no_newline = true;
        self
    }

    pub fn with_textwrap(mut self) -> Self {
        self.textwrap = true;
        self
    }

    pub fn with_no_splitlines(mut self) -> Self {
        self.no_splitlines = true;
        self
    }
}

/// A single log call, handed to every attached sink
#[derive(Debug, Clone)]
pub struct Record {
    /// Severity the record was logged at
    pub severity: Severity,
    /// Message text as supplied by the caller
    pub message: String,
    /// Rendering flags for this call
    pub flags: RecordFlags,
    /// When the record was created
    pub timestamp: DateTime<Local>,
    /// Source file of the log call
    pub file: Cow<'static, str>,
    /// Source line of the log call
    pub line: u32,
    /// Name of the logger that created the record
    pub logger: Arc<str>,
}

impl Record {
    /// Create a record stamped with the current time and no location
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            flags: RecordFlags::default(),
            timestamp: Local::now(),
            file: Cow::Borrowed(UNKNOWN_FILE),
            line: 0,
            logger: Arc::from(""),
        }
    }

    pub fn with_flags(mut self, flags: RecordFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the source location of the record
    pub fn at(mut self, file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }

    pub fn with_logger(mut self, logger: Arc<str>) -> Self {
        self.logger = logger;
        self
    }

    /// Base name of the source file, as rendered by `{filename}`
    pub fn filename(&self) -> &str {
        Path::new(self.file.as_ref())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(self.file.as_ref())
    }
}
