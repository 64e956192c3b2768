//! Format templates and the per-severity formatter table
//!
//! Templates are fixed strings with `{placeholder}` slots. Known placeholders are
//! `asctime`, `filename`, `lineno`, `levelname` and `message`; anything else is
//! copied through untouched.

use std::fmt::Write;

use super::record::Record;
use super::severity::Severity;

pub const RAW_FORMAT: &str = "{message}";
pub const INFO_FORMAT: &str = ">>> {message}";
pub const DEFAULT_CONSOLE_FORMAT: &str = "{levelname} - {message}";
pub const ERROR_CONSOLE_FORMAT: &str = "!!! {levelname} - {message}";
pub const WARN_CONSOLE_FORMAT: &str = "*** {levelname} - {message}";
pub const FILE_INFO_FORMAT: &str = "{filename}:{lineno} - {levelname} - {message}";
pub const DEBUG_FORMAT: &str = "{asctime} {filename}:{lineno} - {levelname} - {message}";

/// chrono pattern for `{asctime}`, e.g. `2026-01-21 14:30:45,123`
pub const ASCTIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// An immutable output pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template(&'static str);

impl Template {
    pub const RAW: Template = Template(RAW_FORMAT);
    pub const INFO: Template = Template(INFO_FORMAT);
    pub const DEFAULT_CONSOLE: Template = Template(DEFAULT_CONSOLE_FORMAT);
    pub const ERROR_CONSOLE: Template = Template(ERROR_CONSOLE_FORMAT);
    pub const WARN_CONSOLE: Template = Template(WARN_CONSOLE_FORMAT);
    pub const DEBUG: Template = Template(DEBUG_FORMAT);

    pub const fn new(pattern: &'static str) -> Self {
        Self(pattern)
    }

    pub fn pattern(&self) -> &'static str {
        self.0
    }

    /// Render the record with its own message
    pub fn render(&self, record: &Record) -> String {
        self.render_message(record, &record.message)
    }

    /// Render the record's metadata around a replacement message body
    pub fn render_message(&self, record: &Record, message: &str) -> String {
        let mut out = String::with_capacity(self.0.len() + message.len());
        let mut rest = self.0;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                rest = "";
                break;
            };

            let key = &after[..close];
            match key {
                "message" => out.push_str(message),
                "levelname" => out.push_str(record.severity.as_str()),
                "filename" => out.push_str(record.filename()),
                "lineno" => {
                    let _ = write!(out, "{}", record.line);
                }
                "asctime" => {
                    let _ = write!(out, "{}", record.timestamp.format(ASCTIME_FORMAT));
                }
                other => {
                    out.push('{');
                    out.push_str(other);
                    out.push('}');
                }
            }
            rest = &after[close + 1..];
        }

        out.push_str(rest);
        out
    }
}

/// Maps each severity (and the raw override) to exactly one template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterTable {
    entries: [Option<Template>; 6],
    raw: Template,
    fallback: Template,
}

impl FormatterTable {
    /// The console table: markers for INFO, WARN and the error levels, full detail for DEBUG
    pub fn console() -> Self {
        Self::empty()
            .with_template(Severity::Info, Template::INFO)
            .with_template(Severity::Debug, Template::DEBUG)
            .with_template(Severity::Warn, Template::WARN_CONSOLE)
            .with_template(Severity::Error, Template::ERROR_CONSOLE)
            .with_template(Severity::Critical, Template::ERROR_CONSOLE)
            .with_template(Severity::Fatal, Template::ERROR_CONSOLE)
    }

    /// A table with no per-severity entries; every level uses the default console format
    pub fn empty() -> Self {
        Self {
            entries: [None; 6],
            raw: Template::RAW,
            fallback: Template::DEFAULT_CONSOLE,
        }
    }

    pub fn with_template(mut self, severity: Severity, template: Template) -> Self {
        self.entries[severity.index()] = Some(template);
        self
    }

    pub fn without_template(mut self, severity: Severity) -> Self {
        self.entries[severity.index()] = None;
        self
    }

    /// Look up the template for a record
    pub fn format_for(&self, severity: Severity, raw: bool) -> &Template {
        if raw {
            return &self.raw;
        }
        self.entries[severity.index()]
            .as_ref()
            .unwrap_or(&self.fallback)
    }
}

impl Default for FormatterTable {
    fn default() -> Self {
        Self::console()
    }
}
