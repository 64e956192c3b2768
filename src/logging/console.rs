//! Console emitter
//!
//! Renders records with the console formatter table, optionally wraps the message
//! body, routes error-level records to the error stream and everything else to
//! the normal stream, and flushes after every record so the two streams stay in
//! order on terminals that merge them.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use super::format::FormatterTable;
use super::record::Record;
use super::sink::{EmitError, Sink};
use super::wrap::{split_lines, Wrapper};

/// Encoding a console stream accepts for text writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Ascii,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Ascii => "ASCII",
        }
    }

    /// Check whether `text` is representable in this encoding
    pub fn can_encode(&self, text: &str) -> bool {
        match self {
            TextEncoding::Utf8 => true,
            TextEncoding::Ascii => text.is_ascii(),
        }
    }
}

/// Failure of a text write
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("text is not representable as {}", .0.name())]
    Encoding(TextEncoding),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// An output stream the console emitter writes to
pub trait ConsoleStream: Send {
    /// Write text in the stream's native encoding
    fn write_text(&mut self, text: &str) -> Result<(), StreamError>;

    /// Write already-encoded bytes verbatim
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

/// A console stream over any writer
pub struct WriterStream<W> {
    inner: W,
    encoding: TextEncoding,
}

impl<W: Write + Send> WriterStream<W> {
    pub fn new(inner: W, encoding: TextEncoding) -> Self {
        Self { inner, encoding }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }
}

impl WriterStream<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), TextEncoding::Utf8)
    }
}

impl WriterStream<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr(), TextEncoding::Utf8)
    }
}

impl<W: Write + Send> ConsoleStream for WriterStream<W> {
    fn write_text(&mut self, text: &str) -> Result<(), StreamError> {
        if !self.encoding.can_encode(text) {
            return Err(StreamError::Encoding(self.encoding));
        }
        self.inner.write_all(text.as_bytes())?;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// In-memory console stream whose contents can be read back
///
/// Clones share the same buffer, so one clone can be handed to the emitter
/// while another is kept to inspect what was written.
#[derive(Debug, Clone)]
pub struct CaptureStream {
    buffer: Arc<Mutex<Vec<u8>>>,
    encoding: TextEncoding,
    flushes: Arc<Mutex<usize>>,
}

impl CaptureStream {
    pub fn new() -> Self {
        Self::with_encoding(TextEncoding::Utf8)
    }

    pub fn with_encoding(encoding: TextEncoding) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Vec::new())),
            encoding,
            flushes: Arc::new(Mutex::new(0)),
        }
    }

    /// Everything written so far, decoded lossily as UTF-8
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Number of flushes observed
    pub fn flush_count(&self) -> usize {
        *self.flushes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CaptureStream {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleStream for CaptureStream {
    fn write_text(&mut self, text: &str) -> Result<(), StreamError> {
        if !self.encoding.can_encode(text) {
            return Err(StreamError::Encoding(self.encoding));
        }
        self.write_bytes(text.as_bytes())?;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        *self.flushes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// The console sink
pub struct ConsoleEmitter {
    out: Mutex<Box<dyn ConsoleStream>>,
    err: Mutex<Box<dyn ConsoleStream>>,
    formatters: FormatterTable,
    wrapper: Wrapper,
}

impl ConsoleEmitter {
    /// Emitter writing to the process stdout and stderr
    pub fn new() -> Self {
        Self::with_streams(WriterStream::stdout(), WriterStream::stderr())
    }

    pub fn with_streams(
        out: impl ConsoleStream + 'static,
        err: impl ConsoleStream + 'static,
    ) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
            err: Mutex::new(Box::new(err)),
            formatters: FormatterTable::console(),
            wrapper: Wrapper::default(),
        }
    }

    pub fn with_formatters(mut self, formatters: FormatterTable) -> Self {
        self.formatters = formatters;
        self
    }

    pub fn with_wrapper(mut self, wrapper: Wrapper) -> Self {
        self.wrapper = wrapper;
        self
    }

    pub fn formatters(&self) -> &FormatterTable {
        &self.formatters
    }

    /// Message bodies to render for a record, one per physical write
    ///
    /// Without wrapping this is the message itself. With wrapping each source
    /// line is wrapped separately; `no_splitlines` joins the pieces back into a
    /// single block so the template is applied once.
    pub fn bodies(&self, record: &Record) -> Vec<String> {
        if !record.flags.textwrap {
            return vec![record.message.clone()];
        }

        let mut lines: Vec<String> = split_lines(&record.message)
            .into_iter()
            .flat_map(|line| self.wrapper.wrap(line))
            .collect();
        if lines.is_empty() {
            lines.push(String::new());
        }

        if record.flags.no_splitlines {
            vec![lines.join("\n")]
        } else {
            lines
        }
    }

    /// Render one body with the record's template and line terminator
    pub fn render(&self, record: &Record, body: &str) -> String {
        let template = self.formatters.format_for(record.severity, record.flags.raw);
        let text = template.render_message(record, body);
        if record.flags.no_newline {
            text.trim_end().to_string()
        } else {
            text + "\n"
        }
    }

    /// Format, route, write and flush one record
    pub fn emit(&self, record: &Record) -> Result<(), EmitError> {
        let texts: Vec<String> = self
            .bodies(record)
            .iter()
            .map(|body| self.render(record, body))
            .collect();

        let target = if record.severity.is_error() {
            &self.err
        } else {
            &self.out
        };
        let mut stream = target.lock().unwrap_or_else(PoisonError::into_inner);

        for text in &texts {
            write_with_fallback(&mut **stream, text)?;
        }
        stream.flush().map_err(EmitError::Flush)
    }
}

impl Default for ConsoleEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleEmitter {
    fn emit(&self, record: &Record) -> Result<(), EmitError> {
        ConsoleEmitter::emit(self, record)
    }

    fn label(&self) -> String {
        "console".to_string()
    }
}

/// Write text natively, falling back to raw UTF-8 bytes if the stream can't encode it
fn write_with_fallback(stream: &mut dyn ConsoleStream, text: &str) -> Result<(), EmitError> {
    match stream.write_text(text) {
        Ok(()) => Ok(()),
        Err(StreamError::Encoding(_)) => stream
            .write_bytes(text.as_bytes())
            .map_err(EmitError::Write),
        Err(StreamError::Io(e)) => Err(EmitError::Write(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{RecordFlags, Severity};

    struct ClosedStream;

    impl ConsoleStream for ClosedStream {
        fn write_text(&mut self, _text: &str) -> Result<(), StreamError> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed").into())
        }

        fn write_bytes(&mut self, _bytes: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn emitter() -> (ConsoleEmitter, CaptureStream, CaptureStream) {
        let out = CaptureStream::new();
        let err = CaptureStream::new();
        let emitter = ConsoleEmitter::with_streams(out.clone(), err.clone());
        (emitter, out, err)
    }

    fn record(severity: Severity, message: &str, flags: RecordFlags) -> Record {
        Record::new(severity, message).with_flags(flags)
    }

    #[test]
    fn test_routing_by_severity() {
        for severity in Severity::ALL {
            let (emitter, out, err) = emitter();
            emitter
                .emit(&record(severity, "msg", RecordFlags::default()))
                .unwrap();
            if severity.is_error() {
                assert!(out.contents().is_empty(), "{severity} leaked to stdout");
                assert!(err.contents().ends_with("msg\n"));
            } else {
                assert!(err.contents().is_empty(), "{severity} leaked to stderr");
                assert!(out.contents().ends_with("msg\n"));
            }
        }
    }

    #[test]
    fn test_info_and_error_lines() {
        let (emitter, out, err) = emitter();
        emitter
            .emit(&record(Severity::Info, "hello", RecordFlags::default()))
            .unwrap();
        emitter
            .emit(&record(Severity::Error, "boom", RecordFlags::default()))
            .unwrap();
        assert_eq!(out.contents(), ">>> hello\n");
        assert_eq!(err.contents(), "!!! ERROR - boom\n");
    }

    #[test]
    fn test_raw_flag_prints_message_alone() {
        let (emitter, _out, err) = emitter();
        let flags = RecordFlags::default().with_raw();
        emitter
            .emit(&record(Severity::Critical, "plain", flags))
            .unwrap();
        assert_eq!(err.contents(), "plain\n");
    }

    #[test]
    fn test_newline_appended_exactly_once() {
        let (emitter, out, _err) = emitter();
        emitter
            .emit(&record(Severity::Info, "line", RecordFlags::default()))
            .unwrap();
        let text = out.contents();
        assert!(text.ends_with('\n'));
        assert!(!text.ends_with("\n\n"));
    }

    #[test]
    fn test_no_newline_strips_trailing_whitespace() {
        let (emitter, out, _err) = emitter();
        let flags = RecordFlags::default().with_no_newline();
        emitter
            .emit(&record(Severity::Warn, "prompt:   \n", flags))
            .unwrap();
        assert_eq!(out.contents(), "*** WARNING - prompt:");
    }

    #[test]
    fn test_textwrap_repeats_template_per_line() {
        let (emitter, out, _err) = emitter();
        let message = "word ".repeat(30);
        let flags = RecordFlags::default().with_textwrap();
        emitter
            .emit(&record(Severity::Info, &message, flags))
            .unwrap();
        let text = out.contents();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.len() >= 2);
        for line in lines {
            assert!(line.starts_with(">>> word"));
            assert!(line.len() <= 4 + 60);
        }
    }

    #[test]
    fn test_textwrap_handles_embedded_lines_independently() {
        let (emitter, out, _err) = emitter();
        let flags = RecordFlags::default().with_textwrap();
        emitter
            .emit(&record(Severity::Info, "first\n  second  ", flags))
            .unwrap();
        assert_eq!(out.contents(), ">>> first\n>>> second\n");
    }

    #[test]
    fn test_textwrap_splits_on_carriage_return() {
        let (emitter, out, _err) = emitter();
        let flags = RecordFlags::default().with_textwrap();
        emitter
            .emit(&record(Severity::Info, "first\rsecond", flags))
            .unwrap();
        assert_eq!(out.contents(), ">>> first\n>>> second\n");
    }

    #[test]
    fn test_no_splitlines_applies_template_once() {
        let (emitter, _out, err) = emitter();
        let flags = RecordFlags::default().with_textwrap().with_no_splitlines();
        emitter
            .emit(&record(Severity::Error, "first\nsecond", flags))
            .unwrap();
        assert_eq!(err.contents(), "!!! ERROR - first\nsecond\n");
    }

    #[test]
    fn test_textwrap_keeps_blank_message() {
        let (emitter, out, _err) = emitter();
        let flags = RecordFlags::default().with_textwrap().with_raw();
        emitter.emit(&record(Severity::Info, "", flags)).unwrap();
        assert_eq!(out.contents(), "\n");
    }

    #[test]
    fn test_encoding_fallback_writes_utf8_bytes() {
        let out = CaptureStream::with_encoding(TextEncoding::Ascii);
        let emitter = ConsoleEmitter::with_streams(out.clone(), CaptureStream::new());
        emitter
            .emit(&record(Severity::Info, "café", RecordFlags::default()))
            .unwrap();
        assert_eq!(out.contents(), ">>> café\n");
    }

    #[test]
    fn test_flushes_destination_every_record() {
        let (emitter, out, err) = emitter();
        emitter
            .emit(&record(Severity::Info, "a", RecordFlags::default()))
            .unwrap();
        emitter
            .emit(&record(Severity::Info, "b", RecordFlags::default()))
            .unwrap();
        emitter
            .emit(&record(Severity::Fatal, "c", RecordFlags::default()))
            .unwrap();
        assert_eq!(out.flush_count(), 2);
        assert_eq!(err.flush_count(), 1);
    }

    #[test]
    fn test_closed_stream_reports_write_error() {
        let emitter = ConsoleEmitter::with_streams(ClosedStream, CaptureStream::new());
        let result = emitter.emit(&record(Severity::Info, "lost", RecordFlags::default()));
        assert!(matches!(result, Err(EmitError::Write(_))));
    }

    #[test]
    fn test_writer_stream_rejects_non_ascii() {
        let mut stream = WriterStream::new(Vec::new(), TextEncoding::Ascii);
        assert!(matches!(
            stream.write_text("naïve"),
            Err(StreamError::Encoding(TextEncoding::Ascii))
        ));
        stream.write_text("plain").unwrap();
        stream.write_bytes("naïve".as_bytes()).unwrap();
        assert_eq!(stream.inner, "plainnaïve".as_bytes());
    }
}
