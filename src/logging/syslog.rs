//! Syslog sink over the local `/dev/log` datagram socket

use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};

use super::format::Template;
use super::record::Record;
use super::severity::Severity;
use super::sink::{EmitError, Sink};

/// Local syslog socket
pub const SYSLOG_DEVICE: &str = "/dev/log";

/// The `user` facility
pub const FACILITY_USER: u8 = 1;

/// Check if the local syslog socket exists
pub fn syslog_available() -> bool {
    Path::new(SYSLOG_DEVICE).exists()
}

/// Syslog priority for a severity
pub fn priority(severity: Severity) -> u8 {
    match severity {
        Severity::Debug => 7,
        Severity::Info => 6,
        Severity::Warn => 4,
        Severity::Error => 3,
        Severity::Critical | Severity::Fatal => 2,
    }
}

/// Combined `<PRI>` value for a facility and severity
pub fn encode_priority(facility: u8, severity: Severity) -> u8 {
    (facility << 3) | priority(severity)
}

/// Sends each record as one datagram: `<PRI>` + rendered line + NUL
pub struct SyslogSink {
    path: PathBuf,
    socket: Mutex<Option<UnixDatagram>>,
    facility: u8,
    template: Template,
}

fn connect(path: &Path) -> std::io::Result<UnixDatagram> {
    let socket = UnixDatagram::unbound()?;
    socket.connect(path)?;
    Ok(socket)
}

impl SyslogSink {
    /// Connect to the syslog socket at `path`
    pub fn connect(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let socket = connect(&path)
            .with_context(|| format!("Failed to connect to syslog at {}", path.display()))?;
        Ok(Self {
            path,
            socket: Mutex::new(Some(socket)),
            facility: FACILITY_USER,
            template: Template::DEBUG,
        })
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes sent for one record
    pub fn frame(&self, record: &Record) -> Vec<u8> {
        format!(
            "<{}>{}\0",
            encode_priority(self.facility, record.severity),
            self.template.render(record)
        )
        .into_bytes()
    }
}

impl Sink for SyslogSink {
    fn emit(&self, record: &Record) -> Result<(), EmitError> {
        let frame = self.frame(record);
        let mut socket = self.socket.lock().unwrap_or_else(PoisonError::into_inner);

        // The daemon may have restarted; reconnect once before giving up.
        if let Some(sock) = socket.as_ref() {
            if sock.send(&frame).is_ok() {
                return Ok(());
            }
        }
        *socket = None;

        let result = connect(&self.path).and_then(|sock| {
            sock.send(&frame)?;
            Ok(sock)
        });
        match result {
            Ok(sock) => {
                *socket = Some(sock);
                Ok(())
            }
            Err(source) => Err(EmitError::Syslog {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn label(&self) -> String {
        format!("syslog:{}", self.path.display())
    }
}
