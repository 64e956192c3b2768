//! File sinks
//!
//! Both sinks render every record with the debug template, one line per record,
//! and flush after each write so the log survives a crash.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};

use super::format::Template;
use super::record::Record;
use super::sink::{EmitError, Sink};

/// Size at which the rotating sink starts a new file (1 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 1_048_576;

/// Number of rotated generations kept next to the active file
pub const DEFAULT_BACKUP_COUNT: usize = 2;

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Appends records to one fixed file, never rotating
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
    template: Template,
}

impl FileSink {
    /// Open (or create) the file in append mode
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = open_append(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
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
}

impl Sink for FileSink {
    fn emit(&self, record: &Record) -> Result<(), EmitError> {
        let line = self.template.render(record) + "\n";
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| EmitError::File {
                path: self.path.clone(),
                source,
            })
    }

    fn label(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

struct ActiveFile {
    file: File,
    size: u64,
}

/// Appends records to a file and rotates it once it reaches a size limit
///
/// On rotation `name.1` becomes `name.2` and so on up to the backup count, the
/// oldest generation is dropped, and the active file becomes `name.1`.
pub struct RotatingFileSink {
    path: PathBuf,
    active: Mutex<ActiveFile>,
    max_bytes: u64,
    backup_count: usize,
    template: Template,
}

impl RotatingFileSink {
    /// Open with the default 1 MiB limit and two backups
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_limits(path, DEFAULT_MAX_BYTES, DEFAULT_BACKUP_COUNT)
    }

    /// Open with explicit limits
    ///
    /// A zero `max_bytes` or `backup_count` disables rotation.
    pub fn with_limits(
        path: impl Into<PathBuf>,
        max_bytes: u64,
        backup_count: usize,
    ) -> Result<Self> {
        let path = path.into();
        let file = open_append(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        let size = file
            .metadata()
            .with_context(|| format!("Failed to stat log file {}", path.display()))?
            .len();

        Ok(Self {
            path,
            active: Mutex::new(ActiveFile { file, size }),
            max_bytes,
            backup_count,
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

    /// Path of backup generation `n` (1 is the most recent)
    pub fn backup_path(&self, n: usize) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{}", n));
        PathBuf::from(name)
    }

    fn should_rollover(&self, active: &ActiveFile, incoming: u64) -> bool {
        self.max_bytes > 0
            && self.backup_count > 0
            && active.size > 0
            && active.size + incoming >= self.max_bytes
    }

    fn rollover(&self, active: &mut ActiveFile) -> io::Result<()> {
        active.file.flush()?;

        for n in (1..self.backup_count).rev() {
            let src = self.backup_path(n);
            let dst = self.backup_path(n + 1);
            if src.exists() {
                if dst.exists() {
                    fs::remove_file(&dst)?;
                }
                fs::rename(&src, &dst)?;
            }
        }

        let first = self.backup_path(1);
        if first.exists() {
            fs::remove_file(&first)?;
        }
        if self.path.exists() {
            fs::rename(&self.path, &first)?;
        }

        active.file = open_append(&self.path)?;
        active.size = 0;
        Ok(())
    }
}

impl Sink for RotatingFileSink {
    fn emit(&self, record: &Record) -> Result<(), EmitError> {
        let line = self.template.render(record) + "\n";
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);

        if self.should_rollover(&active, line.len() as u64) {
            self.rollover(&mut active)
                .map_err(|source| EmitError::Rotate {
                    path: self.path.clone(),
                    source,
                })?;
        }

        active
            .file
            .write_all(line.as_bytes())
            .and_then(|_| active.file.flush())
            .map_err(|source| EmitError::File {
                path: self.path.clone(),
                source,
            })?;
        active.size += line.len() as u64;
        Ok(())
    }

    fn label(&self) -> String {
        format!("rotating:{}", self.path.display())
    }
}
