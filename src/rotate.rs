//! Size-capped rotating log file.
//!
//! [`RotatingFile`] is the destination every log record ends up in: an
//! append-only file that, once its size passes the configured threshold, is
//! archived under a numbered name (`service.log` becomes `service.log.1`,
//! the previous `.1` shifts to `.2`, and so on) and replaced with a fresh
//! empty file. Rotation only ever happens between whole records.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Destination for whole formatted log records.
///
/// A record is one complete line, newline included. Implementations must
/// never split a record across a rotation or similar boundary.
pub trait RecordSink {
    /// Appends one record.
    ///
    /// # Errors
    /// * If writing or rotating the underlying storage fails
    fn write_record(&mut self, record: &[u8]) -> io::Result<()>;

    /// Flushes buffered data to the underlying storage.
    ///
    /// # Errors
    /// * If the underlying flush fails
    fn flush(&mut self) -> io::Result<()>;
}

/// Append-only log file capped at `max_size` bytes.
///
/// The size bookkeeping is seeded from the file's on-disk length, so a
/// restarted process resumes the cap where the previous one left off.
pub struct RotatingFile {
    /// Path of the active file. Archives live next to it as `<path>.N`.
    path: PathBuf,
    /// Currently open active file.
    file: File,
    /// Bytes written to the active file so far.
    size: u64,
    /// Size threshold that triggers rotation.
    max_size: u64,
    /// Archives to keep; `0` restarts the active file in place.
    backup_count: usize,
}

impl RotatingFile {
    /// Opens (creating if needed) the active log file at `path`.
    ///
    /// # Errors
    /// * If the file cannot be opened or its metadata cannot be read
    pub fn open(path: impl Into<PathBuf>, max_size: u64, backup_count: usize) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            file,
            size,
            max_size,
            backup_count,
        })
    }

    /// Path of the active log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the active file in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Path of the `n`-th archive, e.g. `service.log.2`.
    fn backup_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }

    /// Archives the active file and opens a fresh empty one.
    ///
    /// Existing archives shift one slot up (`.1` to `.2`, ...); the archive
    /// past `backup_count` is deleted. With `backup_count == 0` the active
    /// file is truncated in place and nothing is archived.
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.backup_count == 0 {
            self.file = File::create(&self.path)?;
            self.size = 0;
            return Ok(());
        }
        let oldest = self.backup_path(self.backup_count);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..self.backup_count).rev() {
            let from = self.backup_path(n);
            if from.exists() {
                fs::rename(&from, self.backup_path(n + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.size = 0;
        Ok(())
    }
}

impl RecordSink for RotatingFile {
    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        self.file.write_all(record)?;
        self.size += record.len() as u64;
        // Rotate as soon as the cap is passed, never mid-record.
        if self.size > self.max_size {
            self.rotate()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
