//! Process-wide logger installation and exception logging.
//!
//! [`init_logging`] is called once at service startup. It routes every
//! record emitted through the `log` facade into one rotating file sink and
//! returns a [`Logging`] context that call sites use for flushing and for
//! recording error cause chains.

use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Local;
use eyre::{eyre, Report, Result, WrapErr};
use fern::Dispatch;
use log::{Level, LevelFilter};

use crate::config::LogConfig;
use crate::guard::SinkGuard;
use crate::rotate::RotatingFile;

/// Shared handle to the installed sink.
type SharedGuard = Arc<Mutex<SinkGuard<RotatingFile>>>;

/// Handle to the process-wide logging state installed by [`init_logging`].
///
/// There is exactly one live sink per process; this context is the explicit
/// way to reach it. Pass it by reference to call sites that flush the log
/// or record exceptions.
pub struct Logging {
    /// The sink every record funnels through.
    sink: SharedGuard,
    /// Path of the active log file.
    log_file: PathBuf,
    /// Installed severity threshold.
    level: LevelFilter,
}

/// `Write` view of the shared sink handed to the dispatch chain.
struct SharedSink(SharedGuard);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.lock() {
            Ok(mut guard) => guard.write(buf),
            Err(_) => Err(io::Error::other("log sink mutex poisoned")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.0.lock() {
            Ok(mut guard) => guard.flush(),
            Err(_) => Err(io::Error::other("log sink mutex poisoned")),
        }
    }
}

/// Installs the rotating file sink as the sole process-wide log destination.
///
/// Record format: `<timestamp> [<LEVEL>] (<thread-name>) <message>`, one
/// UTF-8 line per record. Intended to be called exactly once at process
/// startup.
///
/// # Errors
/// * If the log file cannot be opened
/// * If a logger is already installed (re-initialization is out of contract)
pub fn init_logging(config: LogConfig) -> Result<Logging> {
    let file = RotatingFile::open(&config.log_file, config.max_size, config.backup_count)
        .wrap_err_with(|| format!("failed to open log file {}", config.log_file.display()))?;
    let sink: SharedGuard = Arc::new(Mutex::new(SinkGuard::new(file)));

    Dispatch::new()
        .level(config.level)
        // Format log messages with time, level and originating thread
        .format(|out, message, record| {
            let thread = std::thread::current();
            out.finish(format_args!(
                "{} [{}] ({}) {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                thread.name().unwrap_or("unnamed"),
                message
            ));
        })
        .chain(fern::Output::writer(
            Box::new(SharedSink(Arc::clone(&sink))),
            "\n",
        ))
        .apply()
        .wrap_err("logging is already initialized")?;

    Ok(Logging {
        sink,
        log_file: config.log_file,
        level: config.level,
    })
}

impl Logging {
    /// Path of the active log file.
    #[must_use]
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Installed severity threshold.
    #[must_use]
    pub const fn level(&self) -> LevelFilter {
        self.level
    }

    /// Flushes the sink to disk.
    ///
    /// # Errors
    /// * If the sink mutex was poisoned by a failed emitter
    pub fn flush(&self) -> Result<()> {
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| eyre!("log sink mutex poisoned"))?;
        sink.flush()?;
        Ok(())
    }

    /// Logs `message` and `error`'s cause chain at the highest severity.
    ///
    /// Shorthand for [`Logging::log_exception_at`] with [`Level::Error`].
    pub fn log_exception(&self, message: impl Display, error: Option<&Report>) {
        self.log_exception_at(Level::Error, message, error);
    }

    /// Logs `message`, then `error`'s cause chain line by line, all at
    /// `level`.
    ///
    /// The message record is emitted strictly before the chain records, and
    /// the chain keeps its top-to-bottom order. With `error` absent a single
    /// record marks that no error context was captured.
    pub fn log_exception_at(&self, level: Level, message: impl Display, error: Option<&Report>) {
        log::log!(level, "{message}");
        match error {
            Some(report) => {
                for (depth, cause) in report.chain().enumerate() {
                    if depth == 0 {
                        log::log!(level, "{cause}");
                    } else {
                        log::log!(level, "Caused by: {cause}");
                    }
                }
            }
            None => log::log!(level, "(no error context)"),
        }
    }
}
