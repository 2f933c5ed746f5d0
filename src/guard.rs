//! Failure guard between the log dispatch and the rotating file.
//!
//! [`SinkGuard`] adapts a [`RecordSink`] to the `io::Write` interface the
//! dispatch chain expects, forwarding one complete line at a time. A failure
//! of the sink itself is never reported through the logging system: the
//! guard writes a diagnostic header and the failure's cause chain directly
//! to a raw stream, flushes it, and panics.

use std::error::Error;
use std::io::{self, Write};

use crate::rotate::RecordSink;

/// Header written to the raw diagnostics stream when the sink fails.
const SINK_FAILURE_HEADER: &str = "Exception in logging module:";

/// `io::Write` adapter feeding whole lines to a [`RecordSink`].
///
/// Bytes are buffered until a newline completes a record, so arbitrary
/// chunking from the formatting layer cannot split a record across a
/// rotation boundary.
pub struct SinkGuard<S> {
    /// Destination for completed records.
    sink: S,
    /// Raw stream for reporting sink failures; stderr in production.
    diagnostics: Box<dyn Write + Send>,
    /// Bytes of the record currently being assembled.
    pending: Vec<u8>,
}

impl<S: RecordSink> SinkGuard<S> {
    /// Wraps `sink`, reporting sink failures on stderr.
    pub fn new(sink: S) -> Self {
        Self::with_diagnostics(sink, Box::new(io::stderr()))
    }

    /// Wraps `sink`, reporting sink failures on `diagnostics`.
    pub fn with_diagnostics(sink: S, diagnostics: Box<dyn Write + Send>) -> Self {
        Self {
            sink,
            diagnostics,
            pending: Vec::new(),
        }
    }

    /// Reports a failure of the sink itself on the raw diagnostics stream,
    /// then panics.
    ///
    /// The diagnostics writes are best-effort: if the raw stream is broken
    /// too there is nowhere left to report, and the panic still lands.
    ///
    /// # Panics
    /// Always. Sink failure is fatal by contract; the panic propagates to
    /// the host's unhandled-panic path.
    #[allow(clippy::panic)]
    fn sink_failed(&mut self, err: &io::Error) -> ! {
        let _ = writeln!(self.diagnostics, "{SINK_FAILURE_HEADER}");
        let mut cause: Option<&dyn Error> = Some(err);
        while let Some(current) = cause {
            let _ = writeln!(self.diagnostics, "{current}");
            cause = current.source();
        }
        let _ = self.diagnostics.flush();
        panic!("log sink failed: {err}");
    }
}

impl<S: RecordSink> Write for SinkGuard<S> {
    /// Never returns `Err`: a sink failure diverges via
    /// [`SinkGuard::sink_failed`] instead.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let record: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Err(err) = self.sink.write_record(&record) {
                self.sink_failed(&err);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Err(err) = self.sink.flush() {
            self.sink_failed(&err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::{Arc, Mutex};

    /// Sink double that stores records as strings.
    #[derive(Clone, Default)]
    struct CollectSink {
        records: Arc<Mutex<Vec<String>>>,
    }

    impl RecordSink for CollectSink {
        fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
            self.records
                .lock()
                .unwrap()
                .push(String::from_utf8(record.to_vec()).unwrap());
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Sink double that fails every operation.
    struct BrokenSink;

    impl RecordSink for BrokenSink {
        fn write_record(&mut self, _record: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "disk gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "disk gone"))
        }
    }

    /// Shared in-memory stand-in for the raw diagnostics stream.
    #[derive(Clone, Default)]
    struct SharedBuf {
        bytes: Arc<Mutex<Vec<u8>>>,
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.bytes.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.bytes.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_complete_lines_become_records() {
        let sink = CollectSink::default();
        let records = Arc::clone(&sink.records);
        let mut guard = SinkGuard::new(sink);
        guard.write_all(b"first line\nsecond line\n").unwrap();
        assert_eq!(
            *records.lock().unwrap(),
            vec!["first line\n".to_string(), "second line\n".to_string()]
        );
    }

    #[test]
    fn test_partial_line_waits_for_newline() {
        let sink = CollectSink::default();
        let records = Arc::clone(&sink.records);
        let mut guard = SinkGuard::new(sink);
        guard.write_all(b"2026-08-06 [INFO] (main) par").unwrap();
        assert!(records.lock().unwrap().is_empty());
        guard.write_all(b"tial\n").unwrap();
        assert_eq!(
            *records.lock().unwrap(),
            vec!["2026-08-06 [INFO] (main) partial\n".to_string()]
        );
    }

    #[test]
    fn test_sink_failure_reports_then_panics() {
        let diagnostics = SharedBuf::default();
        let mut guard =
            SinkGuard::with_diagnostics(BrokenSink, Box::new(diagnostics.clone()));

        let outcome = catch_unwind(AssertUnwindSafe(|| guard.write_all(b"doomed record\n")));
        assert!(outcome.is_err());

        let report = diagnostics.contents();
        let mut lines = report.lines();
        assert_eq!(lines.next(), Some("Exception in logging module:"));
        assert_eq!(lines.next(), Some("disk gone"));
    }

    #[test]
    fn test_flush_failure_is_fatal_too() {
        let diagnostics = SharedBuf::default();
        let mut guard =
            SinkGuard::with_diagnostics(BrokenSink, Box::new(diagnostics.clone()));

        let outcome = catch_unwind(AssertUnwindSafe(|| guard.flush()));
        assert!(outcome.is_err());
        assert!(diagnostics
            .contents()
            .starts_with("Exception in logging module:\n"));
    }

    #[test]
    fn test_healthy_sink_failure_path_untouched() {
        let sink = CollectSink::default();
        let records = Arc::clone(&sink.records);
        let diagnostics = SharedBuf::default();
        let mut guard = SinkGuard::with_diagnostics(sink, Box::new(diagnostics.clone()));

        guard.write_all(b"all good\n").unwrap();
        guard.flush().unwrap();

        assert_eq!(records.lock().unwrap().len(), 1);
        assert_eq!(diagnostics.contents(), "");
    }
}
