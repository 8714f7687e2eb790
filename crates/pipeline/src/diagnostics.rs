//! Reporting of background failures.
//!
//! Errors raised outside any API call (a reader failing to decode a record, a
//! pump dropping a row, a sink writer losing its connection) are handed to the
//! pipeline's [`ErrorSink`].

use crate::error::{Error, ErrorKind};
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Receives errors raised by background tasks.
pub trait ErrorSink: Send + Sync {
    /// Reports `error`, raised by the object named `origin`.
    fn report(&self, origin: &str, error: &Error);
}

/// Logs every reported error through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, origin: &str, error: &Error) {
        tracing::error!(origin = %origin, kind = ?error.kind(), "{}", error);
    }
}

/// A reported error, as kept by [`CollectingErrorSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportedError {
    pub origin: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Keeps every reported error in memory.
#[derive(Debug, Default)]
pub struct CollectingErrorSink {
    errors: Mutex<Vec<ReportedError>>,
    reported: Condvar,
}

impl CollectingErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the errors reported so far.
    pub fn errors(&self) -> Vec<ReportedError> {
        self.errors.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns the errors reported so far.
    pub fn take(&self) -> Vec<ReportedError> {
        std::mem::take(&mut *self.errors.lock())
    }

    /// Waits until at least `count` errors were reported. Returns false on
    /// timeout.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut errors = self.errors.lock();
        while errors.len() < count {
            if self.reported.wait_until(&mut errors, deadline).timed_out() {
                return errors.len() >= count;
            }
        }
        true
    }
}

impl ErrorSink for CollectingErrorSink {
    fn report(&self, origin: &str, error: &Error) {
        self.errors.lock().push(ReportedError {
            origin: origin.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        });
        self.reported.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingErrorSink::new();
        assert!(sink.is_empty());
        sink.report("c_to_f", &Error::Evaluation(sluice_core::Error::DivisionByZero));
        assert_eq!(
            sink.errors(),
            vec![ReportedError {
                origin: "c_to_f".into(),
                kind: ErrorKind::Evaluation,
                message: "evaluation failed: Division by zero".into(),
            }]
        );
        assert_eq!(sink.take().len(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_wait_for() {
        let sink = Arc::new(CollectingErrorSink::new());
        assert!(!sink.wait_for(1, Duration::from_millis(10)));

        let reporter = {
            let sink = Arc::clone(&sink);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                sink.report("r", &Error::PipelineClosed);
            })
        };
        assert!(sink.wait_for(1, Duration::from_secs(5)));
        reporter.join().unwrap();
    }

    #[test]
    fn test_tracing_sink_is_object_safe() {
        let sink: Arc<dyn ErrorSink> = Arc::new(TracingErrorSink);
        sink.report("r", &Error::PipelineClosed);
    }
}
