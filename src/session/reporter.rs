//! Failure sinks.

use std::fmt;
use std::panic::Location;

/// A test failure raised by a mock, a wait, or the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Name of the test that owns the session.
    pub test: String,
    /// Rendered failure message.
    pub message: String,
    /// Where the failing call or wait happened.
    pub location: Option<&'static Location<'static>>,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.test, self.message)?;
        if let Some(location) = self.location {
            write!(f, " (at {location})")?;
        }
        Ok(())
    }
}

/// Where failures go as they happen.
///
/// The session records every failure regardless of the reporter, so the
/// reporter decides only about *immediate* reaction.
pub trait FailureReporter: Send + Sync {
    /// Handle one failure.
    fn report(&self, failure: &Failure);
}

impl<F> FailureReporter for F
where
    F: Fn(&Failure) + Send + Sync,
{
    fn report(&self, failure: &Failure) {
        self(failure);
    }
}

/// Logs failures at `error` level. Recorded failures fail the test when the
/// session ends.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, failure: &Failure) {
        tracing::error!(test = %failure.test, location = ?failure.location, "{}", failure.message);
    }
}

/// Panics on the reporting thread as soon as a failure happens.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicReporter;

impl FailureReporter for PanicReporter {
    fn report(&self, failure: &Failure) {
        panic!("{failure}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_with_location() {
        let failure = Failure {
            test: "my_test".into(),
            message: "boom".into(),
            location: Some(Location::caller()),
        };
        let text = failure.to_string();
        assert!(text.starts_with("[my_test] boom (at "));
        assert!(text.contains("reporter.rs"));
    }

    #[test]
    #[should_panic(expected = "[t] bad")]
    fn test_panic_reporter() {
        PanicReporter.report(&Failure {
            test: "t".into(),
            message: "bad".into(),
            location: None,
        });
    }

    #[test]
    fn test_closure_reporter() {
        let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = {
            let seen = std::sync::Arc::clone(&seen);
            move |failure: &Failure| seen.lock().push(failure.message.clone())
        };
        sink.report(&Failure {
            test: "t".into(),
            message: "noted".into(),
            location: None,
        });
        assert_eq!(*seen.lock(), vec!["noted".to_string()]);
    }
}
