//! Test sessions: the explicit context every mock point reports into.
//!
//! A [`Session`] bundles what a mock needs from the surrounding test: the
//! test's name, its [`Config`], the [`ExpectationPool`] that waits drain, and
//! the [`FailureReporter`] failures are sent to. Every failure is also
//! recorded; a session that still holds unacknowledged failures when
//! [`Session::end_test`] runs (or when its last handle is dropped) panics,
//! which is what fails the test.
//!
//! ```rust
//! use testkit_mock::expectation::Action;
//! use testkit_mock::mock::MethodMock;
//! use testkit_mock::session::Session;
//!
//! let session = Session::new("greets_once");
//! let greet = MethodMock::<&str, String>::new(&session, "greet");
//!
//! greet
//!     .expect("hello ada")
//!     .with_value("ada")
//!     .will_once(Action::Return("hello".to_string()))
//!     .commit();
//!
//! assert_eq!(greet.call("ada"), Some("hello".to_string()));
//! assert!(session.wait_for_expectations());
//! session.end_test();
//! ```

mod reporter;

pub use reporter::{Failure, FailureReporter, PanicReporter, TracingReporter};

use std::future::Future;
use std::panic::Location;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use futures::channel::oneshot;
use parking_lot::{Mutex, RwLock};

use crate::config::{Config, UnexpectedCall, UnexpectedCallPolicy};
use crate::error::Error;
use crate::token::{ExpectationPool, WaitReport};

/// Per-test context shared by every mock point created from it.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    test_name: RwLock<String>,
    config: RwLock<Config>,
    pool: ExpectationPool,
    reporter: Arc<dyn FailureReporter>,
    failures: Mutex<Vec<Failure>>,
}

impl Session {
    /// Creates a session that logs failures and fails the test at its end.
    #[must_use]
    pub fn new(test_name: impl Into<String>) -> Self {
        Self::with_reporter(test_name, TracingReporter)
    }

    /// Creates a session with a custom failure reporter.
    #[must_use]
    pub fn with_reporter(
        test_name: impl Into<String>,
        reporter: impl FailureReporter + 'static,
    ) -> Self {
        let test_name = test_name.into();
        tracing::info!(test = %test_name, "mock session started");
        Self {
            inner: Arc::new(SessionInner {
                test_name: RwLock::new(test_name),
                config: RwLock::new(Config::default()),
                pool: ExpectationPool::new(),
                reporter: Arc::new(reporter),
                failures: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Identity of the current test.
    #[must_use]
    pub fn test_name(&self) -> String {
        self.inner.test_name.read().clone()
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        self.inner.config.read().clone()
    }

    /// Replaces the configuration until the next test boundary.
    pub fn configure(&self, config: Config) {
        *self.inner.config.write() = config;
    }

    /// Pool receiving the tokens of this session's expectations.
    #[must_use]
    pub fn pool(&self) -> &ExpectationPool {
        &self.inner.pool
    }

    /// Test-start hook: adopts `test_name`, resets the configuration and
    /// discards tokens left over from a previous test.
    pub fn start_test(&self, test_name: impl Into<String>) {
        let test_name = test_name.into();
        tracing::info!(test = %test_name, "test started");
        *self.inner.test_name.write() = test_name;
        *self.inner.config.write() = Config::default();
        let stale = self.inner.pool.drain();
        if !stale.is_empty() {
            tracing::debug!(tokens = stale.tokens().len(), "discarded stale expectation tokens");
        }
    }

    /// Test-end hook: verifies tokens nobody waited for, resets the
    /// configuration and fails the test if any failure was recorded.
    ///
    /// # Panics
    ///
    /// Panics listing every recorded failure.
    #[track_caller]
    pub fn end_test(&self) {
        let location = Location::caller();
        if self.inner.pool.pending_count() > 0 {
            let enforce_order = self.inner.config.read().enforce_order;
            let report = self.inner.pool.drain().wait(Duration::ZERO, enforce_order);
            self.settle(&report, Duration::ZERO, location);
        }
        *self.inner.config.write() = Config::default();
        tracing::info!(test = %self.test_name(), "test ended");
        self.assert_no_failures();
    }

    /// Records a failure and forwards it to the reporter.
    pub fn report_failure(
        &self,
        message: impl Into<String>,
        location: Option<&'static Location<'static>>,
    ) {
        let failure = Failure {
            test: self.test_name(),
            message: message.into(),
            location,
        };
        self.inner.failures.lock().push(failure.clone());
        self.inner.reporter.report(&failure);
    }

    pub(crate) fn report_error(&self, error: &Error, location: &'static Location<'static>) {
        self.report_failure(error.to_string(), Some(location));
    }

    /// Applies the unexpected-call policy.
    pub(crate) fn unexpected_call(
        &self,
        mock: &str,
        args: String,
        location: &'static Location<'static>,
    ) {
        let error = Error::unexpected_call(mock, args.clone());
        self.apply_policy(&error, mock, args, None, location);
    }

    /// Applies the unexpected-call policy to a call that matched an
    /// expectation without an action while the caller needs a value.
    pub(crate) fn missing_response(
        &self,
        mock: &str,
        expectation: &str,
        args: String,
        location: &'static Location<'static>,
    ) {
        let error = Error::missing_response(mock, expectation, args.clone());
        self.apply_policy(&error, mock, args, Some(expectation.to_string()), location);
    }

    fn apply_policy(
        &self,
        error: &Error,
        mock: &str,
        args: String,
        expectation: Option<String>,
        location: &'static Location<'static>,
    ) {
        let policy = self.inner.config.read().unexpected_call.clone();
        match policy {
            UnexpectedCallPolicy::Warn => {
                tracing::warn!(mock, args = %args, %location, "{error}");
            }
            UnexpectedCallPolicy::Fail => self.report_error(error, location),
            UnexpectedCallPolicy::Custom(handler) => handler(&UnexpectedCall {
                test: self.test_name(),
                mock: mock.to_string(),
                args,
                expectation,
                location,
            }),
        }
    }

    /// Waits on every token registered since the last wait, using the
    /// configured timeout and ordering, and reports what went wrong.
    ///
    /// A batch holding both positive and never-expectations returns as soon
    /// as the positive ones are satisfied. The batch leaves the pool, so a
    /// never-expectation hit after that goes unnoticed, even by
    /// [`end_test`](Self::end_test). Wait for never-expectations in a batch
    /// of their own when later hits must be caught.
    #[track_caller]
    pub fn wait_for_expectations(&self) -> bool {
        let config = self.config();
        self.wait_inner(config.default_timeout, config.enforce_order, Location::caller())
    }

    /// Like [`wait_for_expectations`](Self::wait_for_expectations) with an
    /// explicit timeout and ordering mode.
    #[track_caller]
    pub fn wait_for_expectations_with(&self, timeout: Duration, enforce_order: bool) -> bool {
        self.wait_inner(timeout, enforce_order, Location::caller())
    }

    /// Waits without reporting and hands back the detailed result.
    #[must_use]
    pub fn wait_report(&self, timeout: Duration, enforce_order: bool) -> WaitReport {
        self.inner.pool.drain().wait(timeout, enforce_order)
    }

    /// Async form of [`wait_for_expectations`](Self::wait_for_expectations).
    ///
    /// The pool is drained immediately; the blocking wait runs on a helper
    /// thread so the calling executor stays free to drive the code under test.
    #[track_caller]
    pub fn wait_for_expectations_async(
        &self,
        timeout: Option<Duration>,
    ) -> impl Future<Output = bool> + Send + 'static {
        let location = Location::caller();
        let config = self.config();
        let timeout = timeout.unwrap_or(config.default_timeout);
        let enforce_order = config.enforce_order;

        let batch = self.inner.pool.drain();
        let fallback = batch.clone();
        let (tx, rx) = oneshot::channel();
        let spawned = thread::Builder::new()
            .name("testkit-mock-wait".into())
            .spawn(move || {
                let _ = tx.send(batch.wait(timeout, enforce_order));
            });
        if let Err(err) = spawned {
            tracing::error!(error = %err, "could not spawn expectation waiter");
        }

        let session = self.clone();
        async move {
            let report = match rx.await {
                Ok(report) => report,
                Err(oneshot::Canceled) => fallback.report(true, enforce_order, timeout),
            };
            session.settle(&report, timeout, location)
        }
    }

    fn wait_inner(
        &self,
        timeout: Duration,
        enforce_order: bool,
        location: &'static Location<'static>,
    ) -> bool {
        let report = self.inner.pool.drain().wait(timeout, enforce_order);
        self.settle(&report, timeout, location)
    }

    fn settle(
        &self,
        report: &WaitReport,
        timeout: Duration,
        location: &'static Location<'static>,
    ) -> bool {
        for error in report.errors(timeout) {
            self.report_error(&error, location);
        }
        tracing::info!(
            test = %self.test_name(),
            outcome = ?report.outcome(),
            elapsed = ?report.elapsed,
            "expectations waited"
        );
        report.is_success()
    }

    /// Snapshot of recorded failures.
    #[must_use]
    pub fn failures(&self) -> Vec<Failure> {
        self.inner.failures.lock().clone()
    }

    /// Removes and returns recorded failures, acknowledging them.
    pub fn take_failures(&self) -> Vec<Failure> {
        std::mem::take(&mut *self.inner.failures.lock())
    }

    /// Panics if any failure was recorded.
    ///
    /// # Panics
    ///
    /// Panics listing every recorded failure; the failures are acknowledged
    /// first so the session's drop check does not fire again.
    pub fn assert_no_failures(&self) {
        let failures = self.take_failures();
        if !failures.is_empty() {
            panic!("{}", render_failures(&failures));
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("test_name", &*self.inner.test_name.read())
            .field("config", &*self.inner.config.read())
            .field("pool", &self.inner.pool)
            .field("failures", &self.inner.failures.lock().len())
            .finish()
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        let failures = std::mem::take(self.failures.get_mut());
        if !failures.is_empty() && !thread::panicking() {
            panic!("{}", render_failures(&failures));
        }
    }
}

fn render_failures(failures: &[Failure]) -> String {
    let lines: Vec<String> = failures.iter().map(|f| format!("  - {f}")).collect();
    format!(
        "{} mock failure(s) recorded:\n{}",
        failures.len(),
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_failure_records_and_forwards() {
        let forwarded = Arc::new(Mutex::new(0));
        let session = Session::with_reporter("t", {
            let forwarded = Arc::clone(&forwarded);
            move |_: &Failure| *forwarded.lock() += 1
        });

        session.report_failure("first", None);
        assert_eq!(*forwarded.lock(), 1);
        assert_eq!(session.failures().len(), 1);
        assert_eq!(session.take_failures()[0].message, "first");
        assert!(session.failures().is_empty());
    }

    #[test]
    fn test_unexpected_call_policies() {
        let session = Session::new("policies");
        session.configure(Config::default().with_unexpected_call(UnexpectedCallPolicy::Warn));
        session.unexpected_call("m", "(1,)".into(), Location::caller());
        assert!(session.failures().is_empty());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler_seen = Arc::clone(&seen);
        session.configure(Config::default().with_unexpected_call(UnexpectedCallPolicy::custom(
            move |call| handler_seen.lock().push(call.mock.clone()),
        )));
        session.unexpected_call("custom", "()".into(), Location::caller());
        assert_eq!(*seen.lock(), vec!["custom".to_string()]);
        assert!(session.failures().is_empty());

        session.configure(Config::default());
        session.unexpected_call("m", "(2,)".into(), Location::caller());
        let failures = session.take_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "Unexpected call to `m` with (2,)");
        assert_eq!(failures[0].test, "policies");
    }

    #[test]
    fn test_missing_response_follows_policy() {
        let session = Session::new("missing");
        session.missing_response("m", "e1", "1".into(), Location::caller());
        let failures = session.take_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].message,
            "Matched `e1` on `m` with 1 but no response configured"
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler_seen = Arc::clone(&seen);
        session.configure(Config::default().with_unexpected_call(UnexpectedCallPolicy::custom(
            move |call| handler_seen.lock().push(call.expectation.clone()),
        )));
        session.missing_response("m", "e2", "2".into(), Location::caller());
        session.unexpected_call("m", "3".into(), Location::caller());
        assert_eq!(*seen.lock(), vec![Some("e2".to_string()), None]);
        assert!(session.failures().is_empty());
    }

    #[test]
    fn test_start_test_resets_state() {
        let session = Session::new("first");
        session.configure(Config::default().with_enforce_order(true));
        let _token = session.pool().create_token("stale", 1);

        session.start_test("second");
        assert_eq!(session.test_name(), "second");
        assert!(!session.config().enforce_order);
        assert_eq!(session.pool().pending_count(), 0);
    }

    #[test]
    fn test_wait_reports_unfulfilled() {
        let session = Session::new("waits");
        let _token = session.pool().create_token("never called", 1);

        assert!(!session.wait_for_expectations_with(Duration::from_millis(10), false));
        let failures = session.take_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "Unfulfilled expectations: never called");
    }

    #[test]
    #[should_panic(expected = "1 mock failure(s) recorded")]
    fn test_end_test_panics_on_failures() {
        let session = Session::new("ends");
        let _token = session.pool().create_token("missing", 1);
        session.end_test();
    }

    #[test]
    #[should_panic(expected = "mock failure(s) recorded")]
    fn test_drop_panics_on_unacknowledged_failures() {
        let session = Session::new("dropped");
        session.report_failure("left behind", None);
        drop(session);
    }

    #[test]
    fn test_async_wait() {
        let session = Session::new("async");
        let token = session.pool().create_token("later", 1);
        let wait = session.wait_for_expectations_async(Some(Duration::from_secs(5)));

        let worker = thread::spawn(move || token.fulfill());
        assert!(futures::executor::block_on(wait));
        worker.join().unwrap();
        assert!(session.failures().is_empty());
    }
}
