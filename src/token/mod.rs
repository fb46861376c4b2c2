//! Waitable expectation tokens.
//!
//! Every finite expectation registers an [`ExpectationToken`] in its
//! session's [`ExpectationPool`]. The registry signals the token each time
//! the expectation is selected; [`ExpectationPool::drain`] takes the pending
//! tokens as a [`TokenBatch`] and [`TokenBatch::wait`] blocks until the batch
//! settles or the timeout elapses.
//!
//! Tokens for `Times::Exactly(0)` are *inverted*: a single signal turns the
//! wait into a failure.
//!
//! ```rust
//! use std::time::Duration;
//! use testkit_mock::token::ExpectationPool;
//!
//! let pool = ExpectationPool::new();
//! let token = pool.create_token("ping", 2);
//!
//! token.fulfill();
//! token.fulfill();
//!
//! let report = pool.drain().wait(Duration::from_millis(10), false);
//! assert!(report.is_success());
//! ```

mod report;

pub use report::{WaitOutcome, WaitReport};

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Wake-up channel shared by a pool and all of its tokens.
#[derive(Default)]
struct Signal {
    state: Mutex<SignalState>,
    condvar: Condvar,
}

#[derive(Default)]
struct SignalState {
    /// Serial handed to the next token created.
    next_serial: u64,
    /// Sequence number handed to the next token that completes.
    next_completion: u64,
}

/// A handle signalled when its expectation is exercised.
#[derive(Clone)]
pub struct ExpectationToken {
    inner: Arc<TokenInner>,
}

struct TokenInner {
    description: String,
    expected: usize,
    inverted: bool,
    serial: u64,
    state: Mutex<TokenState>,
    signal: Arc<Signal>,
}

#[derive(Default)]
struct TokenState {
    fulfilled: usize,
    completed_at: Option<u64>,
}

impl ExpectationToken {
    /// Label of the expectation this token belongs to.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.inner.description
    }

    /// Number of signals needed to satisfy the token (0 for inverted tokens).
    #[must_use]
    pub fn expected(&self) -> usize {
        self.inner.expected
    }

    /// Whether any signal counts as a failure.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inner.inverted
    }

    /// Number of signals received so far.
    #[must_use]
    pub fn fulfilled(&self) -> usize {
        self.inner.state.lock().fulfilled
    }

    /// Whether the token is in its desired state: fully signalled, or never
    /// signalled for inverted tokens.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        let fulfilled = self.fulfilled();
        if self.inner.inverted {
            fulfilled == 0
        } else {
            fulfilled >= self.inner.expected
        }
    }

    /// Signals the token once and wakes any waiter.
    pub fn fulfill(&self) {
        let mut signal = self.inner.signal.state.lock();
        {
            let mut state = self.inner.state.lock();
            state.fulfilled += 1;
            if !self.inner.inverted
                && state.completed_at.is_none()
                && state.fulfilled >= self.inner.expected
            {
                state.completed_at = Some(signal.next_completion);
                signal.next_completion += 1;
            }
            tracing::trace!(
                expectation = %self.inner.description,
                fulfilled = state.fulfilled,
                expected = self.inner.expected,
                inverted = self.inner.inverted,
                "token signalled"
            );
        }
        drop(signal);
        self.inner.signal.condvar.notify_all();
    }

    fn serial(&self) -> u64 {
        self.inner.serial
    }

    fn completed_at(&self) -> Option<u64> {
        self.inner.state.lock().completed_at
    }
}

impl std::fmt::Debug for ExpectationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpectationToken")
            .field("description", &self.inner.description)
            .field("expected", &self.inner.expected)
            .field("inverted", &self.inner.inverted)
            .field("fulfilled", &self.fulfilled())
            .finish()
    }
}

/// Collection of outstanding tokens, drained by each wait.
#[derive(Clone, Default)]
pub struct ExpectationPool {
    inner: Arc<PoolInner>,
}

#[derive(Default)]
struct PoolInner {
    pending: Mutex<Vec<ExpectationToken>>,
    signal: Arc<Signal>,
}

impl ExpectationPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token that needs `expected` signals.
    pub fn create_token(&self, description: impl Into<String>, expected: usize) -> ExpectationToken {
        self.register(description.into(), expected, false)
    }

    /// Registers an inverted token: it must never be signalled.
    pub fn create_inverted_token(&self, description: impl Into<String>) -> ExpectationToken {
        self.register(description.into(), 0, true)
    }

    fn register(&self, description: String, expected: usize, inverted: bool) -> ExpectationToken {
        // Serial allocation and the push happen under the pending lock so
        // pool order always equals creation order.
        let mut pending = self.inner.pending.lock();
        let serial = {
            let mut signal = self.inner.signal.state.lock();
            let serial = signal.next_serial;
            signal.next_serial += 1;
            serial
        };
        let token = ExpectationToken {
            inner: Arc::new(TokenInner {
                description,
                expected,
                inverted,
                serial,
                state: Mutex::new(TokenState::default()),
                signal: Arc::clone(&self.inner.signal),
            }),
        };
        pending.push(token.clone());
        token
    }

    /// Number of tokens waiting to be drained.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Moves every pending token out of the pool. Tokens created afterwards
    /// start a fresh batch.
    #[must_use]
    pub fn drain(&self) -> TokenBatch {
        let tokens = std::mem::take(&mut *self.inner.pending.lock());
        TokenBatch {
            tokens,
            signal: Arc::clone(&self.inner.signal),
        }
    }
}

impl std::fmt::Debug for ExpectationPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpectationPool")
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Tokens drained from a pool, waited on together.
#[derive(Clone)]
pub struct TokenBatch {
    tokens: Vec<ExpectationToken>,
    signal: Arc<Signal>,
}

impl TokenBatch {
    /// Tokens in creation order.
    #[must_use]
    pub fn tokens(&self) -> &[ExpectationToken] {
        &self.tokens
    }

    /// Whether the batch holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Blocks until every positive token is satisfied, an inverted token
    /// fires, or `timeout` elapses.
    ///
    /// A batch made only of inverted tokens always waits the full timeout:
    /// success there means nothing fired during the window. A timeout too
    /// large to represent as a deadline (such as `Duration::MAX`) waits
    /// without limit.
    #[must_use]
    pub fn wait(&self, timeout: Duration, enforce_order: bool) -> WaitReport {
        let started = Instant::now();
        // `None` when the timeout does not fit in an `Instant`: wait unbounded.
        let deadline = started.checked_add(timeout);
        let has_positive = self.tokens.iter().any(|t| !t.is_inverted());
        let mut timed_out = false;

        let mut guard = self.signal.state.lock();
        loop {
            let inverted_fired = self
                .tokens
                .iter()
                .any(|t| t.is_inverted() && !t.is_satisfied());
            let positive_done = self
                .tokens
                .iter()
                .filter(|t| !t.is_inverted())
                .all(ExpectationToken::is_satisfied);

            if self.tokens.is_empty() || inverted_fired || (has_positive && positive_done) {
                break;
            }
            let expired = match deadline {
                Some(deadline) => self.signal.condvar.wait_until(&mut guard, deadline).timed_out(),
                None => {
                    self.signal.condvar.wait(&mut guard);
                    false
                }
            };
            if expired {
                // Positive tokens still short at the deadline make this a timeout;
                // an inverted-only batch simply ran its window.
                timed_out = has_positive
                    && !self
                        .tokens
                        .iter()
                        .filter(|t| !t.is_inverted())
                        .all(ExpectationToken::is_satisfied);
                break;
            }
        }
        drop(guard);

        let report = self.report(timed_out, enforce_order, started.elapsed());
        tracing::debug!(
            tokens = self.tokens.len(),
            outcome = ?report.outcome(),
            elapsed = ?report.elapsed,
            "expectation wait finished"
        );
        report
    }

    /// Builds a report from the current token states without waiting.
    #[must_use]
    pub fn report(&self, timed_out: bool, enforce_order: bool, elapsed: Duration) -> WaitReport {
        let unfulfilled = self
            .tokens
            .iter()
            .filter(|t| !t.is_inverted() && !t.is_satisfied())
            .map(|t| t.description().to_string())
            .collect();
        let inverted_fulfilled = self
            .tokens
            .iter()
            .filter(|t| t.is_inverted() && !t.is_satisfied())
            .map(|t| t.description().to_string())
            .collect();
        let order_violation = if enforce_order {
            self.first_order_violation()
        } else {
            None
        };

        WaitReport {
            unfulfilled,
            inverted_fulfilled,
            order_violation,
            timed_out,
            elapsed,
        }
    }

    /// Walks completed positive tokens in creation order and returns the
    /// first `(registered earlier, completed earlier)` pair that completed
    /// the other way round.
    fn first_order_violation(&self) -> Option<(String, String)> {
        let mut completed: Vec<(&ExpectationToken, u64)> = self
            .tokens
            .iter()
            .filter(|t| !t.is_inverted())
            .filter_map(|t| t.completed_at().map(|at| (t, at)))
            .collect();
        completed.sort_by_key(|(t, _)| t.serial());

        let mut latest: Option<(&ExpectationToken, u64)> = None;
        for (token, at) in completed {
            if let Some((earlier, earlier_at)) = latest {
                if at < earlier_at {
                    return Some((
                        earlier.description().to_string(),
                        token.description().to_string(),
                    ));
                }
            }
            if latest.map_or(true, |(_, latest_at)| at > latest_at) {
                latest = Some((token, at));
            }
        }
        None
    }
}

impl std::fmt::Debug for TokenBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBatch")
            .field("tokens", &self.tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const SHORT: Duration = Duration::from_millis(20);

    #[test]
    fn test_token_counts_signals() {
        let pool = ExpectationPool::new();
        let token = pool.create_token("e1", 2);
        assert!(!token.is_satisfied());
        token.fulfill();
        assert_eq!(token.fulfilled(), 1);
        token.fulfill();
        assert!(token.is_satisfied());
    }

    #[test]
    fn test_drain_resets_pool() {
        let pool = ExpectationPool::new();
        let _a = pool.create_token("a", 1);
        let _b = pool.create_token("b", 1);
        assert_eq!(pool.pending_count(), 2);

        let batch = pool.drain();
        assert_eq!(batch.tokens().len(), 2);
        assert_eq!(pool.pending_count(), 0);

        let _c = pool.create_token("c", 1);
        assert_eq!(pool.drain().tokens()[0].description(), "c");
    }

    #[test]
    fn test_wait_on_empty_batch_succeeds_immediately() {
        let pool = ExpectationPool::new();
        let report = pool.drain().wait(Duration::from_secs(5), true);
        assert!(report.is_success());
        assert!(report.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_wait_times_out_with_unfulfilled_labels() {
        let pool = ExpectationPool::new();
        let done = pool.create_token("done", 1);
        let _missing = pool.create_token("missing", 2);
        done.fulfill();

        let report = pool.drain().wait(SHORT, false);
        assert_eq!(report.outcome(), WaitOutcome::TimedOut);
        assert_eq!(report.unfulfilled, vec!["missing".to_string()]);
    }

    #[test]
    fn test_wait_wakes_on_signal_from_other_thread() {
        let pool = ExpectationPool::new();
        let token = pool.create_token("async", 1);
        let batch = pool.drain();

        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            token.fulfill();
        });

        let report = batch.wait(Duration::from_secs(5), false);
        worker.join().unwrap();
        assert!(report.is_success());
        assert!(report.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_inverted_token_untouched_succeeds() {
        let pool = ExpectationPool::new();
        let _never = pool.create_inverted_token("never");
        let report = pool.drain().wait(SHORT, false);
        assert!(report.is_success());
        assert!(report.elapsed >= SHORT);
    }

    #[test]
    fn test_inverted_token_fired_fails() {
        let pool = ExpectationPool::new();
        let never = pool.create_inverted_token("never");
        let _pending = pool.create_token("pending", 1);
        never.fulfill();

        let report = pool.drain().wait(Duration::from_secs(5), false);
        assert_eq!(report.outcome(), WaitOutcome::InvertedFulfilled);
        assert_eq!(report.inverted_fulfilled, vec!["never".to_string()]);
        assert!(report.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_order_violation_detected() {
        let pool = ExpectationPool::new();
        let first = pool.create_token("first", 1);
        let second = pool.create_token("second", 1);
        second.fulfill();
        first.fulfill();

        let batch = pool.drain();
        let report = batch.wait(SHORT, true);
        assert_eq!(report.outcome(), WaitOutcome::OrderViolated);
        assert_eq!(
            report.order_violation,
            Some(("first".to_string(), "second".to_string()))
        );

        let relaxed = batch.wait(SHORT, false);
        assert!(relaxed.is_success());
    }

    #[test]
    fn test_completion_order_uses_final_signal() {
        let pool = ExpectationPool::new();
        let first = pool.create_token("first", 2);
        let second = pool.create_token("second", 1);
        first.fulfill();
        second.fulfill();
        first.fulfill();

        // `first` completes on its second signal, after `second`.
        let report = pool.drain().wait(SHORT, true);
        assert_eq!(report.outcome(), WaitOutcome::OrderViolated);

        let pool = ExpectationPool::new();
        let first = pool.create_token("first", 1);
        let second = pool.create_token("second", 1);
        first.fulfill();
        second.fulfill();
        assert!(pool.drain().wait(SHORT, true).is_success());
    }

    #[test]
    fn test_unbounded_timeout_on_satisfied_batch() {
        let pool = ExpectationPool::new();
        let token = pool.create_token("done", 1);
        token.fulfill();

        let report = pool.drain().wait(Duration::MAX, false);
        assert!(report.is_success());
        assert!(!report.timed_out);
    }

    #[test]
    fn test_unbounded_timeout_wakes_on_signal() {
        let pool = ExpectationPool::new();
        let token = pool.create_token("later", 1);
        let batch = pool.drain();

        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            token.fulfill();
        });
        assert!(batch.wait(Duration::MAX, false).is_success());
        worker.join().unwrap();
    }
}
