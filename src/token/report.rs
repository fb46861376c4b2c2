//! Outcome of waiting on a token batch.

use std::time::Duration;

use crate::error::Error;

/// Coarse classification of a wait, most severe first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Every token settled in its desired state.
    Completed,
    /// An inverted token was signalled.
    InvertedFulfilled,
    /// Positive tokens were still unfulfilled at the deadline.
    TimedOut,
    /// Tokens completed out of creation order.
    OrderViolated,
}

/// Detailed result of [`TokenBatch::wait`](super::TokenBatch::wait).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitReport {
    /// Labels of positive tokens short of their count.
    pub unfulfilled: Vec<String>,
    /// Labels of inverted tokens that were signalled.
    pub inverted_fulfilled: Vec<String>,
    /// `(registered first, completed first)` when order was enforced and broken.
    pub order_violation: Option<(String, String)>,
    /// Whether the deadline passed with positive tokens outstanding.
    pub timed_out: bool,
    /// Time spent waiting.
    pub elapsed: Duration,
}

impl WaitReport {
    /// Classifies the report.
    #[must_use]
    pub fn outcome(&self) -> WaitOutcome {
        if !self.inverted_fulfilled.is_empty() {
            WaitOutcome::InvertedFulfilled
        } else if self.timed_out || !self.unfulfilled.is_empty() {
            WaitOutcome::TimedOut
        } else if self.order_violation.is_some() {
            WaitOutcome::OrderViolated
        } else {
            WaitOutcome::Completed
        }
    }

    /// Whether the wait completed without any failure.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome() == WaitOutcome::Completed
    }

    /// Every failure in the report, one error per failure kind.
    #[must_use]
    pub fn errors(&self, timeout: Duration) -> Vec<Error> {
        let mut errors = Vec::new();
        if !self.unfulfilled.is_empty() {
            errors.push(Error::Unfulfilled {
                expectations: self.unfulfilled.clone(),
            });
        }
        if !self.inverted_fulfilled.is_empty() {
            errors.push(Error::InvertedFulfilled {
                expectations: self.inverted_fulfilled.clone(),
            });
        }
        if let Some((expected_first, fulfilled_first)) = &self.order_violation {
            errors.push(Error::OrderViolation {
                expected_first: expected_first.clone(),
                fulfilled_first: fulfilled_first.clone(),
            });
        }
        if self.timed_out && errors.is_empty() {
            errors.push(Error::Timeout(timeout));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> WaitReport {
        WaitReport {
            unfulfilled: Vec::new(),
            inverted_fulfilled: Vec::new(),
            order_violation: None,
            timed_out: false,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_clean_report_is_success() {
        let r = report();
        assert_eq!(r.outcome(), WaitOutcome::Completed);
        assert!(r.errors(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_inverted_takes_precedence() {
        let r = WaitReport {
            unfulfilled: vec!["a".into()],
            inverted_fulfilled: vec!["never".into()],
            timed_out: true,
            ..report()
        };
        assert_eq!(r.outcome(), WaitOutcome::InvertedFulfilled);
        assert_eq!(r.errors(Duration::from_secs(1)).len(), 2);
    }

    #[test]
    fn test_order_violation_error() {
        let r = WaitReport {
            order_violation: Some(("a".into(), "b".into())),
            ..report()
        };
        assert_eq!(r.outcome(), WaitOutcome::OrderViolated);
        assert_eq!(
            r.errors(Duration::from_secs(1)),
            vec![Error::OrderViolation {
                expected_first: "a".into(),
                fulfilled_first: "b".into(),
            }]
        );
    }
}
