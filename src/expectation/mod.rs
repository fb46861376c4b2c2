//! Expectation records: matcher, call budget, response and captors.

mod action;

pub use action::{Action, IntoResponse};

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::captor::Capture;
use crate::matcher::Matcher;
use crate::token::ExpectationToken;

/// How many calls an expectation may absorb.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Times {
    /// Exactly `n` calls. `Exactly(0)` asserts the call never happens.
    Exactly(usize),
    /// Any number of calls; never waited for.
    Unlimited,
}

impl Times {
    /// A single call.
    #[must_use]
    pub fn once() -> Self {
        Self::Exactly(1)
    }

    /// Exactly `n` calls.
    #[must_use]
    pub fn exactly(n: usize) -> Self {
        Self::Exactly(n)
    }

    /// The call must not happen.
    #[must_use]
    pub fn never() -> Self {
        Self::Exactly(0)
    }

    /// Any number of calls.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::Unlimited
    }

    /// Whether this is the inverted `Exactly(0)` budget.
    #[must_use]
    pub fn is_never(self) -> bool {
        self == Self::Exactly(0)
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(0) => write!(f, "never"),
            Self::Exactly(1) => write!(f, "once"),
            Self::Exactly(n) => write!(f, "{n} times"),
            Self::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// What resolving a call against a registry produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<R, E> {
    /// The selected expectation returned a value.
    Returned {
        /// Label of the selected expectation.
        expectation: String,
        /// The value.
        value: R,
    },
    /// The selected expectation produced an error.
    Threw {
        /// Label of the selected expectation.
        expectation: String,
        /// The error.
        error: E,
    },
    /// The selected expectation has no response action.
    Void {
        /// Label of the selected expectation.
        expectation: String,
    },
    /// No eligible expectation accepted the arguments.
    Unexpected,
}

impl<R, E> Resolution<R, E> {
    /// Label of the expectation that handled the call, if any.
    #[must_use]
    pub fn expectation(&self) -> Option<&str> {
        match self {
            Self::Returned { expectation, .. }
            | Self::Threw { expectation, .. }
            | Self::Void { expectation } => Some(expectation),
            Self::Unexpected => None,
        }
    }

    /// Whether no expectation handled the call.
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Self::Unexpected)
    }
}

/// Point-in-time view of an expectation, for assertions and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectationInfo {
    /// Expectation label.
    pub description: String,
    /// Configured budget.
    pub times: Times,
    /// Calls still allowed; `None` when unlimited.
    pub remaining: Option<usize>,
    /// Calls this expectation has handled.
    pub calls: usize,
    /// Description of the matcher.
    pub matcher: String,
}

/// A registered rule: matcher, budget, response, captors and token.
///
/// `remaining` only ever goes down. Exhausted expectations stay in their
/// registry but are never selected again.
pub struct Expectation<A, R, E> {
    description: String,
    matcher: Box<dyn Matcher<A>>,
    times: Times,
    remaining: AtomicUsize,
    calls: AtomicUsize,
    action: Option<Action<A, R, E>>,
    captors: Vec<Box<dyn Capture<A>>>,
    token: Option<ExpectationToken>,
}

impl<A, R, E> Expectation<A, R, E> {
    pub(crate) fn new(
        description: String,
        matcher: Box<dyn Matcher<A>>,
        times: Times,
        action: Option<Action<A, R, E>>,
        captors: Vec<Box<dyn Capture<A>>>,
        token: Option<ExpectationToken>,
    ) -> Self {
        let budget = match times {
            Times::Exactly(n) => n,
            Times::Unlimited => usize::MAX,
        };
        Self {
            description,
            matcher,
            times,
            remaining: AtomicUsize::new(budget),
            calls: AtomicUsize::new(0),
            action,
            captors,
            token,
        }
    }

    /// Expectation label.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Configured budget.
    #[must_use]
    pub fn times(&self) -> Times {
        self.times
    }

    /// Calls still allowed; `None` when unlimited.
    #[must_use]
    pub fn remaining(&self) -> Option<usize> {
        match self.times {
            Times::Exactly(_) => Some(self.remaining.load(Ordering::SeqCst)),
            Times::Unlimited => None,
        }
    }

    /// Calls this expectation has handled.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether the full budget has been used. Unlimited and never
    /// expectations are always satisfied from the call-count point of view.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        match self.times {
            Times::Exactly(_) => self.remaining.load(Ordering::SeqCst) == 0,
            Times::Unlimited => true,
        }
    }

    /// Waitable token, absent for unlimited expectations.
    #[must_use]
    pub fn token(&self) -> Option<&ExpectationToken> {
        self.token.as_ref()
    }

    /// Snapshot for diagnostics.
    #[must_use]
    pub fn info(&self) -> ExpectationInfo {
        ExpectationInfo {
            description: self.description.clone(),
            times: self.times,
            remaining: self.remaining(),
            calls: self.calls(),
            matcher: self.matcher.describe(),
        }
    }

    pub(crate) fn accepts(&self, args: &A) -> bool {
        self.matcher.matches(args)
    }

    pub(crate) fn describe_mismatch(&self, args: &A) -> String {
        self.matcher.describe_mismatch(args)
    }

    /// Atomically takes one unit of budget. Fails once the budget is spent.
    pub(crate) fn try_consume(&self) -> bool {
        let consumed = match self.times {
            Times::Unlimited => true,
            Times::Exactly(_) => self
                .remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok(),
        };
        if consumed {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        consumed
    }

    /// Called when the matcher accepted a call but the budget was spent.
    /// Only inverted expectations react: their token records the violation.
    pub(crate) fn on_exhausted_match(&self) {
        if self.times.is_never() {
            if let Some(token) = &self.token {
                tracing::debug!(expectation = %self.description, "never-expectation exercised");
                token.fulfill();
            }
        }
    }

    /// Runs captors (own, then `default_captor`), signals the token, then
    /// performs the response.
    pub(crate) fn fulfill_with(
        &self,
        args: &A,
        default_captor: Option<&dyn Capture<A>>,
    ) -> Resolution<R, E>
    where
        R: Clone,
        E: Clone,
    {
        for captor in &self.captors {
            captor.capture(args);
        }
        if let Some(captor) = default_captor {
            captor.capture(args);
        }
        if let Some(token) = &self.token {
            token.fulfill();
        }
        let expectation = self.description.clone();
        match &self.action {
            None => Resolution::Void { expectation },
            Some(action) => match action.perform_on(args) {
                Ok(value) => Resolution::Returned { expectation, value },
                Err(error) => Resolution::Threw { expectation, error },
            },
        }
    }
}

impl<A, R, E> fmt::Debug for Expectation<A, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("description", &self.description)
            .field("matcher", &self.matcher.describe())
            .field("times", &self.times)
            .field("remaining", &self.remaining())
            .field("calls", &self.calls())
            .finish()
    }
}
