//! Error definitions
//!
//! This module provides the failure taxonomy for testkit-mock. None of these
//! errors travel back into the code under test: they are rendered and handed
//! to the session's [`FailureReporter`](crate::session::FailureReporter).

use std::time::Duration;

use thiserror::Error;

/// Main error type for testkit-mock
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No eligible expectation accepted the call.
    #[error("Unexpected call to `{mock}` with {args}")]
    UnexpectedCall {
        /// Label of the mock point.
        mock: String,
        /// Debug rendering of the arguments.
        args: String,
    },

    /// A non-throwing call resolved to an expectation configured to throw.
    #[error(
        "Usage misuse on `{mock}`: expectation `{expectation}` throws, \
         but the mock was invoked through its non-throwing form"
    )]
    UsageMisuse {
        /// Label of the mock point.
        mock: String,
        /// Label of the expectation that produced the error.
        expectation: String,
    },

    /// A value-returning call matched an expectation that has no action.
    #[error("Matched `{expectation}` on `{mock}` with {args} but no response configured")]
    MissingResponse {
        /// Label of the mock point.
        mock: String,
        /// Label of the expectation that matched.
        expectation: String,
        /// Debug rendering of the arguments.
        args: String,
    },

    /// Finite expectations that did not reach their call count in time.
    #[error("Unfulfilled expectations: {}", .expectations.join(", "))]
    Unfulfilled {
        /// Labels of every unfulfilled expectation.
        expectations: Vec<String>,
    },

    /// Never-expectations that were exercised.
    #[error("Inverted expectations were fulfilled: {}", .expectations.join(", "))]
    InvertedFulfilled {
        /// Labels of every fired inverted expectation.
        expectations: Vec<String>,
    },

    /// Expectations completed out of registration order.
    #[error("Expectation `{fulfilled_first}` was fulfilled before `{expected_first}`")]
    OrderViolation {
        /// The expectation registered first.
        expected_first: String,
        /// The later expectation that completed ahead of it.
        fulfilled_first: String,
    },

    /// Timeout error
    #[error("Waiting for expectations timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Create an unexpected-call error.
    #[must_use]
    pub fn unexpected_call(mock: impl Into<String>, args: impl Into<String>) -> Self {
        Self::UnexpectedCall {
            mock: mock.into(),
            args: args.into(),
        }
    }

    /// Create a usage-misuse error.
    #[must_use]
    pub fn usage_misuse(mock: impl Into<String>, expectation: impl Into<String>) -> Self {
        Self::UsageMisuse {
            mock: mock.into(),
            expectation: expectation.into(),
        }
    }

    /// Create a missing-response error.
    #[must_use]
    pub fn missing_response(
        mock: impl Into<String>,
        expectation: impl Into<String>,
        args: impl Into<String>,
    ) -> Self {
        Self::MissingResponse {
            mock: mock.into(),
            expectation: expectation.into(),
            args: args.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
