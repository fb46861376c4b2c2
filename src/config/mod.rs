//! Per-session configuration.

use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

/// Details handed to a custom unexpected-call handler.
#[derive(Debug, Clone)]
pub struct UnexpectedCall {
    /// Name of the test that owns the session.
    pub test: String,
    /// Label of the mock point.
    pub mock: String,
    /// Debug rendering of the arguments.
    pub args: String,
    /// Expectation that matched but had no response to give, if any.
    pub expectation: Option<String>,
    /// Where the mock was invoked.
    pub location: &'static Location<'static>,
}

type UnexpectedCallHandler = Arc<dyn Fn(&UnexpectedCall) + Send + Sync>;

/// What to do when a call finds no eligible expectation.
#[derive(Clone, Default)]
pub enum UnexpectedCallPolicy {
    /// Log a warning through `tracing` and carry on.
    Warn,
    /// Report a test failure and carry on with the default result.
    #[default]
    Fail,
    /// Hand the call to a custom handler.
    Custom(UnexpectedCallHandler),
}

impl UnexpectedCallPolicy {
    /// Wraps a handler closure.
    pub fn custom<F>(handler: F) -> Self
    where
        F: Fn(&UnexpectedCall) + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(handler))
    }
}

impl fmt::Debug for UnexpectedCallPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warn => f.write_str("Warn"),
            Self::Fail => f.write_str("Fail"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Session configuration.
///
/// Use the builder methods to customize, or [`Default`] for the standard
/// behavior. Sessions reset to the default at every test boundary.
///
/// ```rust
/// use std::time::Duration;
/// use testkit_mock::config::{Config, UnexpectedCallPolicy};
///
/// let config = Config::default()
///     .with_unexpected_call(UnexpectedCallPolicy::Warn)
///     .with_default_timeout(Duration::from_millis(250))
///     .with_enforce_order(true);
/// assert!(config.enforce_order);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Reaction to calls without an eligible expectation.
    /// Default: [`UnexpectedCallPolicy::Fail`]
    pub unexpected_call: UnexpectedCallPolicy,

    /// How long `wait_for_expectations` blocks when no timeout is given.
    /// Default: 1 s
    pub default_timeout: Duration,

    /// Whether waits require expectations to complete in registration order.
    /// Default: false
    pub enforce_order: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            unexpected_call: UnexpectedCallPolicy::default(),
            default_timeout: Duration::from_secs(1),
            enforce_order: false,
        }
    }
}

impl Config {
    /// Set the unexpected-call policy.
    #[must_use]
    pub fn with_unexpected_call(mut self, policy: UnexpectedCallPolicy) -> Self {
        self.unexpected_call = policy;
        self
    }

    /// Set the default wait timeout.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Require in-order completion on waits that don't say otherwise.
    #[must_use]
    pub fn with_enforce_order(mut self, enforce: bool) -> Self {
        self.enforce_order = enforce;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(matches!(config.unexpected_call, UnexpectedCallPolicy::Fail));
        assert_eq!(config.default_timeout, Duration::from_secs(1));
        assert!(!config.enforce_order);
    }

    #[test]
    fn test_builder() {
        let config = Config::default()
            .with_unexpected_call(UnexpectedCallPolicy::custom(|_| {}))
            .with_default_timeout(Duration::from_millis(5));
        assert_eq!(format!("{:?}", config.unexpected_call), "Custom(..)");
        assert_eq!(config.default_timeout, Duration::from_millis(5));
    }
}
