//! Mock points standing in for a method of a collaborator.

use std::any::TypeId;
use std::convert::Infallible;
use std::fmt::Debug;
use std::panic::Location;
use std::sync::Arc;

use crate::builder::MatchBuilder;
use crate::error::Error;
use crate::expectation::{ExpectationInfo, Resolution};
use crate::registry::ExpectationRegistry;
use crate::session::Session;

/// A mock point for one method, with arguments `A`, result `R` and error `E`.
///
/// Multi-argument methods use a tuple for `A`, matched with a tuple of
/// matchers. Handles are cheap to clone and share the same expectations,
/// so a fake implementation can hold one per method and forward to it.
///
/// # Example
///
/// ```rust
/// use testkit_mock::expectation::Action;
/// use testkit_mock::matcher::{anything, eq};
/// use testkit_mock::mock::MethodMock;
/// use testkit_mock::session::Session;
///
/// let session = Session::new("store");
/// let put = MethodMock::<(String, u32), bool>::new(&session, "put");
///
/// put.expect("store ada")
///     .with((eq("ada".to_string()), anything()))
///     .will_once(Action::Return(true))
///     .commit();
///
/// assert_eq!(put.call(("ada".to_string(), 36)), Some(true));
/// assert_eq!(put.call_count(), 1);
/// # session.end_test();
/// ```
pub struct MethodMock<A, R, E = Infallible> {
    session: Session,
    registry: Arc<ExpectationRegistry<A, R, E>>,
}

impl<A, R, E> MethodMock<A, R, E>
where
    A: Debug + 'static,
    R: Clone + 'static,
    E: Clone,
{
    /// Creates a mock point labelled `label` inside `session`.
    #[must_use]
    pub fn new(session: &Session, label: impl Into<String>) -> Self {
        Self::with_registry(session, ExpectationRegistry::new(label))
    }

    pub(crate) fn with_registry(session: &Session, registry: ExpectationRegistry<A, R, E>) -> Self {
        tracing::trace!(mock = %registry.mock(), test = %session.test_name(), "mock point created");
        Self {
            session: session.clone(),
            registry: Arc::new(registry),
        }
    }

    /// Starts registering an expectation labelled `description`.
    pub fn expect(&self, description: impl Into<String>) -> MatchBuilder<'_, A, R, E> {
        MatchBuilder::new(&self.registry, self.session.pool(), description)
    }

    /// Calls the mock point from a non-throwing method.
    ///
    /// Returns the selected expectation's value, or `None` when it answers
    /// with no value or when the call was unexpected. Unexpected calls go to
    /// the session's unexpected-call policy, and so do calls matching an
    /// expectation without an action unless `R` is `()`.
    ///
    /// # Panics
    ///
    /// Panics if the selected expectation throws: a non-throwing method has
    /// no way to surface the error.
    #[track_caller]
    pub fn call(&self, args: A) -> Option<R> {
        let location = Location::caller();
        match self.registry.resolve(&args) {
            Resolution::Returned { value, .. } => Some(value),
            Resolution::Void { expectation } => {
                self.void_response(&expectation, &args, location);
                None
            }
            Resolution::Threw { expectation, .. } => {
                panic!("{}", Error::usage_misuse(self.label(), expectation))
            }
            Resolution::Unexpected => {
                self.unexpected(&args, location);
                None
            }
        }
    }

    /// Like [`call`](Self::call), answering `default` when there is no value.
    #[track_caller]
    pub fn call_or(&self, args: A, default: R) -> R {
        self.call(args).unwrap_or(default)
    }

    /// Like [`call`](Self::call), answering `R::default()` when there is no
    /// value.
    #[track_caller]
    pub fn call_or_default(&self, args: A) -> R
    where
        R: Default,
    {
        self.call(args).unwrap_or_default()
    }

    /// Calls the mock point from a throwing method.
    ///
    /// # Errors
    ///
    /// Returns the error configured by a `Throw` response, or the error
    /// returned by a `Perform` closure.
    #[track_caller]
    pub fn try_call(&self, args: A) -> Result<Option<R>, E> {
        let location = Location::caller();
        match self.registry.resolve(&args) {
            Resolution::Returned { value, .. } => Ok(Some(value)),
            Resolution::Void { expectation } => {
                self.void_response(&expectation, &args, location);
                Ok(None)
            }
            Resolution::Threw { error, .. } => Err(error),
            Resolution::Unexpected => {
                self.unexpected(&args, location);
                Ok(None)
            }
        }
    }

    /// Snapshot of every expectation in priority order.
    #[must_use]
    pub fn expectations(&self) -> Vec<ExpectationInfo> {
        self.registry.expectations()
    }

    /// Number of calls that found an expectation.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.registry.resolved_count()
    }

    /// Number of calls that found none.
    #[must_use]
    pub fn unexpected_count(&self) -> usize {
        self.registry.unexpected_count()
    }

    /// Discards every expectation. Tokens already handed to the session's
    /// pool stay there until the next wait.
    pub fn reset(&self) {
        tracing::debug!(mock = %self.label(), "mock point reset");
        self.registry.clear();
    }

    /// A matched expectation without an action is a complete answer only
    /// for unit results; any other caller needed a value.
    pub(crate) fn void_response(
        &self,
        expectation: &str,
        args: &A,
        location: &'static Location<'static>,
    ) {
        if TypeId::of::<R>() == TypeId::of::<()>() {
            return;
        }
        self.session
            .missing_response(self.label(), expectation, format!("{args:?}"), location);
    }

    pub(crate) fn unexpected(&self, args: &A, location: &'static Location<'static>) {
        tracing::debug!(
            mock = %self.label(),
            reasons = ?self.registry.explain_mismatch(args),
            "call did not match"
        );
        self.session
            .unexpected_call(self.label(), format!("{args:?}"), location);
    }
}

impl<A, R, E> MethodMock<A, R, E> {
    /// Label used in diagnostics.
    #[must_use]
    pub fn label(&self) -> &str {
        self.registry.mock()
    }

    pub(crate) fn registry(&self) -> &ExpectationRegistry<A, R, E> {
        &self.registry
    }

    /// Session this mock point reports to.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl<A, R, E> Clone for MethodMock<A, R, E> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<A, R, E> Debug for MethodMock<A, R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodMock")
            .field("registry", &self.registry)
            .finish()
    }
}
