//! Mock points standing in for a callback.
//!
//! Code under test often takes a closure rather than a collaborator object.
//! A [`ClosureMock`] hands out plain closures that resolve every invocation
//! against its expectations.
//!
//! ```rust
//! use testkit_mock::captor::ArgumentCaptor;
//! use testkit_mock::expectation::Times;
//! use testkit_mock::mock::ClosureMock;
//! use testkit_mock::session::Session;
//!
//! fn notify_all(users: &[u32], notify: impl Fn(u32)) {
//!     users.iter().copied().for_each(notify);
//! }
//!
//! let session = Session::new("callbacks");
//! let notify = ClosureMock::<u32, ()>::new(&session, "notify");
//! let seen = ArgumentCaptor::new();
//! notify
//!     .expect("every user")
//!     .capture(seen.clone())
//!     .will_repeatedly(Times::exactly(3), None)
//!     .commit();
//!
//! notify_all(&[1, 2, 3], notify.as_fn());
//! assert!(session.wait_for_expectations());
//! assert_eq!(seen.captured(), vec![1, 2, 3]);
//! # session.end_test();
//! ```

use std::convert::Infallible;
use std::fmt::Debug;
use std::panic::Location;

use crate::builder::MatchBuilder;
use crate::error::Error;
use crate::expectation::{ExpectationInfo, Resolution};
use crate::mock::MethodMock;
use crate::session::Session;

/// A mock point for a callback taking `A` and returning `R`, optionally
/// failing with `E`.
///
/// Calls that resolve without a value answer `R::default()`. When `R` is not
/// `()`, a matched expectation without an action is also reported through
/// the session's unexpected-call policy.
pub struct ClosureMock<A, R, E = Infallible> {
    point: MethodMock<A, R, E>,
}

impl<A, R, E> ClosureMock<A, R, E>
where
    A: Debug + 'static,
    R: Clone + Default + 'static,
    E: Clone,
{
    /// Creates a callback mock labelled `label` inside `session`.
    #[must_use]
    pub fn new(session: &Session, label: impl Into<String>) -> Self {
        Self {
            point: MethodMock::new(session, label),
        }
    }

    /// Starts registering an expectation labelled `description`.
    pub fn expect(&self, description: impl Into<String>) -> MatchBuilder<'_, A, R, E> {
        self.point.expect(description)
    }

    /// Invokes the callback as a non-failing closure would be.
    ///
    /// # Panics
    ///
    /// Panics if the selected expectation throws: use
    /// [`try_invoke`](Self::try_invoke) or [`as_try_fn`](Self::as_try_fn)
    /// for fallible callbacks.
    #[track_caller]
    pub fn invoke(&self, args: A) -> R {
        let location = Location::caller();
        self.dispatch(args, location).unwrap_or_else(|(expectation, _)| {
            panic!("{}", Error::usage_misuse(self.label(), expectation))
        })
    }

    /// Invokes the callback as a fallible closure would be.
    ///
    /// # Errors
    ///
    /// Returns the error produced by the selected expectation.
    #[track_caller]
    pub fn try_invoke(&self, args: A) -> Result<R, E> {
        self.dispatch(args, Location::caller())
            .map_err(|(_, error)| error)
    }

    /// Errors carry the label of the expectation that produced them.
    fn dispatch(&self, args: A, location: &'static Location<'static>) -> Result<R, (String, E)> {
        match self.point.registry().resolve(&args) {
            Resolution::Returned { value, .. } => Ok(value),
            Resolution::Void { expectation } => {
                self.point.void_response(&expectation, &args, location);
                Ok(R::default())
            }
            Resolution::Threw { expectation, error } => Err((expectation, error)),
            Resolution::Unexpected => {
                self.point.unexpected(&args, location);
                Ok(R::default())
            }
        }
    }

    /// Closure forwarding to [`invoke`](Self::invoke).
    pub fn as_fn(&self) -> impl Fn(A) -> R + Send + Sync + 'static
    where
        A: Send + Sync,
        R: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        let mock = self.clone();
        move |args| mock.invoke(args)
    }

    /// Closure forwarding to [`try_invoke`](Self::try_invoke).
    pub fn as_try_fn(&self) -> impl Fn(A) -> Result<R, E> + Send + Sync + 'static
    where
        A: Send + Sync,
        R: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        let mock = self.clone();
        move |args| mock.try_invoke(args)
    }

    /// Snapshot of every expectation in priority order.
    #[must_use]
    pub fn expectations(&self) -> Vec<ExpectationInfo> {
        self.point.expectations()
    }

    /// Number of invocations that found an expectation.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.point.call_count()
    }
}

impl<A, R, E> ClosureMock<A, R, E> {
    /// Label used in diagnostics.
    #[must_use]
    pub fn label(&self) -> &str {
        self.point.label()
    }
}

impl<A, R, E> Clone for ClosureMock<A, R, E> {
    fn clone(&self) -> Self {
        Self {
            point: self.point.clone(),
        }
    }
}

impl<A, R, E> Debug for ClosureMock<A, R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ClosureMock").field(&self.point).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captor::ArgumentCaptor;
    use crate::expectation::{Action, Times};
    use crate::matcher::{eq, lt};
    use std::thread;

    #[test]
    fn test_invoke_defaults_void_responses() {
        let session = Session::new("void");
        let callback = ClosureMock::<i32, String>::new(&session, "cb");
        callback.expect("any").will_once(None).commit();

        assert_eq!(callback.invoke(1), String::new());
        let failures = session.take_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].message,
            "Matched `any` on `cb` with 1 but no response configured"
        );
        session.end_test();
    }

    #[test]
    fn test_unit_callback_without_action_is_silent() {
        let session = Session::new("unit_void");
        let callback = ClosureMock::<i32, ()>::new(&session, "cb");
        callback.expect("once").will_once(None).commit();

        callback.invoke(1);
        assert!(session.failures().is_empty());
        assert!(session.wait_for_expectations());
        session.end_test();
    }

    #[test]
    fn test_closure_captures_from_many_threads() {
        let session = Session::new("threads");
        let callback = ClosureMock::<u32, ()>::new(&session, "on_event");
        let captor = ArgumentCaptor::new();
        callback
            .expect("ten events")
            .capture(captor.clone())
            .will_repeatedly(Times::exactly(10), None)
            .commit();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let f = callback.as_fn();
                thread::spawn(move || f(i))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(session.wait_for_expectations());
        let mut seen = captor.captured();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
        session.end_test();
    }

    #[test]
    fn test_try_fn_surfaces_errors() {
        let session = Session::new("fallible");
        let callback = ClosureMock::<i32, i32, String>::new(&session, "validate");
        callback
            .expect("negative")
            .with(lt(0))
            .will_repeatedly(Times::unlimited(), Action::Throw("negative".into()))
            .commit();
        callback
            .expect("identity")
            .will_repeatedly(Times::unlimited(), Action::perform(|x: &i32| Ok(*x)))
            .commit();

        let validate = callback.as_try_fn();
        assert_eq!(validate(-3), Err("negative".to_string()));
        assert_eq!(validate(3), Ok(3));
        assert_eq!(callback.call_count(), 2);
        session.end_test();
    }

    #[test]
    #[should_panic(expected = "Usage misuse on `cb`: expectation `throws` throws")]
    fn test_failing_response_through_infallible_closure_panics() {
        let session = Session::new("misuse");
        let callback = ClosureMock::<i32, i32, String>::new(&session, "cb");
        callback.expect("throws").with(eq(1)).will_once(Action::Throw("x".into())).commit();
        let f = callback.as_fn();
        f(1);
    }

    #[test]
    fn test_unexpected_invocation_answers_default() {
        let session = Session::new("unexpected");
        let callback = ClosureMock::<i32, i32>::new(&session, "cb");

        assert_eq!(callback.invoke(5), 0);
        let failures = session.take_failures();
        assert_eq!(failures[0].message, "Unexpected call to `cb` with 5");
    }
}
