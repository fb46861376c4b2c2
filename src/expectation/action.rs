//! Response actions.

use std::fmt;
use std::sync::Arc;

type Computation<A, R, E> = Arc<dyn Fn(&A) -> Result<R, E> + Send + Sync>;

/// What an expectation does once it is selected.
pub enum Action<A, R, E> {
    /// Return a clone of the value.
    Return(R),
    /// Fail with a clone of the error.
    Throw(E),
    /// Compute the outcome from the arguments.
    Perform(Computation<A, R, E>),
}

impl<A, R, E> Action<A, R, E> {
    /// Wraps a computation over the call arguments.
    ///
    /// ```rust
    /// use std::convert::Infallible;
    /// use testkit_mock::expectation::Action;
    ///
    /// let double: Action<i32, i32, Infallible> = Action::perform(|x: &i32| Ok(x * 2));
    /// assert_eq!(double.perform_on(&4), Ok(8));
    /// ```
    pub fn perform<F>(computation: F) -> Self
    where
        F: Fn(&A) -> Result<R, E> + Send + Sync + 'static,
    {
        Self::Perform(Arc::new(computation))
    }

    /// Runs the action against `args`.
    pub fn perform_on(&self, args: &A) -> Result<R, E>
    where
        R: Clone,
        E: Clone,
    {
        match self {
            Self::Return(value) => Ok(value.clone()),
            Self::Throw(error) => Err(error.clone()),
            Self::Perform(computation) => computation(args),
        }
    }
}

impl<A, R: Clone, E: Clone> Clone for Action<A, R, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Return(value) => Self::Return(value.clone()),
            Self::Throw(error) => Self::Throw(error.clone()),
            Self::Perform(computation) => Self::Perform(Arc::clone(computation)),
        }
    }
}

impl<A, R: fmt::Debug, E: fmt::Debug> fmt::Debug for Action<A, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Return(value) => f.debug_tuple("Return").field(value).finish(),
            Self::Throw(error) => f.debug_tuple("Throw").field(error).finish(),
            Self::Perform(_) => f.write_str("Perform(..)"),
        }
    }
}

/// Anything a `will_*` builder method accepts as a response.
///
/// `None` registers a void response: the call is handled but produces no value.
pub trait IntoResponse<A, R, E> {
    /// Converts into an optional action.
    fn into_response(self) -> Option<Action<A, R, E>>;
}

impl<A, R, E> IntoResponse<A, R, E> for Action<A, R, E> {
    fn into_response(self) -> Option<Action<A, R, E>> {
        Some(self)
    }
}

impl<A, R, E> IntoResponse<A, R, E> for Option<Action<A, R, E>> {
    fn into_response(self) -> Option<Action<A, R, E>> {
        self
    }
}
