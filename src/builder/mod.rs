//! The registration chain: `expect` → `with` → `will_*` → `commit`.
//!
//! The chain is a small state machine encoded in the builder's type:
//!
//! - [`Unconfigured`]: labelled, no matcher yet. [`with`](ExpectationBuilder::with)
//!   or [`with_value`](ExpectationBuilder::with_value) move on to `Matched`;
//!   skipping them means "match anything".
//! - [`Matched`]: matcher set, captors may be attached.
//! - [`Armed`]: budget and response chosen. Nothing is registered until
//!   [`commit`](ExpectationBuilder::commit) appends the draft to the mock
//!   point and, for finite budgets, creates its waitable token.
//!
//! ```rust
//! use testkit_mock::captor::ArgumentCaptor;
//! use testkit_mock::expectation::{Action, Times};
//! use testkit_mock::matcher::gt;
//! use testkit_mock::mock::MethodMock;
//! use testkit_mock::session::Session;
//!
//! let session = Session::new("doc");
//! let scale = MethodMock::<i32, i32>::new(&session, "scale");
//! let seen = ArgumentCaptor::new();
//!
//! scale
//!     .expect("positive input")
//!     .with(gt(0))
//!     .capture(seen.clone())
//!     .will_repeatedly(Times::exactly(2), Action::perform(|x: &i32| Ok(x * 10)))
//!     .commit();
//!
//! assert_eq!(scale.call(1), Some(10));
//! assert_eq!(scale.call(2), Some(20));
//! assert_eq!(seen.captured(), vec![1, 2]);
//! # session.end_test();
//! ```

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::captor::Capture;
use crate::expectation::{Action, Expectation, IntoResponse, Times};
use crate::matcher::{anything, eq, Matcher};
use crate::registry::ExpectationRegistry;
use crate::token::ExpectationPool;

/// Builder state: labelled, no matcher chosen.
#[derive(Debug)]
pub struct Unconfigured;

/// Builder state: matcher chosen, response pending.
#[derive(Debug)]
pub struct Matched;

/// Builder state: ready to [`commit`](ExpectationBuilder::commit).
#[derive(Debug)]
pub struct Armed;

mod sealed {
    pub trait Open {}

    impl Open for super::Unconfigured {}
    impl Open for super::Matched {}
}

/// Builder returned by `expect`.
pub type MatchBuilder<'a, A, R, E> = ExpectationBuilder<'a, A, R, E, Unconfigured>;

/// Builder after a matcher was chosen.
pub type ActionBuilder<'a, A, R, E> = ExpectationBuilder<'a, A, R, E, Matched>;

/// Builder waiting for `commit`.
pub type ArmedExpectation<'a, A, R, E> = ExpectationBuilder<'a, A, R, E, Armed>;

/// Draft expectation moving through the registration states.
#[must_use = "an expectation is only registered once `commit` is called"]
pub struct ExpectationBuilder<'a, A, R, E, S> {
    registry: &'a ExpectationRegistry<A, R, E>,
    pool: &'a ExpectationPool,
    draft: Draft<A, R, E>,
    _state: PhantomData<S>,
}

struct Draft<A, R, E> {
    description: String,
    matcher: Option<Box<dyn Matcher<A>>>,
    captors: Vec<Box<dyn Capture<A>>>,
    times: Times,
    action: Option<Action<A, R, E>>,
}

impl<'a, A, R, E, S> ExpectationBuilder<'a, A, R, E, S> {
    fn transition<T>(self) -> ExpectationBuilder<'a, A, R, E, T> {
        ExpectationBuilder {
            registry: self.registry,
            pool: self.pool,
            draft: self.draft,
            _state: PhantomData,
        }
    }

    /// Label of the expectation being built.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.draft.description
    }
}

impl<'a, A, R, E> MatchBuilder<'a, A, R, E>
where
    A: Debug + 'static,
{
    pub(crate) fn new(
        registry: &'a ExpectationRegistry<A, R, E>,
        pool: &'a ExpectationPool,
        description: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            pool,
            draft: Draft {
                description: description.into(),
                matcher: None,
                captors: Vec::new(),
                times: Times::once(),
                action: None,
            },
            _state: PhantomData,
        }
    }

    /// Restricts the expectation to arguments accepted by `matcher`.
    pub fn with<M>(mut self, matcher: M) -> ActionBuilder<'a, A, R, E>
    where
        M: Matcher<A> + 'static,
    {
        self.draft.matcher = Some(Box::new(matcher));
        self.transition()
    }

    /// Restricts the expectation to arguments equal to `value`.
    pub fn with_value(self, value: A) -> ActionBuilder<'a, A, R, E>
    where
        A: PartialEq + Send + Sync,
    {
        self.with(eq(value))
    }
}

impl<'a, A, R, E, S> ExpectationBuilder<'a, A, R, E, S>
where
    A: Debug + 'static,
    S: sealed::Open,
{
    /// Attaches a captor notified with the arguments of every selected call.
    /// Repeatable.
    pub fn capture(mut self, captor: impl Capture<A> + 'static) -> ActionBuilder<'a, A, R, E> {
        self.draft.captors.push(Box::new(captor));
        self.transition()
    }

    /// Accepts exactly one call. Pass `None` for a void response.
    pub fn will_once(self, action: impl IntoResponse<A, R, E>) -> ArmedExpectation<'a, A, R, E> {
        self.will_repeatedly(Times::once(), action)
    }

    /// Accepts calls within `times`, answering each with `action`.
    pub fn will_repeatedly(
        mut self,
        times: Times,
        action: impl IntoResponse<A, R, E>,
    ) -> ArmedExpectation<'a, A, R, E> {
        self.draft.times = times;
        self.draft.action = action.into_response();
        self.transition()
    }

    /// Asserts that matching calls never happen.
    pub fn will_never(mut self) -> ArmedExpectation<'a, A, R, E> {
        self.draft.times = Times::never();
        self.draft.action = None;
        self.transition()
    }
}

impl<'a, A, R, E> ArmedExpectation<'a, A, R, E>
where
    A: Debug + 'static,
    R: Clone,
    E: Clone,
{
    /// Appends the expectation to its mock point and returns it for
    /// inspection. Finite budgets get a token in the session's pool.
    pub fn commit(self) -> Arc<Expectation<A, R, E>> {
        let Draft {
            description,
            matcher,
            captors,
            times,
            action,
        } = self.draft;

        let token = match times {
            Times::Unlimited => None,
            Times::Exactly(0) => Some(self.pool.create_inverted_token(description.clone())),
            Times::Exactly(n) => Some(self.pool.create_token(description.clone(), n)),
        };
        let matcher = matcher.unwrap_or_else(|| Box::new(anything()));

        self.registry.register(Expectation::new(
            description,
            matcher,
            times,
            action,
            captors,
            token,
        ))
    }
}

impl<A, R, E, S> Debug for ExpectationBuilder<'_, A, R, E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpectationBuilder")
            .field("mock", &self.registry.mock())
            .field("description", &self.draft.description)
            .field("matcher", &self.draft.matcher.as_ref().map(|m| m.describe()))
            .field("captors", &self.draft.captors.len())
            .field("times", &self.draft.times)
            .field("state", &std::any::type_name::<S>())
            .finish()
    }
}
