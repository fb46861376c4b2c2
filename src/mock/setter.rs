//! Mock points standing in for a mutable property.

use std::convert::Infallible;
use std::fmt::Debug;

use crate::builder::MatchBuilder;
use crate::captor::InitedCaptor;
use crate::expectation::ExpectationInfo;
use crate::mock::MethodMock;
use crate::registry::ExpectationRegistry;
use crate::session::Session;

/// A property of type `T` whose writes are resolved like method calls.
///
/// Every matched [`set`](Self::set) is remembered, and [`get`](Self::get)
/// answers the latest one, or the initial value before any write matched.
/// Writes nobody expected are reported and not remembered.
///
/// ```rust
/// use testkit_mock::matcher::gt;
/// use testkit_mock::mock::SetterMock;
/// use testkit_mock::session::Session;
///
/// let session = Session::new("volume");
/// let volume = SetterMock::new(&session, "volume", -1);
/// volume.expect("raised").with(gt(0)).will_once(None).commit();
///
/// assert_eq!(volume.get(), -1);
/// volume.set(4);
/// assert_eq!(volume.get(), 4);
/// # session.end_test();
/// ```
pub struct SetterMock<T> {
    point: MethodMock<T, (), Infallible>,
    value: InitedCaptor<T>,
}

impl<T> SetterMock<T>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    /// Creates a property labelled `label` holding `initial`.
    #[must_use]
    pub fn new(session: &Session, label: impl Into<String>, initial: T) -> Self {
        let value = InitedCaptor::new(initial);
        let registry = ExpectationRegistry::with_default_captor(label, value.clone());
        Self {
            point: MethodMock::with_registry(session, registry),
            value,
        }
    }

    /// Starts registering an expectation on writes.
    pub fn expect(&self, description: impl Into<String>) -> MatchBuilder<'_, T, (), Infallible> {
        self.point.expect(description)
    }

    /// The latest matched write, or the initial value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.last_captured()
    }

    /// Writes the property.
    #[track_caller]
    pub fn set(&self, value: T) {
        let _ = self.point.call(value);
    }

    /// Every matched write, oldest first.
    #[must_use]
    pub fn captured(&self) -> Vec<T> {
        self.value.captured()
    }

    /// Snapshot of every expectation in priority order.
    #[must_use]
    pub fn expectations(&self) -> Vec<ExpectationInfo> {
        self.point.expectations()
    }
}

impl<T> SetterMock<T> {
    /// Label used in diagnostics.
    #[must_use]
    pub fn label(&self) -> &str {
        self.point.label()
    }
}

impl<T> Clone for SetterMock<T> {
    fn clone(&self) -> Self {
        Self {
            point: self.point.clone(),
            value: self.value.clone(),
        }
    }
}

impl<T: Debug> Debug for SetterMock<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetterMock")
            .field("label", &self.label())
            .field("value", &self.value)
            .finish()
    }
}
