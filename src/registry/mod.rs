//! The expectation-matching engine behind every mock point.
//!
//! A registry keeps its expectations in registration order, which is also
//! their priority. Resolving a call scans from the front for the first
//! expectation whose matcher accepts the arguments *and* whose budget is not
//! spent. An accepting but exhausted expectation is skipped and the scan
//! continues behind it.
//!
//! ```rust
//! use std::convert::Infallible;
//! use testkit_mock::expectation::{Action, Resolution, Times};
//! use testkit_mock::matcher::eq;
//! use testkit_mock::registry::ExpectationRegistry;
//!
//! let registry = ExpectationRegistry::<i32, &str, Infallible>::new("toString");
//! registry.register_parts("e1", Box::new(eq(2)), Times::once(), Some(Action::Return("two")), Vec::new(), None);
//!
//! assert_eq!(registry.resolve(&2).expectation(), Some("e1"));
//! assert!(registry.resolve(&2).is_unexpected());
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::captor::Capture;
use crate::expectation::{Action, Expectation, ExpectationInfo, Resolution, Times};
use crate::matcher::Matcher;
use crate::token::ExpectationToken;

/// Ordered expectations for one mock point.
pub struct ExpectationRegistry<A, R, E> {
    mock: String,
    expectations: RwLock<Vec<Arc<Expectation<A, R, E>>>>,
    default_captor: Option<Box<dyn Capture<A>>>,
    resolved: AtomicUsize,
    unexpected: AtomicUsize,
}

impl<A, R, E> ExpectationRegistry<A, R, E>
where
    A: Debug,
    R: Clone,
    E: Clone,
{
    /// Creates an empty registry for the mock point `mock`.
    #[must_use]
    pub fn new(mock: impl Into<String>) -> Self {
        Self {
            mock: mock.into(),
            expectations: RwLock::new(Vec::new()),
            default_captor: None,
            resolved: AtomicUsize::new(0),
            unexpected: AtomicUsize::new(0),
        }
    }

    /// Creates a registry whose `captor` sees the arguments of every resolved
    /// call, after the selected expectation's own captors.
    #[must_use]
    pub fn with_default_captor(mock: impl Into<String>, captor: impl Capture<A> + 'static) -> Self {
        Self {
            default_captor: Some(Box::new(captor)),
            ..Self::new(mock)
        }
    }

    /// Appends an expectation at the lowest priority.
    pub fn register(&self, expectation: Expectation<A, R, E>) -> Arc<Expectation<A, R, E>> {
        let expectation = Arc::new(expectation);
        tracing::debug!(
            mock = %self.mock,
            expectation = %expectation.description(),
            times = %expectation.times(),
            "expectation registered"
        );
        self.expectations.write().push(Arc::clone(&expectation));
        expectation
    }

    /// Builds and appends an expectation from its parts.
    pub fn register_parts(
        &self,
        description: impl Into<String>,
        matcher: Box<dyn Matcher<A>>,
        times: Times,
        action: Option<Action<A, R, E>>,
        captors: Vec<Box<dyn Capture<A>>>,
        token: Option<ExpectationToken>,
    ) -> Arc<Expectation<A, R, E>> {
        self.register(Expectation::new(
            description.into(),
            matcher,
            times,
            action,
            captors,
            token,
        ))
    }

    /// Resolves a call to the first eligible expectation.
    ///
    /// The budget test-and-decrement is atomic per expectation, so concurrent
    /// callers can never overdraw a budget. Captors, the token and the
    /// response action run after the list lock is released.
    pub fn resolve(&self, args: &A) -> Resolution<R, E> {
        let Some(selected) = self.select(args) else {
            self.unexpected.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(mock = %self.mock, ?args, "no eligible expectation");
            return Resolution::Unexpected;
        };

        self.resolved.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            mock = %self.mock,
            expectation = %selected.description(),
            remaining = ?selected.remaining(),
            "call resolved"
        );

        selected.fulfill_with(args, self.default_captor.as_deref())
    }

    fn select(&self, args: &A) -> Option<Arc<Expectation<A, R, E>>> {
        let expectations = self.expectations.read();
        let mut index = 0;
        while let Some(offset) = expectations[index..].iter().position(|e| e.accepts(args)) {
            let candidate = &expectations[index + offset];
            if candidate.try_consume() {
                return Some(Arc::clone(candidate));
            }
            candidate.on_exhausted_match();
            index += offset + 1;
        }
        None
    }

    /// Explains, per expectation, why `args` were not accepted.
    #[must_use]
    pub fn explain_mismatch(&self, args: &A) -> Vec<String> {
        self.expectations
            .read()
            .iter()
            .map(|e| {
                if e.accepts(args) {
                    format!("`{}`: matched but exhausted ({})", e.description(), e.times())
                } else {
                    format!("`{}`: {}", e.description(), e.describe_mismatch(args))
                }
            })
            .collect()
    }

    /// Snapshot of every expectation in priority order.
    #[must_use]
    pub fn expectations(&self) -> Vec<ExpectationInfo> {
        self.expectations.read().iter().map(|e| e.info()).collect()
    }

    /// Number of registered expectations, exhausted ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expectations.read().len()
    }

    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expectations.read().is_empty()
    }

    /// Number of calls that found an expectation.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.resolved.load(Ordering::SeqCst)
    }

    /// Number of calls that found none.
    #[must_use]
    pub fn unexpected_count(&self) -> usize {
        self.unexpected.load(Ordering::SeqCst)
    }

    /// Discards every expectation and resets the counters.
    pub fn clear(&self) {
        self.expectations.write().clear();
        self.resolved.store(0, Ordering::SeqCst);
        self.unexpected.store(0, Ordering::SeqCst);
    }
}

impl<A, R, E> ExpectationRegistry<A, R, E> {
    /// Label of the owning mock point.
    #[must_use]
    pub fn mock(&self) -> &str {
        &self.mock
    }
}

impl<A, R, E> Debug for ExpectationRegistry<A, R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpectationRegistry")
            .field("mock", &self.mock)
            .field("expectations", &*self.expectations.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captor::ArgumentCaptor;
    use crate::matcher::{anything, eq, gt};
    use crate::token::ExpectationPool;
    use std::convert::Infallible;

    type Registry = ExpectationRegistry<i32, &'static str, Infallible>;

    fn add(registry: &Registry, label: &str, matcher: Box<dyn Matcher<i32>>, times: Times, value: &'static str) {
        registry.register_parts(label, matcher, times, Some(Action::Return(value)), Vec::new(), None);
    }

    fn value(resolution: Resolution<&'static str, Infallible>) -> Option<&'static str> {
        match resolution {
            Resolution::Returned { value, .. } => Some(value),
            _ => None,
        }
    }

    #[test]
    fn test_empty_registry_reports_unexpected() {
        let registry = Registry::new("m");
        assert!(registry.resolve(&1).is_unexpected());
        assert_eq!(registry.unexpected_count(), 1);
    }

    #[test]
    fn test_exact_count_then_unexpected() {
        let registry = Registry::new("toString");
        add(&registry, "e1", Box::new(eq(2)), Times::once(), "two");

        assert_eq!(value(registry.resolve(&2)), Some("two"));
        assert!(registry.resolve(&2).is_unexpected());
        assert_eq!(registry.resolved_count(), 1);
    }

    #[test]
    fn test_first_registered_wins_over_specificity() {
        let registry = Registry::new("m");
        add(&registry, "broad", Box::new(anything()), Times::unlimited(), "broad");
        add(&registry, "narrow", Box::new(eq(5)), Times::unlimited(), "narrow");

        assert_eq!(value(registry.resolve(&5)), Some("broad"));
    }

    #[test]
    fn test_exhausted_match_is_skipped() {
        let registry = Registry::new("m");
        add(&registry, "a", Box::new(eq(1)), Times::once(), "a");
        add(&registry, "b", Box::new(eq(1)), Times::unlimited(), "b");

        assert_eq!(value(registry.resolve(&1)), Some("a"));
        assert_eq!(value(registry.resolve(&1)), Some("b"));
        assert_eq!(value(registry.resolve(&1)), Some("b"));
    }

    #[test]
    fn test_skip_continues_past_non_matching() {
        let registry = Registry::new("m");
        add(&registry, "a", Box::new(gt(0)), Times::once(), "a");
        add(&registry, "other", Box::new(eq(-1)), Times::unlimited(), "other");
        add(&registry, "c", Box::new(gt(0)), Times::once(), "c");

        assert_eq!(value(registry.resolve(&3)), Some("a"));
        assert_eq!(value(registry.resolve(&3)), Some("c"));
        assert!(registry.resolve(&3).is_unexpected());
        assert_eq!(value(registry.resolve(&-1)), Some("other"));
    }

    #[test]
    fn test_only_selected_budget_decrements() {
        let registry = Registry::new("m");
        add(&registry, "one", Box::new(eq(1)), Times::exactly(2), "1");
        add(&registry, "two", Box::new(eq(2)), Times::exactly(2), "2");

        registry.resolve(&2);
        let infos = registry.expectations();
        assert_eq!(infos[0].remaining, Some(2));
        assert_eq!(infos[1].remaining, Some(1));
    }

    #[test]
    fn test_never_expectation_is_skipped_and_signalled() {
        let pool = ExpectationPool::new();
        let registry = Registry::new("m");
        let token = pool.create_inverted_token("never");
        registry.register_parts("never", Box::new(eq(1)), Times::never(), None, Vec::new(), Some(token.clone()));

        assert!(registry.resolve(&1).is_unexpected());
        assert_eq!(token.fulfilled(), 1);
        assert!(registry.resolve(&2).is_unexpected());
        assert_eq!(token.fulfilled(), 1);
    }

    #[test]
    fn test_never_falls_through_to_fallback() {
        let registry = Registry::new("m");
        registry.register_parts("never", Box::new(eq(1)), Times::never(), None, Vec::new(), None);
        add(&registry, "fallback", Box::new(anything()), Times::unlimited(), "fallback");

        assert_eq!(value(registry.resolve(&1)), Some("fallback"));
    }

    #[test]
    fn test_default_captor_sees_resolved_calls_only() {
        let captor = ArgumentCaptor::new();
        let registry: Registry = ExpectationRegistry::with_default_captor("m", captor.clone());
        add(&registry, "small", Box::new(gt(10)), Times::unlimited(), "x");

        registry.resolve(&11);
        registry.resolve(&1);
        registry.resolve(&12);
        assert_eq!(captor.captured(), vec![11, 12]);
    }

    #[test]
    fn test_explain_mismatch() {
        let registry = Registry::new("m");
        add(&registry, "a", Box::new(eq(1)), Times::once(), "a");
        registry.resolve(&1);

        let lines = registry.explain_mismatch(&1);
        assert_eq!(lines, vec!["`a`: matched but exhausted (once)".to_string()]);
        let lines = registry.explain_mismatch(&2);
        assert_eq!(lines, vec!["`a`: 2 does not equal 1".to_string()]);
    }

    #[test]
    fn test_concurrent_resolution_never_overdraws() {
        let registry = Arc::new(Registry::new("m"));
        add(&registry, "limited", Box::new(anything()), Times::exactly(50), "x");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    (0..20).filter(|i| !registry.resolve(i).is_unexpected()).count()
                })
            })
            .collect();
        let resolved: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(resolved, 50);
        assert_eq!(registry.unexpected_count(), 110);
    }

    #[test]
    fn test_clear() {
        let registry = Registry::new("m");
        add(&registry, "a", Box::new(anything()), Times::unlimited(), "a");
        registry.resolve(&1);
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.resolved_count(), 0);
        assert!(registry.resolve(&1).is_unexpected());
    }
}
