//! Argument captors record the arguments of matched calls.
//!
//! A captor is attached to an expectation with
//! [`capture`](crate::builder::ExpectationBuilder::capture) and receives the
//! arguments every time that expectation is selected. Captors are cheap
//! handles: clone one into the builder and keep the other to inspect.
//!
//! ```rust
//! use testkit_mock::captor::{ArgumentCaptor, Capture, InitedCaptor};
//!
//! let captor = ArgumentCaptor::new();
//! captor.capture(&4);
//! assert_eq!(captor.captured(), vec![4]);
//!
//! let property = InitedCaptor::new(-1);
//! assert_eq!(property.last_captured(), -1);
//! property.capture(&4);
//! assert_eq!(property.last_captured(), 4);
//! ```

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

/// Sink notified with the arguments of every matched call.
pub trait Capture<A: ?Sized>: Send + Sync {
    /// Record the arguments of one call.
    fn capture(&self, args: &A);
}

/// An append-only, thread-safe record of argument values.
pub struct ArgumentCaptor<T> {
    inner: Arc<CaptorInner<T>>,
}

struct CaptorInner<T> {
    values: Mutex<Vec<T>>,
}

impl<T: Clone> ArgumentCaptor<T> {
    /// Creates an empty captor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CaptorInner {
                values: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Appends a value.
    pub fn push(&self, value: T) {
        self.inner.values.lock().push(value);
    }

    /// Snapshot of every captured value, in capture order.
    #[must_use]
    pub fn captured(&self) -> Vec<T> {
        self.inner.values.lock().clone()
    }

    /// The most recent value.
    #[must_use]
    pub fn last_captured(&self) -> Option<T> {
        self.inner.values.lock().last().cloned()
    }

    /// The Nth captured value (0-indexed).
    #[must_use]
    pub fn nth(&self, n: usize) -> Option<T> {
        self.inner.values.lock().get(n).cloned()
    }

    /// Number of captured values.
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.values.lock().len()
    }

    /// Captures a value derived from the call arguments instead of the
    /// arguments themselves.
    ///
    /// ```rust
    /// use testkit_mock::captor::{ArgumentCaptor, Capture};
    ///
    /// let names = ArgumentCaptor::<String>::new();
    /// let by_name = names.projecting(|args: &(u32, String)| args.1.clone());
    ///
    /// by_name.capture(&(7, "ada".to_string()));
    /// assert_eq!(names.captured(), vec!["ada".to_string()]);
    /// ```
    #[must_use]
    pub fn projecting<A, F>(&self, project: F) -> ProjectedCaptor<A, T, F>
    where
        A: ?Sized,
        F: Fn(&A) -> T + Send + Sync,
    {
        ProjectedCaptor {
            target: self.clone(),
            project,
            _phantom: PhantomData,
        }
    }
}

impl<T: Clone> Default for ArgumentCaptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ArgumentCaptor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync> Capture<T> for ArgumentCaptor<T> {
    fn capture(&self, args: &T) {
        self.push(args.clone());
        tracing::trace!(count = self.count(), "argument captured");
    }
}

impl<T: Debug> Debug for ArgumentCaptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentCaptor")
            .field("captured", &*self.inner.values.lock())
            .finish()
    }
}

/// A captor with a fallback value, as used for property mocks.
///
/// [`last_captured`](Self::last_captured) always has an answer: the latest
/// capture, or the initial value before the first one.
pub struct InitedCaptor<T> {
    captor: ArgumentCaptor<T>,
    initial: Arc<T>,
}

impl<T: Clone> InitedCaptor<T> {
    /// Creates an empty captor that falls back to `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            captor: ArgumentCaptor::new(),
            initial: Arc::new(initial),
        }
    }

    /// The most recent value, or the initial value if nothing was captured.
    #[must_use]
    pub fn last_captured(&self) -> T {
        self.captor
            .last_captured()
            .unwrap_or_else(|| T::clone(&self.initial))
    }

    /// The fallback value.
    #[must_use]
    pub fn initial(&self) -> &T {
        &self.initial
    }

    /// Snapshot of every captured value, in capture order.
    #[must_use]
    pub fn captured(&self) -> Vec<T> {
        self.captor.captured()
    }

    /// Number of captured values.
    #[must_use]
    pub fn count(&self) -> usize {
        self.captor.count()
    }
}

impl<T> Clone for InitedCaptor<T> {
    fn clone(&self) -> Self {
        Self {
            captor: self.captor.clone(),
            initial: Arc::clone(&self.initial),
        }
    }
}

impl<T: Clone + Send + Sync> Capture<T> for InitedCaptor<T> {
    fn capture(&self, args: &T) {
        self.captor.capture(args);
    }
}

impl<T: Debug> Debug for InitedCaptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitedCaptor")
            .field("captured", &*self.captor.inner.values.lock())
            .field("initial", &*self.initial)
            .finish()
    }
}

/// Captor feeding an [`ArgumentCaptor`] through a projection of the arguments.
pub struct ProjectedCaptor<A: ?Sized, T, F> {
    target: ArgumentCaptor<T>,
    project: F,
    _phantom: PhantomData<fn(&A)>,
}

impl<A, T, F> Capture<A> for ProjectedCaptor<A, T, F>
where
    A: ?Sized,
    T: Clone + Send + Sync,
    F: Fn(&A) -> T + Send + Sync,
{
    fn capture(&self, args: &A) {
        self.target.push((self.project)(args));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captor_starts_empty() {
        let captor = ArgumentCaptor::<i32>::new();
        assert!(captor.captured().is_empty());
        assert_eq!(captor.last_captured(), None);
        assert_eq!(captor.count(), 0);
    }

    #[test]
    fn test_captor_records_in_order() {
        let captor = ArgumentCaptor::new();
        captor.capture(&1);
        captor.capture(&2);
        captor.capture(&3);

        assert_eq!(captor.captured(), vec![1, 2, 3]);
        assert_eq!(captor.nth(1), Some(2));
        assert_eq!(captor.last_captured(), Some(3));
    }

    #[test]
    fn test_captured_snapshot_is_stable() {
        let captor = ArgumentCaptor::new();
        captor.capture(&"a");
        let first = captor.captured();
        let second = captor.captured();
        assert_eq!(first, second);
    }

    #[test]
    fn test_initial_value_fallback() {
        let captor = InitedCaptor::new(-1);
        assert_eq!(captor.last_captured(), -1);
        assert_eq!(captor.initial(), &-1);
        assert!(captor.captured().is_empty());

        captor.capture(&4);
        captor.capture(&5);
        assert_eq!(captor.last_captured(), 5);
        assert_eq!(captor.count(), 2);
    }

    #[test]
    fn test_clones_share_storage() {
        let captor = ArgumentCaptor::new();
        let handle = captor.clone();
        handle.capture(&10);
        assert_eq!(captor.captured(), vec![10]);
    }

    #[test]
    fn test_projected_captor() {
        let ids = ArgumentCaptor::<u32>::new();
        let projected = ids.projecting(|args: &(u32, &str)| args.0);
        projected.capture(&(1, "x"));
        projected.capture(&(2, "y"));
        assert_eq!(ids.captured(), vec![1, 2]);
    }

    #[test]
    fn test_concurrent_capture() {
        let captor = ArgumentCaptor::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let captor = captor.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        captor.capture(&(i * 100 + j));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(captor.count(), 400);
    }

    #[test]
    fn test_captor_debug() {
        let captor = ArgumentCaptor::new();
        captor.capture(&42);
        let debug = format!("{:?}", captor);
        assert!(debug.contains("ArgumentCaptor"));
        assert!(debug.contains("42"));

        let inited = InitedCaptor::new(7);
        assert!(format!("{:?}", inited).contains("initial: 7"));
    }
}
