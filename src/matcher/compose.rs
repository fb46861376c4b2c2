//! Combinators that build matchers out of other matchers.

use std::any::{type_name, Any};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use super::Matcher;

/// Create a matcher that matches when all matchers match.
///
/// All matchers in the vector must be the same type. For different matcher
/// types, use [`all_of_boxed`] instead.
///
/// ```rust
/// use testkit_mock::matcher::{Matcher, all_of, gt};
///
/// let m = all_of(vec![gt(0), gt(10), gt(20)]);
/// assert!(m.matches(&50));
/// assert!(!m.matches(&15));
/// ```
pub fn all_of<T, M>(matchers: Vec<M>) -> AllOfMatcher<T>
where
    T: ?Sized,
    M: Matcher<T> + 'static,
{
    AllOfMatcher {
        matchers: matchers
            .into_iter()
            .map(|m| Box::new(m) as Box<dyn Matcher<T>>)
            .collect(),
    }
}

/// Create an all-of matcher from boxed matchers of different types.
///
/// ```rust
/// use testkit_mock::matcher::{Matcher, all_of_boxed, gt, lt};
///
/// let matchers: Vec<Box<dyn Matcher<i32>>> = vec![Box::new(gt(0)), Box::new(lt(100))];
/// let m = all_of_boxed(matchers);
/// assert!(m.matches(&50));
/// assert!(!m.matches(&0));
/// ```
pub fn all_of_boxed<T: ?Sized>(matchers: Vec<Box<dyn Matcher<T>>>) -> AllOfMatcher<T> {
    AllOfMatcher { matchers }
}

/// Matcher that requires all inner matchers to match.
///
/// An empty list matches everything.
pub struct AllOfMatcher<T: ?Sized> {
    matchers: Vec<Box<dyn Matcher<T>>>,
}

impl<T: ?Sized> Matcher<T> for AllOfMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        self.matchers.iter().all(|m| m.matches(value))
    }

    fn describe(&self) -> String {
        let descriptions: Vec<_> = self.matchers.iter().map(|m| m.describe()).collect();
        format!("all of [{}]", descriptions.join(", "))
    }

    fn describe_mismatch(&self, value: &T) -> String {
        let failures: Vec<_> = self
            .matchers
            .iter()
            .filter(|m| !m.matches(value))
            .map(|m| m.describe_mismatch(value))
            .collect();
        format!("failed: {}", failures.join("; "))
    }
}

/// Create a matcher that matches when any matcher matches.
///
/// ```rust
/// use testkit_mock::matcher::{Matcher, any_of, eq};
///
/// let m = any_of(vec![eq(1), eq(2), eq(3)]);
/// assert!(m.matches(&2));
/// assert!(!m.matches(&4));
/// ```
pub fn any_of<T, M>(matchers: Vec<M>) -> AnyOfMatcher<T>
where
    T: ?Sized,
    M: Matcher<T> + 'static,
{
    AnyOfMatcher {
        matchers: matchers
            .into_iter()
            .map(|m| Box::new(m) as Box<dyn Matcher<T>>)
            .collect(),
    }
}

/// Create an any-of matcher from boxed matchers of different types.
pub fn any_of_boxed<T: ?Sized>(matchers: Vec<Box<dyn Matcher<T>>>) -> AnyOfMatcher<T> {
    AnyOfMatcher { matchers }
}

/// Matcher that requires at least one inner matcher to match.
///
/// An empty list matches nothing.
pub struct AnyOfMatcher<T: ?Sized> {
    matchers: Vec<Box<dyn Matcher<T>>>,
}

impl<T: ?Sized> Matcher<T> for AnyOfMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        self.matchers.iter().any(|m| m.matches(value))
    }

    fn describe(&self) -> String {
        let descriptions: Vec<_> = self.matchers.iter().map(|m| m.describe()).collect();
        format!("any of [{}]", descriptions.join(", "))
    }

    fn describe_mismatch(&self, value: &T) -> String {
        let failures: Vec<_> = self
            .matchers
            .iter()
            .map(|m| m.describe_mismatch(value))
            .collect();
        format!("matched none of: {}", failures.join("; "))
    }
}

/// Create a negating matcher.
///
/// ```rust
/// use testkit_mock::matcher::{Matcher, not, eq};
///
/// let m = not(eq(0));
/// assert!(m.matches(&1));
/// assert!(!m.matches(&0));
/// ```
pub fn not<T: ?Sized, M: Matcher<T> + 'static>(matcher: M) -> NotMatcher<T> {
    NotMatcher {
        inner: Box::new(matcher),
    }
}

/// Matcher that negates another matcher.
pub struct NotMatcher<T: ?Sized> {
    inner: Box<dyn Matcher<T>>,
}

impl<T: ?Sized> Matcher<T> for NotMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        !self.inner.matches(value)
    }

    fn describe(&self) -> String {
        format!("not {}", self.inner.describe())
    }

    fn describe_mismatch(&self, _value: &T) -> String {
        format!("unexpectedly matched: {}", self.inner.describe())
    }
}

/// Create a matcher that applies `inner` to a field derived from the argument.
///
/// ```rust
/// use testkit_mock::matcher::{Matcher, field, gte};
///
/// struct User {
///     age: u32,
/// }
///
/// let adult = field("age", |u: &User| u.age, gte(18));
/// assert!(adult.matches(&User { age: 30 }));
/// assert!(!adult.matches(&User { age: 12 }));
/// ```
pub fn field<T, U, F, M>(name: &str, project: F, inner: M) -> FieldMatcher<T, U, F, M>
where
    F: Fn(&T) -> U + Send + Sync,
    M: Matcher<U>,
{
    FieldMatcher {
        name: name.to_string(),
        project,
        inner,
        _phantom: PhantomData,
    }
}

/// Matcher over a projected field of a structured argument.
pub struct FieldMatcher<T, U, F, M> {
    name: String,
    project: F,
    inner: M,
    _phantom: PhantomData<fn(&T) -> U>,
}

impl<T, U, F, M> Matcher<T> for FieldMatcher<T, U, F, M>
where
    F: Fn(&T) -> U + Send + Sync,
    M: Matcher<U>,
{
    fn matches(&self, value: &T) -> bool {
        self.inner.matches(&(self.project)(value))
    }

    fn describe(&self) -> String {
        format!("field `{}` {}", self.name, self.inner.describe())
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!(
            "field `{}`: {}",
            self.name,
            self.inner.describe_mismatch(&(self.project)(value))
        )
    }
}

/// Create a matcher for `None`.
pub fn is_none<T>() -> IsNoneMatcher<T> {
    IsNoneMatcher {
        _phantom: PhantomData,
    }
}

/// Matcher for an absent optional argument.
pub struct IsNoneMatcher<T> {
    _phantom: PhantomData<fn(&T)>,
}

impl<T: Debug> Matcher<Option<T>> for IsNoneMatcher<T> {
    fn matches(&self, value: &Option<T>) -> bool {
        value.is_none()
    }

    fn describe(&self) -> String {
        "is None".to_string()
    }

    fn describe_mismatch(&self, value: &Option<T>) -> String {
        format!("{value:?} is not None")
    }
}

/// Create a matcher for any `Some(_)`.
pub fn is_some<T>() -> IsSomeMatcher<T> {
    IsSomeMatcher {
        _phantom: PhantomData,
    }
}

/// Matcher for a present optional argument.
pub struct IsSomeMatcher<T> {
    _phantom: PhantomData<fn(&T)>,
}

impl<T> Matcher<Option<T>> for IsSomeMatcher<T> {
    fn matches(&self, value: &Option<T>) -> bool {
        value.is_some()
    }

    fn describe(&self) -> String {
        "is Some".to_string()
    }

    fn describe_mismatch(&self, _value: &Option<T>) -> String {
        "None is not Some".to_string()
    }
}

/// Lift a matcher over the payload of an optional argument. `None` never matches.
///
/// ```rust
/// use testkit_mock::matcher::{Matcher, some, eq};
///
/// let m = some(eq(3));
/// assert!(m.matches(&Some(3)));
/// assert!(!m.matches(&Some(4)));
/// assert!(!m.matches(&None));
/// ```
pub fn some<M>(inner: M) -> SomeMatcher<M> {
    SomeMatcher { inner }
}

/// Matcher applying an inner matcher to `Some` payloads.
pub struct SomeMatcher<M> {
    inner: M,
}

impl<T, M: Matcher<T>> Matcher<Option<T>> for SomeMatcher<M> {
    fn matches(&self, value: &Option<T>) -> bool {
        value.as_ref().is_some_and(|inner| self.inner.matches(inner))
    }

    fn describe(&self) -> String {
        format!("is Some and {}", self.inner.describe())
    }

    fn describe_mismatch(&self, value: &Option<T>) -> String {
        match value {
            Some(inner) => self.inner.describe_mismatch(inner),
            None => "None is not Some".to_string(),
        }
    }
}

/// Downcast a type-erased argument to `T` before applying `inner`.
///
/// Fails to match when the argument holds a different concrete type.
///
/// ```rust
/// use std::any::Any;
/// use testkit_mock::matcher::{Matcher, downcast, eq};
///
/// let m = downcast::<i32, _>(eq(5));
/// let five: Box<dyn Any + Send> = Box::new(5_i32);
/// let text: Box<dyn Any + Send> = Box::new("five");
/// assert!(m.matches(&five));
/// assert!(!m.matches(&text));
/// ```
pub fn downcast<T: Any, M: Matcher<T>>(inner: M) -> DowncastMatcher<T, M> {
    DowncastMatcher {
        inner,
        _phantom: PhantomData,
    }
}

/// Matcher over a concrete type hidden behind `dyn Any`.
pub struct DowncastMatcher<T, M> {
    inner: M,
    _phantom: PhantomData<fn(&T)>,
}

impl<T: Any, M: Matcher<T>> Matcher<dyn Any> for DowncastMatcher<T, M> {
    fn matches(&self, value: &dyn Any) -> bool {
        value
            .downcast_ref::<T>()
            .is_some_and(|concrete| self.inner.matches(concrete))
    }

    fn describe(&self) -> String {
        format!("is a {} that {}", type_name::<T>(), self.inner.describe())
    }

    fn describe_mismatch(&self, value: &dyn Any) -> String {
        match value.downcast_ref::<T>() {
            Some(concrete) => self.inner.describe_mismatch(concrete),
            None => format!("value is not a {}", type_name::<T>()),
        }
    }
}

// Smart-pointer forms forward to the `dyn Any` impl; the explicit reborrow
// keeps the pointer itself from being treated as the `Any` value.
macro_rules! forward_any {
    ($($ptr:ty),+) => {
        $(
            impl<T: Any, M: Matcher<T>> Matcher<$ptr> for DowncastMatcher<T, M> {
                fn matches(&self, value: &$ptr) -> bool {
                    let erased: &dyn Any = &**value;
                    <Self as Matcher<dyn Any>>::matches(self, erased)
                }

                fn describe(&self) -> String {
                    <Self as Matcher<dyn Any>>::describe(self)
                }

                fn describe_mismatch(&self, value: &$ptr) -> String {
                    let erased: &dyn Any = &**value;
                    <Self as Matcher<dyn Any>>::describe_mismatch(self, erased)
                }
            }
        )+
    };
}

forward_any!(Box<dyn Any>, Box<dyn Any + Send>, Arc<dyn Any + Send + Sync>);
