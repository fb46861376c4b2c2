//! Matchers over collection arguments (`Vec<T>` and `[T]`).

use std::fmt::Debug;
use std::marker::PhantomData;

use super::Matcher;

// Every collection matcher is written once against a slice and forwarded
// for `Vec<T>`.
macro_rules! forward_vec {
    (impl<$($gen:ident),+> $ty:ty, $elem:ident where $($bound:tt)*) => {
        impl<$($gen),+> Matcher<Vec<$elem>> for $ty
        where
            $($bound)*
        {
            fn matches(&self, value: &Vec<$elem>) -> bool {
                <Self as Matcher<[$elem]>>::matches(self, value.as_slice())
            }

            fn describe(&self) -> String {
                <Self as Matcher<[$elem]>>::describe(self)
            }

            fn describe_mismatch(&self, value: &Vec<$elem>) -> String {
                <Self as Matcher<[$elem]>>::describe_mismatch(self, value.as_slice())
            }
        }
    };
}

/// Create a length matcher for collections.
///
/// ```rust
/// use testkit_mock::matcher::{Matcher, has_length};
///
/// let m = has_length::<i32>(3);
/// assert!(m.matches(&vec![1, 2, 3]));
/// assert!(!m.matches(&vec![1, 2]));
/// ```
pub fn has_length<T>(len: usize) -> HasLengthMatcher<T> {
    HasLengthMatcher {
        length: len,
        _phantom: PhantomData,
    }
}

/// Matcher for collection length.
pub struct HasLengthMatcher<T> {
    length: usize,
    _phantom: PhantomData<fn(&T)>,
}

impl<T: Debug> Matcher<[T]> for HasLengthMatcher<T> {
    fn matches(&self, value: &[T]) -> bool {
        value.len() == self.length
    }

    fn describe(&self) -> String {
        format!("has length {}", self.length)
    }

    fn describe_mismatch(&self, value: &[T]) -> String {
        format!(
            "expected length {}, but was {} (value: {:?})",
            self.length,
            value.len(),
            value
        )
    }
}

forward_vec!(impl<T> HasLengthMatcher<T>, T where T: Debug);

/// Create an is-empty matcher for collections.
pub fn is_empty<T>() -> IsEmptyMatcher<T> {
    IsEmptyMatcher {
        _phantom: PhantomData,
    }
}

/// Matcher for empty collections.
pub struct IsEmptyMatcher<T> {
    _phantom: PhantomData<fn(&T)>,
}

impl<T: Debug> Matcher<[T]> for IsEmptyMatcher<T> {
    fn matches(&self, value: &[T]) -> bool {
        value.is_empty()
    }

    fn describe(&self) -> String {
        "is empty".to_string()
    }

    fn describe_mismatch(&self, value: &[T]) -> String {
        format!("expected empty, but had {} elements: {:?}", value.len(), value)
    }
}

forward_vec!(impl<T> IsEmptyMatcher<T>, T where T: Debug);

/// Create a contains-element matcher for collections.
///
/// ```rust
/// use testkit_mock::matcher::{Matcher, contains};
///
/// let m = contains(2);
/// assert!(m.matches(&vec![1, 2, 3]));
/// assert!(!m.matches(&vec![1, 3]));
/// ```
pub fn contains<T: PartialEq + Debug + Send + Sync>(element: T) -> ContainsMatcher<T> {
    ContainsMatcher { element }
}

/// Matcher for collection contains element.
pub struct ContainsMatcher<T> {
    element: T,
}

impl<T: PartialEq + Debug + Send + Sync> Matcher<[T]> for ContainsMatcher<T> {
    fn matches(&self, value: &[T]) -> bool {
        value.contains(&self.element)
    }

    fn describe(&self) -> String {
        format!("contains {:?}", self.element)
    }

    fn describe_mismatch(&self, value: &[T]) -> String {
        format!("{:?} does not contain {:?}", value, self.element)
    }
}

forward_vec!(impl<T> ContainsMatcher<T>, T where T: PartialEq + Debug + Send + Sync);

/// Create a membership matcher: the argument must be one of `candidates`.
///
/// ```rust
/// use testkit_mock::matcher::{Matcher, is_in};
///
/// let m = is_in(vec!["GET", "HEAD"]);
/// assert!(m.matches(&"HEAD"));
/// assert!(!m.matches(&"POST"));
/// ```
pub fn is_in<T: PartialEq + Debug + Send + Sync>(candidates: Vec<T>) -> IsInMatcher<T> {
    IsInMatcher { candidates }
}

/// Matcher for membership in a fixed set of values.
pub struct IsInMatcher<T> {
    candidates: Vec<T>,
}

impl<T: PartialEq + Debug + Send + Sync> Matcher<T> for IsInMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        self.candidates.contains(value)
    }

    fn describe(&self) -> String {
        format!("is one of {:?}", self.candidates)
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!("{:?} is not one of {:?}", value, self.candidates)
    }
}

/// Create a prefix matcher for collections.
pub fn starts_with_elements<T: PartialEq + Debug + Send + Sync>(
    prefix: Vec<T>,
) -> StartsWithElementsMatcher<T> {
    StartsWithElementsMatcher { prefix }
}

/// Matcher for collections beginning with a given run of elements.
pub struct StartsWithElementsMatcher<T> {
    prefix: Vec<T>,
}

impl<T: PartialEq + Debug + Send + Sync> Matcher<[T]> for StartsWithElementsMatcher<T> {
    fn matches(&self, value: &[T]) -> bool {
        value.starts_with(&self.prefix)
    }

    fn describe(&self) -> String {
        format!("starts with {:?}", self.prefix)
    }

    fn describe_mismatch(&self, value: &[T]) -> String {
        format!("{:?} does not start with {:?}", value, self.prefix)
    }
}

forward_vec!(impl<T> StartsWithElementsMatcher<T>, T where T: PartialEq + Debug + Send + Sync);

/// Create a suffix matcher for collections.
pub fn ends_with_elements<T: PartialEq + Debug + Send + Sync>(
    suffix: Vec<T>,
) -> EndsWithElementsMatcher<T> {
    EndsWithElementsMatcher { suffix }
}

/// Matcher for collections ending with a given run of elements.
pub struct EndsWithElementsMatcher<T> {
    suffix: Vec<T>,
}

impl<T: PartialEq + Debug + Send + Sync> Matcher<[T]> for EndsWithElementsMatcher<T> {
    fn matches(&self, value: &[T]) -> bool {
        value.ends_with(&self.suffix)
    }

    fn describe(&self) -> String {
        format!("ends with {:?}", self.suffix)
    }

    fn describe_mismatch(&self, value: &[T]) -> String {
        format!("{:?} does not end with {:?}", value, self.suffix)
    }
}

forward_vec!(impl<T> EndsWithElementsMatcher<T>, T where T: PartialEq + Debug + Send + Sync);

/// Create a matcher requiring every element to match `inner`.
///
/// An empty collection matches.
///
/// ```rust
/// use testkit_mock::matcher::{Matcher, each, gt};
///
/// let m = each(gt(0));
/// assert!(m.matches(&vec![1, 2, 3]));
/// assert!(!m.matches(&vec![1, 0]));
/// ```
pub fn each<M>(inner: M) -> EachMatcher<M> {
    EachMatcher { inner }
}

/// Matcher applying an element matcher to every element.
pub struct EachMatcher<M> {
    inner: M,
}

impl<T: Debug, M: Matcher<T>> Matcher<[T]> for EachMatcher<M> {
    fn matches(&self, value: &[T]) -> bool {
        value.iter().all(|element| self.inner.matches(element))
    }

    fn describe(&self) -> String {
        format!("each element {}", self.inner.describe())
    }

    fn describe_mismatch(&self, value: &[T]) -> String {
        match value.iter().position(|element| !self.inner.matches(element)) {
            Some(index) => format!(
                "element {}: {}",
                index,
                self.inner.describe_mismatch(&value[index])
            ),
            None => format!("{value:?} matched"),
        }
    }
}

forward_vec!(impl<T, M> EachMatcher<M>, T where T: Debug, M: Matcher<T>);

/// Create a matcher requiring at least one element to match `inner`.
pub fn any_element<M>(inner: M) -> AnyElementMatcher<M> {
    AnyElementMatcher { inner }
}

/// Matcher applying an element matcher until one element matches.
pub struct AnyElementMatcher<M> {
    inner: M,
}

impl<T: Debug, M: Matcher<T>> Matcher<[T]> for AnyElementMatcher<M> {
    fn matches(&self, value: &[T]) -> bool {
        value.iter().any(|element| self.inner.matches(element))
    }

    fn describe(&self) -> String {
        format!("any element {}", self.inner.describe())
    }

    fn describe_mismatch(&self, value: &[T]) -> String {
        format!("no element of {:?} {}", value, self.inner.describe())
    }
}

forward_vec!(impl<T, M> AnyElementMatcher<M>, T where T: Debug, M: Matcher<T>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{eq, gt};

    #[test]
    fn test_has_length_matcher() {
        let m = has_length::<i32>(3);
        assert!(m.matches(&vec![1, 2, 3]));
        assert!(!m.matches(&vec![1, 2]));
        assert!(Matcher::<[i32]>::matches(&m, &[4, 5, 6][..]));
    }

    #[test]
    fn test_is_empty_matcher() {
        let m = is_empty::<i32>();
        assert!(m.matches(&Vec::<i32>::new()));
        assert!(!m.matches(&vec![1]));
    }

    #[test]
    fn test_contains_matcher() {
        let m = contains(2);
        assert!(m.matches(&vec![1, 2, 3]));
        assert!(!m.matches(&vec![1, 3]));
    }

    #[test]
    fn test_is_in_matcher() {
        let m = is_in(vec![1, 2]);
        assert!(m.matches(&2));
        assert!(!m.matches(&3));
        assert_eq!(m.describe(), "is one of [1, 2]");
    }

    #[test]
    fn test_prefix_and_suffix() {
        assert!(starts_with_elements(vec![1, 2]).matches(&vec![1, 2, 3]));
        assert!(!starts_with_elements(vec![2]).matches(&vec![1, 2, 3]));
        assert!(ends_with_elements(vec![2, 3]).matches(&vec![1, 2, 3]));
        assert!(!ends_with_elements(vec![1, 2, 3, 4]).matches(&vec![1, 2, 3]));
    }

    #[test]
    fn test_each_matcher() {
        let m = each(gt(0));
        assert!(m.matches(&vec![1, 2, 3]));
        assert!(m.matches(&Vec::<i32>::new()));
        assert!(!m.matches(&vec![1, -1]));
        assert_eq!(m.describe_mismatch(&vec![1, -1]), "element 1: -1 is not greater than 0");
    }

    #[test]
    fn test_any_element_matcher() {
        let m = any_element(eq(3));
        assert!(m.matches(&vec![1, 3]));
        assert!(!m.matches(&vec![1, 2]));
        assert!(!m.matches(&Vec::<i32>::new()));
    }
}
