// Matcher factories are usually handed straight to a builder, so returning
// them without binding is the common pattern
#![allow(clippy::must_use_candidate)]

//! Argument matchers for expectations.
//!
//! A matcher decides whether an expectation applies to the arguments of a
//! call. Matchers are stateless predicates that also know how to describe
//! themselves, which is what ends up in failure messages.
//!
//! - [`Matcher`] trait for custom matchers
//! - Value matchers: [`eq`], [`ne`], [`gt`], [`lt`], [`eq_ignore_case`], ...
//! - Collection matchers: [`contains`], [`has_length`], [`each`], ...
//! - Combinators: [`all_of`], [`any_of`], [`not`], [`field`], [`some`], [`downcast`]
//!
//! Tuples of matchers match tuples of arguments slot by slot, so a mock with
//! `(i32, String)` arguments accepts `(eq(1), starts_with("a"))`.
//!
//! # Example
//!
//! ```rust
//! use testkit_mock::matcher::{eq, gt, not, Matcher};
//!
//! assert!(eq(42).matches(&42));
//! assert!(gt(0).matches(&50));
//! assert!(not(eq(0)).matches(&1));
//! assert!((eq(1), gt(10)).matches(&(1, 11)));
//! ```

mod collection;
mod compose;
mod value;

pub use collection::{
    any_element, contains, each, ends_with_elements, has_length, is_empty, is_in,
    starts_with_elements, AnyElementMatcher, ContainsMatcher, EachMatcher, EndsWithElementsMatcher,
    HasLengthMatcher, IsEmptyMatcher, IsInMatcher, StartsWithElementsMatcher,
};
pub use compose::{
    all_of, all_of_boxed, any_of, any_of_boxed, downcast, field, is_none, is_some, not, some,
    AllOfMatcher, AnyOfMatcher, DowncastMatcher, FieldMatcher, IsNoneMatcher, IsSomeMatcher,
    NotMatcher, SomeMatcher,
};
pub use value::{
    anything, contains_str, ends_with, eq, eq_ignore_case, gt, gte, lt, lte, ne, satisfies,
    starts_with, AnythingMatcher, ContainsStrMatcher, EndsWithMatcher, EqIgnoreCaseMatcher,
    EqMatcher, GtMatcher, GteMatcher, LtMatcher, LteMatcher, NeMatcher, PredicateMatcher,
    StartsWithMatcher,
};

/// A predicate over call arguments.
///
/// Matchers are shared between the thread that registers an expectation and
/// whichever thread ends up calling the mock, hence the `Send + Sync` bound.
///
/// # Implementing Custom Matchers
///
/// ```rust
/// use testkit_mock::matcher::Matcher;
///
/// struct IsEven;
///
/// impl Matcher<i32> for IsEven {
///     fn matches(&self, value: &i32) -> bool {
///         value % 2 == 0
///     }
///
///     fn describe(&self) -> String {
///         "is even".to_string()
///     }
///
///     fn describe_mismatch(&self, value: &i32) -> String {
///         format!("{} is not even", value)
///     }
/// }
///
/// assert!(IsEven.matches(&4));
/// assert!(!IsEven.matches(&3));
/// ```
pub trait Matcher<T: ?Sized>: Send + Sync {
    /// Check if the value matches.
    fn matches(&self, value: &T) -> bool;

    /// Describe what this matcher expects.
    fn describe(&self) -> String;

    /// Describe why a value didn't match.
    fn describe_mismatch(&self, value: &T) -> String;
}

/// Assert that a value matches a matcher.
///
/// Handy for checking what an [`ArgumentCaptor`](crate::captor::ArgumentCaptor)
/// recorded.
///
/// # Panics
///
/// Panics with a descriptive message if the value doesn't match.
///
/// # Example
///
/// ```rust
/// use testkit_mock::{assert_that, matcher::eq};
///
/// assert_that!(42, eq(42));
/// ```
#[macro_export]
macro_rules! assert_that {
    ($value:expr, $matcher:expr) => {{
        let value = &$value;
        let matcher = &$matcher;
        if !$crate::matcher::Matcher::matches(matcher, value) {
            panic!(
                "assertion failed: {}\n  expected: {}\n  got: {:?}",
                $crate::matcher::Matcher::describe_mismatch(matcher, value),
                $crate::matcher::Matcher::describe(matcher),
                value
            );
        }
    }};
    ($value:expr, $matcher:expr, $($arg:tt)+) => {{
        let value = &$value;
        let matcher = &$matcher;
        if !$crate::matcher::Matcher::matches(matcher, value) {
            panic!(
                "assertion failed: {}\n  expected: {}\n  got: {:?}\n  message: {}",
                $crate::matcher::Matcher::describe_mismatch(matcher, value),
                $crate::matcher::Matcher::describe(matcher),
                value,
                format_args!($($arg)+)
            );
        }
    }};
}

impl<T: ?Sized> Matcher<T> for Box<dyn Matcher<T>> {
    fn matches(&self, value: &T) -> bool {
        (**self).matches(value)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn describe_mismatch(&self, value: &T) -> String {
        (**self).describe_mismatch(value)
    }
}

// One matcher per tuple slot; every slot has to match.
macro_rules! tuple_matcher {
    ($(($arg:ident, $m:ident, $idx:tt)),+) => {
        impl<$($arg,)+ $($m,)+> Matcher<($($arg,)+)> for ($($m,)+)
        where
            $($m: Matcher<$arg>,)+
        {
            fn matches(&self, value: &($($arg,)+)) -> bool {
                $(self.$idx.matches(&value.$idx))&&+
            }

            fn describe(&self) -> String {
                let slots: Vec<String> = vec![$(self.$idx.describe()),+];
                format!("({})", slots.join(", "))
            }

            fn describe_mismatch(&self, value: &($($arg,)+)) -> String {
                let mut failures = Vec::new();
                $(
                    if !self.$idx.matches(&value.$idx) {
                        failures.push(format!(
                            "argument {}: {}",
                            $idx,
                            self.$idx.describe_mismatch(&value.$idx)
                        ));
                    }
                )+
                failures.join("; ")
            }
        }
    };
}

tuple_matcher!((A0, M0, 0));
tuple_matcher!((A0, M0, 0), (A1, M1, 1));
tuple_matcher!((A0, M0, 0), (A1, M1, 1), (A2, M2, 2));
tuple_matcher!((A0, M0, 0), (A1, M1, 1), (A2, M2, 2), (A3, M3, 3));
tuple_matcher!((A0, M0, 0), (A1, M1, 1), (A2, M2, 2), (A3, M3, 3), (A4, M4, 4));
tuple_matcher!(
    (A0, M0, 0),
    (A1, M1, 1),
    (A2, M2, 2),
    (A3, M3, 3),
    (A4, M4, 4),
    (A5, M5, 5)
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_matcher_all_slots() {
        let m = (eq(1), starts_with("ab"));
        assert!(m.matches(&(1, "abc".to_string())));
        assert!(!m.matches(&(2, "abc".to_string())));
        assert!(!m.matches(&(1, "xbc".to_string())));
    }

    #[test]
    fn test_tuple_matcher_describe() {
        let m = (eq(1), gt(2), lt(3));
        assert_eq!(
            m.describe(),
            "(equals 1, is greater than 2, is less than 3)"
        );
    }

    #[test]
    fn test_tuple_matcher_mismatch_names_slot() {
        let m = (eq(1), eq(2));
        let text = m.describe_mismatch(&(1, 5));
        assert!(text.starts_with("argument 1:"));
        assert!(!text.contains("argument 0"));
    }

    #[test]
    fn test_single_slot_tuple() {
        assert!((eq(7),).matches(&(7,)));
    }

    #[test]
    fn test_assert_that_macro() {
        assert_that!(42, eq(42));
        assert_that!(Some(4), some(gt(3)));
        assert_that!("hello", satisfies(|s: &&str| s.contains("ell"), "contains 'ell'"));
    }

    #[test]
    #[should_panic(expected = "does not equal")]
    fn test_assert_that_fails() {
        assert_that!(42, eq(0));
    }

    #[test]
    fn test_boxed_matcher_delegates() {
        let m: Box<dyn Matcher<i32>> = Box::new(gte(3));
        assert!(m.matches(&3));
        assert_eq!(m.describe(), "is greater than or equal to 3");
    }
}
