//! Matchers over single values: equality, ordering and strings.

use std::fmt::Debug;
use std::marker::PhantomData;

use super::Matcher;

/// Create an equality matcher.
///
/// This is what [`with_value`](crate::builder::ExpectationBuilder::with_value)
/// uses under the hood.
///
/// # Example
///
/// ```rust
/// use testkit_mock::matcher::{Matcher, eq};
///
/// let m = eq(42);
/// assert!(m.matches(&42));
/// assert!(!m.matches(&0));
/// ```
pub fn eq<T: PartialEq + Debug + Send + Sync>(expected: T) -> EqMatcher<T> {
    EqMatcher { expected }
}

/// Matcher for equality.
pub struct EqMatcher<T> {
    expected: T,
}

impl<T: PartialEq + Debug + Send + Sync> Matcher<T> for EqMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        value == &self.expected
    }

    fn describe(&self) -> String {
        format!("equals {:?}", self.expected)
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!("{:?} does not equal {:?}", value, self.expected)
    }
}

/// Create an inequality matcher.
pub fn ne<T: PartialEq + Debug + Send + Sync>(unexpected: T) -> NeMatcher<T> {
    NeMatcher { unexpected }
}

/// Matcher for inequality.
pub struct NeMatcher<T> {
    unexpected: T,
}

impl<T: PartialEq + Debug + Send + Sync> Matcher<T> for NeMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        value != &self.unexpected
    }

    fn describe(&self) -> String {
        format!("does not equal {:?}", self.unexpected)
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!("{:?} equals {:?}", value, self.unexpected)
    }
}

// The four ordering matchers only differ in operator and wording.
macro_rules! ordering_matcher {
    ($(#[$meta:meta])* $ctor:ident, $name:ident, $op:tt, $wording:literal, $negated:literal) => {
        $(#[$meta])*
        pub fn $ctor<T: PartialOrd + Debug + Send + Sync>(threshold: T) -> $name<T> {
            $name { threshold }
        }

        #[doc = concat!("Matcher for values that ", $wording, " a threshold.")]
        pub struct $name<T> {
            threshold: T,
        }

        impl<T: PartialOrd + Debug + Send + Sync> Matcher<T> for $name<T> {
            fn matches(&self, value: &T) -> bool {
                value $op &self.threshold
            }

            fn describe(&self) -> String {
                format!(concat!($wording, " {:?}"), self.threshold)
            }

            fn describe_mismatch(&self, value: &T) -> String {
                format!(concat!("{:?} ", $negated, " {:?}"), value, self.threshold)
            }
        }
    };
}

ordering_matcher!(
    /// Create a greater-than matcher.
    ///
    /// ```rust
    /// use testkit_mock::matcher::{Matcher, gt};
    ///
    /// assert!(gt(10).matches(&20));
    /// assert!(!gt(10).matches(&10));
    /// ```
    gt, GtMatcher, >, "is greater than", "is not greater than"
);
ordering_matcher!(
    /// Create a greater-than-or-equal matcher.
    gte, GteMatcher, >=, "is greater than or equal to", "is not greater than or equal to"
);
ordering_matcher!(
    /// Create a less-than matcher.
    lt, LtMatcher, <, "is less than", "is not less than"
);
ordering_matcher!(
    /// Create a less-than-or-equal matcher.
    lte, LteMatcher, <=, "is less than or equal to", "is not less than or equal to"
);

// String matchers work on `String`, `str` and `&str` arguments alike.
macro_rules! string_matcher_impls {
    ($name:ident, |$this:ident, $value:ident| $test:expr, $describe:literal, $mismatch:literal, $field:ident) => {
        impl Matcher<str> for $name {
            fn matches(&self, $value: &str) -> bool {
                let $this = self;
                $test
            }

            fn describe(&self) -> String {
                format!($describe, self.$field)
            }

            fn describe_mismatch(&self, value: &str) -> String {
                format!($mismatch, value, self.$field)
            }
        }

        impl Matcher<String> for $name {
            fn matches(&self, value: &String) -> bool {
                <Self as Matcher<str>>::matches(self, value.as_str())
            }

            fn describe(&self) -> String {
                <Self as Matcher<str>>::describe(self)
            }

            fn describe_mismatch(&self, value: &String) -> String {
                <Self as Matcher<str>>::describe_mismatch(self, value.as_str())
            }
        }

        impl<'a> Matcher<&'a str> for $name {
            fn matches(&self, value: &&'a str) -> bool {
                <Self as Matcher<str>>::matches(self, value)
            }

            fn describe(&self) -> String {
                <Self as Matcher<str>>::describe(self)
            }

            fn describe_mismatch(&self, value: &&'a str) -> String {
                <Self as Matcher<str>>::describe_mismatch(self, value)
            }
        }
    };
}

/// Create a case-insensitive string equality matcher.
///
/// ```rust
/// use testkit_mock::matcher::{Matcher, eq_ignore_case};
///
/// assert!(eq_ignore_case("Hello").matches("hELLO"));
/// ```
pub fn eq_ignore_case(expected: &str) -> EqIgnoreCaseMatcher {
    EqIgnoreCaseMatcher {
        expected: expected.to_string(),
    }
}

/// Matcher for case-insensitive string equality.
pub struct EqIgnoreCaseMatcher {
    expected: String,
}

string_matcher_impls!(
    EqIgnoreCaseMatcher,
    |this, value| value.to_lowercase() == this.expected.to_lowercase(),
    "equals {:?} ignoring case",
    "{:?} does not equal {:?} ignoring case",
    expected
);

/// Create a substring matcher.
pub fn contains_str(substring: &str) -> ContainsStrMatcher {
    ContainsStrMatcher {
        substring: substring.to_string(),
    }
}

/// Matcher for string contains.
pub struct ContainsStrMatcher {
    substring: String,
}

string_matcher_impls!(
    ContainsStrMatcher,
    |this, value| value.contains(&this.substring),
    "contains {:?}",
    "{:?} does not contain {:?}",
    substring
);

/// Create a starts-with matcher for strings.
pub fn starts_with(prefix: &str) -> StartsWithMatcher {
    StartsWithMatcher {
        prefix: prefix.to_string(),
    }
}

/// Matcher for string starts-with.
pub struct StartsWithMatcher {
    prefix: String,
}

string_matcher_impls!(
    StartsWithMatcher,
    |this, value| value.starts_with(&this.prefix),
    "starts with {:?}",
    "{:?} does not start with {:?}",
    prefix
);

/// Create an ends-with matcher for strings.
pub fn ends_with(suffix: &str) -> EndsWithMatcher {
    EndsWithMatcher {
        suffix: suffix.to_string(),
    }
}

/// Matcher for string ends-with.
pub struct EndsWithMatcher {
    suffix: String,
}

string_matcher_impls!(
    EndsWithMatcher,
    |this, value| value.ends_with(&this.suffix),
    "ends with {:?}",
    "{:?} does not end with {:?}",
    suffix
);

/// Create a matcher that always matches.
///
/// Expectations registered without [`with`](crate::builder::ExpectationBuilder::with)
/// use this.
pub fn anything<T: ?Sized>() -> AnythingMatcher<T> {
    AnythingMatcher {
        _phantom: PhantomData,
    }
}

/// Matcher that matches anything.
pub struct AnythingMatcher<T: ?Sized> {
    _phantom: PhantomData<fn(&T)>,
}

impl<T: ?Sized> Matcher<T> for AnythingMatcher<T> {
    fn matches(&self, _value: &T) -> bool {
        true
    }

    fn describe(&self) -> String {
        "anything".to_string()
    }

    fn describe_mismatch(&self, _value: &T) -> String {
        "matches anything".to_string()
    }
}

/// Create a predicate-based matcher.
///
/// ```rust
/// use testkit_mock::matcher::{Matcher, satisfies};
///
/// let m = satisfies(|x: &i32| *x % 2 == 0, "is even");
/// assert!(m.matches(&4));
/// assert!(!m.matches(&3));
/// ```
pub fn satisfies<T, F>(predicate: F, description: &str) -> PredicateMatcher<T, F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    PredicateMatcher {
        predicate,
        description: description.to_string(),
        _phantom: PhantomData,
    }
}

/// Matcher based on a predicate function.
pub struct PredicateMatcher<T, F> {
    predicate: F,
    description: String,
    _phantom: PhantomData<fn(&T)>,
}

impl<T: Debug, F: Fn(&T) -> bool + Send + Sync> Matcher<T> for PredicateMatcher<T, F> {
    fn matches(&self, value: &T) -> bool {
        (self.predicate)(value)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!("{:?} does not satisfy: {}", value, self.description)
    }
}
