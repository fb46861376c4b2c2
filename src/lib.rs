//! # testkit-mock
//!
//! > Expectation-based test doubles for Rust
//!
//! **testkit-mock** lets a test declare which calls a collaborator should
//! receive, match their arguments, bound how often they may happen, answer
//! them, and wait until they did.
//!
//! ## Quick Start
//!
//! ```rust
//! use testkit_mock::prelude::*;
//!
//! trait Formatter {
//!     fn format(&self, value: i32) -> String;
//! }
//!
//! struct FakeFormatter {
//!     format: MethodMock<i32, String>,
//! }
//!
//! impl Formatter for FakeFormatter {
//!     fn format(&self, value: i32) -> String {
//!         self.format.call_or_default(value)
//!     }
//! }
//!
//! let session = Session::new("formats_two");
//! let fake = FakeFormatter {
//!     format: MethodMock::new(&session, "format"),
//! };
//!
//! fake.format
//!     .expect("two")
//!     .with(eq(2))
//!     .will_once(Action::Return("two".to_string()))
//!     .commit();
//!
//! assert_eq!(fake.format(2), "two");
//! assert!(session.wait_for_expectations());
//! session.end_test();
//! ```
//!
//! ## Features
//!
//! - **Mock points** for methods, callbacks and properties
//! - **Matchers** that compose and explain their mismatches
//! - **Argument captors** that record what was passed
//! - **Waitable expectations**, blocking or async, with optional ordering
//! - **Sessions** that collect failures and fail the test at its end

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod captor;
pub mod config;
pub mod error;
pub mod expectation;
pub mod matcher;
pub mod mock;
pub mod registry;
pub mod session;
pub mod token;

/// Prelude for convenient imports
///
/// ```rust
/// use testkit_mock::prelude::*;
/// ```
pub mod prelude {
    pub use crate::captor::{ArgumentCaptor, Capture, InitedCaptor};
    pub use crate::config::{Config, UnexpectedCallPolicy};
    pub use crate::error::{Error, Result};
    pub use crate::expectation::{Action, Times};
    pub use crate::matcher::*;
    pub use crate::mock::{ClosureMock, MethodMock, SetterMock};
    pub use crate::session::Session;
}

// Re-exports
pub use error::{Error, Result};

// Re-export the test macro when macros feature is enabled
#[cfg(feature = "macros")]
pub use testkit_mock_macros::test;
