//! Mock points: the call-site-facing side of the framework.
//!
//! A mock point stands in for one member of a collaborator. Tests register
//! expectations on it; the code under test calls it. Three shapes are
//! provided:
//!
//! - [`MethodMock`] for methods, with tuple arguments and an optional error
//! - [`ClosureMock`] for callbacks handed to the code under test
//! - [`SetterMock`] for properties whose writes should be observed
//!
//! Every mock point reports to the [`Session`](crate::session::Session) it
//! was created in, and the expectations it commits add tokens to that
//! session's pool.

mod closure;
mod method;
mod setter;

pub use closure::ClosureMock;
pub use method::MethodMock;
pub use setter::SetterMock;
