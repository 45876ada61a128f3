//! Shared building blocks for the embedded server workspace.
//!
//! Everything here is dependency-light so that `models`, `server-core` and the
//! application crate can all share one notion of "where did this error come from".

pub mod error;

pub use error::error_location::ErrorLocation;
