//! Embedded server processes: what to launch, how to tell it is ready, and the
//! lifecycle handle that owns it.

pub mod engine;
pub(crate) mod executable;
pub mod kind;
pub mod lifecycle;
pub mod managed;
pub mod readiness;
