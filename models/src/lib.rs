//! Domain models for the embedded server.
//!
//! Plain data describing what to launch (`ServerProperties`) and where to reach it
//! once it runs (`ServerEndpoint`). Construction goes through validating builders;
//! the lifecycle logic that consumes these lives in `server-core`.

pub mod error;
pub mod server_endpoint;
pub mod server_properties;

pub use common::ErrorLocation;
pub use error::model_error::ModelError;
pub use server_endpoint::ServerEndpoint;
pub use server_endpoint::builder::ServerEndpointBuilder;
pub use server_properties::ServerProperties;
pub use server_properties::builder::ServerPropertiesBuilder;

#[cfg(test)]
mod tests;
