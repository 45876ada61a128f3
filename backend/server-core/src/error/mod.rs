pub mod config;
pub mod connection;
pub mod port;
pub mod server;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Port(#[from] port::PortError),

    #[error(transparent)]
    Server(#[from] server::ServerError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Connection(#[from] connection::ConnectionError),
}
