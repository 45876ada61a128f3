mod config;
mod connection;
mod error;
mod helpers;
mod port;
mod server;
