mod server_endpoint;
mod server_properties;
