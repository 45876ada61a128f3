use server_core::connection::{ClientDriver, Connection, ConnectionFactory};
use server_core::error::CoreError;
use server_core::error::connection::ConnectionError;
use server_core::error::server::ServerError;
use server_core::{ManagedServerProcess, ServerFamily};

use models::{ServerEndpoint, ServerEndpointBuilder};

use std::sync::Arc;

use tokio::net::TcpListener;

/// Accepts and holds connections until the test ends.
async fn accepting_listener() -> ServerEndpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    ServerEndpointBuilder::default()
        .with_host("127.0.0.1")
        .with_port(port)
        .build()
        .unwrap()
}

/// **VALUE**: Verifies that the multiplexed driver hands out one shared stream.
///
/// **WHY THIS MATTERS**: Multiplexing exists so a test suite opens one socket, not one per
/// call. Opening a new stream each time exhausts server client slots.
///
/// **BUG THIS CATCHES**: Would catch the shared stream not being cached after first use.
#[tokio::test]
async fn given_multiplexed_driver_when_connected_twice_then_same_stream_shared() {
    // GIVEN: A listening endpoint and a multiplexed factory
    let endpoint = accepting_listener().await;
    let factory = ConnectionFactory::new(endpoint, ClientDriver::Multiplexed);

    // WHEN: Asking for two connections
    let first = factory.connection().await.unwrap();
    let second = factory.connection().await.unwrap();

    // THEN: Both point at the same stream
    match (first, second) {
        (Connection::Shared(a), Connection::Shared(b)) => assert!(Arc::ptr_eq(&a, &b)),
        other => panic!("Expected shared connections, got {other:?}"),
    }
}

/// **VALUE**: Verifies that the dedicated driver opens a fresh stream per call.
#[tokio::test]
async fn given_dedicated_driver_when_connected_twice_then_distinct_streams() {
    let endpoint = accepting_listener().await;
    let factory = ConnectionFactory::new(endpoint, ClientDriver::Dedicated);

    let first = factory.connection().await.unwrap();
    let second = factory.connection().await.unwrap();

    match (first, second) {
        (Connection::Dedicated(a), Connection::Dedicated(b)) => {
            assert_ne!(a.local_addr().unwrap(), b.local_addr().unwrap());
        }
        other => panic!("Expected dedicated connections, got {other:?}"),
    }
}

/// **VALUE**: Verifies that an unreachable server is reported as a connect error.
#[tokio::test]
async fn given_closed_port_when_connecting_then_returns_connect_error() {
    // GIVEN: A port that was just released
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let endpoint = ServerEndpointBuilder::default()
        .with_host("127.0.0.1")
        .with_port(port)
        .build()
        .unwrap();

    // WHEN: Connecting
    let result = ConnectionFactory::new(endpoint, ClientDriver::Dedicated)
        .connection()
        .await;

    // THEN: Connect error naming the address
    match result {
        Err(ConnectionError::Connect { message, .. }) => {
            assert!(message.contains(&format!("127.0.0.1:{port}")));
        }
        other => panic!("Expected connect error, got {other:?}"),
    }
}

#[test]
fn given_endpoint_when_url_built_then_uses_redis_scheme() {
    let endpoint = ServerEndpointBuilder::default()
        .with_host("127.0.0.1")
        .with_port(6400)
        .build()
        .unwrap();

    let factory = ConnectionFactory::new(endpoint, ClientDriver::default());

    assert_eq!(factory.url(), "redis://127.0.0.1:6400");
    assert_eq!(factory.driver(), ClientDriver::Multiplexed);
}

/// **VALUE**: Verifies that a factory cannot be built for a handle without an engine.
///
/// **BUG THIS CATCHES**: Would catch a factory silently pointing at the default port of a
/// server that does not exist.
#[test]
fn given_uninitialized_handle_when_factory_requested_then_fails() {
    let handle = ManagedServerProcess::new(ServerFamily::Redis);

    let result = ConnectionFactory::for_server(&handle, ClientDriver::Dedicated);

    assert!(matches!(
        result,
        Err(CoreError::Server(ServerError::Uninitialized { .. }))
    ));
}

#[cfg(unix)]
#[test]
fn given_initialized_handle_when_factory_requested_then_targets_engine_port() {
    use crate::helpers::{READY_SCRIPT, fake_server};
    use server_core::PortResolver;

    let fake = fake_server(READY_SCRIPT);
    let port = PortResolver::new(6379).resolve(0).unwrap();
    let handle =
        ManagedServerProcess::build(ServerFamily::Redis, Some(fake.path.as_path()), port).unwrap();

    let factory = ConnectionFactory::for_server(&handle, ClientDriver::Dedicated).unwrap();

    assert_eq!(factory.endpoint().port, port.port());
    assert_eq!(factory.endpoint().host, "127.0.0.1");
    assert_eq!(
        factory.url(),
        format!("{}:{}", server_core::EMBEDDED_SERVER_BASE_URL, port.port())
    );
}
