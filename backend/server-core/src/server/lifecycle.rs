use crate::error::server::ServerError;
use crate::server::kind::ServerKind;
use crate::server::managed::ManagedServerProcess;

use std::future::Future;

use log::info;

/// Start/stop contract between a long-lived resource and whatever hosts it.
///
/// The host decides when to call these, typically at application start and shutdown.
pub trait Lifecycle {
    fn start(&mut self) -> impl Future<Output = Result<(), ServerError>> + Send;

    /// Must not fail. Implementations log shutdown problems instead.
    fn stop(&mut self) -> impl Future<Output = ()> + Send;

    fn is_running(&self) -> bool;
}

impl<K: ServerKind> Lifecycle for ManagedServerProcess<K> {
    fn start(&mut self) -> impl Future<Output = Result<(), ServerError>> + Send {
        ManagedServerProcess::start(self)
    }

    fn stop(&mut self) -> impl Future<Output = ()> + Send {
        ManagedServerProcess::stop(self)
    }

    fn is_running(&self) -> bool {
        ManagedServerProcess::is_running(self)
    }
}

/// Start `component`, wait for `shutdown`, then stop it.
///
/// A failed start is returned immediately and `shutdown` is never awaited.
pub async fn run_until<L, F>(component: &mut L, shutdown: F) -> Result<(), ServerError>
where
    L: Lifecycle,
    F: Future<Output = ()>,
{
    component.start().await?;
    info!("Component started, waiting for shutdown signal");

    shutdown.await;

    info!("Shutdown signal received, stopping component");
    component.stop().await;
    Ok(())
}
