//! HTTP server lifecycle.
//!
//! Drives the [`ServiceHandle`] through Starting → Ready → Stopping so the
//! health endpoint and any supervisor can observe where startup is, and
//! shuts down gracefully on ctrl-c.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use sigil_core::service::{ServiceHandle, ServiceState};

use crate::error::Result;
use crate::routes;
use crate::state::AppState;

/// The Sigil API server.
pub struct Server {
    addr: SocketAddr,
    state: AppState,
}

impl Server {
    /// Create a server that will bind the given address.
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// Bind and serve until ctrl-c.
    pub async fn run(self) -> Result<()> {
        let service = self.state.service.clone();
        self.run_with_shutdown(wait_for_ctrl_c(service)).await
    }

    /// Bind and serve until the given future resolves.
    ///
    /// Split out from [`Server::run`] so tests can drive shutdown without a
    /// process signal.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let service = self.state.service.clone();
        service.set_state(ServiceState::Starting);

        let app = routes::router(self.state);
        let listener = match TcpListener::bind(self.addr).await {
            Ok(listener) => listener,
            Err(e) => {
                service.set_state(ServiceState::Failed(e.to_string()));
                return Err(e.into());
            }
        };
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "sigil-api listening");
        service.set_state(ServiceState::Ready);

        let stopping = service.clone();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                stopping.set_state(ServiceState::Stopping);
            })
            .await;

        match result {
            Ok(()) => {
                service.set_state(ServiceState::Stopped);
                Ok(())
            }
            Err(e) => {
                service.set_state(ServiceState::Failed(e.to_string()));
                Err(e.into())
            }
        }
    }
}

async fn wait_for_ctrl_c(service: ServiceHandle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received, draining '{}'", service.name());
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use sigil_auth::TokenSigner;
    use sigil_store::MemStore;

    #[tokio::test]
    async fn test_server_lifecycle_reaches_ready_and_stops() {
        let state = AppState::new(Arc::new(MemStore::new()), TokenSigner::new("secret"));
        let service = state.service.clone();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = Server::new("127.0.0.1:0".parse().unwrap(), state);
        let handle = tokio::spawn(server.run_with_shutdown(async move {
            let _ = rx.await;
        }));

        service
            .wait_ready(Duration::from_secs(5))
            .await
            .expect("server should reach ready");

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(service.state(), ServiceState::Stopped);
    }
}
