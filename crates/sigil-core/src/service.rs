//! Service lifecycle state.
//!
//! Provides [`ServiceState`] and [`ServiceHandle`] for tracking the lifecycle
//! of long-running components (the HTTP server, migration runners). The API
//! health endpoint reports the current state and refuses traffic until the
//! server reaches `Ready`.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// State of a service in its lifecycle.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceState {
    /// Service has not been started.
    Stopped,
    /// Service is initializing (connecting, migrating).
    Starting,
    /// Service is operational and accepting requests.
    Ready,
    /// Service is partially operational.
    Degraded(String),
    /// Service is shutting down.
    Stopping,
    /// Service failed to start or encountered a fatal error.
    Failed(String),
}

impl ServiceState {
    /// Returns `true` if the service is fully ready.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns `true` if the service can handle requests (Ready or Degraded).
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Ready | Self::Degraded(_))
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Starting => write!(f, "starting"),
            Self::Ready => write!(f, "ready"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Stopping => write!(f, "stopping"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Thread-safe handle for observing and updating service state.
///
/// Cheap to clone (Arc internals). State changes are broadcast to all
/// subscribers via a watch channel.
#[derive(Clone)]
pub struct ServiceHandle {
    inner: Arc<ServiceHandleInner>,
}

struct ServiceHandleInner {
    name: String,
    tx: watch::Sender<ServiceState>,
    started_at: Instant,
}

impl ServiceHandle {
    /// Create a new handle in [`ServiceState::Stopped`].
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(ServiceState::Stopped);
        Self {
            inner: Arc::new(ServiceHandleInner {
                name: name.into(),
                tx,
                started_at: Instant::now(),
            }),
        }
    }

    /// Get the service name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get the current service state.
    pub fn state(&self) -> ServiceState {
        self.inner.tx.borrow().clone()
    }

    /// Update the service state, notifying all subscribers.
    pub fn set_state(&self, state: ServiceState) {
        log::info!("service '{}' -> {state}", self.inner.name);
        self.inner.tx.send_replace(state);
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.inner.tx.subscribe()
    }

    /// Wait until the service reaches Ready or Failed, up to `timeout`.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<(), String> {
        let mut rx = self.subscribe();
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        loop {
            match rx.borrow_and_update().clone() {
                ServiceState::Ready => return Ok(()),
                ServiceState::Failed(reason) => {
                    return Err(format!("service '{}' failed: {reason}", self.inner.name));
                }
                _ => {}
            }

            tokio::select! {
                _ = &mut deadline => {
                    return Err(format!(
                        "service '{}' not ready after {timeout:?} (state: {})",
                        self.inner.name, self.state()
                    ));
                }
                result = rx.changed() => {
                    if result.is_err() {
                        return Err(format!("service '{}' channel closed", self.inner.name));
                    }
                }
            }
        }
    }

    /// Elapsed time since the handle was created.
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(ServiceState::Ready.to_string(), "ready");
        assert_eq!(
            ServiceState::Degraded("pool exhausted".to_string()).to_string(),
            "degraded: pool exhausted"
        );
        assert_eq!(
            ServiceState::Failed("bind error".to_string()).to_string(),
            "failed: bind error"
        );
    }

    #[test]
    fn test_state_predicates() {
        assert!(ServiceState::Ready.is_ready());
        assert!(!ServiceState::Starting.is_ready());

        assert!(ServiceState::Ready.is_available());
        assert!(ServiceState::Degraded("x".into()).is_available());
        assert!(!ServiceState::Stopped.is_available());
    }

    #[test]
    fn test_handle_transitions_and_sharing() {
        let handle = ServiceHandle::new("api");
        assert_eq!(handle.state(), ServiceState::Stopped);

        let peer = handle.clone();
        handle.set_state(ServiceState::Starting);
        handle.set_state(ServiceState::Ready);
        assert_eq!(peer.state(), ServiceState::Ready);
        assert_eq!(peer.name(), "api");
    }

    #[tokio::test]
    async fn test_wait_ready_success() {
        let handle = ServiceHandle::new("api");
        let h = handle.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            h.set_state(ServiceState::Starting);
            tokio::time::sleep(Duration::from_millis(10)).await;
            h.set_state(ServiceState::Ready);
        });

        assert!(handle.wait_ready(Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_wait_ready_timeout() {
        let handle = ServiceHandle::new("slow");
        handle.set_state(ServiceState::Starting);

        let err = handle
            .wait_ready(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.contains("not ready after"));
    }

    #[tokio::test]
    async fn test_wait_ready_failure_propagates_reason() {
        let handle = ServiceHandle::new("broken");
        handle.set_state(ServiceState::Failed("address in use".to_string()));

        let err = handle
            .wait_ready(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.contains("address in use"));
    }
}
