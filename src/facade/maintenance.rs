use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Owns the background cache sweep started by
/// [`ResilientAiService::start_maintenance`](super::ResilientAiService::start_maintenance).
///
/// Dropping the handle cancels the task without waiting for it.
pub struct MaintenanceHandle {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl MaintenanceHandle {
    pub(crate) fn new(token: CancellationToken, handle: JoinHandle<()>) -> Self {
        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the task and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "maintenance task ended abnormally");
            }
        }
        debug!("maintenance stopped");
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
