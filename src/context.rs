//! Shared handles passed to every component.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

use crate::api::OrderApi;
use crate::config::DeskConfig;
use crate::error::{DeskError, DeskResult};
use crate::events::{EventSink, Toast, UiEvent};
use crate::state::StateHandle;
use crate::tables;

#[derive(Clone)]
pub struct DeskContext {
    pub api: Arc<dyn OrderApi>,
    pub state: StateHandle,
    pub sink: Arc<dyn EventSink>,
    pub config: Arc<DeskConfig>,
    pub tasks: TaskTracker,
    pub shutdown: CancellationToken,
}

impl DeskContext {
    pub fn new(
        api: Arc<dyn OrderApi>,
        state: StateHandle,
        sink: Arc<dyn EventSink>,
        config: DeskConfig,
    ) -> Self {
        Self {
            api,
            state,
            sink,
            config: Arc::new(config),
            tasks: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Await an API future under the configured request timeout.
    pub async fn call<T, F>(&self, fut: F) -> DeskResult<T>
    where
        F: Future<Output = DeskResult<T>>,
    {
        let timeout = self.config.request_timeout();
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DeskError::Timeout(timeout.as_secs())),
        }
    }

    pub fn emit(&self, event: UiEvent) {
        self.sink.emit(event);
    }

    pub fn toast(&self, toast: Toast) {
        self.sink.emit(UiEvent::Toast(toast));
    }

    /// Re-project the order tables and emit them.
    pub fn render_dashboard(&self) {
        let view = self.state.read(tables::project);
        self.sink.emit(UiEvent::Dashboard(view));
    }

    /// Run `fut` after `delay` unless the client shuts down first.
    pub fn spawn_after<F>(&self, delay: Duration, label: &'static str, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        self.tasks.spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(task = label, "delayed task cancelled");
                }
                _ = tokio::time::sleep(delay) => fut.await,
            }
        });
    }
}
