//! Debounced auto-save. Each change restarts the timer; only the last
//! snapshot inside the delay window reaches the sink.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub type AutoSaveSink = Arc<dyn Fn(Map<String, Value>) -> BoxFuture<'static, ()> + Send + Sync>;

pub struct AutoSave {
    delay: Duration,
    sink: AutoSaveSink,
    pending: Option<JoinHandle<()>>,
}

impl AutoSave {
    pub fn new(delay: Duration, sink: AutoSaveSink) -> Self {
        Self {
            delay,
            sink,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the timer with a new snapshot.
    pub fn schedule(&mut self, values: Map<String, Value>) {
        self.cancel();
        let Ok(handle) = Handle::try_current() else {
            log::warn!("Auto-save skipped: no async runtime available");
            return;
        };
        let delay = self.delay;
        let sink = self.sink.clone();
        self.pending = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            log::debug!("Auto-saving {} value(s)", values.len());
            sink(values).await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for AutoSave {
    fn drop(&mut self) {
        self.cancel();
    }
}
