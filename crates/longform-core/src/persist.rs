//! Debounced settings persistence
//!
//! Mutations schedule the latest settings; a background task writes them
//! once no new schedule arrived for the debounce window. Each schedule
//! restarts the window. A failed write is logged and recorded, and the next
//! mutation schedules a fresh attempt.

use crate::error::PersistenceError;
use crate::settings::{PersistedSettings, SettingsStore};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Outcome of the persistence task so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistenceStatus {
    /// A write is waiting for the debounce window
    pub pending: bool,
    /// Successful writes
    pub saves: usize,
    /// Failed writes
    pub failures: usize,
    /// Message of the last failure, cleared by the next success
    pub last_error: Option<String>,
}

impl PersistenceStatus {
    /// Check if the last write succeeded
    #[inline]
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.last_error.is_none()
    }
}

enum Command {
    Schedule(Box<PersistedSettings>),
    Flush(
        Box<PersistedSettings>,
        oneshot::Sender<Result<(), PersistenceError>>,
    ),
}

/// Handle to the background persistence task
#[derive(Debug)]
pub(crate) struct Persister {
    tx: mpsc::UnboundedSender<Command>,
    status: Arc<Mutex<PersistenceStatus>>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schedule(_) => f.write_str("Schedule"),
            Self::Flush(..) => f.write_str("Flush"),
        }
    }
}

impl Persister {
    /// Spawn the task on the current runtime
    pub(crate) fn spawn<S: SettingsStore>(store: Arc<S>, window: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = Arc::new(Mutex::new(PersistenceStatus::default()));
        let task = tokio::spawn(persist_task(store, window, rx, Arc::clone(&status)));
        Self { tx, status, task }
    }

    /// Write `settings` once the window passes quietly
    pub(crate) fn schedule(&self, settings: PersistedSettings) {
        if self.tx.send(Command::Schedule(Box::new(settings))).is_err() {
            tracing::error!("persistence task stopped; change not saved");
        }
    }

    /// Write `settings` now, replacing any pending write
    pub(crate) async fn flush(&self, settings: PersistedSettings) -> Result<(), PersistenceError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Command::Flush(Box::new(settings), ack))
            .map_err(|_| PersistenceError::Stopped)?;
        done.await.map_err(|_| PersistenceError::Stopped)?
    }

    pub(crate) fn status(&self) -> PersistenceStatus {
        self.status.lock().clone()
    }

    /// Write any pending settings and stop the task
    pub(crate) async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "persistence task panicked");
        }
    }
}

async fn persist_task<S: SettingsStore>(
    store: Arc<S>,
    window: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
    status: Arc<Mutex<PersistenceStatus>>,
) {
    let mut pending: Option<Box<PersistedSettings>> = None;
    loop {
        let command = if pending.is_some() {
            match tokio::time::timeout(window, rx.recv()).await {
                Ok(command) => command,
                Err(_) => {
                    if let Some(settings) = pending.take() {
                        let _ = write(store.as_ref(), &settings, &status).await;
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match command {
            Some(Command::Schedule(settings)) => {
                pending = Some(settings);
                status.lock().pending = true;
            }
            Some(Command::Flush(settings, ack)) => {
                pending = None;
                let result = write(store.as_ref(), &settings, &status).await;
                let _ = ack.send(result);
            }
            None => {
                if let Some(settings) = pending.take() {
                    let _ = write(store.as_ref(), &settings, &status).await;
                }
                break;
            }
        }
    }
    tracing::debug!("persistence task stopped");
}

async fn write<S: SettingsStore>(
    store: &S,
    settings: &PersistedSettings,
    status: &Mutex<PersistenceStatus>,
) -> Result<(), PersistenceError> {
    let result = store.save(settings).await;
    let mut status = status.lock();
    status.pending = false;
    match &result {
        Ok(()) => {
            status.saves += 1;
            status.last_error = None;
            tracing::debug!(saves = status.saves, "settings saved");
        }
        Err(e) => {
            status.failures += 1;
            status.last_error = Some(e.to_string());
            tracing::error!(error = %e, "failed to save settings");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettingsStore;

    fn settings(folder: &str) -> PersistedSettings {
        PersistedSettings {
            user_script_folder: Some(folder.to_string()),
            ..PersistedSettings::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_is_written_once() {
        let store = Arc::new(MemorySettingsStore::new());
        let persister = Persister::spawn(Arc::clone(&store), Duration::from_secs(3));

        for folder in ["a", "b", "c"] {
            persister.schedule(settings(folder));
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        assert_eq!(store.save_count(), 0);
        assert!(persister.status().pending);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.stored().unwrap().user_script_folder.as_deref(), Some("c"));
        assert!(!persister.status().pending);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_replaces_pending_write() {
        let store = Arc::new(MemorySettingsStore::new());
        let persister = Persister::spawn(Arc::clone(&store), Duration::from_secs(3));

        persister.schedule(settings("old"));
        persister.flush(settings("new")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.stored().unwrap().user_script_folder.as_deref(), Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_recorded_and_retried() {
        let store = Arc::new(MemorySettingsStore::new());
        let persister = Persister::spawn(Arc::clone(&store), Duration::from_secs(3));

        store.set_failing(true);
        persister.schedule(settings("a"));
        tokio::time::sleep(Duration::from_secs(4)).await;
        let status = persister.status();
        assert_eq!(status.failures, 1);
        assert!(!status.is_healthy());

        store.set_failing(false);
        persister.schedule(settings("b"));
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(persister.status().is_healthy());
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_writes_pending() {
        let store = Arc::new(MemorySettingsStore::new());
        let persister = Persister::spawn(Arc::clone(&store), Duration::from_secs(3));
        persister.schedule(settings("a"));
        persister.shutdown().await;
        assert_eq!(store.save_count(), 1);
    }
}
