use super::{apply_patch, diff_event};
use crate::config::{Settings, SettingsPatch};
use crate::engine::{SettingsStore, StoreEvent};
use anyhow::Result;
use tokio::sync::{broadcast, RwLock};

const EVENT_CAPACITY: usize = 16;

/// In-memory settings store. The reference store for tests and for
/// embedders that bridge to an external key-value service themselves.
pub struct MemoryStore {
    inner: RwLock<Settings>,
    tx: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: RwLock::new(settings),
            tx,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self) -> Result<Settings> {
        Ok(self.inner.read().await.clone())
    }

    async fn set(&self, patch: SettingsPatch) -> Result<()> {
        let mut guard = self.inner.write().await;
        let new = apply_patch(&guard, &patch);
        let event = diff_event(&guard, &new);
        *guard = new;
        drop(guard);

        if event.is_relevant() {
            // No receivers is fine.
            let _ = self.tx.send(event);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }
}
