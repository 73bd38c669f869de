use super::{apply_patch, diff_event};
use crate::config::{Settings, SettingsPatch};
use crate::engine::{SettingsStore, StoreEvent};
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 16;

/// TOML-file-backed settings store.
///
/// Reads the file on every `get` so concurrent cycles always see the latest
/// persisted state; nothing is cached. A missing file reads as the
/// defaults.
pub struct FileStore {
    path: PathBuf,
    tx: broadcast::Sender<StoreEvent>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            path: path.into(),
            tx,
        }
    }
}

#[async_trait::async_trait]
impl SettingsStore for FileStore {
    async fn get(&self) -> Result<Settings> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => return Err(e).context("Failed to read settings file"),
        };
        toml::from_str(&contents).context("Failed to parse settings TOML")
    }

    async fn set(&self, patch: SettingsPatch) -> Result<()> {
        let old = self.get().await?;
        let new = apply_patch(&old, &patch);

        let contents =
            toml::to_string_pretty(&new).context("Failed to serialize settings TOML")?;
        fs::write(&self.path, contents)
            .await
            .context("Failed to write settings file")?;

        let event = diff_event(&old, &new);
        if event.is_relevant() {
            let _ = self.tx.send(event);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }
}
