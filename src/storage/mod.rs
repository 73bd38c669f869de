mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::Settings;
use crate::engine::{FieldChange, StoreEvent};

/// Builds the change notification for one settings transition. Unchanged
/// keys are omitted, matching the per-key change events of the original
/// storage interface.
pub(crate) fn diff_event(old: &Settings, new: &Settings) -> StoreEvent {
    let mut event = StoreEvent::default();
    if old.enabled != new.enabled {
        event.enabled = Some(FieldChange {
            old: old.enabled,
            new: new.enabled,
        });
    }
    if old.patterns != new.patterns {
        event.patterns = Some(FieldChange {
            old: old.patterns.clone(),
            new: new.patterns.clone(),
        });
    }
    event
}

pub(crate) fn apply_patch(settings: &Settings, patch: &crate::config::SettingsPatch) -> Settings {
    Settings {
        enabled: patch.enabled.unwrap_or(settings.enabled),
        patterns: patch
            .patterns
            .clone()
            .unwrap_or_else(|| settings.patterns.clone()),
    }
}
