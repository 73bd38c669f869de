use crate::config::{Settings, SettingsPatch};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::coordinator::RedirectHandler;

/// Old/new pair for one changed settings key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange<T> {
    pub old: T,
    pub new: T,
}

/// Change notification emitted by a settings store after a successful set.
#[derive(Debug, Clone, Default)]
pub struct StoreEvent {
    pub enabled: Option<FieldChange<bool>>,
    pub patterns: Option<FieldChange<Vec<String>>>,
}

impl StoreEvent {
    /// True when the event touches a key the coordinator cares about.
    pub fn is_relevant(&self) -> bool {
        self.enabled.is_some() || self.patterns.is_some()
    }
}

/// The persistence collaborator: sole source and sink of [`Settings`].
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    /// Reads current settings, applying defaults to unset keys.
    async fn get(&self) -> Result<Settings>;

    /// Applies a partial update; `None` fields are untouched.
    async fn set(&self, patch: SettingsPatch) -> Result<()>;

    /// Subscribes to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

/// Resource kinds a directive condition may be restricted to. Only
/// top-level navigations are ever intercepted; sub-resource requests
/// (images, scripts) pass through untouched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RedirectAction {
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchCondition {
    pub regex_filter: String,
    pub resource_types: Vec<ResourceType>,
}

/// One installed blocking rule for the declarative backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Directive {
    pub id: u32,
    pub priority: u32,
    pub action: RedirectAction,
    pub condition: MatchCondition,
}

/// Rule-table interception: the backend holds a set of redirect directives
/// and applies them itself, with no per-navigation callback into this
/// process.
#[async_trait::async_trait]
pub trait DeclarativeBackend: Send + Sync {
    /// Lists the directives this system currently has installed.
    async fn list_rules(&self) -> Result<Vec<Directive>>;

    /// Adds and removes directives in one call.
    async fn apply_diff(&self, add: Vec<Directive>, remove: Vec<u32>) -> Result<()>;
}

/// Callback interception: a single handler is consulted before every
/// top-level navigation. At most one handler may be installed at a time;
/// installing replaces nothing implicitly, so the coordinator removes the
/// previous handler before installing a new one.
#[async_trait::async_trait]
pub trait ImperativeBackend: Send + Sync {
    /// Best-effort optional-permission request. Denial leaves enforcement
    /// inactive; it is never an error.
    async fn request_permissions(&self) -> Result<bool>;

    async fn install(&self, handler: RedirectHandler) -> Result<()>;

    async fn remove_handler(&self) -> Result<()>;
}
