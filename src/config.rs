use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Persisted settings: the single source of truth for the gate.
///
/// Owned by the settings store; every reconciliation cycle reloads it in
/// full rather than caching it across cycles.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Partial update for [`Settings`]. `None` fields are left untouched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub patterns: Option<Vec<String>>,
}

// Defaults
fn default_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            patterns: vec![],
        }
    }
}

impl Settings {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .context("Failed to read settings file")?;
        let settings: Settings =
            toml::from_str(&contents).context("Failed to parse settings TOML")?;
        Ok(settings)
    }
}

impl SettingsPatch {
    /// Patch that resets both keys to the defaults.
    pub fn reset() -> Self {
        let d = Settings::default();
        Self {
            enabled: Some(d.enabled),
            patterns: Some(d.patterns),
        }
    }
}

/// Parses the newline-delimited pattern-list text form into patterns.
/// Lines are trimmed; empty lines are dropped.
pub fn parse_patterns(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Renders patterns back to the newline-delimited text form.
pub fn patterns_to_text(patterns: &[String]) -> String {
    patterns.join("\n")
}
