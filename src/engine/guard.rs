use super::coordinator::blocked_redirect_url;
use super::ruleset::RuleSet;
use super::traits::SettingsStore;
use std::sync::Arc;
use tracing::debug;

/// Best-effort page-load fallback for the window between a settings change
/// and backend propagation.
///
/// Evaluates the same compiled semantics as the primary backend but
/// installs nothing; the host applies the returned target with a history
/// replacement so back-navigation does not re-trigger the block. Both paths
/// target the block-notice resource, so a double redirect is idempotent.
pub struct EarlyGuard {
    store: Arc<dyn SettingsStore>,
    blocked_page: Arc<str>,
}

impl EarlyGuard {
    pub fn new(store: Arc<dyn SettingsStore>, blocked_page: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            blocked_page: blocked_page.into(),
        }
    }

    /// Returns the redirect target for the current navigation, or `None`.
    ///
    /// Skips entirely for non-http(s) URLs, for the block-notice resource
    /// itself, when the gate is disabled, when the pattern list is empty,
    /// or when the store cannot be read. Never errors.
    pub async fn check(&self, current_url: &str) -> Option<String> {
        let lower = current_url.to_ascii_lowercase();
        if !lower.starts_with("http:") && !lower.starts_with("https:") {
            return None;
        }
        if current_url.starts_with(self.blocked_page.as_ref()) {
            return None;
        }

        let settings = match self.store.get().await {
            Ok(s) => s,
            Err(e) => {
                debug!("Early guard skipped, store unavailable: {}", e);
                return None;
            }
        };
        if !settings.enabled || settings.patterns.is_empty() {
            return None;
        }

        let rules = RuleSet::compile(&settings.patterns);
        if rules.matches(current_url) {
            Some(blocked_redirect_url(&self.blocked_page, current_url))
        } else {
            None
        }
    }
}
