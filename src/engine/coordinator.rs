use super::ruleset::RuleSet;
use super::traits::{
    DeclarativeBackend, Directive, ImperativeBackend, MatchCondition, RedirectAction,
    ResourceType, SettingsStore, StoreEvent,
};
use crate::config::SettingsPatch;
use anyhow::Result;
use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use url::form_urlencoded;

/// First directive id assigned within a cycle. Ids are monotonic within a
/// cycle and carry no meaning across cycles.
const FIRST_RULE_ID: u32 = 1000;
const RULE_PRIORITY: u32 = 1;

/// Builds the redirect target for a blocked navigation, carrying the
/// original URL as a query parameter for display.
pub fn blocked_redirect_url(blocked_page: &str, original: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(original.as_bytes()).collect();
    format!("{blocked_page}?url={encoded}")
}

/// What the coordinator currently has installed. Fully replaced every
/// cycle; never patched incrementally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnforcementState {
    /// Directives installed in the declarative backend.
    Declarative { rule_ids: Vec<u32> },
    /// A single navigation handler installed in the imperative backend.
    Imperative,
    /// Nothing installed: disabled, no backend, or install failed.
    Inactive,
}

/// The per-navigation decision function handed to the imperative backend.
///
/// Reads the live rule set through the coordinator's swap cell, so a
/// re-install only needs to replace the rules, not the handler's identity.
#[derive(Clone)]
pub struct RedirectHandler {
    rules: Arc<ArcSwap<RuleSet>>,
    blocked_page: Arc<str>,
}

impl RedirectHandler {
    /// Returns the redirect target for `url`, or `None` for pass-through.
    /// Navigations already on the block-notice resource are never
    /// redirected, so a redirect cannot loop.
    pub fn decide(&self, url: &str) -> Option<String> {
        if url.starts_with(self.blocked_page.as_ref()) {
            return None;
        }
        if self.rules.load().matches(url) {
            Some(blocked_redirect_url(&self.blocked_page, url))
        } else {
            None
        }
    }
}

/// Keeps the active interception backend synchronized with persisted
/// settings.
///
/// Each reconciliation cycle reloads settings, recompiles the rule set,
/// tears down everything previously installed, and installs fresh state.
/// Overlapping cycles are not serialized; both fully replace the installed
/// state, so the last cycle to finish wins and converges.
pub struct EnforcementCoordinator {
    store: Arc<dyn SettingsStore>,
    declarative: Option<Arc<dyn DeclarativeBackend>>,
    imperative: Option<Arc<dyn ImperativeBackend>>,
    blocked_page: Arc<str>,
    rules: Arc<ArcSwap<RuleSet>>,
}

impl EnforcementCoordinator {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        declarative: Option<Arc<dyn DeclarativeBackend>>,
        imperative: Option<Arc<dyn ImperativeBackend>>,
        blocked_page: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            store,
            declarative,
            imperative,
            blocked_page: blocked_page.into(),
            rules: Arc::new(ArcSwap::new(Arc::new(RuleSet::empty()))),
        }
    }

    /// The rule set compiled by the most recent cycle.
    pub fn current_rules(&self) -> Arc<RuleSet> {
        self.rules.load_full()
    }

    /// Runs one full load, compile, teardown, install pass.
    ///
    /// A store failure during the load aborts the cycle with an error and
    /// leaves the previously installed state untouched. Backend failures
    /// after that point are logged and swallowed; enforcement degrades to
    /// best effort rather than crashing the cycle.
    pub async fn reconcile(&self) -> Result<EnforcementState> {
        let settings = self.store.get().await?;

        let ruleset = RuleSet::compile(&settings.patterns);
        info!(
            "Reconciling: enabled={}, {} of {} patterns compiled",
            settings.enabled,
            ruleset.len(),
            settings.patterns.len()
        );
        self.rules.store(Arc::new(ruleset.clone()));

        if let Some(backend) = &self.declarative {
            Ok(self.sync_declarative(backend, settings.enabled, &ruleset).await)
        } else if let Some(backend) = &self.imperative {
            Ok(self.sync_imperative(backend, settings.enabled).await)
        } else {
            // No interception capability: settings stay persisted, nothing
            // blocks. Silent no-op, not an error.
            Ok(EnforcementState::Inactive)
        }
    }

    async fn sync_declarative(
        &self,
        backend: &Arc<dyn DeclarativeBackend>,
        enabled: bool,
        ruleset: &RuleSet,
    ) -> EnforcementState {
        // Teardown runs even when disabled, so disabling always reverts to
        // zero interception.
        let stale: Vec<u32> = match backend.list_rules().await {
            Ok(rules) => rules.into_iter().map(|r| r.id).collect(),
            Err(e) => {
                warn!("Failed to list installed directives: {}", e);
                vec![]
            }
        };
        if !stale.is_empty() {
            if let Err(e) = backend.apply_diff(vec![], stale).await {
                warn!("Failed to remove stale directives: {}", e);
            }
        }

        if !enabled {
            return EnforcementState::Inactive;
        }

        let add = self.build_directives(ruleset);
        if add.is_empty() {
            return EnforcementState::Declarative { rule_ids: vec![] };
        }
        let rule_ids: Vec<u32> = add.iter().map(|d| d.id).collect();
        match backend.apply_diff(add, vec![]).await {
            Ok(()) => {
                info!("Installed {} directives", rule_ids.len());
                EnforcementState::Declarative { rule_ids }
            }
            Err(e) => {
                warn!("Failed to install directives: {}", e);
                EnforcementState::Inactive
            }
        }
    }

    async fn sync_imperative(
        &self,
        backend: &Arc<dyn ImperativeBackend>,
        enabled: bool,
    ) -> EnforcementState {
        // At most one handler: always remove the previous one first.
        if let Err(e) = backend.remove_handler().await {
            warn!("Failed to remove navigation handler: {}", e);
        }

        if !enabled {
            return EnforcementState::Inactive;
        }

        // Best effort: denial leaves enforcement inactive, never errors.
        if let Err(e) = backend.request_permissions().await {
            warn!("Permission request failed: {}", e);
        }

        let handler = RedirectHandler {
            rules: self.rules.clone(),
            blocked_page: self.blocked_page.clone(),
        };
        match backend.install(handler).await {
            Ok(()) => {
                info!("Installed navigation handler");
                EnforcementState::Imperative
            }
            Err(e) => {
                warn!("Failed to install navigation handler: {}", e);
                EnforcementState::Inactive
            }
        }
    }

    fn build_directives(&self, ruleset: &RuleSet) -> Vec<Directive> {
        ruleset
            .rules()
            .iter()
            .enumerate()
            .map(|(idx, rule)| Directive {
                id: FIRST_RULE_ID + idx as u32,
                priority: RULE_PRIORITY,
                action: RedirectAction {
                    target: self.blocked_page.to_string(),
                },
                condition: MatchCondition {
                    regex_filter: rule.regex_source().to_string(),
                    resource_types: vec![ResourceType::MainFrame],
                },
            })
            .collect()
    }

    /// Flips the enabled flag, persists it, and reconciles. Returns the new
    /// value.
    pub async fn toggle(&self) -> Result<bool> {
        let settings = self.store.get().await?;
        let new_val = !settings.enabled;
        self.store
            .set(SettingsPatch {
                enabled: Some(new_val),
                ..Default::default()
            })
            .await?;
        self.reconcile().await?;
        Ok(new_val)
    }

    /// Reconciles on every relevant store change until the store closes its
    /// notification channel. Cycle errors are logged, never fatal.
    pub async fn watch(&self, mut events: broadcast::Receiver<StoreEvent>) {
        loop {
            match events.recv().await {
                Ok(event) if event.is_relevant() => self.reconcile_logged().await,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Missed notifications; the cycle reloads everything
                    // anyway, so one catch-up pass suffices.
                    warn!("Missed {} store events, reconciling", n);
                    self.reconcile_logged().await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn reconcile_logged(&self) {
        if let Err(e) = self.reconcile().await {
            error!("Reconciliation failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_redirect_url_encodes_query() {
        let target = blocked_redirect_url("ext://gate/blocked.html", "https://a.test/?q=1&r=2");
        assert_eq!(
            target,
            "ext://gate/blocked.html?url=https%3A%2F%2Fa.test%2F%3Fq%3D1%26r%3D2"
        );
    }

    #[test]
    fn test_handler_skips_block_page_and_matches() {
        let rules = Arc::new(ArcSwap::new(Arc::new(RuleSet::compile(&[
            "*.example.com/*".to_string()
        ]))));
        let handler = RedirectHandler {
            rules,
            blocked_page: Arc::from("ext://gate/blocked.html"),
        };

        // Loop prevention: the block page itself always passes through.
        assert_eq!(handler.decide("ext://gate/blocked.html?url=x"), None);

        let target = handler.decide("https://sub.example.com/path").unwrap();
        assert!(target.starts_with("ext://gate/blocked.html?url="));
        assert_eq!(handler.decide("https://other.test/"), None);
    }
}
