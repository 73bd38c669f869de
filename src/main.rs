use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::info;

use focus_gate::config::Settings;
use focus_gate::engine::{EnforcementCoordinator, EnforcementState, RuleSet};
use focus_gate::init::setup_logging;
use focus_gate::storage::FileStore;

const BLOCKED_PAGE_URL: &str = "focus-gate://blocked";

/// URL tester for a settings file: compiles the pattern list the same way
/// the gate does and reports which of the given URLs would be blocked.
#[tokio::main]
async fn main() -> Result<()> {
    setup_logging("info");

    let mut args = std::env::args().skip(1);
    let settings_path = match args.next() {
        Some(p) => p,
        None => bail!("usage: focus-gate <settings.toml> [url ...]"),
    };
    let urls: Vec<String> = args.collect();

    let settings = if std::path::Path::new(&settings_path).exists() {
        Settings::load(&settings_path).await?
    } else {
        Settings::default()
    };
    info!(
        "Loaded {} patterns (enabled={})",
        settings.patterns.len(),
        settings.enabled
    );

    let store = Arc::new(FileStore::new(&settings_path));
    let coordinator = EnforcementCoordinator::new(store, None, None, BLOCKED_PAGE_URL);
    match coordinator.reconcile().await? {
        EnforcementState::Inactive => {
            info!("No interception backend attached; dry run only")
        }
        state => info!("Enforcement state: {:?}", state),
    }

    let rules = RuleSet::compile(&settings.patterns);
    for url in &urls {
        let blocked = settings.enabled && rules.matches(url);
        println!("{}  {}", if blocked { "BLOCK" } else { "PASS " }, url);
    }

    Ok(())
}
