use super::compiler::{self, CompiledPattern};
use tracing::warn;

/// The ordered set of compiled patterns currently in force.
///
/// Rebuilt in full on every reconciliation cycle; never patched
/// incrementally, so no stale half-applied state can survive a settings
/// change.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledPattern>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compiles every pattern in order. Patterns that fail to compile are
    /// logged and dropped; sibling patterns are unaffected.
    pub fn compile(patterns: &[String]) -> Self {
        let mut rules = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            match compiler::compile(pattern) {
                Ok(compiled) => rules.push(compiled),
                Err(e) => warn!("Skipping pattern {:?}: {}", pattern, e),
            }
        }
        Self { rules }
    }

    /// First-match check in stored order; short-circuits on the first hit.
    pub fn matches(&self, url: &str) -> bool {
        self.rules.iter().any(|r| r.is_match(url))
    }

    pub fn rules(&self) -> &[CompiledPattern] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_match_scenario() {
        let set = RuleSet::compile(&patterns(&["*.example.com/*", "shop.test/checkout"]));
        assert_eq!(set.len(), 2);
        assert!(set.matches("https://sub.example.com/path"));
        assert!(!set.matches("https://shop.test/cart"));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = RuleSet::empty();
        assert!(!set.matches("https://anything.test/"));
    }

    #[test]
    fn test_invalid_pattern_dropped_siblings_kept() {
        let set = RuleSet::compile(&patterns(&["/[/", "*.example.com/*"]));
        assert_eq!(set.len(), 1);
        assert_eq!(set.rules()[0].pattern(), "*.example.com/*");
        assert!(set.matches("https://x.example.com/"));
    }

    #[test]
    fn test_blank_lines_dropped() {
        let set = RuleSet::compile(&patterns(&["", "   ", "a.test"]));
        assert_eq!(set.len(), 1);
    }
}
