//! focus-gate: the pattern-matching and rule-synchronization core of a
//! personal URL focus gate.
//!
//! The engine compiles user-authored glob/regex patterns into an ordered
//! [`engine::RuleSet`], and the [`engine::EnforcementCoordinator`] keeps
//! whichever interception backend is available synchronized with the
//! persisted settings across toggles, edits, and restarts.

pub mod config;
pub mod engine;
pub mod init;
pub mod storage;
