pub mod compiler;
mod coordinator;
mod guard;
mod ruleset;
mod traits;

pub use compiler::{CompileError, CompiledPattern};
pub use coordinator::{blocked_redirect_url, EnforcementCoordinator, EnforcementState, RedirectHandler};
pub use guard::EarlyGuard;
pub use ruleset::RuleSet;
pub use traits::{
    DeclarativeBackend, Directive, FieldChange, ImperativeBackend, MatchCondition,
    RedirectAction, ResourceType, SettingsStore, StoreEvent,
};
