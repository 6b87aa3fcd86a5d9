//! The `universal` pack: active in every project.

mod dependencies;
mod destructive;
mod file_size;
mod git;
mod secrets;
mod session_end;
mod testing;
mod token_budget;

pub use dependencies::DependencyHygiene;
pub use destructive::NoDestructiveCommands;
pub use file_size::MaxFileSize;
pub use git::{NoForcePush, NoPushToMain, NoSkipHooks};
pub use secrets::{NoEnvCommit, NoSecrets};
pub use session_end::{NoDebugArtifacts, NoTodoLeft, TestWithChanges};
pub use testing::{DRIFT_KEY, DriftDetector, NoTestWeakening};
pub use token_budget::{TOKEN_BUDGET_KEY, TokenBudget};

use agentlint_core::Rule;

/// Rules of the pack in evaluation order.
pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(NoSecrets),
        Box::new(NoEnvCommit),
        Box::new(NoForcePush),
        Box::new(NoPushToMain),
        Box::new(NoSkipHooks),
        Box::new(NoDestructiveCommands),
        Box::new(DependencyHygiene),
        Box::new(NoTestWeakening),
        Box::new(MaxFileSize),
        Box::new(DriftDetector),
        Box::new(TokenBudget),
        Box::new(NoTodoLeft),
        Box::new(NoDebugArtifacts),
        Box::new(TestWithChanges),
    ]
}
