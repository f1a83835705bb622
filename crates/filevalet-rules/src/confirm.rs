//! The confirmation capability.
//!
//! The engine never prompts; when a rule carries `confirm`, it consults
//! this injected capability synchronously before executing the action.
//! The GUI layer supplies the real implementation.

use std::path::Path;

use filevalet_core::Rule;

/// Synchronous confirmation before an action runs.
pub trait Confirm: Send + Sync {
    /// Whether the action of `rule` may run against `path`.
    fn confirm(&self, path: &Path, rule: &Rule) -> bool;
}

/// Approves everything. For headless runs that opted in.
#[derive(Debug, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _path: &Path, _rule: &Rule) -> bool {
        true
    }
}

/// Declines everything. The safe default when nobody can answer.
#[derive(Debug, Default)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&self, _path: &Path, _rule: &Rule) -> bool {
        false
    }
}
