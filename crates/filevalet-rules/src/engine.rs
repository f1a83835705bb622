//! The rule engine: combines conditions, picks the acting rule, executes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use filevalet_core::{FileMeta, Folder, MatchPolicy, Rule, RuleId};
use filevalet_ops::{ActionExecutor, ActionOutcome, SkipReason};

use crate::confirm::Confirm;
use crate::evaluate::{EvalContext, evaluate};

/// Dry-run result of testing one rule against one file.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// The tested rule.
    pub rule: RuleId,
    /// Overall verdict under the rule's match policy.
    pub matched: bool,
    /// Per-condition verdicts, in the rule's condition order.
    pub conditions: Vec<bool>,
}

/// What happened to one file in one pass.
#[derive(Debug)]
pub struct RuleOutcome {
    /// The file the rule acted on.
    pub path: PathBuf,
    /// The rule that matched.
    pub rule_id: RuleId,
    /// Its display name, for reporting.
    pub rule_name: String,
    /// The action's outcome.
    pub outcome: ActionOutcome,
}

/// Evaluates rules for candidate files and executes the first match.
pub struct RuleEngine {
    executor: ActionExecutor,
    confirm: Arc<dyn Confirm>,
}

impl RuleEngine {
    /// Create an engine with an executor and a confirmation capability.
    pub fn new(executor: ActionExecutor, confirm: Arc<dyn Confirm>) -> Self {
        Self { executor, confirm }
    }

    /// The executor this engine dispatches actions to.
    pub fn executor(&self) -> &ActionExecutor {
        &self.executor
    }

    /// Whether a rule matches a metadata snapshot.
    ///
    /// `All` is a logical AND, `Any` a logical OR; both short-circuit
    /// (conditions have no side effects, so order only affects speed).
    pub fn matches(&self, meta: &FileMeta, rule: &Rule, ctx: &EvalContext) -> bool {
        match rule.match_policy {
            MatchPolicy::All => rule.conditions.iter().all(|c| evaluate(meta, c, ctx)),
            MatchPolicy::Any => rule.conditions.iter().any(|c| evaluate(meta, c, ctx)),
        }
    }

    /// Dry-run one rule against one file.
    ///
    /// Never executes the action; reports the overall verdict and which
    /// conditions matched. A missing or non-regular file matches nothing.
    pub fn test_rule(&self, path: &Path, rule: &Rule) -> MatchResult {
        let ctx = EvalContext::new();
        let Ok(meta) = FileMeta::from_path(path) else {
            return MatchResult {
                rule: rule.id.clone(),
                matched: false,
                conditions: vec![false; rule.conditions.len()],
            };
        };

        let conditions: Vec<bool> = rule
            .conditions
            .iter()
            .map(|c| evaluate(&meta, c, &ctx))
            .collect();
        let matched = !conditions.is_empty()
            && match rule.match_policy {
                MatchPolicy::All => conditions.iter().all(|&v| v),
                MatchPolicy::Any => conditions.iter().any(|&v| v),
            };
        MatchResult {
            rule: rule.id.clone(),
            matched,
            conditions,
        }
    }

    /// Evaluate the rules for one file and act on the first match.
    ///
    /// At most one rule acts per file per pass; this keeps a moved file
    /// from being re-evaluated against the rest of its old folder's rules.
    /// Returns `None` when no enabled rule matched (or the file vanished
    /// before its metadata could be read).
    pub fn evaluate_and_act(
        &self,
        path: &Path,
        rules: &[Rule],
        ctx: &EvalContext,
    ) -> Option<RuleOutcome> {
        let meta = match FileMeta::from_path(path) {
            Ok(meta) => meta,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "candidate vanished before evaluation");
                return None;
            }
        };

        for rule in rules.iter().filter(|r| r.enabled) {
            if rule.conditions.is_empty() {
                // Invalid rules are rejected upstream; never treat an empty
                // list as a match.
                warn!(rule = %rule.id, "rule with no conditions skipped");
                continue;
            }
            if !self.matches(&meta, rule, ctx) {
                continue;
            }

            let outcome = if rule.action.confirm && !self.confirm.confirm(path, rule) {
                ActionOutcome::Skipped(SkipReason::ConfirmationDeclined)
            } else {
                self.executor.execute(path, &rule.action)
            };

            match &outcome {
                ActionOutcome::Failed(error) => warn!(
                    path = %path.display(),
                    rule = %rule.id,
                    %error,
                    "action failed"
                ),
                _ => info!(
                    path = %path.display(),
                    rule = %rule.id,
                    outcome = %outcome.summary(),
                    "rule applied"
                ),
            }

            return Some(RuleOutcome {
                path: path.to_path_buf(),
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                outcome,
            });
        }
        None
    }

    /// Run one pass over a folder's candidate files.
    ///
    /// Shared entry point for the event path and the periodic scan; the
    /// clock is sampled once for the whole batch. A failure for one file
    /// never stops the pass.
    pub fn apply_folder(&self, folder: &Folder, candidates: &[PathBuf]) -> Vec<RuleOutcome> {
        let ctx = EvalContext::new();
        candidates
            .iter()
            .filter_map(|path| self.evaluate_and_act(path, &folder.rules, &ctx))
            .collect()
    }
}
