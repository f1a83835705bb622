//! Condition evaluation and the rule engine for filevalet.
//!
//! The evaluator is a pure function from a file metadata snapshot and a
//! condition to a boolean; the engine combines conditions per rule, picks
//! the first matching rule for a file and hands its action to the
//! executor.

mod confirm;
mod engine;
mod evaluate;

pub use confirm::{AlwaysConfirm, Confirm, NeverConfirm};
pub use engine::{MatchResult, RuleEngine, RuleOutcome};
pub use evaluate::{EvalContext, evaluate};
