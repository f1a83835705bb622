//! Validation errors for rule and condition construction.

use thiserror::Error;

use crate::action::ActionKind;
use crate::rule::{Subject, Verb};

/// A malformed rule, condition or action.
///
/// Raised at construction time only; validated entities never fail inside
/// the engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A rule must carry at least one condition.
    #[error("rule '{rule}' has no conditions")]
    EmptyConditions { rule: String },

    /// The verb does not apply to the subject's type class.
    #[error("verb '{verb}' cannot apply to subject '{subject}'")]
    IncompatibleVerb { subject: Subject, verb: Verb },

    /// The unit does not apply to the subject's type class.
    #[error("unit does not apply to subject '{subject}'")]
    IncompatibleUnit { subject: Subject },

    /// Move and Copy need somewhere to put the file.
    #[error("{kind} action requires a destination")]
    MissingDestination { kind: ActionKind },

    /// Rename needs a naming pattern.
    #[error("rename action requires a pattern")]
    MissingPattern,

    /// Permanent deletion is never auto-confirmed.
    #[error("delete action requires confirmation to be enabled")]
    DeleteWithoutConfirm,

    /// Watched folders are addressed by absolute path.
    #[error("folder path must be absolute: {path}")]
    RelativeFolderPath { path: String },
}
