//! The condition evaluator.
//!
//! `evaluate` is total: conditions are validated at construction, and any
//! comparison that still turns out inapplicable (an unparsable object, a
//! timestamp the platform never provided) resolves to `false` instead of
//! erroring.

use std::time::{Duration, SystemTime};

use filevalet_core::{Condition, DateUnit, FileMeta, SizeUnit, Subject, Unit, Verb};

/// Shared clock for one evaluation batch.
///
/// Sampled once per pass so every condition in the batch sees the same
/// `now`, no matter how long the pass takes.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    pub now: SystemTime,
}

impl EvalContext {
    /// Sample the clock for a new batch.
    pub fn new() -> Self {
        Self {
            now: SystemTime::now(),
        }
    }

    /// Use a fixed clock.
    pub fn at(now: SystemTime) -> Self {
        Self { now }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate one condition against one file metadata snapshot.
pub fn evaluate(meta: &FileMeta, condition: &Condition, ctx: &EvalContext) -> bool {
    match condition.subject {
        Subject::Name => text_compare(&meta.stem, condition),
        Subject::Extension => text_compare(&meta.extension, condition),
        Subject::Size => size_compare(meta.size, condition),
        Subject::DateCreated => date_compare(meta.timestamps.created, condition, ctx),
        Subject::DateModified => date_compare(Some(meta.timestamps.modified), condition, ctx),
        Subject::DateAccessed => date_compare(meta.timestamps.accessed, condition, ctx),
    }
}

fn text_compare(value: &str, condition: &Condition) -> bool {
    let value = value.to_lowercase();
    let object = condition.object.to_lowercase();
    match condition.verb {
        Verb::Is => value == object,
        Verb::IsNot => value != object,
        Verb::Contains => value.contains(&*object),
        Verb::NotContains => !value.contains(&*object),
        Verb::GreaterThan | Verb::LessThan => false,
    }
}

fn size_compare(size: u64, condition: &Condition) -> bool {
    let Ok(value) = condition.object.parse::<u64>() else {
        return false;
    };
    let unit = match condition.unit {
        Some(Unit::Size(unit)) => unit,
        None => SizeUnit::Bytes,
        Some(Unit::Date(_)) => return false,
    };
    let Some(threshold) = value.checked_mul(unit.multiplier()) else {
        return false;
    };
    match condition.verb {
        Verb::GreaterThan => size > threshold,
        Verb::LessThan => size < threshold,
        _ => false,
    }
}

fn date_compare(timestamp: Option<SystemTime>, condition: &Condition, ctx: &EvalContext) -> bool {
    let Some(timestamp) = timestamp else {
        return false;
    };
    let Ok(count) = condition.object.parse::<u64>() else {
        return false;
    };
    let unit = match condition.unit {
        Some(Unit::Date(unit)) => unit,
        None => DateUnit::Days,
        Some(Unit::Size(_)) => return false,
    };
    let Some(threshold_secs) = count.checked_mul(unit.as_secs()) else {
        return false;
    };

    let age = ctx.now.duration_since(timestamp).unwrap_or_default();
    let threshold = Duration::from_secs(threshold_secs);
    match condition.verb {
        // Older than N units / newer than N units.
        Verb::GreaterThan => age > threshold,
        Verb::LessThan => age < threshold,
        _ => false,
    }
}
