//! Action executor and trash management for filevalet.
//!
//! This crate performs the concrete file-system work a matching rule
//! triggers (move, copy, rename, delete, recycle, open) and manages the
//! trash bin the recycle action feeds: listing entries, applying the
//! eviction policy and permanently deleting what it selects.

mod evict;
mod executor;
mod outcome;
mod pattern;
mod trash;

pub use evict::{EvictionCause, EvictionManager, EvictionResult};
pub use executor::ActionExecutor;
pub use outcome::{ActionError, ActionOutcome, SkipReason};
pub use pattern::expand_pattern;
pub use trash::TrashBin;
