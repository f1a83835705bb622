//! Core types and validation for filevalet.
//!
//! This crate provides the fundamental data structures shared by the rule
//! engine, the directory monitor and the trash eviction manager: folders,
//! rules, conditions, actions, trash policy and file metadata snapshots.

mod action;
mod error;
mod folder;
mod meta;
mod policy;
mod rule;
mod snapshot;
mod units;

pub use action::{Action, ActionKind};
pub use error::ValidationError;
pub use folder::Folder;
pub use meta::{FileMeta, Timestamps};
pub use policy::{EvictionOrder, PolicySize, PolicySpan, TrashEntry, TrashPolicy};
pub use rule::{Condition, MatchPolicy, Rule, RuleId, Subject, Unit, Verb};
pub use snapshot::{ConfigSnapshot, SnapshotStore};
pub use units::{DateUnit, SizeUnit};
