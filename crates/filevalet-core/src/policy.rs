//! Trash policy and trash entry types.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::units::{DateUnit, SizeUnit};

/// A duration expressed in a value and a date unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySpan {
    pub value: u64,
    pub unit: DateUnit,
}

impl PolicySpan {
    /// Create a new span.
    pub fn new(value: u64, unit: DateUnit) -> Self {
        Self { value, unit }
    }

    /// The span as a wall-clock duration.
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.value.saturating_mul(self.unit.as_secs()))
    }
}

/// A size expressed in a value and a byte-scale unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySize {
    pub value: u64,
    pub unit: SizeUnit,
}

impl PolicySize {
    /// Create a new size.
    pub fn new(value: u64, unit: SizeUnit) -> Self {
        Self { value, unit }
    }

    /// The size in bytes.
    pub fn as_bytes(&self) -> u64 {
        self.value.saturating_mul(self.unit.multiplier())
    }
}

/// Which trash entries go first when the bin is over its size cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvictionOrder {
    /// Oldest deletion time first.
    #[default]
    OldestFirst,
    /// Largest payload first.
    LargestFirst,
    /// Smallest payload first.
    SmallestFirst,
}

/// Policy governing automatic trash management.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrashPolicy {
    /// Entries older than this are permanently deleted.
    #[serde(default)]
    pub age_limit: Option<PolicySpan>,
    /// Keep the bin's total payload under this size.
    #[serde(default)]
    pub size_cap: Option<PolicySize>,
    /// Tie-break order for size-cap eviction.
    #[serde(default)]
    pub eviction_order: EvictionOrder,
    /// Empty the whole bin every time this much has elapsed.
    #[serde(default)]
    pub empty_interval: Option<PolicySpan>,
}

impl TrashPolicy {
    /// Whether any clause of the policy is set.
    pub fn is_active(&self) -> bool {
        self.age_limit.is_some() || self.size_cap.is_some() || self.empty_interval.is_some()
    }
}

/// One file currently held in the trash bin.
///
/// Created when the action executor recycles a file; destroyed when the
/// eviction manager permanently deletes it or the bin is emptied
/// externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrashEntry {
    /// Current path inside the bin.
    pub path: PathBuf,
    /// Path the file lived at before recycling.
    pub original_path: PathBuf,
    /// Payload size in bytes.
    pub size: u64,
    /// When the file was recycled.
    pub deleted_at: SystemTime,
}

impl TrashEntry {
    /// Time elapsed since the file was recycled.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.deleted_at).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_duration() {
        assert_eq!(
            PolicySpan::new(2, DateUnit::Weeks).as_duration(),
            Duration::from_secs(2 * 7 * 86_400)
        );
        assert_eq!(
            PolicySpan::new(0, DateUnit::Days).as_duration(),
            Duration::ZERO
        );
    }

    #[test]
    fn test_size_bytes() {
        assert_eq!(
            PolicySize::new(100, SizeUnit::Megabytes).as_bytes(),
            100 * 1024 * 1024
        );
    }

    #[test]
    fn test_policy_active() {
        assert!(!TrashPolicy::default().is_active());

        let policy = TrashPolicy {
            age_limit: Some(PolicySpan::new(7, DateUnit::Days)),
            ..Default::default()
        };
        assert!(policy.is_active());
    }

    #[test]
    fn test_entry_age_never_negative() {
        let now = SystemTime::now();
        let entry = TrashEntry {
            path: PathBuf::from("/trash/files/a.log"),
            original_path: PathBuf::from("/home/a.log"),
            size: 1,
            deleted_at: now + Duration::from_secs(60),
        };
        assert_eq!(entry.age(now), Duration::ZERO);
    }
}
