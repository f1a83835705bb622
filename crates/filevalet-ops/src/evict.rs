//! Trash eviction: applies the trash policy to the bin's contents.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use tracing::{debug, info};

use filevalet_core::{EvictionOrder, TrashEntry, TrashPolicy};

use crate::executor::ActionExecutor;
use crate::outcome::ActionOutcome;
use crate::trash::TrashBin;

/// Which policy clause selected an entry for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionCause {
    /// The entry exceeded the age limit.
    AgeLimit,
    /// The entry was deleted to get the bin under its size cap.
    SizeCap,
    /// The scheduled empty interval elapsed.
    ScheduledEmpty,
}

impl std::fmt::Display for EvictionCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AgeLimit => write!(f, "age limit"),
            Self::SizeCap => write!(f, "size cap"),
            Self::ScheduledEmpty => write!(f, "scheduled empty"),
        }
    }
}

/// One permanently deleted (or attempted) trash entry.
#[derive(Debug)]
pub struct EvictionResult {
    pub entry: TrashEntry,
    pub cause: EvictionCause,
    pub outcome: ActionOutcome,
}

/// Applies the trash policy on each scheduler tick.
///
/// Deletion goes through the action executor's delete primitive and
/// bypasses rule matching entirely; trash entries are not subject to user
/// rules.
#[derive(Debug)]
pub struct EvictionManager {
    bin: Arc<TrashBin>,
    executor: ActionExecutor,
    last_empty: Mutex<SystemTime>,
}

impl EvictionManager {
    /// Create a manager sweeping the given bin.
    pub fn new(bin: Arc<TrashBin>) -> Self {
        Self {
            executor: ActionExecutor::new(bin.clone()),
            bin,
            last_empty: Mutex::new(SystemTime::now()),
        }
    }

    /// Run one sweep of the policy over the bin's current contents.
    ///
    /// Clauses apply in order: age limit, then size cap in the policy's
    /// eviction order, then the scheduled empty. A failed deletion keeps
    /// its entry in consideration for later clauses and later sweeps.
    pub fn run_sweep(&self, policy: &TrashPolicy) -> Vec<EvictionResult> {
        let now = SystemTime::now();
        let mut entries = self.bin.entries();
        let mut results = Vec::new();

        if let Some(limit) = &policy.age_limit {
            let max_age = limit.as_duration();
            let mut kept = Vec::with_capacity(entries.len());
            for entry in entries {
                if entry.age(now) <= max_age {
                    kept.push(entry);
                    continue;
                }
                let result = self.evict(&entry, EvictionCause::AgeLimit);
                if result.outcome.is_failed() {
                    kept.push(entry);
                }
                results.push(result);
            }
            entries = kept;
        }

        if let Some(cap) = &policy.size_cap {
            let cap_bytes = cap.as_bytes();
            let mut total: u64 = entries.iter().map(|e| e.size).sum();
            if total > cap_bytes {
                sort_for_eviction(&mut entries, policy.eviction_order);

                let mut kept = Vec::with_capacity(entries.len());
                for entry in entries {
                    if total <= cap_bytes {
                        kept.push(entry);
                        continue;
                    }
                    let result = self.evict(&entry, EvictionCause::SizeCap);
                    if result.outcome.is_failed() {
                        kept.push(entry);
                    } else {
                        total = total.saturating_sub(entry.size);
                    }
                    results.push(result);
                }
                entries = kept;
            }
        }

        if let Some(interval) = &policy.empty_interval {
            if self.empty_due(now, interval.as_duration()) {
                info!(count = entries.len(), "scheduled trash empty");
                for entry in &entries {
                    results.push(self.evict(entry, EvictionCause::ScheduledEmpty));
                }
            }
        }

        results
    }

    fn evict(&self, entry: &TrashEntry, cause: EvictionCause) -> EvictionResult {
        let outcome = self.executor.delete_file(&entry.path);
        if !outcome.is_failed() {
            self.bin.remove_sidecar(entry);
        }
        debug!(
            path = %entry.path.display(),
            original = %entry.original_path.display(),
            %cause,
            outcome = %outcome.summary(),
            "trash eviction"
        );
        EvictionResult {
            entry: entry.clone(),
            cause,
            outcome,
        }
    }

    /// Check and, when due, reset the empty-interval clock.
    fn empty_due(&self, now: SystemTime, interval: Duration) -> bool {
        let mut last = self
            .last_empty
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let due = now.duration_since(*last).unwrap_or_default() >= interval;
        if due {
            *last = now;
        }
        due
    }
}

fn sort_for_eviction(entries: &mut [TrashEntry], order: EvictionOrder) {
    match order {
        EvictionOrder::OldestFirst => entries.sort_by_key(|e| e.deleted_at),
        EvictionOrder::LargestFirst => entries.sort_by(|a, b| b.size.cmp(&a.size)),
        EvictionOrder::SmallestFirst => entries.sort_by_key(|e| e.size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn entry(name: &str, size: u64, age_secs: u64) -> TrashEntry {
        TrashEntry {
            path: PathBuf::from(format!("/trash/files/{name}")),
            original_path: PathBuf::from(format!("/home/{name}")),
            size,
            deleted_at: SystemTime::now() - Duration::from_secs(age_secs),
        }
    }

    #[test]
    fn test_sort_orders() {
        let mut entries = vec![entry("a", 30, 10), entry("b", 80, 30), entry("c", 10, 20)];

        sort_for_eviction(&mut entries, EvictionOrder::LargestFirst);
        assert_eq!(entries[0].size, 80);
        assert_eq!(entries[2].size, 10);

        sort_for_eviction(&mut entries, EvictionOrder::SmallestFirst);
        assert_eq!(entries[0].size, 10);

        sort_for_eviction(&mut entries, EvictionOrder::OldestFirst);
        assert_eq!(entries[0].size, 80); // oldest deletion time first
    }
}
