//! Directory monitoring and scheduling for filevalet.
//!
//! The monitor owns one debounced file-system watch per folder and one
//! worker per folder that serializes rule application; settled events and
//! the periodic fallback scan converge on the same per-folder queue. The
//! scheduler is the single periodic driver ticking fallback scans and
//! trash eviction.

mod config;
mod error;
mod monitor;
mod scan;
mod scheduler;

pub use config::{MonitorConfig, MonitorConfigBuilder, default_ignore_patterns};
pub use error::MonitorError;
pub use monitor::{Monitor, MonitorEvent, OutcomeReport, OutcomeStatus};
pub use scheduler::Scheduler;
