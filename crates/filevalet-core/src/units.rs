//! Size and date units used by conditions and the trash policy.

use serde::{Deserialize, Serialize};

/// Byte-scale unit for size comparisons and the trash size cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeUnit {
    /// Plain bytes.
    Bytes,
    /// 1024 bytes.
    Kilobytes,
    /// 1024² bytes.
    Megabytes,
    /// 1024³ bytes.
    Gigabytes,
}

impl SizeUnit {
    /// Multiplier from this unit to bytes.
    pub fn multiplier(&self) -> u64 {
        match self {
            Self::Bytes => 1,
            Self::Kilobytes => 1024,
            Self::Megabytes => 1024 * 1024,
            Self::Gigabytes => 1024 * 1024 * 1024,
        }
    }
}

impl std::fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes => write!(f, "B"),
            Self::Kilobytes => write!(f, "KB"),
            Self::Megabytes => write!(f, "MB"),
            Self::Gigabytes => write!(f, "GB"),
        }
    }
}

/// Calendar-ish unit for date comparisons and trash age/empty spans.
///
/// A month is a fixed 30 days; no calendar arithmetic is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateUnit {
    Days,
    Weeks,
    Months,
}

impl DateUnit {
    /// Number of days this unit spans.
    pub fn days(&self) -> u64 {
        match self {
            Self::Days => 1,
            Self::Weeks => 7,
            Self::Months => 30,
        }
    }

    /// Number of seconds this unit spans.
    pub fn as_secs(&self) -> u64 {
        self.days() * 24 * 60 * 60
    }
}

impl std::fmt::Display for DateUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Days => write!(f, "days"),
            Self::Weeks => write!(f, "weeks"),
            Self::Months => write!(f, "months"),
        }
    }
}
