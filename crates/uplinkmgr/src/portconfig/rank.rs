//! Explicit preference order between port configurations.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::port::DevicePortConfigVersion;
use crate::portconfig::DevicePortConfig;

/// Sort key for a [`DevicePortConfig`]. A greater rank is preferred.
///
/// Compared in order:
/// 1. schema version, higher first;
/// 2. probe health, configurations whose latest probe failed last;
/// 3. time of the last successful probe, later first, never-succeeded last;
/// 4. time priority, later first, unset last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfigRank {
    pub version: DevicePortConfigVersion,
    pub failing: bool,
    pub last_succeeded: Option<DateTime<Utc>>,
    pub time_priority: Option<DateTime<Utc>>,
}

impl PortConfigRank {
    pub fn of(config: &DevicePortConfig) -> Self {
        Self {
            version: config.version,
            failing: config.is_probe_failing(),
            last_succeeded: config.last_succeeded,
            time_priority: config.time_priority,
        }
    }
}

impl Ord for PortConfigRank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version
            .cmp(&other.version)
            .then_with(|| other.failing.cmp(&self.failing))
            .then_with(|| self.last_succeeded.cmp(&other.last_succeeded))
            .then_with(|| self.time_priority.cmp(&other.time_priority))
    }
}

impl PartialOrd for PortConfigRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
