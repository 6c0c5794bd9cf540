//! Test infrastructure for the uplink manager.
//!
//! Provides:
//! - Builders for port status snapshots and port configurations
//! - Ready-made scenarios (two-port, legacy, cellular backup)
//! - Snapshot files on disk for loader tests
//! - Verification helpers for selection results

pub mod fixtures;
mod verification;

pub use fixtures::*;
pub use verification::*;
