//! Port-configuration priority list.
//!
//! Candidate whole-device configurations, each with its own version and
//! probe history. A configuration is adopted whole through
//! [`DevicePortConfig::to_status`]; there is no partial application.

mod rank;
mod types;

pub use rank::PortConfigRank;
pub use types::{
    DeviceNetworkConfig, DevicePortConfig, DevicePortConfigList, DhcpConfig, NetworkPortConfig,
};
