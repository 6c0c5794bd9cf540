//! Test fixtures for port status snapshots and port configurations
//!
//! Builders take typed addresses so fixtures never fail to construct; use
//! [`v4`] and [`v6_link_local`] for terse literals.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tempfile::TempDir;
use thiserror::Error;
use uplink_types::IpAddress;
use uplinkmgr::port::{AddrInfo, DeviceNetworkStatus, DevicePortConfigVersion, NetworkPortStatus};
use uplinkmgr::portconfig::{DevicePortConfig, DhcpConfig, NetworkPortConfig};
use uplinkmgr::vnet::{
    AppNetworkConfig, DhcpType, NetworkObjectConfig, UnderlayNetworkConfig, UuidAndVersion,
};
use uuid::Uuid;

/// IPv4 address literal.
pub fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddress {
    IpAddress::from(Ipv4Addr::new(a, b, c, d))
}

/// IPv6 link-local address `fe80::<host>`.
pub fn v6_link_local(host: u16) -> IpAddress {
    IpAddress::from(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, host))
}

/// Timestamp `secs` seconds after the epoch.
pub fn at(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// Builder for a [`NetworkPortStatus`]
#[derive(Debug, Clone)]
pub struct PortBuilder {
    port: NetworkPortStatus,
}

impl PortBuilder {
    pub fn new(if_name: impl Into<String>) -> Self {
        Self {
            port: NetworkPortStatus::new(if_name),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.port.name = name.into();
        self
    }

    pub fn mgmt(mut self) -> Self {
        self.port.is_mgmt = true;
        self
    }

    pub fn free(mut self) -> Self {
        self.port.free = true;
        self
    }

    pub fn addr(mut self, addr: IpAddress) -> Self {
        self.port.addr_info_list.push(AddrInfo::new(addr));
        self
    }

    pub fn build(self) -> NetworkPortStatus {
        self.port
    }
}

/// Builder for a [`DeviceNetworkStatus`]
#[derive(Debug, Clone)]
pub struct StatusBuilder {
    status: DeviceNetworkStatus,
}

impl Default for StatusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBuilder {
    /// Starts a status at the current schema version.
    pub fn new() -> Self {
        Self {
            status: DeviceNetworkStatus::new(DevicePortConfigVersion::IS_MGMT, Vec::new()),
        }
    }

    pub fn version(mut self, version: DevicePortConfigVersion) -> Self {
        self.status.version = version;
        self
    }

    pub fn port(mut self, port: PortBuilder) -> Self {
        self.status.ports.push(port.build());
        self
    }

    pub fn build(self) -> DeviceNetworkStatus {
        self.status
    }
}

/// Common port status scenarios
pub mod port_fixtures {
    use super::*;

    /// Free `eth0` with 10.0.0.5 and metered `eth1` with 10.0.1.5, both
    /// management ports.
    pub fn two_port() -> DeviceNetworkStatus {
        StatusBuilder::new()
            .port(PortBuilder::new("eth0").mgmt().free().addr(v4(10, 0, 0, 5)))
            .port(PortBuilder::new("eth1").mgmt().addr(v4(10, 0, 1, 5)))
            .build()
    }

    /// Initial-version status where no port sets the management flag.
    pub fn legacy_unflagged() -> DeviceNetworkStatus {
        StatusBuilder::new()
            .version(DevicePortConfigVersion::INITIAL)
            .port(PortBuilder::new("eth0").free().addr(v4(192, 168, 1, 10)))
            .port(PortBuilder::new("eth1").addr(v4(192, 168, 2, 10)))
            .build()
    }

    /// Wired uplink with only a link-local address, plus a metered
    /// cellular backup with a routable address.
    pub fn cellular_backup() -> DeviceNetworkStatus {
        StatusBuilder::new()
            .port(
                PortBuilder::new("eth0")
                    .name("uplink")
                    .mgmt()
                    .free()
                    .addr(v6_link_local(1)),
            )
            .port(
                PortBuilder::new("wwan0")
                    .name("cellular")
                    .mgmt()
                    .addr(v4(100, 64, 0, 2))
                    .addr(v6_link_local(2)),
            )
            .port(PortBuilder::new("eth1").name("lan").free().addr(v4(172, 16, 0, 1)))
            .build()
    }
}

/// Common port configuration fixtures
pub mod config_fixtures {
    use super::*;

    pub fn port(if_name: &str, is_mgmt: bool, free: bool) -> NetworkPortConfig {
        NetworkPortConfig {
            if_name: if_name.to_string(),
            is_mgmt,
            free,
            dhcp_config: DhcpConfig::client(),
            ..Default::default()
        }
    }

    pub fn config(key: &str, ports: Vec<NetworkPortConfig>) -> DevicePortConfig {
        DevicePortConfig {
            version: DevicePortConfigVersion::IS_MGMT,
            key: key.to_string(),
            ports,
            ..Default::default()
        }
    }

    /// Controller configuration: wired management only.
    pub fn zedagent() -> DevicePortConfig {
        DevicePortConfig {
            time_priority: at(2_000),
            ..config("zedagent", vec![port("eth0", true, true), port("wwan0", false, false)])
        }
    }

    /// Fallback configuration: every port is management.
    pub fn lastresort() -> DevicePortConfig {
        config(
            "lastresort",
            vec![port("eth0", true, true), port("wwan0", true, false)],
        )
    }
}

/// Network objects and application attachments
pub mod vnet_fixtures {
    use super::*;
    use uplink_types::IpPrefix;

    /// Deterministic UUID for fixture objects.
    pub const fn uuid(n: u128) -> Uuid {
        Uuid::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0000 | n)
    }

    /// Local network serving DHCP on `10.<octet>.0.0/24`.
    pub fn network(n: u128, octet: u8) -> NetworkObjectConfig {
        NetworkObjectConfig {
            uuid: uuid(n),
            dhcp: DhcpType::Server,
            subnet: IpPrefix::new(v4(10, octet, 0, 0), 24).ok(),
            gateway: Some(v4(10, octet, 0, 1)),
            ..Default::default()
        }
    }

    /// Application with one underlay attachment per network.
    pub fn app_on(n: u128, networks: &[Uuid]) -> AppNetworkConfig {
        AppNetworkConfig {
            uuid_and_version: UuidAndVersion {
                uuid: uuid(n),
                version: "1".to_string(),
            },
            display_name: format!("app-{}", n),
            activate: true,
            underlay_network_list: networks
                .iter()
                .enumerate()
                .map(|(i, network)| UnderlayNetworkConfig {
                    name: format!("eth{}", i),
                    network: *network,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("fixture IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("fixture encoding: {0}")]
    Json(#[from] serde_json::Error),
}

/// Temporary directory holding snapshot documents.
pub struct SnapshotDir {
    dir: TempDir,
}

impl SnapshotDir {
    pub fn new() -> Result<Self, FixtureError> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Writes `value` as JSON to `name` and returns the path.
    pub fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, FixtureError> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, serde_json::to_vec_pretty(value)?)?;
        Ok(path)
    }

    /// Writes raw text, for malformed-document tests.
    pub fn write_raw(&self, name: &str, contents: &str) -> Result<PathBuf, FixtureError> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}
