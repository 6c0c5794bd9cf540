//! Port status model: the canonical per-port record and the device-wide
//! snapshot the classifier and selector operate on.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uplink_types::IpAddress;

use crate::error::{UplinkError, UplinkResult};
use crate::vnet::NetworkObjectConfig;

/// Schema version of a port configuration.
///
/// New values are added when fields or semantics are added to the
/// configuration. Values the code does not know are kept as-is and compare
/// above every known version.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DevicePortConfigVersion(pub u32);

impl DevicePortConfigVersion {
    /// Configurations produced before the management flag existed.
    pub const INITIAL: Self = DevicePortConfigVersion(0);
    /// `IsMgmt` must be set for a port to carry management traffic.
    pub const IS_MGMT: Self = DevicePortConfigVersion(1);

    /// Returns true if this version honours the per-port management flag.
    pub const fn honours_mgmt_flag(&self) -> bool {
        self.0 >= Self::IS_MGMT.0
    }
}

impl fmt::Display for DevicePortConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Proxy protocol. Values match the controller's proxy protocol enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NetworkProxyType {
    Http,
    Https,
    Socks,
    Ftp,
    NoProxy,
}

impl TryFrom<u8> for NetworkProxyType {
    type Error = UplinkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Http),
            1 => Ok(Self::Https),
            2 => Ok(Self::Socks),
            3 => Ok(Self::Ftp),
            4 => Ok(Self::NoProxy),
            other => Err(UplinkError::validation(
                "proxy type",
                format!("unknown value {}", other),
            )),
        }
    }
}

impl From<NetworkProxyType> for u8 {
    fn from(value: NetworkProxyType) -> u8 {
        match value {
            NetworkProxyType::Http => 0,
            NetworkProxyType::Https => 1,
            NetworkProxyType::Socks => 2,
            NetworkProxyType::Ftp => 3,
            NetworkProxyType::NoProxy => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProxyEntry {
    #[serde(rename = "Type")]
    pub proxy_type: NetworkProxyType,
    pub server: String,
    pub port: u32,
}

/// Proxy settings for a port.
///
/// With `network_proxy_enable` set, WPAD is used: `network_proxy_url` if
/// given, otherwise the URL discovered through DNS (`wpad_url`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ProxyConfig {
    pub proxies: Vec<ProxyEntry>,
    pub exceptions: String,
    pub pacfile: String,
    pub network_proxy_enable: bool,
    #[serde(rename = "NetworkProxyURL")]
    pub network_proxy_url: String,
    #[serde(rename = "WpadURL")]
    pub wpad_url: String,
}

impl ProxyConfig {
    /// Returns true if any proxy mechanism is configured.
    pub fn is_configured(&self) -> bool {
        !self.proxies.is_empty() || !self.pacfile.is_empty() || self.network_proxy_enable
    }
}

/// Geolocation snapshot for an address, as returned by the lookup service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct GeoInfo {
    #[serde(rename = "IP")]
    pub ip: String,
    pub hostname: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub loc: String,
    pub org: String,
    pub postal: String,
}

/// An address observed on a port.
///
/// `geo` is filled in by an external lookup and is advisory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddrInfo {
    pub addr: IpAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoInfo>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::timestamp::zero_as_none"
    )]
    pub last_geo_timestamp: Option<DateTime<Utc>>,
}

impl AddrInfo {
    pub fn new(addr: IpAddress) -> Self {
        Self {
            addr,
            geo: None,
            last_geo_timestamp: None,
        }
    }
}

impl From<IpAddress> for AddrInfo {
    fn from(addr: IpAddress) -> Self {
        Self::new(addr)
    }
}

/// Status of one network port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NetworkPortStatus {
    /// Kernel interface name.
    pub if_name: String,
    /// Logical name set by the controller; may be empty.
    pub name: String,
    /// Eligible for control-plane traffic.
    pub is_mgmt: bool,
    /// No metering cost; preferred for bulk transfers.
    pub free: bool,
    #[serde(flatten)]
    pub network: NetworkObjectConfig,
    pub addr_info_list: Vec<AddrInfo>,
    #[serde(flatten)]
    pub proxy: ProxyConfig,
    pub error: String,
    #[serde(deserialize_with = "crate::timestamp::zero_as_none")]
    pub error_time: Option<DateTime<Utc>>,
}

impl NetworkPortStatus {
    pub fn new(if_name: impl Into<String>) -> Self {
        Self {
            if_name: if_name.into(),
            ..Default::default()
        }
    }

    /// Matches either the logical name or the interface name. An empty
    /// name matches nothing.
    pub fn matches_name(&self, name: &str) -> bool {
        !name.is_empty() && (self.name == name || self.if_name == name)
    }

    /// Name to show operators: logical name when set.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.if_name
        } else {
            &self.name
        }
    }

    pub fn addrs(&self) -> impl Iterator<Item = &IpAddress> + '_ {
        self.addr_info_list.iter().map(|info| &info.addr)
    }

    pub fn has_addr(&self, addr: &IpAddress) -> bool {
        self.addrs().any(|a| a == addr)
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Records a provisioning failure.
    pub fn set_error(&mut self, error: impl Into<String>, at: DateTime<Utc>) {
        self.error = error.into();
        self.error_time = Some(at);
    }

    pub fn clear_error(&mut self) {
        self.error.clear();
        self.error_time = None;
    }
}

/// Snapshot of every port's status, published to components that need to
/// know about ports and addresses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DeviceNetworkStatus {
    /// Copied from the `DevicePortConfig` this status was built from.
    pub version: DevicePortConfigVersion,
    pub ports: Vec<NetworkPortStatus>,
}

impl DeviceNetworkStatus {
    pub fn new(version: DevicePortConfigVersion, ports: Vec<NetworkPortStatus>) -> Self {
        Self { version, ports }
    }

    /// Version-gated management eligibility. Every filter on `is_mgmt` goes
    /// through here.
    pub fn is_mgmt_eligible(&self, port: &NetworkPortStatus) -> bool {
        !self.version.honours_mgmt_flag() || port.is_mgmt
    }

    /// Management ports in status order.
    pub fn mgmt_ports(&self) -> impl Iterator<Item = &NetworkPortStatus> + '_ {
        self.ports.iter().filter(|port| self.is_mgmt_eligible(port))
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Checks that interface names and non-empty logical names are unique.
    pub fn validate(&self) -> UplinkResult<()> {
        check_unique_names(self.ports.iter().map(|p| (p.if_name.as_str(), p.name.as_str())))
    }
}

/// Shared uniqueness check for port status and port configuration lists.
pub(crate) fn check_unique_names<'a>(
    names: impl Iterator<Item = (&'a str, &'a str)>,
) -> UplinkResult<()> {
    let mut if_names = HashSet::new();
    let mut logical_names = HashSet::new();
    for (if_name, name) in names {
        if if_name.is_empty() {
            return Err(UplinkError::validation("port", "empty interface name"));
        }
        if !if_names.insert(if_name) {
            return Err(UplinkError::validation(
                "port",
                format!("duplicate interface name {}", if_name),
            ));
        }
        if !name.is_empty() && !logical_names.insert(name) {
            return Err(UplinkError::validation(
                "port",
                format!("duplicate logical name {}", name),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn port(if_name: &str, name: &str, is_mgmt: bool) -> NetworkPortStatus {
        NetworkPortStatus {
            name: name.to_string(),
            is_mgmt,
            ..NetworkPortStatus::new(if_name)
        }
    }

    #[test]
    fn test_version_ordering() {
        assert!(DevicePortConfigVersion::INITIAL < DevicePortConfigVersion::IS_MGMT);
        assert!(!DevicePortConfigVersion::INITIAL.honours_mgmt_flag());
        assert!(DevicePortConfigVersion::IS_MGMT.honours_mgmt_flag());
        assert!(DevicePortConfigVersion(7).honours_mgmt_flag());
    }

    #[test]
    fn test_mgmt_eligibility_gated_by_version() {
        let legacy = DeviceNetworkStatus::new(
            DevicePortConfigVersion::INITIAL,
            vec![port("eth0", "", false), port("eth1", "", true)],
        );
        assert_eq!(legacy.mgmt_ports().count(), 2);

        let current = DeviceNetworkStatus {
            version: DevicePortConfigVersion::IS_MGMT,
            ..legacy
        };
        let names: Vec<&str> = current.mgmt_ports().map(|p| p.if_name.as_str()).collect();
        assert_eq!(names, vec!["eth1"]);
    }

    #[test]
    fn test_validate_duplicate_names() {
        let ok = DeviceNetworkStatus::new(
            DevicePortConfigVersion::IS_MGMT,
            vec![port("eth0", "uplink", true), port("eth1", "", true), port("wwan0", "", false)],
        );
        assert!(ok.validate().is_ok());

        let dup_ifname = DeviceNetworkStatus::new(
            DevicePortConfigVersion::IS_MGMT,
            vec![port("eth0", "", true), port("eth0", "", true)],
        );
        assert!(dup_ifname.validate().is_err());

        let dup_logical = DeviceNetworkStatus::new(
            DevicePortConfigVersion::IS_MGMT,
            vec![port("eth0", "uplink", true), port("eth1", "uplink", true)],
        );
        let err = dup_logical.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate logical name uplink"));
    }

    #[test]
    fn test_display_name_falls_back_to_if_name() {
        assert_eq!(port("eth0", "", true).display_name(), "eth0");
        assert_eq!(port("eth0", "uplink", true).display_name(), "uplink");
    }

    #[test]
    fn test_status_decodes_pascal_case() {
        let json = r#"{
            "Version": 1,
            "Ports": [{
                "IfName": "eth0",
                "Name": "uplink",
                "IsMgmt": true,
                "Free": true,
                "AddrInfoList": [
                    {"Addr": "10.0.0.5", "LastGeoTimestamp": "0001-01-01T00:00:00Z"},
                    {"Addr": "fe80::1"}
                ],
                "ErrorTime": "0001-01-01T00:00:00Z"
            }]
        }"#;
        let status: DeviceNetworkStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.version, DevicePortConfigVersion::IS_MGMT);
        assert_eq!(status.ports[0].addr_info_list.len(), 2);
        assert!(status.ports[0].addr_info_list[1].addr.is_link_local_unicast());
        assert!(status.ports[0].addr_info_list[0].geo.is_none());
        assert!(status.ports[0].addr_info_list[0].last_geo_timestamp.is_none());
        assert!(status.ports[0].error_time.is_none());
    }

    #[test]
    fn test_proxy_type_round_trip() {
        assert_eq!(u8::from(NetworkProxyType::Socks), 2);
        assert_eq!(NetworkProxyType::try_from(4).unwrap(), NetworkProxyType::NoProxy);
        assert!(NetworkProxyType::try_from(9).is_err());
    }

    #[test]
    fn test_port_error_tracking() {
        let mut p = NetworkPortStatus::new("wwan0");
        assert!(!p.has_error());
        p.set_error("modem not registered", Utc::now());
        assert!(p.has_error());
        assert!(p.error_time.is_some());
        p.clear_error();
        assert!(!p.has_error());
    }
}
