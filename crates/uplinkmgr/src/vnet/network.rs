//! Network objects: named subnets with DHCP/DNS policy that application
//! interfaces attach to by UUID.

use std::collections::BTreeMap;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uplink_types::{IpAddress, IpPrefix};
use uuid::Uuid;

use crate::error::{UplinkError, UplinkResult};
use crate::port::ProxyConfig;

/// Address family of a network object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NetworkType {
    #[default]
    Ipv4,
    Ipv6,
    /// Either family; the adapter address decides whether IPv4 EIDs are used.
    CryptoEid,
}

impl TryFrom<u8> for NetworkType {
    type Error = UplinkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Self::Ipv4),
            6 => Ok(Self::Ipv6),
            14 => Ok(Self::CryptoEid),
            other => Err(UplinkError::validation(
                "network type",
                format!("unknown value {}", other),
            )),
        }
    }
}

impl From<NetworkType> for u8 {
    fn from(value: NetworkType) -> u8 {
        match value {
            NetworkType::Ipv4 => 4,
            NetworkType::Ipv6 => 6,
            NetworkType::CryptoEid => 14,
        }
    }
}

/// Addressing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DhcpType {
    #[default]
    Noop,
    /// Device static configuration.
    Static,
    /// Application passthrough, e.g. to a bridge.
    Passthrough,
    /// Local DHCP server for an application network.
    Server,
    /// Device DHCP client on an external port.
    Client,
}

impl DhcpType {
    /// Static and server modes carry an explicit subnet.
    pub const fn needs_subnet(&self) -> bool {
        matches!(self, DhcpType::Static | DhcpType::Server)
    }
}

impl TryFrom<u8> for DhcpType {
    type Error = UplinkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Noop),
            1 => Ok(Self::Static),
            2 => Ok(Self::Passthrough),
            3 => Ok(Self::Server),
            4 => Ok(Self::Client),
            other => Err(UplinkError::validation(
                "DHCP type",
                format!("unknown value {}", other),
            )),
        }
    }
}

impl From<DhcpType> for u8 {
    fn from(value: DhcpType) -> u8 {
        match value {
            DhcpType::Noop => 0,
            DhcpType::Static => 1,
            DhcpType::Passthrough => 2,
            DhcpType::Server => 3,
            DhcpType::Client => 4,
        }
    }
}

/// Inclusive address range handed out by a DHCP server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct IpRange {
    pub start: Option<IpAddress>,
    pub end: Option<IpAddress>,
}

impl IpRange {
    pub fn new(start: IpAddress, end: IpAddress) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_set(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    pub fn contains(&self, addr: &IpAddress) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                start.is_ipv4() == addr.is_ipv4()
                    && IpAddr::from(start) <= IpAddr::from(*addr)
                    && IpAddr::from(*addr) <= IpAddr::from(end)
            }
            _ => false,
        }
    }
}

/// Static host name to address mapping, used for DNS and ACL ipsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DnsNameToIp {
    pub host_name: String,
    #[serde(rename = "IPs")]
    pub ips: Vec<IpAddress>,
}

/// Network object configuration, referenced by UUID from overlay and
/// underlay attachments and optionally from a network service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NetworkObjectConfig {
    #[serde(rename = "UUID")]
    pub uuid: Uuid,
    #[serde(rename = "Type")]
    pub network_type: NetworkType,
    pub dhcp: DhcpType,
    pub subnet: Option<IpPrefix>,
    pub gateway: Option<IpAddress>,
    pub domain_name: String,
    pub ntp_server: Option<IpAddress>,
    pub dns_servers: Vec<IpAddress>,
    pub dhcp_range: IpRange,
    #[serde(rename = "DnsNameToIPList")]
    pub dns_name_to_ip_list: Vec<DnsNameToIp>,
    pub proxy: Option<ProxyConfig>,
}

impl NetworkObjectConfig {
    pub fn key(&self) -> String {
        self.uuid.to_string()
    }

    /// DNS servers handed to clients; the gateway when none are configured.
    pub fn effective_dns_servers(&self) -> Vec<IpAddress> {
        if self.dns_servers.is_empty() {
            self.gateway.into_iter().collect()
        } else {
            self.dns_servers.clone()
        }
    }

    /// Checks that the addressing fields are consistent with the DHCP mode.
    pub fn validate(&self) -> UplinkResult<()> {
        let field = || format!("network {}", self.uuid);

        if self.uuid.is_nil() {
            return Err(UplinkError::validation("network", "nil UUID"));
        }
        let Some(subnet) = self.subnet else {
            if self.dhcp.needs_subnet() {
                return Err(UplinkError::validation(
                    field(),
                    format!("{:?} addressing requires a subnet", self.dhcp),
                ));
            }
            return Ok(());
        };

        if let Some(gateway) = &self.gateway {
            if !subnet.contains(gateway) {
                return Err(UplinkError::validation(
                    field(),
                    format!("gateway {} outside subnet {}", gateway, subnet),
                ));
            }
        }

        if self.dhcp_range.is_set() {
            let (Some(start), Some(end)) = (self.dhcp_range.start, self.dhcp_range.end) else {
                return Err(UplinkError::validation(field(), "DHCP range needs start and end"));
            };
            if !subnet.contains(&start) || !subnet.contains(&end) {
                return Err(UplinkError::validation(
                    field(),
                    format!("DHCP range {}-{} outside subnet {}", start, end, subnet),
                ));
            }
            if IpAddr::from(start) > IpAddr::from(end) {
                return Err(UplinkError::validation(
                    field(),
                    format!("DHCP range start {} after end {}", start, end),
                ));
            }
        }

        Ok(())
    }
}

/// Provisioning state of a network object (bridge, dnsmasq, ipsets).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NetworkObjectStatus {
    #[serde(flatten)]
    pub config: NetworkObjectConfig,
    pub pending_add: bool,
    pub pending_modify: bool,
    pub pending_delete: bool,
    pub bridge_num: u32,
    /// `bn<N>`
    pub bridge_name: String,
    #[serde(rename = "BridgeIPAddr")]
    pub bridge_ip_addr: String,
    /// MAC address to assigned IP address.
    #[serde(rename = "IPAssignments")]
    pub ip_assignments: BTreeMap<String, IpAddress>,
    /// Union of all ipsets fed to dnsmasq for the bridge.
    #[serde(rename = "BridgeIPSets")]
    pub bridge_ip_sets: Vec<String>,
    pub vif_names: Vec<String>,
    /// CryptoEid network using IPv4 EIDs.
    pub ipv4_eid: bool,
    pub error: String,
    #[serde(deserialize_with = "crate::timestamp::zero_as_none")]
    pub error_time: Option<DateTime<Utc>>,
}

impl NetworkObjectStatus {
    pub fn from_config(config: NetworkObjectConfig) -> Self {
        Self {
            config,
            pending_add: true,
            ..Default::default()
        }
    }

    pub fn key(&self) -> String {
        self.config.key()
    }

    pub fn pending(&self) -> bool {
        self.pending_add || self.pending_modify || self.pending_delete
    }

    /// Address assigned to the vif with this MAC, if any.
    pub fn assignment(&self, mac: &str) -> Option<&IpAddress> {
        self.ip_assignments.get(mac)
    }

    /// Records an assignment; the address must come from the DHCP range when
    /// one is configured.
    pub fn assign(&mut self, mac: impl Into<String>, addr: IpAddress) -> UplinkResult<()> {
        if self.config.dhcp_range.is_set() && !self.config.dhcp_range.contains(&addr) {
            return Err(UplinkError::validation(
                format!("network {}", self.config.uuid),
                format!("{} outside DHCP range", addr),
            ));
        }
        self.ip_assignments.insert(mac.into(), addr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_network() -> NetworkObjectConfig {
        NetworkObjectConfig {
            uuid: Uuid::new_v4(),
            dhcp: DhcpType::Server,
            subnet: Some("10.1.0.0/24".parse().unwrap()),
            gateway: Some("10.1.0.1".parse().unwrap()),
            dhcp_range: IpRange::new("10.1.0.10".parse().unwrap(), "10.1.0.200".parse().unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_server_network() {
        assert!(server_network().validate().is_ok());
    }

    #[test]
    fn test_server_requires_subnet() {
        let config = NetworkObjectConfig {
            subnet: None,
            ..server_network()
        };
        assert!(config.validate().is_err());

        let passthrough = NetworkObjectConfig {
            uuid: Uuid::new_v4(),
            dhcp: DhcpType::Passthrough,
            ..Default::default()
        };
        assert!(passthrough.validate().is_ok());
    }

    #[test]
    fn test_gateway_outside_subnet() {
        let config = NetworkObjectConfig {
            gateway: Some("192.168.0.1".parse().unwrap()),
            ..server_network()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("outside subnet"));
    }

    #[test]
    fn test_inverted_dhcp_range() {
        let config = NetworkObjectConfig {
            dhcp_range: IpRange::new("10.1.0.200".parse().unwrap(), "10.1.0.10".parse().unwrap()),
            ..server_network()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dns_defaults_to_gateway() {
        let config = server_network();
        assert_eq!(config.effective_dns_servers(), vec!["10.1.0.1".parse().unwrap()]);
    }

    #[test]
    fn test_assignment_inside_range() {
        let mut status = NetworkObjectStatus::from_config(server_network());
        assert!(status.pending());
        status
            .assign("02:16:3e:00:00:01", "10.1.0.10".parse().unwrap())
            .unwrap();
        assert!(status.assign("02:16:3e:00:00:02", "10.1.0.250".parse().unwrap()).is_err());
        assert_eq!(
            status.assignment("02:16:3e:00:00:01"),
            Some(&"10.1.0.10".parse().unwrap())
        );
    }

    #[test]
    fn test_numeric_enums_decode() {
        let config: NetworkObjectConfig =
            serde_json::from_str(r#"{"Type": 14, "Dhcp": 3, "Subnet": "fd00::/64"}"#).unwrap();
        assert_eq!(config.network_type, NetworkType::CryptoEid);
        assert_eq!(config.dhcp, DhcpType::Server);
        assert!(config.subnet.unwrap().is_ipv6());
    }
}
