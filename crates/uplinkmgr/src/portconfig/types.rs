use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uplink_types::{IpAddress, IpPrefix};

use crate::error::{UplinkError, UplinkResult};
use crate::port::{
    check_unique_names, DeviceNetworkStatus, DevicePortConfigVersion, NetworkPortStatus,
    ProxyConfig,
};
use crate::portconfig::PortConfigRank;
use crate::vnet::{DhcpType, NetworkObjectConfig};

/// Addressing of a device port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DhcpConfig {
    pub dhcp: DhcpType,
    /// Interface address with prefix length, e.g. `192.168.1.44/24`. Used
    /// with static addressing.
    pub addr_subnet: Option<IpPrefix>,
    pub gateway: Option<IpAddress>,
    pub domain_name: String,
    pub ntp_server: Option<IpAddress>,
    /// The gateway serves DNS when empty.
    pub dns_servers: Vec<IpAddress>,
}

impl DhcpConfig {
    pub fn client() -> Self {
        Self {
            dhcp: DhcpType::Client,
            ..Default::default()
        }
    }

    /// Addressing policy carried into the port status.
    pub fn to_network_config(&self) -> NetworkObjectConfig {
        NetworkObjectConfig {
            dhcp: self.dhcp,
            subnet: self.addr_subnet,
            gateway: self.gateway,
            domain_name: self.domain_name.clone(),
            ntp_server: self.ntp_server,
            dns_servers: self.dns_servers.clone(),
            ..Default::default()
        }
    }
}

/// Configuration of one device port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NetworkPortConfig {
    pub if_name: String,
    /// Logical name set by the controller.
    pub name: String,
    pub is_mgmt: bool,
    pub free: bool,
    #[serde(flatten)]
    pub dhcp_config: DhcpConfig,
    #[serde(flatten)]
    pub proxy: ProxyConfig,
}

impl NetworkPortConfig {
    fn validate(&self) -> UplinkResult<()> {
        if self.dhcp_config.dhcp == DhcpType::Static && self.dhcp_config.addr_subnet.is_none() {
            return Err(UplinkError::validation(
                format!("port {}", self.if_name),
                "static addressing requires an address and subnet",
            ));
        }
        Ok(())
    }

    fn to_status(&self) -> NetworkPortStatus {
        NetworkPortStatus {
            name: self.name.clone(),
            is_mgmt: self.is_mgmt,
            free: self.free,
            network: self.dhcp_config.to_network_config(),
            proxy: self.proxy.clone(),
            ..NetworkPortStatus::new(self.if_name.clone())
        }
    }
}

/// A whole-device port configuration candidate with its probe history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DevicePortConfig {
    pub version: DevicePortConfigVersion,
    pub key: String,
    /// `None` is the lowest priority fallback.
    #[serde(deserialize_with = "crate::timestamp::zero_as_none")]
    pub time_priority: Option<DateTime<Utc>>,
    /// `None` means never probed.
    #[serde(deserialize_with = "crate::timestamp::zero_as_none")]
    pub last_failed: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "crate::timestamp::zero_as_none")]
    pub last_succeeded: Option<DateTime<Utc>>,
    pub ports: Vec<NetworkPortConfig>,
}

impl DevicePortConfig {
    pub fn was_probed(&self) -> bool {
        self.last_failed.is_some() || self.last_succeeded.is_some()
    }

    /// The most recent probe failed.
    pub fn is_probe_failing(&self) -> bool {
        match (self.last_failed, self.last_succeeded) {
            (Some(failed), Some(succeeded)) => failed > succeeded,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn rank(&self) -> PortConfigRank {
        PortConfigRank::of(self)
    }

    /// Checks port name uniqueness and per-port addressing.
    pub fn validate(&self) -> UplinkResult<()> {
        check_unique_names(self.ports.iter().map(|p| (p.if_name.as_str(), p.name.as_str())))?;
        for port in &self.ports {
            port.validate()?;
        }
        Ok(())
    }

    /// Builds the status snapshot for adopting this configuration. Every
    /// port is carried over with the configuration's version.
    pub fn to_status(&self) -> DeviceNetworkStatus {
        DeviceNetworkStatus::new(
            self.version,
            self.ports.iter().map(NetworkPortConfig::to_status).collect(),
        )
    }

    pub fn port(&self, name: &str) -> Option<&NetworkPortConfig> {
        self.ports
            .iter()
            .find(|p| !name.is_empty() && (p.name == name || p.if_name == name))
    }
}

/// Candidate configurations in priority order; the first entry is the
/// current best guess.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DevicePortConfigList {
    pub port_config_list: Vec<DevicePortConfig>,
}

impl DevicePortConfigList {
    pub fn new(port_config_list: Vec<DevicePortConfig>) -> Self {
        Self { port_config_list }
    }

    pub fn current(&self) -> Option<&DevicePortConfig> {
        self.port_config_list.first()
    }

    pub fn get(&self, index: usize) -> Option<&DevicePortConfig> {
        self.port_config_list.get(index)
    }

    pub fn find_by_key(&self, key: &str) -> Option<(usize, &DevicePortConfig)> {
        self.port_config_list
            .iter()
            .enumerate()
            .find(|(_, config)| config.key == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DevicePortConfig> {
        self.port_config_list.iter()
    }

    pub fn len(&self) -> usize {
        self.port_config_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.port_config_list.is_empty()
    }

    /// Entry indices, best rank first. Equal ranks keep list order.
    pub fn ranked(&self) -> Vec<usize> {
        let ranks: Vec<PortConfigRank> = self.iter().map(DevicePortConfig::rank).collect();
        let mut indices: Vec<usize> = (0..ranks.len()).collect();
        indices.sort_by(|a, b| ranks[*b].cmp(&ranks[*a]));
        indices
    }

    /// Reorders the list by rank, best first. The sort is stable.
    pub fn sort_by_rank(&mut self) {
        self.port_config_list
            .sort_by_cached_key(|config| std::cmp::Reverse(config.rank()));
    }

    /// Validates every entry and checks that non-empty keys are unique.
    pub fn validate(&self) -> UplinkResult<()> {
        for (index, config) in self.iter().enumerate() {
            config.validate().map_err(|e| match e {
                UplinkError::Validation { field, message } => UplinkError::validation(
                    format!("port config {} ({})", index, field),
                    message,
                ),
                other => other,
            })?;
            let duplicate = self.port_config_list[..index]
                .iter()
                .any(|earlier| !config.key.is_empty() && earlier.key == config.key);
            if duplicate {
                return Err(UplinkError::validation(
                    "port config list",
                    format!("duplicate key {}", config.key),
                ));
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a DevicePortConfigList {
    type Item = &'a DevicePortConfig;
    type IntoIter = std::slice::Iter<'a, DevicePortConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pre-port-config uplink list: every uplink is a management port, the
/// listed subset is free.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DeviceNetworkConfig {
    pub uplink: Vec<String>,
    pub free_uplinks: Vec<String>,
}

impl DeviceNetworkConfig {
    /// Converts to an initial-version configuration using DHCP on every
    /// uplink.
    pub fn to_port_config(&self, key: impl Into<String>) -> DevicePortConfig {
        let ports = self
            .uplink
            .iter()
            .map(|if_name| NetworkPortConfig {
                if_name: if_name.clone(),
                name: if_name.clone(),
                is_mgmt: true,
                free: self.free_uplinks.contains(if_name),
                dhcp_config: DhcpConfig::client(),
                proxy: ProxyConfig::default(),
            })
            .collect();
        DevicePortConfig {
            version: DevicePortConfigVersion::INITIAL,
            key: key.into(),
            ports,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(secs, 0)
    }

    fn port(if_name: &str, is_mgmt: bool, free: bool) -> NetworkPortConfig {
        NetworkPortConfig {
            if_name: if_name.to_string(),
            is_mgmt,
            free,
            dhcp_config: DhcpConfig::client(),
            ..Default::default()
        }
    }

    fn config(key: &str) -> DevicePortConfig {
        DevicePortConfig {
            version: DevicePortConfigVersion::IS_MGMT,
            key: key.to_string(),
            ports: vec![port("eth0", true, true), port("eth1", false, false)],
            ..Default::default()
        }
    }

    #[test]
    fn test_probe_state() {
        let mut c = config("zedagent");
        assert!(!c.was_probed());
        assert!(!c.is_probe_failing());

        c.last_failed = at(100);
        assert!(c.was_probed());
        assert!(c.is_probe_failing());

        c.last_succeeded = at(200);
        assert!(!c.is_probe_failing());

        c.last_failed = at(300);
        assert!(c.is_probe_failing());
    }

    #[test]
    fn test_zero_times_decode_as_unset() {
        let zero: DevicePortConfig = serde_json::from_str(
            r#"{
                "Version": 1,
                "Key": "zedagent",
                "TimePriority": "0001-01-01T00:00:00Z",
                "LastFailed": "0001-01-01T00:00:00Z",
                "LastSucceeded": "0001-01-01T00:00:00Z",
                "Ports": [{"IfName": "eth0", "IsMgmt": true, "Dhcp": 4}]
            }"#,
        )
        .unwrap();
        assert!(!zero.was_probed());
        assert!(!zero.is_probe_failing());
        assert_eq!(zero.time_priority, None);

        // Ranks as the lowest priority fallback, not above an unset entry.
        let unset = DevicePortConfig {
            key: "lastresort".to_string(),
            ..zero.clone()
        };
        assert_eq!(zero.rank(), unset.rank());
        let dated = DevicePortConfig {
            time_priority: at(1),
            ..zero.clone()
        };
        assert!(dated.rank() > zero.rank());
    }

    #[test]
    fn test_to_status_adopts_whole_config() {
        let mut c = config("zedagent");
        c.ports[0].name = "uplink".to_string();
        c.ports[0].dhcp_config = DhcpConfig {
            dhcp: DhcpType::Static,
            addr_subnet: Some("192.168.1.44/24".parse().unwrap()),
            gateway: Some("192.168.1.1".parse().unwrap()),
            ..Default::default()
        };
        let status = c.to_status();
        assert_eq!(status.version, DevicePortConfigVersion::IS_MGMT);
        assert_eq!(status.ports.len(), 2);
        assert_eq!(status.ports[0].name, "uplink");
        assert_eq!(status.ports[0].network.dhcp, DhcpType::Static);
        assert_eq!(
            status.ports[0].network.subnet.map(|s| s.to_string()),
            Some("192.168.1.44/24".to_string())
        );
        assert!(status.ports[0].addr_info_list.is_empty());
        assert!(!status.ports[1].is_mgmt);
    }

    #[test]
    fn test_validate() {
        assert!(config("a").validate().is_ok());

        let mut dup = config("a");
        dup.ports[1].if_name = "eth0".to_string();
        assert!(dup.validate().is_err());

        let mut static_without_subnet = config("a");
        static_without_subnet.ports[0].dhcp_config.dhcp = DhcpType::Static;
        assert!(static_without_subnet.validate().is_err());
    }

    #[test]
    fn test_list_lookup() {
        let list = DevicePortConfigList::new(vec![config("zedagent"), config("lastresort")]);
        assert_eq!(list.current().map(|c| c.key.as_str()), Some("zedagent"));
        assert_eq!(list.find_by_key("lastresort").map(|(i, _)| i), Some(1));
        assert!(list.find_by_key("override").is_none());
        assert!(list.get(2).is_none());
        assert_eq!(list.iter().count(), 2);
        assert!(DevicePortConfigList::default().current().is_none());
    }

    #[test]
    fn test_list_rejects_duplicate_keys() {
        let list = DevicePortConfigList::new(vec![config("a"), config("a")]);
        assert!(list.validate().is_err());

        let unkeyed = DevicePortConfigList::new(vec![config(""), config("")]);
        assert!(unkeyed.validate().is_ok());
    }

    #[test]
    fn test_legacy_conversion() {
        let legacy = DeviceNetworkConfig {
            uplink: vec!["eth0".to_string(), "wwan0".to_string()],
            free_uplinks: vec!["eth0".to_string()],
        };
        let c = legacy.to_port_config("legacy");
        assert_eq!(c.version, DevicePortConfigVersion::INITIAL);
        assert!(c.ports.iter().all(|p| p.is_mgmt));
        assert!(c.port("eth0").unwrap().free);
        assert!(!c.port("wwan0").unwrap().free);
        assert_eq!(c.ports[0].dhcp_config.dhcp, DhcpType::Client);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_port_config_decodes_flattened_fields() {
        let json = r#"{
            "Version": 1,
            "Key": "zedagent",
            "TimePriority": "2024-03-01T10:00:00Z",
            "Ports": [{
                "IfName": "eth0", "IsMgmt": true, "Dhcp": 1,
                "AddrSubnet": "10.0.0.5/24", "Gateway": "10.0.0.1",
                "Proxies": [{"Type": 0, "Server": "proxy.local", "Port": 3128}]
            }]
        }"#;
        let c: DevicePortConfig = serde_json::from_str(json).unwrap();
        assert!(c.time_priority.is_some());
        assert!(c.last_failed.is_none());
        assert_eq!(c.ports[0].dhcp_config.dhcp, DhcpType::Static);
        assert!(c.ports[0].proxy.is_configured());
        assert!(c.validate().is_ok());
    }
}
