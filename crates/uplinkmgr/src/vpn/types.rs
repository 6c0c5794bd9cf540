use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UplinkError;
use crate::vnet::NetworkServiceType;

/// StrongSwan parameters as delivered in a service's opaque config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct StrongSwanServiceConfig {
    pub vpn_role: String,
    pub policy_based: bool,
    pub is_client: bool,
    pub vpn_gateway_ip_addr: String,
    pub vpn_subnet_block: String,
    pub vpn_local_ip_addr: String,
    pub vpn_remote_ip_addr: String,
    pub pre_shared_key: String,
    pub local_subnet_block: String,
    pub client_config_list: Vec<VpnClientConfig>,
}

/// Resolved VPN configuration handed to the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VpnServiceConfig {
    pub vpn_role: String,
    pub policy_based: bool,
    pub is_client: bool,
    pub port_config: NetLinkConfig,
    pub app_link_config: NetLinkConfig,
    pub gateway_config: NetLinkConfig,
    pub client_config_list: Vec<VpnClientConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NetLinkConfig {
    pub name: String,
    pub ip_addr: String,
    pub subnet_block: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VpnClientConfig {
    pub ip_addr: String,
    pub subnet_block: String,
    pub pre_shared_key: String,
    pub tunnel_config: VpnTunnelConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VpnTunnelConfig {
    pub name: String,
    pub key: String,
    pub mtu: String,
    pub metric: String,
    pub local_ip_addr: String,
    pub remote_ip_addr: String,
}

/// IKE/IPsec state of a connection or link.
///
/// Wire values are 0 to 5 and 10; the gap is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum VpnState {
    #[default]
    Invalid,
    Initial,
    Connecting,
    Established,
    Installed,
    Rekeyed,
    Deleted,
}

impl VpnState {
    /// Established or past it, and not torn down.
    pub const fn is_up(&self) -> bool {
        matches!(
            self,
            VpnState::Established | VpnState::Installed | VpnState::Rekeyed
        )
    }
}

impl TryFrom<u8> for VpnState {
    type Error = UplinkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Invalid),
            1 => Ok(Self::Initial),
            2 => Ok(Self::Connecting),
            3 => Ok(Self::Established),
            4 => Ok(Self::Installed),
            5 => Ok(Self::Rekeyed),
            10 => Ok(Self::Deleted),
            other => Err(UplinkError::validation(
                "VPN state",
                format!("unknown value {}", other),
            )),
        }
    }
}

impl From<VpnState> for u8 {
    fn from(value: VpnState) -> u8 {
        match value {
            VpnState::Invalid => 0,
            VpnState::Initial => 1,
            VpnState::Connecting => 2,
            VpnState::Established => 3,
            VpnState::Installed => 4,
            VpnState::Rekeyed => 5,
            VpnState::Deleted => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PktStats {
    pub pkts: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LinkPktStats {
    pub in_pkts: PktStats,
    pub out_pkts: PktStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VpnLinkInfo {
    pub sub_net: String,
    /// Security parameter index.
    pub spi_id: String,
    /// false: inbound, true: outbound.
    pub direction: bool,
    pub pkt_stats: PktStats,
}

/// One IPsec child SA.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VpnLinkStatus {
    pub id: String,
    pub name: String,
    pub req_id: String,
    pub inst_time: u64,
    pub exp_time: u64,
    pub rekey_time: u64,
    pub esp_info: String,
    pub state: VpnState,
    #[serde(rename = "LInfo")]
    pub l_info: VpnLinkInfo,
    #[serde(rename = "RInfo")]
    pub r_info: VpnLinkInfo,
    pub mark_delete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VpnEndPoint {
    pub id: String,
    pub ip_addr: String,
    /// UDP port.
    pub port: u32,
}

/// One IKE connection and its links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VpnConnStatus {
    pub id: String,
    pub name: String,
    pub state: VpnState,
    /// IKE version.
    pub version: String,
    pub ikes: String,
    pub est_time: u64,
    pub reauth_time: u64,
    #[serde(rename = "LInfo")]
    pub l_info: VpnEndPoint,
    #[serde(rename = "RInfo")]
    pub r_info: VpnEndPoint,
    pub links: Vec<VpnLinkStatus>,
    pub start_line: u32,
    pub end_line: u32,
    pub mark_delete: bool,
}

/// StrongSwan service status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ServiceVpnStatus {
    pub version: String,
    #[serde(deserialize_with = "crate::timestamp::zero_as_none")]
    pub up_time: Option<DateTime<Utc>>,
    /// Listening addresses, space separated.
    pub ip_addrs: String,
    pub active_vpn_conns: Vec<VpnConnStatus>,
    pub stale_vpn_conns: Vec<VpnConnStatus>,
    pub active_tun_count: u32,
    pub connecting_tun_count: u32,
    pub policy_based: bool,
}

impl ServiceVpnStatus {
    /// Recomputes the tunnel counters from the active connection list.
    pub fn recount_tunnels(&mut self) {
        let count = |pred: fn(&VpnState) -> bool| {
            let n = self.active_vpn_conns.iter().filter(|c| pred(&c.state)).count();
            u32::try_from(n).unwrap_or(u32::MAX)
        };
        let active = count(VpnState::is_up);
        let connecting = count(|state| *state == VpnState::Connecting);
        self.active_tun_count = active;
        self.connecting_tun_count = connecting;
    }

    /// Moves connections marked for deletion to the stale list.
    pub fn retire_marked(&mut self) {
        let (stale, active): (Vec<_>, Vec<_>) = self
            .active_vpn_conns
            .drain(..)
            .partition(|conn| conn.mark_delete);
        self.active_vpn_conns = active;
        self.stale_vpn_conns.extend(stale);
        self.recount_tunnels();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VpnLinkMetrics {
    pub sub_net: String,
    pub spi_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VpnEndPointMetrics {
    pub ip_addr: String,
    pub link_info: VpnLinkMetrics,
    pub pkt_stats: PktStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpnConnMetrics {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub est_time: u64,
    #[serde(rename = "Type")]
    pub service_type: NetworkServiceType,
    #[serde(default, rename = "LEndPoint")]
    pub l_end_point: VpnEndPointMetrics,
    #[serde(default, rename = "REndPoint")]
    pub r_end_point: VpnEndPointMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VpnMetrics {
    #[serde(deserialize_with = "crate::timestamp::zero_as_none")]
    pub up_time: Option<DateTime<Utc>>,
    pub data_stat: LinkPktStats,
    pub ike_stat: LinkPktStats,
    pub nat_t_stat: LinkPktStats,
    pub esp_stat: LinkPktStats,
    pub err_stat: LinkPktStats,
    pub phy_err_stat: LinkPktStats,
    pub vpn_conns: Vec<VpnConnMetrics>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn conn(name: &str, state: VpnState) -> VpnConnStatus {
        VpnConnStatus {
            name: name.to_string(),
            state,
            ..Default::default()
        }
    }

    #[test]
    fn test_state_gap() {
        assert_eq!(VpnState::try_from(10).unwrap(), VpnState::Deleted);
        assert_eq!(u8::from(VpnState::Deleted), 10);
        assert!(VpnState::try_from(6).is_err());
        assert!(VpnState::try_from(255).is_err());
    }

    #[test]
    fn test_recount_tunnels() {
        let mut status = ServiceVpnStatus {
            active_vpn_conns: vec![
                conn("a", VpnState::Established),
                conn("b", VpnState::Connecting),
                conn("c", VpnState::Installed),
                conn("d", VpnState::Initial),
            ],
            ..Default::default()
        };
        status.recount_tunnels();
        assert_eq!(status.active_tun_count, 2);
        assert_eq!(status.connecting_tun_count, 1);
    }

    #[test]
    fn test_retire_marked() {
        let mut gone = conn("b", VpnState::Established);
        gone.mark_delete = true;
        let mut status = ServiceVpnStatus {
            active_vpn_conns: vec![conn("a", VpnState::Established), gone],
            ..Default::default()
        };
        status.retire_marked();
        assert_eq!(status.active_vpn_conns.len(), 1);
        assert_eq!(status.stale_vpn_conns[0].name, "b");
        assert_eq!(status.active_tun_count, 1);
    }

    #[test]
    fn test_conn_status_decodes() {
        let json = r#"{"Id": "1", "Name": "site", "State": 3,
            "LInfo": {"IpAddr": "192.0.2.1", "Port": 4500},
            "Links": [{"Id": "7", "State": 4, "LInfo": {"SpiId": "c1"}}]}"#;
        let status: VpnConnStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.state, VpnState::Established);
        assert_eq!(status.l_info.port, 4500);
        assert_eq!(status.links[0].state, VpnState::Installed);
    }
}
