//! Per-application network attachments.
//!
//! An application attaches to networks through overlay (EID-addressed) and
//! underlay (plain bridged) interfaces. Each attachment names its network
//! object by UUID and carries the ACL applied to its vif.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uplink_types::{IpAddress, MacAddress};
use uuid::Uuid;

use crate::acl::{validate_acl, Ace, AclScope};
use crate::error::{UplinkError, UplinkResult};
use crate::lisp::MapServer;
use crate::port::AddrInfo;
use crate::vnet::DnsNameToIp;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct UuidAndVersion {
    #[serde(rename = "UUID")]
    pub uuid: Uuid,
    pub version: String,
}

/// Host side of an application interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VifInfo {
    pub bridge: String,
    pub vif: String,
    /// Name the hypervisor actually gave the vif.
    pub vif_used: String,
    pub mac: Option<MacAddress>,
}

/// Device location details passed to applications on an overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AdditionalInfoDevice {
    #[serde(rename = "UnderlayIP")]
    pub underlay_ip: String,
    /// From reverse DNS.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,
    /// Latitude and longitude.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub loc: String,
    /// From the AS number.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub org: String,
}

impl AdditionalInfoDevice {
    /// Projects an observed port address and its geolocation, if any.
    pub fn from_addr_info(info: &AddrInfo) -> Self {
        let mut device = AdditionalInfoDevice {
            underlay_ip: info.addr.to_string(),
            ..Default::default()
        };
        if let Some(geo) = &info.geo {
            device.hostname = geo.hostname.clone();
            device.city = geo.city.clone();
            device.region = geo.region.clone();
            device.country = geo.country.clone();
            device.loc = geo.loc.clone();
            device.org = geo.org.clone();
        }
        device
    }
}

/// Application details shared with peers over the overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AdditionalInfoApp {
    pub display_name: String,
    #[serde(rename = "DeviceEID")]
    pub device_eid: Option<IpAddress>,
    #[serde(rename = "DeviceIID")]
    pub device_iid: u32,
    #[serde(rename = "UnderlayIP")]
    pub underlay_ip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
}

fn check_app_mac(mac: &Option<MacAddress>, name: &str) -> UplinkResult<()> {
    match mac {
        Some(mac) if !mac.is_assignable() => Err(UplinkError::validation(
            format!("interface {}", name),
            format!("MAC {} cannot be assigned to a vif", mac),
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct OverlayNetworkConfig {
    pub name: String,
    #[serde(rename = "EID")]
    pub eid: Option<IpAddress>,
    pub lisp_signature: String,
    #[serde(rename = "ACLs")]
    pub acls: Vec<Ace>,
    pub app_mac_addr: Option<MacAddress>,
    /// EIDv4 or EIDv6.
    #[serde(rename = "AppIPAddr")]
    pub app_ip_addr: Option<IpAddress>,
    pub network: Uuid,
    pub additional_info_device: Option<AdditionalInfoDevice>,
    #[serde(rename = "MgmtIID")]
    pub mgmt_iid: u32,
    #[serde(rename = "MgmtDnsNameToIPList")]
    pub mgmt_dns_name_to_ip_list: Vec<DnsNameToIp>,
    pub mgmt_map_servers: Vec<MapServer>,
}

impl OverlayNetworkConfig {
    pub fn validate(&self) -> UplinkResult<()> {
        check_app_mac(&self.app_mac_addr, &self.name)?;
        if let Some(eid) = &self.eid {
            if !eid.is_ipv6() {
                return Err(UplinkError::validation(
                    format!("overlay {}", self.name),
                    format!("EID {} is not IPv6", eid),
                ));
            }
        }
        validate_acl(&self.acls, AclScope::Overlay)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct OverlayNetworkStatus {
    #[serde(flatten)]
    pub config: OverlayNetworkConfig,
    #[serde(flatten)]
    pub vif_info: VifInfo,
    pub bridge_mac: Option<MacAddress>,
    /// Address of the DNS/DHCP service on the bridge.
    #[serde(rename = "BridgeIPAddr")]
    pub bridge_ip_addr: String,
    pub host_name: String,
}

impl From<OverlayNetworkConfig> for OverlayNetworkStatus {
    fn from(config: OverlayNetworkConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct UnderlayNetworkConfig {
    pub name: String,
    pub app_mac_addr: Option<MacAddress>,
    /// Fixed address handed out by DHCP when set.
    #[serde(rename = "AppIPAddr")]
    pub app_ip_addr: Option<IpAddress>,
    pub network: Uuid,
    #[serde(rename = "ACLs")]
    pub acls: Vec<Ace>,
}

impl UnderlayNetworkConfig {
    pub fn validate(&self) -> UplinkResult<()> {
        check_app_mac(&self.app_mac_addr, &self.name)?;
        validate_acl(&self.acls, AclScope::Underlay)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct UnderlayNetworkStatus {
    #[serde(flatten)]
    pub config: UnderlayNetworkConfig,
    #[serde(flatten)]
    pub vif_info: VifInfo,
    pub bridge_mac: Option<MacAddress>,
    #[serde(rename = "BridgeIPAddr")]
    pub bridge_ip_addr: String,
    /// Address handed to the application.
    #[serde(rename = "AssignedIPAddr")]
    pub assigned_ip_addr: String,
    pub host_name: String,
}

impl From<UnderlayNetworkConfig> for UnderlayNetworkStatus {
    fn from(config: UnderlayNetworkConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }
}

fn filename_matches(key: String, file_name: &str) -> bool {
    let expected = format!("{}.json", key);
    let matches = expected == file_name;
    if !matches {
        warn!(file = file_name, expected = %expected, "File name does not match contained UUID");
    }
    matches
}

/// Network attachments of one application, keyed by its UUID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AppNetworkConfig {
    #[serde(rename = "UUIDandVersion")]
    pub uuid_and_version: UuidAndVersion,
    pub display_name: String,
    pub activate: bool,
    pub legacy_data_plane: bool,
    pub overlay_network_list: Vec<OverlayNetworkConfig>,
    pub underlay_network_list: Vec<UnderlayNetworkConfig>,
}

impl AppNetworkConfig {
    pub fn key(&self) -> String {
        self.uuid_and_version.uuid.to_string()
    }

    /// Checks a snapshot file name against the contained UUID.
    pub fn verify_filename(&self, file_name: &str) -> bool {
        filename_matches(self.key(), file_name)
    }

    /// Network UUIDs referenced by every attachment, overlays first.
    pub fn network_uuids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.overlay_network_list
            .iter()
            .map(|o| o.network)
            .chain(self.underlay_network_list.iter().map(|u| u.network))
    }

    pub fn validate(&self) -> UplinkResult<()> {
        for overlay in &self.overlay_network_list {
            overlay.validate()?;
        }
        for underlay in &self.underlay_network_list {
            underlay.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AppNetworkStatus {
    #[serde(rename = "UUIDandVersion")]
    pub uuid_and_version: UuidAndVersion,
    pub app_num: u32,
    pub activated: bool,
    pub pending_add: bool,
    pub pending_modify: bool,
    pub pending_delete: bool,
    pub display_name: String,
    pub legacy_data_plane: bool,
    pub overlay_network_list: Vec<OverlayNetworkStatus>,
    pub underlay_network_list: Vec<UnderlayNetworkStatus>,
    /// Some attachment names a network that is not yet known.
    pub missing_network: bool,
    pub error: String,
    #[serde(deserialize_with = "crate::timestamp::zero_as_none")]
    pub error_time: Option<DateTime<Utc>>,
}

impl AppNetworkStatus {
    /// Initial status for a newly admitted configuration.
    pub fn from_config(config: &AppNetworkConfig, app_num: u32) -> Self {
        Self {
            uuid_and_version: config.uuid_and_version.clone(),
            app_num,
            pending_add: true,
            display_name: config.display_name.clone(),
            legacy_data_plane: config.legacy_data_plane,
            overlay_network_list: config
                .overlay_network_list
                .iter()
                .cloned()
                .map(OverlayNetworkStatus::from)
                .collect(),
            underlay_network_list: config
                .underlay_network_list
                .iter()
                .cloned()
                .map(UnderlayNetworkStatus::from)
                .collect(),
            ..Default::default()
        }
    }

    pub fn key(&self) -> String {
        self.uuid_and_version.uuid.to_string()
    }

    pub fn verify_filename(&self, file_name: &str) -> bool {
        filename_matches(self.key(), file_name)
    }

    pub fn pending(&self) -> bool {
        self.pending_add || self.pending_modify || self.pending_delete
    }
}
