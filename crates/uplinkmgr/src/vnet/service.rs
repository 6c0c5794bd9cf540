//! Network services: VPN, LISP, bridge, NAT and load balancer instances
//! bound to a network object and an adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uplink_types::IpPrefix;
use uuid::Uuid;

use crate::error::{UplinkError, UplinkResult};
use crate::lisp::{LispInfoStatus, LispMetrics, ServiceLispConfig};
use crate::vpn::{ServiceVpnStatus, VpnMetrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NetworkServiceType {
    StrongSwan,
    Lisp,
    Bridge,
    Nat,
    LoadBalance,
}

impl TryFrom<u8> for NetworkServiceType {
    type Error = UplinkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::StrongSwan),
            2 => Ok(Self::Lisp),
            3 => Ok(Self::Bridge),
            4 => Ok(Self::Nat),
            5 => Ok(Self::LoadBalance),
            other => Err(UplinkError::validation(
                "network service type",
                format!("unknown value {}", other),
            )),
        }
    }
}

impl From<NetworkServiceType> for u8 {
    fn from(value: NetworkServiceType) -> u8 {
        match value {
            NetworkServiceType::StrongSwan => 1,
            NetworkServiceType::Lisp => 2,
            NetworkServiceType::Bridge => 3,
            NetworkServiceType::Nat => 4,
            NetworkServiceType::LoadBalance => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkServiceConfig {
    #[serde(rename = "UUID")]
    pub uuid: Uuid,
    /// Created locally rather than pushed by the controller.
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "Type")]
    pub service_type: NetworkServiceType,
    #[serde(default)]
    pub activate: bool,
    /// Network object this service serves.
    #[serde(default)]
    pub app_link: Uuid,
    /// Interface name, port group such as `uplink`, or empty.
    #[serde(default)]
    pub adapter: String,
    #[serde(default)]
    pub opaque_config: String,
    #[serde(default)]
    pub lisp_config: ServiceLispConfig,
}

impl NetworkServiceConfig {
    pub fn key(&self) -> String {
        self.uuid.to_string()
    }

    pub fn validate(&self) -> UplinkResult<()> {
        if self.uuid.is_nil() {
            return Err(UplinkError::validation("network service", "nil UUID"));
        }
        if self.service_type == NetworkServiceType::Lisp && self.lisp_config.iid == 0 {
            return Err(UplinkError::validation(
                format!("network service {}", self.uuid),
                "LISP service requires an instance id",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkServiceStatus {
    #[serde(rename = "UUID")]
    pub uuid: Uuid,
    #[serde(default)]
    pub pending_add: bool,
    #[serde(default)]
    pub pending_modify: bool,
    #[serde(default)]
    pub pending_delete: bool,
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "Type")]
    pub service_type: NetworkServiceType,
    #[serde(default)]
    pub activated: bool,
    #[serde(default)]
    pub app_link: Uuid,
    #[serde(default)]
    pub adapter: String,
    #[serde(default)]
    pub opaque_status: String,
    #[serde(default)]
    pub lisp_status: ServiceLispConfig,
    /// Interfaces resolved from `adapter` at activation.
    #[serde(default)]
    pub if_name_list: Vec<String>,
    /// Subnet of the app link at activation.
    #[serde(default)]
    pub subnet: Option<IpPrefix>,
    /// `app_link` did not name a known network object.
    #[serde(default)]
    pub missing_network: bool,
    #[serde(default)]
    pub error: String,
    #[serde(default, deserialize_with = "crate::timestamp::zero_as_none")]
    pub error_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpn_status: Option<ServiceVpnStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lisp_info_status: Option<LispInfoStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lisp_metrics: Option<LispMetrics>,
}

impl NetworkServiceStatus {
    /// Initial status for a newly seen configuration.
    pub fn from_config(config: &NetworkServiceConfig) -> Self {
        Self {
            uuid: config.uuid,
            pending_add: true,
            pending_modify: false,
            pending_delete: false,
            display_name: config.display_name.clone(),
            service_type: config.service_type,
            activated: false,
            app_link: config.app_link,
            adapter: config.adapter.clone(),
            opaque_status: String::new(),
            lisp_status: config.lisp_config.clone(),
            if_name_list: Vec::new(),
            subnet: None,
            missing_network: false,
            error: String::new(),
            error_time: None,
            vpn_status: None,
            lisp_info_status: None,
            lisp_metrics: None,
        }
    }

    pub fn key(&self) -> String {
        self.uuid.to_string()
    }

    pub fn pending(&self) -> bool {
        self.pending_add || self.pending_modify || self.pending_delete
    }
}

/// Per-service counters, keyed by service UUID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkServiceMetrics {
    #[serde(rename = "UUID")]
    pub uuid: Uuid,
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "Type")]
    pub service_type: NetworkServiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpn_metrics: Option<VpnMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lisp_metrics: Option<LispMetrics>,
}

impl NetworkServiceMetrics {
    pub fn key(&self) -> String {
        self.uuid.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lisp_service() -> NetworkServiceConfig {
        NetworkServiceConfig {
            uuid: Uuid::new_v4(),
            internal: false,
            display_name: "overlay".to_string(),
            service_type: NetworkServiceType::Lisp,
            activate: true,
            app_link: Uuid::new_v4(),
            adapter: "uplink".to_string(),
            opaque_config: String::new(),
            lisp_config: ServiceLispConfig {
                iid: 1000,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_service_type_values() {
        assert_eq!(NetworkServiceType::try_from(1).unwrap(), NetworkServiceType::StrongSwan);
        assert_eq!(u8::from(NetworkServiceType::LoadBalance), 5);
        assert!(NetworkServiceType::try_from(0).is_err());
        assert!(NetworkServiceType::try_from(255).is_err());
    }

    #[test]
    fn test_lisp_requires_iid() {
        assert!(lisp_service().validate().is_ok());

        let mut config = lisp_service();
        config.lisp_config.iid = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_status_from_config() {
        let config = lisp_service();
        let status = NetworkServiceStatus::from_config(&config);
        assert_eq!(status.key(), config.key());
        assert!(status.pending());
        assert!(!status.activated);
        assert_eq!(status.lisp_status.iid, 1000);
    }

    #[test]
    fn test_config_decodes() {
        let json = r#"{"UUID": "6ba7b810-9dad-11d1-80b4-00c04fd430c8", "Type": 3, "Adapter": "eth0"}"#;
        let config: NetworkServiceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.service_type, NetworkServiceType::Bridge);
        assert!(config.app_link.is_nil());
        assert!(config.validate().is_ok());
    }
}
