//! Per-interface traffic counters.
//!
//! Field names are consumed by external metric publishers and must stay as
//! they are on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{UplinkError, UplinkResult};

pub use crate::vnet::NetworkServiceMetrics;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NetworkMetric {
    pub if_name: String,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub tx_drops: u64,
    pub rx_drops: u64,
    pub tx_pkts: u64,
    pub rx_pkts: u64,
    pub tx_errors: u64,
    pub rx_errors: u64,
    /// Drops by the implicit reject at the end of an ACL.
    pub tx_acl_drops: u64,
    pub rx_acl_drops: u64,
    /// Drops by rate-limited rules.
    pub tx_acl_rate_limit_drops: u64,
    pub rx_acl_rate_limit_drops: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NetworkMetrics {
    pub metric_list: Vec<NetworkMetric>,
}

impl NetworkMetrics {
    /// Decodes metrics received as a generic JSON document.
    pub fn from_value(value: Value) -> UplinkResult<Self> {
        serde_json::from_value(value).map_err(|source| UplinkError::Json {
            what: "network metrics".to_string(),
            source,
        })
    }

    pub fn lookup(&self, if_name: &str) -> Option<&NetworkMetric> {
        self.metric_list.iter().find(|m| m.if_name == if_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_field_names_on_the_wire() {
        let metric = NetworkMetric {
            if_name: "eth0".to_string(),
            tx_acl_rate_limit_drops: 3,
            ..Default::default()
        };
        let value = serde_json::to_value(&metric).unwrap();
        assert_eq!(value["IfName"], "eth0");
        assert_eq!(value["TxAclRateLimitDrops"], 3);
        assert_eq!(value["RxAclDrops"], 0);
        assert_eq!(value.as_object().unwrap().len(), 13);
    }

    #[test]
    fn test_from_value() {
        let metrics = NetworkMetrics::from_value(json!({
            "MetricList": [
                {"IfName": "eth0", "TxBytes": 1024, "RxPkts": 7},
                {"IfName": "wwan0", "RxBytes": 18446744073709551615u64}
            ]
        }))
        .unwrap();
        assert_eq!(metrics.lookup("eth0").map(|m| m.tx_bytes), Some(1024));
        assert_eq!(metrics.lookup("wwan0").map(|m| m.rx_bytes), Some(u64::MAX));
        assert!(metrics.lookup("eth9").is_none());
    }

    #[test]
    fn test_from_value_rejects_negative_counter() {
        let err = NetworkMetrics::from_value(json!({
            "MetricList": [{"IfName": "eth0", "TxBytes": -1}]
        }))
        .unwrap_err();
        assert!(matches!(err, UplinkError::Json { .. }));
    }
}
