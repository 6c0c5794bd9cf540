use serde::{Deserialize, Serialize};
use uplink_types::IpAddress;

use crate::error::UplinkError;

/// Role of a map server entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MapServerType {
    #[default]
    Invalid,
    MapServer,
    SupportServer,
}

impl TryFrom<u8> for MapServerType {
    type Error = UplinkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Invalid),
            1 => Ok(Self::MapServer),
            2 => Ok(Self::SupportServer),
            other => Err(UplinkError::validation(
                "map server type",
                format!("unknown value {}", other),
            )),
        }
    }
}

impl From<MapServerType> for u8 {
    fn from(value: MapServerType) -> u8 {
        match value {
            MapServerType::Invalid => 0,
            MapServerType::MapServer => 1,
            MapServerType::SupportServer => 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct MapServer {
    pub service_type: MapServerType,
    pub name_or_ip: String,
    pub credential: String,
}

/// LISP parameters of a network service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ServiceLispConfig {
    pub map_servers: Vec<MapServer>,
    #[serde(rename = "IID")]
    pub iid: u32,
    pub allocate: bool,
    pub export_private: bool,
    pub eid_prefix: Option<IpAddress>,
    pub eid_prefix_len: u32,
    pub experimental: bool,
}

impl ServiceLispConfig {
    /// Map servers usable for registration, skipping invalid entries.
    pub fn registration_servers(&self) -> impl Iterator<Item = &MapServer> + '_ {
        self.map_servers
            .iter()
            .filter(|server| server.service_type != MapServerType::Invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LispRlocState {
    pub rloc: IpAddress,
    pub reachable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LispMapCacheEntry {
    #[serde(rename = "EID")]
    pub eid: IpAddress,
    #[serde(default)]
    pub rlocs: Vec<LispRlocState>,
}

impl LispMapCacheEntry {
    pub fn is_reachable(&self) -> bool {
        self.rlocs.iter().any(|rloc| rloc.reachable)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LispDatabaseMap {
    #[serde(rename = "IID")]
    pub iid: u64,
    pub map_cache_entries: Vec<LispMapCacheEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LispDecapKey {
    pub rloc: IpAddress,
    #[serde(default)]
    pub port: u64,
    #[serde(default)]
    pub key_count: u64,
}

/// Control-plane state reported by the LISP service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LispInfoStatus {
    pub itr_crypto_port: u64,
    pub etr_nat_port: u64,
    pub interfaces: Vec<String>,
    pub database_maps: Vec<LispDatabaseMap>,
    pub decap_keys: Vec<LispDecapKey>,
}

impl LispInfoStatus {
    /// Map-cache entries across every instance that have no reachable RLOC.
    pub fn unreachable_eids(&self) -> Vec<(u64, IpAddress)> {
        self.database_maps
            .iter()
            .flat_map(|map| {
                map.map_cache_entries
                    .iter()
                    .filter(|entry| !entry.is_reachable())
                    .map(move |entry| (map.iid, entry.eid))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LispPktStat {
    pub pkts: u64,
    pub bytes: u64,
}

impl LispPktStat {
    pub fn saturating_add(self, other: LispPktStat) -> LispPktStat {
        LispPktStat {
            pkts: self.pkts.saturating_add(other.pkts),
            bytes: self.bytes.saturating_add(other.bytes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LispRlocStatistics {
    pub rloc: IpAddress,
    #[serde(default)]
    pub stats: LispPktStat,
    #[serde(default)]
    pub seconds_since_last_packet: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EidStatistics {
    #[serde(rename = "IID")]
    pub iid: u64,
    pub eid: IpAddress,
    #[serde(default)]
    pub rloc_stats: Vec<LispRlocStatistics>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct EidMap {
    #[serde(rename = "IID")]
    pub iid: u64,
    pub eids: Vec<IpAddress>,
}

/// Data-plane counters reported by the LISP service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LispMetrics {
    pub eid_maps: Vec<EidMap>,
    pub eid_stats: Vec<EidStatistics>,
    pub itr_packet_send_error: LispPktStat,
    pub invalid_eid_error: LispPktStat,
    pub no_decrypt_key: LispPktStat,
    pub outer_header_error: LispPktStat,
    pub bad_inner_version: LispPktStat,
    pub good_packets: LispPktStat,
    #[serde(rename = "ICVError")]
    pub icv_error: LispPktStat,
    pub lisp_header_error: LispPktStat,
    pub check_sum_error: LispPktStat,
    pub decap_re_inject_error: LispPktStat,
    pub decrypt_error: LispPktStat,
}

impl LispMetrics {
    /// Sum of every decapsulation error counter.
    pub fn total_decap_errors(&self) -> LispPktStat {
        [
            self.no_decrypt_key,
            self.outer_header_error,
            self.bad_inner_version,
            self.icv_error,
            self.lisp_header_error,
            self.check_sum_error,
            self.decap_re_inject_error,
            self.decrypt_error,
        ]
        .into_iter()
        .fold(LispPktStat::default(), LispPktStat::saturating_add)
    }
}

/// Selects between the legacy and the current LISP data plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LispDataplaneConfig {
    pub legacy: bool,
}
