//! ACL entry types.
//!
//! An ACE pairs an ordered list of match predicates with an ordered list of
//! actions. Entries are validated when they are built or decoded, so an
//! `Ace` value that exists is always well formed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uplink_types::{IpAddress, IpPrefix};

use crate::error::{UplinkError, UplinkResult};

/// What an ACE match predicate compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AceMatchType {
    /// Remote IP address or prefix.
    Ip,
    /// Remote host name, suffix matched (`example.net` matches
    /// `*.example.net`).
    Host,
    /// Every address in the overlay's DNS name list. Overlay only.
    EidSet,
    /// IP protocol by name or number.
    Protocol,
    /// Foreign (remote) L4 port.
    Fport,
    /// Local L4 port.
    Lport,
}

impl AceMatchType {
    pub const fn is_port(&self) -> bool {
        matches!(self, AceMatchType::Fport | AceMatchType::Lport)
    }
}

impl fmt::Display for AceMatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ip => "ip",
            Self::Host => "host",
            Self::EidSet => "eidset",
            Self::Protocol => "protocol",
            Self::Fport => "fport",
            Self::Lport => "lport",
        };
        write!(f, "{}", s)
    }
}

/// One `{type, value}` match predicate. Matches are bidirectional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AceMatch {
    #[serde(rename = "Type")]
    pub match_type: AceMatchType,
    #[serde(default)]
    pub value: String,
}

impl AceMatch {
    pub fn new(match_type: AceMatchType, value: impl Into<String>) -> Self {
        Self {
            match_type,
            value: value.into(),
        }
    }

    pub fn ip(value: impl Into<String>) -> Self {
        Self::new(AceMatchType::Ip, value)
    }

    pub fn host(value: impl Into<String>) -> Self {
        Self::new(AceMatchType::Host, value)
    }

    pub fn eidset() -> Self {
        Self::new(AceMatchType::EidSet, "")
    }

    pub fn protocol(value: impl Into<String>) -> Self {
        Self::new(AceMatchType::Protocol, value)
    }

    pub fn fport(port: u16) -> Self {
        Self::new(AceMatchType::Fport, port.to_string())
    }

    pub fn lport(port: u16) -> Self {
        Self::new(AceMatchType::Lport, port.to_string())
    }

    /// IP protocol number for a `protocol` match.
    pub fn protocol_number(&self) -> Option<u8> {
        if self.match_type != AceMatchType::Protocol {
            return None;
        }
        match self.value.to_ascii_lowercase().as_str() {
            "icmp" => Some(1),
            "tcp" => Some(6),
            "udp" => Some(17),
            "icmpv6" => Some(58),
            other => other.parse().ok(),
        }
    }

    /// Port number for an `fport`/`lport` match.
    pub fn port(&self) -> Option<u16> {
        if !self.match_type.is_port() {
            return None;
        }
        self.value.parse().ok().filter(|port| *port != 0)
    }

    /// Port number of an `lport` match.
    pub fn port_if_local(&self) -> Option<u16> {
        if self.match_type == AceMatchType::Lport {
            self.port()
        } else {
            None
        }
    }

    fn validate(&self) -> UplinkResult<()> {
        let invalid = |message: &str| {
            UplinkError::validation(
                format!("ACE match {}", self.match_type),
                format!("{} ({:?})", message, self.value),
            )
        };
        match self.match_type {
            AceMatchType::Ip => {
                let is_addr = IpAddress::from_str(&self.value).is_ok();
                let is_prefix = IpPrefix::from_str(&self.value).is_ok();
                if !is_addr && !is_prefix {
                    return Err(invalid("not an address or prefix"));
                }
            }
            AceMatchType::Host => {
                if self.value.is_empty() || self.value.chars().any(char::is_whitespace) {
                    return Err(invalid("not a host name"));
                }
            }
            AceMatchType::EidSet => {}
            AceMatchType::Protocol => {
                if self.protocol_number().is_none() {
                    return Err(invalid("unknown protocol"));
                }
            }
            AceMatchType::Fport | AceMatchType::Lport => {
                if self.port().is_none() {
                    return Err(invalid("not a port number"));
                }
            }
        }
        Ok(())
    }
}

/// Rate limiter time unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitUnit {
    Second,
    Minute,
    Hour,
}

impl LimitUnit {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LimitUnit::Second => "s",
            LimitUnit::Minute => "m",
            LimitUnit::Hour => "h",
        }
    }
}

impl FromStr for LimitUnit {
    type Err = UplinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" => Ok(LimitUnit::Second),
            "m" => Ok(LimitUnit::Minute),
            "h" => Ok(LimitUnit::Hour),
            other => Err(UplinkError::validation(
                "ACE limit unit",
                format!("unknown unit {:?}", other),
            )),
        }
    }
}

/// Packet rate limit attached to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Packets per unit.
    pub rate: u32,
    pub unit: LimitUnit,
    /// Burst size in packets.
    pub burst: u32,
}

/// One ACE action.
///
/// Rate limiting and port mapping are optional parts of the action; their
/// parameters only exist when the part is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AceActionFields", into = "AceActionFields")]
pub struct AceAction {
    /// Drop when set, otherwise accept.
    pub drop: bool,
    pub limit: Option<RateLimit>,
    /// Internal target port when port mapping is enabled.
    pub port_map: Option<u16>,
}

impl AceAction {
    pub const fn accept() -> Self {
        Self {
            drop: false,
            limit: None,
            port_map: None,
        }
    }

    pub const fn drop() -> Self {
        Self {
            drop: true,
            limit: None,
            port_map: None,
        }
    }

    pub fn with_limit(mut self, rate: u32, unit: LimitUnit, burst: u32) -> Self {
        self.limit = Some(RateLimit { rate, unit, burst });
        self
    }

    pub fn with_port_map(mut self, target_port: u16) -> Self {
        self.port_map = Some(target_port);
        self
    }

    fn validate(&self) -> UplinkResult<()> {
        if let Some(limit) = &self.limit {
            if limit.rate == 0 {
                return Err(UplinkError::validation("ACE action", "limit rate must be positive"));
            }
        }
        match self.port_map {
            Some(0) => Err(UplinkError::validation("ACE action", "target port 0")),
            Some(_) if self.drop => Err(UplinkError::validation(
                "ACE action",
                "port mapping on a drop action",
            )),
            _ => Ok(()),
        }
    }
}

/// Flat wire form of [`AceAction`]. `Limit*` fields are read only when
/// `Limit` is set and `TargetPort` only when `PortMap` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AceActionFields {
    pub drop: bool,
    pub limit: bool,
    pub limit_rate: i64,
    pub limit_unit: String,
    pub limit_burst: i64,
    pub port_map: bool,
    pub target_port: i64,
}

impl TryFrom<AceActionFields> for AceAction {
    type Error = UplinkError;

    fn try_from(fields: AceActionFields) -> Result<Self, Self::Error> {
        let limit = if fields.limit {
            let rate = u32::try_from(fields.limit_rate).map_err(|_| {
                UplinkError::validation(
                    "ACE action",
                    format!("limit rate {} out of range", fields.limit_rate),
                )
            })?;
            let burst = u32::try_from(fields.limit_burst).map_err(|_| {
                UplinkError::validation(
                    "ACE action",
                    format!("limit burst {} out of range", fields.limit_burst),
                )
            })?;
            Some(RateLimit {
                rate,
                unit: fields.limit_unit.parse()?,
                burst,
            })
        } else {
            None
        };

        let port_map = if fields.port_map {
            let port = u16::try_from(fields.target_port).map_err(|_| {
                UplinkError::validation(
                    "ACE action",
                    format!("target port {} out of range", fields.target_port),
                )
            })?;
            Some(port)
        } else {
            None
        };

        let action = AceAction {
            drop: fields.drop,
            limit,
            port_map,
        };
        action.validate()?;
        Ok(action)
    }
}

impl From<AceAction> for AceActionFields {
    fn from(action: AceAction) -> Self {
        let mut fields = AceActionFields {
            drop: action.drop,
            ..Default::default()
        };
        if let Some(limit) = action.limit {
            fields.limit = true;
            fields.limit_rate = i64::from(limit.rate);
            fields.limit_unit = limit.unit.as_str().to_string();
            fields.limit_burst = i64::from(limit.burst);
        }
        if let Some(port) = action.port_map {
            fields.port_map = true;
            fields.target_port = i64::from(port);
        }
        fields
    }
}

/// Access control entry. Every ACL ends with an implicit reject, so an
/// entry must carry at least one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AceFields", into = "AceFields")]
pub struct Ace {
    matches: Vec<AceMatch>,
    actions: Vec<AceAction>,
}

impl Ace {
    /// Builds a validated entry. An empty match list matches everything.
    pub fn new(matches: Vec<AceMatch>, actions: Vec<AceAction>) -> UplinkResult<Self> {
        if actions.is_empty() {
            return Err(UplinkError::validation("ACE", "at least one action is required"));
        }
        for m in &matches {
            m.validate()?;
        }
        for action in &actions {
            action.validate()?;
        }

        let has_port = matches.iter().any(|m| m.match_type.is_port());
        let l4_protocol = matches
            .iter()
            .filter_map(AceMatch::protocol_number)
            .any(|proto| proto == 6 || proto == 17);
        if has_port && !l4_protocol {
            return Err(UplinkError::validation(
                "ACE",
                "port match requires a tcp or udp protocol match",
            ));
        }

        Ok(Self { matches, actions })
    }

    pub fn matches(&self) -> &[AceMatch] {
        &self.matches
    }

    pub fn actions(&self) -> &[AceAction] {
        &self.actions
    }

    pub fn has_match(&self, match_type: AceMatchType) -> bool {
        self.matches.iter().any(|m| m.match_type == match_type)
    }

    /// True when the first action accepts traffic.
    pub fn is_accept(&self) -> bool {
        self.actions.first().is_some_and(|a| !a.drop)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.actions.iter().any(|a| a.limit.is_some())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct AceFields {
    matches: Vec<AceMatch>,
    actions: Vec<AceAction>,
}

impl TryFrom<AceFields> for Ace {
    type Error = UplinkError;

    fn try_from(fields: AceFields) -> Result<Self, Self::Error> {
        Ace::new(fields.matches, fields.actions)
    }
}

impl From<Ace> for AceFields {
    fn from(ace: Ace) -> Self {
        AceFields {
            matches: ace.matches,
            actions: ace.actions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_actions_rejected() {
        let err = Ace::new(vec![AceMatch::ip("10.0.0.0/8")], vec![]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_match_all_drop_is_valid() {
        let ace = Ace::new(vec![], vec![AceAction::drop()]).unwrap();
        assert!(ace.matches().is_empty());
        assert!(!ace.is_accept());
    }

    #[test]
    fn test_match_value_validation() {
        assert!(Ace::new(vec![AceMatch::ip("10.0.0.1")], vec![AceAction::accept()]).is_ok());
        assert!(Ace::new(vec![AceMatch::ip("10.0.0.0/33")], vec![AceAction::accept()]).is_err());
        assert!(Ace::new(vec![AceMatch::host("")], vec![AceAction::accept()]).is_err());
        assert!(Ace::new(vec![AceMatch::protocol("sctp")], vec![AceAction::accept()]).is_err());
        assert!(Ace::new(vec![AceMatch::protocol("132")], vec![AceAction::accept()]).is_ok());
    }

    #[test]
    fn test_port_match_needs_l4_protocol() {
        let actions = vec![AceAction::accept()];
        assert!(Ace::new(vec![AceMatch::lport(8080)], actions.clone()).is_err());
        assert!(Ace::new(
            vec![AceMatch::protocol("tcp"), AceMatch::lport(8080)],
            actions.clone()
        )
        .is_ok());
        assert!(Ace::new(vec![AceMatch::protocol("icmp"), AceMatch::fport(53)], actions).is_err());
    }

    #[test]
    fn test_wire_limit_fields_ignored_when_disabled() {
        let fields = AceActionFields {
            limit: false,
            limit_rate: -5,
            limit_unit: "fortnight".to_string(),
            port_map: false,
            target_port: 99999,
            ..Default::default()
        };
        let action = AceAction::try_from(fields).unwrap();
        assert_eq!(action, AceAction::accept());
    }

    #[test]
    fn test_wire_limit_fields_checked_when_enabled() {
        let fields = AceActionFields {
            limit: true,
            limit_rate: 10,
            limit_unit: "m".to_string(),
            limit_burst: 20,
            ..Default::default()
        };
        let action = AceAction::try_from(fields.clone()).unwrap();
        assert_eq!(
            action.limit,
            Some(RateLimit {
                rate: 10,
                unit: LimitUnit::Minute,
                burst: 20
            })
        );

        let bad_unit = AceActionFields {
            limit_unit: "d".to_string(),
            ..fields
        };
        assert!(AceAction::try_from(bad_unit).is_err());
    }

    #[test]
    fn test_port_map_action() {
        let fields = AceActionFields {
            port_map: true,
            target_port: 8080,
            ..Default::default()
        };
        assert_eq!(AceAction::try_from(fields).unwrap().port_map, Some(8080));

        let on_drop = AceActionFields {
            drop: true,
            port_map: true,
            target_port: 8080,
            ..Default::default()
        };
        assert!(AceAction::try_from(on_drop).is_err());
    }

    #[test]
    fn test_ace_decodes_and_validates() {
        let json = r#"{
            "Matches": [{"Type": "protocol", "Value": "tcp"}, {"Type": "lport", "Value": "8080"}],
            "Actions": [{"PortMap": true, "TargetPort": 80}]
        }"#;
        let ace: Ace = serde_json::from_str(json).unwrap();
        assert_eq!(ace.actions()[0].port_map, Some(80));
        assert!(ace.has_match(AceMatchType::Lport));

        let empty = r#"{"Matches": [{"Type": "host", "Value": "example.net"}], "Actions": []}"#;
        assert!(serde_json::from_str::<Ace>(empty).is_err());

        let unknown_type = r#"{"Matches": [{"Type": "vlan", "Value": "5"}], "Actions": [{}]}"#;
        assert!(serde_json::from_str::<Ace>(unknown_type).is_err());
    }

    #[test]
    fn test_ace_serializes_flat_actions() {
        let ace = Ace::new(
            vec![AceMatch::host("example.net")],
            vec![AceAction::accept().with_limit(100, LimitUnit::Second, 50)],
        )
        .unwrap();
        let value = serde_json::to_value(&ace).unwrap();
        assert_eq!(value["Actions"][0]["Limit"], true);
        assert_eq!(value["Actions"][0]["LimitUnit"], "s");
        assert_eq!(value["Matches"][0]["Type"], "host");
    }
}
