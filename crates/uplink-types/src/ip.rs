//! IP address and prefix types.
//!
//! Addresses observed on uplink ports arrive as plain strings from the
//! status pipeline. [`IpAddress`] parses them once and answers the
//! link-local question the selector asks.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// An IP address as reported on a port.
///
/// Equality is family-sensitive: `10.0.0.1` and `::ffff:10.0.0.1` are
/// different addresses, matching what a port reports for each family.
/// Serialized in its textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IpAddress(IpAddr);

impl IpAddress {
    pub const fn is_ipv4(&self) -> bool {
        self.0.is_ipv4()
    }

    pub const fn is_ipv6(&self) -> bool {
        self.0.is_ipv6()
    }

    /// Returns true for link-local unicast addresses of either family:
    /// 169.254.0.0/16 and fe80::/10. An IPv4-mapped IPv6 address is judged
    /// by its IPv4 form.
    ///
    /// These are only reachable on the attached segment and are skipped by
    /// the "no link-local" selection policies.
    pub fn is_link_local_unicast(&self) -> bool {
        fn v4_link_local(v4: Ipv4Addr) -> bool {
            let o = v4.octets();
            o[0] == 169 && o[1] == 254
        }
        match self.0 {
            IpAddr::V4(v4) => v4_link_local(v4),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => v4_link_local(v4),
                None => (v6.segments()[0] & 0xffc0) == 0xfe80,
            },
        }
    }

    const fn bit_len(&self) -> u8 {
        if self.0.is_ipv4() {
            32
        } else {
            128
        }
    }

    fn to_bits(self) -> u128 {
        match self.0 {
            IpAddr::V4(v4) => u128::from(u32::from(v4)),
            IpAddr::V6(v6) => u128::from(v6),
        }
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for IpAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<IpAddr>()
            .map(IpAddress)
            .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
    }
}

impl From<IpAddr> for IpAddress {
    fn from(addr: IpAddr) -> Self {
        IpAddress(addr)
    }
}

impl From<IpAddress> for IpAddr {
    fn from(addr: IpAddress) -> Self {
        addr.0
    }
}

impl From<Ipv4Addr> for IpAddress {
    fn from(addr: Ipv4Addr) -> Self {
        IpAddress(IpAddr::V4(addr))
    }
}

impl From<Ipv6Addr> for IpAddress {
    fn from(addr: Ipv6Addr) -> Self {
        IpAddress(IpAddr::V6(addr))
    }
}

/// An IP prefix in CIDR notation (e.g. `192.168.1.0/24`).
///
/// Serialized as its string form so subnets in snapshots read the way
/// operators write them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpPrefix {
    address: IpAddress,
    prefix_len: u8,
}

impl IpPrefix {
    /// The address is kept as given (host bits are not cleared) so that an
    /// interface address such as `192.168.1.44/24` round-trips unchanged.
    pub fn new(address: IpAddress, prefix_len: u8) -> Result<Self, ParseError> {
        if prefix_len > address.bit_len() {
            return Err(ParseError::InvalidIpPrefix(format!("{}/{}", address, prefix_len)));
        }
        Ok(IpPrefix {
            address,
            prefix_len,
        })
    }

    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub const fn is_ipv4(&self) -> bool {
        self.address.is_ipv4()
    }

    pub const fn is_ipv6(&self) -> bool {
        self.address.is_ipv6()
    }

    fn mask(&self) -> u128 {
        let width = u32::from(self.address.bit_len());
        let len = u32::from(self.prefix_len);
        if len == 0 {
            return 0;
        }
        let all = if width == 128 {
            u128::MAX
        } else {
            (1u128 << width) - 1
        };
        all & !((1u128 << (width - len)) - 1)
    }

    /// Returns true if `addr` is of the same family and inside this prefix.
    pub fn contains(&self, addr: &IpAddress) -> bool {
        if addr.is_ipv4() != self.address.is_ipv4() {
            return false;
        }
        let mask = self.mask();
        (addr.to_bits() & mask) == (self.address.to_bits() & mask)
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for IpPrefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidIpPrefix(s.to_string());
        let (addr, len) = s.rsplit_once('/').ok_or_else(invalid)?;
        let len = len.parse::<u8>().map_err(|_| invalid())?;
        IpPrefix::new(addr.parse()?, len)
    }
}

impl TryFrom<String> for IpPrefix {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<IpPrefix> for String {
    fn from(prefix: IpPrefix) -> String {
        prefix.to_string()
    }
}
