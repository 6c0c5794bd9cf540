//! Network primitives shared by the uplink manager crates.
//!
//! - [`IpAddress`]: IPv4 or IPv6 address with link-local classification
//! - [`IpPrefix`]: CIDR prefix with containment checks
//! - [`MacAddress`]: 48-bit Ethernet address used for application vifs

mod ip;
mod mac;

pub use ip::{IpAddress, IpPrefix};
pub use mac::MacAddress;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid IP prefix format: {0}")]
    InvalidIpPrefix(String),
}
