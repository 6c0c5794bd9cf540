//! Uplink selection and port-status engine.
//!
//! Maintains the versioned view of a device's network ports and picks which
//! port and address carry management traffic. Also defines the model for
//! application overlay/underlay networks, network services and their ACLs.
//!
//! - [`port`]: port status model, classifier and selector
//! - [`portconfig`]: candidate port configurations and their rank
//! - [`vnet`]: network objects, services, app attachments and the registry
//! - [`acl`]: access control entries
//! - [`publisher`]: snapshot publication
//! - [`snapshot`]: loading snapshot documents
//!
//! # Example
//!
//! ```
//! use uplinkmgr::port::{
//!     mgmt_ports_any, select_address, AddrInfo, AddressFilter, DeviceNetworkStatus,
//!     DevicePortConfigVersion, NetworkPortStatus,
//! };
//!
//! let mut eth0 = NetworkPortStatus::new("eth0");
//! eth0.is_mgmt = true;
//! eth0.free = true;
//! eth0.addr_info_list.push(AddrInfo::new("10.0.0.5".parse().unwrap()));
//! let mut eth1 = NetworkPortStatus::new("eth1");
//! eth1.is_mgmt = true;
//! eth1.addr_info_list.push(AddrInfo::new("10.0.1.5".parse().unwrap()));
//!
//! let status = DeviceNetworkStatus::new(DevicePortConfigVersion::IS_MGMT, vec![eth0, eth1]);
//! assert_eq!(mgmt_ports_any(&status, 1), vec!["eth1", "eth0"]);
//! let addr = select_address(&status, 0, "", AddressFilter::ANY_NO_LINK_LOCAL).unwrap();
//! assert_eq!(addr.to_string(), "10.0.0.5");
//! ```

pub mod acl;
pub mod error;
pub mod lisp;
pub mod metrics;
pub mod port;
pub mod portconfig;
pub mod publisher;
pub mod snapshot;
mod timestamp;
pub mod vnet;
pub mod vpn;

pub use error::{UplinkError, UplinkResult};
pub use port::{DeviceNetworkStatus, DevicePortConfigVersion, NetworkPortStatus};
pub use portconfig::{DevicePortConfig, DevicePortConfigList};
pub use publisher::StatusPublisher;
