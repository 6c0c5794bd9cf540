//! Deterministic selection of management ports and local addresses.
//!
//! Selection is split into an eligibility filter, a free-first ordering and
//! an index with wraparound. Every function is pure over a snapshot, so
//! repeated calls with an incrementing rotation or pick index round-robin
//! across uplinks without the caller keeping state.

use tracing::{debug, trace};
use uplink_types::IpAddress;

use crate::error::{UplinkError, UplinkResult};
use crate::port::classifier::resolve_adapter_name;
use crate::port::{DeviceNetworkStatus, NetworkPortStatus};

/// Cost class restriction for management port listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostFilter {
    #[default]
    Any,
    FreeOnly,
    NonFreeOnly,
}

impl CostFilter {
    pub const fn admits(&self, free: bool) -> bool {
        match self {
            CostFilter::Any => true,
            CostFilter::FreeOnly => free,
            CostFilter::NonFreeOnly => !free,
        }
    }
}

/// Address eligibility for [`select_address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressFilter {
    /// Only addresses of free ports.
    pub free_only: bool,
    pub include_link_local: bool,
}

impl AddressFilter {
    pub const ANY: Self = AddressFilter {
        free_only: false,
        include_link_local: true,
    };
    pub const ANY_NO_LINK_LOCAL: Self = AddressFilter {
        free_only: false,
        include_link_local: false,
    };
    pub const FREE_NO_LINK_LOCAL: Self = AddressFilter {
        free_only: true,
        include_link_local: false,
    };

    fn admits(&self, addr: &IpAddress) -> bool {
        self.include_link_local || !addr.is_link_local_unicast()
    }
}

/// Rotates left by `amount` modulo the length. Empty input stays empty.
pub fn rotate<T: Clone>(items: &[T], amount: usize) -> Vec<T> {
    if items.is_empty() {
        return Vec::new();
    }
    let amount = amount % items.len();
    items[amount..]
        .iter()
        .chain(&items[..amount])
        .cloned()
        .collect()
}

/// Interface names of management ports passing `filter`, in status order
/// rotated left by `rotation`.
pub fn list_mgmt_ports(
    status: &DeviceNetworkStatus,
    rotation: usize,
    filter: CostFilter,
) -> Vec<String> {
    let ports: Vec<String> = status
        .mgmt_ports()
        .filter(|port| filter.admits(port.free))
        .map(|port| port.if_name.clone())
        .collect();
    rotate(&ports, rotation)
}

pub fn mgmt_ports_any(status: &DeviceNetworkStatus, rotation: usize) -> Vec<String> {
    list_mgmt_ports(status, rotation, CostFilter::Any)
}

pub fn mgmt_ports_free(status: &DeviceNetworkStatus, rotation: usize) -> Vec<String> {
    list_mgmt_ports(status, rotation, CostFilter::FreeOnly)
}

pub fn mgmt_ports_non_free(status: &DeviceNetworkStatus, rotation: usize) -> Vec<String> {
    list_mgmt_ports(status, rotation, CostFilter::NonFreeOnly)
}

/// Management ports eligible for address selection, optionally restricted to
/// the port `port` resolves to.
fn candidate_ports<'a>(
    status: &'a DeviceNetworkStatus,
    port: &str,
    free_only: bool,
) -> impl Iterator<Item = &'a NetworkPortStatus> + 'a {
    let if_name = if port.is_empty() {
        None
    } else {
        Some(resolve_adapter_name(status, port).into_if_name())
    };
    status.mgmt_ports().filter(move |p| {
        (!free_only || p.free) && if_name.as_ref().map_or(true, |name| p.if_name == *name)
    })
}

/// Addresses eligible under `filter`: those of free ports first, then those
/// of non-free ports, each group in status order.
///
/// `port` restricts the set to one port by logical or interface name; an
/// empty string means every management port.
pub fn eligible_addresses(
    status: &DeviceNetworkStatus,
    port: &str,
    filter: AddressFilter,
) -> UplinkResult<Vec<IpAddress>> {
    let (free, non_free): (Vec<&NetworkPortStatus>, Vec<&NetworkPortStatus>) =
        candidate_ports(status, port, filter.free_only).partition(|p| p.free);

    let addrs: Vec<IpAddress> = free
        .into_iter()
        .chain(non_free)
        .flat_map(|p| p.addrs().copied())
        .filter(|addr| filter.admits(addr))
        .collect();

    if addrs.is_empty() {
        debug!(port, ?filter, "No eligible address");
        return Err(UplinkError::no_address(describe(port, filter)));
    }
    trace!(port, count = addrs.len(), "Eligible addresses");
    Ok(addrs)
}

fn describe(port: &str, filter: AddressFilter) -> String {
    let cost = if filter.free_only { "free" } else { "any" };
    let link_local = if filter.include_link_local {
        "including link-local"
    } else {
        "excluding link-local"
    };
    if port.is_empty() {
        format!("{} management ports, {}", cost, link_local)
    } else {
        format!("{} management port {}, {}", cost, port, link_local)
    }
}

/// Picks `addresses[pick mod len]` from the eligible set.
pub fn select_address(
    status: &DeviceNetworkStatus,
    pick: usize,
    port: &str,
    filter: AddressFilter,
) -> UplinkResult<IpAddress> {
    let addrs = eligible_addresses(status, port, filter)?;
    let addr = addrs[pick % addrs.len()];
    trace!(pick, %addr, "Selected local address");
    Ok(addr)
}

/// Interface name of the management port that owns `addr`.
pub fn reverse_lookup_port<'a>(status: &'a DeviceNetworkStatus, addr: &IpAddress) -> Option<&'a str> {
    status
        .mgmt_ports()
        .find(|port| port.has_addr(addr))
        .map(|port| port.if_name.as_str())
}

pub fn local_addr_any(
    status: &DeviceNetworkStatus,
    pick: usize,
    port: &str,
) -> UplinkResult<IpAddress> {
    select_address(status, pick, port, AddressFilter::ANY)
}

pub fn local_addr_any_no_link_local(
    status: &DeviceNetworkStatus,
    pick: usize,
    port: &str,
) -> UplinkResult<IpAddress> {
    select_address(status, pick, port, AddressFilter::ANY_NO_LINK_LOCAL)
}

pub fn local_addr_free_no_link_local(
    status: &DeviceNetworkStatus,
    pick: usize,
    port: &str,
) -> UplinkResult<IpAddress> {
    select_address(status, pick, port, AddressFilter::FREE_NO_LINK_LOCAL)
}

fn count(status: &DeviceNetworkStatus, port: &str, filter: AddressFilter) -> usize {
    eligible_addresses(status, port, filter).map_or(0, |addrs| addrs.len())
}

pub fn count_local_addr_any_no_link_local(status: &DeviceNetworkStatus) -> usize {
    count(status, "", AddressFilter::ANY_NO_LINK_LOCAL)
}

pub fn count_local_addr_any_no_link_local_on(status: &DeviceNetworkStatus, port: &str) -> usize {
    count(status, port, AddressFilter::ANY_NO_LINK_LOCAL)
}

pub fn count_local_addr_free_no_link_local(status: &DeviceNetworkStatus) -> usize {
    count(status, "", AddressFilter::FREE_NO_LINK_LOCAL)
}

/// Free management ports with at least one non-link-local address. Each
/// returned record keeps only those addresses.
pub fn mgmt_ports_free_no_link_local(status: &DeviceNetworkStatus) -> Vec<NetworkPortStatus> {
    candidate_ports(status, "", true)
        .filter_map(|port| {
            let addr_info_list: Vec<_> = port
                .addr_info_list
                .iter()
                .filter(|info| !info.addr.is_link_local_unicast())
                .cloned()
                .collect();
            if addr_info_list.is_empty() {
                return None;
            }
            Some(NetworkPortStatus {
                addr_info_list,
                ..port.clone()
            })
        })
        .collect()
}
