//! Port status model, classifier and selector.

pub mod classifier;
pub mod selector;
mod types;

pub use classifier::{
    is_free_mgmt_port, is_mgmt_port, is_port, lookup_mgmt_port, report_ports,
    resolve_adapter_name, resolve_adapter_name_strict, AdapterResolution,
};
pub use selector::{
    count_local_addr_any_no_link_local, count_local_addr_any_no_link_local_on,
    count_local_addr_free_no_link_local, eligible_addresses, list_mgmt_ports, local_addr_any,
    local_addr_any_no_link_local, local_addr_free_no_link_local, mgmt_ports_any,
    mgmt_ports_free, mgmt_ports_free_no_link_local, mgmt_ports_non_free, reverse_lookup_port,
    rotate, select_address, AddressFilter, CostFilter,
};
pub(crate) use types::check_unique_names;
pub use types::{
    AddrInfo, DeviceNetworkStatus, DevicePortConfigVersion, GeoInfo, NetworkPortStatus,
    NetworkProxyType, ProxyConfig, ProxyEntry,
};
