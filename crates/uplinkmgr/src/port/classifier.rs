//! Port classification predicates and adapter name resolution.
//!
//! Names are matched case-sensitively against the logical name and the
//! interface name of each port, first match wins.

use tracing::debug;

use crate::error::{UplinkError, UplinkResult};
use crate::port::{DeviceNetworkStatus, NetworkPortStatus};

/// Returns true if `name` is the logical or interface name of a port.
pub fn is_port(status: &DeviceNetworkStatus, name: &str) -> bool {
    status.ports.iter().any(|port| port.matches_name(name))
}

/// Returns true if `name` names a management port.
pub fn is_mgmt_port(status: &DeviceNetworkStatus, name: &str) -> bool {
    lookup_mgmt_port(status, name).is_some()
}

/// Returns true if `name` names a free management port. The first matching
/// management port decides.
pub fn is_free_mgmt_port(status: &DeviceNetworkStatus, name: &str) -> bool {
    lookup_mgmt_port(status, name).is_some_and(|port| port.free)
}

/// Finds the first management port named `name`.
pub fn lookup_mgmt_port<'a>(
    status: &'a DeviceNetworkStatus,
    name: &str,
) -> Option<&'a NetworkPortStatus> {
    status
        .ports
        .iter()
        .find(|port| port.matches_name(name) && status.is_mgmt_eligible(port))
}

/// How an adapter name was resolved to an interface name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterResolution {
    /// Matched a port's logical name.
    Logical(String),
    /// Matched a port's interface name.
    Interface(String),
    /// Matched nothing; the input is passed through unchanged.
    Passthrough(String),
}

impl AdapterResolution {
    /// The resolved interface name, or the unchanged input on passthrough.
    pub fn if_name(&self) -> &str {
        match self {
            AdapterResolution::Logical(name)
            | AdapterResolution::Interface(name)
            | AdapterResolution::Passthrough(name) => name,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, AdapterResolution::Passthrough(_))
    }

    pub fn into_if_name(self) -> String {
        match self {
            AdapterResolution::Logical(name)
            | AdapterResolution::Interface(name)
            | AdapterResolution::Passthrough(name) => name,
        }
    }
}

/// Resolves an operator-facing adapter name to a kernel interface name.
///
/// Logical names are tried across all ports before interface names. An
/// unmatched name is returned as [`AdapterResolution::Passthrough`];
/// callers that use [`AdapterResolution::if_name`] must not assume it names
/// an existing port.
pub fn resolve_adapter_name(status: &DeviceNetworkStatus, adapter: &str) -> AdapterResolution {
    if adapter.is_empty() {
        return AdapterResolution::Passthrough(String::new());
    }
    if let Some(port) = status.ports.iter().find(|p| p.name == adapter) {
        debug!(adapter, if_name = %port.if_name, "Resolved logical adapter name");
        return AdapterResolution::Logical(port.if_name.clone());
    }
    if status.ports.iter().any(|p| p.if_name == adapter) {
        debug!(adapter, "Adapter name is an interface name");
        return AdapterResolution::Interface(adapter.to_string());
    }
    debug!(adapter, "No port matches adapter name, passing through");
    AdapterResolution::Passthrough(adapter.to_string())
}

/// Like [`resolve_adapter_name`] but fails on passthrough.
pub fn resolve_adapter_name_strict(
    status: &DeviceNetworkStatus,
    adapter: &str,
) -> UplinkResult<String> {
    match resolve_adapter_name(status, adapter) {
        AdapterResolution::Passthrough(name) => Err(UplinkError::not_found("adapter", name)),
        resolved => Ok(resolved.into_if_name()),
    }
}

/// Port names to report in info and metrics, in status order: the logical
/// name when set, the interface name otherwise.
pub fn report_ports(status: &DeviceNetworkStatus) -> Vec<String> {
    status
        .ports
        .iter()
        .map(|port| port.display_name().to_string())
        .collect()
}
