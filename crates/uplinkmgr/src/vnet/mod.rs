//! Virtual network model: network objects, network services and the
//! overlay/underlay attachments applications use to reach them.

mod app;
mod network;
mod registry;
mod service;

pub use app::{
    AdditionalInfoApp, AdditionalInfoDevice, AppNetworkConfig, AppNetworkStatus,
    OverlayNetworkConfig, OverlayNetworkStatus, UnderlayNetworkConfig, UnderlayNetworkStatus,
    UuidAndVersion, VifInfo,
};
pub use network::{
    DhcpType, DnsNameToIp, IpRange, NetworkObjectConfig, NetworkObjectStatus, NetworkType,
};
pub use registry::{NetworkRegistry, RegistryStats};
pub use service::{
    NetworkServiceConfig, NetworkServiceMetrics, NetworkServiceStatus, NetworkServiceType,
};
