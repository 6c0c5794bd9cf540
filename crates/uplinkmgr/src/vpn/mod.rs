//! StrongSwan VPN service configuration, status and metric records.

mod types;

pub use types::{
    LinkPktStats, NetLinkConfig, PktStats, ServiceVpnStatus, StrongSwanServiceConfig,
    VpnClientConfig, VpnConnMetrics, VpnConnStatus, VpnEndPoint, VpnEndPointMetrics,
    VpnLinkInfo, VpnLinkMetrics, VpnLinkStatus, VpnMetrics, VpnServiceConfig, VpnState,
    VpnTunnelConfig,
};
