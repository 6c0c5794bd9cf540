//! Publication of the current device network status.
//!
//! The connectivity manager owns one [`StatusPublisher`] and replaces the
//! whole snapshot on every update. Readers hold an `Arc` to one immutable
//! snapshot, so a selection never sees a mix of old and new port records.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::UplinkResult;
use crate::port::DeviceNetworkStatus;
use crate::portconfig::DevicePortConfig;

pub struct StatusPublisher {
    /// Bumped on every accepted publish.
    generation: watch::Sender<u64>,
    snapshot: watch::Sender<Arc<DeviceNetworkStatus>>,
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new(DeviceNetworkStatus::default())
    }
}

impl StatusPublisher {
    pub fn new(initial: DeviceNetworkStatus) -> Self {
        let (generation, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(initial));
        Self {
            generation,
            snapshot,
        }
    }

    /// Validates and publishes a new snapshot. A rejected snapshot leaves
    /// the current one in place.
    pub fn publish(&self, status: DeviceNetworkStatus) -> UplinkResult<Arc<DeviceNetworkStatus>> {
        if let Err(e) = status.validate() {
            warn!(error = %e, "Rejected device network status");
            return Err(e);
        }
        let status = Arc::new(status);
        // `send_replace` updates even with zero receivers.
        self.snapshot.send_replace(Arc::clone(&status));
        self.generation.send_modify(|g| *g = g.wrapping_add(1));
        info!(
            version = %status.version,
            ports = status.ports.len(),
            generation = *self.generation.borrow(),
            "Published device network status"
        );
        Ok(status)
    }

    /// Adopts a port configuration whole and publishes its status.
    pub fn adopt(&self, config: &DevicePortConfig) -> UplinkResult<Arc<DeviceNetworkStatus>> {
        config.validate()?;
        info!(key = %config.key, "Adopting port configuration");
        self.publish(config.to_status())
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<DeviceNetworkStatus> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DeviceNetworkStatus>> {
        self.snapshot.subscribe()
    }

    /// Number of snapshots published since creation.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{DevicePortConfigVersion, NetworkPortStatus};
    use crate::portconfig::NetworkPortConfig;
    use pretty_assertions::assert_eq;

    fn status(if_names: &[&str]) -> DeviceNetworkStatus {
        DeviceNetworkStatus::new(
            DevicePortConfigVersion::IS_MGMT,
            if_names.iter().map(|n| NetworkPortStatus::new(*n)).collect(),
        )
    }

    #[test]
    fn test_snapshot_is_stable_across_publish() {
        let publisher = StatusPublisher::new(status(&["eth0"]));
        let before = publisher.snapshot();

        publisher.publish(status(&["eth0", "eth1"])).unwrap();
        assert_eq!(before.ports.len(), 1);
        assert_eq!(publisher.snapshot().ports.len(), 2);
        assert_eq!(publisher.generation(), 1);
    }

    #[test]
    fn test_invalid_snapshot_rejected() {
        let publisher = StatusPublisher::new(status(&["eth0"]));
        assert!(publisher.publish(status(&["eth1", "eth1"])).is_err());
        assert_eq!(publisher.snapshot().ports[0].if_name, "eth0");
        assert_eq!(publisher.generation(), 0);
    }

    #[test]
    fn test_adopt_port_config() {
        let publisher = StatusPublisher::default();
        let config = DevicePortConfig {
            version: DevicePortConfigVersion::IS_MGMT,
            key: "zedagent".to_string(),
            ports: vec![NetworkPortConfig {
                if_name: "eth0".to_string(),
                is_mgmt: true,
                ..Default::default()
            }],
            ..Default::default()
        };
        let adopted = publisher.adopt(&config).unwrap();
        assert_eq!(adopted.ports[0].if_name, "eth0");
        assert!(adopted.ports[0].is_mgmt);
    }

    #[tokio::test]
    async fn test_subscriber_sees_update() {
        let publisher = StatusPublisher::default();
        let mut rx = publisher.subscribe();

        publisher.publish(status(&["wwan0"])).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().ports[0].if_name, "wwan0");
    }
}
