//! Registry of network objects, network services and admitted applications.
//!
//! Attachments reference networks by UUID. The registry checks those
//! references when an application is admitted and keeps the
//! `missing_network` flags current as networks come and go.

use std::collections::HashMap;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{UplinkError, UplinkResult};
use crate::vnet::{
    AppNetworkConfig, AppNetworkStatus, NetworkObjectConfig, NetworkObjectStatus,
    NetworkServiceConfig, NetworkServiceStatus,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub networks_added: u64,
    pub services_added: u64,
    pub apps_admitted: u64,
    pub rejected: u64,
}

#[derive(Debug, Default)]
pub struct NetworkRegistry {
    networks: HashMap<Uuid, NetworkObjectStatus>,
    services: HashMap<Uuid, NetworkServiceStatus>,
    apps: HashMap<Uuid, AppNetworkStatus>,
    app_configs: HashMap<Uuid, AppNetworkConfig>,
    next_app_num: u32,
    stats: RegistryStats,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats
    }

    pub fn network(&self, uuid: &Uuid) -> Option<&NetworkObjectStatus> {
        self.networks.get(uuid)
    }

    pub fn service(&self, uuid: &Uuid) -> Option<&NetworkServiceStatus> {
        self.services.get(uuid)
    }

    pub fn app(&self, uuid: &Uuid) -> Option<&AppNetworkStatus> {
        self.apps.get(uuid)
    }

    pub fn networks(&self) -> impl Iterator<Item = &NetworkObjectStatus> + '_ {
        self.networks.values()
    }

    pub fn apps(&self) -> impl Iterator<Item = &AppNetworkStatus> + '_ {
        self.apps.values()
    }

    /// Admitted applications with an attachment on `network`.
    pub fn apps_using(&self, network: &Uuid) -> Vec<Uuid> {
        let mut uuids: Vec<Uuid> = self
            .app_configs
            .iter()
            .filter(|(_, config)| config.network_uuids().any(|n| n == *network))
            .map(|(uuid, _)| *uuid)
            .collect();
        uuids.sort();
        uuids
    }

    fn reject(&mut self, error: UplinkError) -> UplinkError {
        self.stats.rejected = self.stats.rejected.saturating_add(1);
        warn!(error = %error, "Rejected network registry update");
        error
    }

    /// Adds or replaces a network object.
    pub fn add_network(&mut self, config: NetworkObjectConfig) -> UplinkResult<()> {
        if let Err(e) = config.validate() {
            return Err(self.reject(e));
        }
        let uuid = config.uuid;
        if self.services.contains_key(&uuid) {
            let error = UplinkError::validation(
                format!("network {}", uuid),
                "UUID already registered as a network service",
            );
            return Err(self.reject(error));
        }

        match self.networks.get_mut(&uuid) {
            Some(status) => {
                status.config = config;
                status.pending_modify = true;
                debug!(network = %uuid, "Modified network object");
            }
            None => {
                self.networks
                    .insert(uuid, NetworkObjectStatus::from_config(config));
                self.stats.networks_added = self.stats.networks_added.saturating_add(1);
                info!(network = %uuid, "Added network object");
            }
        }
        self.refresh_missing();
        Ok(())
    }

    /// Removes a network object no admitted application references.
    pub fn remove_network(&mut self, uuid: &Uuid) -> UplinkResult<NetworkObjectStatus> {
        let users = self.apps_using(uuid);
        if let Some(app) = users.first() {
            let error = UplinkError::validation(
                format!("network {}", uuid),
                format!("still referenced by app {}", app),
            );
            return Err(self.reject(error));
        }

        let status = self
            .networks
            .remove(uuid)
            .ok_or_else(|| UplinkError::not_found("network", uuid.to_string()))?;
        info!(network = %uuid, "Removed network object");
        self.refresh_missing();
        Ok(status)
    }

    /// Adds or replaces a network service.
    pub fn add_service(&mut self, config: NetworkServiceConfig) -> UplinkResult<()> {
        if let Err(e) = config.validate() {
            return Err(self.reject(e));
        }
        let uuid = config.uuid;
        if self.networks.contains_key(&uuid) {
            let error = UplinkError::validation(
                format!("network service {}", uuid),
                "UUID already registered as a network object",
            );
            return Err(self.reject(error));
        }

        let mut status = NetworkServiceStatus::from_config(&config);
        if let Some(previous) = self.services.get(&uuid) {
            status.pending_add = false;
            status.pending_modify = true;
            status.activated = previous.activated;
        } else {
            self.stats.services_added = self.stats.services_added.saturating_add(1);
        }
        status.missing_network =
            !config.app_link.is_nil() && !self.networks.contains_key(&config.app_link);
        info!(service = %uuid, service_type = ?config.service_type, "Added network service");
        self.services.insert(uuid, status);
        Ok(())
    }

    pub fn remove_service(&mut self, uuid: &Uuid) -> UplinkResult<NetworkServiceStatus> {
        let status = self
            .services
            .remove(uuid)
            .ok_or_else(|| UplinkError::not_found("network service", uuid.to_string()))?;
        info!(service = %uuid, "Removed network service");
        Ok(status)
    }

    /// Admits an application's network attachments.
    ///
    /// Attachments must name a network object: a nil UUID or a service UUID
    /// is rejected. A UUID the registry does not know yet is admitted with
    /// `missing_network` set.
    pub fn admit_app(&mut self, config: AppNetworkConfig) -> UplinkResult<&AppNetworkStatus> {
        if let Err(e) = config.validate() {
            return Err(self.reject(e));
        }
        let app_uuid = config.uuid_and_version.uuid;
        if app_uuid.is_nil() {
            return Err(self.reject(UplinkError::validation("app", "nil UUID")));
        }

        for network in config.network_uuids() {
            if network.is_nil() {
                let error = UplinkError::validation(
                    format!("app {}", app_uuid),
                    "attachment without a network UUID",
                );
                return Err(self.reject(error));
            }
            if self.services.contains_key(&network) {
                let error = UplinkError::validation(
                    format!("app {}", app_uuid),
                    format!("{} is a network service, not a network", network),
                );
                return Err(self.reject(error));
            }
        }

        let mut status = match self.apps.get(&app_uuid) {
            Some(previous) => {
                let mut status = AppNetworkStatus::from_config(&config, previous.app_num);
                status.pending_add = false;
                status.pending_modify = true;
                status.activated = previous.activated;
                status
            }
            None => {
                let app_num = self.next_app_num;
                self.next_app_num = self.next_app_num.saturating_add(1);
                self.stats.apps_admitted = self.stats.apps_admitted.saturating_add(1);
                AppNetworkStatus::from_config(&config, app_num)
            }
        };
        status.missing_network = config
            .network_uuids()
            .any(|n| !self.networks.contains_key(&n));
        if status.missing_network {
            debug!(app = %app_uuid, "App references a network that is not known yet");
        }
        info!(app = %app_uuid, app_num = status.app_num, "Admitted app network config");

        self.app_configs.insert(app_uuid, config);
        let slot = self.apps.entry(app_uuid).or_default();
        *slot = status;
        Ok(slot)
    }

    pub fn remove_app(&mut self, uuid: &Uuid) -> UplinkResult<AppNetworkStatus> {
        self.app_configs.remove(uuid);
        let status = self
            .apps
            .remove(uuid)
            .ok_or_else(|| UplinkError::not_found("app", uuid.to_string()))?;
        info!(app = %uuid, "Removed app network config");
        Ok(status)
    }

    fn refresh_missing(&mut self) {
        for (uuid, status) in self.apps.iter_mut() {
            if let Some(config) = self.app_configs.get(uuid) {
                status.missing_network = config
                    .network_uuids()
                    .any(|n| !self.networks.contains_key(&n));
            }
        }
        for status in self.services.values_mut() {
            status.missing_network =
                !status.app_link.is_nil() && !self.networks.contains_key(&status.app_link);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vnet::{NetworkServiceType, UnderlayNetworkConfig, UuidAndVersion};
    use pretty_assertions::assert_eq;

    fn network() -> NetworkObjectConfig {
        NetworkObjectConfig {
            uuid: Uuid::new_v4(),
            ..Default::default()
        }
    }

    fn app_on(networks: &[Uuid]) -> AppNetworkConfig {
        AppNetworkConfig {
            uuid_and_version: UuidAndVersion {
                uuid: Uuid::new_v4(),
                version: "1".to_string(),
            },
            underlay_network_list: networks
                .iter()
                .enumerate()
                .map(|(i, n)| UnderlayNetworkConfig {
                    name: format!("ul{}", i),
                    network: *n,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn service(app_link: Uuid) -> NetworkServiceConfig {
        NetworkServiceConfig {
            uuid: Uuid::new_v4(),
            internal: false,
            display_name: String::new(),
            service_type: NetworkServiceType::Nat,
            activate: true,
            app_link,
            adapter: "uplink".to_string(),
            opaque_config: String::new(),
            lisp_config: Default::default(),
        }
    }

    #[test]
    fn test_admit_known_network() {
        let mut registry = NetworkRegistry::new();
        let net = network();
        let net_uuid = net.uuid;
        registry.add_network(net).unwrap();

        let status = registry.admit_app(app_on(&[net_uuid])).unwrap();
        assert!(!status.missing_network);
        assert_eq!(status.app_num, 0);
    }

    #[test]
    fn test_unknown_network_flags_missing_until_added() {
        let mut registry = NetworkRegistry::new();
        let net = network();
        let net_uuid = net.uuid;

        let config = app_on(&[net_uuid]);
        let app_uuid = config.uuid_and_version.uuid;
        assert!(registry.admit_app(config).unwrap().missing_network);

        registry.add_network(net).unwrap();
        assert!(!registry.app(&app_uuid).unwrap().missing_network);
    }

    #[test]
    fn test_nil_network_rejected() {
        let mut registry = NetworkRegistry::new();
        let err = registry.admit_app(app_on(&[Uuid::nil()])).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(registry.stats().rejected, 1);
    }

    #[test]
    fn test_service_uuid_rejected_as_network() {
        let mut registry = NetworkRegistry::new();
        let svc = service(Uuid::nil());
        let svc_uuid = svc.uuid;
        registry.add_service(svc).unwrap();

        let err = registry.admit_app(app_on(&[svc_uuid])).unwrap_err();
        assert!(err.to_string().contains("network service"));
    }

    #[test]
    fn test_remove_referenced_network_rejected() {
        let mut registry = NetworkRegistry::new();
        let net = network();
        let net_uuid = net.uuid;
        registry.add_network(net).unwrap();
        let config = app_on(&[net_uuid]);
        let app_uuid = config.uuid_and_version.uuid;
        registry.admit_app(config).unwrap();

        assert!(registry.remove_network(&net_uuid).is_err());
        assert_eq!(registry.apps_using(&net_uuid), vec![app_uuid]);

        registry.remove_app(&app_uuid).unwrap();
        assert!(registry.remove_network(&net_uuid).is_ok());
        assert!(registry.network(&net_uuid).is_none());
    }

    #[test]
    fn test_readmit_keeps_app_num() {
        let mut registry = NetworkRegistry::new();
        let first = app_on(&[]);
        registry.admit_app(app_on(&[])).unwrap();
        registry.admit_app(first.clone()).unwrap();

        let status = registry.admit_app(first).unwrap();
        assert_eq!(status.app_num, 1);
        assert!(status.pending_modify);
        assert!(!status.pending_add);
    }

    #[test]
    fn test_service_missing_network_tracks_app_link() {
        let mut registry = NetworkRegistry::new();
        let net = network();
        let net_uuid = net.uuid;
        let svc = service(net_uuid);
        let svc_uuid = svc.uuid;

        registry.add_service(svc).unwrap();
        assert!(registry.service(&svc_uuid).unwrap().missing_network);

        registry.add_network(net).unwrap();
        assert!(!registry.service(&svc_uuid).unwrap().missing_network);
    }

    #[test]
    fn test_network_uuid_clash_with_service() {
        let mut registry = NetworkRegistry::new();
        let svc = service(Uuid::nil());
        let clash = NetworkObjectConfig {
            uuid: svc.uuid,
            ..Default::default()
        };
        registry.add_service(svc).unwrap();
        assert!(registry.add_network(clash).is_err());
    }
}
