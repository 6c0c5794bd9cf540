//! Loading snapshot documents from disk.
//!
//! Snapshots are JSON documents with PascalCase field names, as produced by
//! the configuration pipeline. Every loader validates what it read and
//! rejects the document whole.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::{UplinkError, UplinkResult};
use crate::port::DeviceNetworkStatus;
use crate::portconfig::DevicePortConfigList;
use crate::vnet::AppNetworkConfig;

fn load_json<T: DeserializeOwned>(path: &Path, what: &str) -> UplinkResult<T> {
    let file = File::open(path).map_err(|source| UplinkError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| UplinkError::Json {
        what: format!("{} from {}", what, path.display()),
        source,
    })
}

/// Loads and validates a `DeviceNetworkStatus` document.
///
/// ```json
/// {
///   "Version": 1,
///   "Ports": [
///     {"IfName": "eth0", "IsMgmt": true, "Free": true,
///      "AddrInfoList": [{"Addr": "10.0.0.5"}]}
///   ]
/// }
/// ```
pub fn load_status(path: impl AsRef<Path>) -> UplinkResult<DeviceNetworkStatus> {
    let path = path.as_ref();
    let status: DeviceNetworkStatus = load_json(path, "device network status")?;
    if let Err(e) = status.validate() {
        warn!(path = %path.display(), error = %e, "Invalid device network status");
        return Err(e);
    }
    info!(
        path = %path.display(),
        version = %status.version,
        ports = status.ports.len(),
        "Loaded device network status"
    );
    Ok(status)
}

/// Loads and validates a `DevicePortConfigList` document.
pub fn load_port_config_list(path: impl AsRef<Path>) -> UplinkResult<DevicePortConfigList> {
    let path = path.as_ref();
    let list: DevicePortConfigList = load_json(path, "port config list")?;
    if let Err(e) = list.validate() {
        warn!(path = %path.display(), error = %e, "Invalid port config list");
        return Err(e);
    }
    info!(path = %path.display(), entries = list.len(), "Loaded port config list");
    Ok(list)
}

/// Loads an `AppNetworkConfig` stored as `<uuid>.json`. The file name must
/// match the UUID inside.
pub fn load_app_network_config(path: impl AsRef<Path>) -> UplinkResult<AppNetworkConfig> {
    let path = path.as_ref();
    let config: AppNetworkConfig = load_json(path, "app network config")?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    if !config.verify_filename(file_name) {
        return Err(UplinkError::validation(
            "app network config",
            format!("{} does not match UUID {}", file_name, config.key()),
        ));
    }
    config.validate()?;
    info!(app = %config.key(), "Loaded app network config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_status() {
        let file = write_temp(
            r#"{
  "Version": 1,
  "Ports": [
    {"IfName": "eth0", "IsMgmt": true, "Free": true, "AddrInfoList": [{"Addr": "10.0.0.5"}]},
    {"IfName": "eth1", "IsMgmt": true, "AddrInfoList": [{"Addr": "10.0.1.5"}]}
  ]
}"#,
        );
        let status = load_status(file.path()).unwrap();
        assert_eq!(status.ports.len(), 2);
        assert!(status.ports[0].free);
        assert!(!status.ports[1].free);
    }

    #[test]
    fn test_load_status_rejects_duplicates() {
        let file = write_temp(r#"{"Version": 1, "Ports": [{"IfName": "eth0"}, {"IfName": "eth0"}]}"#);
        let err = load_status(file.path()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_load_status_bad_address() {
        let file = write_temp(
            r#"{"Version": 1, "Ports": [{"IfName": "eth0", "AddrInfoList": [{"Addr": "10.0.0"}]}]}"#,
        );
        let err = load_status(file.path()).unwrap_err();
        assert!(matches!(err, UplinkError::Json { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_status("/nonexistent/status.json").unwrap_err();
        assert!(matches!(err, UplinkError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/status.json"));
    }

    #[test]
    fn test_load_port_config_list() {
        let file = write_temp(
            r#"{"PortConfigList": [
  {"Version": 1, "Key": "zedagent", "Ports": [{"IfName": "eth0", "IsMgmt": true, "Dhcp": 4}]},
  {"Version": 0, "Key": "lastresort", "Ports": [{"IfName": "eth0"}, {"IfName": "eth1"}]}
]}"#,
        );
        let list = load_port_config_list(file.path()).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.current().map(|c| c.key.as_str()), Some("zedagent"));
    }

    #[test]
    fn test_load_app_network_config_checks_file_name() {
        let uuid = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";
        let dir = tempfile::tempdir().unwrap();
        let body = format!(r#"{{"UUIDandVersion": {{"UUID": "{}", "Version": "1"}}}}"#, uuid);

        let good = dir.path().join(format!("{}.json", uuid));
        std::fs::write(&good, &body).unwrap();
        assert_eq!(load_app_network_config(&good).unwrap().key(), uuid);

        let bad = dir.path().join("app.json");
        std::fs::write(&bad, &body).unwrap();
        assert!(load_app_network_config(&bad).is_err());
    }
}
