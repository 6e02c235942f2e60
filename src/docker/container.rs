// Container metadata captured from `docker inspect`

use crate::errors::{FixtureError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Label docker-compose puts on every container it creates
pub const SERVICE_LABEL: &str = "com.docker.compose.service";

/// Host side of a published port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    #[serde(rename = "HostIp", default)]
    pub host_ip: String,
    #[serde(rename = "HostPort", default)]
    pub host_port: String,
}

/// Snapshot of one container as of the last refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    name: String,
    ip_address: Option<String>,
    environment: Vec<String>,
    service_name: String,
    ports: BTreeMap<String, Vec<PortBinding>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectedContainer {
    name: String,
    state: InspectedState,
    network_settings: InspectedNetworkSettings,
    config: InspectedConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectedState {
    #[serde(default)]
    running: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectedNetworkSettings {
    #[serde(rename = "IPAddress", default)]
    ip_address: Option<String>,
    // Kept in document order so "first network" is well defined
    #[serde(default)]
    networks: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    ports: Option<BTreeMap<String, Option<Vec<PortBinding>>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectedConfig {
    #[serde(default)]
    env: Option<Vec<String>>,
    #[serde(default)]
    labels: Option<HashMap<String, String>>,
}

impl ContainerRecord {
    pub fn new(
        name: impl Into<String>,
        ip_address: Option<String>,
        environment: Vec<String>,
        service_name: impl Into<String>,
        ports: BTreeMap<String, Vec<PortBinding>>,
    ) -> Self {
        Self {
            name: name.into(),
            ip_address,
            environment,
            service_name: service_name.into(),
            ports,
        }
    }

    /// Build a record from `docker inspect <id>` output (a JSON array)
    pub fn from_inspect_json(json: &str) -> Result<Self> {
        let mut containers: Vec<InspectedContainer> = serde_json::from_str(json)?;

        if containers.is_empty() {
            return Err(FixtureError::MalformedOutput(
                "docker inspect returned an empty array".to_string(),
            ));
        }

        Self::from_inspected(containers.swap_remove(0))
    }

    fn from_inspected(container: InspectedContainer) -> Result<Self> {
        let name = container
            .name
            .strip_prefix('/')
            .unwrap_or(&container.name)
            .to_string();

        let ip_address = if container.state.running {
            Some(Self::resolve_ip(&name, &container.network_settings)?)
        } else {
            None
        };

        let ports = container
            .network_settings
            .ports
            .unwrap_or_default()
            .into_iter()
            .map(|(spec, bindings)| (spec, bindings.unwrap_or_default()))
            .collect();

        let service_name = container
            .config
            .labels
            .as_ref()
            .and_then(|labels| labels.get(SERVICE_LABEL))
            .cloned()
            .ok_or_else(|| {
                FixtureError::MalformedOutput(format!(
                    "container '{}' has no '{}' label",
                    name, SERVICE_LABEL
                ))
            })?;

        Ok(Self {
            name,
            ip_address,
            environment: container.config.env.unwrap_or_default(),
            service_name,
            ports,
        })
    }

    /// `NetworkSettings.IPAddress` first, then the first attached network.
    /// Newer engines leave the top-level field empty.
    fn resolve_ip(name: &str, settings: &InspectedNetworkSettings) -> Result<String> {
        if let Some(ip) = settings.ip_address.as_deref().filter(|ip| !ip.is_empty()) {
            return Ok(ip.to_string());
        }

        settings
            .networks
            .as_ref()
            .and_then(|networks| networks.values().next())
            .and_then(|network| network.get("IPAddress"))
            .and_then(|ip| ip.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                FixtureError::MalformedOutput(format!(
                    "running container '{}' reports no IP address and no networks",
                    name
                ))
            })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    /// Raw `KEY=value` entries, in inspect order
    pub fn environment(&self) -> &[String] {
        &self.environment
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn ports(&self) -> &BTreeMap<String, Vec<PortBinding>> {
        &self.ports
    }

    /// Value of the first `key=...` environment entry
    pub fn env_value(&self, key: &str) -> Result<&str> {
        self.environment
            .iter()
            .find_map(|entry| match entry.split_once('=') {
                Some((k, v)) if k == key => Some(v),
                _ => None,
            })
            .ok_or_else(|| FixtureError::EnvKeyNotFound {
                key: key.to_string(),
                container: self.name.clone(),
            })
    }

    pub fn name_contains(&self, part: &str) -> bool {
        self.name.contains(part)
    }
}
