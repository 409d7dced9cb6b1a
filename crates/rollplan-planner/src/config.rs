use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
pub const CURRENT_VERSION: u32 = 1;

pub const DEFAULT_INSTALLER_IMAGE_PREFIX: &str = "rancher/system-agent-installer-";

/// Settings passed explicitly into every planning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    /// Installer image name before the runtime suffix.
    #[serde(default = "default_installer_image_prefix")]
    pub installer_image_prefix: String,
    /// How many minor releases the desired version may run ahead of the
    /// fleet floor.
    #[serde(default = "default_max_minor_skew")]
    pub max_minor_skew: u64,
    /// Servers upgraded at once. `None` = unlimited.
    #[serde(default = "default_control_plane_concurrency")]
    pub control_plane_concurrency: Option<usize>,
    /// Agents upgraded at once. `None` = unlimited.
    #[serde(default)]
    pub worker_concurrency: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotStorageConfig>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            installer_image_prefix: default_installer_image_prefix(),
            max_minor_skew: default_max_minor_skew(),
            control_plane_concurrency: default_control_plane_concurrency(),
            worker_concurrency: None,
            snapshot: None,
        }
    }
}

fn default_installer_image_prefix() -> String {
    DEFAULT_INSTALLER_IMAGE_PREFIX.to_string()
}

fn default_max_minor_skew() -> u64 {
    1
}

fn default_control_plane_concurrency() -> Option<usize> {
    Some(1)
}

/// Remote target for pre-upgrade etcd snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStorageConfig {
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Path of a CA bundle on the machine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_ca: Option<String>,
    #[serde(default)]
    pub skip_ssl_verify: bool,
}

/// Read a config file, migrating older shapes. A missing file yields the
/// defaults.
pub fn load_config(path: &Path) -> Result<PlannerConfig, PlannerError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(PlannerConfig::default());
        }
        Err(e) => return Err(e.into()),
    };
    parse_config(&contents)
}

/// Parse config JSON, migrating older shapes.
pub fn parse_config(contents: &str) -> Result<PlannerConfig, PlannerError> {
    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    let on_disk_version = u32::try_from(on_disk_version).map_err(|_| {
        PlannerError::Config(format!(
            "config_version {on_disk_version} is newer than this build supports ({CURRENT_VERSION})"
        ))
    })?;

    let migrated = migrate(json, on_disk_version)?;
    Ok(serde_json::from_value(migrated)?)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
fn migrate(
    mut json: serde_json::Value,
    from_version: u32,
) -> Result<serde_json::Value, PlannerError> {
    if from_version > CURRENT_VERSION {
        return Err(PlannerError::Config(format!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION})"
        )));
    }

    // v0 → v1: system_agent_image renamed to installer_image_prefix
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| PlannerError::Config("config is not a JSON object".into()))?;
        if let Some(image) = obj.remove("system_agent_image") {
            obj.entry("installer_image_prefix").or_insert(image);
        }
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(CURRENT_VERSION.into()),
        );
        tracing::info!("migrated config v0 → v1 (renamed system_agent_image)");
    }

    Ok(json)
}
