use rollplan_core::cluster::SYSTEM_DEFAULT_REGISTRY;
use rollplan_core::{ClusterSpec, GenericMap, Runtime};

use crate::error::PlannerError;

/// Maps a runtime to the installer image name, without registry or tag.
pub trait ImageNaming: Send + Sync {
    fn installer_image(&self, runtime: Runtime) -> String;
}

/// `<prefix><runtime>`, e.g. `rancher/system-agent-installer-rke2`.
#[derive(Debug, Clone)]
pub struct StaticImageNaming {
    prefix: String,
}

impl StaticImageNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl ImageNaming for StaticImageNaming {
    fn installer_image(&self, runtime: Runtime) -> String {
        format!("{}{}", self.prefix, runtime.as_str())
    }
}

/// Private registry for installer images.
///
/// The global machine config wins over selector-scoped config for this one
/// key; otherwise the first selector entry that sets it is used.
pub fn system_default_registry(cluster: &ClusterSpec) -> Result<Option<String>, PlannerError> {
    if let Some(registry) = registry_value(&cluster.machine_global_config)? {
        return Ok(Some(registry));
    }
    for selector in &cluster.machine_selector_config {
        if let Some(registry) = registry_value(&selector.config)? {
            return Ok(Some(registry));
        }
    }
    Ok(None)
}

fn registry_value(config: &GenericMap) -> Result<Option<String>, PlannerError> {
    match config.get(SYSTEM_DEFAULT_REGISTRY) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim().trim_end_matches('/');
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(other) => Err(PlannerError::ImageResolution(format!(
            "{SYSTEM_DEFAULT_REGISTRY} must be a string, got {other}"
        ))),
    }
}

/// `<registry/>rancher/system-agent-installer-<runtime>:<version tag>`
pub fn resolve_installer_image(
    cluster: &ClusterSpec,
    naming: &dyn ImageNaming,
) -> Result<String, PlannerError> {
    let desired = cluster
        .desired_version()
        .map_err(PlannerError::DesiredVersion)?;
    let runtime = Runtime::from_version(&desired);
    let image = format!("{}:{}", naming.installer_image(runtime), desired.image_tag());

    Ok(match system_default_registry(cluster)? {
        Some(registry) => format!("{registry}/{image}"),
        None => image,
    })
}
