use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::version::DistroVersion;

/// Free-form configuration map, keys sorted for reproducible rendering.
pub type GenericMap = serde_json::Map<String, serde_json::Value>;

/// Config key naming the private registry prefix for installer images.
pub const SYSTEM_DEFAULT_REGISTRY: &str = "system-default-registry";

/// Desired state of one cluster. Owned by the external resource store and
/// read once per planning pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub name: String,
    /// e.g. `v1.25.7+rke2r1`
    pub kubernetes_version: String,
    /// Applies to every machine.
    #[serde(default)]
    pub machine_global_config: GenericMap,
    /// Overlays applied, in order, to machines matching their selector.
    #[serde(default)]
    pub machine_selector_config: Vec<SelectorConfig>,
    #[serde(default)]
    pub etcd: EtcdSpec,
}

impl ClusterSpec {
    pub fn new(name: impl Into<String>, kubernetes_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kubernetes_version: kubernetes_version.into(),
            machine_global_config: GenericMap::new(),
            machine_selector_config: Vec::new(),
            etcd: EtcdSpec::default(),
        }
    }

    pub fn desired_version(&self) -> Result<DistroVersion, CoreError> {
        DistroVersion::parse(&self.kubernetes_version)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// `None` matches every machine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_label_selector: Option<LabelSelector>,
    #[serde(default)]
    pub config: GenericMap,
}

impl SelectorConfig {
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.machine_label_selector
            .as_ref()
            .is_none_or(|selector| selector.matches(labels))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelSelector {
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
}

impl LabelSelector {
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.match_labels
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EtcdSpec {
    /// Take an etcd snapshot on each etcd machine before upgrading it.
    #[serde(default)]
    pub snapshot_before_upgrade: bool,
}
