use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::labels;

/// Operating system reported for a machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    Linux,
    Windows,
    #[default]
    #[serde(other)]
    Unknown,
}

impl OperatingSystem {
    /// Label value used for targeting. Machines that have not reported an
    /// OS are planned as Linux.
    pub fn label_value(&self) -> &'static str {
        match self {
            Self::Windows => labels::WINDOWS,
            Self::Linux | Self::Unknown => labels::LINUX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Etcd,
    ControlPlane,
    Worker,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Etcd, Role::ControlPlane, Role::Worker];

    pub fn label_key(&self) -> &'static str {
        match self {
            Self::Etcd => labels::ETCD_ROLE_LABEL,
            Self::ControlPlane => labels::CONTROL_PLANE_ROLE_LABEL,
            Self::Worker => labels::WORKER_ROLE_LABEL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Etcd => "etcd",
            Self::ControlPlane => "control-plane",
            Self::Worker => "worker",
        }
    }
}

/// One fleet member as observed by the external machine store.
///
/// The planner only ever reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineRecord {
    pub id: String,
    #[serde(default)]
    pub os: OperatingSystem,
    #[serde(default)]
    pub roles: BTreeSet<Role>,
    /// Free-form labels, matched by selector-scoped cluster configuration.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Version the machine currently reports as running, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl MachineRecord {
    pub fn new(id: impl Into<String>, os: OperatingSystem) -> Self {
        Self {
            id: id.into(),
            os,
            roles: BTreeSet::new(),
            labels: BTreeMap::new(),
            observed_version: None,
            address: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_observed_version(mut self, version: impl Into<String>) -> Self {
        self.observed_version = Some(version.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Parse a JSON array of machine records.
    pub fn list_from_slice(bytes: &[u8]) -> Result<Vec<Self>, CoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
