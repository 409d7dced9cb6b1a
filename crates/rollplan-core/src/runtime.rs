use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::DistroVersion;

/// The Kubernetes distribution engine a cluster runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    Rke2,
    K3s,
}

impl Runtime {
    /// K3s builds carry `k3s` in their build tag; everything else is RKE2.
    pub fn from_version(version: &DistroVersion) -> Self {
        if version.build().contains("k3s") {
            Self::K3s
        } else {
            Self::Rke2
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rke2 => "rke2",
            Self::K3s => "k3s",
        }
    }

    /// Host binary name, used for commands run outside the installer image.
    pub fn binary(&self) -> &'static str {
        self.as_str()
    }

    /// Installer variable that carries the service command line.
    pub fn exec_env_var(&self) -> &'static str {
        match self {
            Self::Rke2 => "INSTALL_RKE2_EXEC",
            Self::K3s => "INSTALL_K3S_EXEC",
        }
    }

    /// Port joining machines use to reach the init machine.
    pub fn supervisor_port(&self) -> u16 {
        match self {
            Self::Rke2 => 9345,
            Self::K3s => 6443,
        }
    }

    /// RKE2 runs control-plane components as static pods; K3s runs them
    /// inside its own host process.
    pub fn containerized_components(&self) -> bool {
        matches!(self, Self::Rke2)
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
