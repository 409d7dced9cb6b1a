use std::fmt;

use rollplan_core::naming::safe_concat_name;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Longest name a single stored record may have.
pub const MAX_OBJECT_NAME: usize = 63;

/// Composite key for a machine's plan record.
///
/// Machines in different clusters may share an id, so the cluster is part
/// of the address.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PlanAddr {
    pub cluster: String,
    pub machine: String,
}

impl PlanAddr {
    pub fn new(cluster: impl Into<String>, machine: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            machine: machine.into(),
        }
    }

    /// Name of the machine's record within its cluster, e.g.
    /// `node-1-machine-plan`.
    pub fn object_name(&self) -> String {
        safe_concat_name(MAX_OBJECT_NAME, &[&self.machine, "machine-plan"])
    }

    /// Backend-neutral key, e.g. `prod/node-1-machine-plan`.
    ///
    /// The cluster is a key segment of its own, so two addresses never
    /// share a key. Segments that are empty, hidden, or contain a path
    /// separator are rejected.
    pub fn object_key(&self) -> Result<String, StorageError> {
        let cluster = key_segment(&self.cluster)?;
        let name = self.object_name();
        key_segment(&name)?;
        Ok(format!("{cluster}/{name}"))
    }
}

fn key_segment(segment: &str) -> Result<&str, StorageError> {
    let separator = |c: char| c == '/' || c == '\\';
    if segment.is_empty() || segment.starts_with('.') || segment.contains(separator) {
        return Err(StorageError::InvalidKey {
            key: segment.to_string(),
        });
    }
    Ok(segment)
}

impl fmt::Display for PlanAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.cluster, self.machine)
    }
}
