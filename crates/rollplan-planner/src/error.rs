use rollplan_core::{CoreError, OperatingSystem, Role};
use rollplan_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid desired version")]
    DesiredVersion(#[source] CoreError),

    #[error("invalid observed version on machine {machine}")]
    ObservedVersion {
        machine: String,
        #[source]
        source: CoreError,
    },

    #[error("image resolution failed: {0}")]
    ImageResolution(String),

    #[error("machine {machine}: role {role} is not supported on {os:?} machines")]
    UnsupportedRole {
        machine: String,
        os: OperatingSystem,
        role: &'static str,
    },

    #[error("snapshot arguments: {0}")]
    SnapshotArgs(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("source error: {0}")]
    Source(String),

    #[error("machine {0} appears more than once")]
    DuplicateMachine(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How much of a planning pass an error takes down with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Only the machine being planned.
    Machine,
    /// The whole pass, before anything is written.
    Cluster,
    /// The whole pass; writes already made are rolled back.
    Storage,
}

impl PlannerError {
    pub fn unsupported_role(machine: &str, os: OperatingSystem, role: Role) -> Self {
        Self::UnsupportedRole {
            machine: machine.to_string(),
            os,
            role: role.as_str(),
        }
    }

    pub fn scope(&self) -> ErrorScope {
        match self {
            Self::ObservedVersion { .. }
            | Self::ImageResolution(_)
            | Self::UnsupportedRole { .. }
            | Self::SnapshotArgs(_) => ErrorScope::Machine,
            Self::DesiredVersion(_)
            | Self::Config(_)
            | Self::Source(_)
            | Self::DuplicateMachine(_)
            | Self::Serialization(_) => ErrorScope::Cluster,
            Self::Storage(_) | Self::Io(_) => ErrorScope::Storage,
        }
    }

    /// Attach machine identity to a machine-scoped error.
    pub fn with_machine(self, id: &str) -> Self {
        match self {
            Self::ObservedVersion { source, .. } => Self::ObservedVersion {
                machine: id.to_string(),
                source,
            },
            Self::ImageResolution(msg) => Self::ImageResolution(format!("machine {id}: {msg}")),
            Self::UnsupportedRole { os, role, .. } => Self::UnsupportedRole {
                machine: id.to_string(),
                os,
                role,
            },
            Self::SnapshotArgs(msg) => Self::SnapshotArgs(format!("machine {id}: {msg}")),
            other => other,
        }
    }
}

/// Walk the full error chain and join all causes into one string.
///
/// Version errors wrap a parse failure whose detail only shows up in the
/// source chain.
pub fn format_err_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
