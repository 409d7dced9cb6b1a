//! Cross-machine sequencing: who initializes the cluster, who may upgrade
//! now, and how many at a time.

use rollplan_core::{DistroVersion, MachineRecord, OperatingSystem, Role, Runtime};

use crate::version::observed_version;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// etcd or control-plane
    Server,
    Agent,
}

impl Tier {
    pub fn of(machine: &MachineRecord) -> Self {
        if machine.has_role(Role::Etcd) || machine.has_role(Role::ControlPlane) {
            Self::Server
        } else {
            Self::Agent
        }
    }
}

/// The non-Windows etcd machine with the smallest id.
pub fn init_machine<'a, I>(machines: I) -> Option<&'a MachineRecord>
where
    I: IntoIterator<Item = &'a MachineRecord>,
{
    machines
        .into_iter()
        .filter(|m| m.has_role(Role::Etcd) && m.os != OperatingSystem::Windows)
        .min_by(|a, b| a.id.cmp(&b.id))
}

/// Supervisor URL other machines join through. `None` until the init
/// machine reports an address.
pub fn join_url(runtime: Runtime, init: &MachineRecord) -> Option<String> {
    let address = init.address.as_deref().map(str::trim).filter(|a| !a.is_empty())?;
    let host = if address.contains(':') && !address.starts_with('[') {
        format!("[{address}]")
    } else {
        address.to_string()
    };
    Some(format!("https://{host}:{}", runtime.supervisor_port()))
}

/// Every server reports at least the desired release. False when there are
/// no servers.
pub fn servers_ready(machines: &[&MachineRecord], desired: &DistroVersion) -> bool {
    let mut servers = machines
        .iter()
        .filter(|m| Tier::of(m) == Tier::Server)
        .peekable();
    if servers.peek().is_none() {
        return false;
    }
    servers.all(|m| match observed_version(m) {
        Ok(Some(v)) => v.release_cmp(desired).is_ge(),
        _ => false,
    })
}

/// Upgrade slots for one tier.
#[derive(Debug, Clone)]
pub struct Admission {
    limit: Option<usize>,
    in_flight: usize,
    admitted: usize,
}

impl Admission {
    /// `in_flight` machines already hold a slot.
    pub fn new(limit: Option<usize>, in_flight: usize) -> Self {
        Self {
            limit,
            in_flight,
            admitted: 0,
        }
    }

    /// Take a slot for a machine not yet in flight.
    pub fn try_admit(&mut self) -> bool {
        match self.limit {
            Some(limit) if self.in_flight + self.admitted >= limit => false,
            _ => {
                self.admitted += 1;
                true
            }
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}
