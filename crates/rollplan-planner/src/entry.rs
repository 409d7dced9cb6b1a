use std::collections::BTreeMap;

use rollplan_core::labels;
use rollplan_core::{MachineRecord, Role};

/// One machine as seen by a single planning pass.
///
/// Labels start as the machine's own labels with the OS and role labels
/// stamped on top, so predicates and selectors read one normalized set.
#[derive(Debug, Clone)]
pub struct PlanEntry<'a> {
    pub machine: &'a MachineRecord,
    pub labels: BTreeMap<String, String>,
    /// Where a non-init machine joins the cluster. `None` for the init
    /// machine.
    pub join_url: Option<String>,
}

impl<'a> PlanEntry<'a> {
    pub fn new(machine: &'a MachineRecord) -> Self {
        let mut labels = machine.labels.clone();
        for role in Role::ALL {
            let value = if machine.has_role(role) { "true" } else { "false" };
            labels.insert(role.label_key().to_string(), value.to_string());
        }
        let mut entry = Self::from_parts(machine, labels);
        entry.stamp_os();
        entry
    }

    /// Build an entry with exactly the given labels, nothing stamped.
    pub fn from_parts(machine: &'a MachineRecord, labels: BTreeMap<String, String>) -> Self {
        Self {
            machine,
            labels,
            join_url: None,
        }
    }

    pub fn with_join_url(mut self, url: Option<String>) -> Self {
        self.join_url = url;
        self
    }

    pub fn id(&self) -> &str {
        &self.machine.id
    }

    /// Missing labels read as `None`.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Overwrite the OS label with the value resolved from the machine
    /// record.
    pub fn stamp_os(&mut self) {
        self.labels.insert(
            labels::OS_LABEL.to_string(),
            self.machine.os.label_value().to_string(),
        );
    }
}
