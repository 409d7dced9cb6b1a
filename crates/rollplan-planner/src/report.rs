use rollplan_core::NodePlan;
use rollplan_storage::{PlanAddr, PlanRecord};
use serde::{Deserialize, Serialize};

/// What a pass decided for one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// New or changed plan, to be written.
    Apply,
    /// Computed plan equals the stored one.
    Unchanged,
    /// Gated by sequencing; the stored plan is left alone.
    Hold,
    /// Nothing to plan for this machine.
    Skip,
    /// Planning this machine failed; the stored plan is left alone.
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachinePlan {
    pub addr: PlanAddr,
    pub action: Action,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<NodePlan>,
    /// Stored record read at the start of the pass.
    #[serde(skip)]
    pub previous: Option<PlanRecord>,
}

impl MachinePlan {
    pub fn new(addr: PlanAddr, action: Action, reason: impl Into<String>) -> Self {
        Self {
            addr,
            action,
            reason: reason.into(),
            plan: None,
            previous: None,
        }
    }

    pub fn with_plan(mut self, plan: NodePlan) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn with_previous(mut self, previous: Option<PlanRecord>) -> Self {
        self.previous = previous;
        self
    }
}

/// Outcome of one planning pass over a cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassReport {
    pub cluster: String,
    pub desired_version: String,
    /// Lowest observed version and the machine running it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_machine: Option<String>,
    /// In machine-id order.
    pub machines: Vec<MachinePlan>,
}

impl PassReport {
    pub fn has_changes(&self) -> bool {
        self.machines.iter().any(|m| m.action == Action::Apply)
    }

    pub fn count(&self, action: Action) -> usize {
        self.machines.iter().filter(|m| m.action == action).count()
    }

    pub fn machine(&self, id: &str) -> Option<&MachinePlan> {
        self.machines.iter().find(|m| m.addr.machine == id)
    }
}
