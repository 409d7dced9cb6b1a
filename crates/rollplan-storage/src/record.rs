use rollplan_core::NodePlan;
use serde::{Deserialize, Serialize};

use crate::addr::PlanAddr;

/// The last plan delivered for one machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRecord {
    pub addr: PlanAddr,
    /// Starts at 1, incremented by every write.
    pub generation: u64,
    /// Desired distribution version the plan was computed for.
    pub target_version: String,
    pub plan: NodePlan,
    pub updated_at: jiff::Timestamp,
}

impl PlanRecord {
    /// Build the record that replaces `previous`.
    pub fn next(
        previous: Option<&PlanRecord>,
        addr: &PlanAddr,
        plan: &NodePlan,
        target_version: &str,
    ) -> Self {
        Self {
            addr: addr.clone(),
            generation: previous.map_or(1, |r| r.generation + 1),
            target_version: target_version.to_string(),
            plan: plan.clone(),
            updated_at: jiff::Timestamp::now(),
        }
    }
}
