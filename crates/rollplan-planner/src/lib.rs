//! rollplan-planner
//!
//! Convergence planner for RKE2 and K3s clusters. Given a cluster's desired
//! state and the machines that belong to it, computes the ordered
//! instructions each machine needs and persists them through a plan store.
//!
//! Public API:
//! - `Planner::plan()`: compute a pass report, reading the store only
//! - `execute()`: write the report's changed plans, rolling back on failure
//! - `reconcile()`: read the sources, plan, and execute when needed

pub mod config;
pub mod entry;
pub mod error;
pub mod exec;
pub mod image;
pub mod machine_config;
pub mod orchestrate;
pub mod planner;
pub mod predicate;
pub mod render;
pub mod report;
pub mod rollout;
pub mod skew;
pub mod source;
pub mod stamp;
pub mod version;

use rollplan_storage::PlanStore;

pub use crate::config::{load_config, PlannerConfig, SnapshotStorageConfig};
pub use crate::entry::PlanEntry;
pub use crate::error::{format_err_chain, ErrorScope, PlannerError};
pub use crate::image::{ImageNaming, StaticImageNaming};
pub use crate::orchestrate::execute;
pub use crate::planner::Planner;
pub use crate::report::{Action, MachinePlan, PassReport};
pub use crate::skew::{MinorSkewPolicy, SkewDecision, SkewPolicy};
pub use crate::source::{ClusterSource, InMemorySource, MachineSource, SnapshotArgs};

/// One full pass for a cluster: read → plan → execute.
pub async fn reconcile(
    planner: &Planner,
    clusters: &dyn ClusterSource,
    machines: &dyn MachineSource,
    store: &dyn PlanStore,
    cluster_name: &str,
) -> Result<PassReport, PlannerError> {
    let cluster = clusters.cluster(cluster_name).await?;
    let machine_records = machines.machines(cluster_name).await?;
    let report = planner.plan(&cluster, &machine_records, store).await?;

    if report.has_changes() {
        let written = execute(&report, store).await?;
        tracing::info!(cluster = %cluster_name, written, "plans updated");
    } else {
        tracing::info!(cluster = %cluster_name, "all machines in sync, no changes needed");
    }

    Ok(report)
}
