//! rollplan-core
//!
//! Pure domain types shared by the planner and the plan store: cluster
//! specifications, machine records, instructions, node plans and
//! distribution versions. No I/O lives here.

pub mod cluster;
pub mod error;
pub mod labels;
pub mod machine;
pub mod naming;
pub mod plan;
pub mod runtime;
pub mod version;

pub use crate::cluster::{ClusterSpec, EtcdSpec, GenericMap, LabelSelector, SelectorConfig};
pub use crate::error::CoreError;
pub use crate::machine::{MachineRecord, OperatingSystem, Role};
pub use crate::plan::{Instruction, NodePlan};
pub use crate::runtime::Runtime;
pub use crate::version::DistroVersion;
