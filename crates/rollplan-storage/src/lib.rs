//! rollplan-storage
//!
//! The plan store: the last plan computed for each machine, held as one
//! addressable, versioned record per machine.
//!
//! Backends:
//! - `MemoryPlanStore`: process-local, for tests and embedding
//! - `FilePlanStore`: one compressed file per machine, atomic rename
//! - `S3PlanStore`: one object per machine, ETag-conditional writes

pub mod addr;
pub mod codec;
pub mod error;
pub mod file;
pub mod memory;
pub mod record;
pub mod s3;
pub mod store;

pub use crate::addr::PlanAddr;
pub use crate::error::StorageError;
pub use crate::file::FilePlanStore;
pub use crate::memory::MemoryPlanStore;
pub use crate::record::PlanRecord;
pub use crate::s3::S3PlanStore;
pub use crate::store::{plan_changed, BoxFuture, PlanStore};
