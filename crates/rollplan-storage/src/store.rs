use std::future::Future;
use std::pin::Pin;

use rollplan_core::NodePlan;

use crate::addr::PlanAddr;
use crate::error::StorageError;
use crate::record::PlanRecord;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence for the last computed plan of each machine.
///
/// Implementations must tolerate concurrent calls for different addresses.
/// A `put` replaces the whole record; readers never observe a partial write.
///
/// Methods return boxed futures for dyn compatibility.
pub trait PlanStore: Send + Sync {
    /// `Ok(None)` when no plan has been stored for `addr`.
    fn get<'a>(
        &'a self,
        addr: &'a PlanAddr,
    ) -> BoxFuture<'a, Result<Option<PlanRecord>, StorageError>>;

    /// Overwrite the record for `addr`, returning what was written.
    fn put<'a>(
        &'a self,
        addr: &'a PlanAddr,
        plan: &'a NodePlan,
        target_version: &'a str,
    ) -> BoxFuture<'a, Result<PlanRecord, StorageError>>;

    /// Remove the record for `addr`. Removing a missing record is not an error.
    fn delete<'a>(&'a self, addr: &'a PlanAddr) -> BoxFuture<'a, Result<(), StorageError>>;
}

/// Whether writing `plan` over `stored` would change what the machine sees.
pub fn plan_changed(stored: Option<&PlanRecord>, plan: &NodePlan) -> bool {
    stored.is_none_or(|record| record.plan != *plan)
}
