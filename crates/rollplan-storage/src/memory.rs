use std::collections::HashMap;

use rollplan_core::NodePlan;
use tokio::sync::RwLock;

use crate::addr::PlanAddr;
use crate::error::StorageError;
use crate::record::PlanRecord;
use crate::store::{BoxFuture, PlanStore};

/// Process-local plan store.
#[derive(Debug, Default)]
pub struct MemoryPlanStore {
    records: RwLock<HashMap<PlanAddr, PlanRecord>>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl PlanStore for MemoryPlanStore {
    fn get<'a>(
        &'a self,
        addr: &'a PlanAddr,
    ) -> BoxFuture<'a, Result<Option<PlanRecord>, StorageError>> {
        Box::pin(async move { Ok(self.records.read().await.get(addr).cloned()) })
    }

    fn put<'a>(
        &'a self,
        addr: &'a PlanAddr,
        plan: &'a NodePlan,
        target_version: &'a str,
    ) -> BoxFuture<'a, Result<PlanRecord, StorageError>> {
        Box::pin(async move {
            let mut records = self.records.write().await;
            let record = PlanRecord::next(records.get(addr), addr, plan, target_version);
            records.insert(addr.clone(), record.clone());
            tracing::debug!(addr = %addr, generation = record.generation, "plan stored in memory");
            Ok(record)
        })
    }

    fn delete<'a>(&'a self, addr: &'a PlanAddr) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.records.write().await.remove(addr);
            Ok(())
        })
    }
}
