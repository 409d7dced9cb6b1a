use std::path::{Path, PathBuf};

use rollplan_core::NodePlan;

use crate::addr::PlanAddr;
use crate::codec;
use crate::error::StorageError;
use crate::record::PlanRecord;
use crate::store::{BoxFuture, PlanStore};

const EXTENSION: &str = "plan.zst";

/// Plan store backed by a local directory: one subdirectory per cluster,
/// one file per machine.
///
/// Writes go to a temp file that is renamed over the target, so a reader
/// sees either the old record or the new one.
#[derive(Debug, Clone)]
pub struct FilePlanStore {
    root: PathBuf,
}

impl FilePlanStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<cluster>/<object name>.plan.zst`
    fn path(&self, addr: &PlanAddr) -> Result<PathBuf, StorageError> {
        let key = addr.object_key()?;
        Ok(self.root.join(format!("{key}.{EXTENSION}")))
    }

    fn read(&self, addr: &PlanAddr) -> Result<Option<PlanRecord>, StorageError> {
        let path = self.path(addr)?;
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        codec::decode_for(addr, &path.display().to_string(), &bytes).map(Some)
    }

    fn write(&self, record: &PlanRecord) -> Result<(), StorageError> {
        let path = self.path(&record.addr)?;
        let bytes = codec::encode(record)?;

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let tmp_path = path.with_extension("zst.tmp");
        std::fs::write(&tmp_path, &bytes)?;
        std::fs::rename(&tmp_path, &path)?;

        tracing::debug!(
            path = %path.display(),
            generation = record.generation,
            "plan flushed to local disk"
        );
        Ok(())
    }
}

impl PlanStore for FilePlanStore {
    fn get<'a>(
        &'a self,
        addr: &'a PlanAddr,
    ) -> BoxFuture<'a, Result<Option<PlanRecord>, StorageError>> {
        Box::pin(async move { self.read(addr) })
    }

    fn put<'a>(
        &'a self,
        addr: &'a PlanAddr,
        plan: &'a NodePlan,
        target_version: &'a str,
    ) -> BoxFuture<'a, Result<PlanRecord, StorageError>> {
        Box::pin(async move {
            let previous = self.read(addr)?;
            let record = PlanRecord::next(previous.as_ref(), addr, plan, target_version);
            self.write(&record)?;
            Ok(record)
        })
    }

    fn delete<'a>(&'a self, addr: &'a PlanAddr) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let path = self.path(addr)?;
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "plan removed from local disk");
                    Ok(())
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }
}
