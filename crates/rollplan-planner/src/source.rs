//! Collaborators the planner reads from, and the adapters shipped with it.

use std::collections::HashMap;

use rollplan_core::{ClusterSpec, MachineRecord};
use rollplan_storage::BoxFuture;

use crate::config::SnapshotStorageConfig;
use crate::error::PlannerError;

/// Reads the desired state of a cluster.
pub trait ClusterSource: Send + Sync {
    fn cluster<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<ClusterSpec, PlannerError>>;
}

/// Reads the machines that belong to a cluster.
pub trait MachineSource: Send + Sync {
    fn machines<'a>(
        &'a self,
        cluster: &'a str,
    ) -> BoxFuture<'a, Result<Vec<MachineRecord>, PlannerError>>;
}

/// Extra arguments addressing remote snapshot storage. Opaque to the
/// planner; appended to snapshot commands as-is.
pub trait SnapshotArgs: Send + Sync {
    fn args(&self) -> Result<Vec<String>, PlannerError>;
}

/// Snapshots stay on the machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSnapshotArgs;

impl SnapshotArgs for NoSnapshotArgs {
    fn args(&self) -> Result<Vec<String>, PlannerError> {
        Ok(Vec::new())
    }
}

/// Snapshots uploaded to an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3SnapshotArgs {
    config: SnapshotStorageConfig,
}

impl S3SnapshotArgs {
    pub fn new(config: SnapshotStorageConfig) -> Self {
        Self { config }
    }
}

impl SnapshotArgs for S3SnapshotArgs {
    fn args(&self) -> Result<Vec<String>, PlannerError> {
        let config = &self.config;
        if config.bucket.trim().is_empty() {
            return Err(PlannerError::SnapshotArgs(
                "snapshot storage has no bucket".into(),
            ));
        }

        let mut args = vec!["--s3".to_string(), format!("--s3-bucket={}", config.bucket)];
        let optional = [
            ("s3-endpoint", &config.endpoint),
            ("s3-region", &config.region),
            ("s3-folder", &config.folder),
            ("s3-endpoint-ca", &config.endpoint_ca),
        ];
        for (name, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                args.push(format!("--{name}={value}"));
            }
        }
        if config.skip_ssl_verify {
            args.push("--s3-skip-ssl-verify".to_string());
        }
        Ok(args)
    }
}

/// Clusters and machines held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    clusters: HashMap<String, ClusterSpec>,
    machines: HashMap<String, Vec<MachineRecord>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster(mut self, cluster: ClusterSpec, machines: Vec<MachineRecord>) -> Self {
        self.insert(cluster, machines);
        self
    }

    pub fn insert(&mut self, cluster: ClusterSpec, machines: Vec<MachineRecord>) {
        self.machines.insert(cluster.name.clone(), machines);
        self.clusters.insert(cluster.name.clone(), cluster);
    }
}

impl ClusterSource for InMemorySource {
    fn cluster<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<ClusterSpec, PlannerError>> {
        Box::pin(async move {
            self.clusters
                .get(name)
                .cloned()
                .ok_or_else(|| PlannerError::Source(format!("cluster {name} not found")))
        })
    }
}

impl MachineSource for InMemorySource {
    fn machines<'a>(
        &'a self,
        cluster: &'a str,
    ) -> BoxFuture<'a, Result<Vec<MachineRecord>, PlannerError>> {
        Box::pin(async move { Ok(self.machines.get(cluster).cloned().unwrap_or_default()) })
    }
}
