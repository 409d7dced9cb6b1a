use std::path::PathBuf;

use rollplan_core::{ClusterSpec, MachineRecord};
use rollplan_planner::{ClusterSource, MachineSource, PlannerError};
use rollplan_storage::BoxFuture;

/// Cluster and machine documents read from disk on every call, so each
/// pass sees the files as they are now.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    cluster_path: PathBuf,
    machines_path: PathBuf,
}

impl JsonFileSource {
    pub fn new(cluster_path: impl Into<PathBuf>, machines_path: impl Into<PathBuf>) -> Self {
        Self {
            cluster_path: cluster_path.into(),
            machines_path: machines_path.into(),
        }
    }

    async fn read_cluster(&self) -> Result<ClusterSpec, PlannerError> {
        let bytes = tokio::fs::read(&self.cluster_path).await?;
        ClusterSpec::from_slice(&bytes).map_err(|e| {
            PlannerError::Source(format!("{}: {e}", self.cluster_path.display()))
        })
    }

    /// Name declared by the cluster document.
    pub async fn cluster_name(&self) -> Result<String, PlannerError> {
        Ok(self.read_cluster().await?.name)
    }
}

impl ClusterSource for JsonFileSource {
    fn cluster<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<ClusterSpec, PlannerError>> {
        Box::pin(async move {
            let cluster = self.read_cluster().await?;
            if cluster.name != name {
                return Err(PlannerError::Source(format!(
                    "{} declares cluster {}, not {name}",
                    self.cluster_path.display(),
                    cluster.name
                )));
            }
            Ok(cluster)
        })
    }
}

impl MachineSource for JsonFileSource {
    fn machines<'a>(
        &'a self,
        _cluster: &'a str,
    ) -> BoxFuture<'a, Result<Vec<MachineRecord>, PlannerError>> {
        Box::pin(async move {
            let bytes = tokio::fs::read(&self.machines_path).await?;
            MachineRecord::list_from_slice(&bytes).map_err(|e| {
                PlannerError::Source(format!("{}: {e}", self.machines_path.display()))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_both_documents() {
        let dir = tempfile::tempdir().unwrap();
        let cluster = dir.path().join("cluster.json");
        let machines = dir.path().join("machines.json");
        std::fs::write(&cluster, r#"{"name": "prod", "kubernetes_version": "v1.25.7+rke2r1"}"#)
            .unwrap();
        std::fs::write(
            &machines,
            r#"[{"id": "m1", "os": "linux", "roles": ["etcd", "control-plane"]}]"#,
        )
        .unwrap();

        let source = JsonFileSource::new(&cluster, &machines);
        assert_eq!(source.cluster_name().await.unwrap(), "prod");
        assert_eq!(source.cluster("prod").await.unwrap().kubernetes_version, "v1.25.7+rke2r1");
        assert_eq!(source.machines("prod").await.unwrap().len(), 1);

        let err = source.cluster("staging").await.unwrap_err();
        assert!(matches!(err, PlannerError::Source(_)));
    }

    #[tokio::test]
    async fn malformed_documents_are_source_errors() {
        let dir = tempfile::tempdir().unwrap();
        let cluster = dir.path().join("cluster.json");
        std::fs::write(&cluster, "{").unwrap();

        let source = JsonFileSource::new(&cluster, dir.path().join("missing.json"));
        assert!(matches!(source.cluster_name().await, Err(PlannerError::Source(_))));
        assert!(matches!(source.machines("prod").await, Err(PlannerError::Io(_))));
    }
}
