use std::env;
use std::path::PathBuf;

use eyre::{eyre, Result};
use rollplan_planner::{
    format_err_chain, load_config, reconcile, Action, ClusterSource, MachineSource, Planner,
    PlannerConfig,
};
use rollplan_storage::{FilePlanStore, PlanStore, S3PlanStore};
use tracing_subscriber::EnvFilter;

mod source;

use source::JsonFileSource;

const USAGE: &str = "usage: rollplan [--dry-run] <cluster.json> <machines.json>";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let mut dry_run = false;
    let mut paths = Vec::new();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            _ => paths.push(PathBuf::from(arg)),
        }
    }
    let [cluster_path, machines_path] = <[PathBuf; 2]>::try_from(paths).map_err(|_| eyre!(USAGE))?;

    let config = match config_path() {
        Some(path) => load_config(&path)?,
        None => PlannerConfig::default(),
    };
    let planner = Planner::new(config);
    let store = open_store().await?;
    let source = JsonFileSource::new(cluster_path, machines_path);
    let cluster_name = source.cluster_name().await?;

    let report = if dry_run {
        let cluster = source.cluster(&cluster_name).await?;
        let machines = source.machines(&cluster_name).await?;
        planner.plan(&cluster, &machines, store.as_ref()).await?
    } else {
        reconcile(&planner, &source, &source, store.as_ref(), &cluster_name)
            .await
            .map_err(|e| eyre!(format_err_chain(&e)))?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    let failed = report.count(Action::Fail);
    if failed > 0 {
        return Err(eyre!("{failed} machine(s) could not be planned"));
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if env::var("ROLLPLAN_LOG_FORMAT").is_ok_and(|f| f == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn config_path() -> Option<PathBuf> {
    env::var_os("ROLLPLAN_CONFIG")
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("rollplan").join("config.json")))
}

fn state_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("ROLLPLAN_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::data_local_dir().ok_or_else(|| eyre!("no local data directory found"))?;
    Ok(base.join("rollplan").join("plans"))
}

/// S3 when `ROLLPLAN_S3_BUCKET` is set, local files otherwise.
async fn open_store() -> Result<Box<dyn PlanStore>> {
    if let Ok(bucket) = env::var("ROLLPLAN_S3_BUCKET") {
        let prefix = env::var("ROLLPLAN_S3_PREFIX").unwrap_or_else(|_| "plans/".to_string());
        let region = env::var("AWS_REGION").ok();
        tracing::info!(bucket = %bucket, prefix = %prefix, "using S3 plan store");
        return Ok(Box::new(S3PlanStore::connect(bucket, prefix, region).await));
    }

    let dir = state_dir()?;
    tracing::info!(path = %dir.display(), "using local plan store");
    Ok(Box::new(FilePlanStore::new(dir)))
}
