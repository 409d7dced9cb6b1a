use rollplan_core::plan::RESTART_STAMP_ENV;
use rollplan_core::{ClusterSpec, DistroVersion, Instruction, NodePlan, Role, Runtime};

use crate::config::PlannerConfig;
use crate::entry::PlanEntry;
use crate::error::PlannerError;
use crate::exec::{env_entry, render_exec_command};
use crate::image::{resolve_installer_image, ImageNaming, StaticImageNaming};
use crate::machine_config::resolve_machine_config;
use crate::predicate::{any_role_excluding_windows, is_control_plane, is_etcd, is_windows};
use crate::skew::{MinorSkewPolicy, SkewPolicy};
use crate::source::{NoSnapshotArgs, S3SnapshotArgs, SnapshotArgs};
use crate::stamp::restart_stamp;

pub const INSTALL_INSTRUCTION: &str = "install";
pub const SNAPSHOT_INSTRUCTION: &str = "etcd-snapshot-pre-upgrade";

/// Builds node plans for a cluster.
///
/// Holds no state between passes: everything a pass reads comes from its
/// arguments or from the configuration given here.
pub struct Planner {
    pub(crate) config: PlannerConfig,
    pub(crate) images: Box<dyn ImageNaming>,
    pub(crate) snapshot_args: Box<dyn SnapshotArgs>,
    pub(crate) skew: Box<dyn SkewPolicy>,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        let images = Box::new(StaticImageNaming::new(config.installer_image_prefix.clone()));
        let snapshot_args: Box<dyn SnapshotArgs> = match &config.snapshot {
            Some(storage) => Box::new(S3SnapshotArgs::new(storage.clone())),
            None => Box::new(NoSnapshotArgs),
        };
        let skew = Box::new(MinorSkewPolicy::new(config.max_minor_skew));
        Self {
            config,
            images,
            snapshot_args,
            skew,
        }
    }

    pub fn with_image_naming(mut self, images: impl ImageNaming + 'static) -> Self {
        self.images = Box::new(images);
        self
    }

    pub fn with_snapshot_args(mut self, args: impl SnapshotArgs + 'static) -> Self {
        self.snapshot_args = Box::new(args);
        self
    }

    pub fn with_skew_policy(mut self, skew: impl SkewPolicy + 'static) -> Self {
        self.skew = Box::new(skew);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Append the install instruction to `existing` and restamp the plan.
    ///
    /// The entry's OS label is overwritten with the value resolved from the
    /// machine record. Windows machines get the stamp as an environment
    /// entry ahead of the exec variable.
    pub fn install_instruction(
        &self,
        existing: NodePlan,
        cluster: &ClusterSpec,
        entry: &mut PlanEntry<'_>,
    ) -> Result<NodePlan, PlannerError> {
        let desired = cluster
            .desired_version()
            .map_err(PlannerError::DesiredVersion)?;
        let runtime = Runtime::from_version(&desired);
        let image = resolve_installer_image(cluster, self.images.as_ref())?;

        entry.stamp_os();
        let windows = is_windows(entry);
        let (command, script) = if windows {
            ("powershell.exe", "run.ps1")
        } else {
            ("sh", "run.sh")
        };
        let args = if windows {
            vec!["-File".to_string(), script.to_string()]
        } else {
            vec!["-c".to_string(), script.to_string()]
        };

        let config = resolve_machine_config(cluster, entry);
        let exec = render_exec_command(runtime, entry, &config);

        let mut plan = existing;
        plan.instructions.push(Instruction {
            name: INSTALL_INSTRUCTION.to_string(),
            image,
            command: command.to_string(),
            args,
            env: vec![env_entry(windows, runtime.exec_env_var(), &exec)],
            mounts: Vec::new(),
        });

        let stamp = restart_stamp(&plan.instructions)?;
        if windows {
            if let Some(install) = plan.instructions.last_mut() {
                install
                    .env
                    .insert(0, env_entry(true, RESTART_STAMP_ENV, &stamp));
            }
        }
        plan.restart_stamp = stamp;
        Ok(plan)
    }

    /// Snapshot etcd on the host before its binaries change.
    pub fn snapshot_instruction(
        &self,
        runtime: Runtime,
        observed: &DistroVersion,
    ) -> Result<Instruction, PlannerError> {
        let mut args = vec![
            "etcd-snapshot".to_string(),
            "save".to_string(),
            "--name".to_string(),
            format!("pre-upgrade-{}", observed.image_tag()),
        ];
        args.extend(self.snapshot_args.args()?);

        Ok(Instruction {
            name: SNAPSHOT_INSTRUCTION.to_string(),
            command: runtime.binary().to_string(),
            args,
            ..Default::default()
        })
    }

    /// Windows machines can only be workers.
    pub fn check_roles(&self, entry: &PlanEntry<'_>) -> Result<(), PlannerError> {
        if is_windows(entry) {
            if is_etcd(entry) {
                return Err(PlannerError::unsupported_role(
                    entry.id(),
                    entry.machine.os,
                    Role::Etcd,
                ));
            }
            if is_control_plane(entry) {
                return Err(PlannerError::unsupported_role(
                    entry.id(),
                    entry.machine.os,
                    Role::ControlPlane,
                ));
            }
        }
        Ok(())
    }

    /// Every instruction for one machine, in execution order.
    pub fn build_node_plan(
        &self,
        cluster: &ClusterSpec,
        desired: &DistroVersion,
        entry: &mut PlanEntry<'_>,
        observed: Option<&DistroVersion>,
    ) -> Result<NodePlan, PlannerError> {
        self.check_roles(entry)?;

        let mut plan = NodePlan::default();

        let upgrading = observed.filter(|o| *o != desired);
        if let Some(observed) = upgrading {
            if cluster.etcd.snapshot_before_upgrade
                && any_role_excluding_windows(entry)
                && is_etcd(entry)
            {
                let runtime = Runtime::from_version(desired);
                plan.instructions
                    .push(self.snapshot_instruction(runtime, observed)?);
            }
        }

        self.install_instruction(plan, cluster, entry)
    }
}
