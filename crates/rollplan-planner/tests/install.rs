use std::collections::BTreeMap;

use rollplan_core::labels::{OS_LABEL, WORKER_ROLE_LABEL};
use rollplan_core::{
    ClusterSpec, DistroVersion, GenericMap, Instruction, MachineRecord, NodePlan, OperatingSystem,
    Role, Runtime,
};
use rollplan_planner::exec::{env_entry, render_exec_args};
use rollplan_planner::stamp::restart_stamp;
use rollplan_planner::{PlanEntry, Planner, PlannerConfig, PlannerError, SnapshotStorageConfig};
use serde_json::json;

fn worker(os: OperatingSystem) -> MachineRecord {
    MachineRecord::new("worker-1", os).with_role(Role::Worker)
}

fn install(version: &str, machine: &MachineRecord) -> (NodePlan, Instruction) {
    let planner = Planner::new(PlannerConfig::default());
    let cluster = ClusterSpec::new("c", version);
    let mut entry = PlanEntry::new(machine);
    let plan = planner
        .install_instruction(NodePlan::default(), &cluster, &mut entry)
        .unwrap();
    let instruction = plan.instructions[0].clone();
    (plan, instruction)
}

fn config(value: serde_json::Value) -> GenericMap {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("config must be an object"),
    }
}

#[test]
fn linux_install() {
    let (plan, i) = install("v1.21.5+rke2r2", &worker(OperatingSystem::Linux));
    assert_eq!(plan.instructions.len(), 1);
    assert_eq!(i.name, "install");
    assert_eq!(i.command, "sh");
    assert_eq!(i.args, vec!["-c".to_string(), "run.sh".to_string()]);
    assert_eq!(i.image, "rancher/system-agent-installer-rke2:v1.21.5-rke2r2");
    assert_eq!(i.env, vec!["INSTALL_RKE2_EXEC=agent".to_string()]);
    assert!(i.mounts.is_empty());
    assert_eq!(plan.restart_stamp.len(), 64);
}

#[test]
fn windows_install() {
    let (plan, i) = install("v1.21.5+rke2r2", &worker(OperatingSystem::Windows));
    assert_eq!(i.command, "powershell.exe");
    assert!(i.args.contains(&"run.ps1".to_string()));
    assert!(i.image.contains("v1.21.5-rke2r2"));
    assert_eq!(i.env.len(), 2);
    assert_eq!(i.env[0], format!("$env:RESTART_STAMP=\"{}\"", plan.restart_stamp));
    assert_eq!(i.env[1], "$env:INSTALL_RKE2_EXEC=\"agent\"");
}

#[test]
fn k3s_install() {
    let (_, i) = install("v1.21.5+k3s2", &worker(OperatingSystem::Linux));
    assert_eq!(i.command, "sh");
    assert!(i.image.contains("v1.21.5-k3s2"));
    assert_eq!(i.env, vec!["INSTALL_K3S_EXEC=agent".to_string()]);
}

#[test]
fn unknown_os_installs_like_linux() {
    let machine: MachineRecord =
        serde_json::from_value(json!({"id": "m", "os": "", "roles": ["worker"]})).unwrap();
    let (_, i) = install("v1.21.5+rke2r2", &machine);
    assert_eq!(i.command, "sh");
    assert!(i.args.contains(&"run.sh".to_string()));
    assert_eq!(i.env.len(), 1);
}

#[test]
fn os_label_is_restamped_from_record() {
    for (os, expected) in [
        (OperatingSystem::Linux, "linux"),
        (OperatingSystem::Windows, "windows"),
        (OperatingSystem::Unknown, "linux"),
    ] {
        let machine = worker(os);
        let mut labels = BTreeMap::new();
        labels.insert(OS_LABEL.to_string(), "bogus".to_string());
        labels.insert(WORKER_ROLE_LABEL.to_string(), "true".to_string());
        let mut entry = PlanEntry::from_parts(&machine, labels);

        Planner::new(PlannerConfig::default())
            .install_instruction(
                NodePlan::default(),
                &ClusterSpec::new("c", "v1.21.5+rke2r2"),
                &mut entry,
            )
            .unwrap();
        assert_eq!(entry.label(OS_LABEL), Some(expected));
    }
}

#[test]
fn install_is_appended_after_existing_instructions() {
    let machine = worker(OperatingSystem::Linux);
    let existing = NodePlan {
        instructions: vec![Instruction {
            name: "first".into(),
            command: "true".into(),
            ..Default::default()
        }],
        restart_stamp: String::new(),
    };
    let mut entry = PlanEntry::new(&machine);
    let plan = Planner::new(PlannerConfig::default())
        .install_instruction(existing, &ClusterSpec::new("c", "v1.25.7+rke2r1"), &mut entry)
        .unwrap();

    let names: Vec<&str> = plan.instructions.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["first", "install"]);
}

#[test]
fn stamp_is_reproducible_and_ignores_its_own_entry() {
    let machine = worker(OperatingSystem::Windows);
    let (first, _) = install("v1.25.7+rke2r1", &machine);
    let (second, _) = install("v1.25.7+rke2r1", &machine);
    assert_eq!(first.instructions, second.instructions);
    assert_eq!(first.restart_stamp, second.restart_stamp);
    assert_eq!(restart_stamp(&first.instructions).unwrap(), first.restart_stamp);

    let (upgraded, _) = install("v1.25.8+rke2r1", &machine);
    assert_ne!(upgraded.restart_stamp, first.restart_stamp);
}

#[test]
fn invalid_desired_version_fails() {
    let machine = worker(OperatingSystem::Linux);
    let mut entry = PlanEntry::new(&machine);
    let err = Planner::new(PlannerConfig::default())
        .install_instruction(NodePlan::default(), &ClusterSpec::new("c", "v1.25"), &mut entry)
        .unwrap_err();
    assert!(matches!(err, PlannerError::DesiredVersion(_)));
}

#[test]
fn etcd_only_server_exec_flags() {
    let machine = MachineRecord::new("etcd-2", OperatingSystem::Linux).with_role(Role::Etcd);
    let entry = PlanEntry::new(&machine).with_join_url(Some("https://10.0.0.1:9345".into()));
    let config = config(json!({
        "write-kubeconfig-mode": "0644",
        "cni": "calico",
        "tls-san": ["a.example.com", "b.example.com"],
        "protect-kernel-defaults": true,
        "selinux": false,
        "node-taint": null,
        "etcd-snapshot-retention": 5,
        "node-name": "my node",
        "kubelet-arg": "max-pods=200",
    }));

    let args = render_exec_args(Runtime::Rke2, &entry, &config);
    assert_eq!(
        args,
        vec![
            "server",
            "--server=https://10.0.0.1:9345",
            "--disable-apiserver",
            "--disable-controller-manager",
            "--disable-scheduler",
            "--cni=calico",
            "--etcd-snapshot-retention=5",
            "--kubelet-arg=max-pods=200",
            "--node-name=\"my node\"",
            "--protect-kernel-defaults",
            "--selinux=false",
            "--tls-san=a.example.com",
            "--tls-san=b.example.com",
            "--write-kubeconfig-mode=0644",
        ]
    );
}

#[test]
fn agents_drop_server_only_keys() {
    let machine = worker(OperatingSystem::Linux);
    let entry = PlanEntry::new(&machine).with_join_url(Some("https://10.0.0.1:9345".into()));
    let config = config(json!({
        "cni": "calico",
        "tls-san": ["a.example.com"],
        "node-label": ["tier=web", "zone=a"],
        "kube-scheduler-arg": ["v=2"],
    }));

    let args = render_exec_args(Runtime::Rke2, &entry, &config);
    assert_eq!(
        args,
        vec![
            "agent",
            "--server=https://10.0.0.1:9345",
            "--node-label=tier=web",
            "--node-label=zone=a",
        ]
    );
}

#[test]
fn control_plane_renders_component_args() {
    let machine = MachineRecord::new("cp-1", OperatingSystem::Linux).with_role(Role::ControlPlane);
    let entry = PlanEntry::new(&machine);
    let config = config(json!({
        "kube-controller-manager-arg": "cert-dir=/tmp",
    }));

    let args = render_exec_args(Runtime::Rke2, &entry, &config);
    let sched = "/var/lib/rancher/rke2/server/tls/kube-scheduler";
    assert_eq!(
        args,
        vec![
            "server".to_string(),
            "--disable-etcd".to_string(),
            "--kube-controller-manager-arg=cert-dir=/tmp".to_string(),
            "--kube-controller-manager-arg=secure-port=10257".to_string(),
            "--kube-controller-manager-extra-mount=/tmp:/tmp".to_string(),
            format!("--kube-scheduler-arg=cert-dir={sched}"),
            "--kube-scheduler-arg=secure-port=10259".to_string(),
            format!("--kube-scheduler-extra-mount={sched}:{sched}"),
        ]
    );
}

#[test]
fn k3s_control_plane_gets_no_mounts() {
    let machine = MachineRecord::new("cp-1", OperatingSystem::Linux)
        .with_role(Role::ControlPlane)
        .with_role(Role::Etcd);
    let entry = PlanEntry::new(&machine);
    let args = render_exec_args(Runtime::K3s, &entry, &GenericMap::new());

    assert_eq!(args[0], "server");
    assert!(!args.iter().any(|a| a.contains("extra-mount")));
    assert!(!args.iter().any(|a| a.starts_with("--disable")));
    assert!(args.contains(&"--kube-scheduler-arg=cert-dir=/var/lib/rancher/k3s/server/tls/kube-scheduler".to_string()));
}

#[test]
fn object_values_render_as_json() {
    let machine = worker(OperatingSystem::Linux);
    let entry = PlanEntry::new(&machine);
    let config = config(json!({"kubelet-config": {"maxPods": 200}}));
    let args = render_exec_args(Runtime::Rke2, &entry, &config);
    assert_eq!(args, vec!["agent", "--kubelet-config={\"maxPods\":200}"]);
}

#[test]
fn env_entries_follow_shell_syntax() {
    assert_eq!(env_entry(false, "INSTALL_RKE2_EXEC", "agent"), "INSTALL_RKE2_EXEC=agent");
    assert_eq!(
        env_entry(true, "INSTALL_RKE2_EXEC", "agent --node-name=\"a b\""),
        "$env:INSTALL_RKE2_EXEC=\"agent --node-name=`\"a b`\"\""
    );
}

#[test]
fn selector_config_overlays_global_for_matching_machines() {
    let mut cluster = ClusterSpec::new("c", "v1.25.7+rke2r1");
    cluster.machine_global_config = config(json!({"node-label": ["a=1"], "selinux": true}));
    cluster.machine_selector_config = vec![serde_json::from_value(json!({
        "machine_label_selector": {"match_labels": {"zone": "b"}},
        "config": {"node-label": ["b=2"]}
    }))
    .unwrap()];

    let planner = Planner::new(PlannerConfig::default());
    let in_zone = worker(OperatingSystem::Linux).with_label("zone", "b");
    let elsewhere = worker(OperatingSystem::Linux).with_label("zone", "a");

    let exec = |machine: &MachineRecord| {
        let mut entry = PlanEntry::new(machine);
        let plan = planner
            .install_instruction(NodePlan::default(), &cluster, &mut entry)
            .unwrap();
        plan.instructions[0].env[0].clone()
    };

    assert_eq!(exec(&in_zone), "INSTALL_RKE2_EXEC=agent --node-label=b=2 --selinux");
    assert_eq!(exec(&elsewhere), "INSTALL_RKE2_EXEC=agent --node-label=a=1 --selinux");
}

fn snapshot_cluster() -> ClusterSpec {
    let mut cluster = ClusterSpec::new("c", "v1.25.7+rke2r1");
    cluster.etcd.snapshot_before_upgrade = true;
    cluster
}

#[test]
fn etcd_upgrade_snapshots_first() {
    let machine = MachineRecord::new("etcd-1", OperatingSystem::Linux)
        .with_role(Role::Etcd)
        .with_observed_version("v1.25.6+rke2r1");
    let config = PlannerConfig {
        snapshot: Some(SnapshotStorageConfig {
            bucket: "backups".into(),
            region: Some("us-east-1".into()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let planner = Planner::new(config);
    let cluster = snapshot_cluster();
    let desired = cluster.desired_version().unwrap();
    let observed = DistroVersion::parse("v1.25.6+rke2r1").unwrap();

    let mut entry = PlanEntry::new(&machine);
    let plan = planner
        .build_node_plan(&cluster, &desired, &mut entry, Some(&observed))
        .unwrap();

    assert_eq!(plan.instructions.len(), 2);
    let snapshot = &plan.instructions[0];
    assert_eq!(snapshot.name, "etcd-snapshot-pre-upgrade");
    assert_eq!(snapshot.command, "rke2");
    assert!(snapshot.image.is_empty());
    assert_eq!(
        snapshot.args,
        vec![
            "etcd-snapshot",
            "save",
            "--name",
            "pre-upgrade-v1.25.6-rke2r1",
            "--s3",
            "--s3-bucket=backups",
            "--s3-region=us-east-1",
        ]
    );
    assert_eq!(plan.instructions[1].name, "install");
}

#[test]
fn no_snapshot_without_a_version_change() {
    let planner = Planner::new(PlannerConfig::default());
    let cluster = snapshot_cluster();
    let desired = cluster.desired_version().unwrap();
    let etcd = MachineRecord::new("etcd-1", OperatingSystem::Linux).with_role(Role::Etcd);

    let mut entry = PlanEntry::new(&etcd);
    let plan = planner
        .build_node_plan(&cluster, &desired, &mut entry, Some(&desired))
        .unwrap();
    assert!(plan.instruction("etcd-snapshot-pre-upgrade").is_none());

    let mut entry = PlanEntry::new(&etcd);
    let plan = planner.build_node_plan(&cluster, &desired, &mut entry, None).unwrap();
    assert!(plan.instruction("etcd-snapshot-pre-upgrade").is_none());
}

#[test]
fn workers_never_snapshot() {
    let planner = Planner::new(PlannerConfig::default());
    let cluster = snapshot_cluster();
    let desired = cluster.desired_version().unwrap();
    let observed = DistroVersion::parse("v1.25.6+rke2r1").unwrap();
    let machine = worker(OperatingSystem::Linux);

    let mut entry = PlanEntry::new(&machine);
    let plan = planner
        .build_node_plan(&cluster, &desired, &mut entry, Some(&observed))
        .unwrap();
    assert_eq!(plan.instructions.len(), 1);
}

#[test]
fn snapshot_storage_without_bucket_fails() {
    let config = PlannerConfig {
        snapshot: Some(SnapshotStorageConfig::default()),
        ..Default::default()
    };
    let planner = Planner::new(config);
    let cluster = snapshot_cluster();
    let desired = cluster.desired_version().unwrap();
    let observed = DistroVersion::parse("v1.25.6+rke2r1").unwrap();
    let machine = MachineRecord::new("etcd-1", OperatingSystem::Linux).with_role(Role::Etcd);

    let mut entry = PlanEntry::new(&machine);
    let err = planner
        .build_node_plan(&cluster, &desired, &mut entry, Some(&observed))
        .unwrap_err();
    assert!(matches!(err, PlannerError::SnapshotArgs(_)));
}

#[test]
fn windows_servers_are_rejected() {
    let planner = Planner::new(PlannerConfig::default());
    let cluster = ClusterSpec::new("c", "v1.25.7+rke2r1");
    let desired = cluster.desired_version().unwrap();
    let machine = MachineRecord::new("w", OperatingSystem::Windows).with_role(Role::ControlPlane);

    let mut entry = PlanEntry::new(&machine);
    let err = planner
        .build_node_plan(&cluster, &desired, &mut entry, None)
        .unwrap_err();
    assert!(matches!(err, PlannerError::UnsupportedRole { role: "control-plane", .. }));
}
