use rollplan_core::{CoreError, DistroVersion, OperatingSystem, Role};
use rollplan_planner::source::{NoSnapshotArgs, S3SnapshotArgs};
use rollplan_planner::{format_err_chain, ErrorScope, PlannerError, SnapshotArgs, SnapshotStorageConfig};

#[test]
fn s3_snapshot_args_include_only_set_fields() {
    let args = S3SnapshotArgs::new(SnapshotStorageConfig {
        bucket: "backups".into(),
        endpoint: Some("s3.example.com".into()),
        region: None,
        folder: Some("".into()),
        endpoint_ca: Some("/etc/ssl/ca.pem".into()),
        skip_ssl_verify: true,
    })
    .args()
    .unwrap();

    assert_eq!(
        args,
        vec![
            "--s3",
            "--s3-bucket=backups",
            "--s3-endpoint=s3.example.com",
            "--s3-endpoint-ca=/etc/ssl/ca.pem",
            "--s3-skip-ssl-verify",
        ]
    );
}

#[test]
fn local_snapshots_add_nothing() {
    assert!(NoSnapshotArgs.args().unwrap().is_empty());
}

fn version_error() -> CoreError {
    DistroVersion::parse("v1.x").unwrap_err()
}

#[test]
fn scopes() {
    let observed = PlannerError::ObservedVersion {
        machine: "m1".into(),
        source: version_error(),
    };
    assert_eq!(observed.scope(), ErrorScope::Machine);
    assert_eq!(PlannerError::DesiredVersion(version_error()).scope(), ErrorScope::Cluster);
    assert_eq!(PlannerError::ImageResolution("x".into()).scope(), ErrorScope::Machine);
    assert_eq!(PlannerError::Source("x".into()).scope(), ErrorScope::Cluster);
    assert_eq!(
        PlannerError::Storage(rollplan_storage::StorageError::PutObject("x".into())).scope(),
        ErrorScope::Storage
    );
}

#[test]
fn machine_identity_is_prefixed() {
    let err = PlannerError::ImageResolution("bad registry".into()).with_machine("m1");
    assert_eq!(err.to_string(), "image resolution failed: machine m1: bad registry");

    let err = PlannerError::SnapshotArgs("no bucket".into()).with_machine("m1");
    assert_eq!(err.to_string(), "snapshot arguments: machine m1: no bucket");
}

#[test]
fn every_machine_scoped_error_names_the_machine() {
    let observed = PlannerError::ObservedVersion {
        machine: String::new(),
        source: version_error(),
    }
    .with_machine("m1");
    assert_eq!(observed.to_string(), "invalid observed version on machine m1");
    assert!(format_err_chain(&observed).contains("v1.x"));

    let role = PlannerError::unsupported_role("placeholder", OperatingSystem::Windows, Role::Etcd)
        .with_machine("m1");
    assert!(role.to_string().starts_with("machine m1: role etcd"));
}

#[test]
fn error_chain_includes_parse_detail() {
    let err = PlannerError::DesiredVersion(version_error());
    let chain = format_err_chain(&err);
    assert!(chain.starts_with("invalid desired version: invalid distribution version \"v1.x\""));
}
