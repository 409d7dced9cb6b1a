use rollplan_core::DistroVersion;
use rollplan_planner::version::FloorVersion;
use rollplan_planner::{MinorSkewPolicy, SkewDecision, SkewPolicy};

fn v(raw: &str) -> DistroVersion {
    DistroVersion::parse(raw).unwrap()
}

fn floor(raw: &str) -> FloorVersion {
    FloorVersion {
        machine: "oldest".into(),
        version: v(raw),
    }
}

#[test]
fn one_minor_ahead_is_allowed() {
    let policy = MinorSkewPolicy::new(1);
    let decision = policy.evaluate(
        &v("v1.26.1+rke2r1"),
        Some(&floor("v1.25.7+rke2r1")),
        Some(&v("v1.25.7+rke2r1")),
    );
    assert_eq!(decision, SkewDecision::Allow);
}

#[test]
fn two_minors_ahead_is_held() {
    let policy = MinorSkewPolicy::new(1);
    let decision = policy.evaluate(
        &v("v1.27.0+rke2r1"),
        Some(&floor("v1.25.7+rke2r1")),
        Some(&v("v1.26.3+rke2r1")),
    );
    match decision {
        SkewDecision::Hold(reason) => assert!(reason.contains("oldest")),
        other => panic!("expected hold, got {other:?}"),
    }

    let relaxed = MinorSkewPolicy::new(2);
    assert_eq!(
        relaxed.evaluate(&v("v1.27.0+rke2r1"), Some(&floor("v1.25.7+rke2r1")), None),
        SkewDecision::Allow
    );
}

#[test]
fn unlimited_skew_does_not_overflow() {
    let policy = MinorSkewPolicy::new(u64::MAX);
    let decision = policy.evaluate(
        &v("v1.25.7+rke2r1"),
        Some(&floor("v1.24.0+rke2r1")),
        Some(&v("v1.24.0+rke2r1")),
    );
    assert_eq!(decision, SkewDecision::Allow);
}

#[test]
fn major_change_is_held() {
    let policy = MinorSkewPolicy::new(5);
    let decision = policy.evaluate(&v("v2.0.0+rke2r1"), Some(&floor("v1.25.7+rke2r1")), None);
    assert!(matches!(decision, SkewDecision::Hold(_)));
}

#[test]
fn downgrade_is_held() {
    let policy = MinorSkewPolicy::new(1);
    let decision = policy.evaluate(&v("v1.25.6+rke2r1"), None, Some(&v("v1.25.7+rke2r1")));
    assert!(matches!(decision, SkewDecision::Hold(_)));
}

#[test]
fn empty_fleet_is_allowed() {
    let policy = MinorSkewPolicy::new(0);
    assert_eq!(
        policy.evaluate(&v("v1.25.7+rke2r1"), None, None),
        SkewDecision::Allow
    );
}

#[test]
fn release_candidate_to_release_is_allowed() {
    let policy = MinorSkewPolicy::new(0);
    assert_eq!(
        policy.evaluate(
            &v("v1.21.3+k3s1"),
            Some(&floor("v1.21.3-rc1+k3s1")),
            Some(&v("v1.21.3-rc1+k3s1")),
        ),
        SkewDecision::Allow
    );
}
