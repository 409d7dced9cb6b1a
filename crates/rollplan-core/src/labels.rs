//! Label keys stamped onto plan entries.
//!
//! Predicates read these instead of the machine record so that every
//! targeting decision goes through one normalized label set.

pub const OS_LABEL: &str = "rollplan.io/os";

pub const ETCD_ROLE_LABEL: &str = "rollplan.io/etcd-role";

pub const CONTROL_PLANE_ROLE_LABEL: &str = "rollplan.io/control-plane-role";

pub const WORKER_ROLE_LABEL: &str = "rollplan.io/worker-role";

pub const LINUX: &str = "linux";

pub const WINDOWS: &str = "windows";

/// Role labels hold `"true"` or `"false"`; anything else counts as unset.
pub fn is_truthy(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
