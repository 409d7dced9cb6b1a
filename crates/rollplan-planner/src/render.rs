//! Control-plane component argument and mount rendering.

use rollplan_core::Runtime;
use serde_json::Value;

pub const CERT_DIR_ARGUMENT: &str = "cert-dir";
pub const TLS_CERT_FILE_ARGUMENT: &str = "tls-cert-file";
pub const SECURE_PORT_ARGUMENT: &str = "secure-port";

pub const KUBE_CONTROLLER_MANAGER_SECURE_PORT: &str = "10257";
pub const KUBE_CONTROLLER_MANAGER_CERT_DIR: &str =
    "/var/lib/rancher/%s/server/tls/kube-controller-manager";
pub const KUBE_SCHEDULER_SECURE_PORT: &str = "10259";
pub const KUBE_SCHEDULER_CERT_DIR: &str = "/var/lib/rancher/%s/server/tls/kube-scheduler";

/// Components whose serving certificates the planner places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    KubeControllerManager,
    KubeScheduler,
}

impl Component {
    pub const ALL: [Component; 2] = [Component::KubeControllerManager, Component::KubeScheduler];

    pub fn name(&self) -> &'static str {
        match self {
            Self::KubeControllerManager => "kube-controller-manager",
            Self::KubeScheduler => "kube-scheduler",
        }
    }

    /// Config key holding extra arguments, e.g. `kube-scheduler-arg`.
    pub fn arg_key(&self) -> String {
        format!("{}-arg", self.name())
    }

    pub fn mount_key(&self) -> String {
        format!("{}-extra-mount", self.name())
    }

    pub fn secure_port(&self) -> &'static str {
        match self {
            Self::KubeControllerManager => KUBE_CONTROLLER_MANAGER_SECURE_PORT,
            Self::KubeScheduler => KUBE_SCHEDULER_SECURE_PORT,
        }
    }

    pub fn cert_dir_template(&self) -> &'static str {
        match self {
            Self::KubeControllerManager => KUBE_CONTROLLER_MANAGER_CERT_DIR,
            Self::KubeScheduler => KUBE_SCHEDULER_CERT_DIR,
        }
    }
}

/// A config value that may be a single string, a list, or absent.
///
/// Entries are kept verbatim and in order; non-string list items keep
/// their JSON text.
pub fn normalize_args(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(other) => vec![other.to_string()],
    }
}

/// Render a component's arguments and host mounts.
///
/// A `cert-dir` built from `cert_dir_template` is appended unless the
/// existing arguments already set `cert-dir` or `tls-cert-file` to a
/// non-empty value. `secure-port` is always appended last. K3s runs the
/// components in its own process, so only RKE2 gets a mount, mapping the
/// certificate directory onto itself.
pub fn render_component_args_and_mounts(
    existing_args: Option<&Value>,
    existing_mounts: Option<&Value>,
    runtime: Runtime,
    secure_port: &str,
    cert_dir_template: &str,
) -> (Vec<String>, Vec<String>) {
    let mut args = normalize_args(existing_args);

    let mut cert_dir = None;
    let mut tls_cert_file = None;
    for arg in &args {
        let Some((key, value)) = arg.split_once('=') else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        match key {
            CERT_DIR_ARGUMENT => cert_dir = Some(value.to_string()),
            TLS_CERT_FILE_ARGUMENT => tls_cert_file = Some(value.to_string()),
            _ => {}
        }
    }

    let default_cert_dir = cert_dir_template.replace("%s", runtime.as_str());
    if cert_dir.is_none() && tls_cert_file.is_none() {
        args.push(format!("{CERT_DIR_ARGUMENT}={default_cert_dir}"));
    }
    args.push(format!("{SECURE_PORT_ARGUMENT}={secure_port}"));

    if !runtime.containerized_components() {
        return (args, Vec::new());
    }

    let dir = match (&tls_cert_file, &cert_dir) {
        (Some(file), _) => parent_dir(file).to_string(),
        (None, Some(dir)) => dir.clone(),
        (None, None) => default_cert_dir,
    };
    let mut mounts = normalize_args(existing_mounts);
    mounts.push(format!("{dir}:{dir}"));
    (args, mounts)
}

/// Everything before the last `/`. A file directly under the root, or a
/// bare file name, resolves to `/`.
fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}
