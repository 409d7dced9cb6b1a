//! The service command line carried in the installer's exec variable.

use rollplan_core::{GenericMap, Runtime};
use serde_json::Value;

use crate::entry::PlanEntry;
use crate::predicate::{is_control_plane, is_etcd, is_server};
use crate::render::{render_component_args_and_mounts, Component};

/// Keys an agent would reject.
const SERVER_ONLY_KEYS: &[&str] = &[
    "cluster-cidr",
    "cluster-domain",
    "cni",
    "disable",
    "disable-cloud-controller",
    "etcd-expose-metrics",
    "etcd-snapshot-retention",
    "etcd-snapshot-schedule-cron",
    "kube-apiserver-arg",
    "secrets-encryption",
    "service-cidr",
    "tls-san",
];

const ETCD_ONLY_FLAGS: &[&str] = &[
    "--disable-apiserver",
    "--disable-controller-manager",
    "--disable-scheduler",
];

/// Tokens of the command line, `server` or `agent` first.
pub fn render_exec_args(runtime: Runtime, entry: &PlanEntry<'_>, config: &GenericMap) -> Vec<String> {
    let server = is_server(entry);
    let etcd = is_etcd(entry);
    let control_plane = is_control_plane(entry);

    let mut args = vec![if server { "server" } else { "agent" }.to_string()];

    if let Some(url) = &entry.join_url {
        args.push(flag("server", url));
    }

    if etcd && !control_plane {
        args.extend(ETCD_ONLY_FLAGS.iter().map(|f| f.to_string()));
    }
    if control_plane && !etcd {
        args.push("--disable-etcd".to_string());
    }

    let component_keys: Vec<String> = Component::ALL
        .iter()
        .flat_map(|c| [c.arg_key(), c.mount_key()])
        .collect();

    let mut entries: Vec<(&String, &Value)> = config.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (key, value) in entries {
        if component_keys.contains(key) {
            continue;
        }
        if !server && SERVER_ONLY_KEYS.contains(&key.as_str()) {
            continue;
        }
        render_value(&mut args, key, value);
    }

    if control_plane {
        for component in Component::ALL {
            let (component_args, mounts) = render_component_args_and_mounts(
                config.get(&component.arg_key()),
                config.get(&component.mount_key()),
                runtime,
                component.secure_port(),
                component.cert_dir_template(),
            );
            let arg_key = component.arg_key();
            args.extend(component_args.iter().map(|a| flag(&arg_key, a)));
            let mount_key = component.mount_key();
            args.extend(mounts.iter().map(|m| flag(&mount_key, m)));
        }
    }

    args
}

/// The command line as one string.
pub fn render_exec_command(runtime: Runtime, entry: &PlanEntry<'_>, config: &GenericMap) -> String {
    render_exec_args(runtime, entry, config).join(" ")
}

fn render_value(args: &mut Vec<String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(true) => args.push(format!("--{key}")),
        Value::Bool(false) => args.push(flag(key, "false")),
        Value::Number(n) => args.push(flag(key, &n.to_string())),
        Value::String(s) => args.push(flag(key, s)),
        Value::Array(items) => {
            for item in items {
                render_value(args, key, item);
            }
        }
        Value::Object(_) => args.push(flag(key, &value.to_string())),
    }
}

/// `--key=value`, quoting values that contain whitespace.
pub fn flag(key: &str, value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!("--{key}=\"{value}\"")
    } else {
        format!("--{key}={value}")
    }
}

/// An environment assignment in the target shell's syntax.
pub fn env_entry(windows: bool, name: &str, value: &str) -> String {
    if windows {
        format!("$env:{name}=\"{}\"", value.replace('"', "`\""))
    } else {
        format!("{name}={value}")
    }
}
