use rollplan_core::{ClusterSpec, GenericMap};

use crate::entry::PlanEntry;

/// The cluster's global machine config overlaid by every selector entry
/// matching this machine, in declaration order. Later entries win per key.
///
/// Selectors see the entry's labels, so they can target stamped role and OS
/// labels as well as the machine's own.
pub fn resolve_machine_config(cluster: &ClusterSpec, entry: &PlanEntry<'_>) -> GenericMap {
    let mut config = cluster.machine_global_config.clone();
    for selector in &cluster.machine_selector_config {
        if selector.matches(&entry.labels) {
            for (key, value) in &selector.config {
                config.insert(key.clone(), value.clone());
            }
        }
    }
    config
}
