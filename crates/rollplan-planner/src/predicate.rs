//! Targeting predicates over plan entries.
//!
//! A predicate is any `Fn(&PlanEntry) -> bool`. Base predicates are plain
//! functions; combinators take predicates and return new closures. None of
//! them fail: an absent label reads as false.

use rollplan_core::labels;
use rollplan_core::Role;

use crate::entry::PlanEntry;

pub fn is_windows(entry: &PlanEntry<'_>) -> bool {
    entry.label(labels::OS_LABEL) == Some(labels::WINDOWS)
}

/// Role label present and set to a truthy value.
pub fn has_role(role: Role) -> impl Fn(&PlanEntry<'_>) -> bool {
    move |entry: &PlanEntry<'_>| entry.label(role.label_key()).is_some_and(labels::is_truthy)
}

pub fn is_etcd(entry: &PlanEntry<'_>) -> bool {
    has_role(Role::Etcd)(entry)
}

pub fn is_control_plane(entry: &PlanEntry<'_>) -> bool {
    has_role(Role::ControlPlane)(entry)
}

pub fn is_worker(entry: &PlanEntry<'_>) -> bool {
    has_role(Role::Worker)(entry)
}

/// Runs the cluster datastore or API server.
pub fn is_server(entry: &PlanEntry<'_>) -> bool {
    is_etcd(entry) || is_control_plane(entry)
}

pub fn not<P>(predicate: P) -> impl Fn(&PlanEntry<'_>) -> bool
where
    P: Fn(&PlanEntry<'_>) -> bool,
{
    move |entry: &PlanEntry<'_>| !predicate(entry)
}

pub fn any_role(entry: &PlanEntry<'_>) -> bool {
    Role::ALL.into_iter().any(|role| has_role(role)(entry))
}

/// A non-Windows machine with at least one role.
pub fn any_role_excluding_windows(entry: &PlanEntry<'_>) -> bool {
    not(is_windows)(entry) && any_role(entry)
}
