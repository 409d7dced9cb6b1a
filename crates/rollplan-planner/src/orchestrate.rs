use std::collections::{BTreeMap, HashMap};

use rollplan_core::{ClusterSpec, DistroVersion, MachineRecord, NodePlan, Runtime};
use rollplan_storage::{plan_changed, PlanAddr, PlanRecord, PlanStore};
use tracing::Instrument;

use crate::entry::PlanEntry;
use crate::error::{format_err_chain, ErrorScope, PlannerError};
use crate::planner::Planner;
use crate::predicate::any_role;
use crate::report::{Action, MachinePlan, PassReport};
use crate::rollout::{init_machine, join_url, servers_ready, Admission, Tier};
use crate::skew::SkewDecision;
use crate::version::{lowest_observed_version, observed_version};

/// A machine that passed every gate except concurrency.
struct Candidate<'a> {
    entry: PlanEntry<'a>,
    observed: Option<DistroVersion>,
    needs_upgrade: bool,
    is_init: bool,
}

impl Planner {
    /// Compute the plan for every machine in a cluster.
    ///
    /// Reads the store but never writes to it. Cluster-scoped failures
    /// abort the pass; machine-scoped ones are reported per machine.
    pub async fn plan(
        &self,
        cluster: &ClusterSpec,
        machines: &[MachineRecord],
        store: &dyn PlanStore,
    ) -> Result<PassReport, PlannerError> {
        let span = tracing::info_span!(
            "planning_pass",
            cluster = %cluster.name,
            pass_id = %uuid::Uuid::new_v4(),
        );
        self.plan_inner(cluster, machines, store)
            .instrument(span)
            .await
    }

    async fn plan_inner(
        &self,
        cluster: &ClusterSpec,
        machines: &[MachineRecord],
        store: &dyn PlanStore,
    ) -> Result<PassReport, PlannerError> {
        let desired = cluster
            .desired_version()
            .map_err(PlannerError::DesiredVersion)?;
        let runtime = Runtime::from_version(&desired);

        let mut sorted: Vec<&MachineRecord> = machines.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(PlannerError::DuplicateMachine(pair[0].id.clone()));
        }

        let floor = lowest_observed_version(sorted.iter().copied());
        let init = init_machine(sorted.iter().copied());
        let init_url = init.and_then(|m| join_url(runtime, m));
        let servers_upgraded = servers_ready(&sorted, &desired);

        // Read every stored record up front: a store failure aborts the
        // pass before any decision is made.
        let mut stored: HashMap<String, PlanRecord> = HashMap::new();
        for &machine in &sorted {
            let addr = PlanAddr::new(&cluster.name, &machine.id);
            if let Some(record) = store.get(&addr).await? {
                stored.insert(machine.id.clone(), record);
            }
        }

        tracing::info!(
            desired = %desired,
            floor = floor.as_ref().map(|f| f.version.to_string()),
            machines = sorted.len(),
            "planning cluster"
        );

        let mut decided: BTreeMap<String, MachinePlan> = BTreeMap::new();
        let mut candidates: Vec<Candidate<'_>> = Vec::new();

        for &machine in &sorted {
            let addr = PlanAddr::new(&cluster.name, &machine.id);
            let previous = stored.get(&machine.id).cloned();
            let entry = PlanEntry::new(machine);

            let decide = |action, reason: String| {
                MachinePlan::new(addr.clone(), action, reason).with_previous(previous.clone())
            };

            if !any_role(&entry) {
                decided.insert(
                    machine.id.clone(),
                    decide(Action::Skip, "machine has no roles".into()),
                );
                continue;
            }

            let gated = self
                .check_roles(&entry)
                .and_then(|()| observed_version(machine));
            let observed = match gated {
                Ok(observed) => observed,
                Err(e) => {
                    let e = e.with_machine(&machine.id);
                    tracing::warn!(machine = %machine.id, error = %format_err_chain(&e), "machine failed");
                    decided.insert(
                        machine.id.clone(),
                        decide(Action::Fail, format_err_chain(&e)),
                    );
                    continue;
                }
            };

            let needs_upgrade = observed.as_ref() != Some(&desired);
            let tier = Tier::of(machine);

            if needs_upgrade {
                if let SkewDecision::Hold(reason) =
                    self.skew
                        .evaluate(&desired, floor.as_ref(), observed.as_ref())
                {
                    decided.insert(machine.id.clone(), decide(Action::Hold, reason));
                    continue;
                }
                if tier == Tier::Agent && !servers_upgraded {
                    decided.insert(
                        machine.id.clone(),
                        decide(
                            Action::Hold,
                            format!("waiting for servers to reach {desired}"),
                        ),
                    );
                    continue;
                }
            }

            let is_init = init.is_some_and(|i| i.id == machine.id);
            let join = match (is_init, init, &init_url) {
                (true, _, _) => None,
                (false, Some(_), Some(url)) => Some(url.clone()),
                (false, Some(i), None) => {
                    decided.insert(
                        machine.id.clone(),
                        decide(
                            Action::Hold,
                            format!("waiting for init machine {} to report an address", i.id),
                        ),
                    );
                    continue;
                }
                (false, None, _) => {
                    decided.insert(
                        machine.id.clone(),
                        decide(
                            Action::Hold,
                            "no etcd machine can initialize the cluster".into(),
                        ),
                    );
                    continue;
                }
            };

            candidates.push(Candidate {
                entry: entry.with_join_url(join),
                observed,
                needs_upgrade,
                is_init,
            });
        }

        let init_id = init.map(|m| m.id.as_str());
        let init_stored = init_id.is_some_and(|id| stored.contains_key(id));

        // Upgrades already handed out keep their slot, but only once the init
        // machine has a plan: a joiner cannot start before it.
        let in_flight = |tier: Tier| {
            if !init_stored {
                return 0;
            }
            candidates
                .iter()
                .filter(|c| c.needs_upgrade && Tier::of(c.entry.machine) == tier)
                .filter(|c| {
                    stored
                        .get(c.entry.id())
                        .is_some_and(|r| r.target_version == desired.as_str())
                })
                .count()
        };
        let mut admissions: HashMap<Tier, Admission> = HashMap::from([
            (
                Tier::Server,
                Admission::new(self.config.control_plane_concurrency, in_flight(Tier::Server)),
            ),
            (
                Tier::Agent,
                Admission::new(self.config.worker_concurrency, in_flight(Tier::Agent)),
            ),
        ]);

        // The init machine is admitted ahead of every other server.
        candidates.sort_by_key(|c| !c.is_init);
        let mut init_planned = init_stored;

        for mut candidate in candidates {
            let machine = candidate.entry.machine;
            let addr = PlanAddr::new(&cluster.name, &machine.id);
            let previous = stored.get(&machine.id).cloned();

            if let Some(init_id) = init_id.filter(|_| !candidate.is_init && !init_planned) {
                decided.insert(
                    machine.id.clone(),
                    MachinePlan::new(
                        addr,
                        Action::Hold,
                        format!("waiting for init machine {init_id} to receive a plan"),
                    )
                    .with_previous(previous),
                );
                continue;
            }

            if candidate.needs_upgrade {
                let already = previous
                    .as_ref()
                    .is_some_and(|r| r.target_version == desired.as_str());
                // A cluster that has never been bootstrapped always lets its
                // init machine through.
                let bootstrap = candidate.is_init && !init_stored;
                let tier = Tier::of(machine);
                let admitted = already
                    || admissions
                        .get_mut(&tier)
                        .is_none_or(|admission| admission.try_admit())
                    || bootstrap;
                if !admitted {
                    decided.insert(
                        machine.id.clone(),
                        MachinePlan::new(addr, Action::Hold, "waiting for an upgrade slot")
                            .with_previous(previous),
                    );
                    continue;
                }
            }

            let built = self.build_node_plan(
                cluster,
                &desired,
                &mut candidate.entry,
                candidate.observed.as_ref(),
            );
            let plan_entry = match built {
                Ok(plan) => compare(addr, plan, previous),
                Err(e) if e.scope() == ErrorScope::Machine => {
                    let e = e.with_machine(&machine.id);
                    tracing::warn!(machine = %machine.id, error = %format_err_chain(&e), "machine failed");
                    MachinePlan::new(addr, Action::Fail, format_err_chain(&e))
                        .with_previous(previous)
                }
                Err(e) => return Err(e),
            };
            if candidate.is_init {
                init_planned = plan_entry.plan.is_some();
            }
            decided.insert(machine.id.clone(), plan_entry);
        }

        let report = PassReport {
            cluster: cluster.name.clone(),
            desired_version: desired.to_string(),
            floor_version: floor.as_ref().map(|f| f.version.to_string()),
            floor_machine: floor.map(|f| f.machine),
            machines: decided.into_values().collect(),
        };

        tracing::info!(
            apply = report.count(Action::Apply),
            unchanged = report.count(Action::Unchanged),
            hold = report.count(Action::Hold),
            skip = report.count(Action::Skip),
            fail = report.count(Action::Fail),
            "planning pass complete"
        );
        Ok(report)
    }
}

fn compare(addr: PlanAddr, plan: NodePlan, previous: Option<PlanRecord>) -> MachinePlan {
    let (action, reason) = match &previous {
        None => (Action::Apply, "no stored plan"),
        Some(_) if plan_changed(previous.as_ref(), &plan) => (Action::Apply, "plan changed"),
        Some(_) => (Action::Unchanged, "plan unchanged"),
    };
    MachinePlan::new(addr, action, reason)
        .with_plan(plan)
        .with_previous(previous)
}

/// Write every `Apply` entry of a report.
///
/// On the first failed write, every record already written by this call is
/// restored to what it held before (or removed if it did not exist) and the
/// write error is returned. Returns the number of records written.
pub async fn execute(report: &PassReport, store: &dyn PlanStore) -> Result<usize, PlannerError> {
    let mut written: Vec<&MachinePlan> = Vec::new();

    for entry in report.machines.iter().filter(|m| m.action == Action::Apply) {
        let Some(plan) = &entry.plan else {
            continue;
        };
        match store.put(&entry.addr, plan, &report.desired_version).await {
            Ok(record) => {
                tracing::info!(
                    addr = %entry.addr,
                    generation = record.generation,
                    "plan written"
                );
                written.push(entry);
            }
            Err(e) => {
                tracing::error!(addr = %entry.addr, error = %e, "plan write failed, rolling back");
                rollback(&written, store).await;
                return Err(e.into());
            }
        }
    }

    Ok(written.len())
}

async fn rollback(written: &[&MachinePlan], store: &dyn PlanStore) {
    for entry in written.iter().rev() {
        let restored = match &entry.previous {
            Some(record) => store
                .put(&entry.addr, &record.plan, &record.target_version)
                .await
                .map(|_| ()),
            None => store.delete(&entry.addr).await,
        };
        match restored {
            Ok(()) => tracing::info!(addr = %entry.addr, "plan rolled back"),
            Err(e) => tracing::error!(addr = %entry.addr, error = %e, "rollback failed"),
        }
    }
}
