use rollplan_core::{DistroVersion, MachineRecord};

use crate::error::PlannerError;

/// The lowest version running anywhere in the fleet, and who runs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorVersion {
    pub machine: String,
    pub version: DistroVersion,
}

/// The version a machine reports. Blank means not yet reported.
pub fn observed_version(machine: &MachineRecord) -> Result<Option<DistroVersion>, PlannerError> {
    match machine.observed_version.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => DistroVersion::parse(raw)
            .map(Some)
            .map_err(|source| PlannerError::ObservedVersion {
                machine: machine.id.clone(),
                source,
            }),
    }
}

/// Minimum observed version across the fleet, `None` when nobody has
/// reported one.
///
/// Machines whose version does not parse are left out here; they fail on
/// their own when planned. Ties fall back to the declared string and then
/// the machine id, so input order never changes the answer.
pub fn lowest_observed_version<'a, I>(machines: I) -> Option<FloorVersion>
where
    I: IntoIterator<Item = &'a MachineRecord>,
{
    machines
        .into_iter()
        .filter_map(|machine| match observed_version(machine) {
            Ok(Some(version)) => Some(FloorVersion {
                machine: machine.id.clone(),
                version,
            }),
            _ => None,
        })
        .min_by(|a, b| {
            a.version
                .cmp(&b.version)
                .then_with(|| a.version.as_str().cmp(b.version.as_str()))
                .then_with(|| a.machine.cmp(&b.machine))
        })
}
