use rollplan_core::DistroVersion;

use crate::version::FloorVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkewDecision {
    Allow,
    Hold(String),
}

/// Decides whether a machine may move to the desired version given what
/// the rest of the fleet runs.
pub trait SkewPolicy: Send + Sync {
    fn evaluate(
        &self,
        desired: &DistroVersion,
        floor: Option<&FloorVersion>,
        observed: Option<&DistroVersion>,
    ) -> SkewDecision;
}

/// Holds a step that would leave the fleet floor more than `max_minor_skew`
/// minor releases behind, crosses a major release, or downgrades.
#[derive(Debug, Clone)]
pub struct MinorSkewPolicy {
    max_minor_skew: u64,
}

impl MinorSkewPolicy {
    pub fn new(max_minor_skew: u64) -> Self {
        Self { max_minor_skew }
    }
}

impl SkewPolicy for MinorSkewPolicy {
    fn evaluate(
        &self,
        desired: &DistroVersion,
        floor: Option<&FloorVersion>,
        observed: Option<&DistroVersion>,
    ) -> SkewDecision {
        if let Some(observed) = observed.filter(|o| *o > desired) {
            return SkewDecision::Hold(format!(
                "downgrade from {observed} to {desired} is not supported"
            ));
        }

        let Some(floor) = floor else {
            return SkewDecision::Allow;
        };

        if floor.version.major() != desired.major() {
            return SkewDecision::Hold(format!(
                "{desired} crosses a major release from fleet floor {} on {}",
                floor.version, floor.machine
            ));
        }

        if desired.minor() > floor.version.minor().saturating_add(self.max_minor_skew) {
            return SkewDecision::Hold(format!(
                "{desired} is more than {} minor release(s) ahead of fleet floor {} on {}",
                self.max_minor_skew, floor.version, floor.machine
            ));
        }

        SkewDecision::Allow
    }
}
