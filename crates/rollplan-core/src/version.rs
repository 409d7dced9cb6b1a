use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A Kubernetes distribution version, e.g. `v1.25.7+rke2r1` or
/// `v1.21.3-rc1+k3s1`.
///
/// Ordering is semver precedence on the core and prerelease (a prerelease
/// sorts below its release). The build tag only breaks ties between
/// otherwise equal versions and is compared as a plain string.
#[derive(Debug, Clone)]
pub struct DistroVersion {
    raw: String,
    parsed: semver::Version,
}

impl DistroVersion {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let parsed = semver::Version::parse(body).map_err(|e| CoreError::InvalidVersion {
            version: raw.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            raw: trimmed.to_string(),
            parsed,
        })
    }

    /// The version exactly as it was declared.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn major(&self) -> u64 {
        self.parsed.major
    }

    pub fn minor(&self) -> u64 {
        self.parsed.minor
    }

    pub fn patch(&self) -> u64 {
        self.parsed.patch
    }

    pub fn prerelease(&self) -> &str {
        self.parsed.pre.as_str()
    }

    /// Distribution build tag, e.g. `rke2r1`. Empty when absent.
    pub fn build(&self) -> &str {
        self.parsed.build.as_str()
    }

    /// Image tags cannot carry `+`, so the build separator becomes `-`.
    pub fn image_tag(&self) -> String {
        self.raw.replace('+', "-")
    }

    /// Compare core and prerelease only, ignoring the build tag.
    pub fn release_cmp(&self, other: &Self) -> Ordering {
        let a = &self.parsed;
        let b = &other.parsed;
        (a.major, a.minor, a.patch)
            .cmp(&(b.major, b.minor, b.patch))
            .then_with(|| a.pre.cmp(&b.pre))
    }

    pub fn same_release(&self, other: &Self) -> bool {
        self.release_cmp(other) == Ordering::Equal
    }
}

impl Ord for DistroVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release_cmp(other)
            .then_with(|| self.build().cmp(other.build()))
    }
}

impl PartialOrd for DistroVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DistroVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DistroVersion {}

impl fmt::Display for DistroVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DistroVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DistroVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for DistroVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
