//! Available retention policy types

use crate::RetentionPolicy;
use snap_core::{Result, SnapshotError};
use std::collections::HashMap;
use std::fmt;

/// Description of one policy parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Smallest accepted value
    pub min: u32,
}

/// The closed set of retention policy types
///
/// Adding a type means adding a variant here and in [`RetentionPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetentionPolicyType {
    /// Keep the N most recent snapshots
    Fixed,
    /// Keep today's snapshots plus one per day for N days
    Daily,
    /// Grandfather-father-son rotation
    Gfs,
}

const FIXED_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "count",
    description: "number of most recent snapshots to keep",
    min: 1,
}];

const DAILY_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "days",
    description: "number of previous days to keep one snapshot for",
    min: 1,
}];

impl RetentionPolicyType {
    const ALL: [RetentionPolicyType; 3] = [
        RetentionPolicyType::Fixed,
        RetentionPolicyType::Daily,
        RetentionPolicyType::Gfs,
    ];

    /// Types that can be configured
    pub fn available() -> &'static [RetentionPolicyType] {
        &Self::ALL
    }

    /// Key used in configuration strings
    pub fn key(self) -> &'static str {
        match self {
            RetentionPolicyType::Fixed => "fixed",
            RetentionPolicyType::Daily => "daily",
            RetentionPolicyType::Gfs => "gfs",
        }
    }

    pub fn params(self) -> &'static [ParamSpec] {
        match self {
            RetentionPolicyType::Fixed => FIXED_PARAMS,
            RetentionPolicyType::Daily => DAILY_PARAMS,
            RetentionPolicyType::Gfs => &[],
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RetentionPolicyType::Fixed => "Keep only the most recent snapshots",
            RetentionPolicyType::Daily => {
                "Keep all of today's snapshots and the latest snapshot of each previous day"
            }
            RetentionPolicyType::Gfs => {
                "Keep today's snapshots, daily for a week, weekly for a month, then monthly"
            }
        }
    }

    /// Build a policy from validated parameter values
    ///
    /// A parameter missing from `values` is a decode error against `config`.
    pub(crate) fn build(self, config: &str, values: &HashMap<&'static str, u32>) -> Result<RetentionPolicy> {
        let value = |name: &str| {
            values.get(name).copied().ok_or_else(|| {
                let description = self
                    .params()
                    .iter()
                    .find(|spec| spec.name == name)
                    .map_or("", |spec| spec.description);
                SnapshotError::policy_decode(config, format!("missing parameter '{}' ({})", name, description))
            })
        };
        let policy = match self {
            RetentionPolicyType::Fixed => RetentionPolicy::Fixed {
                count: value("count")?,
            },
            RetentionPolicyType::Daily => RetentionPolicy::Daily {
                days: value("days")?,
            },
            RetentionPolicyType::Gfs => RetentionPolicy::Gfs,
        };
        Ok(policy)
    }
}

impl fmt::Display for RetentionPolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
