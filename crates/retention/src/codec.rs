//! Configuration string codec for retention policies
//!
//! Format: `<type-key>[ <param>=<value>]*`, e.g. `fixed count=10` or `gfs`.
//! An empty or unset string means no policy.

use crate::{RetentionPolicy, RetentionPolicyType};
use snap_core::{Result, SnapshotError};
use std::collections::HashMap;

/// Decodes and encodes retention policy configuration strings
#[derive(Debug, Clone, Copy, Default)]
pub struct RetentionPolicyCodec;

impl RetentionPolicyCodec {
    pub const INSTANCE: RetentionPolicyCodec = RetentionPolicyCodec;

    /// Decode a configuration string
    ///
    /// Returns `Ok(None)` when `config` is unset or blank. Any other input must
    /// name one of `available` and supply every parameter of that type.
    pub fn decode_policy(
        &self,
        available: &[RetentionPolicyType],
        config: Option<&str>,
    ) -> Result<Option<RetentionPolicy>> {
        let Some(raw) = config.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let mut tokens = raw.split_whitespace();
        let key = tokens.next().unwrap_or_default();
        let policy_type = available
            .iter()
            .copied()
            .find(|ty| ty.key() == key)
            .ok_or_else(|| {
                let known: Vec<_> = available.iter().map(|ty| ty.key()).collect();
                SnapshotError::policy_decode(
                    raw,
                    format!(
                        "unknown retention policy type '{}' (expected one of: {})",
                        key,
                        known.join(", ")
                    ),
                )
            })?;

        let mut values: HashMap<&'static str, u32> = HashMap::new();
        for token in tokens {
            let (name, value) = token.split_once('=').ok_or_else(|| {
                SnapshotError::policy_decode(raw, format!("expected name=value, got '{}'", token))
            })?;

            let spec = policy_type
                .params()
                .iter()
                .find(|spec| spec.name == name)
                .ok_or_else(|| {
                    SnapshotError::policy_decode(
                        raw,
                        format!("'{}' does not take a parameter named '{}'", key, name),
                    )
                })?;

            let parsed: u32 = value.parse().map_err(|_| {
                SnapshotError::policy_decode(
                    raw,
                    format!("{} must be a non-negative integer, got '{}'", name, value),
                )
            })?;
            if parsed < spec.min {
                return Err(SnapshotError::policy_decode(
                    raw,
                    format!("{} must be at least {}", name, spec.min),
                ));
            }

            if values.insert(spec.name, parsed).is_some() {
                return Err(SnapshotError::policy_decode(
                    raw,
                    format!("parameter '{}' given more than once", name),
                ));
            }
        }

        let policy = policy_type.build(raw, &values)?;
        tracing::debug!(policy = %policy, "Decoded retention policy");
        Ok(Some(policy))
    }

    /// Encode a policy as a configuration string
    pub fn encode_policy(&self, policy: &RetentionPolicy) -> String {
        policy.to_string()
    }
}
