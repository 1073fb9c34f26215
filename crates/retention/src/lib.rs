//! Retention policies for snapshot histories
//!
//! This crate provides:
//! - The closed set of policy types and their parameter schemas
//! - Policy evaluation (which snapshots to prune)
//! - The codec between policies and their configuration strings

pub mod buckets;
pub mod codec;
pub mod policy;
pub mod policy_type;

// Re-exports
pub use codec::RetentionPolicyCodec;
pub use policy::RetentionPolicy;
pub use policy_type::{ParamSpec, RetentionPolicyType};
