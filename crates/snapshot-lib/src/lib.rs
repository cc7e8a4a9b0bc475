//! Core library for kube-snapshot
//!
//! This crate provides the correlation and utilization engine behind the
//! kube-snapshot CLI:
//! - Parsers for the kubectl tabular and JSON feeds
//! - Join-key derivation from pod naming conventions
//! - Correlation of pods with HPAs, deployments, nodes and disruption budgets
//! - Utilization aggregation (usage percentages, totals, startup durations)

pub mod correlate;
pub mod error;
pub mod keys;
pub mod models;
pub mod parse;
pub mod provider;
pub mod snapshot;
pub mod units;
pub mod usage;

pub use error::SnapshotError;
pub use models::*;
pub use provider::{ClusterProvider, KubectlProvider};
pub use snapshot::{SkippedLines, Snapshot, SnapshotOptions};
pub use usage::PodGroup;
