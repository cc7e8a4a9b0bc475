//! Strict whole-feed decoding of the structured JSON payloads
//!
//! Each feed is a top-level wrapper holding an ordered item list. Unknown
//! fields are ignored and missing fields default, but a payload that fails
//! to decode is fatal for that retrieval: partial decoding of a malformed
//! feed is not attempted.

use crate::error::SnapshotError;
use crate::models::{NodeList, PdbList, PodList};

/// Decode the pods feed.
pub fn parse_pod_list(payload: &str) -> Result<PodList, SnapshotError> {
    serde_json::from_str(payload).map_err(|source| SnapshotError::Decode {
        feed: "pods",
        source,
    })
}

/// Decode the nodes feed.
pub fn parse_node_list(payload: &str) -> Result<NodeList, SnapshotError> {
    serde_json::from_str(payload).map_err(|source| SnapshotError::Decode {
        feed: "nodes",
        source,
    })
}

/// Decode the disruption-budgets feed.
pub fn parse_pdb_list(payload: &str) -> Result<PdbList, SnapshotError> {
    serde_json::from_str(payload).map_err(|source| SnapshotError::Decode {
        feed: "disruption budgets",
        source,
    })
}
