//! Parsers for the kubectl feeds
//!
//! Two independently-shaped inputs: whitespace-delimited tabular text
//! (deployments, HPAs, top samples) and structured JSON records (pods,
//! nodes, disruption budgets). Tabular parsing is row-tolerant; JSON
//! decoding is all-or-nothing per feed.

mod records;
mod tabular;

pub use records::{parse_node_list, parse_pdb_list, parse_pod_list};
pub use tabular::{
    parse_deployments, parse_hpas, parse_resource_samples, TabularOutcome,
};
