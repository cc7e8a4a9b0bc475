//! Join-key derivation from pod naming conventions
//!
//! The tabular feeds carry no foreign key from a pod to the workload that
//! owns it, so the grouping key is inferred from the pod's own name. Three
//! patterns are tried in order: deployment-managed pods carry two generated
//! suffixes, stateful-set pods a single ordinal, and job pods a single
//! generated suffix. The pattern that fired is reported alongside the name,
//! so ambiguous derivations (workload names whose internal hyphens satisfy
//! an earlier pattern) stay observable instead of silently wrong.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::Pod;

/// Sentinel bucket for pods whose name matches no pattern.
pub const UNRESOLVED_WORKLOAD: &str = "<unresolved>";

/// Sentinel replica-set name for pods without owner references.
pub const NO_OWNER_REFERENCE: &str = "<no-references>";

/// Which naming pattern produced a derived workload name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePattern {
    /// `name-<replicaset-suffix>-<pod-suffix>`
    Deployment,
    /// `name-<ordinal>`
    StatefulSet,
    /// `name-<suffix>`, consulted only for Job-owned pods
    Job,
    /// No pattern matched.
    Unresolved,
}

/// A workload name inferred from a pod name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedName {
    pub name: String,
    pub pattern: NamePattern,
}

fn deployment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.*)-([^-]*)-([^-]*)").expect("valid deployment pattern"))
}

fn stateful_set_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.*)-(\d*)").expect("valid stateful-set pattern"))
}

fn job_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.*)-([^-]*)").expect("valid job pattern"))
}

/// Infer the owning workload's name from a pod's name.
///
/// Heuristic, not a guarantee: pattern order decides ambiguous names, and a
/// name matching nothing lands in the [`UNRESOLVED_WORKLOAD`] bucket rather
/// than failing the snapshot.
pub fn workload_name(pod: &Pod) -> DerivedName {
    let pod_name = &pod.metadata.name;
    if let Some(caps) = deployment_re().captures(pod_name) {
        return DerivedName {
            name: caps[1].to_string(),
            pattern: NamePattern::Deployment,
        };
    }
    if let Some(caps) = stateful_set_re().captures(pod_name) {
        return DerivedName {
            name: caps[1].to_string(),
            pattern: NamePattern::StatefulSet,
        };
    }
    let job_owned = pod
        .metadata
        .owner_references
        .first()
        .map(|r| r.kind == "Job")
        .unwrap_or(false);
    if job_owned {
        if let Some(caps) = job_re().captures(pod_name) {
            return DerivedName {
                name: caps[1].to_string(),
                pattern: NamePattern::Job,
            };
        }
    }
    DerivedName {
        name: UNRESOLVED_WORKLOAD.to_string(),
        pattern: NamePattern::Unresolved,
    }
}

/// The pod's replica-set name: its first owner reference, or the
/// [`NO_OWNER_REFERENCE`] sentinel.
pub fn replica_set_name(pod: &Pod) -> String {
    pod.metadata
        .owner_references
        .first()
        .map(|r| r.name.clone())
        .unwrap_or_else(|| NO_OWNER_REFERENCE.to_string())
}

/// `<namespace>|<derived workload name>`. The vertical bar cannot occur in
/// either part under Kubernetes naming rules.
pub fn workload_key(pod: &Pod) -> String {
    format!("{}|{}", pod.metadata.namespace, workload_name(pod).name)
}

/// `<namespace>|<replica-set name>`.
pub fn replica_set_key(pod: &Pod) -> String {
    format!("{}|{}", pod.metadata.namespace, replica_set_name(pod))
}
