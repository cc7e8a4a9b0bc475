//! Typed entities for one cluster snapshot
//!
//! Pods, nodes and disruption budgets are serde-decoded from the JSON feeds;
//! deployments, HPAs and resource samples are built by the tabular parsers.
//! All entities are immutable once the snapshot is correlated.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::units;
use crate::usage;

/// Top-level wrapper for the pods JSON feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodList {
    #[serde(default)]
    pub items: Vec<Pod>,
}

/// A workload pod, optionally enriched with a live resource sample.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pod {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: PodSpec,
    #[serde(default)]
    pub status: PodStatus,
    /// Live top reading, attached after parsing. Absent if unavailable.
    #[serde(skip)]
    pub sample: Option<ResourceSample>,
}

/// Object metadata shared by pods and disruption budgets.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub owner_references: Vec<OwnerReference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lifecycle: Lifecycle,
    #[serde(default)]
    pub liveness_probe: Probe,
    #[serde(default)]
    pub readiness_probe: Probe,
    #[serde(default)]
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lifecycle {
    #[serde(default)]
    pub pre_stop: Handler,
}

/// An exec- or HTTP-backed action. Considered defined when it carries an
/// HTTP path or a command.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handler {
    #[serde(default)]
    pub exec: ExecAction,
    #[serde(default)]
    pub http_get: HttpGetAction,
}

impl Handler {
    pub fn is_defined(&self) -> bool {
        !self.http_get.path.is_empty() || !self.exec.command.is_empty()
    }

    /// Short human-readable form, e.g. `HttpGet: /healthz`.
    pub fn describe(&self) -> String {
        if !self.http_get.path.is_empty() {
            format!("HttpGet: {}", self.http_get.path)
        } else if !self.exec.command.is_empty() {
            format!("Exec: {}", self.exec.command.join(" "))
        } else {
            String::new()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecAction {
    #[serde(default)]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpGetAction {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    #[serde(default)]
    pub http_get: HttpGetAction,
    #[serde(default)]
    pub exec: ExecAction,
    #[serde(default)]
    pub failure_threshold: i32,
    #[serde(default)]
    pub initial_delay_seconds: i32,
    #[serde(default)]
    pub period_seconds: i32,
    #[serde(default)]
    pub success_threshold: i32,
    #[serde(default)]
    pub timeout_seconds: i32,
}

impl Probe {
    pub fn is_defined(&self) -> bool {
        !self.http_get.path.is_empty() || !self.exec.command.is_empty()
    }

    pub fn describe(&self) -> String {
        if !self.http_get.path.is_empty() {
            format!("HttpGet: {}", self.http_get.path)
        } else if !self.exec.command.is_empty() {
            format!("Exec: {}", self.exec.command.join(" "))
        } else {
            String::new()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default)]
    pub requests: ResourceQuantities,
    #[serde(default)]
    pub limits: ResourceQuantities,
}

/// Declared CPU/memory quantities, kept as the raw feed strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceQuantities {
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub memory: String,
}

impl ResourceQuantities {
    pub fn milli_cpu(&self) -> i64 {
        units::cpu_to_milli(&self.cpu)
    }

    pub fn mebi_memory(&self) -> i64 {
        units::memory_to_mebi(&self.memory)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub container_statuses: Vec<ContainerStatus>,
    #[serde(default)]
    pub phase: String,
}

/// A typed, timestamped status transition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub last_transition_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub condition_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatus {
    #[serde(default)]
    pub restart_count: i32,
}

impl Pod {
    /// `<namespace>|<name>`, the pod's unique key.
    pub fn pod_key(&self) -> String {
        format!("{}|{}", self.metadata.namespace, self.metadata.name)
    }

    pub fn requests_milli_cpu(&self) -> i64 {
        self.spec
            .containers
            .iter()
            .map(|c| c.resources.requests.milli_cpu())
            .sum()
    }

    pub fn requests_mebi_memory(&self) -> i64 {
        self.spec
            .containers
            .iter()
            .map(|c| c.resources.requests.mebi_memory())
            .sum()
    }

    pub fn limits_milli_cpu(&self) -> i64 {
        self.spec
            .containers
            .iter()
            .map(|c| c.resources.limits.milli_cpu())
            .sum()
    }

    pub fn limits_mebi_memory(&self) -> i64 {
        self.spec
            .containers
            .iter()
            .map(|c| c.resources.limits.mebi_memory())
            .sum()
    }

    /// Live CPU reading in millicores, zero when no sample is attached.
    pub fn sampled_milli_cpu(&self) -> i64 {
        self.sample.as_ref().map(|s| s.milli_cpu()).unwrap_or(0)
    }

    /// Live memory reading in mebibytes, zero when no sample is attached.
    pub fn sampled_mebi_memory(&self) -> i64 {
        self.sample.as_ref().map(|s| s.mebi_memory()).unwrap_or(0)
    }

    pub fn cpu_usage_percent(&self) -> f64 {
        usage::usage_percent(self.sampled_milli_cpu(), self.requests_milli_cpu())
    }

    pub fn memory_usage_percent(&self) -> f64 {
        usage::usage_percent(self.sampled_mebi_memory(), self.requests_mebi_memory())
    }

    pub fn restart_count(&self) -> i32 {
        self.status
            .container_statuses
            .iter()
            .map(|cs| cs.restart_count)
            .sum()
    }

    /// Time between the `PodScheduled` and `Ready` conditions turning true.
    ///
    /// Returns `None` when the value cannot represent a startup: any
    /// container restarted, either condition is absent, or the gap exceeds
    /// one hour (the pod likely went unhealthy and recovered).
    pub fn startup_duration(&self) -> Option<Duration> {
        if self.restart_count() > 0 {
            return None;
        }
        let ready = self.find_true_condition("Ready")?.last_transition_time?;
        let scheduled = self
            .find_true_condition("PodScheduled")?
            .last_transition_time?;
        let gap = ready - scheduled;
        if gap > Duration::hours(1) {
            return None;
        }
        Some(gap)
    }

    fn find_true_condition(&self, condition_type: &str) -> Option<&Condition> {
        self.status
            .conditions
            .iter()
            .find(|c| c.status == "True" && c.condition_type == condition_type)
    }

    /// `"defined/total"` count of containers with a liveness probe.
    pub fn count_liveness_probes(&self) -> String {
        self.count_containers(|c| c.liveness_probe.is_defined())
    }

    /// `"defined/total"` count of containers with a readiness probe.
    pub fn count_readiness_probes(&self) -> String {
        self.count_containers(|c| c.readiness_probe.is_defined())
    }

    /// `"defined/total"` count of containers with a pre-stop hook.
    pub fn count_prestop_hooks(&self) -> String {
        self.count_containers(|c| c.lifecycle.pre_stop.is_defined())
    }

    fn count_containers(&self, defined: impl Fn(&ContainerSpec) -> bool) -> String {
        let total = self.spec.containers.len();
        let count = self.spec.containers.iter().filter(|c| defined(c)).count();
        format!("{}/{}", count, total)
    }

    /// Per-container liveness probe dump, one `name {…}` entry per line.
    pub fn liveness_probe_summary(&self) -> String {
        self.summarize_containers(|c| c.liveness_probe.describe())
    }

    pub fn readiness_probe_summary(&self) -> String {
        self.summarize_containers(|c| c.readiness_probe.describe())
    }

    pub fn prestop_summary(&self) -> String {
        self.summarize_containers(|c| c.lifecycle.pre_stop.describe())
    }

    fn summarize_containers(&self, describe: impl Fn(&ContainerSpec) -> String) -> String {
        self.spec
            .containers
            .iter()
            .map(|c| format!("{} {{{}}}", c.name, describe(c)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Per-container live CPU/memory readings for one pod, accumulated from the
/// top feed.
#[derive(Debug, Clone, Default)]
pub struct ResourceSample {
    pub namespace: String,
    pub pod: String,
    pub containers: Vec<ContainerSample>,
}

#[derive(Debug, Clone, Default)]
pub struct ContainerSample {
    pub name: String,
    pub cpu: String,
    pub memory: String,
}

impl ResourceSample {
    /// Total sampled CPU across containers. The top feed always reports
    /// millicores, so only the `m` suffix is stripped.
    pub fn milli_cpu(&self) -> i64 {
        self.containers
            .iter()
            .map(|c| c.cpu.trim_end_matches('m').parse::<i64>().unwrap_or(0))
            .sum()
    }

    /// Total sampled memory across containers. The top feed always reports
    /// mebibytes, so only the leading digit run is read.
    pub fn mebi_memory(&self) -> i64 {
        self.containers
            .iter()
            .map(|c| {
                let digits_end = c
                    .memory
                    .find(|ch: char| !ch.is_ascii_digit())
                    .unwrap_or(c.memory.len());
                c.memory[..digits_end].parse::<i64>().unwrap_or(0)
            })
            .sum()
    }
}

/// A scalable workload row from the deployments feed, decorated with its
/// resolved pods and matched disruption budget.
#[derive(Debug, Clone, Default)]
pub struct Deployment {
    pub namespace: String,
    pub name: String,
    pub ready_replicas: i64,
    pub desired_replicas: i64,
    pub up_to_date: i64,
    pub available: i64,
    pub age: String,
    pub pods: Vec<Pod>,
    pub pdb: Option<Pdb>,
}

impl Deployment {
    /// `<namespace>|<name>`, the key HPAs and pod groups join against.
    pub fn key(&self) -> String {
        format!("{}|{}", self.namespace, self.name)
    }

    pub fn contains_pod(&self, pod_name: &str) -> bool {
        self.pods.iter().any(|p| p.metadata.name == pod_name)
    }
}

/// A scaling policy row from the HPA feed, decorated with the pods of its
/// referenced workload and matched disruption budget.
#[derive(Debug, Clone, Default)]
pub struct Hpa {
    pub namespace: String,
    pub name: String,
    pub reference_kind: String,
    pub reference_name: String,
    /// Current metric value; `None` is the `<unknown>` sentinel, distinct
    /// from a measured zero.
    pub current_usage: Option<i64>,
    pub target_percent: i64,
    pub min_replicas: i64,
    pub max_replicas: i64,
    pub replicas: i64,
    pub age: String,
    pub pods: Vec<Pod>,
    pub pdb: Option<Pdb>,
}

impl Hpa {
    /// `kind/name` of the scaled target.
    pub fn reference(&self) -> String {
        format!("{}/{}", self.reference_kind, self.reference_name)
    }

    /// `<namespace>|<reference name>`, the key deployments are matched on.
    pub fn target_key(&self) -> String {
        format!("{}|{}", self.namespace, self.reference_name)
    }

    /// `current/target` display form, e.g. `4%/80%` or `<unknown>/80%`.
    pub fn usage_and_target(&self) -> String {
        match self.current_usage {
            Some(usage) => format!("{}%/{}%", usage, self.target_percent),
            None => format!("<unknown>/{}%", self.target_percent),
        }
    }

    pub fn is_deployment(&self) -> bool {
        self.reference_kind == "Deployment"
    }

    pub fn refs_deployment(&self, deployment: &str) -> bool {
        self.is_deployment() && self.reference_name == deployment
    }

    pub fn contains_pod(&self, pod_name: &str) -> bool {
        self.pods.iter().any(|p| p.metadata.name == pod_name)
    }
}

/// Top-level wrapper for the nodes JSON feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeList {
    #[serde(default)]
    pub items: Vec<Node>,
}

/// A cluster node with its allocatable capacity and scheduled pods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub metadata: NodeMetadata,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(skip)]
    pub pods: Vec<Pod>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub labels: NodeLabels,
}

/// Pool/zone labels as emitted by GKE.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeLabels {
    #[serde(rename = "beta.kubernetes.io/instance-type", default)]
    pub instance_type: String,
    #[serde(rename = "cloud.google.com/gke-nodepool", default)]
    pub nodepool: String,
    #[serde(rename = "failure-domain.beta.kubernetes.io/zone", default)]
    pub zone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub allocatable: Allocatable,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Allocatable {
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub memory: String,
    #[serde(default)]
    pub pods: String,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn instance_type(&self) -> &str {
        &self.metadata.labels.instance_type
    }

    pub fn nodepool(&self) -> &str {
        &self.metadata.labels.nodepool
    }

    pub fn zone(&self) -> &str {
        &self.metadata.labels.zone
    }

    pub fn allocatable_milli_cpu(&self) -> i64 {
        units::cpu_to_milli(&self.status.allocatable.cpu)
    }

    pub fn allocatable_mebi_memory(&self) -> i64 {
        units::memory_to_mebi(&self.status.allocatable.memory)
    }

    pub fn allocatable_pods(&self) -> i64 {
        self.status.allocatable.pods.parse().unwrap_or(0)
    }
}

/// Top-level wrapper for the disruption-budgets JSON feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PdbList {
    #[serde(default)]
    pub items: Vec<Pdb>,
}

/// A pod disruption budget with its exact-match label selector.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pdb {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: PdbSpec,
    #[serde(default)]
    pub status: PdbStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdbSpec {
    #[serde(default)]
    pub min_available: i64,
    #[serde(default)]
    pub max_unavailable: i64,
    #[serde(default)]
    pub selector: LabelSelector,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default)]
    pub match_labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdbStatus {
    #[serde(default)]
    pub current_healthy: i64,
    #[serde(default)]
    pub desired_healthy: i64,
    #[serde(default)]
    pub disruptions_allowed: i64,
    #[serde(default)]
    pub expected_pods: i64,
}

impl Pdb {
    /// Exact-match conjunction: every selector label must be present on the
    /// pod with an equal value. An empty selector matches everything.
    pub fn matches(&self, labels: &HashMap<String, String>) -> bool {
        self.spec
            .selector
            .match_labels
            .iter()
            .all(|(k, v)| labels.get(k) == Some(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod_with_conditions(conditions: Vec<Condition>, restarts: i32) -> Pod {
        Pod {
            status: PodStatus {
                conditions,
                container_statuses: vec![ContainerStatus {
                    restart_count: restarts,
                }],
                phase: "Running".into(),
            },
            ..Pod::default()
        }
    }

    fn true_condition(condition_type: &str, rfc3339: &str) -> Condition {
        Condition {
            last_transition_time: Some(rfc3339.parse().unwrap()),
            status: "True".into(),
            condition_type: condition_type.into(),
        }
    }

    #[test]
    fn startup_duration_is_scheduled_to_ready_gap() {
        let pod = pod_with_conditions(
            vec![
                true_condition("PodScheduled", "2024-03-01T10:00:00Z"),
                true_condition("Ready", "2024-03-01T10:00:42Z"),
            ],
            0,
        );
        assert_eq!(pod.startup_duration(), Some(Duration::seconds(42)));
    }

    #[test]
    fn startup_duration_excluded_on_restarts() {
        let pod = pod_with_conditions(
            vec![
                true_condition("PodScheduled", "2024-03-01T10:00:00Z"),
                true_condition("Ready", "2024-03-01T10:00:42Z"),
            ],
            3,
        );
        assert_eq!(pod.startup_duration(), None);
    }

    #[test]
    fn startup_duration_excluded_on_missing_condition() {
        let pod = pod_with_conditions(
            vec![true_condition("Ready", "2024-03-01T10:00:42Z")],
            0,
        );
        assert_eq!(pod.startup_duration(), None);
    }

    #[test]
    fn startup_duration_excluded_when_gap_exceeds_one_hour() {
        let pod = pod_with_conditions(
            vec![
                true_condition("PodScheduled", "2024-03-01T10:00:00Z"),
                true_condition("Ready", "2024-03-01T11:00:01Z"),
            ],
            0,
        );
        assert_eq!(pod.startup_duration(), None);
    }

    #[test]
    fn false_conditions_are_not_consulted() {
        let mut stale = true_condition("Ready", "2024-03-01T09:00:00Z");
        stale.status = "False".into();
        let pod = pod_with_conditions(
            vec![
                stale,
                true_condition("PodScheduled", "2024-03-01T10:00:00Z"),
                true_condition("Ready", "2024-03-01T10:00:10Z"),
            ],
            0,
        );
        assert_eq!(pod.startup_duration(), Some(Duration::seconds(10)));
    }

    #[test]
    fn sample_totals_strip_top_units() {
        let sample = ResourceSample {
            namespace: "default".into(),
            pod: "web-0".into(),
            containers: vec![
                ContainerSample {
                    name: "web".into(),
                    cpu: "30m".into(),
                    memory: "20Mi".into(),
                },
                ContainerSample {
                    name: "sidecar".into(),
                    cpu: "2m".into(),
                    memory: "5Mi".into(),
                },
            ],
        };
        assert_eq!(sample.milli_cpu(), 32);
        assert_eq!(sample.mebi_memory(), 25);
    }

    #[test]
    fn hpa_usage_display_keeps_unknown_sentinel() {
        let mut hpa = Hpa {
            target_percent: 80,
            ..Hpa::default()
        };
        assert_eq!(hpa.usage_and_target(), "<unknown>/80%");
        hpa.current_usage = Some(0);
        assert_eq!(hpa.usage_and_target(), "0%/80%");
    }

    #[test]
    fn pdb_selector_is_strict_conjunction() {
        let pdb = Pdb {
            spec: PdbSpec {
                selector: LabelSelector {
                    match_labels: HashMap::from([
                        ("app".to_string(), "adservice2".to_string()),
                        ("xyz".to_string(), "abc2".to_string()),
                    ]),
                },
                ..PdbSpec::default()
            },
            ..Pdb::default()
        };

        let partial = HashMap::from([("app".to_string(), "adservice2".to_string())]);
        assert!(!pdb.matches(&partial));

        let full = HashMap::from([
            ("app".to_string(), "adservice2".to_string()),
            ("xyz".to_string(), "abc2".to_string()),
            ("extra".to_string(), "ignored".to_string()),
        ]);
        assert!(pdb.matches(&full));
    }

    #[test]
    fn empty_pdb_selector_matches_everything() {
        let pdb = Pdb::default();
        assert!(pdb.matches(&HashMap::new()));
        assert!(pdb.matches(&HashMap::from([("a".to_string(), "b".to_string())])));
    }

    #[test]
    fn probe_counters_report_defined_over_total() {
        let pod = Pod {
            spec: PodSpec {
                node_name: String::new(),
                containers: vec![
                    ContainerSpec {
                        name: "app".into(),
                        liveness_probe: Probe {
                            http_get: HttpGetAction {
                                path: "/healthz".into(),
                            },
                            ..Probe::default()
                        },
                        ..ContainerSpec::default()
                    },
                    ContainerSpec {
                        name: "sidecar".into(),
                        ..ContainerSpec::default()
                    },
                ],
            },
            ..Pod::default()
        };
        assert_eq!(pod.count_liveness_probes(), "1/2");
        assert_eq!(pod.count_readiness_probes(), "0/2");
        assert_eq!(pod.count_prestop_hooks(), "0/2");
        assert_eq!(
            pod.liveness_probe_summary(),
            "app {HttpGet: /healthz}\nsidecar {}"
        );
    }
}
