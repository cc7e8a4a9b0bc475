//! Utilization aggregation over pod groups
//!
//! A [`PodGroup`] is a borrowed view over any set of pods (one pod, an
//! HPA's pods, a node's pods) used purely to compute aggregate metrics. It
//! is recomputed on demand, never stored.

use chrono::Duration;

use crate::models::Pod;

/// Sentinel reported for groupings with no resolved pods.
pub const NOT_APPLICABLE: &str = "N/A";

/// Percentage of requested capacity in live use.
///
/// Degenerate-input rules: zero requests count as fully used (100%); a
/// missing sample against non-zero requests is 0%.
pub(crate) fn usage_percent(sampled: i64, requests: i64) -> f64 {
    if requests == 0 {
        100.0
    } else if sampled == 0 {
        0.0
    } else {
        sampled as f64 / requests as f64 * 100.0
    }
}

/// A non-persisted aggregation view over a slice of pods.
#[derive(Debug, Clone, Copy)]
pub struct PodGroup<'a> {
    pods: &'a [Pod],
}

impl<'a> PodGroup<'a> {
    pub fn new(pods: &'a [Pod]) -> Self {
        Self { pods }
    }

    pub fn len(&self) -> usize {
        self.pods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }

    pub fn requests_milli_cpu(&self) -> i64 {
        self.pods.iter().map(Pod::requests_milli_cpu).sum()
    }

    pub fn requests_mebi_memory(&self) -> i64 {
        self.pods.iter().map(Pod::requests_mebi_memory).sum()
    }

    pub fn limits_milli_cpu(&self) -> i64 {
        self.pods.iter().map(Pod::limits_milli_cpu).sum()
    }

    pub fn limits_mebi_memory(&self) -> i64 {
        self.pods.iter().map(Pod::limits_mebi_memory).sum()
    }

    pub fn sampled_milli_cpu(&self) -> i64 {
        self.pods.iter().map(Pod::sampled_milli_cpu).sum()
    }

    pub fn sampled_mebi_memory(&self) -> i64 {
        self.pods.iter().map(Pod::sampled_mebi_memory).sum()
    }

    pub fn cpu_usage_percent(&self) -> f64 {
        usage_percent(self.sampled_milli_cpu(), self.requests_milli_cpu())
    }

    pub fn memory_usage_percent(&self) -> f64 {
        usage_percent(self.sampled_mebi_memory(), self.requests_mebi_memory())
    }

    /// Mean startup duration over the pods with a measurable value.
    ///
    /// Pods excluded by [`Pod::startup_duration`] contribute nothing to the
    /// average (they are not counted as zero); if none qualify the average
    /// is zero.
    pub fn avg_startup_duration(&self) -> Duration {
        let measured: Vec<Duration> = self
            .pods
            .iter()
            .filter_map(Pod::startup_duration)
            .collect();
        if measured.is_empty() {
            return Duration::zero();
        }
        let total = measured
            .iter()
            .fold(Duration::zero(), |acc, gap| acc + *gap);
        total / measured.len() as i32
    }

    /// Liveness-probe counter of the group's first pod, labels being
    /// homogeneous within one workload's pods.
    pub fn count_liveness_probes(&self) -> String {
        self.first_pod_or_na(Pod::count_liveness_probes)
    }

    pub fn count_readiness_probes(&self) -> String {
        self.first_pod_or_na(Pod::count_readiness_probes)
    }

    pub fn count_prestop_hooks(&self) -> String {
        self.first_pod_or_na(Pod::count_prestop_hooks)
    }

    pub fn liveness_probe_summary(&self) -> String {
        self.first_pod_or_na(Pod::liveness_probe_summary)
    }

    pub fn readiness_probe_summary(&self) -> String {
        self.first_pod_or_na(Pod::readiness_probe_summary)
    }

    pub fn prestop_summary(&self) -> String {
        self.first_pod_or_na(Pod::prestop_summary)
    }

    fn first_pod_or_na(&self, describe: impl Fn(&Pod) -> String) -> String {
        self.pods
            .first()
            .map(describe)
            .unwrap_or_else(|| NOT_APPLICABLE.to_string())
    }
}
