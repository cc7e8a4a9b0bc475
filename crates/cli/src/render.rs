//! Terminal tables for the snapshot sections
//!
//! One table per section (pods, HPAs, deployments without an HPA, nodes),
//! each with a trailing summary row. Columns mirror the CSV reports minus
//! the long-form probe dumps, which only fit the delimited output.

use colored::Colorize;
use snapshot_lib::{Pod, PodGroup, Snapshot};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::output::{
    color_percent, format_duration, format_mebi, format_milli, format_optional_duration,
};

/// Aggregate metric cells shared by every group-level row.
struct Aggregates {
    requests_cpu: String,
    top_cpu: String,
    usage_cpu: String,
    requests_memory: String,
    top_memory: String,
    usage_memory: String,
    limits_cpu: String,
    limits_memory: String,
    startup_avg: String,
}

impl Aggregates {
    fn over(pods: &[Pod]) -> Self {
        let group = PodGroup::new(pods);
        Self {
            requests_cpu: format_milli(group.requests_milli_cpu()),
            top_cpu: format_milli(group.sampled_milli_cpu()),
            usage_cpu: color_percent(group.cpu_usage_percent()),
            requests_memory: format_mebi(group.requests_mebi_memory()),
            top_memory: format_mebi(group.sampled_mebi_memory()),
            usage_memory: color_percent(group.memory_usage_percent()),
            limits_cpu: format_milli(group.limits_milli_cpu()),
            limits_memory: format_mebi(group.limits_mebi_memory()),
            startup_avg: format_duration(group.avg_startup_duration()),
        }
    }
}

#[derive(Tabled)]
struct PodRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pod Name")]
    name: String,
    #[tabled(rename = "Requests CPU")]
    requests_cpu: String,
    #[tabled(rename = "TOP CPU")]
    top_cpu: String,
    #[tabled(rename = "Usage CPU")]
    usage_cpu: String,
    #[tabled(rename = "Requests Mem")]
    requests_memory: String,
    #[tabled(rename = "TOP Mem")]
    top_memory: String,
    #[tabled(rename = "Usage Mem")]
    usage_memory: String,
    #[tabled(rename = "Limits CPU")]
    limits_cpu: String,
    #[tabled(rename = "Limits Mem")]
    limits_memory: String,
    #[tabled(rename = "Startup")]
    startup: String,
}

/// Print the per-pod section with a totals row.
pub fn print_pods(snapshot: &Snapshot) {
    println!("\n{}", "PODS SNAPSHOT:".bold());
    let mut rows: Vec<PodRow> = snapshot
        .pods
        .iter()
        .map(|pod| PodRow {
            namespace: pod.metadata.namespace.clone(),
            name: pod.metadata.name.clone(),
            requests_cpu: format_milli(pod.requests_milli_cpu()),
            top_cpu: format_milli(pod.sampled_milli_cpu()),
            usage_cpu: color_percent(pod.cpu_usage_percent()),
            requests_memory: format_mebi(pod.requests_mebi_memory()),
            top_memory: format_mebi(pod.sampled_mebi_memory()),
            usage_memory: color_percent(pod.memory_usage_percent()),
            limits_cpu: format_milli(pod.limits_milli_cpu()),
            limits_memory: format_mebi(pod.limits_mebi_memory()),
            startup: format_optional_duration(pod.startup_duration()),
        })
        .collect();

    let totals = Aggregates::over(&snapshot.pods);
    rows.push(PodRow {
        namespace: String::new(),
        name: "TOTAL".bold().to_string(),
        requests_cpu: totals.requests_cpu,
        top_cpu: totals.top_cpu,
        usage_cpu: totals.usage_cpu,
        requests_memory: totals.requests_memory,
        top_memory: totals.top_memory,
        usage_memory: totals.usage_memory,
        limits_cpu: totals.limits_cpu,
        limits_memory: totals.limits_memory,
        startup: String::new(),
    });

    println!("{}", Table::new(rows).with(Style::rounded()).to_string());
}

#[derive(Tabled)]
struct HpaRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Hpa Name")]
    name: String,
    #[tabled(rename = "Reference")]
    reference: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Replicas (Min/Max/Actual)")]
    replicas: String,
    #[tabled(rename = "# Pods")]
    pod_count: usize,
    #[tabled(rename = "Requests CPU")]
    requests_cpu: String,
    #[tabled(rename = "TOP CPU")]
    top_cpu: String,
    #[tabled(rename = "Usage CPU")]
    usage_cpu: String,
    #[tabled(rename = "Requests Mem")]
    requests_memory: String,
    #[tabled(rename = "TOP Mem")]
    top_memory: String,
    #[tabled(rename = "Usage Mem")]
    usage_memory: String,
    #[tabled(rename = "Limits CPU")]
    limits_cpu: String,
    #[tabled(rename = "Limits Mem")]
    limits_memory: String,
    #[tabled(rename = "Startup (AVG)")]
    startup_avg: String,
    #[tabled(rename = "PDB MinAvailable")]
    pdb_min_available: i64,
    #[tabled(rename = "PDB MaxUnavailable")]
    pdb_max_unavailable: i64,
    #[tabled(rename = "Liveness")]
    liveness: String,
    #[tabled(rename = "Readiness")]
    readiness: String,
    #[tabled(rename = "PreStop")]
    prestop: String,
}

/// Print the scaling-policies section.
pub fn print_hpas(snapshot: &Snapshot) {
    println!("\n{}", "HPAS SNAPSHOT:".bold());
    let rows: Vec<HpaRow> = snapshot
        .hpas
        .iter()
        .map(|hpa| {
            let aggregates = Aggregates::over(&hpa.pods);
            let group = PodGroup::new(&hpa.pods);
            HpaRow {
                namespace: hpa.namespace.clone(),
                name: hpa.name.clone(),
                reference: hpa.reference(),
                target: hpa.usage_and_target(),
                replicas: format!(
                    "{}/{}/{}",
                    hpa.min_replicas, hpa.max_replicas, hpa.replicas
                ),
                pod_count: hpa.pods.len(),
                requests_cpu: aggregates.requests_cpu,
                top_cpu: aggregates.top_cpu,
                usage_cpu: aggregates.usage_cpu,
                requests_memory: aggregates.requests_memory,
                top_memory: aggregates.top_memory,
                usage_memory: aggregates.usage_memory,
                limits_cpu: aggregates.limits_cpu,
                limits_memory: aggregates.limits_memory,
                startup_avg: aggregates.startup_avg,
                pdb_min_available: hpa.pdb.as_ref().map(|p| p.spec.min_available).unwrap_or(0),
                pdb_max_unavailable: hpa
                    .pdb
                    .as_ref()
                    .map(|p| p.spec.max_unavailable)
                    .unwrap_or(0),
                liveness: group.count_liveness_probes(),
                readiness: group.count_readiness_probes(),
                prestop: group.count_prestop_hooks(),
            }
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()).to_string());
}

#[derive(Tabled)]
struct NoHpaRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Deployment Name")]
    name: String,
    #[tabled(rename = "Ready")]
    ready: String,
    #[tabled(rename = "Up To Date")]
    up_to_date: i64,
    #[tabled(rename = "Available")]
    available: i64,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "# Pods")]
    pod_count: usize,
    #[tabled(rename = "Requests CPU")]
    requests_cpu: String,
    #[tabled(rename = "TOP CPU")]
    top_cpu: String,
    #[tabled(rename = "Usage CPU")]
    usage_cpu: String,
    #[tabled(rename = "Requests Mem")]
    requests_memory: String,
    #[tabled(rename = "TOP Mem")]
    top_memory: String,
    #[tabled(rename = "Usage Mem")]
    usage_memory: String,
    #[tabled(rename = "Limits CPU")]
    limits_cpu: String,
    #[tabled(rename = "Limits Mem")]
    limits_memory: String,
    #[tabled(rename = "Startup (AVG)")]
    startup_avg: String,
    #[tabled(rename = "PDB MinAvailable")]
    pdb_min_available: i64,
    #[tabled(rename = "PDB MaxUnavailable")]
    pdb_max_unavailable: i64,
    #[tabled(rename = "Liveness")]
    liveness: String,
    #[tabled(rename = "Readiness")]
    readiness: String,
    #[tabled(rename = "PreStop")]
    prestop: String,
}

/// Print the deployments that no scaling policy targets.
pub fn print_deployments_without_hpa(snapshot: &Snapshot) {
    println!("\n{}", "NO HPA SNAPSHOT:".bold());
    let rows: Vec<NoHpaRow> = snapshot
        .deployments_without_hpa
        .iter()
        .map(|deployment| {
            let aggregates = Aggregates::over(&deployment.pods);
            let group = PodGroup::new(&deployment.pods);
            NoHpaRow {
                namespace: deployment.namespace.clone(),
                name: deployment.name.clone(),
                ready: format!(
                    "{}/{}",
                    deployment.ready_replicas, deployment.desired_replicas
                ),
                up_to_date: deployment.up_to_date,
                available: deployment.available,
                age: deployment.age.clone(),
                pod_count: deployment.pods.len(),
                requests_cpu: aggregates.requests_cpu,
                top_cpu: aggregates.top_cpu,
                usage_cpu: aggregates.usage_cpu,
                requests_memory: aggregates.requests_memory,
                top_memory: aggregates.top_memory,
                usage_memory: aggregates.usage_memory,
                limits_cpu: aggregates.limits_cpu,
                limits_memory: aggregates.limits_memory,
                startup_avg: aggregates.startup_avg,
                pdb_min_available: deployment
                    .pdb
                    .as_ref()
                    .map(|p| p.spec.min_available)
                    .unwrap_or(0),
                pdb_max_unavailable: deployment
                    .pdb
                    .as_ref()
                    .map(|p| p.spec.max_unavailable)
                    .unwrap_or(0),
                liveness: group.count_liveness_probes(),
                readiness: group.count_readiness_probes(),
                prestop: group.count_prestop_hooks(),
            }
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()).to_string());
}

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    name: String,
    #[tabled(rename = "Node Pool")]
    nodepool: String,
    #[tabled(rename = "Alloc Pods")]
    allocatable_pods: String,
    #[tabled(rename = "Alloc CPU")]
    allocatable_cpu: String,
    #[tabled(rename = "Alloc Mem")]
    allocatable_memory: String,
    #[tabled(rename = "# Pods")]
    pod_count: String,
    #[tabled(rename = "Requests CPU")]
    requests_cpu: String,
    #[tabled(rename = "TOP CPU")]
    top_cpu: String,
    #[tabled(rename = "Usage CPU")]
    usage_cpu: String,
    #[tabled(rename = "Requests Mem")]
    requests_memory: String,
    #[tabled(rename = "TOP Mem")]
    top_memory: String,
    #[tabled(rename = "Usage Mem")]
    usage_memory: String,
    #[tabled(rename = "Limits CPU")]
    limits_cpu: String,
    #[tabled(rename = "Limits Mem")]
    limits_memory: String,
    #[tabled(rename = "Startup (AVG)")]
    startup_avg: String,
}

/// Print the nodes section with a cluster summary row. With `debug` set,
/// also dump the pods scheduled on each node.
pub fn print_nodes(snapshot: &Snapshot, debug: bool) {
    println!("\n{}", "NODES SNAPSHOT:".bold());

    let mut rows: Vec<NodeRow> = Vec::with_capacity(snapshot.nodes.len() + 1);
    let mut all_pods: Vec<Pod> = Vec::new();
    let mut min_pods = usize::MAX;
    let mut max_pods = 0usize;
    let mut allocatable_cpu_total = 0i64;
    let mut allocatable_memory_total = 0i64;

    for node in &snapshot.nodes {
        let count = node.pods.len();
        min_pods = min_pods.min(count);
        max_pods = max_pods.max(count);
        allocatable_cpu_total += node.allocatable_milli_cpu();
        allocatable_memory_total += node.allocatable_mebi_memory();
        all_pods.extend(node.pods.iter().cloned());

        let aggregates = Aggregates::over(&node.pods);
        rows.push(NodeRow {
            name: node.name().to_string(),
            nodepool: node.nodepool().to_string(),
            allocatable_pods: node.allocatable_pods().to_string(),
            allocatable_cpu: format_milli(node.allocatable_milli_cpu()),
            allocatable_memory: format_mebi(node.allocatable_mebi_memory()),
            pod_count: count.to_string(),
            requests_cpu: aggregates.requests_cpu,
            top_cpu: aggregates.top_cpu,
            usage_cpu: aggregates.usage_cpu,
            requests_memory: aggregates.requests_memory,
            top_memory: aggregates.top_memory,
            usage_memory: aggregates.usage_memory,
            limits_cpu: aggregates.limits_cpu,
            limits_memory: aggregates.limits_memory,
            startup_avg: aggregates.startup_avg,
        });
    }

    let (min_pods, avg_pods) = if snapshot.nodes.is_empty() {
        (0, 0)
    } else {
        (min_pods, all_pods.len() / snapshot.nodes.len())
    };

    let totals = Aggregates::over(&all_pods);
    rows.push(NodeRow {
        name: "TOTAL".bold().to_string(),
        nodepool: String::new(),
        allocatable_pods: String::new(),
        allocatable_cpu: format_milli(allocatable_cpu_total),
        allocatable_memory: format_mebi(allocatable_memory_total),
        pod_count: format!("Min:{}/Max:{}/Avg:{}", min_pods, max_pods, avg_pods),
        requests_cpu: totals.requests_cpu,
        top_cpu: totals.top_cpu,
        usage_cpu: totals.usage_cpu,
        requests_memory: totals.requests_memory,
        top_memory: totals.top_memory,
        usage_memory: totals.usage_memory,
        limits_cpu: totals.limits_cpu,
        limits_memory: totals.limits_memory,
        startup_avg: String::new(),
    });

    println!("{}", Table::new(rows).with(Style::rounded()).to_string());

    if debug {
        println!("\n{}", "PODS IN EACH NODE:".bold());
        for node in &snapshot.nodes {
            println!(" - {}", node.name());
            for pod in &node.pods {
                println!("     {}", pod.pod_key());
            }
        }
    }
}
