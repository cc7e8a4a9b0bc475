//! Delimited report files
//!
//! One CSV file per printed section, named
//! `kube-snapshot-<date>-<tag>-{pods,hpas,nohpa,nodes}.csv`. The CSV
//! reports carry the long-form probe and pre-stop dumps that do not fit the
//! terminal tables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use snapshot_lib::{Deployment, Node, PodGroup, Snapshot};

use crate::output::{format_duration, format_optional_duration};
use crate::ReportSection;

/// Timestamped file prefix for one export run.
pub fn file_prefix(tag: &str) -> String {
    format!("kube-snapshot-{}-{}", Local::now().format("%Y-%m-%d-%H%M"), tag)
}

/// Write the CSV files for the selected sections, returning the paths
/// written.
pub fn write_reports(
    dir: &Path,
    prefix: &str,
    snapshot: &Snapshot,
    section: ReportSection,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if matches!(section, ReportSection::All | ReportSection::Pods) {
        written.push(write_pods(dir, prefix, snapshot)?);
    }
    if matches!(section, ReportSection::All | ReportSection::Hpas) {
        written.push(write_hpas(dir, prefix, snapshot)?);
        written.push(write_no_hpa(dir, prefix, snapshot)?);
    }
    if matches!(section, ReportSection::All | ReportSection::Nodes) {
        written.push(write_nodes(dir, prefix, snapshot)?);
    }
    Ok(written)
}

fn open_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))
}

fn write_pods(dir: &Path, prefix: &str, snapshot: &Snapshot) -> Result<PathBuf> {
    let path = dir.join(format!("{prefix}-pods.csv"));
    let mut writer = open_writer(&path)?;
    writer.write_record([
        "Namespace",
        "Pod Name",
        "Requests CPU (m)",
        "TOP CPU (m)",
        "Usage CPU (%)",
        "Requests Memory (Mi)",
        "TOP Memory (Mi)",
        "Usage Memory (%)",
        "Limits CPU (m)",
        "Limits Memory (Mi)",
        "Pod Startup Duration",
    ])?;
    for pod in &snapshot.pods {
        writer.write_record([
            pod.metadata.namespace.clone(),
            pod.metadata.name.clone(),
            pod.requests_milli_cpu().to_string(),
            pod.sampled_milli_cpu().to_string(),
            format!("{:.2}", pod.cpu_usage_percent()),
            pod.requests_mebi_memory().to_string(),
            pod.sampled_mebi_memory().to_string(),
            format!("{:.2}", pod.memory_usage_percent()),
            pod.limits_milli_cpu().to_string(),
            pod.limits_mebi_memory().to_string(),
            format_optional_duration(pod.startup_duration()),
        ])?;
    }
    writer.flush()?;
    Ok(path)
}

fn group_record(group: &PodGroup<'_>) -> Vec<String> {
    vec![
        group.len().to_string(),
        group.requests_milli_cpu().to_string(),
        group.sampled_milli_cpu().to_string(),
        format!("{:.2}", group.cpu_usage_percent()),
        group.requests_mebi_memory().to_string(),
        group.sampled_mebi_memory().to_string(),
        format!("{:.2}", group.memory_usage_percent()),
        group.limits_milli_cpu().to_string(),
        group.limits_mebi_memory().to_string(),
        format_duration(group.avg_startup_duration()),
    ]
}

const GROUP_HEADER: [&str; 10] = [
    "# Pods",
    "Requests CPU (m)",
    "TOP CPU (m)",
    "Usage CPU (%)",
    "Requests Memory (Mi)",
    "TOP Memory (Mi)",
    "Usage Memory (%)",
    "Limits CPU (m)",
    "Limits Memory (Mi)",
    "Pod Startup Duration (AVG)",
];

const PROBE_HEADER: [&str; 6] = [
    "Count Liveness Probe",
    "Count Readiness Probe",
    "Count Lifecycle PreStop",
    "Liveness Probe",
    "Readiness Probe",
    "Lifecycle PreStop",
];

fn probe_record(group: &PodGroup<'_>) -> Vec<String> {
    vec![
        group.count_liveness_probes(),
        group.count_readiness_probes(),
        group.count_prestop_hooks(),
        group.liveness_probe_summary(),
        group.readiness_probe_summary(),
        group.prestop_summary(),
    ]
}

fn budget_record(pdb: Option<&snapshot_lib::Pdb>) -> Vec<String> {
    vec![
        pdb.map(|p| p.spec.min_available).unwrap_or(0).to_string(),
        pdb.map(|p| p.spec.max_unavailable).unwrap_or(0).to_string(),
    ]
}

fn write_hpas(dir: &Path, prefix: &str, snapshot: &Snapshot) -> Result<PathBuf> {
    let path = dir.join(format!("{prefix}-hpas.csv"));
    let mut writer = open_writer(&path)?;

    let mut header = vec![
        "Namespace",
        "Hpa Name",
        "Reference",
        "Hpa Use (%)",
        "Hpa Target (%)",
        "Min Replicas",
        "Max Replicas",
        "Actual Replicas",
    ];
    header.extend(GROUP_HEADER);
    header.extend(["PDB MinAvailable", "PDB MaxUnavailable"]);
    header.extend(PROBE_HEADER);
    writer.write_record(&header)?;

    for hpa in &snapshot.hpas {
        let group = PodGroup::new(&hpa.pods);
        let mut record = vec![
            hpa.namespace.clone(),
            hpa.name.clone(),
            hpa.reference(),
            // the sentinel stays distinguishable from a measured zero
            hpa.current_usage
                .map(|usage| usage.to_string())
                .unwrap_or_else(|| "<unknown>".to_string()),
            hpa.target_percent.to_string(),
            hpa.min_replicas.to_string(),
            hpa.max_replicas.to_string(),
            hpa.replicas.to_string(),
        ];
        record.extend(group_record(&group));
        record.extend(budget_record(hpa.pdb.as_ref()));
        record.extend(probe_record(&group));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(path)
}

fn write_no_hpa(dir: &Path, prefix: &str, snapshot: &Snapshot) -> Result<PathBuf> {
    let path = dir.join(format!("{prefix}-nohpa.csv"));
    let mut writer = open_writer(&path)?;

    let mut header = vec![
        "Namespace",
        "Deployment Name",
        "Replicas",
        "Expected Replicas",
        "Up To Date",
        "Available",
        "Age",
    ];
    header.extend(GROUP_HEADER);
    header.extend(["PDB MinAvailable", "PDB MaxUnavailable"]);
    header.extend(PROBE_HEADER);
    writer.write_record(&header)?;

    for deployment in &snapshot.deployments_without_hpa {
        let group = PodGroup::new(&deployment.pods);
        let mut record = deployment_front(deployment);
        record.extend(group_record(&group));
        record.extend(budget_record(deployment.pdb.as_ref()));
        record.extend(probe_record(&group));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(path)
}

fn deployment_front(deployment: &Deployment) -> Vec<String> {
    vec![
        deployment.namespace.clone(),
        deployment.name.clone(),
        deployment.ready_replicas.to_string(),
        deployment.desired_replicas.to_string(),
        deployment.up_to_date.to_string(),
        deployment.available.to_string(),
        deployment.age.clone(),
    ]
}

fn write_nodes(dir: &Path, prefix: &str, snapshot: &Snapshot) -> Result<PathBuf> {
    let path = dir.join(format!("{prefix}-nodes.csv"));
    let mut writer = open_writer(&path)?;

    let mut header = vec![
        "Node",
        "Node Pool",
        "Allocatable Pods",
        "Allocatable CPU (m)",
        "Allocatable Memory (Mi)",
    ];
    header.extend(GROUP_HEADER);
    writer.write_record(&header)?;

    for node in &snapshot.nodes {
        let group = PodGroup::new(&node.pods);
        let mut record = node_front(node);
        record.extend(group_record(&group));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(path)
}

fn node_front(node: &Node) -> Vec<String> {
    vec![
        node.name().to_string(),
        node.nodepool().to_string(),
        node.allocatable_pods().to_string(),
        node.allocatable_milli_cpu().to_string(),
        node.allocatable_mebi_memory().to_string(),
    ]
}
