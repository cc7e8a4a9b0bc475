//! One-shot snapshot pipeline
//!
//! The five external fetches are independent read-only calls, so they fan
//! out concurrently behind a join barrier; parsing and correlation then run
//! synchronously on the complete payloads. Entities are immutable once the
//! snapshot is returned and the whole graph is rebuilt from scratch on every
//! invocation.

use tracing::info;

use crate::correlate;
use crate::error::SnapshotError;
use crate::keys;
use crate::models::{Deployment, Hpa, Node, Pdb, Pod};
use crate::parse;
use crate::provider::ClusterProvider;

/// Options controlling a snapshot run.
#[derive(Debug, Clone, Default)]
pub struct SnapshotOptions {
    /// Restrict to one namespace. The pods fetch is scoped at the command
    /// level; tabular feeds are filtered at parse time.
    pub namespace: Option<String>,
    /// Keep only this pod (exact name). Takes precedence over `deployment`.
    pub pod: Option<String>,
    /// Keep only entities of this derived workload name.
    pub deployment: Option<String>,
}

/// Counts of tabular lines skipped during parsing, surfaced so dropped data
/// is visible rather than silent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkippedLines {
    pub deployments: usize,
    pub hpas: usize,
    pub samples: usize,
}

impl SkippedLines {
    pub fn total(&self) -> usize {
        self.deployments + self.hpas + self.samples
    }
}

/// The fully correlated entity graph for one snapshot run.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub pods: Vec<Pod>,
    pub hpas: Vec<Hpa>,
    pub deployments: Vec<Deployment>,
    pub deployments_without_hpa: Vec<Deployment>,
    pub nodes: Vec<Node>,
    pub pdbs: Vec<Pdb>,
    pub skipped: SkippedLines,
}

impl Snapshot {
    /// Fetch all feeds through the provider and build the correlated graph.
    pub async fn take(
        provider: &dyn ClusterProvider,
        options: &SnapshotOptions,
    ) -> Result<Self, SnapshotError> {
        let (pods_json, samples_text, hpas_text, deployments_text, nodes_json, pdbs_json) =
            tokio::try_join!(
                provider.fetch_pods(),
                provider.fetch_resource_samples(),
                provider.fetch_hpas(),
                provider.fetch_deployments(),
                provider.fetch_nodes(),
                provider.fetch_pdbs(),
            )?;
        Self::from_payloads(
            &pods_json,
            &samples_text,
            &hpas_text,
            &deployments_text,
            &nodes_json,
            &pdbs_json,
            options,
        )
    }

    /// Build the correlated graph from already-retrieved payloads.
    #[allow(clippy::too_many_arguments)]
    pub fn from_payloads(
        pods_json: &str,
        samples_text: &str,
        hpas_text: &str,
        deployments_text: &str,
        nodes_json: &str,
        pdbs_json: &str,
        options: &SnapshotOptions,
    ) -> Result<Self, SnapshotError> {
        let ns = options.namespace.as_deref();

        let samples = parse::parse_resource_samples(samples_text, ns);
        let mut pods: Vec<Pod> = parse::parse_pod_list(pods_json)?
            .items
            .into_iter()
            .filter(|p| p.status.phase == "Running")
            .filter(|p| ns.map(|n| p.metadata.namespace == n).unwrap_or(true))
            .collect();
        for pod in &mut pods {
            pod.sample = samples.rows.get(&pod.pod_key()).cloned();
        }

        // Entity filters narrow the pod set before any grouping so that
        // every correlated set reflects the filtered view.
        if let Some(pod_name) = &options.pod {
            pods.retain(|p| p.metadata.name == *pod_name);
        } else if let Some(deployment) = &options.deployment {
            pods.retain(|p| keys::workload_name(p).name == *deployment);
        }

        let hpas_out = parse::parse_hpas(hpas_text, ns);
        let deployments_out = parse::parse_deployments(deployments_text, ns);
        let mut nodes = parse::parse_node_list(nodes_json)?.items;
        let pdbs = parse::parse_pdb_list(pdbs_json)?.items;

        let (workload_map, replica_set_map) = correlate::build_pod_maps(&pods);

        let mut hpas = hpas_out.rows;
        correlate::attach_hpa_pods(&mut hpas, &workload_map, &replica_set_map);
        if let Some(pod_name) = &options.pod {
            hpas.retain(|h| h.contains_pod(pod_name));
        } else if let Some(deployment) = &options.deployment {
            hpas.retain(|h| h.refs_deployment(deployment));
        }

        let mut deployments = deployments_out.rows;
        correlate::attach_deployment_pods(&mut deployments, &workload_map);
        if let Some(pod_name) = &options.pod {
            deployments.retain(|d| d.contains_pod(pod_name));
        } else if let Some(deployment) = &options.deployment {
            deployments.retain(|d| d.name == *deployment);
        }

        correlate::attach_node_pods(&mut nodes, &pods);
        correlate::attach_budgets(&mut hpas, &mut deployments, &pdbs);
        let deployments_without_hpa = correlate::deployments_without_hpa(&deployments, &hpas);

        let skipped = SkippedLines {
            deployments: deployments_out.skipped,
            hpas: hpas_out.skipped,
            samples: samples.skipped,
        };

        info!(
            pods = pods.len(),
            hpas = hpas.len(),
            deployments = deployments.len(),
            without_hpa = deployments_without_hpa.len(),
            nodes = nodes.len(),
            pdbs = pdbs.len(),
            skipped_lines = skipped.total(),
            "snapshot correlated"
        );

        Ok(Snapshot {
            pods,
            hpas,
            deployments,
            deployments_without_hpa,
            nodes,
            pdbs,
            skipped,
        })
    }
}
