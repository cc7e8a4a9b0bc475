//! kube-snapshot CLI
//!
//! One-shot snapshot of a cluster's workload and capacity state: invokes
//! kubectl, correlates pods with HPAs, deployments, nodes and disruption
//! budgets, and reports usage versus requests/limits as terminal tables or
//! CSV files.

mod config;
mod csv_export;
mod output;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use snapshot_lib::{KubectlProvider, Snapshot, SnapshotOptions};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Report sections to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportSection {
    /// Pods, HPAs, deployments without an HPA, and nodes
    #[default]
    All,
    /// Only the per-pod section
    Pods,
    /// The HPA section plus deployments without an HPA
    Hpas,
    /// Only the nodes section
    Nodes,
}

/// Snapshot cluster resource usage versus requests and limits
#[derive(Parser)]
#[command(name = "kube-snapshot")]
#[command(author, version, about = "Snapshot cluster resource usage versus requests and limits", long_about = None)]
pub struct Cli {
    /// Filter by pod name (default: all pods)
    #[arg(long, short)]
    pub pod: Option<String>,

    /// Filter by derived deployment name (default: all deployments)
    #[arg(long, short)]
    pub deployment: Option<String>,

    /// Filter by namespace (default: all namespaces)
    #[arg(long, short)]
    pub namespace: Option<String>,

    /// Which sections to print
    #[arg(long = "print", value_enum)]
    pub print: Option<ReportSection>,

    /// Save reports to kube-snapshot-<date>-<TAG>-{pods,hpas,nohpa,nodes}.csv
    #[arg(long, value_name = "TAG")]
    pub csv_output: Option<String>,

    /// Path to kubeconfig file (kubectl's own default if not specified)
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Show debug info (parsed flags, pods per node)
    #[arg(long)]
    pub debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::Config::load().context("failed to load CLI configuration")?;

    let namespace = cli.namespace.clone().or(config.default_namespace);
    let section = cli
        .print
        .or_else(|| {
            config
                .default_print
                .as_deref()
                .and_then(|value| ReportSection::from_str(value, true).ok())
        })
        .unwrap_or_default();

    if cli.debug {
        print_flags(&cli, namespace.as_deref(), section);
    }

    let provider = KubectlProvider::new(namespace.clone(), cli.kubeconfig.clone());
    let options = SnapshotOptions {
        namespace,
        pod: cli.pod.clone(),
        deployment: cli.deployment.clone(),
    };

    let snapshot = match Snapshot::take(&provider, &options).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            output::print_error(&format!("snapshot failed: {err}"));
            std::process::exit(1);
        }
    };
    debug!(
        pods = snapshot.pods.len(),
        hpas = snapshot.hpas.len(),
        deployments = snapshot.deployments.len(),
        nodes = snapshot.nodes.len(),
        "snapshot ready"
    );

    if snapshot.skipped.total() > 0 {
        output::print_warning(&format!(
            "{} unparsable feed lines skipped",
            snapshot.skipped.total()
        ));
    }

    // CSV export replaces the tables unless debug output is requested
    if cli.csv_output.is_none() || cli.debug {
        match section {
            ReportSection::All => {
                render::print_pods(&snapshot);
                render::print_hpas(&snapshot);
                render::print_deployments_without_hpa(&snapshot);
                render::print_nodes(&snapshot, cli.debug);
            }
            ReportSection::Pods => render::print_pods(&snapshot),
            ReportSection::Hpas => {
                render::print_hpas(&snapshot);
                render::print_deployments_without_hpa(&snapshot);
            }
            ReportSection::Nodes => render::print_nodes(&snapshot, cli.debug),
        }
    }

    if let Some(tag) = &cli.csv_output {
        let prefix = csv_export::file_prefix(tag);
        let written =
            csv_export::write_reports(std::path::Path::new("."), &prefix, &snapshot, section)
                .context("failed to write CSV reports")?;
        for path in written {
            output::print_info(&format!("wrote {}", path.display()));
        }
    }

    Ok(())
}

fn print_flags(cli: &Cli, namespace: Option<&str>, section: ReportSection) {
    println!("---------------------------------------------");
    println!("[debug] FLAGS:");
    println!("   -p [POD] is: {}", cli.pod.as_deref().unwrap_or(""));
    println!(
        "   -d [DEPLOYMENT] is: {}",
        cli.deployment.as_deref().unwrap_or("")
    );
    println!("   -n [NAMESPACE] is: {}", namespace.unwrap_or(""));
    println!("   --print is: {:?}", section);
    println!(
        "   --csv-output is: {}",
        cli.csv_output.as_deref().unwrap_or("")
    );
    println!("---------------------------------------------");
}
