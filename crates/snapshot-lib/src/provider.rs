//! Cluster data providers
//!
//! The engine consumes opaque text/JSON payloads; this trait is the
//! injection seam that lets tests feed fixture payloads and the production
//! path shell out to kubectl. Each fetch is an independent read-only call
//! that either returns a complete payload or fails outright.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::SnapshotError;

/// Retrieval capabilities required to build one snapshot.
#[async_trait]
pub trait ClusterProvider: Send + Sync {
    /// Pods JSON feed.
    async fn fetch_pods(&self) -> Result<String, SnapshotError>;

    /// Live resource samples tabular feed.
    async fn fetch_resource_samples(&self) -> Result<String, SnapshotError>;

    /// Scaling policies tabular feed.
    async fn fetch_hpas(&self) -> Result<String, SnapshotError>;

    /// Scalable workloads tabular feed.
    async fn fetch_deployments(&self) -> Result<String, SnapshotError>;

    /// Nodes JSON feed.
    async fn fetch_nodes(&self) -> Result<String, SnapshotError>;

    /// Disruption budgets JSON feed.
    async fn fetch_pdbs(&self) -> Result<String, SnapshotError>;
}

/// Shells out to kubectl and captures stdout.
///
/// Only the pods feed is namespace-scoped at the command level; the tabular
/// feeds are fetched cluster-wide and filtered at parse time.
pub struct KubectlProvider {
    namespace: Option<String>,
    kubeconfig: Option<PathBuf>,
}

impl KubectlProvider {
    pub fn new(namespace: Option<String>, kubeconfig: Option<PathBuf>) -> Self {
        Self {
            namespace,
            kubeconfig,
        }
    }

    fn pods_args(&self) -> Vec<String> {
        let mut args = vec!["get".to_string(), "pods".to_string()];
        match &self.namespace {
            Some(ns) => {
                args.push("-n".to_string());
                args.push(ns.clone());
            }
            None => args.push("--all-namespaces".to_string()),
        }
        args.push("-o".to_string());
        args.push("json".to_string());
        args
    }

    fn with_kubeconfig(&self, mut args: Vec<String>) -> Vec<String> {
        if let Some(path) = &self.kubeconfig {
            args.push("--kubeconfig".to_string());
            args.push(path.display().to_string());
        }
        args
    }

    async fn run(&self, args: Vec<String>) -> Result<String, SnapshotError> {
        let args = self.with_kubeconfig(args);
        let command = format!("kubectl {}", args.join(" "));
        debug!(command = %command, "invoking kubectl");
        let output = Command::new("kubectl")
            .args(&args)
            .output()
            .await
            .map_err(|source| SnapshotError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(SnapshotError::Command {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        String::from_utf8(output.stdout)
            .map_err(|_| SnapshotError::InvalidOutput { command })
    }
}

#[async_trait]
impl ClusterProvider for KubectlProvider {
    async fn fetch_pods(&self) -> Result<String, SnapshotError> {
        self.run(self.pods_args()).await
    }

    async fn fetch_resource_samples(&self) -> Result<String, SnapshotError> {
        self.run(str_args(&["top", "pods", "--all-namespaces", "--containers"]))
            .await
    }

    async fn fetch_hpas(&self) -> Result<String, SnapshotError> {
        self.run(str_args(&["get", "hpa", "--all-namespaces", "--no-headers"]))
            .await
    }

    async fn fetch_deployments(&self) -> Result<String, SnapshotError> {
        self.run(str_args(&[
            "get",
            "deployments",
            "--all-namespaces",
            "--no-headers",
        ]))
        .await
    }

    async fn fetch_nodes(&self) -> Result<String, SnapshotError> {
        self.run(str_args(&["get", "nodes", "-o", "json"])).await
    }

    async fn fetch_pdbs(&self) -> Result<String, SnapshotError> {
        self.run(str_args(&["get", "pdb", "--all-namespaces", "-o", "json"]))
            .await
    }
}

fn str_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pods_command_is_namespace_scoped() {
        let provider = KubectlProvider::new(Some("test".into()), None);
        assert_eq!(
            provider.pods_args().join(" "),
            "get pods -n test -o json"
        );

        let provider = KubectlProvider::new(None, None);
        assert_eq!(
            provider.pods_args().join(" "),
            "get pods --all-namespaces -o json"
        );
    }

    #[test]
    fn kubeconfig_is_appended_when_configured() {
        let provider = KubectlProvider::new(None, Some(PathBuf::from("/tmp/kc")));
        let args = provider.with_kubeconfig(provider.pods_args());
        assert_eq!(
            args.join(" "),
            "get pods --all-namespaces -o json --kubeconfig /tmp/kc"
        );
    }
}
