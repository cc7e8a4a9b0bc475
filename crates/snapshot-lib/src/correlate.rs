//! Correlation engine
//!
//! Joins the five entity kinds into one cross-referenced graph, built once
//! per snapshot: pods group by derived workload and replica-set keys, HPAs
//! and deployments resolve their pods through those maps, nodes group pods
//! by the explicit scheduling field, and disruption budgets attach by
//! first-match label selection.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::keys;
use crate::models::{Deployment, Hpa, Node, Pdb, Pod};

/// Group pods by derived workload key and by replica-set key.
pub fn build_pod_maps(pods: &[Pod]) -> (HashMap<String, Vec<Pod>>, HashMap<String, Vec<Pod>>) {
    let mut workload_map: HashMap<String, Vec<Pod>> = HashMap::new();
    let mut replica_set_map: HashMap<String, Vec<Pod>> = HashMap::new();
    for pod in pods {
        workload_map
            .entry(keys::workload_key(pod))
            .or_default()
            .push(pod.clone());
        replica_set_map
            .entry(keys::replica_set_key(pod))
            .or_default()
            .push(pod.clone());
    }
    debug!(
        workload_groups = workload_map.len(),
        replica_set_groups = replica_set_map.len(),
        "grouped pods by derived keys"
    );
    (workload_map, replica_set_map)
}

/// Resolve each HPA's pods through its target reference. `Deployment`
/// references go through the workload map, `ReplicaSet` references through
/// the replica-set map; any other kind resolves to an empty set, which is
/// not an error.
pub fn attach_hpa_pods(
    hpas: &mut [Hpa],
    workload_map: &HashMap<String, Vec<Pod>>,
    replica_set_map: &HashMap<String, Vec<Pod>>,
) {
    for hpa in hpas {
        let key = hpa.target_key();
        hpa.pods = match hpa.reference_kind.as_str() {
            "Deployment" => workload_map.get(&key).cloned().unwrap_or_default(),
            "ReplicaSet" => replica_set_map.get(&key).cloned().unwrap_or_default(),
            _ => Vec::new(),
        };
    }
}

/// Resolve each deployment's pods via its own `<namespace>|<name>` key.
pub fn attach_deployment_pods(
    deployments: &mut [Deployment],
    workload_map: &HashMap<String, Vec<Pod>>,
) {
    for deployment in deployments {
        deployment.pods = workload_map
            .get(&deployment.key())
            .cloned()
            .unwrap_or_default();
    }
}

/// Group pods onto the nodes they are scheduled on.
pub fn attach_node_pods(nodes: &mut [Node], pods: &[Pod]) {
    let mut by_node: HashMap<&str, Vec<Pod>> = HashMap::new();
    for pod in pods {
        by_node
            .entry(pod.spec.node_name.as_str())
            .or_default()
            .push(pod.clone());
    }
    for node in nodes {
        node.pods = by_node.remove(node.name()).unwrap_or_default();
    }
}

/// First disruption budget whose selector matches the group's first pod.
///
/// Labels are assumed homogeneous within one workload's pods, so sampling
/// one pod suffices. A group with zero pods gets no budget.
pub fn match_pdb(pods: &[Pod], pdbs: &[Pdb]) -> Option<Pdb> {
    let first = pods.first()?;
    pdbs.iter()
        .find(|pdb| pdb.matches(&first.metadata.labels))
        .cloned()
}

/// Attach disruption budgets to every HPA and deployment grouping that
/// resolved at least one pod.
pub fn attach_budgets(hpas: &mut [Hpa], deployments: &mut [Deployment], pdbs: &[Pdb]) {
    for hpa in hpas.iter_mut() {
        hpa.pdb = match_pdb(&hpa.pods, pdbs);
    }
    for deployment in deployments.iter_mut() {
        deployment.pdb = match_pdb(&deployment.pods, pdbs);
    }
}

/// Deployments whose `<namespace>|<name>` key is not among the HPAs'
/// resolved target keys.
pub fn deployments_without_hpa(deployments: &[Deployment], hpas: &[Hpa]) -> Vec<Deployment> {
    let targeted: HashSet<String> = hpas.iter().map(|h| h.target_key()).collect();
    let uncovered: Vec<Deployment> = deployments
        .iter()
        .filter(|d| !targeted.contains(&d.key()))
        .cloned()
        .collect();
    debug!(
        total = deployments.len(),
        without_hpa = uncovered.len(),
        "derived workloads without a scaling policy"
    );
    uncovered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LabelSelector, Metadata, OwnerReference, PdbSpec};

    fn pod(namespace: &str, name: &str, labels: &[(&str, &str)]) -> Pod {
        Pod {
            metadata: Metadata {
                name: name.into(),
                namespace: namespace.into(),
                labels: labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                owner_references: vec![OwnerReference {
                    kind: "ReplicaSet".into(),
                    name: name.rsplit_once('-').map(|(head, _)| head).unwrap_or(name).into(),
                }],
            },
            ..Pod::default()
        }
    }

    fn budget(namespace: &str, name: &str, selector: &[(&str, &str)]) -> Pdb {
        Pdb {
            metadata: Metadata {
                name: name.into(),
                namespace: namespace.into(),
                ..Metadata::default()
            },
            spec: PdbSpec {
                min_available: 1,
                selector: LabelSelector {
                    match_labels: selector
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                },
                ..PdbSpec::default()
            },
            ..Pdb::default()
        }
    }

    #[test]
    fn pods_group_by_derived_workload_key() {
        let pods = vec![
            pod("default", "api-545f46fb7f-aaaaa", &[]),
            pod("default", "api-545f46fb7f-bbbbb", &[]),
            pod("default", "worker-79d88c4f6-ccccc", &[]),
        ];
        let (workload_map, replica_set_map) = build_pod_maps(&pods);
        assert_eq!(workload_map["default|api"].len(), 2);
        assert_eq!(workload_map["default|worker"].len(), 1);
        assert_eq!(replica_set_map["default|api-545f46fb7f"].len(), 2);
    }

    #[test]
    fn hpa_resolves_deployment_and_replica_set_references() {
        let pods = vec![
            pod("default", "api-545f46fb7f-aaaaa", &[]),
            pod("default", "api-545f46fb7f-bbbbb", &[]),
        ];
        let (workload_map, replica_set_map) = build_pod_maps(&pods);

        let mut hpas = vec![
            Hpa {
                namespace: "default".into(),
                name: "api-hpa".into(),
                reference_kind: "Deployment".into(),
                reference_name: "api".into(),
                ..Hpa::default()
            },
            Hpa {
                namespace: "default".into(),
                name: "api-rs-hpa".into(),
                reference_kind: "ReplicaSet".into(),
                reference_name: "api-545f46fb7f".into(),
                ..Hpa::default()
            },
            Hpa {
                namespace: "default".into(),
                name: "odd-hpa".into(),
                reference_kind: "CronJob".into(),
                reference_name: "api".into(),
                ..Hpa::default()
            },
        ];
        attach_hpa_pods(&mut hpas, &workload_map, &replica_set_map);
        assert_eq!(hpas[0].pods.len(), 2);
        assert_eq!(hpas[1].pods.len(), 2);
        assert!(hpas[2].pods.is_empty());
    }

    #[test]
    fn unresolvable_join_keeps_entity_with_empty_set() {
        let (workload_map, replica_set_map) = build_pod_maps(&[]);
        let mut hpas = vec![Hpa {
            namespace: "default".into(),
            reference_kind: "Deployment".into(),
            reference_name: "scaled-to-zero".into(),
            ..Hpa::default()
        }];
        attach_hpa_pods(&mut hpas, &workload_map, &replica_set_map);
        assert!(hpas[0].pods.is_empty());
    }

    #[test]
    fn deployments_resolve_their_own_key() {
        let pods = vec![pod("default", "api-545f46fb7f-aaaaa", &[])];
        let (workload_map, _) = build_pod_maps(&pods);
        let mut deployments = vec![
            Deployment {
                namespace: "default".into(),
                name: "api".into(),
                ..Deployment::default()
            },
            Deployment {
                namespace: "default".into(),
                name: "idle".into(),
                ..Deployment::default()
            },
        ];
        attach_deployment_pods(&mut deployments, &workload_map);
        assert_eq!(deployments[0].pods.len(), 1);
        assert!(deployments[1].pods.is_empty());
    }

    #[test]
    fn nodes_group_pods_by_scheduling_field() {
        let mut schedulable = pod("default", "api-545f46fb7f-aaaaa", &[]);
        schedulable.spec.node_name = "node-a".into();
        let mut other = pod("default", "worker-79d88c4f6-ccccc", &[]);
        other.spec.node_name = "node-b".into();

        let mut nodes = vec![
            Node {
                metadata: crate::models::NodeMetadata {
                    name: "node-a".into(),
                    ..crate::models::NodeMetadata::default()
                },
                ..Node::default()
            },
            Node {
                metadata: crate::models::NodeMetadata {
                    name: "node-c".into(),
                    ..crate::models::NodeMetadata::default()
                },
                ..Node::default()
            },
        ];
        attach_node_pods(&mut nodes, &[schedulable, other]);
        assert_eq!(nodes[0].pods.len(), 1);
        assert!(nodes[1].pods.is_empty());
    }

    #[test]
    fn first_matching_budget_wins() {
        let pods = vec![pod("default", "ad-545f46fb7f-aaaaa", &[("app", "adservice")])];
        let pdbs = vec![
            budget("default", "other", &[("app", "checkout")]),
            budget("default", "ad-first", &[("app", "adservice")]),
            budget("default", "ad-second", &[("app", "adservice")]),
        ];
        let matched = match_pdb(&pods, &pdbs).unwrap();
        assert_eq!(matched.metadata.name, "ad-first");
    }

    #[test]
    fn zero_pod_group_gets_no_budget() {
        let pdbs = vec![budget("default", "catch-all", &[])];
        assert!(match_pdb(&[], &pdbs).is_none());
    }

    #[test]
    fn workloads_without_scaling_policy() {
        let deployments = vec![
            Deployment {
                namespace: "default".into(),
                name: "api".into(),
                ..Deployment::default()
            },
            Deployment {
                namespace: "default".into(),
                name: "batch".into(),
                ..Deployment::default()
            },
        ];
        let hpas = vec![Hpa {
            namespace: "default".into(),
            name: "api-hpa".into(),
            reference_kind: "Deployment".into(),
            reference_name: "api".into(),
            ..Hpa::default()
        }];
        let uncovered = deployments_without_hpa(&deployments, &hpas);
        assert_eq!(uncovered.len(), 1);
        assert_eq!(uncovered[0].name, "batch");
    }
}
