//! Positional parsing of kubectl's whitespace-delimited tabular output
//!
//! Two historical deployment layouts exist: the newer one carries a combined
//! `ready/total` token, the older one separate integer columns. The newer
//! pattern is attempted first. Fields are captured by position, never by
//! header name. Lines fitting neither pattern are skipped and counted rather
//! than aborting the feed; numeric fields inside a matched line default to
//! zero.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::models::{ContainerSample, Deployment, Hpa, ResourceSample};

/// Rows parsed from one tabular feed plus the count of skipped lines.
#[derive(Debug, Default)]
pub struct TabularOutcome<T> {
    pub rows: T,
    pub skipped: usize,
}

fn deployment_combined_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\S+)\s+(\S+)\s+(\S+)/(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s*$")
            .expect("valid combined deployment pattern")
    })
}

fn deployment_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s*$")
            .expect("valid split deployment pattern")
    })
}

fn hpa_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\S+)\s+(\S+)\s+(\S+)/(\S+)\s+(?:(\S+)%|<unknown>)/(\S+)%\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s*$",
        )
        .expect("valid hpa pattern")
    })
}

fn sample_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s*$")
            .expect("valid sample pattern")
    })
}

fn parse_count(field: &str) -> i64 {
    field.parse().unwrap_or(0)
}

fn keep_namespace(namespace: &str, filter: Option<&str>) -> bool {
    filter.map(|ns| ns == namespace).unwrap_or(true)
}

/// Parse the scalable-workloads feed, newer layout first.
pub fn parse_deployments(data: &str, namespace: Option<&str>) -> TabularOutcome<Vec<Deployment>> {
    let mut out = TabularOutcome::<Vec<Deployment>>::default();
    for line in data.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(deployment) = parse_deployment_line(line) else {
            debug!(line, "unparsable workload row");
            out.skipped += 1;
            continue;
        };
        if keep_namespace(&deployment.namespace, namespace) {
            out.rows.push(deployment);
        }
    }
    if out.skipped > 0 {
        warn!(skipped = out.skipped, "skipped unparsable workload rows");
    }
    out
}

fn parse_deployment_line(line: &str) -> Option<Deployment> {
    if let Some(caps) = deployment_combined_re().captures(line) {
        return Some(Deployment {
            namespace: caps[1].to_string(),
            name: caps[2].to_string(),
            ready_replicas: parse_count(&caps[3]),
            desired_replicas: parse_count(&caps[4]),
            up_to_date: parse_count(&caps[5]),
            available: parse_count(&caps[6]),
            age: caps[7].to_string(),
            ..Deployment::default()
        });
    }
    let caps = deployment_split_re().captures(line)?;
    Some(Deployment {
        namespace: caps[1].to_string(),
        name: caps[2].to_string(),
        ready_replicas: parse_count(&caps[3]),
        desired_replicas: parse_count(&caps[4]),
        up_to_date: parse_count(&caps[5]),
        available: parse_count(&caps[6]),
        age: caps[7].to_string(),
        ..Deployment::default()
    })
}

/// Parse the scaling-policies feed. The current-usage column may literally
/// be `<unknown>`; that sentinel is preserved as `None`, never coerced to
/// zero.
pub fn parse_hpas(data: &str, namespace: Option<&str>) -> TabularOutcome<Vec<Hpa>> {
    let mut out = TabularOutcome::<Vec<Hpa>>::default();
    for line in data.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(caps) = hpa_re().captures(line) else {
            debug!(line, "unparsable scaling-policy row");
            out.skipped += 1;
            continue;
        };
        if !keep_namespace(&caps[1], namespace) {
            continue;
        }
        out.rows.push(Hpa {
            namespace: caps[1].to_string(),
            name: caps[2].to_string(),
            reference_kind: caps[3].to_string(),
            reference_name: caps[4].to_string(),
            current_usage: caps.get(5).map(|m| parse_count(m.as_str())),
            target_percent: parse_count(&caps[6]),
            min_replicas: parse_count(&caps[7]),
            max_replicas: parse_count(&caps[8]),
            replicas: parse_count(&caps[9]),
            age: caps[10].to_string(),
            ..Hpa::default()
        });
    }
    if out.skipped > 0 {
        warn!(skipped = out.skipped, "skipped unparsable scaling-policy rows");
    }
    out
}

/// Parse the live-samples feed, accumulating container readings per
/// `<namespace>|<pod>` key.
pub fn parse_resource_samples(
    data: &str,
    namespace: Option<&str>,
) -> TabularOutcome<HashMap<String, ResourceSample>> {
    let mut out = TabularOutcome::<HashMap<String, ResourceSample>>::default();
    for line in data.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(caps) = sample_re().captures(line) else {
            debug!(line, "unparsable resource-sample row");
            out.skipped += 1;
            continue;
        };
        if !keep_namespace(&caps[1], namespace) {
            continue;
        }
        let key = format!("{}|{}", &caps[1], &caps[2]);
        let sample = out.rows.entry(key).or_insert_with(|| ResourceSample {
            namespace: caps[1].to_string(),
            pod: caps[2].to_string(),
            containers: Vec::new(),
        });
        sample.containers.push(ContainerSample {
            name: caps[3].to_string(),
            cpu: caps[4].to_string(),
            memory: caps[5].to_string(),
        });
    }
    if out.skipped > 0 {
        warn!(skipped = out.skipped, "skipped unparsable resource-sample rows");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_layout_deployment_row() {
        let data = "qdc-web-test                  qdc-web-test                                         0      0      0      0      169d";
        let out = parse_deployments(data, None);
        assert_eq!(out.skipped, 0);
        let deployment = &out.rows[0];
        assert_eq!(deployment.namespace, "qdc-web-test");
        assert_eq!(deployment.name, "qdc-web-test");
        assert_eq!(deployment.ready_replicas, 0);
        assert_eq!(deployment.desired_replicas, 0);
        assert_eq!(deployment.up_to_date, 0);
        assert_eq!(deployment.available, 0);
        assert_eq!(deployment.age, "169d");
    }

    #[test]
    fn combined_layout_deployment_row() {
        let data = "istio-system               grafana                                    1/1     1            1           133d";
        let out = parse_deployments(data, None);
        assert_eq!(out.skipped, 0);
        let deployment = &out.rows[0];
        assert_eq!(deployment.namespace, "istio-system");
        assert_eq!(deployment.name, "grafana");
        assert_eq!(deployment.ready_replicas, 1);
        assert_eq!(deployment.desired_replicas, 1);
        assert_eq!(deployment.up_to_date, 1);
        assert_eq!(deployment.available, 1);
        assert_eq!(deployment.age, "133d");
    }

    #[test]
    fn line_matching_neither_layout_is_skipped_and_counted() {
        let data = "istio-system grafana 1/1 1 1 133d\nbogus line\n";
        let out = parse_deployments(data, None);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.skipped, 1);
    }

    #[test]
    fn non_numeric_count_defaults_to_zero_without_dropping_the_row() {
        let data = "prod api x/3 2 oops 40d";
        let out = parse_deployments(data, None);
        assert_eq!(out.skipped, 0);
        let deployment = &out.rows[0];
        assert_eq!(deployment.ready_replicas, 0);
        assert_eq!(deployment.desired_replicas, 3);
        assert_eq!(deployment.available, 0);
        assert_eq!(deployment.age, "40d");
    }

    #[test]
    fn namespace_filter_applies_at_parse_time() {
        let data = "\
default        api        1/1     1            1           12d
istio-system   grafana    1/1     1            1           133d";
        let out = parse_deployments(data, Some("default"));
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].name, "api");
    }

    #[test]
    fn hpa_rows_distinguish_unknown_from_numeric_usage() {
        let data = "\
default        nginx-1-hpa                                             Deployment/nginx-1                 <unknown>/80%   1         5         3          33d
default        paymentservice                                          Deployment/paymentservice          4%/80%          2         20        2          87d";
        let out = parse_hpas(data, None);
        assert_eq!(out.skipped, 0);

        let unknown = &out.rows[0];
        assert_eq!(unknown.namespace, "default");
        assert_eq!(unknown.name, "nginx-1-hpa");
        assert_eq!(unknown.reference_kind, "Deployment");
        assert_eq!(unknown.reference_name, "nginx-1");
        assert_eq!(unknown.current_usage, None);
        assert_eq!(unknown.target_percent, 80);
        assert_eq!(unknown.min_replicas, 1);
        assert_eq!(unknown.max_replicas, 5);
        assert_eq!(unknown.replicas, 3);
        assert_eq!(unknown.age, "33d");

        let measured = &out.rows[1];
        assert_eq!(measured.name, "paymentservice");
        assert_eq!(measured.current_usage, Some(4));
        assert_eq!(measured.target_percent, 80);
        assert_eq!(measured.min_replicas, 2);
        assert_eq!(measured.max_replicas, 20);
        assert_eq!(measured.replicas, 2);
        assert_eq!(measured.age, "87d");
    }

    #[test]
    fn hpa_row_without_reference_slash_is_skipped() {
        let out = parse_hpas("default broken-hpa nothing 4%/80% 1 5 3 33d", None);
        assert!(out.rows.is_empty());
        assert_eq!(out.skipped, 1);
    }

    #[test]
    fn samples_accumulate_containers_per_pod() {
        let data = "\
default   web-0       web       30m   20Mi
default   web-0       sidecar   2m    5Mi
kube-system   dns-5d8b7    dns      3m    12Mi";
        let out = parse_resource_samples(data, None);
        assert_eq!(out.rows.len(), 2);
        let web = &out.rows["default|web-0"];
        assert_eq!(web.containers.len(), 2);
        assert_eq!(web.milli_cpu(), 32);
        assert_eq!(web.mebi_memory(), 25);
    }

    #[test]
    fn sample_namespace_filter() {
        let data = "\
default   web-0    web   30m   20Mi
other     api-1    api   5m    8Mi";
        let out = parse_resource_samples(data, Some("other"));
        assert_eq!(out.rows.len(), 1);
        assert!(out.rows.contains_key("other|api-1"));
    }
}
