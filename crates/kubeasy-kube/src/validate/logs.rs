//! Log kernel - pattern search over recent container logs
//!
//! Logs from every matched pod (one container each: the named one, or
//! the pod's first) concatenate into a single haystack, so an expected
//! string only has to appear in at least one pod.

use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, LogParams};
use kube::Client;
use serde_json::Value;

use kubeasy_core::LogSpec;

use crate::error::Result;
use crate::target::{object_name, resolve_target};
use crate::validate::{CheckOutcome, no_matching_targets};

pub async fn evaluate(client: &Client, namespace: &str, spec: &LogSpec) -> Result<CheckOutcome> {
    let pods = resolve_target(client, namespace, &spec.target).await?;
    if pods.is_empty() {
        return Ok(no_matching_targets(&spec.target));
    }

    let api: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let mut haystack = String::new();

    for pod in &pods {
        let Some(name) = object_name(pod) else {
            continue;
        };

        let params = LogParams {
            container: container_for(pod, spec),
            since_seconds: Some(spec.effective_since()),
            ..Default::default()
        };

        let text = api.logs(name, &params).await?;
        haystack.push_str(&text);
        haystack.push('\n');
    }

    Ok(evaluate_haystack(&haystack, spec))
}

/// The container whose logs to read: the named one, or the pod's first.
fn container_for(pod: &Value, spec: &LogSpec) -> Option<String> {
    spec.container.clone().or_else(|| {
        pod.pointer("/spec/containers/0/name")
            .and_then(Value::as_str)
            .map(String::from)
    })
}

/// Every expected string must be present, no forbidden string may be.
pub fn evaluate_haystack(haystack: &str, spec: &LogSpec) -> CheckOutcome {
    let missing: Vec<&str> = spec
        .expected_strings
        .iter()
        .filter(|needle| !haystack.contains(needle.as_str()))
        .map(String::as_str)
        .collect();

    if !missing.is_empty() {
        return CheckOutcome::fail(format!("Missing strings in logs: {}", missing.join(", ")));
    }

    for needle in &spec.forbidden_strings {
        if haystack.contains(needle.as_str()) {
            return CheckOutcome::fail(format!("Forbidden string detected: {}", needle));
        }
    }

    CheckOutcome::pass("All log checks passed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(expected: &[&str], forbidden: &[&str]) -> LogSpec {
        serde_yaml::from_str(&format!(
            "target:\n  kind: Pod\n  labelSelector:\n    app: web\nexpectedStrings: [{}]\nforbiddenStrings: [{}]\n",
            expected
                .iter()
                .map(|s| format!("\"{}\"", s))
                .collect::<Vec<_>>()
                .join(", "),
            forbidden
                .iter()
                .map(|s| format!("\"{}\"", s))
                .collect::<Vec<_>>()
                .join(", "),
        ))
        .unwrap()
    }

    #[test]
    fn test_all_expected_present() {
        let outcome = evaluate_haystack(
            "server starting\nlistening on :8080\nready\n",
            &spec(&["listening on", "ready"], &[]),
        );
        assert!(outcome.passed);
        assert_eq!(outcome.message, "All log checks passed");
    }

    #[test]
    fn test_missing_expected_strings_are_listed() {
        let outcome = evaluate_haystack(
            "server starting\n",
            &spec(&["listening on", "ready"], &[]),
        );
        assert!(!outcome.passed);
        assert!(outcome.message.contains("Missing strings in logs"));
        assert!(outcome.message.contains("listening on"));
        assert!(outcome.message.contains("ready"));
    }

    #[test]
    fn test_forbidden_string_detected() {
        let outcome = evaluate_haystack(
            "listening on :8080\npanic: out of memory\n",
            &spec(&["listening on"], &["panic"]),
        );
        assert!(!outcome.passed);
        assert_eq!(outcome.message, "Forbidden string detected: panic");
    }

    #[test]
    fn test_haystack_spans_multiple_pods() {
        // One pod logged the first string, the other the second; the
        // union still satisfies both expectations.
        let haystack = "pod-a: listening on :8080\n\npod-b: ready\n";
        assert!(evaluate_haystack(haystack, &spec(&["listening on", "ready"], &[])).passed);
    }

    #[test]
    fn test_named_container_takes_precedence() {
        let mut log_spec = spec(&[], &[]);
        log_spec.container = Some("sidecar".to_string());
        let pod = json!({"spec": {"containers": [{"name": "app"}, {"name": "sidecar"}]}});
        assert_eq!(container_for(&pod, &log_spec), Some("sidecar".to_string()));
    }

    #[test]
    fn test_first_container_is_default() {
        let log_spec = spec(&[], &[]);
        let pod = json!({"spec": {"containers": [{"name": "app"}, {"name": "sidecar"}]}});
        assert_eq!(container_for(&pod, &log_spec), Some("app".to_string()));
    }
}
