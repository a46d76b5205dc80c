//! Condition kernel - assertions on `status.conditions` entries

use kube::Client;
use serde_json::Value;

use kubeasy_core::ConditionSpec;

use crate::error::Result;
use crate::target::resolve_target;
use crate::validate::{CheckOutcome, no_matching_targets};

pub async fn evaluate(
    client: &Client,
    namespace: &str,
    spec: &ConditionSpec,
) -> Result<CheckOutcome> {
    let objects = resolve_target(client, namespace, &spec.target).await?;
    Ok(evaluate_objects(&objects, spec))
}

/// Every object must carry, for every check, a condition entry of the
/// expected type whose status matches. The first entry of a type wins.
pub fn evaluate_objects(objects: &[Value], spec: &ConditionSpec) -> CheckOutcome {
    if objects.is_empty() {
        return no_matching_targets(&spec.target);
    }

    for object in objects {
        let conditions = object
            .pointer("/status/conditions")
            .and_then(Value::as_array);

        for check in &spec.conditions {
            let matched = conditions.and_then(|entries| {
                entries.iter().find(|entry| {
                    entry.get("type").and_then(Value::as_str)
                        == Some(check.condition_type.as_str())
                })
            });

            let holds = matched
                .and_then(|entry| entry.get("status"))
                .and_then(Value::as_str)
                == Some(check.status.as_str());

            if !holds {
                return CheckOutcome::fail(format!(
                    "condition {} is not {}",
                    check.condition_type, check.status
                ));
            }
        }
    }

    CheckOutcome::pass("All conditions match")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(condition_type: &str, status: &str) -> ConditionSpec {
        serde_yaml::from_str(&format!(
            "target:\n  kind: Pod\n  name: p\nconditions:\n  - type: {}\n    status: \"{}\"\n",
            condition_type, status
        ))
        .unwrap()
    }

    fn pod_with_conditions(conditions: Value) -> Value {
        json!({
            "kind": "Pod",
            "metadata": {"name": "p"},
            "status": {"conditions": conditions},
        })
    }

    #[test]
    fn test_matching_condition_passes() {
        let object = pod_with_conditions(json!([
            {"type": "Initialized", "status": "True"},
            {"type": "Ready", "status": "True"},
        ]));
        let outcome = evaluate_objects(&[object], &spec("Ready", "True"));
        assert!(outcome.passed);
        assert_eq!(outcome.message, "All conditions match");
    }

    #[test]
    fn test_wrong_status_fails() {
        let object = pod_with_conditions(json!([{"type": "Ready", "status": "False"}]));
        let outcome = evaluate_objects(&[object], &spec("Ready", "True"));
        assert!(!outcome.passed);
        assert_eq!(outcome.message, "condition Ready is not True");
    }

    #[test]
    fn test_missing_condition_type_fails() {
        let object = pod_with_conditions(json!([{"type": "Initialized", "status": "True"}]));
        let outcome = evaluate_objects(&[object], &spec("Ready", "True"));
        assert!(!outcome.passed);
        assert_eq!(outcome.message, "condition Ready is not True");
    }

    #[test]
    fn test_object_without_conditions_fails() {
        let object = json!({"kind": "Pod", "metadata": {"name": "p"}, "status": {}});
        assert!(!evaluate_objects(&[object], &spec("Ready", "True")).passed);
    }

    #[test]
    fn test_first_matching_entry_wins() {
        // Duplicate types: only the first entry is consulted.
        let object = pod_with_conditions(json!([
            {"type": "Ready", "status": "True"},
            {"type": "Ready", "status": "False"},
        ]));
        assert!(evaluate_objects(&[object], &spec("Ready", "True")).passed);
    }

    #[test]
    fn test_empty_target_list_fails() {
        let outcome = evaluate_objects(&[], &spec("Ready", "True"));
        assert!(!outcome.passed);
        assert_eq!(outcome.message, "No matching Pod found");
    }
}
