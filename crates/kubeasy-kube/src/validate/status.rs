//! Status kernel - field assertions against object status

use kube::Client;
use serde_json::Value;

use kubeasy_core::{FieldPath, StatusSpec, scalar_to_string};

use crate::error::Result;
use crate::target::resolve_target;
use crate::validate::{CheckOutcome, no_matching_targets};

pub async fn evaluate(client: &Client, namespace: &str, spec: &StatusSpec) -> Result<CheckOutcome> {
    let objects = resolve_target(client, namespace, &spec.target).await?;
    Ok(evaluate_objects(&objects, spec))
}

/// Every check must hold on every resolved object.
pub fn evaluate_objects(objects: &[Value], spec: &StatusSpec) -> CheckOutcome {
    if objects.is_empty() {
        return no_matching_targets(&spec.target);
    }

    for object in objects {
        for (index, check) in spec.checks.iter().enumerate() {
            let label = format!("check {} (field={})", index + 1, check.field);

            let path = match FieldPath::parse(&check.field) {
                Ok(path) => path,
                Err(e) => return CheckOutcome::fail(format!("{}: {}", label, e)),
            };

            // Fields missing at runtime (e.g. containerStatuses before
            // containers start) fail the check, not the run.
            let actual = match path.resolve(object) {
                Ok(value) => value,
                Err(e) => return CheckOutcome::fail(format!("{}: {}", label, e)),
            };

            match check.operator.evaluate(actual, &check.value) {
                Ok(true) => {}
                Ok(false) => {
                    return CheckOutcome::fail(format!(
                        "{}: expected {} {}, got {}",
                        label,
                        check.operator,
                        scalar_to_string(&check.value),
                        scalar_to_string(actual)
                    ));
                }
                Err(e) => return CheckOutcome::fail(format!("{}: {}", label, e)),
            }
        }
    }

    CheckOutcome::pass("All status checks passed")
}
