//! Event kernel - forbidden-event detection
//!
//! Lists core/v1 Events in the namespace and fails when any event with a
//! forbidden reason touched one of the resolved targets within the
//! lookback window.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Event;
use kube::api::{Api, ListParams};
use kube::Client;

use kubeasy_core::EventSpec;

use crate::error::Result;
use crate::target::{object_name, resolve_target};
use crate::validate::{CheckOutcome, no_matching_targets};

pub async fn evaluate(client: &Client, namespace: &str, spec: &EventSpec) -> Result<CheckOutcome> {
    let objects = resolve_target(client, namespace, &spec.target).await?;
    if objects.is_empty() {
        return Ok(no_matching_targets(&spec.target));
    }

    let names: HashSet<String> = objects
        .iter()
        .filter_map(|o| object_name(o).map(String::from))
        .collect();

    let api: Api<Event> = Api::namespaced(client.clone(), namespace);
    let events = api.list(&ListParams::default()).await?.items;

    let cutoff = Utc::now() - chrono::Duration::seconds(spec.effective_since());
    Ok(evaluate_events(&events, &spec.target.kind, &names, &spec.forbidden_reasons, cutoff))
}

/// Fail when a forbidden-reason event newer than `cutoff` involves one of
/// the named targets.
pub fn evaluate_events(
    events: &[Event],
    kind: &str,
    names: &HashSet<String>,
    forbidden_reasons: &[String],
    cutoff: DateTime<Utc>,
) -> CheckOutcome {
    let mut hits = Vec::new();

    for event in events {
        let Some(reason) = event.reason.as_deref() else {
            continue;
        };
        if !forbidden_reasons.iter().any(|r| r == reason) {
            continue;
        }

        let involved = &event.involved_object;
        if involved.kind.as_deref() != Some(kind) {
            continue;
        }
        let Some(name) = involved.name.as_deref() else {
            continue;
        };
        if !names.contains(name) {
            continue;
        }

        if event_timestamp(event).is_some_and(|t| t > cutoff) {
            hits.push(format!("{} on {}", reason, name));
        }
    }

    if hits.is_empty() {
        CheckOutcome::pass("No forbidden events found")
    } else {
        CheckOutcome::fail(format!("Forbidden events detected: {}", hits.join(", ")))
    }
}

/// Best timestamp an event carries: lastTimestamp, then eventTime, then
/// the creation timestamp.
fn event_timestamp(event: &Event) -> Option<DateTime<Utc>> {
    event
        .last_timestamp
        .as_ref()
        .map(|t| t.0)
        .or_else(|| event.event_time.as_ref().map(|t| t.0))
        .or_else(|| event.metadata.creation_timestamp.as_ref().map(|t| t.0))
}
