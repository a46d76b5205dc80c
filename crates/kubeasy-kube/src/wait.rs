//! Readiness waiter for challenge workloads
//!
//! After a bundle applies, every Deployment and StatefulSet in the
//! challenge namespace must settle before the user starts working:
//! generation observed, replicas ready, and (for StatefulSets) no
//! rolling update still in flight.

use std::fmt;
use std::time::{Duration, Instant};

use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use kube::api::{Api, ListParams};
use kube::Client;
use tracing::debug;

use crate::error::{KubeError, Result};

/// Interval between readiness polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Last observed readiness of one workload.
#[derive(Debug, Clone)]
pub struct WorkloadReadiness {
    pub kind: &'static str,
    pub name: String,
    pub ready: i32,
    pub desired: i32,
    pub is_ready: bool,
}

impl fmt::Display for WorkloadReadiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({}/{} ready)",
            self.kind, self.name, self.ready, self.desired
        )
    }
}

/// Readiness of a Deployment: generation observed and replicas ready.
pub fn deployment_readiness(deployment: &Deployment) -> WorkloadReadiness {
    let name = deployment.metadata.name.clone().unwrap_or_default();
    let generation = deployment.metadata.generation.unwrap_or(0);
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);

    let (observed, ready) = deployment
        .status
        .as_ref()
        .map(|s| {
            (
                s.observed_generation.unwrap_or(0),
                s.ready_replicas.unwrap_or(0),
            )
        })
        .unwrap_or((0, 0));

    WorkloadReadiness {
        kind: "Deployment",
        name,
        ready,
        desired,
        is_ready: observed >= generation && ready == desired,
    }
}

/// Readiness of a StatefulSet: as Deployment, plus revision-stable
/// (`currentRevision == updateRevision`, i.e. no rolling update).
pub fn statefulset_readiness(statefulset: &StatefulSet) -> WorkloadReadiness {
    let name = statefulset.metadata.name.clone().unwrap_or_default();
    let generation = statefulset.metadata.generation.unwrap_or(0);
    let desired = statefulset
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);

    let (observed, ready, revision_stable) = statefulset
        .status
        .as_ref()
        .map(|s| {
            (
                s.observed_generation.unwrap_or(0),
                s.ready_replicas.unwrap_or(0),
                s.current_revision == s.update_revision,
            )
        })
        .unwrap_or((0, 0, true));

    WorkloadReadiness {
        kind: "StatefulSet",
        name,
        ready,
        desired,
        is_ready: observed >= generation && ready == desired && revision_stable,
    }
}

/// Block until every Deployment and StatefulSet in the namespace is
/// ready, polling every two seconds.
///
/// On timeout the error names each pending workload with its
/// last-observed ready/desired counts.
pub async fn await_ready(client: &Client, namespace: &str, timeout: Duration) -> Result<()> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let statefulsets: Api<StatefulSet> = Api::namespaced(client.clone(), namespace);
    let deadline = Instant::now() + timeout;

    loop {
        let mut pending = Vec::new();

        for deployment in deployments.list(&ListParams::default()).await?.items {
            let readiness = deployment_readiness(&deployment);
            if !readiness.is_ready {
                pending.push(readiness);
            }
        }
        for statefulset in statefulsets.list(&ListParams::default()).await?.items {
            let readiness = statefulset_readiness(&statefulset);
            if !readiness.is_ready {
                pending.push(readiness);
            }
        }

        if pending.is_empty() {
            return Ok(());
        }

        if Instant::now() >= deadline {
            return Err(KubeError::ReadinessTimeout {
                pending: pending.iter().map(ToString::to_string).collect(),
            });
        }

        debug!(namespace = %namespace, pending = pending.len(), "workloads not ready yet");
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
