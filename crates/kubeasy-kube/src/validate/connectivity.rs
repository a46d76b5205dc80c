//! Connectivity kernel - in-cluster HTTP probes from a source pod
//!
//! The probe runs inside the first Running source pod via the exec
//! subresource, so it observes exactly what the workload observes
//! (network policies included). curl prints `000` when the connection
//! itself fails, which surfaces as a status mismatch rather than an
//! infrastructure error.

use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, AttachParams};
use kube::Client;
use serde_json::Value;
use tokio::io::AsyncReadExt;

use kubeasy_core::ConnectivitySpec;

use crate::error::{KubeError, Result};
use crate::target::{object_name, resolve_target};
use crate::validate::CheckOutcome;

/// Extra slack on top of the in-pod timeout before we give up on exec.
const EXEC_GRACE: Duration = Duration::from_secs(5);

/// Issues one HTTP probe from inside a pod and reports the status code.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, pod: &str, url: &str, timeout: Duration) -> Result<u16>;
}

/// Production prober: remote-exec curl inside the source pod.
pub struct ExecProber {
    client: Client,
    namespace: String,
}

impl ExecProber {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl Prober for ExecProber {
    async fn probe(&self, pod: &str, url: &str, timeout: Duration) -> Result<u16> {
        if url.contains('\'') {
            return Err(KubeError::InvalidProbeUrl {
                url: url.to_string(),
            });
        }

        let api: Api<Pod> = Api::namespaced(self.client.clone(), &self.namespace);
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            format!(
                "curl -s -o /dev/null -w '%{{http_code}}' --max-time {} '{}'",
                timeout.as_secs(),
                url
            ),
        ];

        let params = AttachParams::default().stdout(true).stderr(false);
        let mut attached = tokio::time::timeout(timeout + EXEC_GRACE, api.exec(pod, command, &params))
            .await
            .map_err(|_| KubeError::Timeout {
                operation: format!("probe to {} from pod '{}'", url, pod),
            })??;

        let mut output = String::new();
        if let Some(mut stdout) = attached.stdout() {
            stdout
                .read_to_string(&mut output)
                .await
                .map_err(|e| KubeError::Exec {
                    pod: pod.to_string(),
                    message: e.to_string(),
                })?;
        }
        let _ = attached.join().await;

        output
            .trim()
            .parse::<u16>()
            .map_err(|_| KubeError::ProbeOutput {
                pod: pod.to_string(),
                output: output.trim().to_string(),
            })
    }
}

pub async fn evaluate(
    client: &Client,
    namespace: &str,
    spec: &ConnectivitySpec,
) -> Result<CheckOutcome> {
    let pods = resolve_target(client, namespace, &spec.source_pod).await?;
    let prober = ExecProber::new(client.clone(), namespace);
    evaluate_with_prober(&pods, spec, &prober).await
}

/// Pick the first Running source pod and run every probe from it.
pub async fn evaluate_with_prober(
    pods: &[Value],
    spec: &ConnectivitySpec,
    prober: &dyn Prober,
) -> Result<CheckOutcome> {
    if pods.is_empty() {
        return Ok(CheckOutcome::fail("No matching source pods found"));
    }

    let running: Vec<&str> = pods
        .iter()
        .filter(|pod| pod.pointer("/status/phase").and_then(Value::as_str) == Some("Running"))
        .filter_map(object_name)
        .collect();

    let Some(source) = running.first() else {
        return Ok(CheckOutcome::fail("No running source pods found"));
    };

    for target in &spec.targets {
        let timeout = Duration::from_secs(target.effective_timeout());
        let code = prober.probe(source, &target.url, timeout).await?;
        if code != target.expected_status_code {
            return Ok(CheckOutcome::fail(format!(
                "Status {} != {}",
                code, target.expected_status_code
            )));
        }
    }

    Ok(CheckOutcome::pass("All connectivity checks passed"))
}
