//! Challenge namespace lifecycle
//!
//! The challenge slug is the namespace name. `clean` deletes the
//! namespace and must wait for termination to finish - recreating a
//! namespace that is still terminating fails on the server side.

use std::time::{Duration, Instant};

use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Api, DeleteParams, ObjectMeta, PostParams};
use kube::Client;
use tracing::debug;

use crate::error::{KubeError, Result};

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Create the namespace if it does not exist yet.
pub async fn ensure_namespace(client: &Client, name: &str) -> Result<()> {
    let api: Api<Namespace> = Api::all(client.clone());

    if api.get_opt(name).await?.is_some() {
        debug!(namespace = %name, "namespace already exists");
        return Ok(());
    }

    let namespace = Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    match api.create(&PostParams::default(), &namespace).await {
        Ok(_) => Ok(()),
        // Lost the race against a concurrent create; the namespace exists.
        Err(kube::Error::Api(resp)) if resp.code == 409 => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Delete the namespace and wait until it is fully gone.
///
/// Deleting a namespace cascades over everything namespaced inside it.
/// NotFound means there is nothing to clean and counts as success.
pub async fn delete_namespace(client: &Client, name: &str, timeout: Duration) -> Result<()> {
    let api: Api<Namespace> = Api::all(client.clone());

    match api.delete(name, &DeleteParams::background()).await {
        Ok(_) => {}
        Err(kube::Error::Api(resp)) if resp.code == 404 => return Ok(()),
        Err(e) => return Err(e.into()),
    }

    let deadline = Instant::now() + timeout;
    while api.get_opt(name).await?.is_some() {
        if Instant::now() >= deadline {
            return Err(KubeError::Timeout {
                operation: format!("deleting namespace '{}'", name),
            });
        }
        debug!(namespace = %name, "waiting for namespace termination");
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    Ok(())
}
