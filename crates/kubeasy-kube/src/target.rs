//! Target resolution - from a `Target` selector to concrete objects
//!
//! Resolution goes through the typed client for the supported kinds and
//! hands the results over as untyped trees, which is the shape the field
//! path evaluator and the validator kernels consume. A `name` target does
//! a single Get (NotFound yields an empty list, not an error); a label
//! selector target does a filtered List preserving server order.

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{
    Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod, Service,
};
use kube::api::{Api, ListParams};
use kube::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use kubeasy_core::Target;

use crate::error::{KubeError, Result};

/// Resolve a target to the objects it selects, in the active namespace.
pub async fn resolve_target(client: &Client, namespace: &str, target: &Target) -> Result<Vec<Value>> {
    match target.kind.as_str() {
        "Pod" => fetch(Api::<Pod>::namespaced(client.clone(), namespace), target).await,
        "Deployment" => {
            fetch(
                Api::<Deployment>::namespaced(client.clone(), namespace),
                target,
            )
            .await
        }
        "StatefulSet" => {
            fetch(
                Api::<StatefulSet>::namespaced(client.clone(), namespace),
                target,
            )
            .await
        }
        "ReplicaSet" => {
            fetch(
                Api::<ReplicaSet>::namespaced(client.clone(), namespace),
                target,
            )
            .await
        }
        "DaemonSet" => {
            fetch(
                Api::<DaemonSet>::namespaced(client.clone(), namespace),
                target,
            )
            .await
        }
        "Job" => fetch(Api::<Job>::namespaced(client.clone(), namespace), target).await,
        "Service" => {
            fetch(
                Api::<Service>::namespaced(client.clone(), namespace),
                target,
            )
            .await
        }
        "PersistentVolumeClaim" => {
            fetch(
                Api::<PersistentVolumeClaim>::namespaced(client.clone(), namespace),
                target,
            )
            .await
        }
        "Node" => fetch(Api::<Node>::all(client.clone()), target).await,
        "Namespace" => fetch(Api::<Namespace>::all(client.clone()), target).await,
        "PersistentVolume" => fetch(Api::<PersistentVolume>::all(client.clone()), target).await,
        other => Err(KubeError::KindNotSupported {
            kind: other.to_string(),
        }),
    }
}

async fn fetch<K>(api: Api<K>, target: &Target) -> Result<Vec<Value>>
where
    K: Clone + DeserializeOwned + Serialize + std::fmt::Debug,
{
    if let Some(name) = target.name.as_deref().filter(|n| !n.is_empty()) {
        match api.get_opt(name).await? {
            Some(obj) => Ok(vec![serde_json::to_value(obj)?]),
            None => Ok(Vec::new()),
        }
    } else {
        let params = ListParams::default().labels(&target.selector_string());
        let list = api.list(&params).await?;
        list.items
            .into_iter()
            .map(|obj| serde_json::to_value(obj).map_err(Into::into))
            .collect()
    }
}

/// The name of a resolved object, when it carries one.
pub fn object_name(object: &Value) -> Option<&str> {
    object.pointer("/metadata/name").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_name() {
        let obj = json!({"metadata": {"name": "web", "namespace": "ch1"}});
        assert_eq!(object_name(&obj), Some("web"));
        assert_eq!(object_name(&json!({"metadata": {}})), None);
        assert_eq!(object_name(&json!({})), None);
    }
}
