//! Manifest application - create-or-update against live discovery
//!
//! Documents are applied strictly in bundle order so the author controls
//! dependencies (CRDs before CRs, namespaces before workloads). A single
//! bad document never sinks the bundle: malformed YAML, missing
//! apiVersion/kind/name, and kinds the cluster does not know are warned
//! about and skipped. Everything else that goes wrong aborts.

use kube::api::{Api, DynamicObject, PostParams};
use kube::core::{GroupVersionKind, TypeMeta};
use kube::discovery::{ApiCapabilities, ApiResource, Discovery, Scope};
use kube::Client;
use tracing::{debug, warn};

use kubeasy_core::{Bundle, BundleDocument};

use crate::error::{KubeError, Result};

/// Terminal state of one applied document.
#[derive(Debug, Clone)]
enum DocOutcome {
    Created(String),
    Updated(String),
    Skipped(String, String),
}

/// Summary of one bundle application.
#[derive(Debug, Clone, Default)]
pub struct ApplySummary {
    /// Resources created, as display names.
    pub created: Vec<String>,
    /// Resources updated in place.
    pub updated: Vec<String>,
    /// Skipped documents with the reason.
    pub skipped: Vec<(String, String)>,
}

impl ApplySummary {
    pub fn total(&self) -> usize {
        self.created.len() + self.updated.len() + self.skipped.len()
    }

    /// Format as a human-readable summary
    pub fn summary(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if !self.created.is_empty() {
            parts.push(format!("{} created", self.created.len()));
        }
        if !self.updated.is_empty() {
            parts.push(format!("{} configured", self.updated.len()));
        }
        if !self.skipped.is_empty() {
            parts.push(format!("{} skipped", self.skipped.len()));
        }
        if parts.is_empty() {
            "No resources processed".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Applies manifest bundles into a challenge namespace.
pub struct Applier {
    client: Client,
    discovery: Discovery,
    namespace: String,
}

impl Applier {
    /// Create an applier, running server discovery once.
    ///
    /// Discovery is cached for the life of this value, never across
    /// processes.
    pub async fn new(client: Client, namespace: impl Into<String>) -> Result<Self> {
        let discovery = Discovery::new(client.clone())
            .run()
            .await
            .map_err(KubeError::Api)?;

        Ok(Self {
            client,
            discovery,
            namespace: namespace.into(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Apply every document of a bundle, in order.
    pub async fn apply_bundle(&self, bundle: &Bundle) -> Result<ApplySummary> {
        let mut summary = ApplySummary::default();

        for document in &bundle.documents {
            match self.apply_document(document).await? {
                DocOutcome::Created(name) => summary.created.push(name),
                DocOutcome::Updated(name) => summary.updated.push(name),
                DocOutcome::Skipped(name, reason) => summary.skipped.push((name, reason)),
            }
        }

        Ok(summary)
    }

    async fn apply_document(&self, document: &BundleDocument) -> Result<DocOutcome> {
        let source = document.source.display().to_string();

        let (mut obj, types) = match decode_document(&document.content) {
            Ok(decoded) => decoded,
            Err(reason) => {
                warn!(source = %source, reason = %reason, "skipping manifest document");
                return Ok(DocOutcome::Skipped(source, reason));
            }
        };

        let gvk = gvk_from_type_meta(&types);
        let Some((api_resource, capabilities)) = self.discovery.resolve_gvk(&gvk) else {
            let reason = format!(
                "unknown resource type: {}/{}",
                types.api_version, types.kind
            );
            warn!(source = %source, reason = %reason, "skipping manifest document");
            return Ok(DocOutcome::Skipped(source, reason));
        };

        if should_inject_namespace(&capabilities.scope, obj.metadata.namespace.as_deref()) {
            obj.metadata.namespace = Some(self.namespace.clone());
        }

        let Some(name) = obj.metadata.name.clone() else {
            let reason = "missing metadata.name".to_string();
            warn!(source = %source, reason = %reason, "skipping manifest document");
            return Ok(DocOutcome::Skipped(source, reason));
        };

        let resource_display = display_name(&gvk.kind, &name, obj.metadata.namespace.as_deref());
        let api = self.api_for(&api_resource, &capabilities, obj.metadata.namespace.as_deref());

        match api.get_opt(&name).await? {
            None => {
                debug!(resource = %resource_display, "creating");
                api.create(&PostParams::default(), &obj).await?;
                Ok(DocOutcome::Created(resource_display))
            }
            Some(existing) => {
                debug!(resource = %resource_display, "updating");
                obj.metadata.resource_version = existing.metadata.resource_version.clone();
                api.replace(&name, &PostParams::default(), &obj).await?;
                Ok(DocOutcome::Updated(resource_display))
            }
        }
    }

    fn api_for(
        &self,
        api_resource: &ApiResource,
        capabilities: &ApiCapabilities,
        namespace: Option<&str>,
    ) -> Api<DynamicObject> {
        if capabilities.scope == Scope::Namespaced {
            let ns = namespace.unwrap_or(&self.namespace);
            Api::namespaced_with(self.client.clone(), ns, api_resource)
        } else {
            Api::all_with(self.client.clone(), api_resource)
        }
    }
}

/// Decode one document, separating skip reasons from usable objects.
fn decode_document(content: &str) -> std::result::Result<(DynamicObject, TypeMeta), String> {
    let obj: DynamicObject = serde_yaml::from_str(content)
        .map_err(|e| format!("invalid YAML: {}", e))?;

    let Some(types) = obj.types.clone() else {
        return Err("missing apiVersion or kind".to_string());
    };
    if types.api_version.is_empty() || types.kind.is_empty() {
        return Err("missing apiVersion or kind".to_string());
    }

    Ok((obj, types))
}

/// Namespace injection decision.
///
/// Only namespaced resources whose decoded document carries an empty
/// namespace field receive the active namespace; explicit namespaces
/// are preserved untouched and cluster-scoped resources never get one.
pub fn should_inject_namespace(scope: &Scope, namespace: Option<&str>) -> bool {
    *scope == Scope::Namespaced && namespace.is_none_or(str::is_empty)
}

/// Convert TypeMeta to GroupVersionKind
///
/// This function parses the apiVersion field to extract group and version:
/// - "apps/v1" -> group="apps", version="v1"
/// - "v1" -> group="", version="v1" (core API)
pub fn gvk_from_type_meta(tm: &TypeMeta) -> GroupVersionKind {
    let (group, version) = match tm.api_version.rsplit_once('/') {
        Some((g, v)) => (g.to_string(), v.to_string()),
        None => (String::new(), tm.api_version.clone()),
    };

    GroupVersionKind {
        group,
        version,
        kind: tm.kind.clone(),
    }
}

fn display_name(kind: &str, name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!("{}/{}/{}", ns, kind, name),
        None => format!("{}/{}", kind, name),
    }
}
