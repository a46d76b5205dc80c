//! Error types for kubeasy-kube

use thiserror::Error;

/// Result type for kubeasy-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur during Kubernetes operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// The target resolver has no typed client for this kind
    #[error("kind '{kind}' not supported by target resolver")]
    KindNotSupported { kind: String },

    /// Exec into a pod failed
    #[error("exec in pod '{pod}' failed: {message}")]
    Exec { pod: String, message: String },

    /// Probe command produced output we cannot interpret
    #[error("probe in pod '{pod}' returned no status code (output: '{output}')")]
    ProbeOutput { pod: String, output: String },

    /// Probe URL would break the in-pod shell invocation
    #[error("probe URL must not contain single quotes: {url}")]
    InvalidProbeUrl { url: String },

    /// Readiness wait ran out of time
    #[error("timed out waiting for workloads to become ready: {}", pending.join(", "))]
    ReadinessTimeout { pending: Vec<String> },

    /// A bounded operation exceeded its deadline
    #[error("operation timed out: {operation}")]
    Timeout { operation: String },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Core model error
    #[error(transparent)]
    Core(#[from] kubeasy_core::CoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 404)
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 409)
    }
}
