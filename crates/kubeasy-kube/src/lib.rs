//! Kubeasy Kube - cluster operations for the kubeasy CLI
//!
//! This crate provides:
//! - **Apply Engine**: create-or-update of manifest bundles via live discovery
//! - **Readiness Waiter**: block until Deployments/StatefulSets settle
//! - **Target Resolver**: typed lookup of objective targets
//! - **Validator Kernels**: the five objective evaluators
//! - **Validation Executor**: concurrent and fail-fast grading runs

pub mod apply;
pub mod error;
pub mod namespace;
pub mod target;
pub mod validate;
pub mod wait;

pub use apply::{Applier, ApplySummary};
pub use error::{KubeError, Result};
pub use namespace::{delete_namespace, ensure_namespace};
pub use target::resolve_target;
pub use validate::{
    CheckOutcome, ClusterEvaluator, Executor, ExecutorOptions, ObjectiveEvaluator,
    ObjectiveResult, Outcome,
};
pub use wait::await_ready;
