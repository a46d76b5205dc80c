//! Kubeasy Core - cluster-free types for the kubeasy CLI
//!
//! This crate provides:
//! - **Challenge Model**: challenge.yaml parsing and validation
//! - **Objective Specs**: the five validation kinds and their targets
//! - **FieldPath Evaluator**: dotted paths with array accessors over untyped trees
//! - **Bundle Loader**: manifest discovery and multi-document splitting

pub mod bundle;
pub mod challenge;
pub mod error;
pub mod fieldpath;
pub mod objective;

pub use bundle::{Bundle, BundleDocument, split_documents};
pub use challenge::{
    CHALLENGE_FILE, Challenge, ChallengeDir, ChallengeType, Difficulty, validate_slug,
};
pub use error::{CoreError, FieldPathError, Result};
pub use fieldpath::{CompareOp, FieldPath, PathToken, SUPPORTED_KINDS, scalar_to_string};
pub use objective::{
    ConditionCheck, ConditionSpec, ConnectivitySpec, EventSpec, HttpTarget, LogSpec, Objective,
    ObjectiveSpec, StatusCheck, StatusSpec, Target,
};
