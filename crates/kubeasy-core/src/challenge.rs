//! Challenge metadata model and directory loading
//!
//! A challenge is a directory with a `challenge.yaml` metadata file and
//! optional `manifests/` and `policies/` subdirectories. The metadata is
//! read once per run and immutable afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::fieldpath::FieldPath;
use crate::objective::{Objective, ObjectiveSpec};

/// Metadata file name inside a challenge directory.
pub const CHALLENGE_FILE: &str = "challenge.yaml";

/// Subdirectory holding workload manifests.
pub const MANIFESTS_DIR: &str = "manifests";

/// Subdirectory holding policy manifests.
pub const POLICIES_DIR: &str = "policies";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeType {
    Fix,
    Build,
    Migrate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Parsed challenge.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub title: String,
    pub description: String,
    pub theme: String,

    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,

    pub difficulty: Difficulty,

    /// Estimated completion time in minutes.
    pub estimated_time: u32,

    #[serde(default)]
    pub initial_situation: String,

    #[serde(default)]
    pub objective: String,

    #[serde(default)]
    pub objectives: Vec<Objective>,
}

impl Challenge {
    /// Parse and validate a challenge.yaml document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let challenge: Challenge = serde_yaml::from_str(content)?;
        challenge.validate()?;
        Ok(challenge)
    }

    /// Enforce the schema invariants the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("theme", &self.theme),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        if self.estimated_time == 0 {
            return Err(CoreError::InvalidField {
                field: "estimatedTime".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        self.validate_objectives()
    }

    fn validate_objectives(&self) -> Result<()> {
        let mut seen_keys = std::collections::HashSet::new();
        for (i, objective) in self.objectives.iter().enumerate() {
            let field = format!("objectives[{}]", i);

            if objective.key.trim().is_empty() {
                return Err(CoreError::MissingField {
                    field: format!("{}.key", field),
                });
            }
            if !seen_keys.insert(objective.key.as_str()) {
                return Err(CoreError::InvalidField {
                    field: format!("{}.key", field),
                    message: format!("duplicate key '{}'", objective.key),
                });
            }

            objective
                .spec
                .target()
                .validate(&format!("{}.spec.target", field))?;

            // Status field paths are validated against the target kind
            // up front so a typo fails the load, not the grading run.
            if let ObjectiveSpec::Status(spec) = &objective.spec {
                for (j, check) in spec.checks.iter().enumerate() {
                    FieldPath::parse_for_kind(&check.field, &spec.target.kind).map_err(|e| {
                        CoreError::InvalidField {
                            field: format!("{}.spec.checks[{}].field", field, j),
                            message: e.to_string(),
                        }
                    })?;
                }
            }
        }

        // Orders must form a contiguous 1..N sequence.
        let mut orders: Vec<u32> = self.objectives.iter().map(|o| o.order).collect();
        orders.sort_unstable();
        for (i, order) in orders.iter().enumerate() {
            let expected = (i + 1) as u32;
            if *order != expected {
                return Err(CoreError::InvalidField {
                    field: "objectives".to_string(),
                    message: format!(
                        "orders must form a contiguous sequence from 1, found {} where {} was expected",
                        order, expected
                    ),
                });
            }
        }

        Ok(())
    }

    /// Objectives sorted by their declared order.
    pub fn objectives_in_order(&self) -> Vec<&Objective> {
        let mut ordered: Vec<&Objective> = self.objectives.iter().collect();
        ordered.sort_by_key(|o| o.order);
        ordered
    }
}

/// A challenge directory on disk.
#[derive(Debug, Clone)]
pub struct ChallengeDir {
    pub root: PathBuf,
    pub challenge: Challenge,
}

impl ChallengeDir {
    /// Load and validate `<root>/challenge.yaml`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let metadata_path = root.join(CHALLENGE_FILE);

        if !metadata_path.is_file() {
            return Err(CoreError::ChallengeNotFound {
                path: metadata_path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(&metadata_path)?;
        let challenge = Challenge::from_yaml(&content)?;

        Ok(Self { root, challenge })
    }

    pub fn manifests_dir(&self) -> PathBuf {
        self.root.join(MANIFESTS_DIR)
    }

    pub fn policies_dir(&self) -> PathBuf {
        self.root.join(POLICIES_DIR)
    }
}

/// Validate a challenge slug as a DNS-1123 label.
///
/// The slug doubles as the namespace name, so the namespace rules apply:
/// lowercase alphanumerics and `-`, at most 63 characters, first and last
/// character alphanumeric.
pub fn validate_slug(slug: &str) -> Result<()> {
    let fail = |message: &str| {
        Err(CoreError::InvalidSlug {
            slug: slug.to_string(),
            message: message.to_string(),
        })
    };

    if slug.is_empty() || slug.len() > 63 {
        return fail("must be 1-63 characters");
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return fail("only lowercase alphanumerics and '-' are allowed");
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return fail("must start and end with an alphanumeric character");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
title: Broken rollout
description: The web deployment never becomes ready.
theme: workloads
type: fix
difficulty: easy
estimatedTime: 15
"#;

    fn challenge_with_objectives(objectives: &str) -> String {
        format!("{}\nobjectives:\n{}", MINIMAL, objectives)
    }

    const TWO_OBJECTIVES: &str = r#"
  - key: web-ready
    title: Web is ready
    order: 1
    type: status
    spec:
      target:
        kind: Deployment
        name: web
      checks:
        - field: readyReplicas
          operator: ">="
          value: 1
  - key: no-oom
    title: No OOM kills
    order: 2
    type: event
    spec:
      target:
        kind: Pod
        labelSelector:
          app: web
      forbiddenReasons: [OOMKilled]
"#;

    #[test]
    fn test_minimal_challenge_parses() {
        let challenge = Challenge::from_yaml(MINIMAL).unwrap();
        assert_eq!(challenge.title, "Broken rollout");
        assert_eq!(challenge.challenge_type, ChallengeType::Fix);
        assert_eq!(challenge.difficulty, Difficulty::Easy);
        assert_eq!(challenge.estimated_time, 15);
        assert!(challenge.objectives.is_empty());
    }

    #[test]
    fn test_challenge_with_objectives_parses() {
        let yaml = challenge_with_objectives(TWO_OBJECTIVES);
        let challenge = Challenge::from_yaml(&yaml).unwrap();
        assert_eq!(challenge.objectives.len(), 2);

        let ordered = challenge.objectives_in_order();
        assert_eq!(ordered[0].key, "web-ready");
        assert_eq!(ordered[1].key, "no-oom");
    }

    #[test]
    fn test_empty_title_is_rejected() {
        let yaml = MINIMAL.replace("Broken rollout", "\"\"");
        let err = Challenge::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_zero_estimated_time_is_rejected() {
        let yaml = MINIMAL.replace("estimatedTime: 15", "estimatedTime: 0");
        let err = Challenge::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("estimatedTime"));
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let yaml = challenge_with_objectives(&TWO_OBJECTIVES.replace("no-oom", "web-ready"));
        let err = Challenge::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate key"));
    }

    #[test]
    fn test_non_contiguous_orders_are_rejected() {
        let yaml = challenge_with_objectives(&TWO_OBJECTIVES.replace("order: 2", "order: 3"));
        let err = Challenge::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("contiguous"));
    }

    #[test]
    fn test_unknown_status_field_fails_load() {
        let yaml = challenge_with_objectives(
            &TWO_OBJECTIVES.replace("readyReplicas", "currentRevision"),
        );
        let err = Challenge::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("checks[0].field"));
    }

    #[test]
    fn test_target_with_both_selectors_fails_load() {
        let broken = TWO_OBJECTIVES.replace(
            "kind: Deployment\n        name: web",
            "kind: Deployment\n        name: web\n        labelSelector:\n          app: web",
        );
        let yaml = challenge_with_objectives(&broken);
        let err = Challenge::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("exactly one of"));
    }

    #[test]
    fn test_challenge_dir_load() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CHALLENGE_FILE), MINIMAL).unwrap();

        let dir = ChallengeDir::load(temp.path()).unwrap();
        assert_eq!(dir.challenge.theme, "workloads");
        assert_eq!(dir.manifests_dir(), temp.path().join("manifests"));
        assert_eq!(dir.policies_dir(), temp.path().join("policies"));
    }

    #[test]
    fn test_challenge_dir_missing_metadata() {
        let temp = TempDir::new().unwrap();
        let err = ChallengeDir::load(temp.path()).unwrap_err();
        assert!(matches!(err, CoreError::ChallengeNotFound { .. }));
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("broken-rollout").is_ok());
        assert!(validate_slug("ch01").is_ok());

        assert!(validate_slug("").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("trailing-").is_err());
        assert!(validate_slug("UpperCase").is_err());
        assert!(validate_slug("under_score").is_err());
        assert!(validate_slug(&"a".repeat(64)).is_err());
    }
}
