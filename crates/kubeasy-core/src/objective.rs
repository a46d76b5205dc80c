//! Objective spec model - the five validation kinds and their targets

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::fieldpath::CompareOp;

/// Default lookback window for log and event checks, in seconds.
pub const DEFAULT_SINCE_SECONDS: i64 = 300;

/// Default per-target timeout for connectivity probes, in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECONDS: u64 = 5;

/// One graded assertion inside a challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    /// Unique key within the challenge.
    pub key: String,

    /// Short human title.
    pub title: String,

    /// Longer description shown to the user.
    #[serde(default)]
    pub description: String,

    /// Position in the 1..N grading sequence.
    pub order: u32,

    /// The typed check, tagged by `type` with payload under `spec`.
    #[serde(flatten)]
    pub spec: ObjectiveSpec,
}

/// Variant payload per objective type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "spec", rename_all = "lowercase")]
pub enum ObjectiveSpec {
    Status(StatusSpec),
    Condition(ConditionSpec),
    Log(LogSpec),
    Event(EventSpec),
    Connectivity(ConnectivitySpec),
}

impl ObjectiveSpec {
    /// The type name as spelled in challenge.yaml.
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectiveSpec::Status(_) => "status",
            ObjectiveSpec::Condition(_) => "condition",
            ObjectiveSpec::Log(_) => "log",
            ObjectiveSpec::Event(_) => "event",
            ObjectiveSpec::Connectivity(_) => "connectivity",
        }
    }

    /// The target selector this spec resolves, if any.
    pub fn target(&self) -> &Target {
        match self {
            ObjectiveSpec::Status(s) => &s.target,
            ObjectiveSpec::Condition(s) => &s.target,
            ObjectiveSpec::Log(s) => &s.target,
            ObjectiveSpec::Event(s) => &s.target,
            ObjectiveSpec::Connectivity(s) => &s.source_pod,
        }
    }
}

/// Selects objects of one kind by name or label conjunction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub label_selector: BTreeMap<String, String>,
}

impl Target {
    /// Exactly one of `name` / `labelSelector` must be set.
    pub fn validate(&self, field: &str) -> Result<()> {
        if self.kind.is_empty() {
            return Err(CoreError::MissingField {
                field: format!("{}.kind", field),
            });
        }
        let has_name = self.name.as_deref().is_some_and(|n| !n.is_empty());
        let has_selector = !self.label_selector.is_empty();
        if has_name == has_selector {
            return Err(CoreError::InvalidField {
                field: field.to_string(),
                message: "exactly one of name or labelSelector must be set".to_string(),
            });
        }
        Ok(())
    }

    /// Render the selector as `k=v,k=v` for list calls.
    pub fn selector_string(&self) -> String {
        self.label_selector
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Assertions over fields of the target's `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSpec {
    pub target: Target,
    pub checks: Vec<StatusCheck>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCheck {
    /// Field path, implicitly rooted at `status.`.
    pub field: String,
    pub operator: CompareOp,
    pub value: serde_json::Value,
}

/// Assertions over `status.conditions` entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionSpec {
    pub target: Target,
    pub conditions: Vec<ConditionCheck>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionCheck {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
}

/// Pattern search over recent container logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSpec {
    pub target: Target,

    /// Container to read; first container of each pod when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,

    #[serde(default)]
    pub expected_strings: Vec<String>,

    #[serde(default)]
    pub forbidden_strings: Vec<String>,

    /// Lookback window; zero resolves to the default.
    #[serde(default)]
    pub since_seconds: i64,
}

impl LogSpec {
    pub fn effective_since(&self) -> i64 {
        if self.since_seconds <= 0 {
            DEFAULT_SINCE_SECONDS
        } else {
            self.since_seconds
        }
    }
}

/// Forbidden-event detection against the target's recent events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSpec {
    pub target: Target,

    #[serde(default)]
    pub forbidden_reasons: Vec<String>,

    #[serde(default)]
    pub since_seconds: i64,
}

impl EventSpec {
    pub fn effective_since(&self) -> i64 {
        if self.since_seconds <= 0 {
            DEFAULT_SINCE_SECONDS
        } else {
            self.since_seconds
        }
    }
}

/// In-cluster HTTP probes executed from a source pod.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivitySpec {
    /// Must resolve to at least one Running pod.
    pub source_pod: Target,
    pub targets: Vec<HttpTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpTarget {
    pub url: String,
    pub expected_status_code: u16,

    /// Per-target timeout; zero resolves to the default.
    #[serde(default)]
    pub timeout_seconds: u64,
}

impl HttpTarget {
    pub fn effective_timeout(&self) -> u64 {
        if self.timeout_seconds == 0 {
            DEFAULT_PROBE_TIMEOUT_SECONDS
        } else {
            self.timeout_seconds
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named_target(kind: &str, name: &str) -> Target {
        Target {
            kind: kind.to_string(),
            name: Some(name.to_string()),
            label_selector: BTreeMap::new(),
        }
    }

    #[test]
    fn test_objective_yaml_round_trip() {
        let yaml = r#"
key: web-ready
title: Web deployment is ready
order: 1
type: status
spec:
  target:
    kind: Deployment
    name: web
  checks:
    - field: replicas
      operator: "=="
      value: 3
    - field: readyReplicas
      operator: ">="
      value: 2
"#;
        let objective: Objective = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(objective.key, "web-ready");
        assert_eq!(objective.order, 1);
        assert_eq!(objective.spec.type_name(), "status");

        let ObjectiveSpec::Status(spec) = &objective.spec else {
            panic!("expected status spec");
        };
        assert_eq!(spec.target.name.as_deref(), Some("web"));
        assert_eq!(spec.checks.len(), 2);
        assert_eq!(spec.checks[0].operator, CompareOp::Eq);
        assert_eq!(spec.checks[1].operator, CompareOp::Ge);
    }

    #[test]
    fn test_log_spec_defaults() {
        let yaml = r#"
key: app-logs
title: App logged startup
order: 1
type: log
spec:
  target:
    kind: Pod
    labelSelector:
      app: web
  expectedStrings: ["listening on"]
"#;
        let objective: Objective = serde_yaml::from_str(yaml).unwrap();
        let ObjectiveSpec::Log(spec) = &objective.spec else {
            panic!("expected log spec");
        };
        assert!(spec.container.is_none());
        assert!(spec.forbidden_strings.is_empty());
        assert_eq!(spec.since_seconds, 0);
        assert_eq!(spec.effective_since(), DEFAULT_SINCE_SECONDS);
    }

    #[test]
    fn test_connectivity_spec_defaults() {
        let yaml = r#"
key: can-reach-api
title: API reachable from client pod
order: 2
type: connectivity
spec:
  sourcePod:
    kind: Pod
    labelSelector:
      app: client
  targets:
    - url: http://api:8080/healthz
      expectedStatusCode: 200
"#;
        let objective: Objective = serde_yaml::from_str(yaml).unwrap();
        let ObjectiveSpec::Connectivity(spec) = &objective.spec else {
            panic!("expected connectivity spec");
        };
        assert_eq!(spec.targets[0].effective_timeout(), 5);
        assert_eq!(spec.targets[0].expected_status_code, 200);
    }

    #[test]
    fn test_event_spec_parses() {
        let yaml = r#"
key: no-oom
title: No OOM kills
order: 3
type: event
spec:
  target:
    kind: Pod
    labelSelector:
      app: x
  forbiddenReasons: [OOMKilled, Evicted]
  sinceSeconds: 300
"#;
        let objective: Objective = serde_yaml::from_str(yaml).unwrap();
        let ObjectiveSpec::Event(spec) = &objective.spec else {
            panic!("expected event spec");
        };
        assert_eq!(spec.forbidden_reasons, vec!["OOMKilled", "Evicted"]);
        assert_eq!(spec.effective_since(), 300);
    }

    #[test]
    fn test_target_requires_exactly_one_selector() {
        let neither = Target {
            kind: "Pod".to_string(),
            name: None,
            label_selector: BTreeMap::new(),
        };
        assert!(neither.validate("spec.target").is_err());

        let both = Target {
            kind: "Pod".to_string(),
            name: Some("p".to_string()),
            label_selector: BTreeMap::from([("app".to_string(), "x".to_string())]),
        };
        assert!(both.validate("spec.target").is_err());

        assert!(named_target("Pod", "p").validate("spec.target").is_ok());
    }

    #[test]
    fn test_target_selector_string() {
        let target = Target {
            kind: "Pod".to_string(),
            name: None,
            label_selector: BTreeMap::from([
                ("app".to_string(), "x".to_string()),
                ("tier".to_string(), "web".to_string()),
            ]),
        };
        assert_eq!(target.selector_string(), "app=x,tier=web");
    }

    #[test]
    fn test_unknown_objective_type_is_rejected() {
        let yaml = r#"
key: k
title: t
order: 1
type: metrics
spec: {}
"#;
        assert!(serde_yaml::from_str::<Objective>(yaml).is_err());
    }
}
