//! Field path parsing and evaluation over untyped object trees
//!
//! A field path is a dotted string with optional array accessors,
//! implicitly rooted at `status`:
//!
//! - `readyReplicas` -> `status.readyReplicas`
//! - `conditions[0].type` -> first entry of `status.conditions`
//! - `conditions[type=Available].status` -> first entry whose `type`
//!   field equals `Available`
//!
//! Parsing is bracket-aware: a `.` inside `[...]` belongs to the
//! accessor, outside it separates segments. The walk operates on
//! `serde_json::Value`, which is the shape Kubernetes objects take once
//! they cross the dynamic client boundary.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FieldPathError;

/// Maximum accepted path length in characters.
pub const MAX_PATH_LENGTH: usize = 1000;

/// Maximum accepted token count, including the implicit root.
pub const MAX_PATH_DEPTH: usize = 50;

static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").expect("valid field name regex"));

/// One step of a parsed field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    /// Map key lookup.
    Field(String),
    /// Array element by index.
    Index(usize),
    /// First array element whose `key` stringifies equal to `value`.
    Filter { key: String, value: String },
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathToken::Field(name) => write!(f, "{}", name),
            PathToken::Index(i) => write!(f, "[{}]", i),
            PathToken::Filter { key, value } => write!(f, "[{}={}]", key, value),
        }
    }
}

/// A parsed field path, rooted at the implicit `status` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    tokens: Vec<PathToken>,
}

impl FieldPath {
    /// Parse a path string into a token sequence.
    ///
    /// The returned sequence always starts with `Field("status")`; the
    /// input never spells the root out.
    pub fn parse(path: &str) -> Result<Self, FieldPathError> {
        if path.len() > MAX_PATH_LENGTH {
            return Err(FieldPathError::TooLong {
                path: path.to_string(),
                len: path.len(),
                max: MAX_PATH_LENGTH,
            });
        }

        check_brackets(path)?;

        let mut tokens = vec![PathToken::Field("status".to_string())];
        for (segment, start) in split_segments(path) {
            parse_segment(path, segment, start, &mut tokens)?;
            if tokens.len() > MAX_PATH_DEPTH {
                return Err(FieldPathError::TooDeep {
                    path: path.to_string(),
                    depth: tokens.len(),
                    max: MAX_PATH_DEPTH,
                });
            }
        }

        Ok(Self { tokens })
    }

    /// Parse with a kind-aware check of the first segment under `status`.
    ///
    /// For the supported native kinds the first field token must name an
    /// attribute the kind declares directly under `status`. Unknown kinds
    /// (custom resources) skip the check, as do paths whose first step is
    /// an array accessor.
    pub fn parse_for_kind(path: &str, kind: &str) -> Result<Self, FieldPathError> {
        let parsed = Self::parse(path)?;
        if let Some(declared) = declared_status_fields(kind)
            && let Some(PathToken::Field(name)) = parsed.tokens.get(1)
            && !declared.contains(&name.as_str())
        {
            return Err(FieldPathError::UnknownStatusField {
                kind: kind.to_string(),
                field: name.clone(),
            });
        }
        Ok(parsed)
    }

    /// The token sequence, implicit root included.
    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    /// Walk an object tree, applying tokens left to right.
    pub fn resolve<'a>(&self, root: &'a Value) -> Result<&'a Value, FieldPathError> {
        let mut current = root;
        for token in &self.tokens {
            current = match token {
                PathToken::Field(name) => {
                    let map = current
                        .as_object()
                        .ok_or_else(|| FieldPathError::NotAnObject {
                            segment: name.clone(),
                        })?;
                    map.get(name).ok_or_else(|| FieldPathError::FieldNotFound {
                        segment: name.clone(),
                    })?
                }
                PathToken::Index(i) => {
                    let arr = current
                        .as_array()
                        .ok_or_else(|| FieldPathError::NotAnArray {
                            segment: token.to_string(),
                        })?;
                    arr.get(*i).ok_or(FieldPathError::IndexOutOfBounds {
                        index: *i,
                        len: arr.len(),
                    })?
                }
                PathToken::Filter { key, value } => {
                    let arr = current
                        .as_array()
                        .ok_or_else(|| FieldPathError::NotAnArray {
                            segment: token.to_string(),
                        })?;
                    arr.iter()
                        .find(|elem| {
                            elem.get(key)
                                .map(|v| scalar_to_string(v) == *value)
                                .unwrap_or(false)
                        })
                        .ok_or_else(|| FieldPathError::FilterNotMatched {
                            key: key.clone(),
                            value: value.clone(),
                        })?
                }
            };
        }
        Ok(current)
    }
}

impl fmt::Display for FieldPath {
    /// Serialize back to a path string, dropping the implicit root so the
    /// output re-parses to an identical sequence.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for token in self.tokens.iter().skip(1) {
            match token {
                PathToken::Field(_) => {
                    if !first {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", token)?;
                }
                _ => write!(f, "{}", token)?,
            }
            first = false;
        }
        Ok(())
    }
}

/// Comparison operator for status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
        };
        write!(f, "{}", symbol)
    }
}

impl CompareOp {
    /// Evaluate the operator against two scalars.
    ///
    /// Equality coerces across types: numeric-numeric compares
    /// numerically, string-numeric compares numerically when the string
    /// parses as a number, booleans and null compare exactly by type.
    /// Ordering requires both sides to coerce to numbers.
    pub fn evaluate(self, actual: &Value, expected: &Value) -> Result<bool, FieldPathError> {
        match self {
            CompareOp::Eq => Ok(scalars_equal(actual, expected)),
            CompareOp::Ne => Ok(!scalars_equal(actual, expected)),
            CompareOp::Gt | CompareOp::Lt | CompareOp::Ge | CompareOp::Le => {
                let (a, b) = match (numeric_value(actual), numeric_value(expected)) {
                    (Some(a), Some(b)) => (a, b),
                    _ => {
                        return Err(FieldPathError::NonComparable {
                            operator: self.to_string(),
                            left: scalar_to_string(actual),
                            right: scalar_to_string(expected),
                        });
                    }
                };
                Ok(match self {
                    CompareOp::Gt => a > b,
                    CompareOp::Lt => a < b,
                    CompareOp::Ge => a >= b,
                    CompareOp::Le => a <= b,
                    _ => unreachable!(),
                })
            }
        }
    }
}

/// Render a scalar for messages and filter comparison.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn scalars_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => {
            numeric_value(a) == numeric_value(b)
        }
        (Value::Number(_), Value::String(s)) | (Value::String(s), Value::Number(_)) => {
            match s.trim().parse::<f64>() {
                Ok(_) => numeric_value(a) == numeric_value(b),
                Err(_) => scalar_to_string(a) == scalar_to_string(b),
            }
        }
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

/// Verify bracket balance, reporting the position of the first offender.
fn check_brackets(path: &str) -> Result<(), FieldPathError> {
    let mut open: Option<usize> = None;
    for (pos, ch) in path.char_indices() {
        match ch {
            '[' => {
                if open.is_some() {
                    // Nested opens never form a valid accessor.
                    return Err(FieldPathError::UnbalancedBracket {
                        path: path.to_string(),
                        position: pos,
                    });
                }
                open = Some(pos);
            }
            ']' => {
                if open.take().is_none() {
                    return Err(FieldPathError::UnbalancedBracket {
                        path: path.to_string(),
                        position: pos,
                    });
                }
            }
            _ => {}
        }
    }
    if let Some(pos) = open {
        return Err(FieldPathError::UnbalancedBracket {
            path: path.to_string(),
            position: pos,
        });
    }
    Ok(())
}

/// Split on `.` outside brackets, keeping each segment's start position.
fn split_segments(path: &str) -> Vec<(&str, usize)> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (pos, ch) in path.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => {
                segments.push((&path[start..pos], start));
                start = pos + 1;
            }
            _ => {}
        }
    }
    segments.push((&path[start..], start));
    segments
}

/// Parse one segment (`name` optionally followed by accessors) into tokens.
fn parse_segment(
    path: &str,
    segment: &str,
    start: usize,
    tokens: &mut Vec<PathToken>,
) -> Result<(), FieldPathError> {
    let name_end = segment.find('[').unwrap_or(segment.len());
    let name = &segment[..name_end];

    if !FIELD_NAME_RE.is_match(name) {
        return Err(FieldPathError::InvalidFieldName {
            path: path.to_string(),
            segment: segment.to_string(),
        });
    }
    tokens.push(PathToken::Field(name.to_string()));

    let mut rest = &segment[name_end..];
    let mut offset = start + name_end;
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            // Trailing characters after a closed accessor.
            return Err(FieldPathError::InvalidFieldName {
                path: path.to_string(),
                segment: segment.to_string(),
            });
        }
        let close = rest.find(']').expect("brackets checked balanced");
        let accessor = &rest[1..close];
        tokens.push(parse_accessor(path, accessor, offset)?);
        offset += close + 1;
        rest = &rest[close + 1..];
    }
    Ok(())
}

fn parse_accessor(path: &str, accessor: &str, position: usize) -> Result<PathToken, FieldPathError> {
    if accessor.is_empty() {
        return Err(FieldPathError::EmptyAccessor {
            path: path.to_string(),
            position,
        });
    }
    if accessor.chars().all(|c| c.is_ascii_digit()) {
        let index = accessor
            .parse::<usize>()
            .map_err(|_| FieldPathError::InvalidAccessor {
                path: path.to_string(),
                accessor: accessor.to_string(),
            })?;
        return Ok(PathToken::Index(index));
    }
    if let Some((key, value)) = accessor.split_once('=') {
        if FIELD_NAME_RE.is_match(key) && !value.is_empty() {
            return Ok(PathToken::Filter {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
    }
    Err(FieldPathError::InvalidAccessor {
        path: path.to_string(),
        accessor: accessor.to_string(),
    })
}

/// Kinds whose status attributes are known at parse time.
pub const SUPPORTED_KINDS: &[&str] = &[
    "Pod",
    "Deployment",
    "StatefulSet",
    "ReplicaSet",
    "DaemonSet",
    "Job",
    "Service",
    "Node",
    "Namespace",
    "PersistentVolume",
    "PersistentVolumeClaim",
];

/// Attributes each supported kind declares directly under `status`.
///
/// Unknown kinds return `None` and skip parse-time validation, which is
/// what lets custom resources through.
pub fn declared_status_fields(kind: &str) -> Option<&'static [&'static str]> {
    let fields: &'static [&'static str] = match kind {
        "Pod" => &[
            "phase",
            "conditions",
            "message",
            "reason",
            "nominatedNodeName",
            "hostIP",
            "hostIPs",
            "podIP",
            "podIPs",
            "startTime",
            "initContainerStatuses",
            "containerStatuses",
            "ephemeralContainerStatuses",
            "qosClass",
            "resize",
            "resourceClaimStatuses",
        ],
        "Deployment" => &[
            "observedGeneration",
            "replicas",
            "updatedReplicas",
            "readyReplicas",
            "availableReplicas",
            "unavailableReplicas",
            "conditions",
            "collisionCount",
        ],
        "StatefulSet" => &[
            "observedGeneration",
            "replicas",
            "readyReplicas",
            "currentReplicas",
            "updatedReplicas",
            "currentRevision",
            "updateRevision",
            "collisionCount",
            "conditions",
            "availableReplicas",
        ],
        "ReplicaSet" => &[
            "replicas",
            "fullyLabeledReplicas",
            "readyReplicas",
            "availableReplicas",
            "observedGeneration",
            "conditions",
        ],
        "DaemonSet" => &[
            "currentNumberScheduled",
            "numberMisscheduled",
            "desiredNumberScheduled",
            "numberReady",
            "observedGeneration",
            "updatedNumberScheduled",
            "numberAvailable",
            "numberUnavailable",
            "collisionCount",
            "conditions",
        ],
        "Job" => &[
            "conditions",
            "startTime",
            "completionTime",
            "active",
            "succeeded",
            "failed",
            "terminating",
            "completedIndexes",
            "failedIndexes",
            "uncountedTerminatedPods",
            "ready",
        ],
        "Service" => &["loadBalancer", "conditions"],
        "Node" => &[
            "capacity",
            "allocatable",
            "phase",
            "conditions",
            "addresses",
            "daemonEndpoints",
            "nodeInfo",
            "images",
            "volumesInUse",
            "volumesAttached",
            "config",
            "runtimeHandlers",
        ],
        "Namespace" => &["phase", "conditions"],
        "PersistentVolume" => &["phase", "message", "reason", "lastPhaseTransitionTime"],
        "PersistentVolumeClaim" => &[
            "phase",
            "accessModes",
            "capacity",
            "conditions",
            "allocatedResources",
            "allocatedResourceStatuses",
            "currentVolumeAttributesClassName",
            "modifyVolumeStatus",
        ],
        _ => return None,
    };
    Some(fields)
}
