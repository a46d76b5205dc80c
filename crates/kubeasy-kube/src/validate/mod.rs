//! Validation executor and objective results
//!
//! The executor owns scheduling only; evaluation lives in the kernels.
//! `execute_all` dispatches every objective concurrently and writes each
//! result into a slot indexed by input position, so the output vector
//! always matches input order no matter which probe finishes first.
//! `execute_sequential` runs one at a time and, under fail-fast, stops at
//! the first objective that does not pass.

pub mod condition;
pub mod connectivity;
pub mod events;
pub mod logs;
pub mod status;

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use kube::Client;
use tokio::time::Instant;

use kubeasy_core::{Objective, ObjectiveSpec, Target};

use crate::error::Result;

/// Verdict of one kernel evaluation: the check held or it did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub message: String,
}

impl CheckOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

/// Failing outcome for a target that resolved to nothing.
pub(crate) fn no_matching_targets(target: &Target) -> CheckOutcome {
    CheckOutcome::fail(format!("No matching {} found", target.kind))
}

/// Terminal state of one objective run.
///
/// `Errored` is an infrastructure fault (client error, unresolvable
/// target) and is distinct from `Failed`, a valid check that did not
/// hold. `Cancelled` only happens when the outer run is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    Errored,
    Cancelled,
}

/// Result of one objective, ordered to match the input objectives.
#[derive(Debug, Clone)]
pub struct ObjectiveResult {
    pub key: String,
    pub objective_type: &'static str,
    pub title: String,
    pub outcome: Outcome,
    pub message: String,
    pub duration: Duration,
}

impl ObjectiveResult {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// Evaluates a single objective against whatever backs it.
///
/// The cluster-backed implementation dispatches to the validator
/// kernels; tests substitute a mock to drive the executor without a
/// cluster.
#[async_trait]
pub trait ObjectiveEvaluator: Send + Sync {
    async fn evaluate(&self, objective: &Objective) -> Result<CheckOutcome>;
}

/// Kernel dispatch against a live cluster.
pub struct ClusterEvaluator {
    client: Client,
    namespace: String,
}

impl ClusterEvaluator {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl ObjectiveEvaluator for ClusterEvaluator {
    async fn evaluate(&self, objective: &Objective) -> Result<CheckOutcome> {
        let client = &self.client;
        let namespace = self.namespace.as_str();
        match &objective.spec {
            ObjectiveSpec::Status(spec) => status::evaluate(client, namespace, spec).await,
            ObjectiveSpec::Condition(spec) => condition::evaluate(client, namespace, spec).await,
            ObjectiveSpec::Log(spec) => logs::evaluate(client, namespace, spec).await,
            ObjectiveSpec::Event(spec) => events::evaluate(client, namespace, spec).await,
            ObjectiveSpec::Connectivity(spec) => {
                connectivity::evaluate(client, namespace, spec).await
            }
        }
    }
}

/// Execution options shared by both entry points.
#[derive(Debug, Clone, Default)]
pub struct ExecutorOptions {
    /// Stop `execute_sequential` at the first non-pass.
    pub fail_fast: bool,

    /// Per-objective deadline; unbounded when unset.
    pub objective_timeout: Option<Duration>,
}

/// Runs an ordered objective list and aggregates results.
pub struct Executor<E> {
    evaluator: E,
    options: ExecutorOptions,
}

impl Executor<ClusterEvaluator> {
    /// Executor over a live cluster in the given namespace.
    pub fn for_cluster(client: Client, namespace: impl Into<String>, options: ExecutorOptions) -> Self {
        Self::new(ClusterEvaluator::new(client, namespace), options)
    }
}

impl<E: ObjectiveEvaluator> Executor<E> {
    pub fn new(evaluator: E, options: ExecutorOptions) -> Self {
        Self { evaluator, options }
    }

    /// Run every objective concurrently; results match input order.
    pub async fn execute_all(&self, objectives: &[Objective]) -> Vec<ObjectiveResult> {
        let mut slots: Vec<Option<ObjectiveResult>> = objectives.iter().map(|_| None).collect();

        let tasks = objectives
            .iter()
            .enumerate()
            .map(|(index, objective)| async move { (index, self.execute_one(objective).await) });

        for (index, result) in join_all(tasks).await {
            slots[index] = Some(result);
        }

        slots
            .into_iter()
            .map(|slot| slot.expect("every dispatched objective fills its slot"))
            .collect()
    }

    /// Run objectives one at a time, in order.
    ///
    /// Under fail-fast the first non-pass ends the run; objectives that
    /// were never dispatched are the output adapter's problem, not ours.
    pub async fn execute_sequential(&self, objectives: &[Objective]) -> Vec<ObjectiveResult> {
        let mut results = Vec::with_capacity(objectives.len());

        for objective in objectives {
            let result = self.execute_one(objective).await;
            let stop = self.options.fail_fast && !result.passed();
            results.push(result);
            if stop {
                break;
            }
        }

        results
    }

    async fn execute_one(&self, objective: &Objective) -> ObjectiveResult {
        let start = Instant::now();

        let evaluation = match self.options.objective_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.evaluator.evaluate(objective)).await
            {
                Ok(result) => result,
                Err(_) => {
                    return self.finish(
                        objective,
                        Outcome::Errored,
                        format!(
                            "objective '{}' timed out after {}s",
                            objective.key,
                            limit.as_secs()
                        ),
                        start,
                    );
                }
            },
            None => self.evaluator.evaluate(objective).await,
        };

        match evaluation {
            Ok(outcome) if outcome.passed => {
                self.finish(objective, Outcome::Passed, outcome.message, start)
            }
            Ok(outcome) => self.finish(objective, Outcome::Failed, outcome.message, start),
            Err(e) => self.finish(objective, Outcome::Errored, e.to_string(), start),
        }
    }

    fn finish(
        &self,
        objective: &Objective,
        outcome: Outcome,
        message: String,
        start: Instant,
    ) -> ObjectiveResult {
        ObjectiveResult {
            key: objective.key.clone(),
            objective_type: objective.spec.type_name(),
            title: objective.title.clone(),
            outcome,
            message,
            duration: start.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::error::KubeError;

    /// Canned evaluator: outcome per key, optional per-key delay so slow
    /// early objectives finish after fast late ones.
    struct MockEvaluator {
        outcomes: HashMap<String, std::result::Result<bool, String>>,
        delays: HashMap<String, Duration>,
    }

    impl MockEvaluator {
        fn new(outcomes: &[(&str, std::result::Result<bool, &str>)]) -> Self {
            Self {
                outcomes: outcomes
                    .iter()
                    .map(|(k, v)| {
                        (
                            k.to_string(),
                            v.as_ref().map(|b| *b).map_err(|e| e.to_string()),
                        )
                    })
                    .collect(),
                delays: HashMap::new(),
            }
        }

        fn with_delay(mut self, key: &str, delay: Duration) -> Self {
            self.delays.insert(key.to_string(), delay);
            self
        }
    }

    #[async_trait]
    impl ObjectiveEvaluator for MockEvaluator {
        async fn evaluate(&self, objective: &Objective) -> Result<CheckOutcome> {
            if let Some(delay) = self.delays.get(&objective.key) {
                tokio::time::sleep(*delay).await;
            }
            match self.outcomes.get(&objective.key) {
                Some(Ok(true)) => Ok(CheckOutcome::pass("ok")),
                Some(Ok(false)) => Ok(CheckOutcome::fail("nope")),
                Some(Err(message)) => Err(KubeError::Timeout {
                    operation: message.clone(),
                }),
                None => Ok(CheckOutcome::pass("ok")),
            }
        }
    }

    fn objective(key: &str, order: u32) -> Objective {
        serde_yaml::from_str(&format!(
            r#"
key: {key}
title: Objective {key}
order: {order}
type: status
spec:
  target:
    kind: Deployment
    name: web
  checks:
    - field: readyReplicas
      operator: ">="
      value: 1
"#
        ))
        .unwrap()
    }

    fn objectives(keys: &[&str]) -> Vec<Objective> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| objective(k, (i + 1) as u32))
            .collect()
    }

    #[tokio::test]
    async fn test_execute_all_preserves_input_order() {
        // First objective is the slowest; its slot must still come first.
        let evaluator = MockEvaluator::new(&[("a", Ok(true)), ("b", Ok(false)), ("c", Ok(true))])
            .with_delay("a", Duration::from_millis(80))
            .with_delay("b", Duration::from_millis(20));

        let executor = Executor::new(evaluator, ExecutorOptions::default());
        let input = objectives(&["a", "b", "c"]);
        let results = executor.execute_all(&input).await;

        let keys: Vec<&str> = results.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(results[0].outcome, Outcome::Passed);
        assert_eq!(results[1].outcome, Outcome::Failed);
    }

    #[tokio::test]
    async fn test_execute_all_records_errors_and_continues() {
        let evaluator =
            MockEvaluator::new(&[("a", Err("boom")), ("b", Ok(true))]);
        let executor = Executor::new(evaluator, ExecutorOptions::default());
        let results = executor.execute_all(&objectives(&["a", "b"])).await;

        assert_eq!(results[0].outcome, Outcome::Errored);
        assert!(results[0].message.contains("boom"));
        assert_eq!(results[1].outcome, Outcome::Passed);
    }

    #[tokio::test]
    async fn test_execute_sequential_fail_fast_stops() {
        let evaluator =
            MockEvaluator::new(&[("a", Ok(false)), ("b", Ok(true)), ("c", Ok(true))]);
        let executor = Executor::new(
            evaluator,
            ExecutorOptions {
                fail_fast: true,
                objective_timeout: None,
            },
        );
        let results = executor
            .execute_sequential(&objectives(&["a", "b", "c"]))
            .await;

        // Only the first objective was dispatched.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].key, "a");
        assert_eq!(results[0].outcome, Outcome::Failed);
    }

    #[tokio::test]
    async fn test_execute_sequential_without_fail_fast_runs_all() {
        let evaluator =
            MockEvaluator::new(&[("a", Ok(false)), ("b", Ok(true))]);
        let executor = Executor::new(evaluator, ExecutorOptions::default());
        let results = executor.execute_sequential(&objectives(&["a", "b"])).await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_objective_timeout_maps_to_errored() {
        let evaluator = MockEvaluator::new(&[("slow", Ok(true))])
            .with_delay("slow", Duration::from_millis(200));
        let executor = Executor::new(
            evaluator,
            ExecutorOptions {
                fail_fast: false,
                objective_timeout: Some(Duration::from_millis(20)),
            },
        );
        let results = executor.execute_all(&objectives(&["slow"])).await;

        assert_eq!(results[0].outcome, Outcome::Errored);
        assert!(results[0].message.contains("timed out"));
        assert!(results[0].message.contains("slow"));
    }

    #[tokio::test]
    async fn test_durations_are_recorded() {
        let evaluator =
            MockEvaluator::new(&[("a", Ok(true))]).with_delay("a", Duration::from_millis(30));
        let executor = Executor::new(evaluator, ExecutorOptions::default());
        let results = executor.execute_all(&objectives(&["a"])).await;
        assert!(results[0].duration >= Duration::from_millis(30));
    }

    #[test]
    fn test_no_matching_targets_message() {
        let target: Target = serde_yaml::from_str("kind: Deployment\nname: web").unwrap();
        let outcome = no_matching_targets(&target);
        assert!(!outcome.passed);
        assert_eq!(outcome.message, "No matching Deployment found");
    }
}
