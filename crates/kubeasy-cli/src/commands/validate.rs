//! Validate command - grade a challenge against the cluster

use std::path::Path;
use std::time::{Duration, Instant};

use console::{Term, style};

use kubeasy_core::{ChallengeDir, Objective, validate_slug};
use kubeasy_kube::{Executor, ExecutorOptions};

use crate::display;
use crate::error::Result;
use crate::exit_codes;

pub async fn run(
    slug: &str,
    dir: &Path,
    fail_fast: bool,
    json: bool,
    watch: bool,
    watch_interval: u64,
) -> Result<i32> {
    validate_slug(slug)?;

    let challenge_dir = ChallengeDir::load(dir.join(slug))?;
    let objectives: Vec<Objective> = challenge_dir
        .challenge
        .objectives_in_order()
        .into_iter()
        .cloned()
        .collect();

    if objectives.is_empty() {
        if !json {
            println!(
                "{} Challenge {} has no objectives to validate",
                style("⚠").yellow(),
                slug
            );
        }
        return Ok(exit_codes::SUCCESS);
    }

    let client = kube::Client::try_default().await?;
    let executor = Executor::for_cluster(
        client,
        slug,
        ExecutorOptions {
            fail_fast,
            objective_timeout: None,
        },
    );

    if watch {
        return watch_loop(slug, &executor, &objectives, json, watch_interval).await;
    }

    let start = Instant::now();
    let results = if fail_fast {
        executor.execute_sequential(&objectives).await
    } else {
        executor.execute_all(&objectives).await
    };
    let elapsed = start.elapsed();

    if json {
        let report = display::json_report(slug, objectives.len(), &results, elapsed);
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    } else {
        display::render_results(&objectives, &results);
    }

    let all_passed = results.len() == objectives.len() && results.iter().all(|r| r.passed());
    Ok(if all_passed {
        exit_codes::SUCCESS
    } else {
        exit_codes::OBJECTIVES_FAILED
    })
}

/// Re-run `execute_all` on a ticker until SIGINT/SIGTERM.
///
/// The signal cancels whatever run is in flight; the loop itself never
/// installs more than this one handler.
async fn watch_loop<E: kubeasy_kube::ObjectiveEvaluator>(
    slug: &str,
    executor: &Executor<E>,
    objectives: &[Objective],
    json: bool,
    interval_seconds: u64,
) -> Result<i32> {
    let term = Term::stdout();
    let interval = Duration::from_secs(interval_seconds.max(1));

    loop {
        let iteration = async {
            let _ = term.clear_screen();
            let start = Instant::now();
            let results = executor.execute_all(objectives).await;
            let elapsed = start.elapsed();

            if json {
                let report = display::json_report(slug, objectives.len(), &results, elapsed);
                println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
            } else {
                display::render_results(objectives, &results);
                println!(
                    "\n{}",
                    style(format!(
                        "watching every {}s - press Ctrl-C to stop",
                        interval.as_secs()
                    ))
                    .dim()
                );
            }

            tokio::time::sleep(interval).await;
        };

        tokio::select! {
            _ = shutdown_signal() => break,
            _ = iteration => {}
        }
    }

    Ok(exit_codes::SUCCESS)
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
