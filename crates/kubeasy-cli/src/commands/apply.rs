//! Apply command - deploy a challenge bundle into its namespace

use std::path::Path;
use std::time::Duration;

use console::style;
use indicatif::ProgressBar;

use kubeasy_core::{Bundle, ChallengeDir, validate_slug};
use kubeasy_kube::{Applier, await_ready, delete_namespace, ensure_namespace};

use crate::error::Result;
use crate::exit_codes;

/// Run the apply command.
///
/// `quiet` suppresses the human progress output; the test command uses
/// it so `--json` keeps stdout machine-readable.
pub async fn run(slug: &str, dir: &Path, clean: bool, timeout: u64, quiet: bool) -> Result<i32> {
    validate_slug(slug)?;

    let challenge_dir = ChallengeDir::load(dir.join(slug))?;
    let bundle = Bundle::load(&challenge_dir.root)?;
    let timeout = Duration::from_secs(timeout);

    if !quiet {
        println!(
            "{} Deploying challenge {} into namespace {}",
            style("→").blue().bold(),
            style(&challenge_dir.challenge.title).cyan(),
            style(slug).yellow()
        );
    }

    let client = kube::Client::try_default().await?;

    if clean {
        let spinner = progress(quiet, format!("Deleting namespace {}", slug));
        delete_namespace(&client, slug, timeout).await?;
        spinner.finish_and_clear();
        if !quiet {
            println!("{} Cleaned namespace {}", style("✓").green().bold(), slug);
        }
    }

    ensure_namespace(&client, slug).await?;

    let applier = Applier::new(client.clone(), slug).await?;
    let summary = applier.apply_bundle(&bundle).await?;

    if !quiet {
        println!(
            "{} Applied {} document(s): {}",
            style("✓").green().bold(),
            summary.total(),
            summary.summary()
        );
        for (name, reason) in &summary.skipped {
            println!("{} skipped {}: {}", style("⚠").yellow(), name, reason);
        }
    }

    let spinner = progress(quiet, "Waiting for workloads to become ready".to_string());
    let wait_result = await_ready(&client, slug, timeout).await;
    spinner.finish_and_clear();
    wait_result?;

    if !quiet {
        println!("{} All workloads ready", style("✓").green().bold());
    }

    Ok(exit_codes::SUCCESS)
}

fn progress(quiet: bool, message: String) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
