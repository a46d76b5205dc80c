//! Kubeasy CLI - author, deploy and grade Kubernetes challenges

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "kubeasy")]
#[command(author = "Kubeasy Contributors")]
#[command(version)]
#[command(about = "Author, deploy and grade Kubernetes challenges", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a challenge bundle and wait for readiness
    Apply {
        /// Challenge slug (doubles as the namespace name)
        slug: String,

        /// Directory containing challenge directories
        #[arg(long, value_name = "PATH", default_value = ".")]
        dir: PathBuf,

        /// Delete the challenge namespace before applying
        #[arg(long)]
        clean: bool,

        /// Readiness timeout in seconds
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// Grade a challenge against the cluster
    Validate {
        /// Challenge slug (doubles as the namespace name)
        slug: String,

        /// Directory containing challenge directories
        #[arg(long, value_name = "PATH", default_value = ".")]
        dir: PathBuf,

        /// Stop at the first failing objective
        #[arg(long)]
        fail_fast: bool,

        /// Emit the JSON report instead of human output
        #[arg(long)]
        json: bool,

        /// Re-run validation on an interval until interrupted
        #[arg(long)]
        watch: bool,

        /// Interval between watch runs, in seconds
        #[arg(long, default_value_t = 5)]
        watch_interval: u64,
    },

    /// Apply then validate in one shot
    Test {
        /// Challenge slug (doubles as the namespace name)
        slug: String,

        /// Directory containing challenge directories
        #[arg(long, value_name = "PATH", default_value = ".")]
        dir: PathBuf,

        /// Delete the challenge namespace before applying
        #[arg(long)]
        clean: bool,

        /// Stop at the first failing objective
        #[arg(long)]
        fail_fast: bool,

        /// Emit the JSON report instead of human output
        #[arg(long)]
        json: bool,

        /// Readiness timeout in seconds
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Apply {
            slug,
            dir,
            clean,
            timeout,
        } => commands::apply::run(&slug, &dir, clean, timeout, false).await,

        Commands::Validate {
            slug,
            dir,
            fail_fast,
            json,
            watch,
            watch_interval,
        } => commands::validate::run(&slug, &dir, fail_fast, json, watch, watch_interval).await,

        Commands::Test {
            slug,
            dir,
            clean,
            fail_fast,
            json,
            timeout,
        } => commands::test::run(&slug, &dir, clean, fail_fast, json, timeout).await,
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let code = e.exit_code();
            eprintln!("{:?}", miette::Report::new(e));
            std::process::exit(code);
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
