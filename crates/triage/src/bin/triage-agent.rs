//! CLI entry point for the issue triage agent
//!
//! Run `triage-agent --help` for usage information.

// CLI binaries legitimately need println! for user output
#![allow(clippy::disallowed_macros)]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use triage::roster::DEFAULT_ROSTER_TABLE;
use triage::settings::{EngineOptions, RunSettings};
use triage::tracker::github::{RepoRef, DEFAULT_API_URL};
use triage::RunSummary;

#[derive(Parser)]
#[command(name = "triage-agent")]
#[command(about = "Apply classifier verdicts to GitHub issues")]
#[command(version)]
struct Cli {
    /// GitHub token with issues write access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// Repository in owner/repo format
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repo: String,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Triage policy file (YAML or JSON)
    #[arg(long, env = "TRIAGE_CONFIG", default_value = "classifier.yml")]
    config: PathBuf,

    /// Classification batch produced by the classifier
    #[arg(long, env = "TRIAGE_BATCH", default_value = "issue_labels.json")]
    batch: PathBuf,

    /// Pipe-delimited labels that do not block triage
    #[arg(long, env = "TRIAGE_ALLOW_LABELS", default_value = "")]
    allow_labels: String,

    /// Surface verdicts as labels and comments instead of acting on them
    #[arg(long, env = "TRIAGE_DIAGNOSTIC")]
    diagnostic: bool,

    /// Postgres connection string for the fallback roster
    #[arg(long, env = "ROSTER_DATABASE_URL", hide_env_values = true)]
    roster_url: Option<String>,

    /// Table holding the roster
    #[arg(long, env = "ROSTER_TABLE", default_value = DEFAULT_ROSTER_TABLE)]
    roster_table: String,

    /// Webhook receiving telemetry events
    #[arg(long, env = "TRIAGE_TELEMETRY_URL")]
    telemetry_url: Option<String>,

    /// Seed for the fallback picker
    #[arg(long)]
    seed: Option<u64>,

    /// Log format: text, json
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Summary output format: text, json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Cli {
    fn into_settings(self) -> Result<RunSettings> {
        let repo: RepoRef = self
            .repo
            .parse()
            .with_context(|| format!("Invalid repository '{}'", self.repo))?;

        Ok(RunSettings {
            token: self.token,
            repo,
            api_url: self.api_url,
            policy_path: self.config,
            batch_path: self.batch,
            roster_url: self.roster_url.filter(|url| !url.trim().is_empty()),
            roster_table: self.roster_table,
            telemetry_url: self.telemetry_url.filter(|url| !url.trim().is_empty()),
            seed: self.seed,
            engine: EngineOptions::new(&self.allow_labels, self.diagnostic),
        })
    }
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("triage=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn print_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Text => {
            for report in &summary.issues {
                println!("#{}: {}", report.issue, serde_json::to_string(&report.outcome)?);
            }
            println!(
                "processed {} | assigned {} | skipped {} | failed {}",
                summary.processed(),
                summary.assigned(),
                summary.skipped(),
                summary.failed()
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);
    let format = cli.format;

    let settings = cli.into_settings()?;
    tracing::debug!(?settings, "Resolved settings");

    let summary = triage::run(&settings).await?;
    print_summary(&summary, format)
}
