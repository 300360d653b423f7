//! Command-line glue: argument parsing, config resolution and the run report.
//!
//! All release logic lives in [`crate::publish`] and the forge clients; this
//! module wires them together and turns the result into an [`ExitStatus`].
//! Invoke [`run`] with a constructed [`Cli`] for programmatic use and tests.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use crate::config::{credential_from_env, Overrides, PublishConfig};
use crate::contract::AssetUploadOutcome;
use crate::discover::discover_assets;
use crate::error::{ExitStatus, ReleaseError};
use crate::forge;
use crate::load_config::{load_config, FileConfig};
use crate::publish::{publish, PublishReport};
use crate::release::GitHubPublisher;
use crate::upload::GitHubUploader;

/// Create a GitHub release and upload build artifacts to it.
#[derive(Parser, Debug)]
#[command(
    name = "github-release",
    about = "Create a GitHub release and upload a directory of files as its assets",
    disable_version_flag = true
)]
pub struct Cli {
    /// Print build information and exit
    #[arg(long)]
    pub version: bool,

    /// Path to a YAML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

/// Runs the CLI to completion and returns the process exit status.
pub async fn run(cli: Cli) -> ExitStatus {
    if cli.version {
        print_build_info();
        return ExitStatus::Success;
    }

    match execute(cli).await {
        Ok(report) => {
            print_report(&report);
            let status = report.exit_status();
            if let Some(halt) = &report.halted {
                eprintln!("[ERROR] {}", halt.error);
            }
            info!(exit_code = status.code(), "Release run finished");
            status
        }
        Err(e) => {
            error!(error = %e, "Release run failed");
            eprintln!("[ERROR] {e}");
            e.exit_status()
        }
    }
}

async fn execute(cli: Cli) -> Result<PublishReport, ReleaseError> {
    let credential = credential_from_env()?;

    let file_config = match &cli.config {
        Some(path) => load_config(path).map_err(|e| ReleaseError::Config(format!("{e:#}")))?,
        None => FileConfig::default(),
    };
    let config = PublishConfig::resolve(&cli.overrides, file_config)?;
    config.trace_loaded();

    // Snapshot the assets before anything is created on the forge.
    let assets = match &config.assets {
        Some(source) => discover_assets(&source.dir, &source.pattern)?,
        None => Vec::new(),
    };

    let http = forge::build_client(config.timeout)?;
    let publisher = GitHubPublisher::new(http.clone(), config.api_url.clone());
    let uploader = GitHubUploader::new(http, config.mime_types.clone());

    publish(
        &publisher,
        &uploader,
        &credential,
        &config.target,
        &config.release,
        &assets,
    )
    .await
}

fn print_report(report: &PublishReport) {
    println!(
        "Release {} created: {}",
        report.release.id, report.release.html_url
    );
    // Only stored assets are in the report; a rejection is the halt below.
    for asset in &report.assets {
        if let AssetUploadOutcome::Uploaded(uploaded) = &asset.outcome {
            println!("  uploaded {} -> {}", uploaded.name, uploaded.browser_download_url);
        } else if let AssetUploadOutcome::Undecodable { status, error, .. } = &asset.outcome {
            println!(
                "  uploaded {} ({status}, response not decodable: {error})",
                asset.path.display()
            );
        }
    }
    if let Some(halt) = &report.halted {
        println!("  failed {}: {}", halt.path.display(), halt.error);
        for path in &report.skipped {
            println!("  not attempted {}", path.display());
        }
    }
}

/// Build metadata for `--version`. Never touches the network.
pub fn build_info() -> Vec<(&'static str, String)> {
    vec![
        ("name", env!("CARGO_PKG_NAME").to_string()),
        ("version", env!("CARGO_PKG_VERSION").to_string()),
        ("repository", env!("CARGO_PKG_REPOSITORY").to_string()),
        ("os", std::env::consts::OS.to_string()),
        ("arch", std::env::consts::ARCH.to_string()),
        (
            "profile",
            if cfg!(debug_assertions) { "debug" } else { "release" }.to_string(),
        ),
    ]
}

fn print_build_info() {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    for (key, value) in build_info().iter().skip(2) {
        println!("{key}: {value}");
    }
}
