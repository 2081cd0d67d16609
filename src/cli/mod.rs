//! Command-line interface for rollbar-sourcemaps.
//!
//! Meant to be invoked once the bundler has finished writing its output,
//! e.g. as a `postbuild` script.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::adapters::ReqwestTransport;
use crate::config::{load_config, ConfigOverrides, RunConfig};
use crate::core::{Coordinator, Selection};
use crate::diagnostics::TracingDiagnostics;
use crate::domain::{BuildOutputSet, RunSummary};

/// rollbar-sourcemaps - upload bundler sourcemaps to Rollbar
#[derive(Parser, Debug)]
#[command(name = "rollbar-sourcemaps")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload the sourcemaps of a finished build
    Upload {
        #[command(flatten)]
        options: ConfigArgs,

        /// Bundler manifest of emitted files (JSON object/array or one name per line).
        /// Scans the output directory when omitted.
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },

    /// Show resolved configuration (access token redacted)
    Config {
        #[command(flatten)]
        options: ConfigArgs,
    },
}

/// Options shared by every command that resolves a configuration
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Config file (searches for .rollbar-sourcemaps.yaml when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Rollbar access token
    #[arg(long, env = "ROLLBAR_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Release/build identifier
    #[arg(long, env = "ROLLBAR_VERSION")]
    pub code_version: Option<String>,

    /// Public base URL the minified files are served from
    #[arg(long, env = "ROLLBAR_BASE_URL")]
    pub base_url: Option<String>,

    /// Build output directory [default: dist]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Prefix prepended to each file path [default: /]
    #[arg(long)]
    pub base: Option<String>,

    /// Sourcemap upload endpoint
    #[arg(long, env = "ROLLBAR_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Suppress per-file success notices
    #[arg(long)]
    pub silent: bool,

    /// Fail when any upload fails
    #[arg(long)]
    pub strict: bool,

    /// Locate sourcemaps without uploading them
    #[arg(long)]
    pub dry_run: bool,

    /// HTTP request timeout in seconds
    #[arg(long)]
    pub timeout_seconds: Option<u64>,
}

impl ConfigArgs {
    /// Flags only override when given, so config file values survive
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            access_token: self.access_token.clone(),
            version: self.code_version.clone(),
            base_url: self.base_url.clone(),
            silent: self.silent.then_some(true),
            rollbar_endpoint: self.endpoint.clone(),
            base: self.base.clone(),
            output_dir: self.output_dir.clone(),
            ignore_upload_errors: self.strict.then_some(false),
            dry_run: self.dry_run.then_some(true),
            timeout_seconds: self.timeout_seconds,
        }
    }

    pub fn resolve(&self) -> Result<RunConfig> {
        load_config(self.config.as_deref(), self.overrides())
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Upload { options, manifest } => upload(&options, manifest.as_deref()).await,
            Commands::Config { options } => show_config(&options),
        }
    }
}

/// Read a manifest file into a build output set
fn load_manifest(path: &Path) -> Result<BuildOutputSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

    BuildOutputSet::parse(&content)
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))
}

/// Run the upload pipeline
async fn upload(options: &ConfigArgs, manifest: Option<&Path>) -> Result<()> {
    let config = options.resolve()?;

    let selection = match manifest {
        Some(path) => Selection::Manifest(load_manifest(path)?),
        None => Selection::Pattern,
    };

    let transport = ReqwestTransport::new(config.timeout_seconds.map(Duration::from_secs))?;
    let coordinator = Coordinator::new(config, Arc::new(transport), Arc::new(TracingDiagnostics));

    let summary = coordinator.run(selection).await?;
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    if summary.is_empty() {
        println!("No sourcemaps found");
        return;
    }

    let skipped = summary.skipped();
    println!(
        "Sourcemaps: {} uploaded, {} skipped, {} failed",
        summary.uploaded().len(),
        skipped.len(),
        summary.failed().len()
    );
    for (filename, reason) in skipped {
        println!("  skipped {} ({})", filename, reason);
    }
}

/// Show resolved configuration
fn show_config(options: &ConfigArgs) -> Result<()> {
    let config = options.resolve()?;
    let yaml = serde_yaml::to_string(&config.redacted()).context("Failed to render config")?;
    print!("{}", yaml);
    Ok(())
}
