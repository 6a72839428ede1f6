/// kubectl-action
///
/// Installs a requested kubectl version on a CI runner, caching it in the
/// runner's tool cache, and runs it with the step's arguments.
mod actions;
mod cache;
mod config;
mod runner;
mod tool;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache::{HttpDownloader, LocalToolCache};
use crate::config::KubectlConfig;
use crate::runner::{Inputs, Runner};
use crate::tool::Platform;

#[derive(Parser)]
#[command(name = "kubectl-action")]
#[command(about = "Install kubectl on a CI runner and run it", long_about = None)]
struct Cli {
    /// kubectl version to run, "latest" for the current stable release
    /// (defaults to the `version` action input)
    #[arg(long = "kubectl-version")]
    kubectl_version: Option<String>,

    /// Arguments passed to kubectl (defaults to the `args` action input)
    #[arg(long, allow_hyphen_values = true)]
    args: Option<String>,

    /// Configuration file overriding download endpoints and retries
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tool cache directory
    #[arg(long, env = "RUNNER_TOOL_CACHE")]
    tool_cache: Option<PathBuf>,

    /// Directory for temporary downloads
    #[arg(long, env = "RUNNER_TEMP")]
    temp_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn inputs(&self) -> Inputs {
        let version = self
            .kubectl_version
            .clone()
            .unwrap_or_else(|| actions::get_input("version"));
        let args = self
            .args
            .clone()
            .unwrap_or_else(|| actions::get_input("args"));
        Inputs::new(&version, &args)
    }

    fn tool_cache_dir(&self) -> PathBuf {
        self.tool_cache
            .clone()
            .unwrap_or_else(|| default_work_dir().join("tool-cache"))
    }

    fn download_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| default_work_dir().join("temp"))
    }
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("kubectl-action")
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose || actions::is_debug() {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("kubectl_action={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(&cli).await {
        actions::set_failed(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Resolve, fetch and run kubectl
async fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => KubectlConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => KubectlConfig::default(),
    };

    let inputs = cli.inputs();
    let downloader = HttpDownloader::new(config.download.clone())?;
    let cache = LocalToolCache::new(cli.tool_cache_dir(), cli.download_dir(), downloader);

    Runner::new(&cache, &config, Platform::current())
        .run(&inputs)
        .await
}
