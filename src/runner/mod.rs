/// Resolve, fetch and run kubectl for a single CI step
use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::cache::ToolCache;
use crate::config::KubectlConfig;
use crate::tool::{BinaryFetcher, Platform, VersionResolver};
use crate::utils::command::{split_args, CommandBuilder};

/// Step inputs after trimming and defaulting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub version: String,
    pub args: String,
}

impl Inputs {
    /// Build inputs from raw values
    ///
    /// A blank version means `latest`; blank args mean no arguments.
    pub fn new(version: &str, args: &str) -> Self {
        let version = match version.trim() {
            "" => crate::tool::version::LATEST.to_string(),
            v => v.to_string(),
        };
        Self {
            version,
            args: args.trim().to_string(),
        }
    }
}

/// A resolved binary ready to be executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub version: String,
    pub binary: PathBuf,
    pub args: String,
}

impl Invocation {
    /// Run the binary with inherited stdio
    ///
    /// Fails when the process cannot be started or exits non-zero.
    pub async fn execute(&self) -> Result<()> {
        let args = split_args(&self.args);
        let display = self.binary.display();
        debug!("Running version {} with {} argument(s)", self.version, args.len());

        {
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "[command]{} {}", display, self.args);
            let _ = stdout.flush();
        }

        let status = CommandBuilder::new(&self.binary)
            .args(&args)
            .inherit_stdio()
            .context(format!("Failed to execute {}", display))
            .status()
            .await?;

        match status.code() {
            Some(0) => Ok(()),
            Some(code) => anyhow::bail!("The process '{}' failed with exit code {}", display, code),
            None => anyhow::bail!("The process '{}' was terminated by a signal", display),
        }
    }
}

/// Composes version resolution, fetching and execution
pub struct Runner<'a, C: ToolCache> {
    cache: &'a C,
    config: &'a KubectlConfig,
    platform: Platform,
}

impl<'a, C: ToolCache> Runner<'a, C> {
    /// Create a new runner
    pub fn new(cache: &'a C, config: &'a KubectlConfig, platform: Platform) -> Self {
        Self {
            cache,
            config,
            platform,
        }
    }

    /// Resolve the version and make sure the binary is present
    pub async fn prepare(&self, inputs: &Inputs) -> Result<Invocation> {
        let version = VersionResolver::new(self.cache, self.config)
            .resolve(&inputs.version)
            .await;

        let binary = BinaryFetcher::new(self.cache, self.config)
            .ensure_binary(&version, self.platform)
            .await
            .context(format!("Failed to prepare {}", self.config.tool_name))?;

        info!(
            "Using {} {} at {}",
            self.config.tool_name,
            version,
            binary.display()
        );

        Ok(Invocation {
            version,
            binary,
            args: inputs.args.clone(),
        })
    }

    /// Prepare and execute in one go
    pub async fn run(&self, inputs: &Inputs) -> Result<()> {
        let invocation = self.prepare(inputs).await?;
        invocation.execute().await
    }
}
