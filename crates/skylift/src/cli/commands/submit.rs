//! Submit command

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use tracing::info;

use skylift_core::{resolve_config, InlineConfig};
use skylift_stores::{failure_count, HttpAdapterFactory, ReporterSet, SubmissionConfig};

use super::ConfigArgs;
use crate::cli::{output, progress::ProgressReporter, Cli};
use crate::exit_codes;

/// Upload and submit the configured extension ZIPs
///
/// Every store whose ZIP is configured is submitted concurrently. The exit
/// code is the number of stores that failed.
#[derive(Debug, Args)]
pub struct SubmitCommand {
    #[command(flatten)]
    pub sources: ConfigArgs,

    /// Only check authentication, don't upload anything
    #[arg(long)]
    pub dry_run: bool,

    /// Chrome Web Store ZIP
    #[arg(long, value_name = "PATH")]
    pub chrome_zip: Option<PathBuf>,

    /// Firefox Add-ons ZIP
    #[arg(long, value_name = "PATH")]
    pub firefox_zip: Option<PathBuf>,

    /// Source code ZIP uploaded alongside the Firefox version
    #[arg(long, value_name = "PATH")]
    pub firefox_sources_zip: Option<PathBuf>,

    /// Edge Add-ons ZIP
    #[arg(long, value_name = "PATH")]
    pub edge_zip: Option<PathBuf>,

    /// Seconds between status checks
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Seconds to wait for a store before giving up
    #[arg(long, value_name = "SECS")]
    pub poll_timeout: Option<u64>,
}

impl SubmitCommand {
    fn flags(&self) -> InlineConfig {
        let mut flags = InlineConfig::default();
        if self.dry_run {
            flags.dry_run = Some(true);
        }
        flags.poll.interval_secs = self.poll_interval;
        flags.poll.timeout_secs = self.poll_timeout;
        flags.chrome.zip = self.chrome_zip.clone();
        flags.firefox.zip = self.firefox_zip.clone();
        flags.firefox.sources_zip = self.firefox_sources_zip.clone();
        flags.edge.zip = self.edge_zip.clone();
        flags
    }

    /// Execute the submit command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<i32> {
        info!(dry_run = self.dry_run, "executing submit command");
        let config = resolve_config(&self.sources.gather(self.flags())?)?;

        if cli.is_text() {
            print_plan(&config);
        }

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli, &config))
    }

    async fn execute_async(&self, cli: &Cli, config: &SubmissionConfig) -> anyhow::Result<i32> {
        let factory = HttpAdapterFactory::new(config.poll)?;

        let mut reporters = ReporterSet::new();
        if cli.is_text() {
            reporters.register(ProgressReporter::new());
        }

        let results = skylift_stores::submit(config, &factory, Arc::new(reporters)).await?;
        output::print_results(&results, cli.format, cli.quiet)?;

        Ok(exit_codes::from_failures(failure_count(&results)))
    }
}

fn print_plan(config: &SubmissionConfig) {
    let stores: Vec<&str> = config.store_ids().iter().map(|s| s.display_name()).collect();
    if stores.is_empty() {
        return;
    }

    output::info(&format!("Submitting to {}", stores.join(", ")));
    if config.dry_run {
        println!("  {}", style("DRY RUN").yellow().bold());
    }
    println!();
}
