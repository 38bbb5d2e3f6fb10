//! Shell completions

use std::io;
use std::path::PathBuf;

use clap::{Args, CommandFactory};
use clap_complete::{generate, generate_to, Shell};
use tracing::info;

use crate::cli::{output, Cli};
use crate::exit_codes;

const BIN_NAME: &str = "skylift";

/// Print completions to stdout, or install them into a directory
#[derive(Debug, Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Directory to write into, using the shell's usual file name
    /// (e.g. `_skylift` for zsh)
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

impl CompletionsCommand {
    /// Execute the completions command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<i32> {
        info!(shell = %self.shell, dir = ?self.dir, "executing completions command");
        let mut cmd = Cli::command();

        match &self.dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let path = generate_to(self.shell, &mut cmd, BIN_NAME, dir)?;
                if !cli.quiet {
                    output::success(&format!(
                        "{} completions written to {}",
                        self.shell,
                        output::path_style().apply_to(path.display())
                    ));
                }
            }
            None => generate(self.shell, &mut cmd, BIN_NAME, &mut io::stdout()),
        }

        Ok(exit_codes::SUCCESS)
    }
}
