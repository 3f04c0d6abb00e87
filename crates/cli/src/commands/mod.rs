use crate::options::GlobalOptions;
use clap::Subcommand;
use std::path::PathBuf;

pub mod cache;
pub mod check_actions;
pub mod compile;

use self::cache::CacheCommands;

#[derive(Subcommand)]
pub enum Commands {
    /// Compile workflow specifications into GitHub Actions workflow files
    #[command(visible_alias = "c")]
    Compile {
        /// Specification files or directories to search (defaults to .github/workflows)
        paths: Vec<PathBuf>,

        /// Write compiled workflows into this directory instead of next to their sources
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Print compiled workflows instead of writing them
        #[arg(long, conflicts_with = "output_dir")]
        stdout: bool,
    },

    /// Report pinned actions whose version now resolves to a different commit
    CheckActions {
        /// Compiled workflow files or directories to search (defaults to .github/workflows)
        paths: Vec<PathBuf>,

        /// Exit with an error when any pin is stale
        #[arg(long)]
        strict: bool,
    },

    /// Manage the action pin cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

/// Default search location when no paths are given
pub(crate) fn default_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    if paths.is_empty() {
        vec![PathBuf::from(".github/workflows")]
    } else {
        paths
    }
}

impl Commands {
    pub async fn execute(self, options: &GlobalOptions) -> eyre::Result<()> {
        match self {
            Commands::Compile {
                paths,
                output_dir,
                stdout,
            } => compile::execute(options, default_paths(paths), output_dir, stdout).await,
            Commands::CheckActions { paths, strict } => {
                check_actions::execute(options, default_paths(paths), strict).await
            }
            Commands::Cache { command } => command.execute(options),
        }
    }
}
