pub mod commands;
pub mod discover;
pub mod options;

use clap::Parser;

pub use commands::Commands;
pub use options::GlobalOptions;

#[derive(Parser)]
#[command(name = "awc")]
#[command(about = "Compile agentic workflow specifications into GitHub Actions workflows", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}
