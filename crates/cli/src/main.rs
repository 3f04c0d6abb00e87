use awc_cli::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Parse command-line arguments
    let cli = Cli::parse();

    awc_utils::tracing::init(cli.options.verbose).map_err(|e| eyre::eyre!(e))?;

    cli.command.execute(&cli.options).await
}
