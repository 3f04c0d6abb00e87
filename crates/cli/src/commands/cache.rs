use crate::options::GlobalOptions;
use clap::Subcommand;
use eyre::WrapErr;
use std::path::Path;

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List cached action pins
    List,
    /// Remove every cached action pin
    Clear,
}

impl CacheCommands {
    pub fn execute(self, options: &GlobalOptions) -> eyre::Result<()> {
        let mut cache = options
            .open_cache(Path::new("."))
            .wrap_err("failed to open action cache")?;
        match self {
            CacheCommands::List => {
                for (_, entry) in cache.entries() {
                    println!("{}@{} {}", entry.repo, entry.version, entry.sha);
                }
                tracing::info!("{} cached action pin(s)", cache.len());
                Ok(())
            }
            CacheCommands::Clear => {
                cache.clear()?;
                tracing::info!("✓ Action cache cleared");
                Ok(())
            }
        }
    }
}
