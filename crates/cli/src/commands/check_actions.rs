//! `awc check-actions`

use crate::discover::{expand, is_lock_file};
use crate::options::GlobalOptions;
use awc_actions::validate_pins;
use eyre::{bail, WrapErr};
use std::path::{Path, PathBuf};
use tracing::info;

pub async fn execute(options: &GlobalOptions, paths: Vec<PathBuf>, strict: bool) -> eyre::Result<()> {
    let files = expand(&paths, is_lock_file);
    if files.is_empty() {
        bail!("no compiled workflows found");
    }

    let start = files
        .first()
        .and_then(|file| file.parent())
        .unwrap_or_else(|| Path::new("."));
    let mut resolver = options.open_resolver(start)?;

    let mut stale_total = 0usize;
    for file in &files {
        let content = std::fs::read_to_string(file)
            .wrap_err_with(|| format!("failed to read {}", file.display()))?;
        let stale = validate_pins(&mut resolver, &content).await;
        for finding in &stale {
            println!("{}: {finding}", file.display());
        }
        stale_total += stale.len();
    }

    resolver.persist().wrap_err("failed to persist action cache")?;

    if stale_total == 0 {
        info!(files = files.len(), "all action pins are current");
    } else if strict {
        bail!("{stale_total} stale action pin(s) found");
    }
    Ok(())
}
