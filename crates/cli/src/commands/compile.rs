//! `awc compile`

use crate::discover::{expand, is_spec_file, lock_path};
use crate::options::GlobalOptions;
use awc_config::{ConfigLoader, LoadedSpec};
use awc_jobs::Compiler;
use awc_utils::write_atomic_string;
use eyre::{bail, WrapErr};
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub async fn execute(
    options: &GlobalOptions,
    paths: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    stdout: bool,
) -> eyre::Result<()> {
    let files = expand(&paths, is_spec_file);
    if files.is_empty() {
        bail!("no workflow specifications found");
    }

    let start = files
        .first()
        .and_then(|file| file.parent())
        .unwrap_or_else(|| Path::new("."));
    let mut resolver = options.open_resolver(start)?;
    let compiler = Compiler::new();
    let loader = ConfigLoader::new();

    let mut failures = 0usize;
    for file in &files {
        let result = async {
            let LoadedSpec { path, spec } = loader.load(file)?;
            let workflow = compiler.compile(&spec, &mut resolver).await?;
            Ok::<_, awc_core::Error>((path, workflow.to_yaml()?))
        }
        .await;

        match result {
            Ok((path, rendered)) if stdout => {
                info!(source = %path.display(), "compiled");
                print!("{rendered}");
            }
            Ok((path, rendered)) => {
                let target = lock_path(&path, output_dir.as_deref());
                write_atomic_string(&target, &rendered)
                    .wrap_err_with(|| format!("failed to write {}", target.display()))?;
                info!(source = %path.display(), target = %target.display(), "compiled");
            }
            Err(e) => {
                failures += 1;
                error!(source = %file.display(), error = %e, kind = ?e.kind(), "compilation failed");
            }
        }
    }

    // Hashes resolved for the successful files are kept even when others failed
    resolver.persist().wrap_err("failed to persist action cache")?;

    if failures > 0 {
        bail!("{failures} of {} workflow(s) failed to compile", files.len());
    }
    Ok(())
}
