//! Advisory locking for files that several awc processes may rewrite

use awc_core::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive advisory lock guarding read-modify-write cycles on a shared file.
///
/// The lock lives on a sibling `<file>.lock` so the guarded file itself can
/// be replaced by an atomic rename while the lock is held. The lock is
/// released when the guard is dropped.
#[derive(Debug)]
pub struct FileLock {
    lock_file: File,
    lock_path: PathBuf,
}

impl FileLock {
    /// Block until an exclusive lock for `path` is acquired
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_path = lock_path_for(path);
        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::file_system(parent.to_path_buf(), "create lock directory", e)
                })?;
            }
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| Error::file_system(&lock_path, "open lock file", e))?;

        lock_file
            .lock_exclusive()
            .map_err(|e| Error::file_system(&lock_path, "acquire exclusive lock", e))?;

        tracing::trace!(lock = %lock_path.display(), "acquired file lock");

        Ok(Self {
            lock_file,
            lock_path,
        })
    }

    /// Path of the lock file backing this guard
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // The lock file stays in place; waiters may already hold it open
        let _ = fs2::FileExt::unlock(&self.lock_file);
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_is_sibling() {
        let path = Path::new("/repo/.github/aw/actions-lock.json");
        assert_eq!(
            lock_path_for(path),
            PathBuf::from("/repo/.github/aw/actions-lock.json.lock")
        );
    }

    #[test]
    fn test_lock_can_be_reacquired_after_drop() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("nested").join("cache.json");

        let lock1 = FileLock::acquire(&target).unwrap();
        assert!(lock1.lock_path().exists());
        drop(lock1);

        let lock2 = FileLock::acquire(&target).unwrap();
        drop(lock2);
    }
}
