//! Filesystem helpers for pipeline stages.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Recursively copies a directory tree, creating destination directories as
/// needed. Blocking traversal runs on the blocking thread pool.
pub(crate) async fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", from.display()),
        )));
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        std::fs::create_dir_all(&to)?;
        for entry in walkdir::WalkDir::new(&from) {
            let entry = entry.map_err(std::io::Error::other)?;
            let rel_path = entry
                .path()
                .strip_prefix(&from)
                .map_err(std::io::Error::other)?;
            let dest_path = to.join(rel_path);
            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path)?;
            } else {
                if let Some(parent) = dest_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::copy(entry.path(), &dest_path)?;
            }
        }
        Ok(())
    })
    .await
    .map_err(|e| Error::Io(std::io::Error::other(format!("copy task panicked: {e}"))))??;

    Ok(())
}

/// Removes a directory tree if present; absence is not an error.
pub(crate) async fn remove_tree(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Collects every file with the given extension under a set of roots, in a
/// stable order. Roots that do not exist contribute nothing.
pub(crate) fn collect_files(roots: &[PathBuf], extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = roots
        .iter()
        .filter(|root| root.is_dir())
        .flat_map(|root| {
            walkdir::WalkDir::new(root)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(extension))
                .collect::<Vec<_>>()
        })
        .collect();
    files.sort();
    files
}
