//! File system abstraction and the local state reader.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Abstraction over file system operations for testability.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Checks if any entry (file, directory or link) exists at the given path.
    async fn path_exists(&self, path: &Path) -> bool;

    /// Creates all directories in the given path.
    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()>;

    /// Names of the regular files directly inside `dir`.
    async fn file_names(&self, dir: &Path) -> std::io::Result<HashSet<String>>;

    /// Creates or truncates a file for writing.
    async fn create_file(&self, path: &Path) -> std::io::Result<tokio::fs::File>;

    /// Renames a file, replacing the destination.
    async fn rename_file(&self, from: &Path, to: &Path) -> std::io::Result<()>;

    /// Removes a file.
    async fn remove_file(&self, path: &Path) -> std::io::Result<()>;
}

/// Default file system implementation using `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    /// Creates a new `TokioFileSystem` instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn path_exists(&self, path: &Path) -> bool {
        tokio::fs::symlink_metadata(path).await.is_ok()
    }

    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn file_names(&self, dir: &Path) -> std::io::Result<HashSet<String>> {
        let mut names = HashSet::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            // Follows symlinks, so links to directories are dropped here
            let is_file = tokio::fs::metadata(entry.path())
                .await
                .is_ok_and(|m| m.is_file());
            if !is_file {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => {
                    names.insert(name);
                }
                Err(raw) => log::debug!("Ignoring non UTF-8 file name {raw:?}"),
            }
        }
        Ok(names)
    }

    async fn create_file(&self, path: &Path) -> std::io::Result<tokio::fs::File> {
        tokio::fs::File::create(path).await
    }

    async fn rename_file(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        tokio::fs::rename(from, to).await
    }

    async fn remove_file(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}

/// Creates `dir` and its parents if they are missing.
///
/// # Errors
///
/// Returns [`Error::DirectoryCreate`] if the directory cannot be created.
pub async fn ensure_dir<F: FileSystem + ?Sized>(fs: &F, dir: &Path) -> Result<()> {
    fs.create_dir_all(dir)
        .await
        .map_err(|source| Error::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })
}

/// Returns the names of regular files already present in `dir`.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be read.
pub async fn existing_names<F: FileSystem + ?Sized>(
    fs: &F,
    dir: &Path,
) -> Result<HashSet<String>> {
    let names = fs.file_names(dir).await?;
    log::debug!("{} file(s) already in {}", names.len(), dir.display());
    Ok(names)
}
