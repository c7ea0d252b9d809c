//! Filesystem helpers for clean/publish steps

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Remove a file or directory tree, succeeding if it does not exist
pub async fn rimraf(path: &Path) -> io::Result<()> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await,
        Ok(_) => fs::remove_file(path).await,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Copy a single file, creating the destination's parent directories
pub async fn copy_file(src: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::copy(src, dest).await?;
    Ok(())
}

/// Recursively copy a directory tree
pub async fn copy_dir(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest).await?;
    let mut pending = vec![(src.to_path_buf(), dest.to_path_buf())];
    while let Some((from, to)) = pending.pop() {
        let mut entries = fs::read_dir(&from).await?;
        while let Some(entry) = entries.next_entry().await? {
            let target = to.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                fs::create_dir_all(&target).await?;
                pending.push((entry.path(), target));
            } else {
                fs::copy(entry.path(), target).await?;
            }
        }
    }
    Ok(())
}

/// Collect all files under a directory, sorted for deterministic output
pub async fn walk_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                pending.push(entry.path());
            } else {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}
