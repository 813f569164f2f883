//! File system utilities for packaging.
//!
//! Provides idempotent directory creation and recursive tree mirroring with
//! optional symlink preservation.

use crate::packager::error::{Error, ErrorExt, Result};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Creates `path` if it does not exist yet and returns it. An existing
/// entry that is not a directory is an error.
pub async fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    match fs::create_dir(&path).await {
        Ok(()) => Ok(path),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let metadata = fs::metadata(&path)
                .await
                .fs_context("inspecting directory", &*path)?;
            if metadata.is_dir() {
                Ok(path)
            } else {
                Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "path exists and is not a directory",
                ))
                .fs_context("creating directory", path)
            }
        }
        Err(e) => Err(e).fs_context("creating directory", path),
    }
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing directory", path),
    }
}

/// Makes a symbolic link.
#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Makes a symbolic link.
#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    if link.parent().map(|p| p.join(target)).is_some_and(|p| p.is_dir()) {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

/// Recursively copies `from` into `to`, creating `to` if absent.
///
/// Existing files under `to` are overwritten, so mirroring onto a populated
/// tree overlays it. With `preserve_symlinks` set, links are recreated
/// verbatim (same target text); otherwise the link target's content is
/// copied in its place.
///
/// Any failure aborts the whole mirror.
pub async fn mirror_dir(from: &Path, to: &Path, preserve_symlinks: bool) -> Result<()> {
    if !from.is_dir() {
        return Err(Error::GenericError(format!(
            "{from:?} is not a directory"
        )));
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || mirror_dir_blocking(&from, &to, preserve_symlinks))
        .await
        .map_err(|e| Error::GenericError(format!("Directory mirror task panicked: {}", e)))?
}

fn mirror_dir_blocking(from: &Path, to: &Path, preserve_symlinks: bool) -> Result<()> {
    std::fs::create_dir_all(to).fs_context("creating mirror destination", to)?;

    let walker = walkdir::WalkDir::new(from)
        .min_depth(1)
        .follow_links(!preserve_symlinks);

    for entry in walker {
        let entry = entry?;
        let rel_path = entry.path().strip_prefix(from)?;
        let dest_path = to.join(rel_path);

        if entry.path_is_symlink() && preserve_symlinks {
            let target = std::fs::read_link(entry.path())
                .fs_context("reading symlink", entry.path())?;
            if dest_path.symlink_metadata().is_ok() {
                std::fs::remove_file(&dest_path).fs_context("replacing file", &dest_path)?;
            }
            symlink(&target, &dest_path).fs_context("creating symlink", &dest_path)?;
        } else if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
        } else {
            std::fs::copy(entry.path(), &dest_path).fs_context("copying file", &dest_path)?;
        }
    }

    Ok(())
}
