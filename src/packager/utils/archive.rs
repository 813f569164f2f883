//! Source archive extraction.
//!
//! Supported formats, selected by filename suffix:
//! - `.tar.gz` / `.tgz` - gzip-compressed tar stream
//! - `.tar.bz2` - bzip2-compressed tar stream
//! - `.zip`
//!
//! Also writes the deployable gzip tarball.

use crate::packager::error::{Error, ErrorExt, Result};
use crate::packager::requirement::normalize_name;
use bzip2::read::BzDecoder;
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use std::{
    collections::BTreeSet,
    ffi::OsString,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Component, Path, PathBuf},
};

/// Archive formats the unpacker can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarBz2,
    Zip,
}

impl ArchiveFormat {
    const SUFFIXES: [(&'static str, ArchiveFormat); 4] = [
        (".tar.gz", ArchiveFormat::TarGz),
        (".tgz", ArchiveFormat::TarGz),
        (".tar.bz2", ArchiveFormat::TarBz2),
        (".zip", ArchiveFormat::Zip),
    ];

    /// Selects the format from a filename suffix.
    pub fn from_filename(filename: &str) -> Result<Self> {
        Self::split_suffix(filename)
            .map(|(_, format)| format)
            .ok_or_else(|| Error::UnrecognizedFormat(filename.to_string()))
    }

    /// Splits `filename` into its stem and format, if the suffix is known.
    pub fn split_suffix(filename: &str) -> Option<(&str, Self)> {
        let lower = filename.to_ascii_lowercase();
        Self::SUFFIXES.iter().find_map(|(suffix, format)| {
            lower
                .ends_with(suffix)
                .then(|| (&filename[..filename.len() - suffix.len()], *format))
        })
    }
}

/// Extracts `archive` into `build_root` and returns the extracted top-level
/// directory whose name starts with `project_name`.
///
/// Only entries written by this archive are considered. Names are compared
/// in normalized form so `Foo_Bar-1.0` matches project `foo-bar`.
pub async fn unpack(
    archive: &Path,
    filename: &str,
    build_root: &Path,
    project_name: &str,
) -> Result<PathBuf> {
    let format = ArchiveFormat::from_filename(filename)?;
    log::debug!("Unpacking {} as {:?}", archive.display(), format);

    let archive_path = archive.to_path_buf();
    let root = build_root.to_path_buf();
    let top_level = tokio::task::spawn_blocking(move || match format {
        ArchiveFormat::TarGz => {
            let file = File::open(&archive_path).fs_context("opening archive", &archive_path)?;
            unpack_tar(GzDecoder::new(BufReader::new(file)), &root)
        }
        ArchiveFormat::TarBz2 => {
            let file = File::open(&archive_path).fs_context("opening archive", &archive_path)?;
            unpack_tar(BzDecoder::new(BufReader::new(file)), &root)
        }
        ArchiveFormat::Zip => unpack_zip(&archive_path, &root),
    })
    .await
    .map_err(|e| Error::GenericError(format!("Archive extraction task panicked: {}", e)))??;

    let prefix = normalize_name(project_name);
    top_level
        .iter()
        .filter(|name| normalize_name(&name.to_string_lossy()).starts_with(&prefix))
        .map(|name| build_root.join(name))
        .find(|path| path.is_dir())
        .ok_or_else(|| Error::TopLevelDirNotFound {
            prefix: project_name.to_string(),
            archive: archive.to_path_buf(),
        })
}

/// Writes a gzip-compressed tar of everything under `root` to `dest`.
///
/// Entries are stored relative to `root`, so extracting the archive
/// reproduces the tree with no leading path component. Symlinks are stored
/// as symlinks.
pub async fn create_tarball(root: &Path, dest: &Path) -> Result<()> {
    let root = root.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let file = File::create(&dest).fs_context("creating tarball", &dest)?;
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);

        let mut children: Vec<_> = std::fs::read_dir(&root)
            .fs_context("listing deployment root", &root)?
            .collect::<std::io::Result<_>>()
            .fs_context("listing deployment root", &root)?;
        children.sort_by_key(|entry| entry.file_name());

        for child in children {
            let name = PathBuf::from(child.file_name());
            let path = child.path();
            if child.file_type().fs_context("reading entry type", &path)?.is_dir() {
                builder
                    .append_dir_all(&name, &path)
                    .fs_context("adding directory to tarball", &path)?;
            } else {
                builder
                    .append_path_with_name(&path, &name)
                    .fs_context("adding file to tarball", &path)?;
            }
        }

        builder
            .into_inner()
            .and_then(|encoder| encoder.finish())
            .and_then(|mut writer| writer.flush())
            .fs_context("finishing tarball", &dest)?;
        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("Tarball task panicked: {}", e)))?
}

/// First real path component, skipping any leading `./`.
fn first_component(path: &Path) -> Option<OsString> {
    path.components()
        .skip_while(|c| matches!(c, Component::CurDir))
        .next()
        .and_then(|c| match c {
            Component::Normal(name) => Some(name.to_os_string()),
            _ => None,
        })
}

fn unpack_tar<R: Read>(reader: R, dest: &Path) -> Result<BTreeSet<OsString>> {
    let mut archive = tar::Archive::new(reader);
    let mut top_level = BTreeSet::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        // `unpack_in` refuses entries escaping `dest`
        if entry.unpack_in(dest)? {
            if let Some(name) = first_component(&path) {
                top_level.insert(name);
            }
        }
    }

    Ok(top_level)
}

fn unpack_zip(archive_path: &Path, dest: &Path) -> Result<BTreeSet<OsString>> {
    let file = File::open(archive_path).fs_context("opening archive", archive_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
    let mut top_level = BTreeSet::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(path) = file.enclosed_name() else {
            log::warn!("Skipping unsafe zip entry: {}", file.name());
            continue;
        };
        let dest_path = dest.join(&path);

        if file.is_dir() {
            std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
        } else {
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent).fs_context("creating directory", parent)?;
            }
            let mut outfile =
                File::create(&dest_path).fs_context("creating file", &dest_path)?;
            std::io::copy(&mut file, &mut outfile).fs_context("extracting file", &dest_path)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = file.unix_mode() {
                    std::fs::set_permissions(&dest_path, std::fs::Permissions::from_mode(mode))
                        .fs_context("setting permissions", &dest_path)?;
                }
            }
        }

        if let Some(name) = first_component(&path) {
            top_level.insert(name);
        }
    }

    Ok(top_level)
}
