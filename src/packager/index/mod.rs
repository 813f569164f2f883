//! Package index lookup.
//!
//! The resolver only needs one thing from an index: turn a [`Requirement`]
//! into a single downloadable [`ResolvedDistribution`]. [`PackageFinder`]
//! is the production implementation; tests supply their own.

mod finder;

pub use finder::{DEFAULT_INDEX_URL, PackageFinder};

use super::{error::Result, requirement::Requirement};
use std::future::Future;

/// A concrete source archive chosen for a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDistribution {
    /// Project name as published (e.g. `Flask`), used to locate the
    /// unpacked source directory.
    pub project_name: String,
    /// Version parsed from the filename.
    pub version: String,
    /// Where to fetch the archive from (`https://` or `file://`).
    pub url: String,
    /// Archive filename, its suffix selects the extraction mode.
    pub filename: String,
    /// Expected sha256 digest, when the index publishes one.
    pub sha256: Option<String>,
}

/// Maps requirements to distributions.
pub trait PackageIndex {
    /// Finds the distribution to install for `requirement`.
    ///
    /// # Errors
    ///
    /// [`Error::Resolution`](super::Error::Resolution) when nothing matches.
    fn find_requirement(
        &self,
        requirement: &Requirement,
    ) -> impl Future<Output = Result<ResolvedDistribution>>;
}
