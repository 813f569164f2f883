//! Distribution finder over local directories and simple-API indexes.

use super::{PackageIndex, ResolvedDistribution};
use crate::packager::{
    error::{Error, ErrorExt, Result},
    requirement::{Requirement, Version, normalize_name},
    utils::{archive::ArchiveFormat, http},
};
use path_absolutize::Absolutize;
use regex::Regex;
use std::{path::PathBuf, sync::LazyLock};
use url::Url;

/// Default index, the simple API of PyPI.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple/";

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s+([^>]*)>([^<]*)</a>"#).expect("anchor pattern is valid")
});

static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']([^"']*)["']"#).expect("href pattern is valid")
});

/// Finds source distributions in `find_links` directories and on
/// simple-API indexes. All locations are searched; the highest version
/// accepted by the requirement wins, earlier locations win ties.
/// Pre-releases are only picked when the constraint names one or no final
/// release is acceptable.
#[derive(Debug, Clone, Default)]
pub struct PackageFinder {
    find_links: Vec<PathBuf>,
    index_urls: Vec<Url>,
}

impl PackageFinder {
    pub fn new(find_links: Vec<PathBuf>, index_urls: Vec<Url>) -> Self {
        Self {
            find_links,
            index_urls,
        }
    }

    pub fn find_links(&self) -> &[PathBuf] {
        &self.find_links
    }

    pub fn index_urls(&self) -> &[Url] {
        &self.index_urls
    }

    async fn scan_find_links(
        &self,
        requirement: &Requirement,
    ) -> Result<Vec<ResolvedDistribution>> {
        let mut found = Vec::new();

        for dir in &self.find_links {
            let dir = dir.absolutize().fs_context("resolving find-links path", dir)?;
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Skipping find-links directory {}: {}", dir.display(), e);
                    continue;
                }
            };

            let mut names = Vec::new();
            while let Some(entry) = entries
                .next_entry()
                .await
                .fs_context("listing find-links", &*dir)?
            {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            names.sort();

            for filename in names {
                let Ok(url) = Url::from_file_path(dir.join(&filename)) else {
                    continue;
                };
                if let Some(dist) = candidate(requirement, &filename, url, None) {
                    found.push(dist);
                }
            }
        }

        Ok(found)
    }

    async fn scan_index(
        &self,
        index: &Url,
        requirement: &Requirement,
    ) -> Vec<ResolvedDistribution> {
        let page = match index.join(&format!("{}/", requirement.key())) {
            Ok(page) => page,
            Err(e) => {
                log::warn!("Invalid index URL {}: {}", index, e);
                return Vec::new();
            }
        };

        match http::fetch_text(&page).await {
            Ok(body) => parse_simple_page(&page, &body, requirement),
            Err(e) => {
                log::debug!("No listing for {} at {}: {}", requirement.name(), page, e);
                Vec::new()
            }
        }
    }
}

impl PackageIndex for PackageFinder {
    async fn find_requirement(&self, requirement: &Requirement) -> Result<ResolvedDistribution> {
        let mut candidates = self.scan_find_links(requirement).await?;
        for index in &self.index_urls {
            candidates.extend(self.scan_index(index, requirement).await);
        }

        let total = candidates.len();
        let acceptable: Vec<_> = candidates
            .into_iter()
            .filter(|d| requirement.accepts(&d.version))
            .map(|d| (Version::parse(&d.version), d))
            .collect();
        let any_final = acceptable.iter().any(|(v, _)| !v.is_prerelease());
        let skip_prereleases = any_final && !requirement.allows_prereleases();

        let mut best: Option<(Version, ResolvedDistribution)> = None;
        for (version, dist) in acceptable {
            if skip_prereleases && version.is_prerelease() {
                log::debug!("Skipping pre-release {}", dist.filename);
                continue;
            }
            if best.as_ref().is_none_or(|(b, _)| version > *b) {
                best = Some((version, dist));
            }
        }

        match best {
            Some((_, dist)) => {
                log::info!("Resolved {} to {} ({})", requirement, dist.filename, dist.url);
                Ok(dist)
            }
            None => Err(Error::Resolution {
                requirement: requirement.to_string(),
                reason: format!(
                    "none of {} candidate(s) in {} find-links dir(s) and {} index(es) fit",
                    total,
                    self.find_links.len(),
                    self.index_urls.len()
                ),
            }),
        }
    }
}

/// Builds a distribution from `filename` if it is a supported source
/// archive of the requirement's project, `{name}-{version}{suffix}`.
fn candidate(
    requirement: &Requirement,
    filename: &str,
    url: Url,
    sha256: Option<String>,
) -> Option<ResolvedDistribution> {
    let (stem, _) = ArchiveFormat::split_suffix(filename)?;
    let key = requirement.key();

    stem.match_indices('-').find_map(|(idx, _)| {
        let (name, version) = (&stem[..idx], &stem[idx + 1..]);
        let version_ok = version.chars().next().is_some_and(|c| c.is_ascii_digit());
        (version_ok && normalize_name(name) == key).then(|| ResolvedDistribution {
            project_name: name.to_string(),
            version: version.to_string(),
            url: url.to_string(),
            filename: filename.to_string(),
            sha256: sha256.clone(),
        })
    })
}

/// Extracts candidates from a simple-API project page.
fn parse_simple_page(
    page: &Url,
    body: &str,
    requirement: &Requirement,
) -> Vec<ResolvedDistribution> {
    ANCHOR_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            if attrs.contains("data-yanked") {
                return None;
            }
            let href = HREF_RE.captures(attrs)?.get(1)?.as_str().replace("&amp;", "&");
            let mut url = page.join(&href).ok()?;

            let sha256 = url
                .fragment()
                .and_then(|f| f.strip_prefix("sha256="))
                .map(String::from);
            url.set_fragment(None);

            let text = caps.get(2)?.as_str().trim();
            let filename = if text.is_empty() {
                url.path_segments()?.next_back()?.to_string()
            } else {
                text.to_string()
            };

            candidate(requirement, &filename, url, sha256)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(line: &str) -> Requirement {
        Requirement::parse(line).unwrap()
    }

    #[test]
    fn candidate_requires_matching_name_and_supported_suffix() {
        let url = Url::parse("https://files.example/x").unwrap();
        let dateutil = req("python-dateutil");
        let dist = candidate(&dateutil, "python_dateutil-2.8.2.tar.gz", url.clone(), None).unwrap();
        assert_eq!(dist.project_name, "python_dateutil");
        assert_eq!(dist.version, "2.8.2");

        let wheel = "six-1.16.0-py2.py3-none-any.whl";
        assert!(candidate(&req("six"), wheel, url.clone(), None).is_none());
        assert!(candidate(&req("six"), "sixty-1.0.tar.gz", url.clone(), None).is_none());
        assert!(candidate(&req("six"), "six-docs.zip", url, None).is_none());
    }

    #[test]
    fn parses_simple_index_page() {
        let page = Url::parse("https://pypi.example/simple/flask/").unwrap();
        let body = r#"<html><body>
            <a href="../../packages/Flask-1.0.tar.gz#sha256=abc123">Flask-1.0.tar.gz</a><br/>
            <a href="https://cdn.example/Flask-2.0.1.tar.gz" data-requires-python="&gt;=3.6">Flask-2.0.1.tar.gz</a>
            <a href="https://cdn.example/Flask-2.0.1-py3-none-any.whl">Flask-2.0.1-py3-none-any.whl</a>
            <a href="https://cdn.example/Flask-3.0.tar.gz" data-yanked="">Flask-3.0.tar.gz</a>
        </body></html>"#;

        let found = parse_simple_page(&page, body, &req("flask"));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].url, "https://pypi.example/packages/Flask-1.0.tar.gz");
        assert_eq!(found[0].sha256.as_deref(), Some("abc123"));
        assert_eq!(found[1].filename, "Flask-2.0.1.tar.gz");
        assert_eq!(found[1].sha256, None);
    }

    #[tokio::test]
    async fn picks_highest_acceptable_version_from_find_links() {
        let dir = tempfile::tempdir().unwrap();
        let names = [
            "pkgA-1.0.tar.gz",
            "pkgA-1.2.zip",
            "pkgA-2.0.tar.bz2",
            "pkgB-9.0.tar.gz",
            "notes.txt",
        ];
        for name in names {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let finder = PackageFinder::new(vec![dir.path().to_path_buf()], Vec::new());

        let latest = finder.find_requirement(&req("pkgA")).await.unwrap();
        assert_eq!(latest.filename, "pkgA-2.0.tar.bz2");
        assert!(latest.url.starts_with("file://"));

        let pinned = finder.find_requirement(&req("pkga<2")).await.unwrap();
        assert_eq!(pinned.filename, "pkgA-1.2.zip");
        assert_eq!(pinned.project_name, "pkgA");
    }

    #[tokio::test]
    async fn final_releases_outrank_prereleases() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["pkg-1.10.tar.gz", "pkg-1.9b1.tar.gz", "pkg-1.1.tar.gz", "pkg-2.0rc1.tar.gz"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let finder = PackageFinder::new(vec![dir.path().to_path_buf()], Vec::new());

        let latest = finder.find_requirement(&req("pkg")).await.unwrap();
        assert_eq!(latest.filename, "pkg-1.10.tar.gz");

        let pre = finder.find_requirement(&req("pkg>=2.0rc1")).await.unwrap();
        assert_eq!(pre.filename, "pkg-2.0rc1.tar.gz");

        let only_pre = finder.find_requirement(&req("pkg>1.10")).await.unwrap();
        assert_eq!(only_pre.filename, "pkg-2.0rc1.tar.gz");
    }

    #[tokio::test]
    async fn missing_project_is_a_resolution_error() {
        let dir = tempfile::tempdir().unwrap();
        let finder = PackageFinder::new(vec![dir.path().to_path_buf()], Vec::new());

        let err = finder.find_requirement(&req("ghost>=1")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Resolution { ref requirement, .. } if requirement == "ghost>=1"
        ));
    }
}
