//! Fetching distribution archives.
//!
//! Index pages and archives come over HTTP(S) via reqwest; `file://` URLs
//! (find-links directories, local mirrors) are copied straight from disk.

use crate::packager::error::{Error, ErrorExt, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use url::Url;

/// Fetches the body of `url` as text.
pub async fn fetch_text(url: &Url) -> Result<String> {
    log::debug!("Fetching {}", url);

    let response = reqwest::get(url.clone())
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    response.text().await.map_err(|e| Error::Download {
        url: url.to_string(),
        reason: format!("failed to read response: {}", e),
    })
}

/// Downloads `url` into `dest`.
///
/// When `expected_sha256` is given the written file is hashed and compared,
/// yielding [`Error::HashMismatch`] on a difference.
pub async fn download(url: &str, dest: &Path, expected_sha256: Option<&str>) -> Result<()> {
    log::info!("Downloading {}", url);

    let parsed = Url::parse(url).map_err(|e| Error::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if parsed.scheme() == "file" {
        let source = parsed.to_file_path().map_err(|()| Error::Download {
            url: url.to_string(),
            reason: "not a local file path".into(),
        })?;
        tokio::fs::copy(&source, dest)
            .await
            .fs_context("copying local distribution", &source)?;
    } else {
        let response = reqwest::get(parsed)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let bytes = response.bytes().await.map_err(|e| Error::Download {
            url: url.to_string(),
            reason: format!("failed to read response: {}", e),
        })?;

        tokio::fs::write(dest, &bytes)
            .await
            .fs_context("writing download", dest)?;
    }

    if let Some(expected) = expected_sha256 {
        let data = tokio::fs::read(dest)
            .await
            .fs_context("reading download for verification", dest)?;
        let actual = format!("{:x}", Sha256::digest(&data));
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(Error::HashMismatch {
                path: dest.to_path_buf(),
                expected: expected.to_string(),
                actual,
            });
        }
        log::debug!("Hash verified: {}", expected);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copies_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("pkg-1.0.tar.gz");
        std::fs::write(&source, b"archive bytes").unwrap();
        let url = Url::from_file_path(&source).unwrap();
        let dest = dir.path().join("copy.tar.gz");

        download(url.as_str(), &dest, None).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"archive bytes");
    }

    #[tokio::test]
    async fn verifies_expected_digest() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("pkg-1.0.zip");
        std::fs::write(&source, b"abc").unwrap();
        let url = Url::from_file_path(&source).unwrap();
        let good = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

        download(url.as_str(), &dir.path().join("ok.zip"), Some(good))
            .await
            .unwrap();

        let err = download(url.as_str(), &dir.path().join("bad.zip"), Some("00ff"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::HashMismatch { .. }));
    }

    #[tokio::test]
    async fn rejects_malformed_urls() {
        let dir = tempfile::tempdir().unwrap();
        let err = download("not a url", &dir.path().join("x"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Download { .. }));
    }
}
