//! Run-scoped staging directories.
//!
//! Layout under the build root:
//!
//! ```text
//! build/                      unpacked sources
//! files/                      downloaded archives
//! eggs/                       metadata cache, one subdirectory per project
//! dist/lib/python/            install destination (`--home=dist`)
//! layout/usr/share/{project}/ deployment tree, staged install lands here
//! layout/etc/init.d/
//! ```

use super::{error::Result, utils::fs::{ensure_dir, remove_dir_all}};
use std::path::{Path, PathBuf};

/// Directories used while fetching and building.
#[derive(Debug, Clone)]
pub struct BuildLocations {
    pub root: PathBuf,
    pub files: PathBuf,
    pub eggs: PathBuf,
    pub dist: PathBuf,
    pub dist_lib: PathBuf,
    pub dist_python: PathBuf,
}

impl BuildLocations {
    async fn create(ctx_root: &Path) -> Result<Self> {
        let root = ensure_dir(ctx_root.join("build")).await?;
        let files = ensure_dir(ctx_root.join("files")).await?;
        let eggs = ensure_dir(ctx_root.join("eggs")).await?;
        let dist = ensure_dir(ctx_root.join("dist")).await?;
        let dist_lib = ensure_dir(dist.join("lib")).await?;
        let dist_python = ensure_dir(dist_lib.join("python")).await?;

        Ok(Self {
            root,
            files,
            eggs,
            dist,
            dist_lib,
            dist_python,
        })
    }
}

/// The deployment tree that becomes the output archive.
#[derive(Debug, Clone)]
pub struct DeploymentLocations {
    pub root: PathBuf,
    pub usr: PathBuf,
    pub usr_share: PathBuf,
    pub project_share: PathBuf,
    pub etc: PathBuf,
    pub init_d: PathBuf,
}

impl DeploymentLocations {
    async fn create(ctx_root: &Path, project_name: &str) -> Result<Self> {
        let root = ensure_dir(ctx_root.join("layout")).await?;
        let usr = ensure_dir(root.join("usr")).await?;
        let usr_share = ensure_dir(usr.join("share")).await?;
        let project_share = ensure_dir(usr_share.join(project_name)).await?;
        let etc = ensure_dir(root.join("etc")).await?;
        let init_d = ensure_dir(etc.join("init.d")).await?;

        Ok(Self {
            root,
            usr,
            usr_share,
            project_share,
            etc,
            init_d,
        })
    }
}

/// Owns every staging directory of one packaging run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    root: PathBuf,
    pub build: BuildLocations,
    pub deploy: DeploymentLocations,
}

impl BuildContext {
    /// Lays out the staging tree under `root`. Existing directories are
    /// reused, missing ones created.
    pub async fn create(root: PathBuf, project_name: &str) -> Result<Self> {
        let root = ensure_dir(root).await?;
        let build = BuildLocations::create(&root).await?;
        let deploy = DeploymentLocations::create(&root, project_name).await?;

        Ok(Self {
            root,
            build,
            deploy,
        })
    }

    /// Creates a uniquely named root under `parent` (the system temp
    /// directory when `None`) and lays out the staging tree in it.
    pub async fn create_temp(parent: Option<&Path>, project_name: &str) -> Result<Self> {
        let parent = parent.map_or_else(std::env::temp_dir, Path::to_path_buf);
        let root = parent.join(format!("chuckbox-{}", uuid::Uuid::new_v4()));
        log::debug!("Creating build root {}", root.display());
        Self::create(root, project_name).await
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Metadata cache directory for one project.
    pub async fn egg_base(&self, project_name: &str) -> Result<PathBuf> {
        ensure_dir(self.build.eggs.join(project_name)).await
    }

    /// Deletes the whole staging tree.
    pub async fn destroy(self) -> Result<()> {
        log::info!("Cleaning {}", self.root.display());
        remove_dir_all(&self.root).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_full_layout() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildContext::create(dir.path().join("run"), "myproj").await.unwrap();

        for rel in [
            "build",
            "files",
            "eggs",
            "dist",
            "dist/lib/python",
            "layout/usr/share/myproj",
            "layout/etc/init.d",
        ] {
            assert!(ctx.root().join(rel).is_dir(), "missing {rel}");
        }
        assert_eq!(ctx.deploy.project_share, ctx.root().join("layout/usr/share/myproj"));
        assert_eq!(ctx.build.dist_python, ctx.root().join("dist/lib/python"));
    }

    #[tokio::test]
    async fn create_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("run");
        BuildContext::create(root.clone(), "p").await.unwrap();
        std::fs::write(root.join("files/keep.tar.gz"), "x").unwrap();

        let ctx = BuildContext::create(root.clone(), "p").await.unwrap();
        assert!(ctx.build.files.join("keep.tar.gz").is_file());
    }

    #[tokio::test]
    async fn temp_roots_are_unique_and_destroyable() {
        let dir = tempfile::tempdir().unwrap();
        let a = BuildContext::create_temp(Some(dir.path()), "p").await.unwrap();
        let b = BuildContext::create_temp(Some(dir.path()), "p").await.unwrap();
        assert_ne!(a.root(), b.root());

        let root = a.root().to_path_buf();
        a.destroy().await.unwrap();
        assert!(!root.exists());
        assert!(b.root().exists());
    }

    #[tokio::test]
    async fn fails_when_parent_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = BuildContext::create(dir.path().join("a/b/c"), "p").await;
        assert!(err.is_err());
    }
}
