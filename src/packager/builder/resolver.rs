//! Requirement resolution and installation.
//!
//! For each requirement the [`Installer`]:
//! 1. Looks the requirement up in the package index
//! 2. Downloads the archive into the file cache
//! 3. Unpacks it into the build root
//! 4. Extracts package metadata into the metadata cache
//! 5. Installs every declared requirement first (recursively)
//! 6. Builds and installs the package into the staging destination
//!
//! Failures are contained at the requirement that caused them: they are
//! logged, recorded in the [`InstallReport`] and processing moves on to the
//! next requirement.

use crate::packager::{
    context::BuildContext,
    error::Result,
    hooks::{HookContext, Stage, StageHooks},
    index::PackageIndex,
    requirement::{Requirement, normalize_name},
    utils::{archive, http},
};
use std::{collections::HashSet, future::Future, path::Path, pin::Pin};

use super::python::PythonBuild;

/// A requirement that could not be installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRequirement {
    pub requirement: String,
    pub error: String,
}

/// Outcome of installing a requirements list.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    /// Project names in the order they were installed.
    pub installed: Vec<String>,
    /// Requirements skipped because their name was already processed.
    pub skipped: Vec<String>,
    pub failed: Vec<FailedRequirement>,
}

impl InstallReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Installs requirements into a [`BuildContext`]'s staging destination.
pub struct Installer<'a, I> {
    ctx: &'a BuildContext,
    index: &'a I,
    python: &'a PythonBuild,
    hooks: &'a StageHooks,
    seen: HashSet<String>,
    report: InstallReport,
}

impl<'a, I: PackageIndex> Installer<'a, I> {
    pub fn new(
        ctx: &'a BuildContext,
        index: &'a I,
        python: &'a PythonBuild,
        hooks: &'a StageHooks,
    ) -> Self {
        Self {
            ctx,
            index,
            python,
            hooks,
            seen: HashSet::new(),
            report: InstallReport::default(),
        }
    }

    /// Installs every requirement line in order. Never fails as a whole;
    /// see [`InstallReport::failed`].
    pub async fn install_all(&mut self, lines: &[String]) {
        for line in lines {
            self.install_line(line).await;
        }
    }

    /// Parses and installs one requirement line.
    pub async fn install_line(&mut self, line: &str) {
        match Requirement::parse(line) {
            Ok(requirement) => self.install(&requirement).await,
            Err(err) => {
                log::error!("Skipping requirement `{}`: {}", line.trim(), err);
                self.report.failed.push(FailedRequirement {
                    requirement: line.trim().to_string(),
                    error: err.to_string(),
                });
            }
        }
    }

    /// Installs `requirement` and its dependencies, recording the outcome.
    pub fn install<'s>(
        &'s mut self,
        requirement: &'s Requirement,
    ) -> Pin<Box<dyn Future<Output = ()> + 's>> {
        Box::pin(async move {
            if !self.seen.insert(requirement.key()) {
                log::info!("{} already processed in this run, skipping", requirement);
                self.report.skipped.push(requirement.to_string());
                return;
            }

            if let Err(err) = self.try_install(requirement).await {
                log::error!("Failed to install requirement {}: {}", requirement, err);
                self.report.failed.push(FailedRequirement {
                    requirement: requirement.to_string(),
                    error: err.to_string(),
                });
            }
        })
    }

    pub fn report(&self) -> &InstallReport {
        &self.report
    }

    pub fn into_report(self) -> InstallReport {
        self.report
    }

    async fn try_install(&mut self, requirement: &Requirement) -> Result<()> {
        let ctx = self.ctx;
        let dist = self.index.find_requirement(requirement).await?;
        let dl_target = ctx.build.files.join(&dist.filename);

        self.fire(Stage::DownloadBefore, requirement, |hc| hc.fetch_url = Some(dist.url.as_str()));
        http::download(&dist.url, &dl_target, dist.sha256.as_deref()).await?;
        self.fire(Stage::DownloadAfter, requirement, |hc| hc.archive = Some(dl_target.as_path()));

        self.fire(Stage::UnpackBefore, requirement, |hc| hc.archive = Some(dl_target.as_path()));
        let build_location =
            archive::unpack(&dl_target, &dist.filename, &ctx.build.root, &dist.project_name).await?;
        self.fire(Stage::UnpackAfter, requirement, |hc| {
            hc.build_location = Some(build_location.as_path())
        });

        let egg_base = ctx.egg_base(&normalize_name(&dist.project_name)).await?;
        let declared = self.python.egg_info(ctx, &build_location, &egg_base).await?;
        if !declared.is_empty() {
            log::info!("{} requires: {}", dist.project_name, declared.join(", "));
        }
        for line in &declared {
            self.install_line(line).await;
        }

        self.build_and_install(requirement, &build_location).await?;

        log::info!("Installed {} {}", dist.project_name, dist.version);
        self.report.installed.push(dist.project_name);
        Ok(())
    }

    async fn build_and_install(
        &self,
        requirement: &Requirement,
        build_location: &Path,
    ) -> Result<()> {
        self.fire(Stage::BuildBefore, requirement, |hc| hc.build_location = Some(build_location));
        self.python.build(self.ctx, Some(build_location)).await?;
        self.fire(Stage::BuildAfter, requirement, |hc| hc.build_location = Some(build_location));

        self.fire(Stage::InstallBefore, requirement, |hc| hc.build_location = Some(build_location));
        self.python.install(self.ctx, Some(build_location)).await?;
        self.fire(Stage::InstallAfter, requirement, |hc| hc.build_location = Some(build_location));

        Ok(())
    }

    fn fire<'h, F>(&'h self, stage: Stage, requirement: &'h Requirement, fill: F)
    where
        F: FnOnce(&mut HookContext<'h>),
    {
        if self.hooks.is_empty() {
            return;
        }
        let mut hook_ctx = HookContext::new(stage, requirement, self.ctx);
        fill(&mut hook_ctx);
        self.hooks.fire(&hook_ctx);
    }
}
