//! setuptools build steps.
//!
//! Every step runs with the inherited environment plus a `PYTHONPATH` that
//! puts the project's `./src/` and the staged install destination on the
//! import path, so packages built later can import the ones staged earlier.

use crate::packager::{
    context::BuildContext,
    error::{Error, ErrorExt, Result},
    requirement::requirement_lines,
    utils::cmd::{CommandResult, CommandRunner},
};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Fallback entry point for sources that ship no `setup.py`.
const SETUPTOOLS_SHIM: &str = r#"-c "import setuptools; setuptools.setup()""#;

/// Runs setuptools commands through a configured interpreter.
#[derive(Debug, Clone)]
pub struct PythonBuild {
    interpreter: String,
    runner: CommandRunner,
}

impl PythonBuild {
    pub fn new(interpreter: impl Into<String>, runner: CommandRunner) -> Self {
        Self {
            interpreter: interpreter.into(),
            runner,
        }
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    fn environment(&self, ctx: &BuildContext) -> HashMap<String, String> {
        let mut env: HashMap<String, String> = std::env::vars().collect();
        env.insert(
            "PYTHONPATH".to_string(),
            format!("./src/:{}", ctx.build.dist_python.display()),
        );
        env
    }

    /// Runs `python {args}` in `cwd`, logging the captured output.
    pub async fn run(
        &self,
        ctx: &BuildContext,
        args: &str,
        cwd: Option<&Path>,
    ) -> Result<CommandResult> {
        let command = format!("\"{}\" {}", self.interpreter, args);
        let env = self.environment(ctx);

        match self.runner.run(&command, cwd, Some(&env)).await {
            Ok(result) => {
                log::info!("{}", result.content());
                Ok(result)
            }
            Err(err) => {
                if let Error::CommandFailed { result, .. } = &err {
                    log::info!("{}", result.content());
                }
                log::error!("Failure in command: {}", command);
                Err(err)
            }
        }
    }

    /// Writes package metadata into the metadata cache and returns the
    /// declared requirement lines.
    ///
    /// Uses `setup.py` when present, the setuptools shim otherwise.
    pub async fn egg_info(
        &self,
        ctx: &BuildContext,
        source: &Path,
        egg_base: &Path,
    ) -> Result<Vec<String>> {
        let entry_point = if source.join("setup.py").is_file() {
            "setup.py"
        } else {
            log::debug!("No setup.py in {}, using setuptools shim", source.display());
            SETUPTOOLS_SHIM
        };

        self.run(
            ctx,
            &format!("{} egg_info --egg-base \"{}\"", entry_point, egg_base.display()),
            Some(source),
        )
        .await?;

        match find_requires_file(egg_base)? {
            Some(requires) => {
                let contents = tokio::fs::read_to_string(&requires)
                    .await
                    .fs_context("reading declared requirements", &requires)?;
                Ok(requirement_lines(&contents))
            }
            None => Ok(Vec::new()),
        }
    }

    /// `setup.py build` in `cwd`.
    pub async fn build(&self, ctx: &BuildContext, cwd: Option<&Path>) -> Result<CommandResult> {
        self.run(ctx, "setup.py build", cwd).await
    }

    /// `setup.py install` into the staging destination.
    pub async fn install(&self, ctx: &BuildContext, cwd: Option<&Path>) -> Result<CommandResult> {
        self.run(
            ctx,
            &format!("setup.py install --home=\"{}\"", ctx.build.dist.display()),
            cwd,
        )
        .await
    }
}

/// Locates `*.egg-info/requires.txt` directly under `egg_base`.
fn find_requires_file(egg_base: &Path) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(egg_base).fs_context("listing metadata cache", egg_base)?;
    for entry in entries {
        let path = entry.fs_context("listing metadata cache", egg_base)?.path();
        let is_egg_info = path
            .extension()
            .is_some_and(|ext| ext == "egg-info");
        if is_egg_info && path.join("requires.txt").is_file() {
            return Ok(Some(path.join("requires.txt")));
        }
    }
    Ok(None)
}
