//! Command line argument parsing and validation.

use clap::{Parser, Subcommand};
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::packager::{
    PackSettings, PackSettingsBuilder,
    settings::{DEFAULT_LAYOUT_DIR, DEFAULT_REQUIREMENTS_FILE},
};

use super::logging::LoggingConfig;

/// chuckbox: sane Python project tools.
#[derive(Parser, Debug)]
#[command(
    name = "chuckbox",
    version,
    about = "chuckbox: sane Python project tools.",
    long_about = "Packages a Python project and all of its transitive requirements into a
deployable tarball, without a system-wide package manager.

Usage:
  chuckbox pack myproj
  chuckbox pack myproj --path ~/src/myproj --find-links ./wheelhouse --no-index

Produces {name}_{version}.tar.gz in the current directory. The version is read
from {path}/src/{name}/VERSION."
)]
pub struct Args {
    /// Enables debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Only log warnings and errors. Supersedes --debug
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write log output to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub logfile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Tools available.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Package a project
    Pack(PackArgs),
}

/// Arguments of `chuckbox pack`.
#[derive(clap::Args, Debug)]
pub struct PackArgs {
    /// Name of the project being packaged up
    pub name: String,

    /// Path to the project. Defaults to the current directory
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Requirements file, relative to the project path
    #[arg(long, value_name = "FILE", default_value = DEFAULT_REQUIREMENTS_FILE)]
    pub requirements: PathBuf,

    /// Static deployment layout directory, relative to the project path
    #[arg(long, value_name = "DIR", default_value = DEFAULT_LAYOUT_DIR)]
    pub layout: PathBuf,

    /// Python interpreter used to build packages
    #[arg(long, value_name = "PYTHON", default_value = "python", env = "CHUCKBOX_PYTHON")]
    pub python: String,

    /// Simple-API package index to search (repeatable)
    #[arg(
        long = "index-url",
        value_name = "URL",
        default_value = crate::packager::index::DEFAULT_INDEX_URL
    )]
    pub index_urls: Vec<Url>,

    /// Ignore package indexes, search only --find-links directories
    #[arg(long)]
    pub no_index: bool,

    /// Local directory of source archives to search before any index (repeatable)
    #[arg(long = "find-links", value_name = "DIR")]
    pub find_links: Vec<PathBuf>,

    /// Kill any build command running longer than this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub command_timeout: Option<u64>,

    /// Directory the finished archive is copied to. Defaults to the current directory
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Keep symlinks as symlinks when copying the staged tree
    #[arg(long)]
    pub preserve_symlinks: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Command::Pack(pack)) = &self.command {
            if pack.name.trim().is_empty() {
                return Err("Project name cannot be empty".to_string());
            }
            if pack.command_timeout == Some(0) {
                return Err("Command timeout must be at least one second".to_string());
            }
        }
        Ok(())
    }

    /// Logging configuration for the global flags
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: LoggingConfig::level_for(self.debug, self.quiet),
            console_enabled: true,
            logfile: self.logfile.clone(),
        }
    }
}

impl PackArgs {
    /// Builds the settings for this invocation.
    pub fn settings(&self, version: &str) -> crate::packager::Result<PackSettings> {
        let index_urls = if self.no_index {
            Vec::new()
        } else {
            self.index_urls.clone()
        };

        let mut builder = PackSettingsBuilder::new()
            .project_name(&self.name)
            .version(version)
            .project_path(&self.path)
            .requirements_file(&self.requirements)
            .layout_dir(&self.layout)
            .python(&self.python)
            .command_timeout(self.command_timeout.map(Duration::from_secs))
            .index_urls(index_urls)
            .find_links(self.find_links.clone())
            .preserve_symlinks(self.preserve_symlinks);

        if let Some(dir) = &self.output_dir {
            builder = builder.output_dir(dir);
        }

        builder.build()
    }
}
