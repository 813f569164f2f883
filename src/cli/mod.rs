//! Command line interface for chuckbox.
//!
//! Parses arguments, configures logging, resolves the project version and
//! runs the requested tool.

mod args;
mod logging;

pub use args::{Args, Command, PackArgs};
pub use logging::{LoggingConfig, configure};

use clap::CommandFactory;

use crate::{
    error::{CliError, Result},
    packager::Packager,
    project::ProjectManifest,
};

/// Main CLI entry point. Returns the process exit code.
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    configure(&args.logging())?;

    match &args.command {
        Some(Command::Pack(pack)) => run_pack(pack).await,
        None => {
            Args::command().print_help()?;
            Ok(0)
        }
    }
}

async fn run_pack(pack: &PackArgs) -> Result<i32> {
    let manifest = ProjectManifest::in_source_tree(&pack.path, &pack.name);
    let version = match manifest.version() {
        Ok(version) => version,
        Err(e) => {
            log::error!("{}", e);
            return Ok(1);
        }
    };

    let settings = pack.settings(&version)?;
    match Packager::new(settings).pack().await {
        Ok(archive) => {
            if !archive.report.is_clean() {
                log::warn!(
                    "{} requirement(s) failed to install, see log above",
                    archive.report.failed.len()
                );
            }
            println!("{}", archive.path.display());
            Ok(0)
        }
        Err(e) => {
            log::error!("Packaging {} failed: {}", pack.name, e);
            Ok(1)
        }
    }
}
