//! Project packaging library.
//!
//! Builds a project and all of its transitive requirements into an isolated
//! staging tree and assembles a deployable tarball from it:
//! - [`packager`] - the resolution, build and assembly pipeline
//! - [`project`] - project resource and version discovery
//! - [`cli`] - the `chuckbox` command line front end
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod packager;
pub mod project;

// Re-export commonly used types
pub use error::{CliError, PackError, Result};
