//! Log output configuration.
//!
//! The CLI builds a [`LoggingConfig`] from its flags and hands it to
//! [`configure`] once at startup. `RUST_LOG` still takes precedence over the
//! configured level.

use crate::error::{CliError, Result};
use log::LevelFilter;
use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::PathBuf,
};

/// Where log records go and how verbose they are.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LevelFilter,
    pub console_enabled: bool,
    pub logfile: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            console_enabled: true,
            logfile: None,
        }
    }
}

impl LoggingConfig {
    /// Level for the `-d`/`-q` flags. Quiet wins over debug.
    pub fn level_for(debug: bool, quiet: bool) -> LevelFilter {
        if quiet {
            LevelFilter::Warn
        } else if debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

/// Installs the global logger.
///
/// # Errors
///
/// Fails when the logfile cannot be opened or a logger is already installed.
pub fn configure(config: &LoggingConfig) -> Result<()> {
    let file = match &config.logfile {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CliError::Logging {
                    reason: format!("cannot open {}: {}", path.display(), e),
                })?,
        ),
        None => None,
    };

    let writer = TeeWriter {
        console: config.console_enabled.then(io::stderr),
        file,
    };

    let level = config.level.to_string();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(Box::new(writer)))
        .try_init()
        .map_err(|e| CliError::Logging {
            reason: e.to_string(),
        })?;

    log::debug!("Logging level set to: {}", config.level);
    Ok(())
}

/// Copies every record to the console and the logfile, whichever are enabled.
struct TeeWriter<C> {
    console: Option<C>,
    file: Option<File>,
}

impl<C: Write> Write for TeeWriter<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(console) = &mut self.console {
            console.write_all(buf)?;
        }
        if let Some(file) = &mut self.file {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(console) = &mut self.console {
            console.flush()?;
        }
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        Ok(())
    }
}
