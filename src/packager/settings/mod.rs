//! Configuration for packaging runs.
//!
//! [`PackSettings`] is immutable once built; construct it with
//! [`PackSettingsBuilder`].

mod builder;
mod core;

pub use builder::{DEFAULT_LAYOUT_DIR, DEFAULT_REQUIREMENTS_FILE, PackSettingsBuilder};
pub use core::PackSettings;
