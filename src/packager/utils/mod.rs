//! Support routines for the packaging pipeline.

pub mod archive;
pub mod cmd;
pub mod fs;
pub mod http;
