//! Schema module - Configuration and manifest types for conversion runs.

mod config;
mod project;

pub use config::*;
pub use project::*;
