//! CLI library components for the codelist enum tool.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
