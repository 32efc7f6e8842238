//! Lock visit tracker CLI library.
//!
//! This crate provides the CLI interface for the visit tracker.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, log_directive};
pub use config::Config;
