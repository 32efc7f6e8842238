//! CLI subcommand implementations.

pub mod archive;
pub mod auth;
pub mod collect;
pub mod export;
pub mod filter;
pub mod summarize;
mod util;
