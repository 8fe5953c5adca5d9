//! CLI subcommand implementations.

pub mod member;
pub mod migrate;
