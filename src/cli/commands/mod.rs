//! Subcommand implementations.

pub mod collection;
pub mod file;
pub mod kinds;
