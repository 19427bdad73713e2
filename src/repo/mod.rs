//! Repository interface over a Fedora backend.
//!
//! This module provides the [`Repo`] struct, which wraps a backend to load and
//! save whole objects and answer collection queries, and [`create_repo`],
//! which builds one from a repository spec and configuration.

mod create_repo;
#[allow(clippy::module_inception)]
mod repo;

pub use create_repo::{
    create_repo, BackendType, CreateRepoContext, CreateRepoError, ParsedRepoSpec,
};
pub use repo::{Repo, RepoError, Result};
