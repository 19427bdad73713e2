//! genrepo-rs - A front end for managing collections and files in a Fedora
//! Commons repository.

pub mod app;
pub mod backend;
pub mod cli;
pub mod config;
pub mod kinds;
pub mod repo;
pub mod repo_model;
pub mod repository;
pub mod util;

pub use kinds::{ContentModelSet, KindSpec, KindTable, ObjectKind};
pub use util::{filter_accessible, ExistenceCheck, Visibility};
