//! Application-level operations.
//!
//! The [`App`] reads configuration and opens repositories. The collection and
//! file operations take a repository plus validated form input and carry out
//! what an editor asks for, mapping repository failures to user-facing errors.

#[allow(clippy::module_inception)]
mod app;
mod collections;
mod files;
mod forms;

pub use app::{App, AppContext, AppCreateRepoContext, AppError, Result, SaveFailure};
pub use collections::{
    collection_members, create_collection, edit_collection, list_collections, view_collection,
    CollectionInfo, ObjectSummary,
};
pub use files::{
    download_file, edit_file_metadata, ingest_file, preview_file, view_file, Download, FileInfo,
};
pub use forms::{
    collection_choices, CollectionChoice, CollectionForm, FieldError, FileMetadataForm,
    FormErrors, IngestForm, UploadedFile,
};
