//! Object kind resolution.
//!
//! Decides how a repository object should be interpreted, either from the
//! content models recorded on it or, at ingest time, from a file's MIME type.
//! Candidates live in an explicit ordered [`KindTable`]; the first matching row
//! wins and a fallback kind covers everything else.

mod content_models;
mod kind_table;
mod object_kind;

pub use content_models::ContentModelSet;
pub use kind_table::{
    resolve_by_content_models, resolve_by_mimetype, KindSpec, KindTable, KindTableError,
};
pub use object_kind::{ObjectKind, DIGITAL_OBJECT_KINDS, DIGITAL_OBJECT_SPECS};
