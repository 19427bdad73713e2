//! Typed models over repository objects.
//!
//! [`DigitalObject`] holds one object's properties and metadata between load
//! and save. [`CollectionModel`] and [`FileModel`] wrap it with the operations
//! specific to each kind of object, and [`ObjectHandle`] refers to an object
//! by pid without fetching anything.

mod collection_model;
mod digital_object;
mod file_model;
mod object_handle;

pub use collection_model::{CollectionModel, COLLECTION_CMODELS};
pub use digital_object::DigitalObject;
pub use file_model::{FileModel, PREVIEW_METHOD};
pub use object_handle::ObjectHandle;
