//! Repository object metadata.
//!
//! Types describing what is stored on a Fedora object: its persistent
//! identifier, Dublin Core descriptive metadata (`DC`), and RDF relationships
//! (`RELS-EXT`), together with the well-known URIs used by this application.

mod dublin_core;
mod namespaces;
mod pid;
mod rels_ext;
pub mod xml;

pub use dublin_core::{is_dcmi_type, DublinCore, DCMI_TYPES};
pub use namespaces::*;
pub use pid::{Pid, PidError, FEDORA_URI_PREFIX};
pub use rels_ext::{RelObject, Relation, RelsExt};
pub use xml::XmlError;

/// Datastream id of the Dublin Core metadata.
pub const DC_DSID: &str = "DC";

/// Datastream id of the RDF relationships.
pub const RELS_EXT_DSID: &str = "RELS-EXT";
