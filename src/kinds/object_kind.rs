use std::fmt;

use serde::{Deserialize, Serialize};

use crate::repository::{IMAGE_CMODEL, PUBLIC_ACCESS_CMODEL};

use super::{KindSpec, KindTable};

/// The interpretations available for a reposited file object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// An opaque file with a `master` datastream.
    File,
    /// An image served through the image dissemination service.
    Image,
}

const FILE_CMODELS: &[&str] = &[PUBLIC_ACCESS_CMODEL];
const IMAGE_CMODELS: &[&str] = &[IMAGE_CMODEL, PUBLIC_ACCESS_CMODEL];

const IMAGE_MIMETYPES: &[&str] = &[
    "image/jpeg",
    "image/jp2",
    "image/gif",
    "image/bmp",
    "image/png",
    "image/tiff",
];

/// Kinds of reposited file objects, most specific first.
pub const DIGITAL_OBJECT_SPECS: &[KindSpec<'static, ObjectKind>] = &[
    KindSpec {
        kind: ObjectKind::Image,
        content_models: IMAGE_CMODELS,
        mimetypes: IMAGE_MIMETYPES,
    },
    KindSpec {
        kind: ObjectKind::File,
        content_models: FILE_CMODELS,
        mimetypes: &[],
    },
];

/// Resolver table for reposited file objects; falls back to [`ObjectKind::File`].
pub const DIGITAL_OBJECT_KINDS: KindTable<'static, ObjectKind> =
    KindTable::new_unchecked(DIGITAL_OBJECT_SPECS, ObjectKind::File);

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::File => "file",
            ObjectKind::Image => "image",
        }
    }

    /// Content models an object of this kind must carry.
    pub fn content_models(&self) -> &'static [&'static str] {
        match self {
            ObjectKind::File => FILE_CMODELS,
            ObjectKind::Image => IMAGE_CMODELS,
        }
    }

    /// Datastream holding the reposited file.
    pub fn master_dsid(&self) -> &'static str {
        match self {
            ObjectKind::File => "master",
            ObjectKind::Image => "source-image",
        }
    }

    /// Default label for the master datastream.
    pub fn master_description(&self) -> &'static str {
        match self {
            ObjectKind::File => "reposited master file",
            ObjectKind::Image => "Master TIFF image",
        }
    }

    /// MIME type assumed for master content uploaded without one.
    pub fn master_default_mimetype(&self) -> &'static str {
        match self {
            ObjectKind::File => "application/octet-stream",
            ObjectKind::Image => "image/tiff",
        }
    }

    /// Whether previews can be requested from the image service.
    pub fn has_preview(&self) -> bool {
        matches!(self, ObjectKind::Image)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
