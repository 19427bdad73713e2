//! Well-known URIs used in Fedora object metadata.

// =============================================================================
// RDF Namespaces
// =============================================================================

/// RDF syntax namespace.
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Fedora model namespace (content model assertions).
pub const FEDORA_MODEL_NS: &str = "info:fedora/fedora-system:def/model#";

/// Fedora external relations namespace.
pub const RELS_EXT_NS: &str = "info:fedora/fedora-system:def/relations-external#";

/// OAI-PMH namespace, used for OAI item ids and set definitions.
pub const OAI_NS: &str = "http://www.openarchives.org/OAI/2.0/";

/// Dublin Core elements namespace.
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

/// OAI Dublin Core container namespace.
pub const OAI_DC_NS: &str = "http://www.openarchives.org/OAI/2.0/oai_dc/";

// =============================================================================
// Predicates
// =============================================================================

pub const RDF_DESCRIPTION: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Description";

/// `fedora-model:hasModel`
pub const HAS_MODEL: &str = "info:fedora/fedora-system:def/model#hasModel";

/// `rel:isMemberOfCollection`
pub const IS_MEMBER_OF_COLLECTION: &str =
    "info:fedora/fedora-system:def/relations-external#isMemberOfCollection";

/// `oai:itemID`
pub const OAI_ITEM_ID: &str = "http://www.openarchives.org/OAI/2.0/itemID";

/// `oai:setSpec`
pub const OAI_SET_SPEC: &str = "http://www.openarchives.org/OAI/2.0/setSpec";

/// `oai:setName`
pub const OAI_SET_NAME: &str = "http://www.openarchives.org/OAI/2.0/setName";

// =============================================================================
// Content Models
// =============================================================================

/// Content model used by Fedora XACML policies to grant public read access.
pub const PUBLIC_ACCESS_CMODEL: &str = "info:fedora/emory-control:PublicAccess";

/// Content model identifying collection objects.
pub const COLLECTION_CMODEL: &str = "info:fedora/emory-control:Collection-1.0";

/// Content model identifying image objects.
pub const IMAGE_CMODEL: &str = "info:fedora/genrepo-demo:Image-1.0";

/// Service definition providing image regions for image objects.
pub const IMAGE_SERVICE: &str = "genrepo-demo:DjatokaImageService";

/// Namespace prefixes used when serializing RDF, in declaration order.
pub(crate) const KNOWN_PREFIXES: &[(&str, &str)] = &[
    ("rdf", RDF_NS),
    ("fedora-model", FEDORA_MODEL_NS),
    ("rel", RELS_EXT_NS),
    ("oai", OAI_NS),
];
