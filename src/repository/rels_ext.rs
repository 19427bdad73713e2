//! RDF relationships of an object (the `RELS-EXT` datastream).

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::kinds::ContentModelSet;

use super::namespaces::{HAS_MODEL, KNOWN_PREFIXES, RDF_DESCRIPTION, RDF_NS};
use super::xml::{escape, qualified_name, Result, XmlError};

/// Object of an RDF statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum RelObject {
    /// A URI reference (`rdf:resource`).
    Resource(String),
    /// A plain literal.
    Literal(String),
}

impl RelObject {
    pub fn value(&self) -> &str {
        match self {
            RelObject::Resource(v) | RelObject::Literal(v) => v,
        }
    }
}

/// A single statement about the object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Full predicate URI.
    pub predicate: String,
    pub object: RelObject,
}

/// The set of statements whose subject is one repository object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelsExt {
    /// Subject URI, `info:fedora/<pid>`.
    pub subject: String,
    pub relations: Vec<Relation>,
}

impl RelsExt {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            relations: Vec::new(),
        }
    }

    /// Add a statement unless an identical one is present.
    pub fn add(&mut self, predicate: &str, object: RelObject) {
        if !self.contains(predicate, &object) {
            self.relations.push(Relation {
                predicate: predicate.to_string(),
                object,
            });
        }
    }

    /// Remove a statement. Returns true if it was present.
    pub fn remove(&mut self, predicate: &str, object: &RelObject) -> bool {
        let before = self.relations.len();
        self.relations
            .retain(|r| !(r.predicate == predicate && &r.object == object));
        self.relations.len() != before
    }

    /// Remove every statement with the given predicate.
    pub fn remove_all(&mut self, predicate: &str) {
        self.relations.retain(|r| r.predicate != predicate);
    }

    /// Replace all values of a single-valued predicate; `None` clears it.
    pub fn set_single(&mut self, predicate: &str, object: Option<RelObject>) {
        self.remove_all(predicate);
        if let Some(object) = object {
            self.add(predicate, object);
        }
    }

    pub fn contains(&self, predicate: &str, object: &RelObject) -> bool {
        self.relations
            .iter()
            .any(|r| r.predicate == predicate && &r.object == object)
    }

    pub fn objects(&self, predicate: &str) -> Vec<&RelObject> {
        self.relations
            .iter()
            .filter(|r| r.predicate == predicate)
            .map(|r| &r.object)
            .collect()
    }

    /// Value of the first statement with the given predicate.
    pub fn first_value(&self, predicate: &str) -> Option<&str> {
        self.relations
            .iter()
            .find(|r| r.predicate == predicate)
            .map(|r| r.object.value())
    }

    /// Values of every `rdf:resource` object for the predicate.
    pub fn resources(&self, predicate: &str) -> Vec<&str> {
        self.objects(predicate)
            .into_iter()
            .filter_map(|o| match o {
                RelObject::Resource(uri) => Some(uri.as_str()),
                RelObject::Literal(_) => None,
            })
            .collect()
    }

    /// Content models asserted through `fedora-model:hasModel`.
    pub fn content_models(&self) -> ContentModelSet {
        self.resources(HAS_MODEL).into_iter().collect()
    }

    /// Serialize as RDF/XML.
    pub fn to_xml(&self) -> String {
        let mut prefixes: Vec<(String, String)> = KNOWN_PREFIXES
            .iter()
            .map(|(p, ns)| (p.to_string(), ns.to_string()))
            .collect();
        for relation in &self.relations {
            let (ns, _) = split_uri(&relation.predicate);
            if !prefixes.iter().any(|(_, known)| known == ns) {
                let prefix = format!("ns{}", prefixes.len() - KNOWN_PREFIXES.len() + 1);
                prefixes.push((prefix, ns.to_string()));
            }
        }

        let mut out = String::from("<rdf:RDF");
        for (prefix, ns) in &prefixes {
            out.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape(ns)));
        }
        out.push_str(">\n");
        out.push_str(&format!(
            "  <rdf:Description rdf:about=\"{}\">\n",
            escape(&self.subject)
        ));
        for relation in &self.relations {
            let (ns, local) = split_uri(&relation.predicate);
            let prefix = prefixes
                .iter()
                .find(|(_, known)| known == ns)
                .map(|(p, _)| p.as_str())
                .unwrap_or("rdf");
            match &relation.object {
                RelObject::Resource(uri) => out.push_str(&format!(
                    "    <{}:{} rdf:resource=\"{}\"/>\n",
                    prefix,
                    local,
                    escape(uri)
                )),
                RelObject::Literal(value) => out.push_str(&format!(
                    "    <{0}:{1}>{2}</{0}:{1}>\n",
                    prefix,
                    local,
                    escape(value)
                )),
            }
        }
        out.push_str("  </rdf:Description>\n</rdf:RDF>\n");
        out
    }

    /// Parse RDF/XML containing a single `rdf:Description`.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut prefixes: HashMap<String, String> = HashMap::new();
        let mut rels = RelsExt::default();
        let mut in_description = false;
        let mut pending: Option<String> = None;
        let mut text = String::new();

        loop {
            let event = reader.read_event()?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let empty = matches!(event, Event::Empty(_));
                    collect_prefixes(e, &mut prefixes)?;
                    let uri = expand(&qualified_name(e), &prefixes)?;

                    if uri == RDF_DESCRIPTION {
                        if let Some(about) = rdf_attribute(e, "about", &prefixes)? {
                            rels.subject = about;
                        }
                        in_description = !empty;
                    } else if in_description {
                        if let Some(resource) = rdf_attribute(e, "resource", &prefixes)? {
                            rels.add(&uri, RelObject::Resource(resource));
                        } else if empty {
                            rels.add(&uri, RelObject::Literal(String::new()));
                        } else {
                            pending = Some(uri);
                            text.clear();
                        }
                    }
                }
                Event::Text(ref t) => {
                    if pending.is_some() {
                        text.push_str(&t.unescape()?);
                    }
                }
                Event::End(ref e) => {
                    if let Some(predicate) = pending.take() {
                        rels.add(&predicate, RelObject::Literal(text.clone()));
                    } else if in_description {
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        if expand(&name, &prefixes)? == RDF_DESCRIPTION {
                            in_description = false;
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(rels)
    }
}

/// Split a predicate URI into namespace and local name at the last `#` or `/`.
fn split_uri(uri: &str) -> (&str, &str) {
    match uri.rfind(|c| c == '#' || c == '/') {
        Some(idx) => uri.split_at(idx + 1),
        None => ("", uri),
    }
}

fn collect_prefixes(e: &BytesStart<'_>, prefixes: &mut HashMap<String, String>) -> Result<()> {
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if let Some(prefix) = key.strip_prefix("xmlns:") {
            prefixes.insert(prefix.to_string(), attr.unescape_value()?.into_owned());
        }
    }
    Ok(())
}

fn expand(qname: &str, prefixes: &HashMap<String, String>) -> Result<String> {
    match qname.split_once(':') {
        Some((prefix, local)) => prefixes
            .get(prefix)
            .map(|ns| format!("{}{}", ns, local))
            .ok_or_else(|| XmlError::Unexpected(format!("undeclared prefix '{}'", prefix))),
        None => Ok(qname.to_string()),
    }
}

/// Value of an attribute in the RDF namespace, e.g. `rdf:resource`.
fn rdf_attribute(
    e: &BytesStart<'_>,
    local: &str,
    prefixes: &HashMap<String, String>,
) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if let Some((prefix, name)) = key.split_once(':') {
            if name == local && prefixes.get(prefix).map(String::as_str) == Some(RDF_NS) {
                return Ok(Some(attr.unescape_value()?.into_owned()));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::namespaces::{
        IMAGE_CMODEL, IS_MEMBER_OF_COLLECTION, OAI_ITEM_ID, PUBLIC_ACCESS_CMODEL,
    };

    fn sample() -> RelsExt {
        let mut rels = RelsExt::new("info:fedora/demo:1");
        rels.add(HAS_MODEL, RelObject::Resource(PUBLIC_ACCESS_CMODEL.to_string()));
        rels.add(
            IS_MEMBER_OF_COLLECTION,
            RelObject::Resource("info:fedora/demo:coll".to_string()),
        );
        rels.add(OAI_ITEM_ID, RelObject::Literal("oai:ark:/25593/123".to_string()));
        rels
    }

    #[test]
    fn test_serialize() {
        let xml = sample().to_xml();
        assert!(xml.contains("<rdf:RDF"));
        assert!(xml.contains("demo:1"));
        assert!(xml.contains(&format!(
            "<fedora-model:hasModel rdf:resource=\"{}\"/>",
            PUBLIC_ACCESS_CMODEL
        )));
        assert!(xml.contains("<oai:itemID>oai:ark:/25593/123</oai:itemID>"));
    }

    #[test]
    fn test_parse_serialized() {
        let rels = sample();
        let parsed = RelsExt::from_xml(&rels.to_xml()).unwrap();
        assert_eq!(parsed, rels);
    }

    #[test]
    fn test_parse_foreign_prefixes() {
        let xml = r#"<r:RDF xmlns:r="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
                xmlns:m="info:fedora/fedora-system:def/model#"
                xmlns:x="http://example.com/terms/">
              <r:Description r:about="info:fedora/demo:2">
                <m:hasModel r:resource="info:fedora/genrepo-demo:Image-1.0"/>
                <x:note>hello &amp; bye</x:note>
              </r:Description>
            </r:RDF>"#;
        let rels = RelsExt::from_xml(xml).unwrap();
        assert_eq!(rels.subject, "info:fedora/demo:2");
        assert!(rels.content_models().contains(IMAGE_CMODEL));
        assert_eq!(
            rels.first_value("http://example.com/terms/note"),
            Some("hello & bye")
        );

        let reserialized = rels.to_xml();
        assert!(reserialized.contains("xmlns:ns1=\"http://example.com/terms/\""));
        assert_eq!(RelsExt::from_xml(&reserialized).unwrap(), rels);
    }

    #[test]
    fn test_set_single_replaces_and_clears() {
        let mut rels = sample();
        rels.set_single(OAI_ITEM_ID, Some(RelObject::Literal("oai:new".to_string())));
        assert_eq!(rels.objects(OAI_ITEM_ID).len(), 1);
        assert_eq!(rels.first_value(OAI_ITEM_ID), Some("oai:new"));

        rels.set_single(OAI_ITEM_ID, None);
        assert_eq!(rels.first_value(OAI_ITEM_ID), None);
        assert!(!rels.to_xml().contains("<oai:itemID>"));
    }

    #[test]
    fn test_add_is_idempotent_and_remove() {
        let mut rels = sample();
        let before = rels.relations.len();
        rels.add(HAS_MODEL, RelObject::Resource(PUBLIC_ACCESS_CMODEL.to_string()));
        assert_eq!(rels.relations.len(), before);

        assert!(rels.remove(HAS_MODEL, &RelObject::Resource(PUBLIC_ACCESS_CMODEL.to_string())));
        assert!(!rels.content_models().contains(PUBLIC_ACCESS_CMODEL));
    }

    #[test]
    fn test_undeclared_prefix_is_error() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
              <rdf:Description rdf:about="info:fedora/demo:3"><q:thing>x</q:thing></rdf:Description>
            </rdf:RDF>"#;
        assert!(matches!(RelsExt::from_xml(xml), Err(XmlError::Unexpected(_))));
    }
}
