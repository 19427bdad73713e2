//! Dublin Core descriptive metadata (the `DC` datastream).

use serde::{Deserialize, Serialize};

use super::namespaces::{DC_NS, OAI_DC_NS};
use super::xml::{escape, leaf_texts, Result};

/// DCMI Type vocabulary, as offered for `dc:type`.
pub const DCMI_TYPES: &[&str] = &[
    "Collection",
    "Dataset",
    "Event",
    "Image",
    "InteractiveResource",
    "MovingImage",
    "PhysicalObject",
    "Service",
    "Software",
    "Sound",
    "StillImage",
    "Text",
];

/// Dublin Core metadata for a repository object.
///
/// Fields that are commonly repeated are lists; the rest keep a single value
/// (the first one found when parsing).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DublinCore {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub creators: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub contributors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub coverage: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub relations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub subjects: Vec<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub dc_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl DublinCore {
    /// Parse an `oai_dc:dc` document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut dc = DublinCore::default();
        for (name, value) in leaf_texts(xml)? {
            match name.as_str() {
                "title" => set_first(&mut dc.title, value),
                "description" => set_first(&mut dc.description, value),
                "creator" => dc.creators.push(value),
                "contributor" => dc.contributors.push(value),
                "date" => set_first(&mut dc.date, value),
                "coverage" => dc.coverage.push(value),
                "language" => set_first(&mut dc.language, value),
                "publisher" => set_first(&mut dc.publisher, value),
                "relation" => dc.relations.push(value),
                "rights" => set_first(&mut dc.rights, value),
                "source" => set_first(&mut dc.source, value),
                "subject" => dc.subjects.push(value),
                "type" => set_first(&mut dc.dc_type, value),
                "format" => set_first(&mut dc.format, value),
                "identifier" => set_first(&mut dc.identifier, value),
                _ => {}
            }
        }
        Ok(dc)
    }

    /// Serialize as an indented `oai_dc:dc` document.
    pub fn to_xml(&self) -> String {
        let mut out = format!(
            "<oai_dc:dc xmlns:oai_dc=\"{}\" xmlns:dc=\"{}\">\n",
            OAI_DC_NS, DC_NS
        );
        for (name, value) in self.elements() {
            out.push_str(&format!("  <dc:{0}>{1}</dc:{0}>\n", name, escape(value)));
        }
        out.push_str("</oai_dc:dc>\n");
        out
    }

    /// All present elements as `(element name, value)` pairs, in DC order.
    pub fn elements(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::new();
        push_single(&mut out, "title", &self.title);
        for v in &self.creators {
            out.push(("creator", v.as_str()));
        }
        for v in &self.subjects {
            out.push(("subject", v.as_str()));
        }
        push_single(&mut out, "description", &self.description);
        push_single(&mut out, "publisher", &self.publisher);
        for v in &self.contributors {
            out.push(("contributor", v.as_str()));
        }
        push_single(&mut out, "date", &self.date);
        push_single(&mut out, "type", &self.dc_type);
        push_single(&mut out, "format", &self.format);
        push_single(&mut out, "identifier", &self.identifier);
        push_single(&mut out, "source", &self.source);
        push_single(&mut out, "language", &self.language);
        for v in &self.relations {
            out.push(("relation", v.as_str()));
        }
        for v in &self.coverage {
            out.push(("coverage", v.as_str()));
        }
        push_single(&mut out, "rights", &self.rights);
        out
    }
}

fn push_single<'a>(
    out: &mut Vec<(&'static str, &'a str)>,
    name: &'static str,
    value: &'a Option<String>,
) {
    if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
        out.push((name, v));
    }
}

fn set_first(slot: &mut Option<String>, value: String) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

/// Whether `value` is a term of the DCMI Type vocabulary.
pub fn is_dcmi_type(value: &str) -> bool {
    DCMI_TYPES.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"
            xmlns:dc="http://purl.org/dc/elements/1.1/">
          <dc:title>Letters &amp; Papers</dc:title>
          <dc:title>Alternate title</dc:title>
          <dc:creator>You</dc:creator>
          <dc:creator>Me</dc:creator>
          <dc:subject>testing</dc:subject>
          <dc:type>Text</dc:type>
          <dc:date>2011-03</dc:date>
          <dc:identifier>demo:1</dc:identifier>
        </oai_dc:dc>"#;

    #[test]
    fn test_parse_fields() {
        let dc = DublinCore::from_xml(SAMPLE).unwrap();
        assert_eq!(dc.title.as_deref(), Some("Letters & Papers"));
        assert_eq!(dc.creators, vec!["You", "Me"]);
        assert_eq!(dc.subjects, vec!["testing"]);
        assert_eq!(dc.dc_type.as_deref(), Some("Text"));
        assert_eq!(dc.date.as_deref(), Some("2011-03"));
        assert_eq!(dc.identifier.as_deref(), Some("demo:1"));
        assert_eq!(dc.description, None);
    }

    #[test]
    fn test_serialize_escapes_and_skips_empty() {
        let dc = DublinCore {
            title: Some("A <b> & c".to_string()),
            description: Some(String::new()),
            subjects: vec!["one".to_string(), "two".to_string()],
            ..Default::default()
        };
        let xml = dc.to_xml();
        assert!(xml.contains("<dc:title>A &lt;b&gt; &amp; c</dc:title>"));
        assert!(!xml.contains("dc:description"));
        assert_eq!(xml.matches("<dc:subject>").count(), 2);

        let parsed = DublinCore::from_xml(&xml).unwrap();
        assert_eq!(parsed.title, dc.title);
        assert_eq!(parsed.subjects, dc.subjects);
    }

    #[test]
    fn test_empty_document() {
        let dc = DublinCore::from_xml(&DublinCore::default().to_xml()).unwrap();
        assert_eq!(dc, DublinCore::default());
    }

    #[test]
    fn test_dcmi_types() {
        assert!(is_dcmi_type("StillImage"));
        assert!(!is_dcmi_type("stillimage"));
    }
}
