//! Small XML helpers shared by the metadata and profile parsers.

use std::borrow::Cow;

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Errors raised while reading XML content.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("malformed XML attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("unexpected XML content: {0}")]
    Unexpected(String),
}

pub type Result<T> = std::result::Result<T, XmlError>;

/// Escape text for inclusion in element content or attribute values.
pub fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Collect `(local_name, text)` for every element that directly contains text,
/// in document order. Namespace prefixes are dropped.
pub fn leaf_texts(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut out = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(local_name(&e)),
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(t) => {
                if let Some(name) = stack.last() {
                    out.push((name.clone(), t.unescape()?.into_owned()));
                }
            }
            Event::CData(c) => {
                if let Some(name) = stack.last() {
                    out.push((
                        name.clone(),
                        String::from_utf8_lossy(&c.into_inner()).into_owned(),
                    ));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

pub(crate) fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

pub(crate) fn qualified_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_texts_drops_prefixes() {
        let xml = r#"<a:root xmlns:a="x"><a:one>1</a:one><two><three>3 &amp; 4</three></two></a:root>"#;
        let texts = leaf_texts(xml).unwrap();
        assert_eq!(
            texts,
            vec![
                ("one".to_string(), "1".to_string()),
                ("three".to_string(), "3 & 4".to_string()),
            ]
        );
    }

    #[test]
    fn test_leaf_texts_rejects_mismatched_tags() {
        assert!(leaf_texts("<a><b></a>").is_err());
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }
}
