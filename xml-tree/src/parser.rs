use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use thiserror::Error;

use crate::tree::XmlNode;

/// Errors raised while building an [`XmlNode`] tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The tokenizer rejected the input.
    #[error("failed to parse XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Tag, attribute, or CDATA bytes were not UTF-8.
    #[error("invalid UTF-8 in XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    /// An entity or escape sequence could not be decoded.
    #[error("failed to decode XML text: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    /// The input file could not be read.
    #[error("failed to read XML file: {0}")]
    Io(#[from] std::io::Error),
    /// Well-formed tokens, broken structure.
    #[error("malformed XML at byte {position}: {reason}")]
    Malformed { position: u64, reason: &'static str },
}

/// Parse XML bytes into an element tree.
pub fn parse(xml: &[u8]) -> Result<XmlNode, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut open: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let position = reader.buffer_position() as u64;
        match event {
            Event::Start(start) => open.push(element(&start, &reader)?),
            Event::Empty(start) => {
                let node = element(&start, &reader)?;
                attach(node, &mut open, &mut root, position)?;
            }
            Event::End(_) => {
                let node = open.pop().ok_or(ParseError::Malformed {
                    position,
                    reason: "closing tag without matching open tag",
                })?;
                attach(node, &mut open, &mut root, position)?;
            }
            Event::Text(text) => {
                if let Some(current) = open.last_mut() {
                    append_text(current, &text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = open.last_mut() {
                    append_text(current, std::str::from_utf8(data.as_ref())?);
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
        }
        buf.clear();
    }

    if !open.is_empty() {
        return Err(ParseError::Malformed {
            position: reader.buffer_position() as u64,
            reason: "document ended with unclosed elements",
        });
    }

    root.ok_or(ParseError::Malformed {
        position: 0,
        reason: "no root element",
    })
}

/// Read and parse an XML file.
pub fn parse_file(path: &Path) -> Result<XmlNode, ParseError> {
    let bytes = fs::read(path)?;
    parse(&bytes)
}

fn attach(
    node: XmlNode,
    open: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    position: u64,
) -> Result<(), ParseError> {
    if let Some(parent) = open.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(ParseError::Malformed {
            position,
            reason: "more than one top-level element",
        });
    }
    *root = Some(node);
    Ok(())
}

// Whitespace-only runs between child elements are layout, not content.
fn append_text(node: &mut XmlNode, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    match &mut node.text {
        Some(existing) => existing.push_str(text),
        None => node.text = Some(text.to_string()),
    }
}

fn element(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<XmlNode, ParseError> {
    let mut node = XmlNode::new(name(start.name())?);
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let value = attr.decode_and_unescape_value(reader.decoder())?;
        node.attributes
            .insert(name(attr.key)?, value.into_owned());
    }
    Ok(node)
}

fn name(qname: QName<'_>) -> Result<String, ParseError> {
    Ok(std::str::from_utf8(qname.as_ref())?.to_string())
}

#[cfg(test)]
mod tests {
    use super::{parse, ParseError};

    #[test]
    fn rejects_second_root() {
        let err = parse(b"<a/><b/>").expect_err("two roots");
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn rejects_unclosed_element() {
        let err = parse(b"<pfsense><dhcpd>").expect_err("unclosed");
        assert!(err.to_string().contains("unclosed"));
    }

    #[test]
    fn keeps_cdata_and_entities() {
        let node = parse(b"<host><descr><![CDATA[a & b]]></descr><ip>10.0.0.1 &amp; co</ip></host>")
            .expect("parse");
        assert_eq!(node.child_text("descr"), Some("a & b"));
        assert_eq!(node.child_text("ip"), Some("10.0.0.1 & co"));
    }
}
