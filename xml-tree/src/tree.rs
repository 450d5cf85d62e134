use std::collections::BTreeMap;

use crate::query::{Pattern, QueryError, Selected};

/// A generic XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    /// Element tag name.
    pub tag: String,
    /// XML attributes keyed by name.
    pub attributes: BTreeMap<String, String>,
    /// Child elements in document order.
    pub children: Vec<XmlNode>,
    /// Text content, if the element had any non-blank text.
    pub text: Option<String>,
}

impl XmlNode {
    /// Create an element with no attributes, children, or text.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Builder helper: set text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder helper: append a child element.
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Return the first child with the provided tag.
    pub fn get_child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Return all children with the provided tag.
    pub fn get_children(&self, tag: &str) -> Vec<&XmlNode> {
        self.children
            .iter()
            .filter(|child| child.tag == tag)
            .collect()
    }

    /// Trimmed text of the first child named `tag`.
    ///
    /// Blank text is reported as `None`, the same as a missing child.
    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.get_child(tag)
            .and_then(|child| child.text.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Select every element matching `pattern`, in document order.
    pub fn select(&self, pattern: &Pattern) -> Vec<Selected<'_>> {
        pattern.select(self)
    }

    /// Parse `pattern` and select matching elements.
    pub fn find_all(&self, pattern: &str) -> Result<Vec<Selected<'_>>, QueryError> {
        Ok(Pattern::parse(pattern)?.select(self))
    }
}
