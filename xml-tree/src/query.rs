//! Path queries over an [`XmlNode`] tree.
//!
//! Supported syntax, evaluated relative to the node the query starts from:
//!
//! - `a/b`: child `a`, then its children `b`
//! - `.//a`: every descendant `a`, at any depth
//! - `.//a//b`: every descendant `b` of every descendant `a`
//! - `.//a/b`: children `b` of every descendant `a`
//!
//! Results come back in document order and each element at most once, even
//! when the contexts they were reached from are nested inside each other.

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use crate::tree::XmlNode;

/// Errors raised for unsupported or malformed patterns.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("empty query pattern")]
    Empty,
    #[error("empty step in query pattern '{0}'")]
    EmptyStep(String),
    #[error("unsupported step '{step}' in query pattern '{pattern}'")]
    Unsupported { pattern: String, step: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    tag: String,
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    steps: Vec<Step>,
}

/// An element matched by a [`Pattern`], with its location in the tree.
#[derive(Debug, Clone)]
pub struct Selected<'a> {
    pub node: &'a XmlNode,
    path: String,
}

impl Pattern {
    /// Compile a pattern string.
    pub fn parse(pattern: &str) -> Result<Self, QueryError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() || trimmed == "." {
            return Err(QueryError::Empty);
        }

        let (mut axis, mut rest) = match trimmed.strip_prefix(".//") {
            Some(rest) => (Axis::Descendant, rest),
            None => (Axis::Child, trimmed.strip_prefix("./").unwrap_or(trimmed)),
        };

        let mut steps = Vec::new();
        loop {
            let (tag, tail) = match rest.find('/') {
                Some(idx) => (&rest[..idx], Some(&rest[idx..])),
                None => (rest, None),
            };
            if tag.is_empty() {
                return Err(QueryError::EmptyStep(trimmed.to_string()));
            }
            if tag == "." || tag == ".." || tag == "*" || tag.contains(['[', ']', '@']) {
                return Err(QueryError::Unsupported {
                    pattern: trimmed.to_string(),
                    step: tag.to_string(),
                });
            }
            steps.push(Step {
                axis,
                tag: tag.to_string(),
            });

            let Some(tail) = tail else { break };
            if let Some(next) = tail.strip_prefix("//") {
                axis = Axis::Descendant;
                rest = next;
            } else {
                axis = Axis::Child;
                rest = &tail[1..];
            }
        }

        Ok(Self { steps })
    }

    /// Evaluate against `root`.
    pub fn select<'a>(&self, root: &'a XmlNode) -> Vec<Selected<'a>> {
        let order = preorder_index(root);
        let mut current = vec![Located {
            node: root,
            path: root.tag.clone(),
        }];

        for step in &self.steps {
            let mut seen: HashSet<*const XmlNode> = HashSet::new();
            let mut next = Vec::new();
            for ctx in &current {
                match step.axis {
                    Axis::Child => push_children(ctx, &step.tag, &mut seen, &mut next),
                    Axis::Descendant => push_descendants(ctx, &step.tag, &mut seen, &mut next),
                }
            }
            next.sort_by_key(|located| order.get(&(located.node as *const XmlNode)).copied());
            current = next;
        }

        current
            .into_iter()
            .map(|located| Selected {
                node: located.node,
                path: located.path,
            })
            .collect()
    }
}

impl Selected<'_> {
    /// Slash-separated location, e.g. `pfsense/dhcpd/lan/staticmap[2]`.
    ///
    /// A `[n]` ordinal (1-based) is added to a segment only when the parent
    /// holds more than one child with that tag.
    pub fn path(&self) -> &str {
        &self.path
    }
}

struct Located<'a> {
    node: &'a XmlNode,
    path: String,
}

fn push_children<'a>(
    ctx: &Located<'a>,
    tag: &str,
    seen: &mut HashSet<*const XmlNode>,
    out: &mut Vec<Located<'a>>,
) {
    for (child, path) in child_paths(ctx.node, &ctx.path) {
        if child.tag == tag && seen.insert(child as *const XmlNode) {
            out.push(Located { node: child, path });
        }
    }
}

fn push_descendants<'a>(
    ctx: &Located<'a>,
    tag: &str,
    seen: &mut HashSet<*const XmlNode>,
    out: &mut Vec<Located<'a>>,
) {
    for (child, path) in child_paths(ctx.node, &ctx.path) {
        if child.tag == tag && seen.insert(child as *const XmlNode) {
            out.push(Located {
                node: child,
                path: path.clone(),
            });
        }
        push_descendants(&Located { node: child, path }, tag, seen, out);
    }
}

fn preorder_index(root: &XmlNode) -> HashMap<*const XmlNode, usize> {
    let mut index = HashMap::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        index.insert(node as *const XmlNode, index.len());
        stack.extend(node.children.iter().rev());
    }
    index
}

fn child_paths<'a>(parent: &'a XmlNode, parent_path: &str) -> Vec<(&'a XmlNode, String)> {
    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for child in &parent.children {
        *totals.entry(child.tag.as_str()).or_default() += 1;
    }

    let mut counters: BTreeMap<&str, usize> = BTreeMap::new();
    parent
        .children
        .iter()
        .map(|child| {
            let tag = child.tag.as_str();
            let n = counters.entry(tag).or_default();
            *n += 1;
            let path = if totals[tag] > 1 {
                format!("{parent_path}/{tag}[{n}]")
            } else {
                format!("{parent_path}/{tag}")
            };
            (child, path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Pattern, QueryError};
    use crate::parse;

    #[test]
    fn parse_rejects_empty_and_unsupported_steps() {
        assert_eq!(Pattern::parse("  "), Err(QueryError::Empty));
        assert!(matches!(
            Pattern::parse(".//dhcpd//"),
            Err(QueryError::EmptyStep(_))
        ));
        assert!(matches!(
            Pattern::parse(".//hosts/*"),
            Err(QueryError::Unsupported { .. })
        ));
        assert!(matches!(
            Pattern::parse("hosts[@id]"),
            Err(QueryError::Unsupported { .. })
        ));
    }

    #[test]
    fn descendant_query_keeps_document_order() {
        let root = parse(
            br#"<r><a><x>1</x><b><x>2</x></b></a><x>3</x><a><x>4</x></a></r>"#,
        )
        .expect("parse");
        let found = root.find_all(".//a//x").expect("query");
        let texts: Vec<_> = found
            .iter()
            .map(|s| s.node.text.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(texts, vec!["1", "2", "4"]);
    }

    #[test]
    fn nested_contexts_do_not_duplicate_matches() {
        let root = parse(br#"<r><a><a><x>1</x></a></a></r>"#).expect("parse");
        let found = root.find_all(".//a//x").expect("query");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn child_step_from_nested_contexts_keeps_document_order() {
        let root = parse(br#"<r><a><a><x>1</x></a><x>2</x></a></r>"#).expect("parse");
        let found = root.find_all(".//a/x").expect("query");
        let texts: Vec<_> = found
            .iter()
            .map(|s| s.node.text.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(texts, vec!["1", "2"]);
    }

    #[test]
    fn child_step_only_matches_direct_children() {
        let root = parse(br#"<r><u><hosts>1</hosts><z><hosts>2</hosts></z></u></r>"#)
            .expect("parse");
        let found = root.find_all(".//u/hosts").expect("query");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node.text.as_deref(), Some("1"));
    }

    #[test]
    fn paths_carry_ordinals_only_for_repeated_tags() {
        let root = parse(
            br#"<pfsense><dhcpd><lan><staticmap/><staticmap/></lan><opt1><staticmap/></opt1></dhcpd></pfsense>"#,
        )
        .expect("parse");
        let found = root.find_all(".//dhcpd//staticmap").expect("query");
        let paths: Vec<_> = found.iter().map(|s| s.path()).collect();
        assert_eq!(
            paths,
            vec![
                "pfsense/dhcpd/lan/staticmap[1]",
                "pfsense/dhcpd/lan/staticmap[2]",
                "pfsense/dhcpd/opt1/staticmap",
            ]
        );
    }

    #[test]
    fn relative_child_pattern_starts_at_root() {
        let root = parse(br#"<r><a><b/></a></r>"#).expect("parse");
        assert_eq!(root.find_all("a/b").expect("query").len(), 1);
        assert_eq!(root.find_all("b").expect("query").len(), 0);
    }
}
