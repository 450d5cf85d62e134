//! DNS host override readers.
//!
//! pfSense stores host overrides in two layouts depending on which resolver
//! the export came from:
//!
//! - Unbound: repeated `<unbound><hosts>` elements with `host`, `ip`, `domain`
//! - dnsmasq-style: `<hosts><host>` elements with `host` and `ip` only
//!
//! Both are read through [`DnsSectionReader`] so extraction logic exists once.

use serde::Deserialize;
use xml_tree::{Selected, XmlNode};

use crate::error::{MigrateError, Result};
use crate::model::DnsHostEntry;

use super::compile;

/// Which host-override layout to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsVariant {
    /// Use the first layout that has any entries, preferring Unbound.
    #[default]
    Auto,
    Unbound,
    Hosts,
}

/// Reads one host-override layout.
pub trait DnsSectionReader {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Path pattern selecting one element per host entry.
    fn pattern(&self) -> &'static str;

    /// Whether a matched element is an entry at all.
    fn accepts(&self, _node: &XmlNode) -> bool {
        true
    }

    /// Build an entry from one selected element.
    fn read(&self, selected: &Selected<'_>) -> Result<DnsHostEntry>;
}

/// `<unbound><hosts>` layout.
pub struct UnboundHosts;

/// `<hosts><host>` layout.
pub struct HostsHost;

impl DnsSectionReader for UnboundHosts {
    fn name(&self) -> &'static str {
        "unbound"
    }

    fn pattern(&self) -> &'static str {
        ".//unbound/hosts"
    }

    fn read(&self, selected: &Selected<'_>) -> Result<DnsHostEntry> {
        Ok(DnsHostEntry {
            hostname: required(selected, "host")?,
            ip: required(selected, "ip")?,
            domain: selected.node.child_text("domain").map(str::to_string),
        })
    }
}

impl DnsSectionReader for HostsHost {
    fn name(&self) -> &'static str {
        "hosts"
    }

    fn pattern(&self) -> &'static str {
        ".//hosts/host"
    }

    // `unbound/hosts/host` is a leaf holding the hostname, not an entry.
    fn accepts(&self, node: &XmlNode) -> bool {
        !node.children.is_empty()
    }

    fn read(&self, selected: &Selected<'_>) -> Result<DnsHostEntry> {
        Ok(DnsHostEntry {
            hostname: required(selected, "host")?,
            ip: required(selected, "ip")?,
            domain: None,
        })
    }
}

fn required(selected: &Selected<'_>, field: &'static str) -> Result<String> {
    selected
        .node
        .child_text(field)
        .map(str::to_string)
        .ok_or_else(|| MigrateError::MissingField {
            node: selected.path().to_string(),
            field,
        })
}

/// Pick the reader for `variant`.
///
/// `Auto` probes Unbound first, then the `hosts/host` layout, and falls back
/// to Unbound (yielding no entries) when neither matches.
pub fn select_reader(root: &XmlNode, variant: DnsVariant) -> Result<&'static dyn DnsSectionReader> {
    match variant {
        DnsVariant::Unbound => Ok(&UnboundHosts),
        DnsVariant::Hosts => Ok(&HostsHost),
        DnsVariant::Auto => {
            let candidates: [&'static dyn DnsSectionReader; 2] = [&UnboundHosts, &HostsHost];
            for reader in candidates {
                if !entries(root, reader)?.is_empty() {
                    return Ok(reader);
                }
            }
            Ok(&UnboundHosts)
        }
    }
}

/// Extract host entries with `reader`, in document order.
pub fn extract_hosts(
    root: &XmlNode,
    reader: &dyn DnsSectionReader,
) -> Result<(Vec<DnsHostEntry>, Vec<MigrateError>)> {
    let mut records = Vec::new();
    let mut problems = Vec::new();

    for selected in entries(root, reader)? {
        match reader.read(&selected) {
            Ok(entry) => {
                tracing::debug!(%entry, layout = reader.name(), "found DNS entry");
                records.push(entry);
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping DNS entry");
                problems.push(err);
            }
        }
    }

    Ok((records, problems))
}

fn entries<'a>(root: &'a XmlNode, reader: &dyn DnsSectionReader) -> Result<Vec<Selected<'a>>> {
    let pattern = compile(reader.pattern())?;
    Ok(root
        .select(&pattern)
        .into_iter()
        .filter(|selected| reader.accepts(selected.node))
        .collect())
}
