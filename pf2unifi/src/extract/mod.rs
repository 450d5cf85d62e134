//! Record extraction from a pfSense `config.xml` tree.

pub mod dhcp;
pub mod dns;

use std::path::Path;

use xml_tree::{parse_file, ParseError, Pattern, XmlNode};

use crate::error::{MigrateError, Result};
use crate::model::{DhcpReservation, DnsHostEntry};

pub use dhcp::{extract_reservations, STATICMAP_PATTERN};
pub use dns::{extract_hosts, select_reader, DnsSectionReader, DnsVariant, HostsHost, UnboundHosts};

/// Records pulled out of one source document.
#[derive(Debug, Default)]
pub struct Extraction {
    pub reservations: Vec<DhcpReservation>,
    pub hosts: Vec<DnsHostEntry>,
    /// Nodes that matched a pattern but could not be turned into a record.
    pub problems: Vec<MigrateError>,
}

/// Extract static mappings and DNS host entries from a parsed document.
pub fn extract(root: &XmlNode, variant: DnsVariant) -> Result<Extraction> {
    let (reservations, mut problems) = extract_reservations(root)?;

    let reader = select_reader(root, variant)?;
    let (hosts, dns_problems) = extract_hosts(root, reader)?;
    problems.extend(dns_problems);

    tracing::info!(
        reservations = reservations.len(),
        hosts = hosts.len(),
        skipped = problems.len(),
        dns_layout = reader.name(),
        "extracted {} DHCP reservations and {} static DNS entries",
        reservations.len(),
        hosts.len()
    );

    Ok(Extraction {
        reservations,
        hosts,
        problems,
    })
}

/// Parse `path` and extract records from it.
pub fn extract_file(path: &Path, variant: DnsVariant) -> Result<Extraction> {
    let root = parse_file(path).map_err(|err| match err {
        ParseError::Io(source) => MigrateError::Io {
            path: path.display().to_string(),
            source,
        },
        other => MigrateError::Parse {
            source_name: path.display().to_string(),
            reason: other.to_string(),
        },
    })?;
    extract(&root, variant)
}

fn compile(pattern: &str) -> Result<Pattern> {
    Pattern::parse(pattern).map_err(|err| MigrateError::Parse {
        source_name: format!("query '{pattern}'"),
        reason: err.to_string(),
    })
}
