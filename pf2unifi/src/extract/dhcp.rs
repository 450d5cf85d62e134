use xml_tree::{Selected, XmlNode};

use crate::error::{MigrateError, Result};
use crate::model::{DhcpReservation, UNKNOWN_HOSTNAME};

use super::compile;

/// Static mappings live under any interface inside `<dhcpd>`.
pub const STATICMAP_PATTERN: &str = ".//dhcpd//staticmap";

/// Extract every `<staticmap>` in document order.
///
/// Mappings without `mac` or `ipaddr` are returned as errors in the second
/// vector rather than aborting the whole extraction.
pub fn extract_reservations(
    root: &XmlNode,
) -> Result<(Vec<DhcpReservation>, Vec<MigrateError>)> {
    let pattern = compile(STATICMAP_PATTERN)?;
    let mut records = Vec::new();
    let mut problems = Vec::new();

    for selected in root.select(&pattern) {
        match reservation_from(&selected) {
            Ok(record) => {
                tracing::debug!(%record, "found static mapping");
                records.push(record);
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping static mapping");
                problems.push(err);
            }
        }
    }

    Ok((records, problems))
}

fn reservation_from(selected: &Selected<'_>) -> Result<DhcpReservation> {
    let node = selected.node;
    let required = |field: &'static str| {
        node.child_text(field)
            .map(str::to_string)
            .ok_or_else(|| MigrateError::MissingField {
                node: selected.path().to_string(),
                field,
            })
    };

    Ok(DhcpReservation {
        mac: required("mac")?,
        ip: required("ipaddr")?,
        hostname: node
            .child_text("hostname")
            .unwrap_or(UNKNOWN_HOSTNAME)
            .to_string(),
        interface: interface_from_path(selected.path()),
    })
}

// `pfsense/dhcpd/lan/staticmap[2]` -> `lan`
fn interface_from_path(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('/').collect();
    let dhcpd = segments
        .iter()
        .position(|segment| strip_ordinal(segment) == "dhcpd")?;
    let iface = segments.get(dhcpd + 1)?;
    if dhcpd + 2 >= segments.len() {
        return None;
    }
    Some(strip_ordinal(iface).to_string())
}

fn strip_ordinal(segment: &str) -> &str {
    segment.split('[').next().unwrap_or(segment)
}
