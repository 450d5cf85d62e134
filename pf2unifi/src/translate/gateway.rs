//! `config.gateway.json` static host mappings.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};
use crate::model::DnsHostEntry;

/// What to do when two entries share a hostname.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Later entry replaces the earlier one.
    #[default]
    LastWins,
    /// Later addresses are appended to the existing `inet` list.
    Merge,
}

/// Gateway provisioning document holding DNS host mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub system: System,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    #[serde(rename = "static-host-mapping")]
    pub static_host_mapping: StaticHostMapping,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticHostMapping {
    #[serde(rename = "host-name")]
    pub host_name: BTreeMap<String, HostMapping>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMapping {
    pub inet: Vec<String>,
}

impl GatewayConfig {
    /// Add one entry under its hostname.
    pub fn insert(&mut self, entry: &DnsHostEntry, policy: DuplicatePolicy) {
        let hosts = &mut self.system.static_host_mapping.host_name;
        if policy == DuplicatePolicy::Merge {
            if let Some(existing) = hosts.get_mut(&entry.hostname) {
                if !existing.inet.contains(&entry.ip) {
                    existing.inet.push(entry.ip.clone());
                }
                return;
            }
        }

        let mapping = HostMapping {
            inet: vec![entry.ip.clone()],
        };
        if let Some(previous) = hosts.insert(entry.hostname.clone(), mapping) {
            tracing::warn!(
                hostname = %entry.hostname,
                replaced = ?previous.inet,
                ip = %entry.ip,
                "duplicate hostname, keeping the later address"
            );
        }
    }

    pub fn host(&self, hostname: &str) -> Option<&HostMapping> {
        self.system.static_host_mapping.host_name.get(hostname)
    }

    pub fn len(&self) -> usize {
        self.system.static_host_mapping.host_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.system.static_host_mapping.host_name.is_empty()
    }

    /// Pretty JSON with four-space indentation and sorted hostnames.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        buf.push(b'\n');
        String::from_utf8(buf).map_err(|err| MigrateError::Parse {
            source_name: "gateway config".to_string(),
            reason: err.to_string(),
        })
    }

    /// Write the document to `path`, replacing any existing file.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let json = self.to_pretty_json()?;
        fs::write(path, json).map_err(|source| MigrateError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), hosts = self.len(), "wrote gateway config");
        Ok(())
    }
}

/// Fold host entries into a gateway document, in order.
pub fn fold_hosts(entries: &[DnsHostEntry], policy: DuplicatePolicy) -> GatewayConfig {
    entries.iter().fold(GatewayConfig::default(), |mut config, entry| {
        config.insert(entry, policy);
        config
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{fold_hosts, DuplicatePolicy, GatewayConfig};
    use crate::model::DnsHostEntry;

    fn entry(hostname: &str, ip: &str) -> DnsHostEntry {
        DnsHostEntry {
            hostname: hostname.to_string(),
            ip: ip.to_string(),
            domain: None,
        }
    }

    #[test]
    fn single_entry_matches_gateway_shape() {
        let config = fold_hosts(&[entry("printer", "10.0.0.60")], DuplicatePolicy::LastWins);
        let compact = serde_json::to_string(&config).expect("serialize");
        assert_eq!(
            compact,
            r#"{"system":{"static-host-mapping":{"host-name":{"printer":{"inet":["10.0.0.60"]}}}}}"#
        );
    }

    #[test]
    fn duplicate_hostname_last_write_wins() {
        let config = fold_hosts(
            &[entry("nas", "10.0.0.10"), entry("nas", "10.0.0.11")],
            DuplicatePolicy::LastWins,
        );
        assert_eq!(config.len(), 1);
        assert_eq!(config.host("nas").expect("nas").inet, vec!["10.0.0.11"]);
    }

    #[test]
    fn duplicate_hostname_merge_keeps_both_once() {
        let config = fold_hosts(
            &[
                entry("nas", "10.0.0.10"),
                entry("nas", "10.0.0.11"),
                entry("nas", "10.0.0.10"),
            ],
            DuplicatePolicy::Merge,
        );
        assert_eq!(
            config.host("nas").expect("nas").inet,
            vec!["10.0.0.10", "10.0.0.11"]
        );
    }

    #[test]
    fn pretty_output_round_trips() {
        let config = fold_hosts(
            &[entry("switch", "10.0.0.2"), entry("ap", "10.0.0.3")],
            DuplicatePolicy::LastWins,
        );
        let json = config.to_pretty_json().expect("json");
        assert!(json.contains("\n    \"system\": {"));
        assert!(json.find("\"ap\"") < json.find("\"switch\""));

        let reparsed: GatewayConfig = serde_json::from_str(&json).expect("reparse");
        assert_eq!(reparsed, config);
    }

    #[test]
    fn empty_document_still_has_structure() {
        let config = fold_hosts(&[], DuplicatePolicy::LastWins);
        assert!(config.is_empty());
        assert_eq!(
            serde_json::to_string(&config).expect("serialize"),
            r#"{"system":{"static-host-mapping":{"host-name":{}}}}"#
        );
    }
}
