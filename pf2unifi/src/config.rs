//! Run configuration loaded from a TOML file.
//!
//! ```toml
//! [source]
//! host = "192.168.1.1"
//! user = "admin"
//! remote_path = "/cf/conf/config.xml"
//! local_path = "config.xml"
//!
//! [controller]
//! url = "https://192.168.1.2"
//! api_key = "..."
//! lan_name = "Default"
//!
//! [gateway]
//! host = "192.168.1.2"
//!
//! [output]
//! path = "config.gateway.json"
//! ```
//!
//! The `[source]` and `[gateway]` hosts are reached with the system `scp` and
//! `ssh` clients in batch mode. Password logins are not supported; set
//! `identity_file` or load the key into an ssh agent.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{MigrateError, Result};
use crate::extract::DnsVariant;
use crate::remote::SshTarget;
use crate::translate::{DuplicatePolicy, NetworkField};

/// Environment variable consulted when `controller.api_key` is empty.
pub const API_KEY_ENV: &str = "PF2UNIFI_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    pub controller: Option<ControllerConfig>,
    pub gateway: Option<GatewayHost>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The pfSense box the export is copied from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub host: Option<String>,
    pub user: String,
    pub port: u16,
    pub identity_file: Option<PathBuf>,
    pub remote_path: String,
    pub local_path: PathBuf,
    pub dns_variant: DnsVariant,
}

/// The UniFi Network controller reservations are created on.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    pub lan_name: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub network_field: NetworkField,
}

/// Host that receives `config.gateway.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayHost {
    pub host: String,
    #[serde(default = "default_gateway_user")]
    pub user: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
    #[serde(default = "default_gateway_remote_path")]
    pub remote_path: String,
    #[serde(default = "default_restart_command")]
    pub restart_command: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub duplicate_hostnames: DuplicatePolicy,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            host: None,
            user: "admin".to_string(),
            port: default_ssh_port(),
            identity_file: None,
            remote_path: "/cf/conf/config.xml".to_string(),
            local_path: PathBuf::from("config.xml"),
            dns_variant: DnsVariant::Auto,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config.gateway.json"),
            duplicate_hostnames: DuplicatePolicy::LastWins,
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_ssh_port() -> u16 {
    22
}

fn default_gateway_user() -> String {
    "root".to_string()
}

fn default_gateway_remote_path() -> String {
    "/usr/lib/unifi/data/sites/default/config.gateway.json".to_string()
}

fn default_restart_command() -> String {
    "sudo systemctl restart unifi".to_string()
}

impl Config {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            MigrateError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml(&raw)
            .map_err(|err| MigrateError::Config(format!("{}: {err}", path.display())))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn controller(&self) -> Result<&ControllerConfig> {
        self.controller
            .as_ref()
            .ok_or_else(|| MigrateError::Config("missing [controller] section".to_string()))
    }

    pub fn gateway(&self) -> Result<&GatewayHost> {
        self.gateway
            .as_ref()
            .ok_or_else(|| MigrateError::Config("missing [gateway] section".to_string()))
    }
}

impl SourceConfig {
    pub fn ssh_target(&self) -> Result<SshTarget> {
        let host = self
            .host
            .clone()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| MigrateError::Config("source.host is required to fetch".to_string()))?;
        Ok(SshTarget {
            host,
            user: self.user.clone(),
            port: self.port,
            identity_file: self.identity_file.clone(),
        })
    }
}

impl ControllerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// The configured key, or the value of [`API_KEY_ENV`] when unset.
    pub fn resolved_api_key(&self) -> Result<String> {
        self.api_key_from(env::var(API_KEY_ENV).ok())
    }

    fn api_key_from(&self, fallback: Option<String>) -> Result<String> {
        let key = self.api_key.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
        fallback
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                MigrateError::Config(format!(
                    "controller.api_key is empty and {API_KEY_ENV} is not set"
                ))
            })
    }
}

impl GatewayHost {
    pub fn ssh_target(&self) -> SshTarget {
        SshTarget {
            host: self.host.clone(),
            user: self.user.clone(),
            port: self.port,
            identity_file: self.identity_file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::Config;
    use crate::error::MigrateError;
    use crate::extract::DnsVariant;
    use crate::translate::{DuplicatePolicy, NetworkField};

    const FULL: &str = r#"
[source]
host = "192.168.1.1"
user = "admin"
identity_file = "/home/op/.ssh/id_ed25519"
dns_variant = "hosts"

[controller]
url = "https://192.168.1.2"
api_key = "secret"
lan_name = "Default"
accept_invalid_certs = true
network_field = "network_id"

[gateway]
host = "192.168.1.2"

[output]
path = "out/config.gateway.json"
duplicate_hostnames = "merge"
"#;

    #[test]
    fn parses_full_file() {
        let config = Config::from_toml(FULL).expect("parse");
        assert_eq!(config.source.port, 22);
        assert_eq!(config.source.remote_path, "/cf/conf/config.xml");
        assert_eq!(config.source.dns_variant, DnsVariant::Hosts);

        let controller = config.controller().expect("controller");
        assert!(controller.accept_invalid_certs);
        assert_eq!(controller.timeout_secs, 10);
        assert_eq!(controller.network_field, NetworkField::NetworkId);

        let gateway = config.gateway().expect("gateway");
        assert_eq!(gateway.user, "root");
        assert_eq!(gateway.restart_command, "sudo systemctl restart unifi");

        assert_eq!(config.output.path, PathBuf::from("out/config.gateway.json"));
        assert_eq!(config.output.duplicate_hostnames, DuplicatePolicy::Merge);
    }

    #[test]
    fn optional_sections_default() {
        let config = Config::from_toml("").expect("parse");
        assert_eq!(config.source.local_path, PathBuf::from("config.xml"));
        assert_eq!(config.output.path, PathBuf::from("config.gateway.json"));
        assert!(matches!(config.gateway(), Err(MigrateError::Config(_))));
        assert!(matches!(
            config.source.ssh_target(),
            Err(MigrateError::Config(_))
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("[source]\nhots = \"x\"\n").is_err());
    }

    #[test]
    fn api_key_falls_back_to_environment_value() {
        let config = Config::from_toml(
            "[controller]\nurl = \"https://u\"\nlan_name = \"lan\"\n",
        )
        .expect("parse");
        let controller = config.controller().expect("controller");

        assert_eq!(
            controller
                .api_key_from(Some(" from-env ".to_string()))
                .expect("key"),
            "from-env"
        );
        assert!(matches!(
            controller.api_key_from(None),
            Err(MigrateError::Config(_))
        ));
    }

    #[test]
    fn load_reports_path_on_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[controller\n").expect("write");

        let err = Config::load(&path).expect_err("should fail");
        assert!(err.to_string().contains("broken.toml"));
    }
}
