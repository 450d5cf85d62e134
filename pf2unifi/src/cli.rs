use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "pf2unifi")]
#[command(about = "Migrate pfSense DHCP reservations and static DNS entries to a UniFi gateway")]
#[command(after_help = "Reservations are created blindly; re-running creates duplicates on the controller.\n\
    scp and ssh run in batch mode: use a key (source.identity_file) or an ssh agent, passwords are not prompted for.")]
pub struct Cli {
    /// Fetch config.xml from pfSense, then migrate to UniFi.
    #[arg(short, long)]
    pub all: bool,
    /// Only fetch config.xml from pfSense and report what it contains.
    #[arg(short = 'p', long)]
    pub fetch_only: bool,
    /// Only migrate from the local config.xml to UniFi.
    #[arg(short = 'u', long)]
    pub unifi_only: bool,
    /// Show each extracted record and API call.
    #[arg(short, long)]
    pub verbose: bool,
    /// Configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
    /// Override source.local_path from the configuration.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Override output.path from the configuration.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// DNS host override layout in the source export.
    #[arg(long, value_enum)]
    pub dns_variant: Option<DnsVariantArg>,
    /// Print reservation payloads instead of submitting them.
    #[arg(long)]
    pub dry_run: bool,
    /// Upload config.gateway.json to the [gateway] host and restart the service.
    #[arg(long, conflicts_with = "dry_run")]
    pub upload: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum DnsVariantArg {
    Auto,
    Unbound,
    Hosts,
}

/// Which stages to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    All,
    FetchOnly,
    UnifiOnly,
}

impl Cli {
    /// `--all` wins over the single-stage flags.
    pub fn mode(&self) -> Option<Mode> {
        if self.all || (self.fetch_only && self.unifi_only) {
            Some(Mode::All)
        } else if self.fetch_only {
            Some(Mode::FetchOnly)
        } else if self.unifi_only {
            Some(Mode::UnifiOnly)
        } else {
            None
        }
    }
}
