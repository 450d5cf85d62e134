//! Migrate pfSense DHCP static mappings and DNS host overrides to UniFi.
//!
//! The library is organized by pipeline stage:
//!
//! - [`extract`]: read `<staticmap>` and host-override records from a
//!   `config.xml` tree, choosing between the Unbound and `hosts/host` layouts
//! - [`translate`]: turn records into controller reservation payloads and
//!   the `config.gateway.json` static host mapping document
//! - [`controller`]: [`ControllerApi`](controller::ControllerApi) and the
//!   HTTP session against a UniFi Network controller
//! - [`remote`]: fetch and upload files over `scp`, run commands over `ssh`
//! - [`pipeline`]: stage functions and the run report
//! - [`config`]: TOML run configuration
//!
//! # Example
//!
//! ```ignore
//! use pf2unifi::extract::{extract_file, DnsVariant};
//! use pf2unifi::translate::{fold_hosts, DuplicatePolicy};
//!
//! let extraction = extract_file("config.xml".as_ref(), DnsVariant::Auto)?;
//! let gateway = fold_hosts(&extraction.hosts, DuplicatePolicy::LastWins);
//! gateway.write_file("config.gateway.json".as_ref())?;
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod remote;
pub mod translate;

pub use error::{MigrateError, Result};
pub use model::{DhcpReservation, DnsHostEntry, UNKNOWN_HOSTNAME};
