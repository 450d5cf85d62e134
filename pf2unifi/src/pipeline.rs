//! Migration stages and their orchestration.
//!
//! ## Stages
//!
//! 1. **Fetch**: copy `config.xml` off the firewall ([`fetch_source`])
//! 2. **Extract**: pull static mappings and host overrides ([`crate::extract`])
//! 3. **Prepare**: log in and resolve site and LAN network ([`prepare_controller`])
//! 4. **Reservations**: create one fixed-IP client per mapping ([`migrate_reservations`])
//! 5. **Gateway document**: fold host overrides into `config.gateway.json`
//! 6. **Publish**: optionally push the document and restart ([`publish_gateway`])
//!
//! Stage 3 failures abort the run before any reservation is created.
//! Per-record failures in stages 2 and 4 are collected and counted; the run
//! carries on and still writes the gateway document.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::controller::ControllerApi;
use crate::error::{MigrateError, Result};
use crate::extract::Extraction;
use crate::model::DhcpReservation;
use crate::remote::RemoteTransport;
use crate::translate::{fold_hosts, reservation_payload, DuplicatePolicy, NetworkField};

/// Placeholder network id shown in dry-run payloads.
pub const DRY_RUN_NETWORK_ID: &str = "<unresolved>";

/// Settings for the controller and output stages.
#[derive(Debug, Clone)]
pub struct MigrateSettings {
    pub lan_name: String,
    pub network_field: NetworkField,
    pub duplicate_hostnames: DuplicatePolicy,
    pub output_path: PathBuf,
}

/// A reservation the controller did not accept.
#[derive(Debug)]
pub struct FailedReservation {
    pub record: DhcpReservation,
    pub error: MigrateError,
}

/// Result of submitting reservations.
#[derive(Debug, Default)]
pub struct ReservationOutcome {
    pub created: usize,
    pub failed: Vec<FailedReservation>,
}

/// Totals for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub reservations_found: usize,
    pub hosts_found: usize,
    /// Matched nodes that could not be read.
    pub records_skipped: usize,
    pub reservations_created: usize,
    pub reservations_failed: usize,
    pub gateway_hosts: usize,
    pub gateway_path: Option<PathBuf>,
    pub uploaded: bool,
    pub dry_run: bool,
}

impl RunReport {
    /// Records that did not make it to the target, for the exit status.
    pub fn failure_count(&self) -> usize {
        self.records_skipped + self.reservations_failed
    }
}

/// Copy the source export from the firewall.
pub fn fetch_source(
    transport: &dyn RemoteTransport,
    remote_path: &str,
    local_path: &Path,
) -> Result<()> {
    info!(host = transport.host(), remote_path, "fetching source config");
    transport.fetch(remote_path, local_path)
}

/// Log in and resolve the identifiers reservations are scoped to.
///
/// Returns the LAN network id. Any error here is fatal for the run.
pub fn prepare_controller(api: &mut dyn ControllerApi, lan_name: &str) -> Result<String> {
    api.login()?;
    api.resolve_site_name()?;
    api.resolve_network_id(lan_name)
}

/// Submit one reservation per record, continuing past rejections.
pub fn migrate_reservations(
    api: &dyn ControllerApi,
    network_id: &str,
    network_field: NetworkField,
    records: &[DhcpReservation],
) -> ReservationOutcome {
    let mut outcome = ReservationOutcome::default();
    for record in records {
        let payload = reservation_payload(record, network_id, network_field);
        match api.create_reservation(&payload) {
            Ok(()) => {
                info!("added {record}");
                outcome.created += 1;
            }
            Err(err) => {
                error!(error = %err, "failed to add {} -> {}", record.mac, record.ip);
                outcome.failed.push(FailedReservation {
                    record: record.clone(),
                    error: err,
                });
            }
        }
    }
    outcome
}

/// Run the controller and gateway-document stages over extracted records.
///
/// With no controller the run is a dry run: payloads are logged with a
/// placeholder network id and nothing is submitted.
pub fn migrate(
    extraction: &Extraction,
    controller: Option<&mut dyn ControllerApi>,
    settings: &MigrateSettings,
) -> Result<RunReport> {
    let mut report = RunReport {
        reservations_found: extraction.reservations.len(),
        hosts_found: extraction.hosts.len(),
        records_skipped: extraction.problems.len(),
        dry_run: controller.is_none(),
        ..RunReport::default()
    };

    if let Some(api) = controller {
        let network_id = prepare_controller(api, &settings.lan_name)?;
        let outcome = migrate_reservations(
            api,
            &network_id,
            settings.network_field,
            &extraction.reservations,
        );
        report.reservations_created = outcome.created;
        report.reservations_failed = outcome.failed.len();
    } else {
        for record in &extraction.reservations {
            let payload =
                reservation_payload(record, DRY_RUN_NETWORK_ID, settings.network_field);
            info!(payload = %serde_json::to_string(&payload)?, "dry run, not submitting");
        }
    }

    let gateway = fold_hosts(&extraction.hosts, settings.duplicate_hostnames);
    gateway.write_file(&settings.output_path)?;
    report.gateway_hosts = gateway.len();
    report.gateway_path = Some(settings.output_path.clone());

    Ok(report)
}

/// Push the gateway document and run the restart command.
pub fn publish_gateway(
    transport: &dyn RemoteTransport,
    local_path: &Path,
    remote_path: &str,
    restart_command: &str,
) -> Result<()> {
    transport.upload(local_path, remote_path)?;
    let output = transport.exec(restart_command)?;
    if !output.trim().is_empty() {
        info!(output = %output.trim(), "restart command output");
    }
    info!(host = transport.host(), "restarted controller service");
    Ok(())
}
