//! UniFi controller access.
//!
//! [`ControllerApi`] is the seam the pipeline talks to; [`UnifiSession`] is
//! the HTTP implementation. Tests substitute their own implementation.

mod session;
mod types;

pub use session::{UnifiSession, UnifiSessionBuilder, DEFAULT_TIMEOUT};
pub use types::{find_network, ApiEnvelope, NetworkConf, SiteSummary};

use crate::error::Result;
use crate::translate::ReservationPayload;

/// Operations the migration needs from the target controller.
///
/// Calls are made one at a time, in this order: `login`,
/// `resolve_site_name`, `resolve_network_id`, then `create_reservation`
/// once per record.
pub trait ControllerApi {
    /// Verify the credentials. Non-2xx is [`MigrateError::Auth`](crate::MigrateError::Auth).
    fn login(&mut self) -> Result<()>;

    /// Resolve and remember the site used in site-scoped paths.
    fn resolve_site_name(&mut self) -> Result<String>;

    /// Id of the network whose name matches `lan_name`, ignoring case.
    fn resolve_network_id(&self, lan_name: &str) -> Result<String>;

    /// Create one fixed-IP client record.
    fn create_reservation(&self, payload: &ReservationPayload) -> Result<()>;
}
