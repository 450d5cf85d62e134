//! Pure translations from extracted records to controller/gateway shapes.

pub mod gateway;
pub mod reservation;

pub use gateway::{fold_hosts, DuplicatePolicy, GatewayConfig, HostMapping};
pub use reservation::{reservation_payload, NetworkField, ReservationPayload};
