use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::model::DhcpReservation;

/// JSON key that carries the resolved network identifier in a payload.
///
/// The controller's fixed-IP client record expects `network_id`; early
/// migration scripts sent it as `site_id`. `SiteId` keeps that wire shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkField {
    #[default]
    SiteId,
    NetworkId,
}

impl NetworkField {
    pub fn key(self) -> &'static str {
        match self {
            Self::SiteId => "site_id",
            Self::NetworkId => "network_id",
        }
    }
}

/// Body of a `rest/user` create call pinning a MAC to a fixed address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationPayload {
    pub mac: String,
    pub fixed_ip: String,
    pub name: String,
    pub network_id: String,
    pub network_field: NetworkField,
    pub use_fixedip: bool,
}

/// Translate one static mapping into a reservation payload.
pub fn reservation_payload(
    record: &DhcpReservation,
    network_id: &str,
    network_field: NetworkField,
) -> ReservationPayload {
    ReservationPayload {
        mac: record.mac.clone(),
        fixed_ip: record.ip.clone(),
        name: record.hostname.clone(),
        network_id: network_id.to_string(),
        network_field,
        use_fixedip: true,
    }
}

impl Serialize for ReservationPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("mac", &self.mac)?;
        map.serialize_entry("fixed_ip", &self.fixed_ip)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry(self.network_field.key(), &self.network_id)?;
        map.serialize_entry("use_fixedip", &self.use_fixedip)?;
        map.end()
    }
}
