use std::fmt;

/// Hostname recorded for a static mapping that has none.
pub const UNKNOWN_HOSTNAME: &str = "Unknown";

/// A DHCP static mapping read from the source firewall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpReservation {
    pub mac: String,
    pub ip: String,
    pub hostname: String,
    /// `dhcpd` interface section the mapping was found under (`lan`, `opt1`, ...).
    pub interface: Option<String>,
}

/// A DNS host override read from the source firewall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsHostEntry {
    pub hostname: String,
    pub ip: String,
    pub domain: Option<String>,
}

impl fmt::Display for DhcpReservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.mac, self.ip, self.hostname)
    }
}

impl fmt::Display for DnsHostEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.domain {
            Some(domain) => write!(f, "{}.{} -> {}", self.hostname, domain, self.ip),
            None => write!(f, "{} -> {}", self.hostname, self.ip),
        }
    }
}
