//! DNS query types.
//!
//! The resolver never shares a mutable error field with the host's completion
//! callback. Instead every query gets a [`QueryId`] and the host hands back
//! exactly one [`DnsOutcome`] for it, which carries either the address or
//! the reason resolution failed.

use core::net::IpAddr;

/// Correlates a submitted query with its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueryId(pub u16);

/// Final status of one DNS query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsOutcome {
    /// The query completed with an address.
    Resolved(IpAddr),
    /// The name exists but has no record of the requested type.
    NoData,
    /// The resolver gave up (server failure, malformed reply, ...).
    Failed,
    /// The query was cancelled before completing.
    Canceled,
}

impl DnsOutcome {
    /// Whether the outcome carries an address.
    pub fn is_resolved(&self) -> bool {
        matches!(self, DnsOutcome::Resolved(_))
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DnsOutcome {
    fn format(&self, f: defmt::Formatter) {
        match self {
            DnsOutcome::Resolved(IpAddr::V4(addr)) => {
                let [a, b, c, d] = addr.octets();
                defmt::write!(f, "Resolved({}.{}.{}.{})", a, b, c, d)
            }
            DnsOutcome::Resolved(IpAddr::V6(_)) => defmt::write!(f, "Resolved(v6)"),
            DnsOutcome::NoData => defmt::write!(f, "NoData"),
            DnsOutcome::Failed => defmt::write!(f, "Failed"),
            DnsOutcome::Canceled => defmt::write!(f, "Canceled"),
        }
    }
}
