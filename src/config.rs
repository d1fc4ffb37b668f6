//! Build-time configuration.
//!
//! Buffer and field capacities are compile-time constants because they size
//! the fixed `heapless` storage inside [`RequestContext`]. Ports, timeouts and
//! the TLS policy live in [`Config`], whose [`Default`] matches the values a
//! firmware build would bake in.
//!
//! Every capacity reserves one byte for a terminator, so a field fits when
//! its length is strictly below the capacity.
//!
//! [`RequestContext`]: crate::network::application::requests::RequestContext

/// Capacity of the URL schema field (`"https"` plus room to spare).
pub const SCHEMA_CAPACITY: usize = 8;

/// Capacity of the hostname field.
pub const HOSTNAME_CAPACITY: usize = 64;

/// Capacity of the path (URI) field.
pub const PATH_CAPACITY: usize = 256;

/// Capacity of the textual port in a URL (`"65535"`).
pub const PORT_CAPACITY: usize = 6;

/// Capacity of the protocol version string (e.g. `"HTTP/1.1"`).
pub const PROTOCOL_CAPACITY: usize = 16;

/// Capacity of the `user:password` credentials string.
pub const CREDENTIALS_CAPACITY: usize = 128;

/// One network MTU unit. Sizes both the receive and the payload buffer.
pub const NET_MTU: usize = 576;

/// Receive buffer capacity.
pub const RECV_BUFFER_CAPACITY: usize = NET_MTU;

/// Payload buffer capacity. At most `PAYLOAD_CAPACITY - 1` bytes are stored.
pub const PAYLOAD_CAPACITY: usize = NET_MTU;

/// Security tag identifying a provisioned TLS credential.
pub type SecTag = u32;

/// Runtime view of the build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Port used for `http://` URLs without an explicit port.
    pub http_port: u16,
    /// Port used for `https://` URLs without an explicit port.
    pub https_port: u16,
    /// How long `Init` waits for the link to report an assigned address.
    pub link_timeout_ms: u32,
    /// How long `Init` waits for the DNS completion signal.
    pub dns_timeout_ms: u32,
    /// Connect timeout handed to the host socket layer.
    pub connect_timeout_ms: u32,
    /// Timeout for the protocol exchange.
    pub request_timeout_ms: u32,
    /// Default for the verify-host flag.
    pub verify_host: bool,
    /// Default for the verify-peer flag.
    pub verify_peer: bool,
    /// Tag of the pre-provisioned CA certificate.
    pub ca_sec_tag: SecTag,
    /// Sleep between polls while waiting on a readiness or DNS signal.
    pub poll_interval_ms: u32,
}

impl Config {
    /// The configuration a default firmware build uses.
    pub const DEFAULT: Config = Config {
        http_port: 80,
        https_port: 443,
        link_timeout_ms: 3_000,
        dns_timeout_ms: 2_000,
        connect_timeout_ms: 3_000,
        request_timeout_ms: 5_000,
        verify_host: true,
        verify_peer: true,
        ca_sec_tag: 1,
        poll_interval_ms: 10,
    };

    /// Default port for a schema, `None` if the schema is not supported.
    pub fn default_port(&self, schema: &str) -> Option<u16> {
        match schema {
            "http" => Some(self.http_port),
            "https" => Some(self.https_port),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}
