//! Error type of the request pipeline.

use crate::network::OsError;
use crate::network::error::Error as TransportError;

/// Every way `init` or `execute` can fail.
///
/// All variants map onto one signed integer domain through [`Error::code`]:
/// success is `0` and failures are negative errno-style values, so callers
/// that only log or branch on a number never need to inspect the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The context is not in a state that allows the call.
    InvalidArgument,
    /// The URL could not be tokenised, or uses an unsupported schema.
    MalformedUrl,
    /// A URL component does not fit its fixed-capacity field.
    FieldTooLong,
    /// The link did not report an assigned address in time.
    NetworkNotReady,
    /// The hostname is empty.
    InvalidHostname,
    /// The resolver reported no data, a failure or a cancellation.
    DnsResolutionFailed,
    /// The resolver did not signal completion in time.
    DnsTimeout,
    /// The hostname resolved to something other than an IPv4 address.
    UnsupportedAddressFamily,
    /// The host stack could not create a socket.
    SocketCreateFailed(OsError),
    /// A TLS session option was rejected.
    TlsConfigFailed(OsError),
    /// The connection to the remote could not be established.
    ConnectionAborted,
    /// The protocol exchange failed.
    Protocol(TransportError),
}

impl Error {
    /// Negative errno-style code.
    pub const fn code(&self) -> i32 {
        match self {
            Error::InvalidArgument => -22,          // EINVAL
            Error::MalformedUrl => -74,             // EBADMSG
            Error::FieldTooLong => -36,             // ENAMETOOLONG
            Error::NetworkNotReady => -100,         // ENETDOWN
            Error::InvalidHostname => -89,          // EDESTADDRREQ
            Error::DnsResolutionFailed => -113,     // EHOSTUNREACH
            Error::DnsTimeout => -62,               // ETIME
            Error::UnsupportedAddressFamily => -97, // EAFNOSUPPORT
            Error::SocketCreateFailed(os) => os.code(),
            Error::TlsConfigFailed(_) => -92,       // ENOPROTOOPT
            Error::ConnectionAborted => -103,       // ECONNABORTED
            Error::Protocol(err) => err.code(),
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Protocol(err)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidArgument => write!(f, "invalid argument"),
            Error::MalformedUrl => write!(f, "malformed URL"),
            Error::FieldTooLong => write!(f, "URL field too long"),
            Error::NetworkNotReady => write!(f, "network not ready"),
            Error::InvalidHostname => write!(f, "invalid hostname"),
            Error::DnsResolutionFailed => write!(f, "DNS resolution failed"),
            Error::DnsTimeout => write!(f, "DNS timed out"),
            Error::UnsupportedAddressFamily => write!(f, "unsupported address family"),
            Error::SocketCreateFailed(os) => write!(f, "socket creation failed ({})", os.code()),
            Error::TlsConfigFailed(os) => write!(f, "TLS configuration failed ({})", os.code()),
            Error::ConnectionAborted => write!(f, "connection aborted"),
            Error::Protocol(err) => write!(f, "protocol exchange failed: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::InvalidArgument => defmt::write!(f, "InvalidArgument"),
            Error::MalformedUrl => defmt::write!(f, "MalformedUrl"),
            Error::FieldTooLong => defmt::write!(f, "FieldTooLong"),
            Error::NetworkNotReady => defmt::write!(f, "NetworkNotReady"),
            Error::InvalidHostname => defmt::write!(f, "InvalidHostname"),
            Error::DnsResolutionFailed => defmt::write!(f, "DnsResolutionFailed"),
            Error::DnsTimeout => defmt::write!(f, "DnsTimeout"),
            Error::UnsupportedAddressFamily => defmt::write!(f, "UnsupportedAddressFamily"),
            Error::SocketCreateFailed(os) => defmt::write!(f, "SocketCreateFailed({})", os.0),
            Error::TlsConfigFailed(os) => defmt::write!(f, "TlsConfigFailed({})", os.0),
            Error::ConnectionAborted => defmt::write!(f, "ConnectionAborted"),
            Error::Protocol(err) => defmt::write!(f, "Protocol({})", err),
        }
    }
}
