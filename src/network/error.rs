//! Common error types for network operations

/// A common error type for transport and protocol-engine operations.
///
/// This enum defines the errors a connection or the HTTP protocol engine can
/// report. It is designed to be simple and portable for `no_std`
/// environments, and maps onto the negative errno-style code domain through
/// [`Error::code`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An operation was attempted on a connection that is not open.
    NotOpen,
    /// An error occurred during a write operation.
    WriteError,
    /// An error occurred during a read operation.
    ReadError,
    /// A connection attempt was refused.
    ConnectionRefused,
    /// A timeout occurred.
    Timeout,
    /// The connection was closed before the exchange completed.
    ConnectionClosed,
    /// An invalid address was provided.
    InvalidAddress,
    /// The peer sent something the protocol engine could not parse.
    ProtocolError,
    /// Data did not fit a fixed-capacity buffer.
    BufferOverflow,
}

impl Error {
    /// Negative errno-style code for this error.
    pub const fn code(&self) -> i32 {
        match self {
            Error::NotOpen => -9,              // EBADF
            Error::WriteError => -5,           // EIO
            Error::ReadError => -5,            // EIO
            Error::ConnectionRefused => -111,  // ECONNREFUSED
            Error::Timeout => -110,            // ETIMEDOUT
            Error::ConnectionClosed => -104,   // ECONNRESET
            Error::InvalidAddress => -99,      // EADDRNOTAVAIL
            Error::ProtocolError => -71,       // EPROTO
            Error::BufferOverflow => -105,     // ENOBUFS
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            Error::NotOpen => "connection not open",
            Error::WriteError => "write failed",
            Error::ReadError => "read failed",
            Error::ConnectionRefused => "connection refused",
            Error::Timeout => "timed out",
            Error::ConnectionClosed => "connection closed by peer",
            Error::InvalidAddress => "invalid address",
            Error::ProtocolError => "protocol error",
            Error::BufferOverflow => "buffer overflow",
        };
        write!(f, "{} ({})", text, self.code())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NotOpen => defmt::write!(f, "NotOpen"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::ConnectionRefused => defmt::write!(f, "ConnectionRefused"),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::ConnectionClosed => defmt::write!(f, "ConnectionClosed"),
            Error::InvalidAddress => defmt::write!(f, "InvalidAddress"),
            Error::ProtocolError => defmt::write!(f, "ProtocolError"),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
        }
    }
}
