//! A network abstraction layer for embedded systems
//!
//! This module defines the seams between the request pipeline and the host
//! networking stack. The stack itself (link management, DNS, sockets, TLS) is
//! provided by the platform; the crate only consumes it through the traits
//! below, which keeps the pipeline portable and testable with in-memory
//! mocks.
//!

#![allow(missing_docs)]
#![deny(unsafe_code)]

use core::net::SocketAddrV4;

use crate::config::SecTag;
use crate::network::dns::{DnsOutcome, QueryId};
use crate::network::link::LinkBroker;

/// Common error types for network operations
pub mod error;

/// Protocol-specific client implementations
pub mod application;

/// DNS query bookkeeping shared between the resolver and host stacks.
pub mod dns;

/// Process-wide link-readiness broker.
pub mod link;

/// Host stack over `std::net`.
#[cfg(feature = "std")]
pub mod host;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{
        Clock, Close, Connection, Dns, LinkMonitor, Read, Socket, SocketFactory, Stack, Write,
    };
}

// Core synchronous traits
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read data from the connection
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// A synchronous connection
pub trait Connection: Read + Write + Close {}

/// Raw error reported by the host stack.
///
/// Hosts may report either sign; [`OsError::code`] always yields the negative
/// form used throughout the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OsError(pub i32);

impl OsError {
    /// Negative errno-style value.
    pub const fn code(self) -> i32 {
        if self.0 > 0 { -self.0 } else { self.0 }
    }
}

/// Monotonic time source used to bound blocking waits.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin.
    fn now_ms(&self) -> u64;
    /// Block the calling thread for `ms` milliseconds.
    fn sleep_ms(&mut self, ms: u32);
}

/// Link-state notifications.
pub trait LinkMonitor {
    /// The broker this host publishes link events to.
    fn link_broker(&self) -> &'static LinkBroker {
        LinkBroker::global()
    }

    /// Ask the host to re-announce the current link state to the broker.
    ///
    /// Called once per readiness wait, after subscribing, so a link that came
    /// up before anyone was listening is still observed.
    fn request_link_status(&mut self);
}

/// Asynchronous A-record resolution.
///
/// Each query is correlated by the [`QueryId`] returned from
/// [`Dns::start_query`]; a host must never report one query's outcome under
/// another's id.
pub trait Dns {
    /// Submit one A-record query for `hostname`.
    fn start_query(&mut self, hostname: &str, timeout_ms: u32) -> Result<QueryId, OsError>;
    /// Outcome of a query, `None` while it is still pending.
    fn poll_query(&mut self, id: QueryId) -> Option<DnsOutcome>;
    /// Abandon a pending query. Its outcome will never be polled again.
    fn cancel_query(&mut self, id: QueryId);
}

/// Transport requested from [`SocketFactory::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transport {
    /// Plain TCP.
    Tcp,
    /// TLS 1.2 wrapped TCP.
    Tls,
}

/// Peer verification policy of a TLS session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeerVerify {
    /// Do not verify the peer certificate.
    None = 0,
    /// Verify if a certificate is presented.
    Optional = 1,
    /// Fail the handshake unless the peer certificate verifies.
    Required = 2,
}

/// TLS session option applied to a freshly opened socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsOption<'a> {
    /// Server name used for SNI and host-name verification.
    Hostname(&'a str),
    /// Provisioned credentials (trust anchors) to verify the peer against.
    SecTagList(&'a [SecTag]),
    /// Peer verification policy.
    PeerVerify(PeerVerify),
}

/// A socket handed out by the host stack.
pub trait Socket: Connection {
    /// Apply a TLS session option. Only meaningful on [`Transport::Tls`] sockets.
    fn set_tls_option(&mut self, option: TlsOption<'_>) -> Result<(), OsError>;
    /// Connect to `remote`, giving up after `timeout_ms`.
    fn connect(&mut self, remote: SocketAddrV4, timeout_ms: u32) -> Result<(), OsError>;
    /// Bound every subsequent read and write by `timeout_ms`.
    fn set_timeout(&mut self, timeout_ms: u32) -> Result<(), OsError>;
}

/// Socket creation.
pub trait SocketFactory {
    /// Socket type produced by this factory.
    type Socket: Socket;
    /// Whether the stack can open [`Transport::Tls`] sockets.
    fn tls_capable(&self) -> bool;
    /// Open an unconnected socket.
    fn open(&mut self, transport: Transport) -> Result<Self::Socket, OsError>;
}

/// Everything the request pipeline needs from the host.
pub trait Stack: Clock + LinkMonitor + Dns + SocketFactory {}

impl<T: Clock + LinkMonitor + Dns + SocketFactory> Stack for T {}

/// Repeatedly run `check` until it yields a value or `timeout_ms` elapses.
///
/// The check runs once before the deadline is checked, so a value that is
/// already available is returned even with a zero timeout.
pub(crate) fn poll_until<C, T>(
    clock: &mut C,
    timeout_ms: u32,
    poll_interval_ms: u32,
    mut check: impl FnMut(&mut C) -> Option<T>,
) -> Option<T>
where
    C: Clock + ?Sized,
{
    let deadline = clock.now_ms().saturating_add(u64::from(timeout_ms));
    loop {
        if let Some(value) = check(&mut *clock) {
            return Some(value);
        }
        let now = clock.now_ms();
        if now >= deadline {
            return None;
        }
        let remaining = (deadline - now).min(u64::from(u32::MAX)) as u32;
        clock.sleep_ms(poll_interval_ms.max(1).min(remaining));
    }
}
