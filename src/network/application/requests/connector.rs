//! Socket setup: transport choice, TLS session options and connect.

use core::net::{Ipv4Addr, SocketAddrV4};

use super::error::Error;
use super::url::UrlFields;
use crate::config::SecTag;
use crate::network::{Close, PeerVerify, Socket, SocketFactory, TlsOption, Transport};

/// TLS verification settings of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TlsPolicy {
    /// Bind the hostname into the session for server-name verification.
    pub verify_host: bool,
    /// Verify the peer against `ca_sec_tag`; disables verification otherwise.
    pub verify_peer: bool,
    /// Trust anchor used when `verify_peer` is set.
    pub ca_sec_tag: SecTag,
}

/// Open a socket and connect it to `address` on the URL's port.
///
/// The socket is closed again on every failure path, so an `Err` never
/// leaves an open handle behind.
pub fn connect<F>(
    factory: &mut F,
    url: &UrlFields,
    address: Ipv4Addr,
    tls: &TlsPolicy,
    connect_timeout_ms: u32,
) -> Result<F::Socket, Error>
where
    F: SocketFactory + ?Sized,
{
    let transport = match (url.is_secure(), factory.tls_capable()) {
        (true, true) => Transport::Tls,
        (true, false) => {
            warn!("Stack is not TLS capable, connecting in plain TCP");
            Transport::Tcp
        }
        (false, _) => Transport::Tcp,
    };

    let mut socket = factory.open(transport).map_err(|os| {
        error!("Failed to create socket ({})", os.code());
        Error::SocketCreateFailed(os)
    })?;

    if transport == Transport::Tls {
        if let Err(err) = configure_tls(&mut socket, url.hostname(), tls) {
            release(socket);
            return Err(err);
        }
    }

    let remote = SocketAddrV4::new(address, url.port());
    if let Err(os) = socket.connect(remote, connect_timeout_ms) {
        error!("Cannot connect to remote ({})", os.code());
        release(socket);
        return Err(Error::ConnectionAborted);
    }

    debug!("Connected to {} port {}", url.hostname(), url.port());
    Ok(socket)
}

fn configure_tls<S: Socket>(socket: &mut S, hostname: &str, tls: &TlsPolicy) -> Result<(), Error> {
    if tls.verify_host {
        socket
            .set_tls_option(TlsOption::Hostname(hostname))
            .map_err(|os| {
                error!("Failed to set TLS_HOSTNAME {} option ({})", hostname, os.code());
                Error::TlsConfigFailed(os)
            })?;
    }

    if tls.verify_peer {
        let sec_tag_list = [tls.ca_sec_tag];
        socket
            .set_tls_option(TlsOption::SecTagList(&sec_tag_list))
            .map_err(|os| {
                error!("Failed to set TLS_SEC_TAG_LIST option ({})", os.code());
                Error::TlsConfigFailed(os)
            })?;
    } else {
        socket
            .set_tls_option(TlsOption::PeerVerify(PeerVerify::None))
            .map_err(|os| {
                error!("Failed to set TLS_PEER_VERIFY option ({})", os.code());
                Error::TlsConfigFailed(os)
            })?;
    }

    Ok(())
}

/// Close a socket that is being abandoned.
pub(crate) fn release<S: Close>(socket: S) {
    if socket.close().is_err() {
        warn!("Failed to close socket");
    }
}
