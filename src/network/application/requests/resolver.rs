//! Readiness-gated hostname resolution.
//!
//! Two bounded waits run strictly in sequence: first the link must report an
//! assigned address, then a single A-record query is submitted and polled
//! until the host reports its outcome. DNS is never attempted over a link
//! that is not up.

use core::net::{IpAddr, Ipv4Addr};

use super::error::Error;
use crate::config::Config;
use crate::network::dns::DnsOutcome;
use crate::network::{Clock, Dns, LinkMonitor, poll_until};

/// Resolve `hostname` to an IPv4 address.
pub fn resolve<S>(stack: &mut S, hostname: &str, config: &Config) -> Result<Ipv4Addr, Error>
where
    S: Clock + LinkMonitor + Dns + ?Sized,
{
    if hostname.is_empty() {
        error!("Invalid hostname");
        return Err(Error::InvalidHostname);
    }

    wait_for_link(stack, config)?;
    query(stack, hostname, config)
}

/// Block until the link reports an assigned address.
pub fn wait_for_link<S>(stack: &mut S, config: &Config) -> Result<(), Error>
where
    S: Clock + LinkMonitor + ?Sized,
{
    let broker = stack.link_broker();
    let subscription = broker.subscribe();
    stack.request_link_status();

    debug!("Waiting for IPv4 address assignment (DHCP/Static)");
    if subscription.wait(stack, config.link_timeout_ms, config.poll_interval_ms) {
        Ok(())
    } else {
        error!(
            "Network not ready after {} ms ({})",
            config.link_timeout_ms,
            Error::NetworkNotReady.code()
        );
        Err(Error::NetworkNotReady)
    }
}

fn query<S>(stack: &mut S, hostname: &str, config: &Config) -> Result<Ipv4Addr, Error>
where
    S: Clock + Dns + ?Sized,
{
    let id = stack
        .start_query(hostname, config.dns_timeout_ms)
        .map_err(|os| {
            error!("Cannot resolve DNS address ({})", os.code());
            Error::DnsResolutionFailed
        })?;

    let outcome = poll_until(
        stack,
        config.dns_timeout_ms,
        config.poll_interval_ms,
        |stack| stack.poll_query(id),
    );

    match outcome {
        Some(DnsOutcome::Resolved(IpAddr::V4(addr))) => {
            let [a, b, c, d] = addr.octets();
            debug!("Host IPv4 address: {}.{}.{}.{}", a, b, c, d);
            Ok(addr)
        }
        Some(DnsOutcome::Resolved(IpAddr::V6(_))) => {
            error!("Invalid IP address family (IPv6)");
            Err(Error::UnsupportedAddressFamily)
        }
        Some(status) => {
            error!("DNS resolve ({:?})", status);
            Err(Error::DnsResolutionFailed)
        }
        None => {
            stack.cancel_query(id);
            error!(
                "DNS timed out after {} ms ({})",
                config.dns_timeout_ms,
                Error::DnsTimeout.code()
            );
            Err(Error::DnsTimeout)
        }
    }
}
