//! Link-readiness broker.
//!
//! The network link is a single shared resource, so its readiness is tracked
//! by one broker per process. Host stacks publish [`LinkEvent`]s to it from
//! their link-management callback; request contexts subscribe and wait until
//! the link reports an assigned address.
//!
//! Readiness is latched rather than handed out as single tokens: any number
//! of subscribers may wait at the same time and all of them observe the same
//! `Connected` event.
//!
//! ```rust
//! use embedded_requests::network::link::{LinkBroker, LinkEvent};
//!
//! static BROKER: LinkBroker = LinkBroker::new();
//!
//! let subscription = BROKER.subscribe();
//! assert_eq!(BROKER.subscribers(), 1);
//! assert!(!subscription.is_ready());
//!
//! BROKER.notify(LinkEvent::Connected);
//! assert!(subscription.is_ready());
//!
//! drop(subscription);
//! assert_eq!(BROKER.subscribers(), 0);
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use crate::network::{Clock, poll_until};

/// Layer-4 link state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// The interface is up and has an address.
    Connected,
    /// The interface lost its address or went down.
    Disconnected,
}

/// Shared readiness state of the network link.
#[derive(Debug)]
pub struct LinkBroker {
    connected: AtomicBool,
    subscribers: AtomicUsize,
    events: AtomicU32,
}

static GLOBAL: LinkBroker = LinkBroker::new();

impl LinkBroker {
    /// A broker whose link is down and which has no subscribers.
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            subscribers: AtomicUsize::new(0),
            events: AtomicU32::new(0),
        }
    }

    /// The process-wide broker.
    pub fn global() -> &'static LinkBroker {
        &GLOBAL
    }

    /// Publish a link event. Safe to call from any thread or callback.
    pub fn notify(&self, event: LinkEvent) {
        match event {
            LinkEvent::Connected => {
                debug!("Network connection established (IPv4)");
                self.connected.store(true, Ordering::Release);
            }
            LinkEvent::Disconnected => {
                debug!("Network connection lost");
                self.connected.store(false, Ordering::Release);
            }
        }
        self.events.fetch_add(1, Ordering::AcqRel);
    }

    /// Whether the last published event was [`LinkEvent::Connected`].
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Number of events published so far.
    pub fn events(&self) -> u32 {
        self.events.load(Ordering::Acquire)
    }

    /// Number of live subscriptions.
    pub fn subscribers(&self) -> usize {
        self.subscribers.load(Ordering::Acquire)
    }

    /// Register interest in link readiness.
    pub fn subscribe(&self) -> Subscription<'_> {
        self.subscribers.fetch_add(1, Ordering::AcqRel);
        Subscription { broker: self }
    }
}

impl Default for LinkBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// A live interest in link readiness; unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription<'a> {
    broker: &'a LinkBroker,
}

impl Subscription<'_> {
    /// Whether the link is currently ready.
    pub fn is_ready(&self) -> bool {
        self.broker.is_connected()
    }

    /// Block until the link is ready or `timeout_ms` elapses.
    ///
    /// Returns `true` if the link became (or already was) ready.
    pub fn wait<C: Clock + ?Sized>(
        &self,
        clock: &mut C,
        timeout_ms: u32,
        poll_interval_ms: u32,
    ) -> bool {
        poll_until(clock, timeout_ms, poll_interval_ms, |_| {
            self.is_ready().then_some(())
        })
        .is_some()
    }
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        self.broker.subscribers.fetch_sub(1, Ordering::AcqRel);
    }
}
