//! In-memory host stack for integration tests.
//!
//! Time only advances when the code under test sleeps, the link comes up at
//! a scripted instant, DNS answers after a scripted delay and every socket
//! records what was done to it.

#![allow(dead_code)]

use std::cell::RefCell;
use std::net::{IpAddr, Ipv4Addr, SocketAddrV4};
use std::rc::Rc;

use embedded_requests::network::dns::{DnsOutcome, QueryId};
use embedded_requests::network::error::Error;
use embedded_requests::network::link::{LinkBroker, LinkEvent};
use embedded_requests::network::{
    Clock, Close, Connection, Dns, LinkMonitor, OsError, PeerVerify, Read, Socket, SocketFactory,
    TlsOption, Transport, Write,
};

/// Something the stack observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    LinkStatusRequested { at: u64 },
    LinkUp { at: u64 },
    DnsStarted { at: u64, hostname: String },
    DnsCanceled { at: u64 },
    SocketOpened { transport: Transport },
    SocketClosed,
}

/// Owned copy of a [`TlsOption`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedTlsOption {
    Hostname(String),
    SecTagList(Vec<u32>),
    PeerVerify(PeerVerify),
}

/// What happened to one socket.
#[derive(Debug, Clone, Default)]
pub struct SocketRecord {
    pub transport: Option<Transport>,
    pub tls_options: Vec<RecordedTlsOption>,
    pub connected_to: Option<SocketAddrV4>,
    pub connect_timeout_ms: Option<u32>,
    pub request_timeout_ms: Option<u32>,
    pub written: Vec<u8>,
    pub closed: bool,
}

impl SocketRecord {
    pub fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }
}

pub struct MockStack {
    pub now: u64,
    pub broker: &'static LinkBroker,
    /// The link comes up once the clock reaches this instant.
    pub link_up_at: Option<u64>,
    /// DNS answers `dns_delay_ms` after the query started.
    pub dns_outcome: Option<DnsOutcome>,
    pub dns_delay_ms: u64,
    pub dns_start_error: Option<OsError>,
    pub tls_capable: bool,
    pub open_error: Option<OsError>,
    pub tls_option_error: Option<OsError>,
    pub connect_error: Option<OsError>,
    /// Bytes every socket serves, in reads of at most `read_chunk` bytes.
    pub response: Vec<u8>,
    pub read_chunk: usize,
    /// Reads time out instead of reporting a close once the response is served.
    pub keep_alive: bool,
    pub events: Rc<RefCell<Vec<Event>>>,
    pub sockets: Rc<RefCell<Vec<SocketRecord>>>,
    next_query: u16,
    queries: Vec<(QueryId, u64)>,
}

impl MockStack {
    /// A stack whose link is up and whose DNS answers `93.184.216.34` at once.
    pub fn new() -> Self {
        Self {
            now: 0,
            broker: Box::leak(Box::new(LinkBroker::new())),
            link_up_at: Some(0),
            dns_outcome: Some(DnsOutcome::Resolved(IpAddr::V4(Ipv4Addr::new(
                93, 184, 216, 34,
            )))),
            dns_delay_ms: 0,
            dns_start_error: None,
            tls_capable: true,
            open_error: None,
            tls_option_error: None,
            connect_error: None,
            response: b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n".to_vec(),
            read_chunk: usize::MAX,
            keep_alive: false,
            events: Rc::new(RefCell::new(Vec::new())),
            sockets: Rc::new(RefCell::new(Vec::new())),
            next_query: 1,
            queries: Vec::new(),
        }
    }

    pub fn with_response(mut self, response: &[u8]) -> Self {
        self.response = response.to_vec();
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn sockets(&self) -> Vec<SocketRecord> {
        self.sockets.borrow().clone()
    }

    pub fn dns_queries(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::DnsStarted { .. }))
            .count()
    }

    fn update_link(&mut self) {
        if let Some(at) = self.link_up_at {
            if self.now >= at && !self.broker.is_connected() {
                self.broker.notify(LinkEvent::Connected);
                self.events.borrow_mut().push(Event::LinkUp { at: self.now });
            }
        }
    }
}

impl Clock for MockStack {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.now += u64::from(ms);
        self.update_link();
    }
}

impl LinkMonitor for MockStack {
    fn link_broker(&self) -> &'static LinkBroker {
        self.broker
    }

    fn request_link_status(&mut self) {
        self.events
            .borrow_mut()
            .push(Event::LinkStatusRequested { at: self.now });
        self.update_link();
    }
}

impl Dns for MockStack {
    fn start_query(&mut self, hostname: &str, _timeout_ms: u32) -> Result<QueryId, OsError> {
        self.events.borrow_mut().push(Event::DnsStarted {
            at: self.now,
            hostname: hostname.to_string(),
        });
        if let Some(err) = self.dns_start_error {
            return Err(err);
        }
        let id = QueryId(self.next_query);
        self.next_query += 1;
        self.queries.push((id, self.now + self.dns_delay_ms));
        Ok(id)
    }

    fn poll_query(&mut self, id: QueryId) -> Option<DnsOutcome> {
        let index = self.queries.iter().position(|(q, _)| *q == id)?;
        let (_, ready_at) = self.queries[index];
        if self.now < ready_at {
            return None;
        }
        let outcome = self.dns_outcome?;
        self.queries.remove(index);
        Some(outcome)
    }

    fn cancel_query(&mut self, id: QueryId) {
        self.queries.retain(|(q, _)| *q != id);
        self.events
            .borrow_mut()
            .push(Event::DnsCanceled { at: self.now });
    }
}

impl SocketFactory for MockStack {
    type Socket = MockSocket;

    fn tls_capable(&self) -> bool {
        self.tls_capable
    }

    fn open(&mut self, transport: Transport) -> Result<MockSocket, OsError> {
        if let Some(err) = self.open_error {
            return Err(err);
        }
        self.events
            .borrow_mut()
            .push(Event::SocketOpened { transport });
        let mut sockets = self.sockets.borrow_mut();
        sockets.push(SocketRecord {
            transport: Some(transport),
            ..SocketRecord::default()
        });
        Ok(MockSocket {
            index: sockets.len() - 1,
            sockets: Rc::clone(&self.sockets),
            events: Rc::clone(&self.events),
            response: self.response.clone(),
            read_pos: 0,
            read_chunk: self.read_chunk,
            keep_alive: self.keep_alive,
            tls_option_error: self.tls_option_error,
            connect_error: self.connect_error,
        })
    }
}

pub struct MockSocket {
    index: usize,
    sockets: Rc<RefCell<Vec<SocketRecord>>>,
    events: Rc<RefCell<Vec<Event>>>,
    response: Vec<u8>,
    read_pos: usize,
    read_chunk: usize,
    keep_alive: bool,
    tls_option_error: Option<OsError>,
    connect_error: Option<OsError>,
}

impl MockSocket {
    fn with_record<T>(&self, f: impl FnOnce(&mut SocketRecord) -> T) -> T {
        f(&mut self.sockets.borrow_mut()[self.index])
    }

    fn check_open(&self) -> Result<(), Error> {
        if self.with_record(|r| r.connected_to.is_some() && !r.closed) {
            Ok(())
        } else {
            Err(Error::NotOpen)
        }
    }
}

impl Read for MockSocket {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.check_open()?;
        let remaining = &self.response[self.read_pos..];
        if remaining.is_empty() && self.keep_alive {
            return Err(Error::Timeout);
        }
        let len = remaining.len().min(buf.len()).min(self.read_chunk);
        buf[..len].copy_from_slice(&remaining[..len]);
        self.read_pos += len;
        Ok(len)
    }
}

impl Write for MockSocket {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.check_open()?;
        self.with_record(|r| r.written.extend_from_slice(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.check_open()
    }
}

impl Close for MockSocket {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        let already_closed = self.with_record(|r| std::mem::replace(&mut r.closed, true));
        self.events.borrow_mut().push(Event::SocketClosed);
        if already_closed {
            Err(Error::NotOpen)
        } else {
            Ok(())
        }
    }
}

impl Connection for MockSocket {}

impl Socket for MockSocket {
    fn set_tls_option(&mut self, option: TlsOption<'_>) -> Result<(), OsError> {
        if let Some(err) = self.tls_option_error {
            return Err(err);
        }
        let recorded = match option {
            TlsOption::Hostname(host) => RecordedTlsOption::Hostname(host.to_string()),
            TlsOption::SecTagList(tags) => RecordedTlsOption::SecTagList(tags.to_vec()),
            TlsOption::PeerVerify(verify) => RecordedTlsOption::PeerVerify(verify),
        };
        self.with_record(|r| r.tls_options.push(recorded));
        Ok(())
    }

    fn connect(&mut self, remote: SocketAddrV4, timeout_ms: u32) -> Result<(), OsError> {
        self.with_record(|r| r.connect_timeout_ms = Some(timeout_ms));
        if let Some(err) = self.connect_error {
            return Err(err);
        }
        self.with_record(|r| r.connected_to = Some(remote));
        Ok(())
    }

    fn set_timeout(&mut self, timeout_ms: u32) -> Result<(), OsError> {
        self.with_record(|r| r.request_timeout_ms = Some(timeout_ms));
        Ok(())
    }
}
