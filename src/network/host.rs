//! Host stack over `std::net`, for desktop and Linux targets.
//!
//! The link is reported up as soon as anyone asks, DNS goes through the
//! system resolver and sockets are plain [`TcpStream`]s. TLS is not
//! available: `https` URLs are sent in plain TCP.
//!
//! Each lookup runs on its own thread so the caller's DNS timeout holds even
//! when the system resolver stalls.

use std::collections::HashMap;
use std::io::{self, Read as _, Write as _};
use std::net::{IpAddr, Shutdown, SocketAddr, SocketAddrV4, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use super::dns::{DnsOutcome, QueryId};
use super::link::LinkEvent;
use super::{
    Clock, Close, Connection, Dns, LinkMonitor, OsError, Read, Socket, SocketFactory, TlsOption,
    Transport, Write,
};

const ENOTCONN: i32 = -107;
const ENOPROTOOPT: i32 = -92;
const EPROTONOSUPPORT: i32 = -93;
const EIO: i32 = -5;
const EAGAIN: i32 = -11;

/// Blocking host-name lookup run on a worker thread.
pub type Lookup = fn(&str) -> DnsOutcome;

/// `std` implementation of [`Stack`](super::Stack).
#[derive(Debug)]
pub struct StdStack {
    origin: Instant,
    next_query: u16,
    queries: HashMap<u16, Receiver<DnsOutcome>>,
    lookup: Lookup,
}

impl Default for StdStack {
    fn default() -> Self {
        Self::new()
    }
}

impl StdStack {
    pub fn new() -> Self {
        Self::with_lookup(lookup)
    }

    /// Stack resolving host names with `lookup` instead of the system resolver.
    pub fn with_lookup(lookup: Lookup) -> Self {
        Self {
            origin: Instant::now(),
            next_query: 0,
            queries: HashMap::new(),
            lookup,
        }
    }
}

impl Clock for StdStack {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

impl LinkMonitor for StdStack {
    fn request_link_status(&mut self) {
        self.link_broker().notify(LinkEvent::Connected);
    }
}

impl Dns for StdStack {
    fn start_query(&mut self, hostname: &str, _timeout_ms: u32) -> Result<QueryId, OsError> {
        let (tx, rx) = mpsc::channel();
        let hostname = hostname.to_owned();
        let lookup = self.lookup;
        thread::Builder::new()
            .name("dns".into())
            .spawn(move || {
                // The receiver is gone once the query was canceled.
                let _ = tx.send(lookup(&hostname));
            })
            .map_err(|_| {
                error!("Failed to spawn DNS thread");
                OsError(EAGAIN)
            })?;

        let id = QueryId(self.next_query);
        self.next_query = self.next_query.wrapping_add(1);
        self.queries.insert(id.0, rx);
        Ok(id)
    }

    fn poll_query(&mut self, id: QueryId) -> Option<DnsOutcome> {
        let result = self.queries.get(&id.0)?.try_recv();
        match result {
            Ok(outcome) => {
                self.queries.remove(&id.0);
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.queries.remove(&id.0);
                Some(DnsOutcome::Failed)
            }
        }
    }

    fn cancel_query(&mut self, id: QueryId) {
        self.queries.remove(&id.0);
    }
}

/// Blocking lookup, preferring an IPv4 answer.
fn lookup(hostname: &str) -> DnsOutcome {
    match (hostname, 0).to_socket_addrs() {
        Ok(addrs) => {
            let addrs: Vec<IpAddr> = addrs.map(|addr| addr.ip()).collect();
            addrs
                .iter()
                .find(|ip| ip.is_ipv4())
                .or_else(|| addrs.first())
                .map_or(DnsOutcome::NoData, |ip| DnsOutcome::Resolved(*ip))
        }
        Err(_) => DnsOutcome::Failed,
    }
}

impl SocketFactory for StdStack {
    type Socket = StdSocket;

    fn tls_capable(&self) -> bool {
        false
    }

    fn open(&mut self, transport: Transport) -> Result<StdSocket, OsError> {
        match transport {
            Transport::Tcp => Ok(StdSocket::default()),
            Transport::Tls => Err(OsError(EPROTONOSUPPORT)),
        }
    }
}

/// Plain TCP socket, unconnected until [`Socket::connect`].
#[derive(Debug, Default)]
pub struct StdSocket {
    stream: Option<TcpStream>,
}

impl StdSocket {
    fn stream(&mut self) -> io::Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))
    }
}

fn os_error(err: &io::Error) -> OsError {
    match err.raw_os_error() {
        Some(code) => OsError(code),
        None if err.kind() == io::ErrorKind::NotConnected => OsError(ENOTCONN),
        None => OsError(EIO),
    }
}

impl Read for StdSocket {
    type Error = io::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.stream()?.read(buf)
    }
}

impl Write for StdSocket {
    type Error = io::Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream()?.write(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream()?.flush()
    }
}

impl Close for StdSocket {
    type Error = io::Error;

    fn close(self) -> Result<(), Self::Error> {
        match self.stream {
            Some(stream) => match stream.shutdown(Shutdown::Both) {
                Err(err) if err.kind() != io::ErrorKind::NotConnected => Err(err),
                _ => Ok(()),
            },
            None => Ok(()),
        }
    }
}

impl Connection for StdSocket {}

impl Socket for StdSocket {
    fn set_tls_option(&mut self, _option: TlsOption<'_>) -> Result<(), OsError> {
        Err(OsError(ENOPROTOOPT))
    }

    fn connect(&mut self, remote: SocketAddrV4, timeout_ms: u32) -> Result<(), OsError> {
        let timeout = Duration::from_millis(u64::from(timeout_ms.max(1)));
        let stream = TcpStream::connect_timeout(&SocketAddr::V4(remote), timeout)
            .map_err(|err| os_error(&err))?;
        self.stream = Some(stream);
        Ok(())
    }

    fn set_timeout(&mut self, timeout_ms: u32) -> Result<(), OsError> {
        let timeout = Some(Duration::from_millis(u64::from(timeout_ms.max(1))));
        let stream = self.stream().map_err(|err| os_error(&err))?;
        stream
            .set_read_timeout(timeout)
            .and_then(|()| stream.set_write_timeout(timeout))
            .map_err(|err| os_error(&err))
    }
}
