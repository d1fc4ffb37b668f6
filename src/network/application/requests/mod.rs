//! curl-like synchronous HTTP/HTTPS requests.
//!
//! A request goes through three calls on one [`RequestContext`]:
//!
//! 1. [`init`](RequestContext::init) parses the URL and resolves the host,
//!    after waiting for the network link to come up.
//! 2. [`set_option`](RequestContext::set_option) configures headers, payload,
//!    TLS verification, credentials and the response callback.
//! 3. [`execute`](RequestContext::execute) connects, runs the HTTP exchange,
//!    streams the response into the callback and closes the socket.
//!
//! Every call blocks until it completes or one of its configured timeouts
//! expires. Failures at any stage surface as a single [`Error`] whose
//! [`code`](Error::code) is a negative errno-style integer.
//!
//! # Lifecycle
//!
//! ```text
//!  new ──init──▶ Ready ──execute──▶ Connecting ──▶ Requesting ──▶ Done
//!   ▲              │                     │              │
//!   │              └── set_option*       └──────────────┴──────▶ Failed
//!   └──────────────── init (full reset) ◀───────────────────────────┘
//! ```
//!
//! A context executes at most once per `init`. Calling `execute` in any
//! state other than `Ready` fails with [`Error::InvalidArgument`] without
//! touching the network, the state or the last error.
//!
//! # Example
//!
//! ```rust
//! use embedded_requests::network::Stack;
//! use embedded_requests::network::application::http::{FinalCall, Method, Response};
//! use embedded_requests::network::application::requests::{
//!     Error, Outcome, RequestContext, RequestOption,
//! };
//!
//! fn post_json<S: Stack>(stack: &mut S) -> Result<u16, Error> {
//!     let mut on_response = |response: &Response<'_>, _: FinalCall, outcome: &mut Outcome| {
//!         outcome.status_code = response.http_status_code;
//!     };
//!
//!     let mut ctx = RequestContext::new();
//!     ctx.init(stack, "http://example.com/api")?;
//!     ctx.set_option(RequestOption::ProtocolVersion("HTTP/1.1"));
//!     ctx.set_option(RequestOption::PayloadBody(b"{\"a\":1}"));
//!     ctx.set_option(RequestOption::ResponseCallback(&mut on_response));
//!     ctx.execute(stack, Method::Post)?;
//!     Ok(ctx.status_code())
//! }
//! ```

/// Socket setup and TLS options.
pub mod connector;
/// Pipeline error type.
pub mod error;
/// Readiness-gated DNS resolution.
pub mod resolver;
/// URL parsing.
pub mod url;

pub use connector::TlsPolicy;
pub use error::Error;
pub use url::UrlFields;

use core::net::Ipv4Addr;

use heapless::String;

use crate::config::{
    CREDENTIALS_CAPACITY, Config, PAYLOAD_CAPACITY, PROTOCOL_CAPACITY, RECV_BUFFER_CAPACITY,
};
use crate::network::application::http::{
    FinalCall, Http1Engine, Method, ProtocolEngine, Request, Response,
};
use crate::network::{Clock, Dns, LinkMonitor, Socket, SocketFactory};

/// Result fields a response callback may update.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Outcome {
    /// HTTP status code; `0` until a callback sets it.
    pub status_code: u16,
}

/// Streaming response callback.
///
/// Invoked once per received fragment, with [`FinalCall::Final`] on the last
/// invocation. The fragment borrows the context's receive buffer and must not
/// be retained past the call. The callback is responsible for copying
/// `http_status_code` into the [`Outcome`] if the caller wants it.
pub type ResponseCallback<'a> = &'a mut dyn FnMut(&Response<'_>, FinalCall, &mut Outcome);

/// Per-request configuration accepted by [`RequestContext::set_option`].
///
/// Borrowed values must outlive the context; they are used during `execute`
/// and never copied unless stated.
pub enum RequestOption<'a> {
    /// Complete header lines, e.g. `"Content-Type: application/json\r\n"`. Not copied.
    Headers(&'a [&'a str]),
    /// Request body. Copied, truncated to one byte below the payload capacity.
    PayloadBody(&'a [u8]),
    /// Explicit payload length, overriding the length implied by `PayloadBody`.
    PayloadSize(usize),
    /// Protocol version token, e.g. `"HTTP/1.1"`. Copied.
    ProtocolVersion(&'a str),
    /// Enable or disable TLS server-name verification.
    VerifyHost(bool),
    /// Enable or disable TLS peer certificate verification.
    VerifyPeer(bool),
    /// `user:password` for basic authentication. Copied.
    Credentials(&'a str),
    /// Streaming response callback.
    ResponseCallback(ResponseCallback<'a>),
}

impl core::fmt::Debug for RequestOption<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RequestOption::Headers(h) => f.debug_tuple("Headers").field(h).finish(),
            RequestOption::PayloadBody(b) => f.debug_tuple("PayloadBody").field(&b.len()).finish(),
            RequestOption::PayloadSize(n) => f.debug_tuple("PayloadSize").field(n).finish(),
            RequestOption::ProtocolVersion(p) => f.debug_tuple("ProtocolVersion").field(p).finish(),
            RequestOption::VerifyHost(v) => f.debug_tuple("VerifyHost").field(v).finish(),
            RequestOption::VerifyPeer(v) => f.debug_tuple("VerifyPeer").field(v).finish(),
            RequestOption::Credentials(_) => f.write_str("Credentials(..)"),
            RequestOption::ResponseCallback(_) => f.write_str("ResponseCallback(..)"),
        }
    }
}

/// Where a context is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Created, not yet initialised.
    Idle,
    /// URL parsed and host resolved; no socket yet.
    Ready,
    /// Opening and connecting the socket.
    Connecting,
    /// Protocol exchange in progress.
    Requesting,
    /// The exchange completed.
    Done,
    /// A stage failed; see [`RequestContext::last_error`].
    Failed,
}

/// Configuration, connection state and results of one request.
///
/// `S` is the host stack's socket type. The context owns the socket
/// exclusively while a request is in flight and always closes it before
/// `execute` returns.
pub struct RequestContext<'a, S> {
    config: Config,
    state: State,
    socket: Option<S>,
    address: Option<Ipv4Addr>,
    url: Option<UrlFields>,
    method: Option<Method>,
    callback: Option<ResponseCallback<'a>>,
    recv_buf: [u8; RECV_BUFFER_CAPACITY],
    recv_len: usize,
    payload: [u8; PAYLOAD_CAPACITY],
    payload_len: usize,
    protocol: String<PROTOCOL_CAPACITY>,
    headers: &'a [&'a str],
    credentials: Option<String<CREDENTIALS_CAPACITY>>,
    verify_host: bool,
    verify_peer: bool,
    outcome: Outcome,
    last_error: Option<Error>,
}

impl<S> Default for RequestContext<'_, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S> RequestContext<'a, S> {
    /// A zero-valued context using [`Config::DEFAULT`].
    pub fn new() -> Self {
        Self::with_config(Config::DEFAULT)
    }

    /// A zero-valued context using `config`.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            state: State::Idle,
            socket: None,
            address: None,
            url: None,
            method: None,
            callback: None,
            recv_buf: [0; RECV_BUFFER_CAPACITY],
            recv_len: 0,
            payload: [0; PAYLOAD_CAPACITY],
            payload_len: 0,
            protocol: String::new(),
            headers: &[],
            credentials: None,
            verify_host: config.verify_host,
            verify_peer: config.verify_peer,
            outcome: Outcome::default(),
            last_error: None,
        }
    }

    /// Reset the context, parse `url` and resolve its host.
    ///
    /// Blocks for at most the link timeout plus the DNS timeout. Everything
    /// set by earlier `set_option` calls is cleared; the [`Config`] is kept.
    pub fn init<H>(&mut self, stack: &mut H, url: &str) -> Result<(), Error>
    where
        H: Clock + LinkMonitor + Dns + ?Sized,
        S: Socket,
    {
        if let Some(socket) = self.socket.take() {
            connector::release(socket);
        }
        *self = Self::with_config(self.config);

        let result = UrlFields::parse(url, &self.config).and_then(|fields| {
            let address = resolver::resolve(stack, fields.hostname(), &self.config)?;
            self.url = Some(fields);
            self.address = Some(address);
            Ok(())
        });

        match result {
            Ok(()) => {
                self.state = State::Ready;
                Ok(())
            }
            Err(err) => {
                error!("Failed to initialize request ({})", err.code());
                Err(self.fail(err))
            }
        }
    }

    /// Apply one option. Never fails; each variant only touches its own field.
    pub fn set_option(&mut self, option: RequestOption<'a>) {
        match option {
            RequestOption::Headers(headers) => self.headers = headers,
            RequestOption::PayloadBody(body) => {
                let len = body.len().min(PAYLOAD_CAPACITY - 1);
                if len < body.len() {
                    warn!("Payload truncated to {} bytes", len);
                }
                self.payload[..len].copy_from_slice(&body[..len]);
                self.payload[len] = 0;
                self.payload_len = len;
            }
            RequestOption::PayloadSize(size) => {
                self.payload_len = size.min(PAYLOAD_CAPACITY - 1);
            }
            RequestOption::ProtocolVersion(protocol) => self.protocol = truncated(protocol),
            RequestOption::VerifyHost(enabled) => self.verify_host = enabled,
            RequestOption::VerifyPeer(enabled) => self.verify_peer = enabled,
            RequestOption::Credentials(credentials) => {
                self.credentials = Some(truncated(credentials))
            }
            RequestOption::ResponseCallback(callback) => self.callback = Some(callback),
        }
    }

    /// Run the request with the built-in HTTP/1.1 engine.
    pub fn execute<F>(&mut self, sockets: &mut F, method: Method) -> Result<(), Error>
    where
        F: SocketFactory<Socket = S> + ?Sized,
        S: Socket,
    {
        self.execute_with(sockets, &mut Http1Engine::new(), method)
    }

    /// Run the request with a caller-supplied protocol engine.
    ///
    /// The socket is closed on every path out of this call. On success the
    /// status code is whatever the response callback stored in [`Outcome`].
    pub fn execute_with<F, E>(
        &mut self,
        sockets: &mut F,
        engine: &mut E,
        method: Method,
    ) -> Result<(), Error>
    where
        F: SocketFactory<Socket = S> + ?Sized,
        E: ProtocolEngine + ?Sized,
        S: Socket,
    {
        let (Some(url), Some(address), State::Ready) = (self.url.as_ref(), self.address, self.state)
        else {
            error!("Invalid argument (state {:?})", self.state);
            return Err(Error::InvalidArgument);
        };

        self.method = Some(method);
        self.state = State::Connecting;
        let tls = TlsPolicy {
            verify_host: self.verify_host,
            verify_peer: self.verify_peer,
            ca_sec_tag: self.config.ca_sec_tag,
        };
        let socket = match connector::connect(
            sockets,
            url,
            address,
            &tls,
            self.config.connect_timeout_ms,
        ) {
            Ok(socket) => socket,
            Err(err) => return Err(self.fail(err)),
        };
        self.socket = Some(socket);
        self.state = State::Requesting;

        let result = self.exchange(engine, method);

        if let Some(socket) = self.socket.take() {
            connector::release(socket);
        }

        match result {
            Ok(recv_len) => {
                self.recv_len = recv_len;
                self.state = State::Done;
                debug!("Request done, status {}", self.outcome.status_code);
                Ok(())
            }
            Err(err) => {
                error!("Request failed ({})", err.code());
                Err(self.fail(Error::Protocol(err)))
            }
        }
    }

    fn exchange<E>(
        &mut self,
        engine: &mut E,
        method: Method,
    ) -> Result<usize, crate::network::error::Error>
    where
        E: ProtocolEngine + ?Sized,
        S: Socket,
    {
        let Self {
            config,
            socket,
            url,
            callback,
            recv_buf,
            payload,
            payload_len,
            protocol,
            headers,
            credentials,
            outcome,
            ..
        } = self;

        let (Some(socket), Some(url)) = (socket.as_mut(), url.as_ref()) else {
            return Err(crate::network::error::Error::NotOpen);
        };

        if socket.set_timeout(config.request_timeout_ms).is_err() {
            warn!("Failed to set request timeout");
        }

        let request = Request {
            method,
            host: url.hostname(),
            path: url.path(),
            protocol: protocol.as_str(),
            headers: *headers,
            credentials: credentials.as_ref().map(|c| c.as_str()),
            payload: method.carries_body().then(|| &payload[..*payload_len]),
        };

        let mut deliver = |response: &Response<'_>, final_call: FinalCall| {
            if let Some(callback) = callback.as_mut() {
                callback(response, final_call, &mut *outcome);
            }
        };

        engine.exchange(socket, &request, &mut recv_buf[..], &mut deliver)
    }

    fn fail(&mut self, err: Error) -> Error {
        self.state = State::Failed;
        self.last_error = Some(err);
        err
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Parsed URL, once `init` succeeded.
    pub fn url(&self) -> Option<&UrlFields> {
        self.url.as_ref()
    }

    /// Resolved IPv4 address, once `init` succeeded.
    pub fn address(&self) -> Option<Ipv4Addr> {
        self.address
    }

    /// Method of the last `execute`.
    pub fn method(&self) -> Option<Method> {
        self.method
    }

    /// Open socket, if any. Always `None` outside of `execute`.
    pub fn socket(&self) -> Option<&S> {
        self.socket.as_ref()
    }

    /// Status code stored by the response callback.
    pub fn status_code(&self) -> u16 {
        self.outcome.status_code
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Error of the last failed `init` or `execute`.
    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    /// Bytes left in the receive buffer by the last exchange.
    pub fn recv_buf(&self) -> &[u8] {
        &self.recv_buf[..self.recv_len]
    }

    /// Payload that POST and PUT requests send.
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.payload_len]
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn headers(&self) -> &'a [&'a str] {
        self.headers
    }

    pub fn credentials(&self) -> Option<&str> {
        self.credentials.as_deref()
    }

    pub fn verify_host(&self) -> bool {
        self.verify_host
    }

    pub fn verify_peer(&self) -> bool {
        self.verify_peer
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }
}

impl<S> core::fmt::Debug for RequestContext<'_, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RequestContext")
            .field("state", &self.state)
            .field("url", &self.url)
            .field("address", &self.address)
            .field("method", &self.method)
            .field("socket_open", &self.socket.is_some())
            .field("payload_len", &self.payload_len)
            .field("protocol", &self.protocol)
            .field("headers", &self.headers.len())
            .field("verify_host", &self.verify_host)
            .field("verify_peer", &self.verify_peer)
            .field("outcome", &self.outcome)
            .field("last_error", &self.last_error)
            .finish()
    }
}

/// Copy as much of `value` as fits below the capacity `N`, on a char boundary.
fn truncated<const N: usize>(value: &str) -> String<N> {
    let mut out = String::new();
    for ch in value.chars() {
        if out.len() + ch.len_utf8() >= N || out.push(ch).is_err() {
            break;
        }
    }
    out
}
