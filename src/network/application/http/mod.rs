//! HTTP/1.1 protocol engine for embedded systems.
//!
//! This module provides the wire side of a request: a request descriptor
//! ([`Request`]) built by the caller, and a [`ProtocolEngine`] that writes it
//! to a connected socket and streams the response back through a callback,
//! one [`Response`] fragment at a time. It focuses on predictable memory
//! usage: the engine never allocates and only ever uses the receive buffer it
//! is handed.
//!
//! # Features
//!
//! - HTTP/1.1 request serialisation with borrowed header lines
//! - Basic authentication from a `user:password` string
//! - Streaming response delivery with a final-fragment marker
//! - `Content-Length` and close-delimited bodies
//!
//! # Usage
//!
//! Most callers go through
//! [`RequestContext`](crate::network::application::requests::RequestContext),
//! which builds the descriptor and owns the socket. The engine can also be
//! driven directly over any [`Connection`](crate::network::Connection):
//!
//! ```rust,no_run
//! use embedded_requests::network::application::http::{
//!     FinalCall, Http1Engine, Method, ProtocolEngine, Request,
//! };
//! # use embedded_requests::network::Connection;
//! # struct MockConnection;
//! # impl Connection for MockConnection {}
//! # impl embedded_requests::network::Read for MockConnection {
//! #     type Error = ();
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl embedded_requests::network::Write for MockConnection {
//! #     type Error = ();
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl embedded_requests::network::Close for MockConnection {
//! #     type Error = ();
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//!
//! let mut connection = MockConnection;
//! let mut recv_buf = [0u8; 576];
//! let request = Request::new(Method::Get, "example.com", "/api/status");
//!
//! let result = Http1Engine::new().exchange(
//!     &mut connection,
//!     &request,
//!     &mut recv_buf,
//!     &mut |response, final_call| {
//!         if final_call == FinalCall::Final {
//!             // response.http_status_code is available on every fragment
//!         }
//!         let _ = response.body_fragment;
//!     },
//! );
//! ```

/// HTTP/1.1 engine implementation and the engine trait.
pub mod client;

pub use client::{Http1Engine, ProtocolEngine};

/// Protocol version used when the caller did not set one.
pub const DEFAULT_PROTOCOL: &str = "HTTP/1.1";

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
    Options,
}

impl Method {
    /// Method token as written on the request line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
        }
    }

    /// Whether requests with this method send the payload buffer.
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

/// Marks whether a fragment is the last one of the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FinalCall {
    /// More fragments follow.
    More,
    /// This is the last invocation for the response.
    Final,
}

/// Wire request descriptor.
///
/// Everything is borrowed: the descriptor lives only for the duration of one
/// exchange.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    /// Request method.
    pub method: Method,
    /// Value of the `Host` header.
    pub host: &'a str,
    /// Request target, starting with `/`.
    pub path: &'a str,
    /// Protocol version token, e.g. `HTTP/1.1`. Empty means [`DEFAULT_PROTOCOL`].
    pub protocol: &'a str,
    /// Complete header lines (`"Name: value"`, with or without trailing CRLF).
    pub headers: &'a [&'a str],
    /// `user:password` for basic authentication.
    pub credentials: Option<&'a str>,
    /// Body to send. Only set for methods that carry one.
    pub payload: Option<&'a [u8]>,
}

impl<'a> Request<'a> {
    /// A bare request with no headers, credentials or body.
    pub fn new(method: Method, host: &'a str, path: &'a str) -> Self {
        Self {
            method,
            host,
            path,
            protocol: DEFAULT_PROTOCOL,
            headers: &[],
            credentials: None,
            payload: None,
        }
    }
}

/// One fragment of a streamed response.
///
/// The fragment borrows the engine's receive buffer and is only valid for the
/// duration of the callback invocation.
#[derive(Debug, Clone, Copy)]
pub struct Response<'a> {
    /// Status code from the status line.
    pub http_status_code: u16,
    /// Body bytes carried by this fragment. May be empty.
    pub body_fragment: &'a [u8],
    /// Body length announced by the peer, if any.
    pub content_length: Option<usize>,
    /// Body bytes delivered so far, including this fragment.
    pub processed: usize,
}
