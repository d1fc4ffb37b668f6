//! # Application Layer
//!
//! Request-level clients built on the host traits in [`crate::network`].
//!
//! ## Available Modules
//!
//! - **[`http`]**: HTTP/1.1 request descriptor, response fragments and the
//!   protocol engine that runs one exchange over a connected socket
//! - **[`requests`]**: the curl-like pipeline (URL parsing, readiness-gated
//!   DNS, socket and TLS setup, execution) behind [`requests::RequestContext`]
//! - **[`chat`]**: chat-completion helper on top of [`requests`]
//!
//! ## Design Principles
//!
//! - **Host Agnostic**: everything network-facing goes through
//!   [`Stack`](crate::network::Stack) or [`Connection`](crate::network::Connection)
//! - **No-std Compatible**: no heap allocation, fixed-capacity buffers only
//! - **Bounded**: every blocking wait has a configured timeout

/// HTTP/1.1 wire protocol.
///
/// Serialises requests and streams responses through a callback, using only
/// the receive buffer handed in by the caller.
pub mod http;

/// curl-like synchronous requests.
pub mod requests;

/// Chat-completion client.
///
/// Sends a prompt to an OpenAI-style endpoint and returns the answer.
pub mod chat;
