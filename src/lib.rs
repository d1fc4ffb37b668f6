//! # embedded-requests
//!
//! A curl-like synchronous HTTP/HTTPS client for resource-constrained IoT
//! devices. The library is `no_std` and allocation-free: every buffer has a
//! fixed capacity set in [`config`].
//!
//! ## Features
//!
//! ### Request Pipeline
//! - **URL parsing** into fixed-capacity schema, hostname, port and path
//! - **Readiness-gated DNS**: resolution only starts once the link is up
//! - **TLS setup**: hostname binding and peer verification on TLS-capable stacks
//! - **Streaming responses**: the body is handed to a callback fragment by
//!   fragment, with a final-fragment marker
//!
//! ### Applications
//! - **Chat completions** over the pipeline
//! - **Shell command** `requests get/post/put/delete`
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! embedded-requests = "0.1.0"
//! ```
//!
//! The host networking stack is plugged in by implementing the traits in
//! [`network`] ([`Clock`](network::Clock), [`LinkMonitor`](network::LinkMonitor),
//! [`Dns`](network::Dns) and [`SocketFactory`](network::SocketFactory)).
//!
//! ### GET Example
//!
//! ```rust
//! use embedded_requests::network::Stack;
//! use embedded_requests::network::application::http::{FinalCall, Method, Response};
//! use embedded_requests::network::application::requests::{
//!     Error, Outcome, RequestContext, RequestOption,
//! };
//!
//! fn get<S: Stack>(stack: &mut S, url: &str) -> Result<u16, Error> {
//!     let mut on_response = |response: &Response<'_>, _: FinalCall, outcome: &mut Outcome| {
//!         outcome.status_code = response.http_status_code;
//!         let _ = response.body_fragment;
//!     };
//!
//!     let mut ctx = RequestContext::new();
//!     ctx.init(stack, url)?;
//!     ctx.set_option(RequestOption::ProtocolVersion("HTTP/1.1"));
//!     ctx.set_option(RequestOption::ResponseCallback(&mut on_response));
//!     ctx.execute(stack, Method::Get)?;
//!     Ok(ctx.status_code())
//! }
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, etc.)
//! - Linux-based IoT devices, through [`network::host`] with the `std` feature
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support and the `std::net` host stack
//! - `defmt`: Enable defmt logging support for embedded debugging
//! - `log`: Route internal logging through the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

/// Build-time capacities and runtime configuration.
pub mod config;

/// Network abstraction layer: host traits and protocol implementations.
///
/// This module contains the seams to the host networking stack and the
/// request pipeline built on top of them.
pub mod network;

/// System utilities for embedded devices.
///
/// Contains the `requests` shell command handlers.
pub mod system;

pub use config::Config;
pub use network::application::http::Method;
pub use network::application::requests::{Error, RequestContext, RequestOption};
