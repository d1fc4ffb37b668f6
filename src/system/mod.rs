//! System utilities for embedded devices.
//!
//! # Available Utilities
//!
//! - **[`shell`]**: the `requests` shell command, for issuing HTTP requests
//!   interactively from a device console
//!
//! # Usage
//!
//! ```rust
//! use embedded_requests::system::shell::split_arguments;
//!
//! let argv = split_arguments("requests get http://example.com/").unwrap();
//! assert_eq!(argv[1], "get");
//! ```

/// `requests get/post/put/delete` command handlers.
pub mod shell;
