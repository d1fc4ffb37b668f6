//! `requests` shell command for embedded systems.
//!
//! Runs one HTTP request per command line and prints the response body as it
//! streams in:
//!
//! ```text
//! > requests get http://example.com/api
//! > requests post http://example.com/api "{\"a\":1}"
//! > requests put http://example.com/api/1 "{\"a\":2}"
//! > requests delete http://example.com/api/1
//! ```
//!
//! Output goes through an [`OutputFn`], so the same handler drives a UART,
//! an RTT channel or stdout.
//!
//! # Examples
//!
//! ```rust
//! use embedded_requests::network::Stack;
//! use embedded_requests::system::shell;
//!
//! fn on_line<S: Stack>(stack: &mut S, line: &str) {
//!     if let Err(err) = shell::run_line(stack, line, |text| {
//!         let _ = text; // send to UART
//!     }) {
//!         let _ = err.code();
//!     }
//! }
//! ```

use core::fmt::Write as _;

use heapless::{String, Vec};

use crate::network::Stack;
use crate::network::application::http::{FinalCall, Method, Response};
use crate::network::application::requests::{Error, Outcome, RequestContext, RequestOption};

/// Name the command is registered under.
pub const COMMAND_NAME: &str = "requests";

/// Maximum number of arguments per command line, command name included.
pub const MAX_ARGS: usize = 8;

/// Function signature for output handlers.
///
/// Output handlers receive text from the shell and are responsible for
/// displaying it through the appropriate output mechanism (UART, LCD, etc.).
pub type OutputFn = fn(&str);

/// One `requests` subcommand.
#[derive(Debug, Clone, Copy)]
pub struct Subcommand {
    /// Name as typed after `requests`
    pub name: &'static str,
    /// Help text
    pub description: &'static str,
    /// Method the subcommand sends
    pub method: Method,
    /// Whether a `<body>` argument is required
    pub takes_body: bool,
}

/// Subcommands of `requests`.
pub const SUBCOMMANDS: &[Subcommand] = &[
    Subcommand {
        name: "get",
        description: "Perform HTTP GET request: requests get <url>",
        method: Method::Get,
        takes_body: false,
    },
    Subcommand {
        name: "post",
        description: "Perform HTTP POST request: requests post <url> <body>",
        method: Method::Post,
        takes_body: true,
    },
    Subcommand {
        name: "put",
        description: "Perform HTTP PUT request: requests put <url> <body>",
        method: Method::Put,
        takes_body: true,
    },
    Subcommand {
        name: "delete",
        description: "Perform HTTP DELETE request: requests delete <url>",
        method: Method::Delete,
        takes_body: false,
    },
];

/// Split `line` into arguments and run it.
pub fn run_line<S>(stack: &mut S, line: &str, output: OutputFn) -> Result<(), Error>
where
    S: Stack + ?Sized,
{
    let argv = match split_arguments(line) {
        Some(argv) => argv,
        None => {
            output("Error parsing command\r\n");
            return Err(Error::InvalidArgument);
        }
    };
    run(stack, &argv, output)
}

/// Run `requests <subcommand> <url> [<body>]`.
///
/// `argv[0]` is the command name. `-h`/`--help` or no subcommand lists the
/// subcommands; missing arguments print the usage and fail with
/// [`Error::InvalidArgument`].
pub fn run<S>(stack: &mut S, argv: &[&str], output: OutputFn) -> Result<(), Error>
where
    S: Stack + ?Sized,
{
    match argv {
        [name, ..] if *name != COMMAND_NAME => {
            output("Unknown command.\r\n");
            Err(Error::InvalidArgument)
        }
        [_] | [_, "-h" | "--help"] => {
            list_subcommands(output);
            Ok(())
        }
        [_, sub, args @ ..] => {
            let Some(subcommand) = SUBCOMMANDS.iter().find(|s| s.name == *sub) else {
                output("Unknown subcommand. Type 'requests --help' to see available subcommands.\r\n");
                return Err(Error::InvalidArgument);
            };
            match (args, subcommand.takes_body) {
                ([url, ..], false) => perform(stack, subcommand.method, url, None, output),
                ([url, body, ..], true) => {
                    perform(stack, subcommand.method, url, Some(*body), output)
                }
                _ => {
                    print_line(output, format_args!("Usage: {}", usage(subcommand)));
                    Err(Error::InvalidArgument)
                }
            }
        }
        [] => Err(Error::InvalidArgument),
    }
}

fn perform<S>(
    stack: &mut S,
    method: Method,
    url: &str,
    body: Option<&str>,
    output: OutputFn,
) -> Result<(), Error>
where
    S: Stack + ?Sized,
{
    let mut print_response = |response: &Response<'_>, _: FinalCall, outcome: &mut Outcome| {
        outcome.status_code = response.http_status_code;
        if outcome.status_code == 0 {
            print_line(output, format_args!("HTTP Status Code: {}", outcome.status_code));
            return;
        }
        if !response.body_fragment.is_empty() {
            print_fragment(output, response.body_fragment);
        }
    };

    let mut ctx = RequestContext::new();
    if let Err(err) = ctx.init(stack, url) {
        print_line(
            output,
            format_args!("Failed to initialize requests ({})", err.code()),
        );
        return Err(err);
    }

    ctx.set_option(RequestOption::ProtocolVersion("HTTP/1.1"));
    ctx.set_option(RequestOption::ResponseCallback(&mut print_response));
    if let Some(body) = body {
        ctx.set_option(RequestOption::PayloadBody(body.as_bytes()));
    }

    ctx.execute(stack, method).inspect_err(|err| {
        print_line(
            output,
            format_args!("{} request failed ({})", method.as_str(), err.code()),
        );
    })
}

fn usage(subcommand: &Subcommand) -> &'static str {
    subcommand
        .description
        .split_once(": ")
        .map_or(subcommand.description, |(_, usage)| usage)
}

fn list_subcommands(output: OutputFn) {
    output("Available subcommands:\r\n");
    for subcommand in SUBCOMMANDS {
        output(subcommand.name);
        output("\t\t");
        output(subcommand.description);
        output("\r\n");
    }
}

fn print_line(output: OutputFn, args: core::fmt::Arguments<'_>) {
    let mut line: String<128> = String::new();
    // Overlong lines are cut at the buffer end.
    let _ = line.write_fmt(args);
    output(&line);
    output("\r\n");
}

/// Print a body fragment, replacing invalid UTF-8 with U+FFFD.
fn print_fragment(output: OutputFn, fragment: &[u8]) {
    for chunk in fragment.utf8_chunks() {
        if !chunk.valid().is_empty() {
            output(chunk.valid());
        }
        if !chunk.invalid().is_empty() {
            output("\u{FFFD}");
        }
    }
    output("\r\n");
}

/// Split a command line on spaces, keeping double-quoted arguments whole.
///
/// A backslash inside quotes escapes the next character; the escape stays in
/// the argument because arguments borrow the line. Returns `None` for an
/// unterminated quote or too many arguments.
pub fn split_arguments(line: &str) -> Option<Vec<&str, MAX_ARGS>> {
    let mut argv = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && bytes[i] == b' ' {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let arg = if bytes[i] == b'"' {
            let start = i + 1;
            i = start;
            while i < bytes.len() && bytes[i] != b'"' {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            if i >= bytes.len() {
                return None;
            }
            let arg = &line[start..i];
            i += 1;
            arg
        } else {
            let start = i;
            while i < bytes.len() && bytes[i] != b' ' {
                i += 1;
            }
            &line[start..i]
        };

        argv.push(arg).ok()?;
    }

    Some(argv)
}
