use super::{DEFAULT_PROTOCOL, FinalCall, Method, Request, Response};
use crate::network::Connection;
use crate::network::error::Error;
use base64ct::{Base64, Encoding};
use core::fmt::Write as _;
use heapless::{String, Vec};

/// Capacity of the serialised request line and headers.
const HEAD_CAPACITY: usize = 1024;
/// Capacity of the base64 form of the credentials.
const AUTH_CAPACITY: usize = 192;

/// Drives one blocking request/response exchange over a connected socket.
pub trait ProtocolEngine {
    /// Send `request` and stream the response into `on_response`.
    ///
    /// `recv_buf` is the only receive storage; every fragment handed to the
    /// callback borrows it. The callback is invoked at least once on success,
    /// and the last invocation carries [`FinalCall::Final`].
    ///
    /// Returns the number of valid bytes left in `recv_buf`.
    fn exchange<C: Connection>(
        &mut self,
        connection: &mut C,
        request: &Request<'_>,
        recv_buf: &mut [u8],
        on_response: &mut dyn FnMut(&Response<'_>, FinalCall),
    ) -> Result<usize, Error>;
}

/// Minimal HTTP/1.1 engine.
///
/// Bodies are delimited by `Content-Length`, by the last chunk of a chunked
/// body or by the peer closing the connection. Chunked bodies are delivered
/// as received, chunk framing included. Interim `1xx` responses are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct Http1Engine;

impl Http1Engine {
    pub fn new() -> Self {
        Self
    }
}

/// Parsed status line and the headers the engine cares about.
#[derive(Debug, PartialEq, Eq)]
struct Head {
    status_code: u16,
    content_length: Option<usize>,
    chunked: bool,
}

/// How the end of the response body is found.
#[derive(Debug)]
enum Framing {
    Length(usize),
    Chunked(ChunkScanner),
    Close,
}

impl Framing {
    fn new(method: Method, head: &Head) -> Self {
        if has_no_body(method, head.status_code) {
            Framing::Length(0)
        } else if head.chunked {
            Framing::Chunked(ChunkScanner::new())
        } else {
            head.content_length.map_or(Framing::Close, Framing::Length)
        }
    }

    /// Length announced to the callback.
    fn content_length(&self) -> Option<usize> {
        match self {
            Framing::Length(len) => Some(*len),
            _ => None,
        }
    }

    /// Bytes of `data` that still belong to the body, and whether the body
    /// ends with them.
    fn take(&mut self, data: &[u8], processed: usize) -> Result<(usize, bool), Error> {
        match self {
            Framing::Length(len) => {
                let take = data.len().min(len.saturating_sub(processed));
                Ok((take, processed + take == *len))
            }
            Framing::Chunked(scanner) => {
                let take = scanner.feed(data)?;
                Ok((take, scanner.is_done()))
            }
            Framing::Close => Ok((data.len(), false)),
        }
    }
}

/// Position inside chunked transfer coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    /// Hex chunk size, value so far and whether a digit was seen.
    Size(usize, bool),
    /// Chunk extension up to the end of the size line.
    Extension(usize),
    /// Remaining bytes of chunk data.
    Data(usize),
    /// CRLF after chunk data.
    DataEnd,
    /// Start of a trailer line; an empty line ends the body.
    TrailerStart,
    Trailer,
    Done,
}

/// Follows chunk framing without altering the bytes.
#[derive(Debug)]
struct ChunkScanner {
    state: ChunkState,
}

impl ChunkScanner {
    fn new() -> Self {
        Self {
            state: ChunkState::Size(0, false),
        }
    }

    fn is_done(&self) -> bool {
        self.state == ChunkState::Done
    }

    /// Consume `data` up to and including the end of the body.
    ///
    /// Returns how many bytes of `data` belong to the body.
    fn feed(&mut self, data: &[u8]) -> Result<usize, Error> {
        let mut pos = 0;
        while pos < data.len() && !self.is_done() {
            if let ChunkState::Data(remaining) = self.state {
                let take = remaining.min(data.len() - pos);
                pos += take;
                self.state = if take == remaining {
                    ChunkState::DataEnd
                } else {
                    ChunkState::Data(remaining - take)
                };
                continue;
            }

            let byte = data[pos];
            pos += 1;
            self.state = match (self.state, byte) {
                (ChunkState::Size(size, _), _) if byte.is_ascii_hexdigit() => {
                    let digit = (byte as char).to_digit(16).unwrap_or(0) as usize;
                    let size = size
                        .checked_mul(16)
                        .and_then(|size| size.checked_add(digit))
                        .ok_or(Error::ProtocolError)?;
                    ChunkState::Size(size, true)
                }
                (ChunkState::Size(size, true), b';' | b' ' | b'\t' | b'\r') => {
                    ChunkState::Extension(size)
                }
                (ChunkState::Size(size, true), b'\n') => after_size_line(size),
                (ChunkState::Size(..), _) => return Err(Error::ProtocolError),
                (ChunkState::Extension(size), b'\n') => after_size_line(size),
                (ChunkState::Extension(size), _) => ChunkState::Extension(size),
                (ChunkState::DataEnd, b'\r') => ChunkState::DataEnd,
                (ChunkState::DataEnd, b'\n') => ChunkState::Size(0, false),
                (ChunkState::DataEnd, _) => return Err(Error::ProtocolError),
                (ChunkState::TrailerStart, b'\r') => ChunkState::TrailerStart,
                (ChunkState::TrailerStart, b'\n') => ChunkState::Done,
                (ChunkState::Trailer, b'\n') => ChunkState::TrailerStart,
                (ChunkState::TrailerStart | ChunkState::Trailer, _) => ChunkState::Trailer,
                (ChunkState::Data(_) | ChunkState::Done, _) => self.state,
            };
        }
        Ok(pos)
    }
}

fn after_size_line(size: usize) -> ChunkState {
    if size == 0 {
        ChunkState::TrailerStart
    } else {
        ChunkState::Data(size)
    }
}

impl ProtocolEngine for Http1Engine {
    fn exchange<C: Connection>(
        &mut self,
        connection: &mut C,
        request: &Request<'_>,
        recv_buf: &mut [u8],
        on_response: &mut dyn FnMut(&Response<'_>, FinalCall),
    ) -> Result<usize, Error> {
        // --- Send Request ---
        let head = build_head(request)?;
        write_all(connection, &head)?;
        if let Some(payload) = request.payload {
            write_all(connection, payload)?;
        }
        connection.flush().map_err(|_| Error::WriteError)?;

        // --- Receive Head ---
        let mut filled = 0;
        let (head, header_end) = loop {
            if let Some(pos) = find_slice(&recv_buf[..filled], b"\r\n\r\n") {
                let head = parse_head(&recv_buf[..pos])?;
                if !is_interim(head.status_code) {
                    break (head, pos);
                }
                debug!("Skipping interim {} response", head.status_code);
                recv_buf.copy_within(pos + 4..filled, 0);
                filled -= pos + 4;
                continue;
            }
            if filled == recv_buf.len() {
                // Status line and headers must fit the receive buffer.
                return Err(Error::ProtocolError);
            }
            match connection.read(&mut recv_buf[filled..]) {
                Ok(0) => return Err(Error::ConnectionClosed),
                Ok(n) => filled += n,
                Err(_) => return Err(Error::ReadError),
            }
        };

        let mut framing = Framing::new(request.method, &head);
        let content_length = framing.content_length();
        trace!(
            "HTTP status {}, {} header bytes",
            head.status_code,
            header_end
        );

        // --- Stream Body ---
        let body_start = header_end + 4;
        let (first_len, done) = framing.take(&recv_buf[body_start..filled], 0)?;
        let mut processed = first_len;
        let mut recv_len = filled;

        on_response(
            &Response {
                http_status_code: head.status_code,
                body_fragment: &recv_buf[body_start..body_start + first_len],
                content_length,
                processed,
            },
            if done { FinalCall::Final } else { FinalCall::More },
        );
        if done {
            return Ok(recv_len);
        }

        loop {
            let n = match connection.read(recv_buf) {
                Ok(n) => n,
                Err(_) => return Err(Error::ReadError),
            };
            if n == 0 {
                if !matches!(framing, Framing::Close) {
                    // Peer closed before the body was complete.
                    return Err(Error::ConnectionClosed);
                }
                on_response(
                    &Response {
                        http_status_code: head.status_code,
                        body_fragment: &[],
                        content_length,
                        processed,
                    },
                    FinalCall::Final,
                );
                return Ok(recv_len);
            }

            let (take, done) = framing.take(&recv_buf[..n], processed)?;
            processed += take;
            recv_len = n;
            on_response(
                &Response {
                    http_status_code: head.status_code,
                    body_fragment: &recv_buf[..take],
                    content_length,
                    processed,
                },
                if done { FinalCall::Final } else { FinalCall::More },
            );
            if done {
                return Ok(recv_len);
            }
        }
    }
}

/// Serialise the request line and headers.
pub(crate) fn build_head(request: &Request<'_>) -> Result<Vec<u8, HEAD_CAPACITY>, Error> {
    let mut head: Vec<u8, HEAD_CAPACITY> = Vec::new();
    let protocol = if request.protocol.is_empty() {
        DEFAULT_PROTOCOL
    } else {
        request.protocol
    };

    // Request line
    push(&mut head, request.method.as_str().as_bytes())?;
    push(&mut head, b" ")?;
    push(&mut head, request.path.as_bytes())?;
    push(&mut head, b" ")?;
    push(&mut head, protocol.as_bytes())?;
    push(&mut head, b"\r\n")?;

    // Headers
    push(&mut head, b"Host: ")?;
    push(&mut head, request.host.as_bytes())?;
    push(&mut head, b"\r\n")?;

    let mut connection_set = false;
    for line in request.headers {
        push(&mut head, line.as_bytes())?;
        if !line.ends_with("\r\n") {
            push(&mut head, b"\r\n")?;
        }
        connection_set |= line
            .split_once(':')
            .is_some_and(|(name, _)| name.trim().eq_ignore_ascii_case("Connection"));
    }
    // One exchange per socket.
    if !connection_set {
        push(&mut head, b"Connection: close\r\n")?;
    }

    if let Some(credentials) = request.credentials {
        let mut encoded = [0u8; AUTH_CAPACITY];
        let encoded = Base64::encode(credentials.as_bytes(), &mut encoded)
            .map_err(|_| Error::BufferOverflow)?;
        push(&mut head, b"Authorization: Basic ")?;
        push(&mut head, encoded.as_bytes())?;
        push(&mut head, b"\r\n")?;
    }

    // Body
    if let Some(payload) = request.payload {
        let mut len_str: String<10> = String::new();
        write!(len_str, "{}", payload.len()).map_err(|_| Error::BufferOverflow)?;
        push(&mut head, b"Content-Length: ")?;
        push(&mut head, len_str.as_bytes())?;
        push(&mut head, b"\r\n")?;
    }

    push(&mut head, b"\r\n")?;
    Ok(head)
}

fn push(buf: &mut Vec<u8, HEAD_CAPACITY>, bytes: &[u8]) -> Result<(), Error> {
    buf.extend_from_slice(bytes).map_err(|_| Error::BufferOverflow)
}

fn write_all<C: Connection>(connection: &mut C, mut bytes: &[u8]) -> Result<(), Error> {
    while !bytes.is_empty() {
        match connection.write(bytes) {
            Ok(0) => return Err(Error::WriteError),
            Ok(n) => bytes = &bytes[n..],
            Err(_) => return Err(Error::WriteError),
        }
    }
    Ok(())
}

fn parse_head(data: &[u8]) -> Result<Head, Error> {
    let header_str = core::str::from_utf8(data).map_err(|_| Error::ProtocolError)?;
    let mut lines = header_str.split("\r\n");

    // Parse status line
    let status_line = lines.next().ok_or(Error::ProtocolError)?;
    let mut status_parts = status_line.splitn(3, ' ');
    let version = status_parts.next().ok_or(Error::ProtocolError)?;
    if !version.starts_with("HTTP/") {
        return Err(Error::ProtocolError);
    }
    let status_code_str = status_parts.next().ok_or(Error::ProtocolError)?;
    if status_code_str.len() != 3 {
        return Err(Error::ProtocolError);
    }
    let status_code = status_code_str
        .parse::<u16>()
        .map_err(|_| Error::ProtocolError)?;

    // Parse headers
    let mut content_length = None;
    let mut chunked = false;
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(2, ':');
        let name = parts.next().ok_or(Error::ProtocolError)?.trim();
        let value = parts.next().ok_or(Error::ProtocolError)?.trim();

        if name.eq_ignore_ascii_case("Content-Length") {
            content_length = Some(value.parse::<usize>().map_err(|_| Error::ProtocolError)?);
        } else if name.eq_ignore_ascii_case("Transfer-Encoding")
            && value.eq_ignore_ascii_case("chunked")
        {
            chunked = true;
        }
    }

    if chunked {
        debug!("Chunked body, delivering raw");
        content_length = None;
    }

    Ok(Head {
        status_code,
        content_length,
        chunked,
    })
}

fn has_no_body(method: Method, status_code: u16) -> bool {
    method == Method::Head || (100..200).contains(&status_code) || matches!(status_code, 204 | 304)
}

/// `1xx` responses other than `101 Switching Protocols` precede the real one.
fn is_interim(status_code: u16) -> bool {
    (100..200).contains(&status_code) && status_code != 101
}

/// Finds the first occurrence of a slice in another slice and returns its starting position.
fn find_slice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
