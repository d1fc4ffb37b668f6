use criterion::{Criterion, Throughput};
use embedded_requests::config::RECV_BUFFER_CAPACITY;
use embedded_requests::network::application::http::{
    FinalCall, Http1Engine, Method, ProtocolEngine, Request,
};
use embedded_requests::network::error::Error;
use embedded_requests::network::{Close, Connection, Read, Write};
use std::hint::black_box;

/// Serves a canned response and discards writes.
struct LoopbackConnection<'a> {
    response: &'a [u8],
    read_pos: usize,
    read_chunk: usize,
    written: usize,
}

impl<'a> LoopbackConnection<'a> {
    fn new(response: &'a [u8], read_chunk: usize) -> Self {
        Self {
            response,
            read_pos: 0,
            read_chunk,
            written: 0,
        }
    }
}

impl Read for LoopbackConnection<'_> {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = &self.response[self.read_pos..];
        let len = remaining.len().min(buf.len()).min(self.read_chunk);
        buf[..len].copy_from_slice(&remaining[..len]);
        self.read_pos += len;
        Ok(len)
    }
}

impl Write for LoopbackConnection<'_> {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.written += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for LoopbackConnection<'_> {
    type Error = Error;
    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for LoopbackConnection<'_> {}

fn response_with_body(len: usize) -> Vec<u8> {
    let mut response = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", len).into_bytes();
    response.extend(std::iter::repeat_n(b'x', len));
    response
}

fn run(request: &Request<'_>, response: &[u8], read_chunk: usize) -> usize {
    let mut connection = LoopbackConnection::new(response, read_chunk);
    let mut recv_buf = [0u8; RECV_BUFFER_CAPACITY];
    let mut received = 0;
    Http1Engine::new()
        .exchange(
            &mut connection,
            request,
            &mut recv_buf,
            &mut |response, _: FinalCall| received += response.body_fragment.len(),
        )
        .expect("exchange failed");
    received + connection.written
}

pub fn bench_exchange_get(c: &mut Criterion) {
    let response = response_with_body(128);
    let headers = ["Accept: */*\r\n", "User-Agent: embedded-requests\r\n"];
    let request = Request {
        headers: &headers,
        ..Request::new(Method::Get, "example.com", "/api/status")
    };

    let mut group = c.benchmark_group("exchange");
    group.throughput(Throughput::Bytes(response.len() as u64));
    group.bench_function("get", |b| {
        b.iter(|| run(black_box(&request), &response, usize::MAX))
    });
    group.finish();
}

pub fn bench_exchange_post(c: &mut Criterion) {
    let response = response_with_body(16);
    let payload = br#"{"temperature":23.5,"humidity":41,"device":"sensor-01"}"#;
    let request = Request {
        credentials: Some("device:secret"),
        payload: Some(payload.as_slice()),
        ..Request::new(Method::Post, "example.com", "/api/telemetry")
    };

    let mut group = c.benchmark_group("exchange");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("post", |b| {
        b.iter(|| run(black_box(&request), &response, usize::MAX))
    });
    group.finish();
}

pub fn bench_exchange_streamed(c: &mut Criterion) {
    let response = response_with_body(64 * 1024);
    let request = Request::new(Method::Get, "example.com", "/firmware.bin");

    let mut group = c.benchmark_group("exchange");
    group.throughput(Throughput::Bytes(response.len() as u64));
    group.bench_function("streamed_64k", |b| {
        b.iter(|| run(black_box(&request), &response, 512))
    });
    group.finish();
}
