use criterion::{BenchmarkId, Criterion, Throughput};
use embedded_requests::config::Config;
use embedded_requests::network::application::requests::UrlFields;
use std::hint::black_box;

pub fn bench_url_parse(c: &mut Criterion) {
    let config = Config::DEFAULT;
    let urls = [
        ("short", "http://example.com"),
        ("path", "https://api.example.com:8443/v1/devices/42/telemetry"),
        (
            "query",
            "http://10.0.0.2/search?q=temperature&from=2024-01-01&to=2024-12-31#top",
        ),
    ];

    let mut group = c.benchmark_group("url_parse");
    for (name, url) in urls {
        group.throughput(Throughput::Bytes(url.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), url, |b, url| {
            b.iter(|| UrlFields::parse(black_box(url), &config).expect("valid URL"));
        });
    }
    group.finish();
}
