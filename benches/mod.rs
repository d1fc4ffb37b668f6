use criterion::{criterion_group, criterion_main};

mod network;

criterion_group!(
    benches,
    network::application::requests::bench_url_parse,
    network::application::http::bench_exchange_get,
    network::application::http::bench_exchange_post,
    network::application::http::bench_exchange_streamed
);
criterion_main!(benches);
