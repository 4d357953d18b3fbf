//! Performance benchmarks for tweetline
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - One-shot body decoding (identity and gzip)
//! - Incremental gzip inflation at different chunk sizes
//! - Line splitting over a decoded stream
//! - OAuth 1.0a header signing

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::{Method, Url};
use std::io::Write;
use tokio::runtime::Runtime;

use tweetline::api::decoder::{decode_body, ContentEncoding, DecodedStream, GzipChunkDecoder};
use tweetline::api::streaming::LineReader;
use tweetline::api::types::ByteStream;
use tweetline::{Credentials, OAuth1Signer};

/// Create a Tokio runtime for async benchmarks
fn create_runtime() -> Runtime {
    tokio::runtime::Runtime::new().unwrap()
}

/// Newline-delimited tweet-shaped JSON, `count` lines long
fn tweet_lines(count: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..count {
        writeln!(
            out,
            "{{\"id\":{},\"id_str\":\"{}\",\"text\":\"status update number {}\",\"user\":{{\"screen_name\":\"user{}\"}}}}\r",
            i * 7919,
            i * 7919,
            i,
            i % 97
        )
        .unwrap();
    }
    out
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn chunked(data: &[u8], chunk_size: usize) -> ByteStream {
    let chunks: Vec<_> = data
        .chunks(chunk_size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    Box::pin(futures::stream::iter(chunks))
}

fn bench_decode_body(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_body");

    for count in [10, 1000, 10000].iter() {
        let plain = tweet_lines(*count);
        let compressed = Bytes::from(gzip(&plain));
        let plain = Bytes::from(plain);
        group.throughput(Throughput::Bytes(plain.len() as u64));

        group.bench_with_input(BenchmarkId::new("identity", count), &plain, |b, body| {
            b.iter(|| black_box(decode_body(body.clone(), ContentEncoding::Identity).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("gzip", count), &compressed, |b, body| {
            b.iter(|| black_box(decode_body(body.clone(), ContentEncoding::Gzip).unwrap()));
        });
    }

    group.finish();
}

fn bench_incremental_gzip(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental_gzip");
    let plain = tweet_lines(5000);
    let compressed = gzip(&plain);
    group.throughput(Throughput::Bytes(plain.len() as u64));

    for chunk_size in [64, 1024, 16384].iter() {
        group.bench_with_input(
            BenchmarkId::new("feed", chunk_size),
            chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut decoder = GzipChunkDecoder::new();
                    let mut total = 0;
                    for chunk in compressed.chunks(chunk_size) {
                        total += decoder.feed(chunk).unwrap().len();
                    }
                    total += decoder.finish().unwrap().len();
                    black_box(total)
                });
            },
        );
    }

    group.finish();
}

fn bench_line_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_reader");
    let rt = create_runtime();
    let plain = tweet_lines(5000);
    let compressed = gzip(&plain);
    group.throughput(Throughput::Elements(5000));

    for chunk_size in [256, 8192].iter() {
        group.bench_with_input(
            BenchmarkId::new("identity", chunk_size),
            chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    rt.block_on(async {
                        let stream = DecodedStream::new(
                            chunked(&plain, chunk_size),
                            ContentEncoding::Identity,
                        );
                        let mut reader = LineReader::new(stream);
                        let mut count = 0;
                        while let Some(line) = reader.read_line().await.unwrap() {
                            count += black_box(line).len();
                        }
                        count
                    })
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("gzip", chunk_size),
            chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    rt.block_on(async {
                        let stream = DecodedStream::new(
                            chunked(&compressed, chunk_size),
                            ContentEncoding::Gzip,
                        );
                        let mut reader = LineReader::new(stream);
                        let mut count = 0;
                        while let Some(line) = reader.read_line().await.unwrap() {
                            count += black_box(line).len();
                        }
                        count
                    })
                });
            },
        );
    }

    group.finish();
}

fn bench_oauth_signing(c: &mut Criterion) {
    let signer = OAuth1Signer::new();
    let credentials = Credentials::new(
        "xvz1evFS4wEEPTGEFPHBog",
        "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
        "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
        "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
    );
    let uri = Url::parse(
        "https://api.twitter.com/1.1/statuses/update.json?include_entities=true&status=Hello%20Ladies%20%2B%20Gentlemen%2C%20a%20signed%20OAuth%20request%21",
    )
    .unwrap();

    c.bench_function("oauth1_sign", |b| {
        b.iter(|| {
            black_box(
                signer
                    .sign_with(
                        &uri,
                        &credentials,
                        &Method::POST,
                        "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
                        1318622958,
                    )
                    .unwrap(),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_decode_body,
    bench_incremental_gzip,
    bench_line_reader,
    bench_oauth_signing
);
criterion_main!(benches);
