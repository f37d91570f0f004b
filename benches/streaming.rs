//! Benchmarks for direct streaming.
//!
//! Measures range header parsing and ranged reads through `ReaderStream`.

use cinecache::streaming::parse_range_header;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use futures::StreamExt;
use std::io::Cursor;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

fn bench_parse_range(c: &mut Criterion) {
    let size = 4 * 1024 * 1024 * 1024u64;
    let headers = ["bytes=0-1023", "bytes=1048576-", "bytes=-65536", "bytes=abc-def"];

    c.bench_function("parse_range_header", |b| {
        b.iter(|| {
            for header in headers {
                black_box(parse_range_header(black_box(header), size));
            }
        })
    });
}

fn bench_ranged_read(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("ranged_read");

    for length in [64 * 1024usize, 1024 * 1024] {
        let data = vec![7u8; 4 * 1024 * 1024];
        group.throughput(Throughput::Bytes(length as u64));
        group.bench_function(format!("reader_stream_{}", length), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let cursor = Cursor::new(data.as_slice());
                    let mut stream = ReaderStream::new(cursor.take(length as u64));
                    let mut total = 0;
                    while let Some(chunk) = stream.next().await {
                        total += chunk.unwrap().len();
                    }
                    black_box(total)
                })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse_range, bench_ranged_read);
criterion_main!(benches);
