use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cinecache_parser::{normalize, parse};

const NAMES: &[&str] = &[
    "The.Matrix.1999.1080p.BluRay.x264-GROUP",
    "Show.S01E01.1080p.WEB-DL.x264-GRP",
    "Heat.1995.[Director's.Cut].720p.BRRip.XviD.AC3-VLiS",
    "Documentary.Title.MVGroup.2014.1080p.DD5.1.x264",
    "Plain Title",
];

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_mixed", |b| {
        b.iter(|| {
            for name in NAMES {
                black_box(normalize(black_box(name)));
            }
        })
    });

    c.bench_function("parse_episode", |b| {
        b.iter(|| black_box(parse(black_box("Show.S01E01.1080p.WEB-DL.x264-GRP"))))
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
