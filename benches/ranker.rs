use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rand::prelude::*;
use vfsearch::descriptor::DESCRIPTOR_LEN;
use vfsearch::ranker::{cosine_similarity, top_k};
use vfsearch::{Descriptor, FrameRecord};

fn random_descriptor(rng: &mut impl Rng) -> Descriptor {
    let values = (0..DESCRIPTOR_LEN).map(|_| rng.random::<f32>()).collect();
    Descriptor::from_values(values).unwrap()
}

fn bench_cosine(c: &mut Criterion) {
    let mut rng = rand::rng();
    let a = random_descriptor(&mut rng);
    let b = random_descriptor(&mut rng);

    let mut group = c.benchmark_group("余弦相似度");
    group.throughput(Throughput::Elements(1));
    group.bench_function("256 维", |bench| {
        bench.iter(|| cosine_similarity(black_box(a.as_slice()), black_box(b.as_slice())))
    });
    group.finish();
}

fn bench_top_k(c: &mut Criterion) {
    let mut rng = rand::rng();
    let query = random_descriptor(&mut rng);

    let mut group = c.benchmark_group("Top-K 排序");
    for n in [1_000, 100_000] {
        let records = (0..n)
            .map(|i| FrameRecord::new("bench.mp4", i, random_descriptor(&mut rng)))
            .collect::<Vec<_>>();
        group.throughput(Throughput::Elements(n));
        group.bench_function(format!("{n} 帧 k=10"), |b| {
            b.iter(|| top_k(black_box(&query), black_box(&records), 10))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cosine, bench_top_k);
criterion_main!(benches);
