use criterion::{criterion_group, criterion_main, Criterion};
use git_pack::delta::{apply::apply_delta, compute::compute_delta};

fn repeating_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

fn small_edit(source: &[u8]) -> Vec<u8> {
    let mut target = source.to_vec();
    target[2048] = 0xFF;
    target[2049] = 0xFE;
    target
}

fn scattered_edit(source: &[u8]) -> Vec<u8> {
    let mut target = source.to_vec();
    for i in (0..target.len()).step_by(1024) {
        target[i] = 0xFF;
    }
    target
}

fn bench_delta_small(c: &mut Criterion) {
    let source = repeating_bytes(4096);
    let target = small_edit(&source);
    let delta = compute_delta(&source, &target);

    c.bench_function("delta_compute_4k", |b| b.iter(|| compute_delta(&source, &target)));
    c.bench_function("delta_apply_4k", |b| b.iter(|| apply_delta(&source, &delta).unwrap()));
}

fn bench_delta_large(c: &mut Criterion) {
    let source = repeating_bytes(65536);
    let target = scattered_edit(&source);
    let delta = compute_delta(&source, &target);

    c.bench_function("delta_apply_64k", |b| b.iter(|| apply_delta(&source, &delta).unwrap()));
}

criterion_group!(benches, bench_delta_small, bench_delta_large);
criterion_main!(benches);
