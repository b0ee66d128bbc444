use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use seal_crypto::{HashContext, HashKind};

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    for size in [64usize, 4096, 1 << 20] {
        let data = vec![0x5a_u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        for kind in HashKind::ALL {
            group.bench_with_input(BenchmarkId::new(kind.mnemonic(), size), &data, |b, data| {
                b.iter(|| {
                    let mut ctx = HashContext::new(kind);
                    ctx.update(black_box(data));
                    ctx.finish()
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_update);
criterion_main!(benches);
