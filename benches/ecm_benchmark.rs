use criterion::{black_box, criterion_group, criterion_main, Criterion};
use intfact::{ecm, CancelToken, LcgRandom};
use rug::Integer;

pub fn ecm_f6_benchmark(c: &mut Criterion) {
    let fermat = Integer::from(Integer::u_pow_u(2, 64)) + 1;
    let ctx = CancelToken::new();
    c.bench_function("ecm F_6", |b| {
        b.iter(|| {
            let mut rng = LcgRandom::new(14);
            ecm(
                black_box(&ctx),
                &mut rng,
                black_box(&fermat),
                black_box(1000),
                black_box(10000),
            )
        })
    });
}

criterion_group!(benches, ecm_f6_benchmark);
criterion_main!(benches);
