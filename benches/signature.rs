use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use truvideo_core::auth::{sign_payload, verify_signature, AuthEngine, LocalAuthEngine, LocalEngineSettings, PendingPayload};

fn bench_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature");
    let secret = b"bench-secret-0123456789";

    for &len in &[64usize, 1024usize] {
        let payload = "p".repeat(len);
        let sig = sign_payload(secret, &payload);
        group.throughput(Throughput::Bytes(len as u64));

        group.bench_with_input(BenchmarkId::new("sign", len), &payload, |b, p| {
            b.iter(|| criterion::black_box(sign_payload(secret, p)));
        });

        group.bench_with_input(BenchmarkId::new("verify", len), &payload, |b, p| {
            b.iter(|| criterion::black_box(verify_signature(secret, p, &sig)));
        });
    }
    group.finish();
}

fn bench_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload");
    group.bench_function("generate", |b| {
        b.iter(|| criterion::black_box(PendingPayload::generate()));
    });

    // Engine path includes swapping the pending payload under its lock.
    let engine = LocalAuthEngine::new(LocalEngineSettings::default());
    group.bench_function("engine_generate", |b| {
        b.iter(|| criterion::black_box(engine.generate_payload()));
    });
    group.finish();
}

criterion_group!(benches, bench_signature, bench_payload);
criterion_main!(benches);
