use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lending_risk_monitor::services::risk_scorer::{fallback_assessment, loan_to_value};

fn bench_fallback_assessment(c: &mut Criterion) {
    c.bench_function("fallback_assessment_critical", |b| {
        b.iter(|| {
            fallback_assessment(
                black_box(0.83),
                black_box(900.0),
                black_box(1000.0),
                black_box(70.0),
            )
        })
    });

    c.bench_function("fallback_assessment_healthy", |b| {
        b.iter(|| {
            fallback_assessment(
                black_box(3.75),
                black_box(200.0),
                black_box(1000.0),
                black_box(70.0),
            )
        })
    });

    c.bench_function("loan_to_value", |b| {
        b.iter(|| loan_to_value(black_box(900.0), black_box(1000.0)))
    });
}

criterion_group!(benches, bench_fallback_assessment);
criterion_main!(benches);
