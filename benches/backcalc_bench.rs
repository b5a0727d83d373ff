use criterion::{criterion_group, criterion_main, Criterion};
use chespi::labels::{parse_ss8, Ss8};
use chespi::model::likelihood::LocalLikelihoodEvaluator;
use chespi::model::loader::Observation;
use chespi::model::{ModelBuildParams, ShiftModel};
use std::hint::black_box;

const UNIT_SEQ: &str = "MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQ";
const UNIT_SS: &str = "--HHHHHHHHHHH----EEEEE--EEEEE----";
const REPEATS: usize = 6;

fn setup_model() -> ShiftModel {
    let sequence = UNIT_SEQ.repeat(REPEATS);
    // Smooth fake projections; only the cost of scoring matters here
    let observations = (1..=sequence.len())
        .map(|resi| Observation {
            resi,
            aa: None,
            pc1: (resi as f64 * 0.3).sin() * 4.0,
            pc2: (resi as f64 * 0.7).cos() * 3.0,
            zscore: None,
        })
        .collect();

    ModelBuildParams::builder()
        .sequence(sequence)
        .observations(observations)
        .build()
        .build_model()
        .unwrap()
}

fn bench_evaluation(c: &mut Criterion) {
    let model = setup_model();
    let labels = parse_ss8(&UNIT_SS.repeat(REPEATS)).unwrap();
    let eval = LocalLikelihoodEvaluator::new(&model);
    let cached = eval.evaluate_full(&labels);
    let mid = labels.len() / 2;

    c.bench_function("full_evaluation", |b| {
        b.iter(|| eval.evaluate_full(black_box(&labels)))
    });

    c.bench_function("window_point_edit", |b| {
        b.iter(|| {
            eval.evaluate(
                black_box(&labels),
                &cached.log_post,
                black_box(mid),
                &[Ss8::Turn],
            )
        })
    });

    let three_ten = [Ss8::ThreeTen; 3];
    c.bench_function("window_three_residue_edit", |b| {
        b.iter(|| {
            eval.evaluate(
                black_box(&labels),
                &cached.log_post,
                black_box(mid),
                &three_ten,
            )
        })
    });
}

criterion_group!(benches, bench_evaluation);
criterion_main!(benches);
