//! Per-epoch cost of the four training algorithms on a common task,
//! plus the raw forward-pass rate.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use synapse::initialization::UnitInputs;
use synapse::network::{Network, TrainingMethod};
use synapse::train::PatternTable;

fn make_patterns(num_inputs: usize, num_outputs: usize, count: usize, seed: u64) -> PatternTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut patterns = PatternTable::new();
    for _ in 0..count {
        let inputs: Vec<f32> = (0..num_inputs).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let desired: Vec<bool> = (0..num_outputs).map(|_| rng.gen_bool(0.5)).collect();
        patterns.push(inputs, desired);
    }
    patterns
}

fn make_network(layer_sizes: &[usize], seed: u64) -> Network {
    let mut net = Network::new(layer_sizes, true);
    let mut rng = StdRng::seed_from_u64(seed);
    net.nguyen_widrow_init_layers(1, layer_sizes.len() - 1, &UnitInputs, &mut rng);
    net
}

fn bench_training_epoch(c: &mut Criterion) {
    let layer_sizes = [8, 16, 4];
    let patterns = make_patterns(8, 4, 64, 7);

    let mut group = c.benchmark_group("training_epoch");
    for method in [
        TrainingMethod::BackProp,
        TrainingMethod::BatchBackProp,
        TrainingMethod::RProp,
        TrainingMethod::LevenbergMarquardt,
    ] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{method:?}")),
            &method,
            |b, &method| {
                b.iter(|| {
                    let mut net = make_network(&layer_sizes, 7);
                    net.options.method = method;
                    net.train(patterns.len(), &patterns, |epoch, _| epoch >= 1);
                    black_box(net.output_value(0))
                });
            },
        );
    }
    group.finish();
}

fn bench_feed_forward(c: &mut Criterion) {
    let mut net = make_network(&[8, 16, 16, 4], 7);
    let mut rng = StdRng::seed_from_u64(11);
    let inputs: Vec<f32> = (0..8).map(|_| rng.gen_range(-1.0..1.0)).collect();

    c.bench_function("feed_forward", |b| {
        b.iter(|| {
            net.set_inputs(black_box(&inputs));
            net.feed_forward();
            black_box(net.output_value(0))
        });
    });
}

fn bench_measure_error(c: &mut Criterion) {
    let mut net = make_network(&[8, 16, 4], 7);
    let patterns = make_patterns(8, 4, 64, 7);

    c.bench_function("measure_error_64_patterns", |b| {
        b.iter(|| black_box(net.measure_error(patterns.len(), &patterns)));
    });
}

criterion_group!(
    benches,
    bench_training_epoch,
    bench_feed_forward,
    bench_measure_error
);
criterion_main!(benches);
