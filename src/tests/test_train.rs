use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::initialization::UnitInputs;
use crate::network::{Network, TrainingMethod};
use crate::train::{PatternTable, TrainingMonitor, TrainingSource};

/// A trivially separable task: the output should be on iff the input is
/// high. Any of the four algorithms should crack this quickly.
fn step_task() -> PatternTable {
    let mut patterns = PatternTable::new();
    patterns.push(vec![-1.0], vec![false]);
    patterns.push(vec![1.0], vec![true]);
    patterns
}

fn trained_net(method: TrainingMethod, epochs: usize) -> (Network, f64) {
    let mut net = Network::new(&[1, 2, 1], true);
    let mut rng = StdRng::seed_from_u64(17);
    net.nguyen_widrow_init_layers(1, 2, &UnitInputs, &mut rng);
    net.options.method = method;
    let patterns = step_task();
    let before = net.measure_error(patterns.len(), &patterns);
    net.train(patterns.len(), &patterns, |epoch, _err| epoch >= epochs);
    (net, before)
}

#[test]
fn test_backprop_learns_the_step_task() {
    let (mut net, before) = trained_net(TrainingMethod::BackProp, 500);
    let patterns = step_task();
    let after = net.measure_error(patterns.len(), &patterns);
    assert!(after < before, "error went from {before} to {after}");
    assert!(after < 0.05, "error still {after} after training");
}

#[test]
fn test_batch_backprop_learns_the_step_task() {
    let (mut net, before) = trained_net(TrainingMethod::BatchBackProp, 1000);
    let patterns = step_task();
    let after = net.measure_error(patterns.len(), &patterns);
    assert!(after < before);
    assert!(after < 0.05);
}

#[test]
fn test_rprop_learns_the_step_task() {
    let (mut net, before) = trained_net(TrainingMethod::RProp, 200);
    let patterns = step_task();
    let after = net.measure_error(patterns.len(), &patterns);
    assert!(after < before);
    assert!(after < 0.05);
}

#[test]
fn test_levenberg_marquardt_learns_the_step_task() {
    let (mut net, before) = trained_net(TrainingMethod::LevenbergMarquardt, 200);
    let patterns = step_task();
    let after = net.measure_error(patterns.len(), &patterns);
    assert!(after < before);
    assert!(after < 0.05);
}

#[test]
fn test_callback_stops_training() {
    let mut net = Network::new(&[1, 2, 1], true);
    let patterns = step_task();
    let mut calls = 0;
    net.train(patterns.len(), &patterns, |epoch, _err| {
        calls += 1;
        epoch >= 3
    });
    assert_eq!(calls, 3);
    assert_eq!(net.monitor().epoch(), 3);
    assert_eq!(net.monitor().patterns_remaining(), 0);
}

#[test]
fn test_abort_request_ends_the_run_without_a_callback() {
    let mut net = Network::new(&[1, 2, 1], true);
    let monitor = net.monitor();
    let patterns = step_task();
    let mut calls = 0;
    net.train(patterns.len(), &patterns, |_epoch, _err| {
        calls += 1;
        monitor.request_abort();
        false
    });
    // The abort lands at the start of the second epoch, before its
    // callback would run.
    assert_eq!(calls, 1);
    assert_eq!(monitor.epoch(), 2);
}

/// Raises the abort flag while serving the very first pattern, so the
/// epoch can never complete.
struct AbortingSource {
    inner: PatternTable,
    monitor: TrainingMonitor,
}

impl TrainingSource for AbortingSource {
    fn fill_inputs(&self, n: usize, inputs: &mut [f32]) {
        self.monitor.request_abort();
        self.inner.fill_inputs(n, inputs);
    }

    fn fill_desired(&self, n: usize, desired: &mut [bool]) {
        self.inner.fill_desired(n, desired);
    }
}

#[test]
fn test_abort_mid_epoch_leaves_batch_parameters_unchanged() {
    for method in [
        TrainingMethod::BatchBackProp,
        TrainingMethod::RProp,
        TrainingMethod::LevenbergMarquardt,
    ] {
        let mut net = Network::new(&[1, 2, 1], true);
        let mut rng = StdRng::seed_from_u64(31);
        net.nguyen_widrow_init_layers(1, 2, &UnitInputs, &mut rng);
        net.options.method = method;
        // The stream snapshot covers every weight, bias and option,
        // including mu.
        let mut before = Vec::new();
        net.save_to_stream(&mut before).unwrap();

        let source = AbortingSource {
            inner: step_task(),
            monitor: net.monitor(),
        };
        net.train(2, &source, |_epoch, _err| false);

        let mut after = Vec::new();
        net.save_to_stream(&mut after).unwrap();
        assert_eq!(before, after, "{method:?} changed parameters in an aborted epoch");
    }
}

#[test]
fn test_training_reports_decreasing_error_stream() {
    let mut net = Network::new(&[1, 2, 1], true);
    let mut rng = StdRng::seed_from_u64(5);
    net.nguyen_widrow_init_layers(1, 2, &UnitInputs, &mut rng);
    net.options.method = TrainingMethod::RProp;
    let patterns = step_task();
    let mut errors = Vec::new();
    net.train(patterns.len(), &patterns, |epoch, err| {
        errors.push(err);
        epoch >= 100
    });
    assert_eq!(errors.len(), 100);
    let first = errors[0];
    let last = *errors.last().unwrap();
    assert!(last <= first, "error rose from {first} to {last}");
    for &e in &errors {
        assert!(e.is_finite() && e >= 0.0);
    }
}

#[test]
fn test_measure_error_without_patterns_is_one() {
    let mut net = Network::new(&[1, 2, 1], true);
    let patterns = PatternTable::new();
    assert_eq!(net.measure_error(0, &patterns), 1.0);
}

#[test]
fn test_training_changes_weights() {
    for method in [
        TrainingMethod::BackProp,
        TrainingMethod::BatchBackProp,
        TrainingMethod::RProp,
        TrainingMethod::LevenbergMarquardt,
    ] {
        let mut net = Network::new(&[1, 2, 1], true);
        let mut rng = StdRng::seed_from_u64(23);
        net.nguyen_widrow_init_layers(1, 2, &UnitInputs, &mut rng);
        net.options.method = method;
        let patterns = step_task();
        let before = outputs(&mut net);
        net.train(patterns.len(), &patterns, |epoch, _| epoch >= 5);
        let after = outputs(&mut net);
        assert_ne!(before, after, "{method:?} left the network untouched");
    }
}

fn outputs(net: &mut Network) -> Vec<f32> {
    net.set_inputs(&[1.0]);
    net.feed_forward();
    net.output_values().to_vec()
}
