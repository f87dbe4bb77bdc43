//! Training driver and the four optimization algorithms.
//!
//! All four algorithms share the same epoch loop: fetch each pattern, run a
//! forward/backward iteration accumulating error, then apply the epoch
//! update and report the average squared error to the caller's callback.
//! The per-algorithm state lives in side tables sized to the network, so
//! the node graph itself carries no training scratch.

mod backprop;
mod levenberg;
mod rprop;

pub(crate) use backprop::{BatchBackProp, OnlineBackProp};
pub(crate) use levenberg::LevenbergMarquardt;
pub(crate) use rprop::RProp;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::network::{Network, TrainingMethod};

/// Supplies training patterns by index. Implementations typically decode
/// patterns from some external representation; the engine caches the
/// decoded form up front when memory allows.
pub trait TrainingSource {
    /// Write the `n`th input pattern into `inputs` (length = input count).
    fn fill_inputs(&self, n: usize, inputs: &mut [f32]);
    /// Write the `n`th desired-output pattern into `desired` (length =
    /// output count), `true` meaning the output should be on.
    fn fill_desired(&self, n: usize, desired: &mut [bool]);
}

/// An in-memory training source with one input row and one desired-output
/// row per pattern.
#[derive(Clone, Debug, Default)]
pub struct PatternTable {
    inputs: Vec<Vec<f32>>,
    desired: Vec<Vec<bool>>,
}

impl PatternTable {
    pub fn new() -> Self {
        PatternTable::default()
    }

    pub fn push(&mut self, inputs: Vec<f32>, desired: Vec<bool>) {
        self.inputs.push(inputs);
        self.desired.push(desired);
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl TrainingSource for PatternTable {
    fn fill_inputs(&self, n: usize, inputs: &mut [f32]) {
        inputs.copy_from_slice(&self.inputs[n]);
    }

    fn fill_desired(&self, n: usize, desired: &mut [bool]) {
        desired.copy_from_slice(&self.desired[n]);
    }
}

/// Shared training state, readable (and abortable) from other threads
/// through a [`TrainingMonitor`].
#[derive(Debug, Default)]
pub(crate) struct TrainingProgress {
    epoch: AtomicUsize,
    patterns_remaining: AtomicUsize,
    abort: AtomicBool,
}

impl TrainingProgress {
    pub(crate) fn reset(&self) {
        self.epoch.store(0, Ordering::Relaxed);
        self.patterns_remaining.store(0, Ordering::Relaxed);
        self.abort.store(false, Ordering::Relaxed);
    }

    fn begin_epoch(&self, num_patterns: usize) {
        self.epoch.fetch_add(1, Ordering::Relaxed);
        self.patterns_remaining.store(num_patterns, Ordering::Relaxed);
    }

    fn pattern_done(&self) {
        self.patterns_remaining.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn epoch(&self) -> usize {
        self.epoch.load(Ordering::Relaxed)
    }

    pub(crate) fn abort_requested(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }
}

/// A cloneable handle for watching a training run from another thread.
/// Monitors survive the run; once training returns they keep reporting its
/// final state.
#[derive(Clone, Debug)]
pub struct TrainingMonitor {
    progress: Arc<TrainingProgress>,
}

impl TrainingMonitor {
    pub(crate) fn new(progress: Arc<TrainingProgress>) -> Self {
        TrainingMonitor { progress }
    }

    /// Epochs started so far (1 during the first epoch).
    pub fn epoch(&self) -> usize {
        self.progress.epoch.load(Ordering::Relaxed)
    }

    /// Patterns still to be processed in the current epoch.
    pub fn patterns_remaining(&self) -> usize {
        self.progress.patterns_remaining.load(Ordering::Relaxed)
    }

    /// Ask the training run to stop. Checked between patterns, so the
    /// request takes effect promptly even mid-epoch.
    pub fn request_abort(&self) {
        self.progress.abort.store(true, Ordering::Relaxed);
    }
}

/// Decoded patterns cached up front, avoiding a source round trip per
/// pattern per epoch. Built only if the allocations succeed.
struct PatternCache {
    inputs: Vec<f32>,
    desired: Vec<bool>,
    num_inputs: usize,
    num_outputs: usize,
}

impl PatternCache {
    fn build(
        num_patterns: usize,
        num_inputs: usize,
        num_outputs: usize,
        source: &impl TrainingSource,
    ) -> Option<Self> {
        let in_len = num_patterns.checked_mul(num_inputs)?;
        let out_len = num_patterns.checked_mul(num_outputs)?;
        let mut inputs: Vec<f32> = Vec::new();
        let mut desired: Vec<bool> = Vec::new();
        inputs.try_reserve_exact(in_len).ok()?;
        desired.try_reserve_exact(out_len).ok()?;
        inputs.resize(in_len, 0.0);
        desired.resize(out_len, false);
        for n in 0..num_patterns {
            source.fill_inputs(n, &mut inputs[n * num_inputs..(n + 1) * num_inputs]);
            source.fill_desired(n, &mut desired[n * num_outputs..(n + 1) * num_outputs]);
        }
        Some(PatternCache {
            inputs,
            desired,
            num_inputs,
            num_outputs,
        })
    }

    fn inputs(&self, n: usize) -> &[f32] {
        &self.inputs[n * self.num_inputs..(n + 1) * self.num_inputs]
    }

    fn desired(&self, n: usize) -> &[bool] {
        &self.desired[n * self.num_outputs..(n + 1) * self.num_outputs]
    }
}

fn fetch_pattern(
    net: &mut Network,
    cache: Option<&PatternCache>,
    source: &impl TrainingSource,
    n: usize,
    desired: &mut [bool],
) {
    match cache {
        Some(cache) => {
            net.input_mut().copy_from_slice(cache.inputs(n));
            desired.copy_from_slice(cache.desired(n));
        }
        None => {
            source.fill_inputs(n, net.input_mut());
            source.fill_desired(n, desired);
        }
    }
}

/// One training algorithm's per-pattern and per-epoch steps. The driver in
/// [`run_epochs`] owns the loop structure.
pub(crate) trait Algorithm {
    /// Forward and backward pass for the pattern currently loaded into the
    /// network's input buffer. Returns the pattern's summed squared error.
    fn iterate(&mut self, net: &mut Network, desired: &[bool]) -> f64;

    /// Apply accumulated updates at the end of an epoch. Online algorithms
    /// update during [`iterate`](Algorithm::iterate) and leave this empty.
    fn process_epoch(&mut self, _net: &mut Network, _last_avg_err: f64, _avg_err: f64) {}

    /// Divisor turning an epoch's total squared error into the average
    /// reported to the callback.
    fn error_denominator(&self, net: &Network, num_patterns: usize) -> f64 {
        (net.num_outputs() * num_patterns) as f64
    }
}

fn run_epochs<A: Algorithm>(
    net: &mut Network,
    alg: &mut A,
    num_patterns: usize,
    source: &impl TrainingSource,
    on_epoch: &mut dyn FnMut(usize, f64) -> bool,
) {
    let cache = PatternCache::build(num_patterns, net.num_inputs(), net.num_outputs(), source);
    let mut desired = vec![false; net.num_outputs()];
    let denominator = alg.error_denominator(net, num_patterns);
    let progress = Arc::clone(&net.progress);
    let mut last_avg = f64::MAX;
    loop {
        progress.begin_epoch(num_patterns);
        let mut total = 0.0;
        for n in 0..num_patterns {
            if progress.abort_requested() {
                break;
            }
            fetch_pattern(net, cache.as_ref(), source, n, &mut desired);
            total += alg.iterate(net, &desired);
            progress.pattern_done();
        }
        if progress.abort_requested() {
            break;
        }
        let avg = total / denominator;
        alg.process_epoch(net, last_avg, avg);
        last_avg = avg;
        if progress.abort_requested() {
            break;
        }
        if on_epoch(progress.epoch(), avg) {
            break;
        }
    }
}

impl Network {
    /// Train on `num_patterns` patterns from `source` with the algorithm
    /// selected in [`options`](Network::options). After every epoch,
    /// `on_epoch` receives the epoch number and the average squared error;
    /// returning `true` ends the run. The epoch counter and abort flag are
    /// reset on entry.
    pub fn train(
        &mut self,
        num_patterns: usize,
        source: &impl TrainingSource,
        mut on_epoch: impl FnMut(usize, f64) -> bool,
    ) {
        self.progress.reset();
        match self.options.method {
            TrainingMethod::BackProp => {
                let mut alg = OnlineBackProp::new(self);
                run_epochs(self, &mut alg, num_patterns, source, &mut on_epoch);
            }
            TrainingMethod::BatchBackProp => {
                let mut alg = BatchBackProp::new(self);
                run_epochs(self, &mut alg, num_patterns, source, &mut on_epoch);
            }
            TrainingMethod::RProp => {
                let mut alg = RProp::new(self);
                run_epochs(self, &mut alg, num_patterns, source, &mut on_epoch);
            }
            TrainingMethod::LevenbergMarquardt => {
                let mut alg = LevenbergMarquardt::new(self);
                run_epochs(self, &mut alg, num_patterns, source, &mut on_epoch);
            }
        }
    }

    /// Measure the network's average squared error over `num_patterns`
    /// patterns without changing any weights. Honors a pending abort
    /// request, normalizing by the patterns actually processed; returns 1.0
    /// if none were.
    pub fn measure_error(
        &mut self,
        num_patterns: usize,
        source: &impl TrainingSource,
    ) -> f64 {
        let mut desired = vec![false; self.num_outputs()];
        let mut total = 0.0;
        let mut processed = 0usize;
        for n in 0..num_patterns {
            if self.progress.abort_requested() {
                break;
            }
            source.fill_inputs(n, self.input_mut());
            source.fill_desired(n, &mut desired);
            self.feed_forward();
            if let Some(layer) = self.nodes.last() {
                for (node, &on) in layer.iter().zip(desired.iter()) {
                    let err = self.target_error(node.output(), on);
                    total += err * err;
                }
            }
            processed += 1;
        }
        if processed > 0 {
            total / (self.num_outputs() * processed) as f64
        } else {
            1.0
        }
    }
}
