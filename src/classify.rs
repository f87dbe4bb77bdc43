//! Winner-take-all and probabilistic classification over grouped outputs.
//!
//! Output nodes are partitioned into contiguous groups, each classifying an
//! independent property of the input pattern. Group sizes are caller
//! supplied; a call only succeeds when the sizes tile the output layer
//! exactly, but every group that fits is still classified before a mismatch
//! is reported.

use crate::network::Network;

impl Network {
    /// Classify `inputs` treating the whole output layer as one group.
    /// Returns the index of the strongest output, with ties resolved toward
    /// the higher index. `None` if the input length is wrong or the network
    /// is empty.
    pub fn classify(&mut self, inputs: &[f32]) -> Option<usize> {
        let outputs = self.num_outputs();
        if outputs == 0 {
            return None;
        }
        // classify_groups validates and copies the inputs itself; on a
        // length mismatch the slot is left at None.
        let mut classes = [None];
        self.classify_groups(inputs, &[outputs], &mut classes);
        classes[0]
    }

    /// Classify `inputs` into one winner per output group. `sizes[n]` is the
    /// width of the `n`th group and `classes[n]` receives the in-group index
    /// of its strongest output (ties toward the higher index), or `None` for
    /// an empty group.
    ///
    /// Returns `false` if the input length is wrong, the sizes overrun the
    /// output layer, or they fail to cover it completely. Groups preceding
    /// an overrun are classified regardless.
    pub fn classify_groups(
        &mut self,
        inputs: &[f32],
        sizes: &[usize],
        classes: &mut [Option<usize>],
    ) -> bool {
        assert!(classes.len() >= sizes.len(), "one class slot per group");
        if !self.set_inputs(inputs) {
            return false;
        }
        self.feed_forward();
        let output_layer = match self.nodes.last() {
            Some(layer) => layer,
            None => return false,
        };
        let mut remaining = output_layer.len();
        let mut base = 0;
        for (n, &size) in sizes.iter().enumerate() {
            if remaining < size {
                return false;
            }
            let mut class = None;
            let mut max_val = f32::NEG_INFINITY;
            for i in 0..size {
                let out = output_layer[base + i].output();
                if out >= max_val {
                    max_val = out;
                    class = Some(i);
                }
            }
            classes[n] = class;
            base += size;
            remaining -= size;
        }
        remaining == 0
    }

    /// Estimate a probability distribution over each output group for the
    /// given input pattern. `probabilities` is filled group by group, one
    /// slot per output node, so its length must be at least the sum of
    /// `sizes`.
    ///
    /// Outputs are shifted by the off threshold and clamped to the on/off
    /// span. If the clamped values of a group sum to less than the span, the
    /// shortfall is distributed equally across the group before normalizing,
    /// so every group always sums to exactly 1. Empty groups occupy no
    /// slots. Returns `false` on the same mismatches as
    /// [`classify_groups`](Network::classify_groups).
    pub fn classify_probabilities(
        &mut self,
        inputs: &[f32],
        sizes: &[usize],
        probabilities: &mut [f64],
    ) -> bool {
        if !self.set_inputs(inputs) {
            return false;
        }
        self.feed_forward();
        let output_layer = match self.nodes.last() {
            Some(layer) => layer,
            None => return false,
        };
        let off = self.options.output_off as f64;
        let mut span = (self.options.output_on - self.options.output_off) as f64;
        if span <= 0.0 {
            // Degenerate thresholds; keep the math finite and non-negative.
            span = 1.0;
        }
        let mut remaining = output_layer.len();
        let mut base = 0;
        for &size in sizes {
            if size == 0 {
                continue;
            }
            if remaining < size {
                return false;
            }
            let clamped = |i: usize| {
                let v = output_layer[base + i].output() as f64 - off;
                v.clamp(0.0, span)
            };
            let mut total: f64 = (0..size).map(clamped).sum();
            let add = if total >= span {
                0.0
            } else {
                let add = (span - total) / size as f64;
                total = span;
                add
            };
            for i in 0..size {
                probabilities[base + i] = (clamped(i) + add) / total;
            }
            base += size;
            remaining -= size;
        }
        remaining == 0
    }
}
