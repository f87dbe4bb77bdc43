//! Nguyen-Widrow and random weight initialization.
//!
//! Both schemes draw uniform weights, rescale each one by the range of its
//! source, and normalize the node's weight vector to a magnitude matched to
//! the active sigma range of its transfer function. Nguyen-Widrow
//! additionally grows the magnitude with layer size and spreads node biases
//! across the active region so the nodes start out dividing the input space
//! between them.

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::link::{LinkSource, NodeRange};
use crate::network::Network;
use crate::node::Node;

/// Per-element statistics of the training inputs, used to scale initial
/// weights so each source contributes comparably.
pub trait InputStats {
    /// The minimum, maximum and average value of the `i`th input element.
    fn input_range(&self, i: usize) -> (f32, f32, f32);
}

/// Stats for inputs already normalized to `[-1, 1]` with zero mean. With
/// these, no per-input rescaling takes place.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnitInputs;

impl InputStats for UnitInputs {
    fn input_range(&self, _i: usize) -> (f32, f32, f32) {
        (-1.0, 1.0, 0.0)
    }
}

impl Network {
    /// Initialize weights and biases of the nodes in `range` with the
    /// Nguyen-Widrow scheme. Fails on an invalid range.
    pub fn nguyen_widrow_init(
        &mut self,
        range: NodeRange,
        stats: &impl InputStats,
        rng: &mut impl Rng,
    ) -> bool {
        if !self.range_ok(range) {
            return false;
        }
        self.init_range(range, stats, rng, true);
        true
    }

    /// Nguyen-Widrow initialization for every node in the given span of
    /// layers. Unlike the range variant this admits the output layer.
    pub fn nguyen_widrow_init_layers(
        &mut self,
        first_layer: usize,
        last_layer: usize,
        stats: &impl InputStats,
        rng: &mut impl Rng,
    ) -> bool {
        if first_layer == 0 || first_layer > last_layer || last_layer >= self.num_layers() {
            return false;
        }
        for l in first_layer..=last_layer {
            let range = NodeRange::new(l, 0, self.layer_sizes[l] - 1);
            self.init_range(range, stats, rng, true);
        }
        true
    }

    /// Random initialization for the nodes in `range`: Nguyen-Widrow without
    /// the layer-size scaling and bias spreading.
    pub fn random_init(
        &mut self,
        range: NodeRange,
        stats: &impl InputStats,
        rng: &mut impl Rng,
    ) -> bool {
        if !self.range_ok(range) {
            return false;
        }
        self.init_range(range, stats, rng, false);
        true
    }

    /// Random initialization for every node in the given span of layers.
    pub fn random_init_layers(
        &mut self,
        first_layer: usize,
        last_layer: usize,
        stats: &impl InputStats,
        rng: &mut impl Rng,
    ) -> bool {
        if first_layer == 0 || first_layer > last_layer || last_layer >= self.num_layers() {
            return false;
        }
        for l in first_layer..=last_layer {
            let range = NodeRange::new(l, 0, self.layer_sizes[l] - 1);
            self.init_range(range, stats, rng, false);
        }
        true
    }

    fn init_range(
        &mut self,
        range: NodeRange,
        stats: &impl InputStats,
        rng: &mut impl Rng,
        position_adjust: bool,
    ) {
        let layer_size = self.layer_sizes[range.layer];
        // Link sources live strictly below the layer being initialized.
        let (lower, rest) = self.nodes.split_at_mut(range.layer - 1);
        for node in rest[0][range.first..=range.last].iter_mut() {
            init_node(lower, node, layer_size, stats, rng, position_adjust);
        }
    }
}

fn init_node(
    lower: &[Vec<Node>],
    node: &mut Node,
    layer_size: usize,
    stats: &impl InputStats,
    rng: &mut impl Rng,
    position_adjust: bool,
) {
    // Links with constant sources carry no information; they get zero weight
    // and drop out of the effective fan-in.
    let mut fan_in = node.num_links();
    let mut bias_offset = 0.0f64;
    let mut weight_sum_sqrs = 0.0f64;
    let mut bias_sign: Option<f32> = None;
    let dist = Uniform::new_inclusive(-1.0f64, 1.0);

    for link in node.links_mut() {
        let (min, max, avrg) = match link.source {
            LinkSource::Input(i) => stats.input_range(i),
            LinkSource::Node { layer, index } => {
                let (lo, hi) = lower[layer - 1][index].transfer.output_range();
                (lo, hi, 0.5 * (lo + hi))
            }
        };
        if max == min {
            link.weight = 0.0;
            fan_in -= 1;
            continue;
        }
        let mut w = dist.sample(rng);
        // The vector magnitude is taken before per-source rescaling.
        weight_sum_sqrs += w * w;
        w *= (2.0f32 / (max - min)) as f64;
        bias_offset += avrg as f64 * w;
        if bias_sign.is_none() {
            // The spread direction follows the first non-constant link.
            bias_sign = Some(if w > 0.0 {
                1.0
            } else if w < 0.0 {
                -1.0
            } else {
                0.0
            });
        }
        link.weight = w as f32;
    }

    let (lo, hi) = node.transfer.active_sigma_range();
    // Center the expected sigma within the active region.
    node.bias = ((0.5f32 * (hi + lo)) as f64 - bias_offset) as f32;
    if fan_in == 0 {
        return;
    }
    let mut w_mag = 0.35f32 * (hi - lo);
    if position_adjust && layer_size > 1 {
        w_mag *= (layer_size as f64).powf(1.0 / fan_in as f64) as f32;
        let pos = ((2 * node.index()) as f32 / (layer_size - 1) as f32) - 1.0;
        node.bias += bias_sign.unwrap_or(0.0) * w_mag * pos;
    }
    let scale = (w_mag as f64 / weight_sum_sqrs.sqrt()) as f32;
    for link in node.links_mut() {
        link.weight *= scale;
    }
}
