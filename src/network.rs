use std::sync::Arc;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::link::{Link, LinkSource, NodeRange};
use crate::node::Node;
use crate::train::{TrainingMonitor, TrainingProgress};
use crate::transfer::TransferKind;

/// The four interchangeable optimization algorithms the engine can train
/// with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingMethod {
    BackProp,
    BatchBackProp,
    RProp,
    LevenbergMarquardt,
}

impl TrainingMethod {
    /// Stable integer tag used by the stream format.
    pub(crate) fn index(self) -> i32 {
        match self {
            TrainingMethod::BackProp => 0,
            TrainingMethod::BatchBackProp => 1,
            TrainingMethod::RProp => 2,
            TrainingMethod::LevenbergMarquardt => 3,
        }
    }

    pub(crate) fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(TrainingMethod::BackProp),
            1 => Some(TrainingMethod::BatchBackProp),
            2 => Some(TrainingMethod::RProp),
            3 => Some(TrainingMethod::LevenbergMarquardt),
            _ => None,
        }
    }
}

/// Training hyperparameters and options, shared by all four algorithms.
///
/// `output_off` / `output_on` are the thresholds a target-off / target-on
/// output is trained against and must satisfy `output_off < output_on`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingOptions {
    pub method: TrainingMethod,
    /// Calculate weight changes as if output layer derivatives were 1 (even
    /// though they aren't). A common MLP shortcut; enabled by default.
    pub unity_output_derivatives: bool,
    /// Apply the weight-decay factor to biases as well as link weights.
    pub bias_decay: bool,
    pub output_off: f32,
    pub output_on: f32,
    /// Learning rate for the backprop variants.
    pub learning_rate: f32,
    /// Momentum term for the backprop variants.
    pub momentum: f32,
    /// Initial, minimum and maximum per-parameter step for RProp.
    pub delta0: f32,
    pub delta_min: f32,
    pub delta_max: f32,
    /// Current Levenberg-Marquardt damping term and its adaptation bounds.
    pub mu: f32,
    pub mu_min: f32,
    pub mu_inc: f32,
    pub mu_dec: f32,
    /// Weight decay, applied per epoch for the batch methods and per pattern
    /// for online backprop.
    pub weight_decay: f32,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        TrainingOptions {
            method: TrainingMethod::LevenbergMarquardt,
            unity_output_derivatives: true,
            bias_decay: false,
            output_off: 0.0,
            output_on: 1.0,
            learning_rate: 0.2,
            momentum: 0.5,
            delta0: 0.1,
            delta_min: 1e-6,
            delta_max: 50.0,
            mu: 0.3,
            mu_min: 0.001,
            mu_inc: 0.05,
            mu_dec: 0.7,
            weight_decay: 0.0,
        }
    }
}

/// Identifies whether a parameter visited by [`Network::update_parameters`]
/// is a node bias or a link weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ParamKind {
    Bias,
    Weight,
}

/// A layered feed-forward network of nodes connected by weighted links.
///
/// Layer 0 is the input buffer and holds no nodes; every link references
/// either an input slot or a node in a strictly lower layer, so the graph is
/// acyclic by construction.
#[derive(Serialize, Deserialize)]
pub struct Network {
    /// Sizes of every layer; `layer_sizes[0]` is the input count.
    pub(crate) layer_sizes: Vec<usize>,
    /// Nodes per non-input layer; `nodes[l]` holds layer `l + 1`.
    pub(crate) nodes: Vec<Vec<Node>>,
    /// The input buffer referenced by links with an input-slot source.
    pub(crate) input: Vec<f32>,
    pub(crate) num_nodes: usize,
    pub(crate) num_links: usize,
    pub options: TrainingOptions,
    #[serde(skip)]
    pub(crate) progress: Arc<TrainingProgress>,
}

impl Network {
    /// Create a multi-layer perceptron with the given layer sizes
    /// (`layer_sizes[0]` = inputs, last entry = outputs). Zero sizes are
    /// clamped to 1. When `create_links` is set, every node is wired to all
    /// nodes (or inputs) of the previous layer.
    pub fn new(layer_sizes: &[usize], create_links: bool) -> Self {
        assert!(
            layer_sizes.len() >= 2,
            "a network needs at least an input and an output layer"
        );
        let sizes: Vec<usize> = layer_sizes.iter().map(|&s| s.max(1)).collect();
        let mut nodes = Vec::with_capacity(sizes.len() - 1);
        let mut num_nodes = 0;
        for (l, &size) in sizes.iter().enumerate().skip(1) {
            let layer: Vec<Node> = (0..size).map(|n| Node::new(l, n)).collect();
            num_nodes += size;
            nodes.push(layer);
        }
        let mut net = Network {
            input: vec![0.0; sizes[0]],
            layer_sizes: sizes,
            nodes,
            num_nodes,
            num_links: 0,
            options: TrainingOptions::default(),
            progress: Arc::new(TrainingProgress::default()),
        };
        if create_links {
            net.wire_fully_connected();
        }
        net
    }

    /// An empty network, the state a failed stream load leaves behind.
    pub(crate) fn empty() -> Self {
        Network {
            layer_sizes: Vec::new(),
            nodes: Vec::new(),
            input: Vec::new(),
            num_nodes: 0,
            num_links: 0,
            options: TrainingOptions::default(),
            progress: Arc::new(TrainingProgress::default()),
        }
    }

    /// Wire every node to all nodes of the previous layer. The first node of
    /// each layer builds its link list once; the rest copy it.
    fn wire_fully_connected(&mut self) {
        let mut delta = 0isize;
        for l in 0..self.nodes.len() {
            let range = NodeRange::new(l, 0, self.layer_sizes[l] - 1);
            let layer = &mut self.nodes[l];
            delta += layer[0].set_links(std::slice::from_ref(&range));
            let (head, tail) = layer.split_at_mut(1);
            for node in tail.iter_mut() {
                delta += node.copy_links(&head[0]);
            }
        }
        self.num_links = (self.num_links as isize + delta) as usize;
    }

    // ---- inspection -------------------------------------------------------

    /// Total number of layers, counting the input layer.
    pub fn num_layers(&self) -> usize {
        self.layer_sizes.len()
    }

    pub fn num_inputs(&self) -> usize {
        self.layer_sizes.first().copied().unwrap_or(0)
    }

    pub fn num_outputs(&self) -> usize {
        self.layer_sizes.last().copied().unwrap_or(0)
    }

    /// Nodes in layer `l` (0 for the input layer and out-of-range layers).
    pub fn layer_size(&self, l: usize) -> usize {
        if l == 0 || l >= self.layer_sizes.len() {
            0
        } else {
            self.layer_sizes[l]
        }
    }

    pub fn total_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn total_links(&self) -> usize {
        self.num_links
    }

    /// Total adjustable parameters: one per link plus one bias per node.
    pub(crate) fn param_count(&self) -> usize {
        self.num_links + self.num_nodes
    }

    pub fn node(&self, layer: usize, index: usize) -> Option<&Node> {
        if layer == 0 || layer >= self.layer_sizes.len() {
            return None;
        }
        self.nodes[layer - 1].get(index)
    }

    pub fn input_value(&self, i: usize) -> f32 {
        self.input.get(i).copied().unwrap_or(0.0)
    }

    /// Output of the `i`th node in the final layer (0.0 if out of range).
    pub fn output_value(&self, i: usize) -> f32 {
        match self.nodes.last() {
            Some(layer) => layer.get(i).map(Node::output).unwrap_or(0.0),
            None => 0.0,
        }
    }

    /// All final-layer outputs as a vector.
    pub fn output_values(&self) -> Array1<f32> {
        match self.nodes.last() {
            Some(layer) => layer.iter().map(Node::output).collect(),
            None => Array1::zeros(0),
        }
    }

    /// A handle for monitoring or aborting a training run from another
    /// thread.
    pub fn monitor(&self) -> TrainingMonitor {
        TrainingMonitor::new(Arc::clone(&self.progress))
    }

    // ---- forward pass -----------------------------------------------------

    /// Copy a pattern into the input buffer. Fails if the length does not
    /// match the input count.
    pub fn set_inputs(&mut self, inputs: &[f32]) -> bool {
        if inputs.len() != self.input.len() {
            return false;
        }
        self.input.copy_from_slice(inputs);
        true
    }

    pub(crate) fn input_mut(&mut self) -> &mut [f32] {
        &mut self.input
    }

    /// Propagate the current input buffer through every layer.
    pub fn feed_forward(&mut self) {
        for l in 0..self.nodes.len() {
            let (prev, rest) = self.nodes.split_at_mut(l);
            let input = &self.input;
            for node in rest[0].iter_mut() {
                let mut sigma = node.bias as f64;
                for link in node.links() {
                    let value = match link.source {
                        LinkSource::Input(i) => input[i],
                        LinkSource::Node { layer, index } => prev[layer - 1][index].output(),
                    };
                    sigma += (link.weight * value) as f64;
                }
                node.set_activation(sigma);
            }
        }
    }

    /// Current output of a link source (input slot or lower-layer node).
    pub(crate) fn source_value(&self, source: LinkSource) -> f32 {
        match source {
            LinkSource::Input(i) => self.input[i],
            LinkSource::Node { layer, index } => self.nodes[layer - 1][index].output(),
        }
    }

    // ---- topology mutation ------------------------------------------------

    /// A destination range must name an interior layer and stay within it.
    pub(crate) fn range_ok(&self, r: NodeRange) -> bool {
        r.layer > 0
            && r.layer + 1 < self.num_layers()
            && r.first <= r.last
            && r.last < self.layer_sizes[r.layer]
    }

    /// Source ranges additionally admit the input layer.
    pub(crate) fn src_range_ok(&self, r: NodeRange) -> bool {
        r.layer + 1 < self.num_layers() && r.first <= r.last && r.last < self.layer_sizes[r.layer]
    }

    /// Add a link from `(src_layer, src_index)` into the node at
    /// `(dest_layer, dest_index)`, or overwrite the weight of an existing
    /// link from that exact source. New links go to the end of the link
    /// list. Source layer 0 denotes an input slot.
    pub fn add_or_set_link(
        &mut self,
        dest_layer: usize,
        dest_index: usize,
        src_layer: usize,
        src_index: usize,
        weight: f32,
    ) -> bool {
        if dest_layer == 0
            || dest_layer >= self.num_layers()
            || dest_index >= self.layer_sizes[dest_layer]
        {
            return false;
        }
        if src_layer >= dest_layer || src_index >= self.layer_sizes[src_layer] {
            return false;
        }
        let node = &mut self.nodes[dest_layer - 1][dest_index];
        if let Some(i) = node.find_link(src_layer, src_index) {
            node.links_mut()[i].weight = weight;
            return true;
        }
        let source = if src_layer == 0 {
            LinkSource::Input(src_index)
        } else {
            LinkSource::Node {
                layer: src_layer,
                index: src_index,
            }
        };
        node.push_link(Link::new(source, weight));
        self.num_links += 1;
        true
    }

    /// Delete the `link_index`th link of the node at
    /// `(dest_layer, dest_index)`.
    pub fn delete_link(&mut self, dest_layer: usize, dest_index: usize, link_index: usize) -> bool {
        if dest_layer == 0
            || dest_layer >= self.num_layers()
            || dest_index >= self.layer_sizes[dest_layer]
        {
            return false;
        }
        let deleted = self.nodes[dest_layer - 1][dest_index].delete_link(link_index);
        if deleted {
            self.num_links -= 1;
        }
        deleted
    }

    /// Delete the link from `(src_layer, src_index)` leading into the node
    /// at `(dest_layer, dest_index)`. If several such links exist, the last
    /// one added is removed.
    pub fn delete_link_from(
        &mut self,
        dest_layer: usize,
        dest_index: usize,
        src_layer: usize,
        src_index: usize,
    ) -> bool {
        if dest_layer == 0
            || dest_layer >= self.num_layers()
            || dest_index >= self.layer_sizes[dest_layer]
        {
            return false;
        }
        let deleted = self.nodes[dest_layer - 1][dest_index].delete_link_from(src_layer, src_index);
        if deleted {
            self.num_links -= 1;
        }
        deleted
    }

    /// Replace the incoming-link set of every node in `dest` with links from
    /// the given source ranges (zero weights). The first node of the range
    /// builds the list; the rest copy it. Returns false, leaving the network
    /// untouched, if any range is invalid or a source is not strictly below
    /// the destination layer.
    pub fn set_connectivity(&mut self, src_ranges: &[NodeRange], dest: NodeRange) -> bool {
        if !self.range_ok(dest) {
            return false;
        }
        for r in src_ranges {
            if !self.src_range_ok(*r) || r.layer >= dest.layer {
                return false;
            }
        }
        let layer = &mut self.nodes[dest.layer - 1];
        let mut delta = layer[dest.first].set_links(src_ranges);
        let (head, tail) = layer.split_at_mut(dest.first + 1);
        let template = &head[dest.first];
        for node in tail[..dest.last - dest.first].iter_mut() {
            delta += node.copy_links(template);
        }
        self.num_links = (self.num_links as isize + delta) as usize;
        true
    }

    /// Set the transfer function for a range of nodes.
    pub fn set_transfer_fn(&mut self, range: NodeRange, kind: TransferKind) -> bool {
        if !self.range_ok(range) {
            return false;
        }
        for node in self.nodes[range.layer - 1][range.first..=range.last].iter_mut() {
            node.transfer = kind;
        }
        true
    }

    /// Set the transfer function for all nodes in the given span of layers.
    pub fn set_transfer_fn_layers(
        &mut self,
        first_layer: usize,
        last_layer: usize,
        kind: TransferKind,
    ) -> bool {
        if first_layer == 0 || first_layer > last_layer || last_layer >= self.num_layers() {
            return false;
        }
        for l in first_layer..=last_layer {
            for node in self.nodes[l - 1].iter_mut() {
                node.transfer = kind;
            }
        }
        true
    }

    /// Set the transfer function for every node in the network.
    pub fn set_transfer_fn_all(&mut self, kind: TransferKind) {
        self.set_transfer_fn_layers(1, self.num_layers() - 1, kind);
    }

    // ---- training support -------------------------------------------------

    /// Signed distance from an output to the threshold it is trained
    /// against, or zero if it is already on the correct side.
    pub(crate) fn target_error(&self, output: f32, desired: bool) -> f64 {
        if desired {
            if output >= self.options.output_on {
                0.0
            } else {
                (output - self.options.output_on) as f64
            }
        } else if output <= self.options.output_off {
            0.0
        } else {
            (output - self.options.output_off) as f64
        }
    }

    /// A per-node scratch table mirroring the node layout.
    pub(crate) fn node_table<T: Clone>(&self, fill: T) -> Vec<Vec<T>> {
        self.nodes
            .iter()
            .map(|layer| vec![fill.clone(); layer.len()])
            .collect()
    }

    /// Visit every adjustable parameter mutably, in canonical order: layers
    /// last to first, nodes within a layer in descending index order, each
    /// node's bias before its links. This matches the descending flat
    /// parameter index the training algorithms accumulate under.
    pub(crate) fn update_parameters(&mut self, mut f: impl FnMut(ParamKind, &mut f32)) {
        for layer in self.nodes.iter_mut().rev() {
            for node in layer.iter_mut().rev() {
                f(ParamKind::Bias, &mut node.bias);
                for link in node.links_mut() {
                    f(ParamKind::Weight, &mut link.weight);
                }
            }
        }
    }
}

impl Clone for Network {
    /// Deep-copies the whole node/link graph. The clone gets a fresh
    /// progress handle; monitors attached to the original keep watching the
    /// original only.
    fn clone(&self) -> Self {
        Network {
            layer_sizes: self.layer_sizes.clone(),
            nodes: self.nodes.clone(),
            input: self.input.clone(),
            num_nodes: self.num_nodes,
            num_links: self.num_links,
            options: self.options.clone(),
            progress: Arc::new(TrainingProgress::default()),
        }
    }
}
