use serde::{Deserialize, Serialize};

/// Where a link draws its value from: an input slot of the network, or the
/// output of a node in a strictly lower layer.
///
/// Sources are index-based and resolved through the owning [`Network`] at
/// evaluation time, so topology edits can never leave a link dangling.
///
/// [`Network`]: crate::network::Network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkSource {
    /// Input slot `i` of the network's input buffer (layer 0).
    Input(usize),
    /// Node `index` within `layer` (1-based; layer 0 holds no nodes).
    Node { layer: usize, index: usize },
}

impl LinkSource {
    /// The `(layer, index)` coordinates of the source, with layer 0 encoding
    /// an input slot. This is the representation used by the stream format.
    pub fn coordinates(self) -> (usize, usize) {
        match self {
            LinkSource::Input(i) => (0, i),
            LinkSource::Node { layer, index } => (layer, index),
        }
    }
}

/// A directed, weighted edge leading into a node.
///
/// A link is exclusively owned by its destination node; it only references
/// its source.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Link {
    pub weight: f32,
    pub source: LinkSource,
}

impl Link {
    pub fn new(source: LinkSource, weight: f32) -> Self {
        Link { weight, source }
    }
}

/// An inclusive range of nodes within one layer. Layer 0 denotes input
/// slots, which are only valid as link *sources*.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeRange {
    pub layer: usize,
    pub first: usize,
    pub last: usize,
}

impl NodeRange {
    pub fn new(layer: usize, first: usize, last: usize) -> Self {
        NodeRange { layer, first, last }
    }

    /// Number of nodes (or input slots) covered by the range.
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }
}
