use serde::{Deserialize, Serialize};

use crate::link::{Link, LinkSource, NodeRange};
use crate::transfer::TransferKind;

/// A single computational unit: a bias, a transfer function, and an
/// exclusively owned list of incoming links.
///
/// The weighted input sum `sigma` is retained after each forward pass because
/// some transfer derivatives are expressed in terms of it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub transfer: TransferKind,
    pub bias: f32,
    #[serde(skip)]
    sigma: f64,
    #[serde(skip)]
    output: f32,
    links: Vec<Link>,
    layer: usize,
    index: usize,
}

impl Node {
    pub(crate) fn new(layer: usize, index: usize) -> Self {
        Node {
            transfer: TransferKind::default(),
            bias: 0.0,
            sigma: 0.0,
            output: 0.0,
            links: Vec::new(),
            layer,
            index,
        }
    }

    /// The node's most recent output value.
    pub fn output(&self) -> f32 {
        self.output
    }

    /// The node's most recent pre-transfer weighted input sum.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Layer the node belongs to (1 = first hidden layer).
    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Position of the node within its layer.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub(crate) fn links_mut(&mut self) -> &mut [Link] {
        &mut self.links
    }

    /// Store a freshly computed weighted sum and the transfer output derived
    /// from it.
    pub(crate) fn set_activation(&mut self, sigma: f64) {
        self.sigma = sigma;
        self.output = self.transfer.output(sigma);
    }

    /// Derivative of the transfer function at the last computed activation.
    pub(crate) fn transfer_derivative(&self) -> f32 {
        self.transfer.derivative(self.sigma, self.output)
    }

    /// Remove the `i`th link, preserving the order of the rest.
    pub(crate) fn delete_link(&mut self, i: usize) -> bool {
        if i < self.links.len() {
            self.links.remove(i);
            true
        } else {
            false
        }
    }

    /// Remove the last link whose source is `(layer, index)`.
    pub(crate) fn delete_link_from(&mut self, layer: usize, index: usize) -> bool {
        match self.find_link(layer, index) {
            Some(i) => self.delete_link(i),
            None => false,
        }
    }

    /// Position of the last link from `(layer, index)`, searching from the
    /// end of the list.
    pub(crate) fn find_link(&self, layer: usize, index: usize) -> Option<usize> {
        let wanted = if layer == 0 {
            LinkSource::Input(index)
        } else {
            LinkSource::Node { layer, index }
        };
        self.links.iter().rposition(|link| link.source == wanted)
    }

    pub(crate) fn push_link(&mut self, link: Link) {
        self.links.push(link);
    }

    /// Replace the entire link list with zero-weight links covering the given
    /// source ranges (validated by the caller). The new list is fully built
    /// before the old one is discarded. Returns the change in link count.
    pub(crate) fn set_links(&mut self, src_ranges: &[NodeRange]) -> isize {
        let total: usize = src_ranges.iter().map(NodeRange::len).sum();
        let mut links = Vec::with_capacity(total);
        for range in src_ranges {
            for i in range.first..=range.last {
                let source = if range.layer == 0 {
                    LinkSource::Input(i)
                } else {
                    LinkSource::Node {
                        layer: range.layer,
                        index: i,
                    }
                };
                links.push(Link::new(source, 0.0));
            }
        }
        let delta = total as isize - self.links.len() as isize;
        self.links = links;
        delta
    }

    /// Copy another node's link list wholesale. Returns the change in link
    /// count.
    pub(crate) fn copy_links(&mut self, template: &Node) -> isize {
        let delta = template.links.len() as isize - self.links.len() as isize;
        self.links = template.links.clone();
        delta
    }
}
