//! # Synapse - Feed-Forward Neural Network Engine
//!
//! Synapse is a classical multi-layer perceptron engine built around an
//! explicit node-and-link graph. Links may skip layers and can be edited
//! one at a time, so topologies beyond the standard fully-connected stack
//! are first-class. Four training algorithms share one epoch driver:
//! online and batch backpropagation, RProp, and Levenberg-Marquardt.
//!
//! ## Key Features
//!
//! - **Editable Topology**: Per-link wiring with layer-skipping sources
//! - **Training Algorithms**: BackProp, batch BackProp, RProp, and
//!   Levenberg-Marquardt behind a single `train` call
//! - **Nguyen-Widrow Init**: Principled weight initialization scaled to
//!   each node's transfer function and input ranges
//! - **Grouped Classification**: Winner-take-all and probabilistic
//!   classification over contiguous output groups
//! - **Persistence**: A compact versionable stream format plus bincode
//!   snapshots
//! - **Live Monitoring**: Epoch progress and abort from another thread
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use synapse::network::Network;
//! use synapse::train::PatternTable;
//!
//! // A 2-input, one-hidden-layer, 1-output perceptron, fully connected.
//! let mut net = Network::new(&[2, 3, 1], true);
//!
//! let mut patterns = PatternTable::new();
//! patterns.push(vec![0.0, 1.0], vec![true]);
//! patterns.push(vec![1.0, 1.0], vec![false]);
//!
//! // Train until the average squared error drops below 0.01. The
//! // callback returns true to stop.
//! net.train(patterns.len(), &patterns, |_epoch, err| err < 0.01);
//! ```
//!
//! ## Module Organization
//!
//! - [`classify`] - Grouped winner-take-all and probabilistic classification
//! - [`error`] - Error types and result handling
//! - [`initialization`] - Nguyen-Widrow and random weight initialization
//! - [`link`] - Links, link sources, and node ranges
//! - [`network`] - The layered network and its topology operations
//! - [`node`] - Individual nodes and their link lists
//! - [`serialize`] - Stream format and bincode persistence
//! - [`train`] - The four training algorithms and the epoch driver
//! - [`transfer`] - Transfer (thresholding) functions

pub mod classify;
pub mod error;
pub mod initialization;
pub mod link;
pub mod network;
pub mod node;
pub mod serialize;
pub mod train;
pub mod transfer;

#[cfg(test)]
mod tests;
