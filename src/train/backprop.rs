//! Online and batch backpropagation with momentum and weight decay.

use super::Algorithm;
use crate::link::LinkSource;
use crate::network::{Network, ParamKind};

/// Reset the per-node error table and seed the output layer with the
/// pattern's errors. Returns the pattern's summed squared error.
fn seed_output_errors(net: &Network, desired: &[bool], err: &mut [Vec<f64>]) -> f64 {
    let last = err.len() - 1;
    for layer in err[..last].iter_mut() {
        for e in layer.iter_mut() {
            *e = 0.0;
        }
    }
    let mut result = 0.0;
    for ((e, node), &on) in err[last]
        .iter_mut()
        .zip(net.nodes[last].iter())
        .zip(desired.iter())
    {
        let t = net.target_error(node.output(), on);
        *e = t;
        result += t * t;
    }
    result
}

/// Forward pass plus gradient accumulation into `dw`, shared by batch
/// backprop and RProp. `err[l][n]` holds d(err²)/d(output) for the node,
/// scaled to d/d(sigma) as the backward sweep reaches its layer.
pub(super) fn batch_iterate(
    net: &mut Network,
    desired: &[bool],
    err: &mut [Vec<f64>],
    dw: &mut [f64],
) -> f64 {
    net.feed_forward();
    let result = seed_output_errors(net, desired, err);
    let unity = net.options.unity_output_derivatives;
    let last = net.nodes.len() - 1;
    let mut p = dw.len();
    for l in (0..=last).rev() {
        let (lower_err, rest_err) = err.split_at_mut(l);
        let layer = &net.nodes[l];
        for n in (0..layer.len()).rev() {
            let node = &layer[n];
            let mut delta = rest_err[0][n];
            if l != last || !unity {
                delta *= node.transfer_derivative() as f64;
            }
            p -= 1;
            dw[p] -= delta;
            for link in node.links() {
                if let LinkSource::Node { layer: sl, index } = link.source {
                    lower_err[sl - 1][index] += delta * link.weight as f64;
                }
                p -= 1;
                dw[p] -= delta * net.source_value(link.source) as f64;
            }
        }
    }
    result
}

/// Stochastic backprop: weights move after every pattern, with the
/// momentum memory indexed the same way as the parameter walk.
pub(crate) struct OnlineBackProp {
    err: Vec<Vec<f64>>,
    prev_dw: Vec<f32>,
}

impl OnlineBackProp {
    pub(crate) fn new(net: &Network) -> Self {
        OnlineBackProp {
            err: net.node_table(0.0f64),
            prev_dw: vec![0.0; net.param_count()],
        }
    }
}

impl Algorithm for OnlineBackProp {
    fn iterate(&mut self, net: &mut Network, desired: &[bool]) -> f64 {
        net.feed_forward();
        let result = seed_output_errors(net, desired, &mut self.err);
        let lr = net.options.learning_rate as f64;
        let momentum = net.options.momentum;
        let decay = 1.0 - net.options.weight_decay;
        let bias_decay = net.options.bias_decay;
        let unity = net.options.unity_output_derivatives;
        let last = net.nodes.len() - 1;
        let mut p = net.param_count();
        for l in (0..=last).rev() {
            let (lower_nodes, rest) = net.nodes.split_at_mut(l);
            let layer = &mut rest[0];
            let (lower_err, rest_err) = self.err.split_at_mut(l);
            for n in (0..layer.len()).rev() {
                let node = &mut layer[n];
                let mut delta = rest_err[0][n];
                if l != last || !unity {
                    delta *= node.transfer_derivative() as f64;
                }
                p -= 1;
                let dw = ((momentum * self.prev_dw[p]) as f64 - lr * delta) as f32;
                self.prev_dw[p] = dw;
                if bias_decay {
                    node.bias *= decay;
                }
                node.bias += dw;
                for link in node.links_mut() {
                    // Error propagates through the pre-update weight.
                    let src = match link.source {
                        LinkSource::Input(i) => net.input[i],
                        LinkSource::Node { layer: sl, index } => {
                            lower_err[sl - 1][index] += delta * link.weight as f64;
                            lower_nodes[sl - 1][index].output()
                        }
                    };
                    p -= 1;
                    let dw =
                        ((momentum * self.prev_dw[p]) as f64 - lr * delta * src as f64) as f32;
                    self.prev_dw[p] = dw;
                    link.weight *= decay;
                    link.weight += dw;
                }
            }
        }
        result
    }
}

/// Batch backprop: gradients accumulate over the whole epoch and every
/// parameter takes one momentum-smoothed step at its end.
pub(crate) struct BatchBackProp {
    err: Vec<Vec<f64>>,
    dw: Vec<f64>,
    prev_dw: Vec<f32>,
}

impl BatchBackProp {
    pub(crate) fn new(net: &Network) -> Self {
        BatchBackProp {
            err: net.node_table(0.0f64),
            dw: vec![0.0; net.param_count()],
            prev_dw: vec![0.0; net.param_count()],
        }
    }
}

impl Algorithm for BatchBackProp {
    fn iterate(&mut self, net: &mut Network, desired: &[bool]) -> f64 {
        batch_iterate(net, desired, &mut self.err, &mut self.dw)
    }

    fn process_epoch(&mut self, net: &mut Network, _last_avg_err: f64, _avg_err: f64) {
        let lr = net.options.learning_rate as f64;
        let momentum = net.options.momentum;
        let decay = 1.0 - net.options.weight_decay;
        let bias_decay = net.options.bias_decay;
        let dw = &mut self.dw;
        let prev = &mut self.prev_dw;
        let mut p = dw.len();
        net.update_parameters(|kind, value| {
            p -= 1;
            let step = ((momentum * prev[p]) as f64 + lr * dw[p]) as f32;
            prev[p] = step;
            dw[p] = 0.0;
            if kind == ParamKind::Weight || bias_decay {
                *value *= decay;
            }
            *value += step;
        });
    }
}
