//! Levenberg-Marquardt training.
//!
//! Every pattern accumulates the Gauss-Newton terms JtE and JtJ, where J
//! is the Jacobian of the output errors with respect to the parameters. At
//! the end of an epoch the damped normal equations `(JtJ + mu*I) dw = JtE`
//! are solved by Cholesky factorization, exploiting that JtJ is symmetric
//! positive semi-definite and storing only its lower triangle. The damping
//! term mu shrinks whenever an epoch improves the error and grows when it
//! regresses or the factorization hits a numerical problem.

use super::Algorithm;
use crate::link::LinkSource;
use crate::network::{Network, ParamKind};

/// A pivot this many times smaller than the numerator makes the division
/// numerically meaningless; the solve is abandoned and mu increased.
const PIVOT_GUARD: f64 = (1u64 << 50) as f64;

/// Symmetric matrix with only the lower triangle stored, row-packed.
pub(crate) struct TriangularMatrix {
    data: Vec<f64>,
    n: usize,
}

impl TriangularMatrix {
    pub(crate) fn new(n: usize) -> Self {
        TriangularMatrix {
            data: vec![0.0; n * (n + 1) / 2],
            n,
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.n
    }

    #[inline]
    fn idx(r: usize, c: usize) -> usize {
        debug_assert!(c <= r);
        r * (r + 1) / 2 + c
    }

    #[inline]
    pub(crate) fn get(&self, r: usize, c: usize) -> f64 {
        self.data[Self::idx(r, c)]
    }

    #[inline]
    pub(crate) fn set(&mut self, r: usize, c: usize, v: f64) {
        self.data[Self::idx(r, c)] = v;
    }

    #[inline]
    pub(crate) fn add(&mut self, r: usize, c: usize, v: f64) {
        self.data[Self::idx(r, c)] += v;
    }

    pub(crate) fn reset(&mut self) {
        self.data.fill(0.0);
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SolveOutcome {
    Solved,
    /// Factorization broke down; skip the update and raise mu.
    Singular,
    Aborted,
}

/// One node's slice of the flat parameter space: the bias sits at `base`,
/// link `i`'s weight at `base - 1 - i`. Groups are ordered by descending
/// flat index, so the output layer comes first.
struct NodeParams {
    layer: usize,
    node: usize,
    base: usize,
    /// Source values of the node's links, refreshed per pattern.
    srcs: Vec<f64>,
}

pub(crate) struct LevenbergMarquardt {
    /// d(error_k)/d(sigma) per hidden node; indexed `[layer][node][k]`.
    sens: Vec<Vec<Vec<f64>>>,
    /// Output nodes only ever influence their own error, so a scalar
    /// sensitivity suffices for them.
    out_sens: Vec<f64>,
    /// Output errors of the current pattern.
    e: Vec<f64>,
    jte: Vec<f64>,
    jtj: TriangularMatrix,
    groups: Vec<NodeParams>,
}

impl LevenbergMarquardt {
    pub(crate) fn new(net: &Network) -> Self {
        let num_outputs = net.num_outputs();
        let last = net.nodes.len() - 1;
        let mut groups = Vec::with_capacity(net.total_nodes());
        let mut next = net.param_count();
        for l in (0..net.nodes.len()).rev() {
            for (n, node) in net.nodes[l].iter().enumerate().rev() {
                let base = next - 1;
                next = base - node.num_links();
                groups.push(NodeParams {
                    layer: l,
                    node: n,
                    base,
                    srcs: vec![0.0; node.num_links()],
                });
            }
        }
        LevenbergMarquardt {
            sens: net.nodes[..last]
                .iter()
                .map(|layer| vec![vec![0.0; num_outputs]; layer.len()])
                .collect(),
            out_sens: vec![0.0; num_outputs],
            e: vec![0.0; num_outputs],
            jte: vec![0.0; net.param_count()],
            jtj: TriangularMatrix::new(net.param_count()),
            groups,
        }
    }

    /// An output node's J rows are zero except at its own error, so all of
    /// its JtE/JtJ terms collapse to products with its scalar sensitivity,
    /// and cross terms with other output nodes vanish entirely.
    fn accumulate_output_node(&mut self, net: &Network, gi: usize) {
        let g = &self.groups[gi];
        let node = &net.nodes[g.layer][g.node];
        let s = self.out_sens[g.node];
        let e_n = self.e[g.node];
        self.jte[g.base] += e_n * s;
        self.jtj.add(g.base, g.base, s * s);
        for (i, link) in node.links().iter().enumerate() {
            if let LinkSource::Node { layer: sl, index } = link.source {
                self.sens[sl - 1][index][g.node] += s * link.weight as f64;
            }
            let p = g.base - 1 - i;
            let jp = s * g.srcs[i];
            self.jte[p] += e_n * jp;
            self.jtj.add(g.base, p, jp * s);
            for j in 0..=i {
                self.jtj.add(g.base - 1 - j, p, jp * s * g.srcs[j]);
            }
        }
    }

    fn accumulate_hidden_node(&mut self, net: &Network, gi: usize, last: usize) {
        let g_layer = self.groups[gi].layer;
        let g_node = self.groups[gi].node;
        let base = self.groups[gi].base;

        // Scale this node's sensitivities from d/d(output) to d/d(sigma)
        // and take the JtE dot product in the same sweep.
        let df = net.nodes[g_layer][g_node].transfer_derivative() as f64;
        let mut e_dot = 0.0;
        for (v, &e) in self.sens[g_layer][g_node].iter_mut().zip(self.e.iter()) {
            *v *= df;
            e_dot += e * *v;
        }
        self.jte[base] += e_dot;
        for (i, &src) in self.groups[gi].srcs.iter().enumerate() {
            self.jte[base - 1 - i] += e_dot * src;
        }

        // Push the finalized sensitivities down this node's links.
        {
            let (lower_sens, rest_sens) = self.sens.split_at_mut(g_layer);
            let t = &rest_sens[0][g_node];
            for link in net.nodes[g_layer][g_node].links() {
                if let LinkSource::Node { layer: sl, index } = link.source {
                    let w = link.weight as f64;
                    for (dst, &v) in lower_sens[sl - 1][index].iter_mut().zip(t.iter()) {
                        *dst += v * w;
                    }
                }
            }
        }

        // JtJ terms against every already-visited node (all of which hold
        // the higher flat indices) and against this node itself. The dot
        // over outputs depends only on the node pair; the per-parameter
        // terms then scale it by the two source values.
        let t = &self.sens[g_layer][g_node];
        let srcs = &self.groups[gi].srcs;
        for gj in 0..=gi {
            let h = &self.groups[gj];
            if gj == gi {
                let dot: f64 = t.iter().map(|v| v * v).sum();
                self.jtj.add(base, base, dot);
                for i in 0..srcs.len() {
                    let p = base - 1 - i;
                    self.jtj.add(base, p, dot * srcs[i]);
                    for j in 0..=i {
                        self.jtj.add(base - 1 - j, p, dot * srcs[i] * srcs[j]);
                    }
                }
            } else {
                let dot = if h.layer == last {
                    t[h.node] * self.out_sens[h.node]
                } else {
                    t.iter()
                        .zip(self.sens[h.layer][h.node].iter())
                        .map(|(a, b)| a * b)
                        .sum()
                };
                self.jtj.add(h.base, base, dot);
                for (j, &sq) in h.srcs.iter().enumerate() {
                    self.jtj.add(h.base - 1 - j, base, dot * sq);
                }
                for (i, &sp) in srcs.iter().enumerate() {
                    let p = base - 1 - i;
                    self.jtj.add(h.base, p, dot * sp);
                    for (j, &sq) in h.srcs.iter().enumerate() {
                        self.jtj.add(h.base - 1 - j, p, dot * sp * sq);
                    }
                }
            }
        }
    }

    /// Solve `(JtJ + mu*I) dw = JtE` in place: `jtj` becomes the Cholesky
    /// factor L and `jte` the solution. Polls for an abort request after
    /// every row, since large networks make this the slowest phase.
    fn solve(&mut self, net: &Network) -> SolveOutcome {
        let n = self.jtj.size();
        let mu = net.options.mu as f64;
        for j in 0..n {
            let mut diag = 0.0;
            for k in 0..j {
                let mut v = self.jtj.get(j, k);
                for s in 0..k {
                    v -= self.jtj.get(j, s) * self.jtj.get(k, s);
                }
                let pivot = self.jtj.get(k, k);
                if pivot * PIVOT_GUARD <= v.abs() {
                    return SolveOutcome::Singular;
                }
                let v = v / pivot;
                self.jtj.set(j, k, v);
                diag += v * v;
            }
            let d = self.jtj.get(j, j) + mu - diag;
            if d <= 0.0 {
                // Round-off can push a near-zero pivot negative when mu is
                // tiny; treat it as a numerical failure.
                return SolveOutcome::Singular;
            }
            self.jtj.set(j, j, d.sqrt());
            if net.progress.abort_requested() {
                return SolveOutcome::Aborted;
            }
        }
        // Forward substitution: L x = JtE.
        for j in 0..n {
            let mut v = self.jte[j];
            for k in 0..j {
                v -= self.jtj.get(j, k) * self.jte[k];
            }
            let pivot = self.jtj.get(j, j);
            if pivot * PIVOT_GUARD <= v.abs() {
                return SolveOutcome::Singular;
            }
            self.jte[j] = v / pivot;
            if net.progress.abort_requested() {
                return SolveOutcome::Aborted;
            }
        }
        // Back substitution: transpose(L) dw = x.
        for j in (0..n).rev() {
            let v = self.jte[j];
            let pivot = self.jtj.get(j, j);
            if pivot * PIVOT_GUARD <= v.abs() {
                return SolveOutcome::Singular;
            }
            let v = v / pivot;
            self.jte[j] = v;
            for k in 0..j {
                self.jte[k] -= self.jtj.get(j, k) * v;
            }
            if net.progress.abort_requested() {
                return SolveOutcome::Aborted;
            }
        }
        SolveOutcome::Solved
    }
}

impl Algorithm for LevenbergMarquardt {
    fn iterate(&mut self, net: &mut Network, desired: &[bool]) -> f64 {
        net.feed_forward();
        let last = net.nodes.len() - 1;
        let unity = net.options.unity_output_derivatives;
        for layer in self.sens.iter_mut() {
            for row in layer.iter_mut() {
                for v in row.iter_mut() {
                    *v = 0.0;
                }
            }
        }
        let mut result = 0.0;
        for (n, node) in net.nodes[last].iter().enumerate() {
            let t = net.target_error(node.output(), desired[n]);
            self.e[n] = t;
            result += t * t;
            self.out_sens[n] = if unity {
                1.0
            } else {
                node.transfer_derivative() as f64
            };
        }
        for gi in 0..self.groups.len() {
            {
                let g = &mut self.groups[gi];
                let node = &net.nodes[g.layer][g.node];
                for (s, link) in g.srcs.iter_mut().zip(node.links()) {
                    *s = net.source_value(link.source) as f64;
                }
            }
            if self.groups[gi].layer == last {
                self.accumulate_output_node(net, gi);
            } else {
                self.accumulate_hidden_node(net, gi, last);
            }
        }
        result
    }

    fn process_epoch(&mut self, net: &mut Network, last_avg_err: f64, avg_err: f64) {
        let outcome = self.solve(net);
        if outcome == SolveOutcome::Aborted {
            return;
        }
        if outcome == SolveOutcome::Solved {
            let decay = 1.0 - net.options.weight_decay;
            let bias_decay = net.options.bias_decay;
            let dw = &self.jte;
            let mut p = dw.len();
            net.update_parameters(|kind, value| {
                p -= 1;
                if kind == ParamKind::Weight || bias_decay {
                    *value *= decay;
                }
                *value = (*value as f64 - dw[p]) as f32;
            });
        }
        let opts = &mut net.options;
        if avg_err > last_avg_err || outcome == SolveOutcome::Singular {
            opts.mu += opts.mu_inc;
        } else {
            opts.mu *= opts.mu_dec;
            if opts.mu < opts.mu_min {
                opts.mu = opts.mu_min;
            }
        }
        self.jte.fill(0.0);
        self.jtj.reset();
    }

    fn error_denominator(&self, net: &Network, num_patterns: usize) -> f64 {
        (2 * net.num_outputs() * num_patterns) as f64
    }
}
