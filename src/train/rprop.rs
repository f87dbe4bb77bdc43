//! Resilient backpropagation (RProp).
//!
//! Each parameter keeps its own step size: it grows by 1.2x while the
//! gradient keeps its sign and halves when the sign flips, within the
//! configured `[delta_min, delta_max]` bounds. A sign flip also reverts to
//! a neutral state so the next epoch starts a fresh streak.

use super::backprop::batch_iterate;
use super::Algorithm;
use crate::network::{Network, ParamKind};

pub(crate) struct RProp {
    err: Vec<Vec<f64>>,
    dw: Vec<f64>,
    prev_dw: Vec<f32>,
    delta: Vec<f32>,
}

impl RProp {
    pub(crate) fn new(net: &Network) -> Self {
        RProp {
            err: net.node_table(0.0f64),
            dw: vec![0.0; net.param_count()],
            prev_dw: vec![0.0; net.param_count()],
            delta: vec![net.options.delta0; net.param_count()],
        }
    }
}

/// One parameter's RProp step. Clears the accumulated gradient for the
/// next epoch. A zero gradient is treated like the neutral state, taking
/// no step and recording the (zero) gradient as the streak seed.
fn parameter_step(
    delta: &mut f32,
    dw: &mut f64,
    prev_dw: &mut f32,
    delta_min: f32,
    delta_max: f32,
) -> f32 {
    let step;
    if *dw == 0.0 || *prev_dw == 0.0 {
        step = if *dw > 0.0 {
            *delta
        } else if *dw < 0.0 {
            -*delta
        } else {
            0.0
        };
        *prev_dw = *dw as f32;
    } else if (*dw > 0.0) == (*prev_dw > 0.0) {
        *delta *= 1.2;
        if *delta > delta_max {
            *delta = delta_max;
        }
        step = if *dw > 0.0 { *delta } else { -*delta };
        *prev_dw = *dw as f32;
    } else {
        // Sign flip: back out the previous move and shrink the step.
        step = if *prev_dw > 0.0 { -*delta } else { *delta };
        *delta *= 0.5;
        if *delta < delta_min {
            *delta = delta_min;
        }
        *prev_dw = 0.0;
    }
    *dw = 0.0;
    step
}

impl Algorithm for RProp {
    fn iterate(&mut self, net: &mut Network, desired: &[bool]) -> f64 {
        batch_iterate(net, desired, &mut self.err, &mut self.dw)
    }

    fn process_epoch(&mut self, net: &mut Network, _last_avg_err: f64, _avg_err: f64) {
        let delta_min = net.options.delta_min;
        let delta_max = net.options.delta_max;
        let decay = 1.0 - net.options.weight_decay;
        let bias_decay = net.options.bias_decay;
        let dw = &mut self.dw;
        let prev = &mut self.prev_dw;
        let delta = &mut self.delta;
        let mut p = dw.len();
        net.update_parameters(|kind, value| {
            p -= 1;
            if kind == ParamKind::Weight || bias_decay {
                *value *= decay;
            }
            *value += parameter_step(&mut delta[p], &mut dw[p], &mut prev[p], delta_min, delta_max);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::parameter_step;

    #[test]
    fn step_grows_while_gradient_keeps_its_sign() {
        let (mut delta, mut prev) = (0.1f32, 0.5f32);
        let mut dw = 0.5f64;
        let step = parameter_step(&mut delta, &mut dw, &mut prev, 1e-6, 50.0);
        assert!((delta - 0.12).abs() < 1e-7);
        assert_eq!(step, delta);
        assert_eq!(prev, 0.5);
        assert_eq!(dw, 0.0);
    }

    #[test]
    fn step_is_capped_at_delta_max() {
        let (mut delta, mut prev) = (45.0f32, 1.0f32);
        let mut dw = 1.0f64;
        let step = parameter_step(&mut delta, &mut dw, &mut prev, 1e-6, 50.0);
        assert_eq!(delta, 50.0);
        assert_eq!(step, 50.0);
    }

    #[test]
    fn sign_flip_reverts_and_halves() {
        let (mut delta, mut prev) = (0.2f32, 0.5f32);
        let mut dw = -0.3f64;
        let step = parameter_step(&mut delta, &mut dw, &mut prev, 1e-6, 50.0);
        // The step cancels the previous positive move at the old size.
        assert_eq!(step, -0.2);
        assert_eq!(delta, 0.1);
        assert_eq!(prev, 0.0);
        assert_eq!(dw, 0.0);
    }

    #[test]
    fn step_is_floored_at_delta_min() {
        let (mut delta, mut prev) = (1.5e-6f32, 0.5f32);
        let mut dw = -0.3f64;
        parameter_step(&mut delta, &mut dw, &mut prev, 1e-6, 50.0);
        assert_eq!(delta, 1e-6);
    }

    #[test]
    fn zero_gradient_takes_no_step() {
        let (mut delta, mut prev) = (0.2f32, 0.5f32);
        let mut dw = 0.0f64;
        let step = parameter_step(&mut delta, &mut dw, &mut prev, 1e-6, 50.0);
        assert_eq!(step, 0.0);
        assert_eq!(delta, 0.2);
        assert_eq!(prev, 0.0);
    }
}
