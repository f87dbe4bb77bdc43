use serde::{Deserialize, Serialize};

/// An enumeration of the transfer (thresholding) functions a node can use.
///
/// The symmetric variants produce outputs in `[-1, 1]`, the `*Pos` variants
/// in `[0, 1]`. The sigmoid curves are scaled so that their slope at
/// `sigma = 0` is exactly 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TransferKind {
    HardLimit,
    HardLimitPos,
    Linear,
    LinearPos,
    SaturatingLinear,
    SaturatingLinearPos,
    Sigmoid,
    #[default]
    SigmoidPos,
}

impl TransferKind {
    /// Apply the transfer function to a weighted input sum.
    pub fn output(self, sigma: f64) -> f32 {
        match self {
            TransferKind::HardLimit => {
                if sigma > 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            TransferKind::HardLimitPos => {
                if sigma > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            TransferKind::Linear => sigma as f32,
            TransferKind::LinearPos => {
                if sigma > 0.0 {
                    sigma as f32
                } else {
                    0.0
                }
            }
            TransferKind::SaturatingLinear => sigma.clamp(-1.0, 1.0) as f32,
            TransferKind::SaturatingLinearPos => sigma.clamp(0.0, 1.0) as f32,
            // scaled so that slope = 1 when sigma = 0
            TransferKind::Sigmoid => (1.0 - 2.0 / (1.0 + (2.0 * sigma).exp())) as f32,
            TransferKind::SigmoidPos => (1.0 - 1.0 / (1.0 + (4.0 * sigma).exp())) as f32,
        }
    }

    /// Compute the derivative f' of the transfer function.
    ///
    /// For the sigmoid variants the derivative is expressed in terms of the
    /// already-computed output, so the exponential need not be re-evaluated.
    pub fn derivative(self, sigma: f64, output: f32) -> f32 {
        match self {
            TransferKind::HardLimit | TransferKind::HardLimitPos => 0.0,
            TransferKind::Linear => 1.0,
            TransferKind::LinearPos => {
                if sigma >= 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            TransferKind::SaturatingLinear => {
                if (-1.0..=1.0).contains(&sigma) {
                    1.0
                } else {
                    0.0
                }
            }
            TransferKind::SaturatingLinearPos => {
                if (0.0..=1.0).contains(&sigma) {
                    1.0
                } else {
                    0.0
                }
            }
            TransferKind::Sigmoid => (output + 1.0) * (1.0 - output),
            TransferKind::SigmoidPos => 4.0 * output * (1.0 - output),
        }
    }

    /// The range of output values produced by a node using this function.
    ///
    /// For `Linear` and `LinearPos` the returned range is `[-1, 1]` and
    /// `[0, 1]` respectively even though the raw output magnitude is
    /// unbounded; downstream consumers (weight initialization, probability
    /// clamping) rely on the documented range.
    pub fn output_range(self) -> (f32, f32) {
        match self {
            TransferKind::HardLimit
            | TransferKind::Linear
            | TransferKind::SaturatingLinear
            | TransferKind::Sigmoid => (-1.0, 1.0),
            TransferKind::HardLimitPos
            | TransferKind::LinearPos
            | TransferKind::SaturatingLinearPos
            | TransferKind::SigmoidPos => (0.0, 1.0),
        }
    }

    /// The interval of weighted sums over which the derivative is
    /// non-negligible, used to scale initial weights. The hard limits report
    /// `[-0.5, 0.5]` even though their true derivative is zero everywhere.
    pub fn active_sigma_range(self) -> (f32, f32) {
        match self {
            TransferKind::HardLimit | TransferKind::HardLimitPos => (-0.5, 0.5),
            TransferKind::Linear | TransferKind::SaturatingLinear => (-1.0, 1.0),
            TransferKind::LinearPos | TransferKind::SaturatingLinearPos => (0.0, 1.0),
            TransferKind::Sigmoid => (-0.6, 0.6),
            TransferKind::SigmoidPos => (-0.3, 0.3),
        }
    }

    /// Stable integer tag used by the stream format.
    pub(crate) fn index(self) -> i32 {
        match self {
            TransferKind::HardLimit => 0,
            TransferKind::HardLimitPos => 1,
            TransferKind::Linear => 2,
            TransferKind::LinearPos => 3,
            TransferKind::SaturatingLinear => 4,
            TransferKind::SaturatingLinearPos => 5,
            TransferKind::Sigmoid => 6,
            TransferKind::SigmoidPos => 7,
        }
    }

    pub(crate) fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(TransferKind::HardLimit),
            1 => Some(TransferKind::HardLimitPos),
            2 => Some(TransferKind::Linear),
            3 => Some(TransferKind::LinearPos),
            4 => Some(TransferKind::SaturatingLinear),
            5 => Some(TransferKind::SaturatingLinearPos),
            6 => Some(TransferKind::Sigmoid),
            7 => Some(TransferKind::SigmoidPos),
            _ => None,
        }
    }
}
