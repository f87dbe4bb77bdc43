use crate::transfer::TransferKind;

#[test]
fn test_sigmoid_is_centered_with_unit_slope() {
    let out = TransferKind::Sigmoid.output(0.0);
    assert!(out.abs() < 1e-7);
    let d = TransferKind::Sigmoid.derivative(0.0, out);
    assert!((d - 1.0).abs() < 1e-6);
}

#[test]
fn test_sigmoid_pos_is_centered_with_unit_slope() {
    let out = TransferKind::SigmoidPos.output(0.0);
    assert!((out - 0.5).abs() < 1e-7);
    let d = TransferKind::SigmoidPos.derivative(0.0, out);
    assert!((d - 1.0).abs() < 1e-6);
}

#[test]
fn test_sigmoid_saturates_to_its_output_range() {
    for kind in [TransferKind::Sigmoid, TransferKind::SigmoidPos] {
        let (lo, hi) = kind.output_range();
        assert!((kind.output(50.0) - hi).abs() < 1e-6);
        assert!((kind.output(-50.0) - lo).abs() < 1e-6);
    }
}

#[test]
fn test_sigmoid_derivative_matches_finite_difference() {
    let eps = 1e-5;
    for kind in [TransferKind::Sigmoid, TransferKind::SigmoidPos] {
        for &sigma in &[-1.5, -0.3, 0.0, 0.4, 2.0] {
            let out = kind.output(sigma);
            let numeric =
                (kind.output(sigma + eps) as f64 - kind.output(sigma - eps) as f64) / (2.0 * eps);
            let analytic = kind.derivative(sigma, out) as f64;
            assert!(
                (numeric - analytic).abs() < 1e-3,
                "{kind:?} at sigma={sigma}: numeric {numeric} vs analytic {analytic}"
            );
        }
    }
}

#[test]
fn test_hard_limits_threshold_at_zero() {
    assert_eq!(TransferKind::HardLimit.output(0.1), 1.0);
    assert_eq!(TransferKind::HardLimit.output(0.0), -1.0);
    assert_eq!(TransferKind::HardLimit.output(-0.1), -1.0);
    assert_eq!(TransferKind::HardLimitPos.output(0.1), 1.0);
    assert_eq!(TransferKind::HardLimitPos.output(0.0), 0.0);
}

#[test]
fn test_saturating_linear_clamps() {
    assert_eq!(TransferKind::SaturatingLinear.output(0.25), 0.25);
    assert_eq!(TransferKind::SaturatingLinear.output(3.0), 1.0);
    assert_eq!(TransferKind::SaturatingLinear.output(-3.0), -1.0);
    assert_eq!(TransferKind::SaturatingLinearPos.output(-0.5), 0.0);
    assert_eq!(TransferKind::SaturatingLinearPos.output(0.5), 0.5);
    assert_eq!(TransferKind::SaturatingLinearPos.output(2.0), 1.0);
}

#[test]
fn test_linear_pos_rectifies() {
    assert_eq!(TransferKind::LinearPos.output(2.5), 2.5);
    assert_eq!(TransferKind::LinearPos.output(-2.5), 0.0);
    assert_eq!(TransferKind::LinearPos.derivative(1.0, 1.0), 1.0);
    assert_eq!(TransferKind::LinearPos.derivative(-1.0, 0.0), 0.0);
}

#[test]
fn test_default_transfer_is_sigmoid_pos() {
    assert_eq!(TransferKind::default(), TransferKind::SigmoidPos);
}
