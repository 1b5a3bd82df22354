//! Regression losses and their gradients.

use stockcast_core::LossFunction;
use stockcast_layers::Tensor;

/// A scalar objective over `[batch, 1]` predictions.
pub trait Objective {
    /// Mean loss over the batch.
    fn value(&self, prediction: &Tensor, target: &Tensor) -> f64;

    /// Gradient of [`Objective::value`] with respect to `prediction`.
    fn gradient(&self, prediction: &Tensor, target: &Tensor) -> Tensor;
}

impl Objective for LossFunction {
    fn value(&self, prediction: &Tensor, target: &Tensor) -> f64 {
        let n = prediction.numel().max(1) as f64;
        let total: f64 = prediction
            .data()
            .iter()
            .zip(target.data())
            .map(|(p, t)| {
                let d = f64::from(*p) - f64::from(*t);
                match self {
                    LossFunction::Mse => d * d,
                    LossFunction::Mae => d.abs(),
                }
            })
            .sum();
        total / n
    }

    fn gradient(&self, prediction: &Tensor, target: &Tensor) -> Tensor {
        let n = prediction.numel().max(1) as f32;
        let diff = prediction.sub(target);
        match self {
            LossFunction::Mse => diff.scale(2.0 / n),
            // Subgradient 0 at d == 0.
            LossFunction::Mae => diff.map(|d| {
                if d > 0.0 {
                    1.0 / n
                } else if d < 0.0 {
                    -1.0 / n
                } else {
                    0.0
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (Tensor, Tensor) {
        (
            Tensor::from_data(&[2, 1], vec![1.0, 3.0]),
            Tensor::from_data(&[2, 1], vec![2.0, 1.0]),
        )
    }

    #[test]
    fn test_mse() {
        let (p, t) = pair();
        assert!((LossFunction::Mse.value(&p, &t) - 2.5).abs() < 1e-12);
        assert_eq!(LossFunction::Mse.gradient(&p, &t).data(), &[-1.0, 2.0]);
    }

    #[test]
    fn test_mae() {
        let (p, t) = pair();
        assert!((LossFunction::Mae.value(&p, &t) - 1.5).abs() < 1e-12);
        assert_eq!(LossFunction::Mae.gradient(&p, &t).data(), &[-0.5, 0.5]);
    }

    #[test]
    fn test_perfect_prediction_has_zero_loss_and_gradient() {
        let (p, _) = pair();
        for loss in [LossFunction::Mse, LossFunction::Mae] {
            assert_eq!(loss.value(&p, &p), 0.0);
            assert!(loss.gradient(&p, &p).data().iter().all(|g| *g == 0.0));
        }
    }
}
