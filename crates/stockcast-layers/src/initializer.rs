//! Weight initialization.

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::tensor::Tensor;

/// Weight initialization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Initializer {
    /// Glorot/Xavier uniform initialization.
    #[default]
    GlorotUniform,
    /// All zeros.
    Zeros,
}

impl Initializer {
    /// Draws a tensor of `shape`. 2D shapes are read as `[fan_in, fan_out]`.
    pub fn initialize<R: Rng + ?Sized>(&self, shape: &[usize], rng: &mut R) -> Tensor {
        match self {
            Initializer::Zeros => Tensor::zeros(shape),
            Initializer::GlorotUniform => {
                let (fan_in, fan_out) = fan_in_out(shape);
                let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
                uniform(shape, limit, rng)
            }
        }
    }
}

fn uniform<R: Rng + ?Sized>(shape: &[usize], limit: f32, rng: &mut R) -> Tensor {
    let numel: usize = shape.iter().product();
    let dist = Uniform::new_inclusive(-limit, limit);
    let data = (0..numel).map(|_| dist.sample(rng)).collect();
    Tensor::from_data(shape, data)
}

fn fan_in_out(shape: &[usize]) -> (usize, usize) {
    match shape {
        [fan_in, fan_out, ..] => ((*fan_in).max(1), (*fan_out).max(1)),
        [dim] => ((*dim).max(1), (*dim).max(1)),
        [] => (1, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_glorot_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let t = Initializer::GlorotUniform.initialize(&[10, 20], &mut rng);
        let limit = (6.0f32 / 30.0).sqrt();
        assert_eq!(t.shape(), &[10, 20]);
        assert!(t.data().iter().all(|x| x.abs() <= limit));
        assert!(t.data().iter().any(|x| *x != 0.0));
    }

    #[test]
    fn test_seeded_initialization_is_reproducible() {
        let a = Initializer::GlorotUniform.initialize(&[4, 4], &mut StdRng::seed_from_u64(1));
        let b = Initializer::GlorotUniform.initialize(&[4, 4], &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_zeros() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(Initializer::Zeros.initialize(&[3], &mut rng).sum(), 0.0);
    }
}
