//! Neuron representation for the 3D lattice.

use crate::dataset::NEUTRAL_COLOR;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// A neuron in the lattice.
///
/// Each neuron has a fixed normalized position in `[-1, 1]^3`, a weight
/// vector adapted during training, and the classification state written by
/// the post-training passes.
#[derive(Debug, Clone, PartialEq)]
pub struct Neuron {
    /// Weight vector (prototype in input space).
    pub weights: Vec<f32>,
    /// Normalized position `(x, y, z)`, centred on the origin.
    pub position: [f32; 3],
    /// Number of times this neuron won a training step.
    pub activation_count: u32,
    /// Majority label among the training samples it won.
    pub dominant_class: Option<usize>,
    /// Display color derived from `dominant_class`.
    pub color: [f32; 3],
    /// Closest won training sample, if any.
    pub prototype: Option<Vec<f32>>,
}

impl Neuron {
    /// Creates a new neuron with zero weights at the given position.
    pub fn new(input_size: usize, position: [f32; 3]) -> Self {
        Self {
            weights: vec![0.0; input_size],
            position,
            activation_count: 0,
            dominant_class: None,
            color: NEUTRAL_COLOR,
            prototype: None,
        }
    }

    /// Creates a new neuron with the given weights.
    pub fn with_weights(weights: Vec<f32>, position: [f32; 3]) -> Self {
        Self {
            weights,
            ..Self::new(0, position)
        }
    }

    /// Overwrites every weight with a fresh draw from `U[0, 1)`.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        let uniform = Uniform::new(0.0f32, 1.0);
        for w in &mut self.weights {
            *w = uniform.sample(rng);
        }
    }

    /// Computes the Euclidean distance between this neuron's weights and an input vector.
    pub fn distance(&self, input: &[f32]) -> f32 {
        self.distance_squared(input).sqrt()
    }

    /// Computes the squared Euclidean distance (faster, avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, input: &[f32]) -> f32 {
        debug_assert_eq!(
            self.weights.len(),
            input.len(),
            "Weight and input dimensions must match"
        );

        self.weights
            .iter()
            .zip(input.iter())
            .map(|(w, i)| (i - w) * (i - w))
            .sum()
    }

    /// Moves the weights towards an input vector.
    ///
    /// `learning_rate` is the overall learning rate.
    /// `influence` is the neighborhood influence (0.0 to 1.0).
    pub fn update_weights(&mut self, input: &[f32], learning_rate: f32, influence: f32) {
        let step = learning_rate * influence;

        for (w, i) in self.weights.iter_mut().zip(input.iter()) {
            *w += step * (i - *w);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_neuron_creation() {
        let neuron = Neuron::new(100, [0.0, -1.0, 0.5]);
        assert_eq!(neuron.weights.len(), 100);
        assert!(neuron.weights.iter().all(|&w| w == 0.0));
        assert_eq!(neuron.activation_count, 0);
        assert_eq!(neuron.dominant_class, None);
        assert_eq!(neuron.color, NEUTRAL_COLOR);
        assert!(neuron.prototype.is_none());
    }

    #[test]
    fn test_randomize_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut neuron = Neuron::new(500, [0.0; 3]);
        neuron.randomize(&mut rng);
        assert_eq!(neuron.weights.len(), 500);
        assert!(neuron.weights.iter().all(|&w| (0.0..1.0).contains(&w)));
        assert!(neuron.weights.iter().any(|&w| w != 0.0));
    }

    #[test]
    fn test_distance() {
        let neuron = Neuron::with_weights(vec![1.0, 0.0, 0.0], [0.0; 3]);
        let dist = neuron.distance(&[0.0, 1.0, 0.0]);
        assert!((dist - std::f32::consts::SQRT_2).abs() < 1e-6);
        assert!((neuron.distance_squared(&[0.0, 1.0, 0.0]) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_update_weights() {
        let mut neuron = Neuron::with_weights(vec![0.0, 0.0, 1.0], [0.0; 3]);
        neuron.update_weights(&[1.0, 1.0, 1.0], 0.5, 1.0);
        assert!((neuron.weights[0] - 0.5).abs() < 1e-6);
        assert!((neuron.weights[2] - 1.0).abs() < 1e-6);

        neuron.update_weights(&[1.0, 1.0, 1.0], 0.5, 0.0);
        assert!((neuron.weights[0] - 0.5).abs() < 1e-6);
    }
}
