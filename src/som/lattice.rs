//! Rectangular 3D lattice of neurons.

use crate::error::{KohonenError, Result};
use crate::som::Neuron;
use rand::Rng;

/// A fixed `width × height × depth` grid of neurons.
///
/// Neurons are stored in `z, y, x` nesting order, so the linear index of the
/// neuron at grid coordinates `(x, y, z)` is `z·width·height + y·width + x`.
/// Dimensions never change after construction.
#[derive(Debug, Clone)]
pub struct Lattice {
    width: usize,
    height: usize,
    depth: usize,
    input_size: usize,
    neurons: Vec<Neuron>,
}

/// Linear index of `(x, y, z)` in a `width × height` z-major layout.
#[inline]
pub(crate) fn linear_index(width: usize, height: usize, x: usize, y: usize, z: usize) -> usize {
    z * width * height + y * width + x
}

impl Lattice {
    /// Creates a lattice with zero-initialized weights.
    ///
    /// Each neuron's position is `(coord − dim/2)·2/dim` on every axis.
    pub fn new(width: usize, height: usize, depth: usize, input_size: usize) -> Result<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(KohonenError::Config(format!(
                "lattice dimensions must be non-zero, got {}x{}x{}",
                width, height, depth
            )));
        }
        if input_size == 0 {
            return Err(KohonenError::Config("input size must be non-zero".to_string()));
        }

        let mut neurons = Vec::with_capacity(width * height * depth);
        for z in 0..depth {
            for y in 0..height {
                for x in 0..width {
                    let position = [
                        normalized_coord(x, width),
                        normalized_coord(y, height),
                        normalized_coord(z, depth),
                    ];
                    neurons.push(Neuron::new(input_size, position));
                }
            }
        }

        Ok(Self {
            width,
            height,
            depth,
            input_size,
            neurons,
        })
    }

    /// Creates a lattice whose neurons take the given weight vectors, in
    /// linear index order.
    pub fn with_weights(
        width: usize,
        height: usize,
        depth: usize,
        weights: Vec<Vec<f32>>,
    ) -> Result<Self> {
        let input_size = weights.first().map(Vec::len).unwrap_or(0);
        let mut lattice = Self::new(width, height, depth, input_size)?;

        if weights.len() != lattice.len() {
            return Err(KohonenError::DimensionMismatch {
                expected: lattice.len(),
                actual: weights.len(),
            });
        }
        for (neuron, w) in lattice.neurons.iter_mut().zip(weights) {
            if w.len() != input_size {
                return Err(KohonenError::DimensionMismatch {
                    expected: input_size,
                    actual: w.len(),
                });
            }
            neuron.weights = w;
        }

        Ok(lattice)
    }

    /// Number of neurons along x.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of neurons along y.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of neurons along z.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Length of every weight vector.
    #[inline]
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Largest of the three dimensions.
    #[inline]
    pub fn max_dimension(&self) -> usize {
        self.width.max(self.height).max(self.depth)
    }

    /// Returns the total number of neurons.
    #[inline]
    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    /// Always false; construction rejects empty lattices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    /// All neurons in linear index order.
    #[inline]
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    #[inline]
    pub(crate) fn neurons_mut(&mut self) -> &mut [Neuron] {
        &mut self.neurons
    }

    /// Gets a neuron by its linear index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Neuron> {
        self.neurons.get(index)
    }

    /// Converts grid coordinates to a linear index.
    #[inline]
    pub fn index_of(&self, x: usize, y: usize, z: usize) -> usize {
        linear_index(self.width, self.height, x, y, z)
    }

    /// Converts a linear index to grid coordinates `(x, y, z)`.
    #[inline]
    pub fn coords_of(&self, index: usize) -> (usize, usize, usize) {
        let plane = self.width * self.height;
        let z = index / plane;
        let rem = index % plane;
        (rem % self.width, rem / self.width, z)
    }

    /// Draws every weight independently from `U[0, 1)`.
    pub fn initialize<R: Rng>(&mut self, rng: &mut R) {
        for neuron in &mut self.neurons {
            neuron.randomize(rng);
        }
    }

    /// Finds the Best Matching Unit (BMU) for an input vector.
    ///
    /// Ties go to the lowest linear index.
    pub fn find_bmu(&self, input: &[f32]) -> usize {
        self.find_bmu_with_distance(input).0
    }

    /// Finds the BMU and returns it with its Euclidean distance to `input`.
    pub fn find_bmu_with_distance(&self, input: &[f32]) -> (usize, f32) {
        let mut best_idx = 0;
        let mut best_dist = f32::INFINITY;

        for (i, neuron) in self.neurons.iter().enumerate() {
            let dist = neuron.distance_squared(input);
            if dist < best_dist {
                best_dist = dist;
                best_idx = i;
            }
        }

        (best_idx, best_dist.sqrt())
    }

    /// Euclidean distance between two neurons in integer grid coordinates.
    pub fn grid_distance(&self, a: usize, b: usize) -> f32 {
        let (ax, ay, az) = self.coords_of(a);
        let (bx, by, bz) = self.coords_of(b);

        let dx = ax as f32 - bx as f32;
        let dy = ay as f32 - by as f32;
        let dz = az as f32 - bz as f32;

        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// All neurons whose grid distance to `center` is at most `radius`.
    pub fn neighbors(&self, center: usize, radius: f32) -> Vec<usize> {
        (0..self.neurons.len())
            .filter(|&i| self.grid_distance(center, i) <= radius)
            .collect()
    }

    /// Gaussian neighborhood influence for a grid distance.
    ///
    /// A non-positive radius degenerates to a unit impulse at distance 0.
    #[inline]
    pub fn neighborhood(distance: f32, radius: f32) -> f32 {
        if radius <= 0.0 {
            return if distance == 0.0 { 1.0 } else { 0.0 };
        }
        (-(distance * distance) / (2.0 * radius * radius)).exp()
    }

    /// Pulls the BMU and every neighbor within `radius` towards `input`.
    pub fn update(&mut self, input: &[f32], bmu_idx: usize, learning_rate: f32, radius: f32) {
        for idx in self.neighbors(bmu_idx, radius) {
            let influence = Self::neighborhood(self.grid_distance(bmu_idx, idx), radius);
            self.neurons[idx].update_weights(input, learning_rate, influence);
        }
    }
}

#[inline]
fn normalized_coord(coord: usize, dim: usize) -> f32 {
    (coord as f32 - dim as f32 / 2.0) * 2.0 / dim as f32
}
