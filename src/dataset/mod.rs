//! Labeled samples and the loaders that produce them.
//!
//! - [`idx`]: MNIST-style IDX image/label files
//! - [`npy`]: NumPy `.npy` arrays

pub mod idx;
pub mod npy;

use serde::{Deserialize, Serialize};

pub use idx::{load_idx_dataset, read_idx_images, read_idx_labels, IdxHeader};
pub use npy::{samples_from_npy, NpyArray};

/// Display color used for unclassified neurons.
pub const NEUTRAL_COLOR: [f32; 3] = [0.5, 0.5, 0.5];

const MNIST_LABELS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

const FASHION_LABELS: [&str; 10] = [
    "T-shirt/top",
    "Trouser",
    "Pullover",
    "Dress",
    "Coat",
    "Sandal",
    "Shirt",
    "Sneaker",
    "Bag",
    "Ankle boot",
];

const MNIST_PALETTE: [[f32; 3]; 10] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 1.0, 0.0],
    [1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [1.0, 0.5, 0.0],
    [0.5, 0.0, 1.0],
    [0.0, 0.5, 0.0],
    [0.6, 0.3, 0.1],
];

const FASHION_PALETTE: [[f32; 3]; 10] = [
    [0.9, 0.1, 0.3],
    [0.1, 0.3, 0.8],
    [0.9, 0.6, 0.1],
    [0.8, 0.2, 0.8],
    [0.3, 0.2, 0.1],
    [0.2, 0.8, 0.8],
    [0.6, 0.8, 0.2],
    [1.0, 1.0, 1.0],
    [0.5, 0.3, 0.7],
    [0.1, 0.6, 0.3],
];

/// The family a sample was drawn from.
///
/// Each family has a fixed set of ten human-readable class names and a
/// ten-entry color palette used when coloring neurons by dominant class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DatasetType {
    /// Handwritten digits.
    #[default]
    Mnist,
    /// Zalando clothing images.
    FashionMnist,
}

impl DatasetType {
    /// Human-readable dataset name.
    pub fn name(&self) -> &'static str {
        match self {
            DatasetType::Mnist => "MNIST",
            DatasetType::FashionMnist => "Fashion-MNIST",
        }
    }

    /// All class names, indexed by label.
    pub fn label_names(&self) -> &'static [&'static str] {
        match self {
            DatasetType::Mnist => &MNIST_LABELS,
            DatasetType::FashionMnist => &FASHION_LABELS,
        }
    }

    /// Class name for a label, or `"Unknown"` when out of range.
    pub fn label_name(&self, label: usize) -> &'static str {
        self.label_names().get(label).copied().unwrap_or("Unknown")
    }

    /// Ten-entry RGB palette, indexed by label.
    pub fn palette(&self) -> &'static [[f32; 3]; 10] {
        match self {
            DatasetType::Mnist => &MNIST_PALETTE,
            DatasetType::FashionMnist => &FASHION_PALETTE,
        }
    }

    /// Color for a dominant class. Unclassified and out-of-range classes map
    /// to [`NEUTRAL_COLOR`].
    pub fn color_for(&self, class: Option<usize>) -> [f32; 3] {
        class
            .and_then(|c| self.palette().get(c).copied())
            .unwrap_or(NEUTRAL_COLOR)
    }
}

/// A labeled feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Class label.
    pub label: usize,
    /// Features normalized to `[0, 1]`.
    pub features: Vec<f32>,
    /// Dataset family this sample belongs to.
    pub dataset_type: DatasetType,
}

impl Sample {
    /// Creates a new sample.
    pub fn new(label: usize, features: Vec<f32>, dataset_type: DatasetType) -> Self {
        Self {
            label,
            features,
            dataset_type,
        }
    }
}
