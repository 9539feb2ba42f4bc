//! # kohonen3d - Self-Organizing Maps in three dimensions
//!
//! kohonen3d trains a Kohonen self-organizing map whose neurons sit on a
//! rectangular 3D lattice, then turns the trained map into a classifier for
//! labeled image vectors such as MNIST and Fashion-MNIST.
//!
//! ## Overview
//!
//! Training is unsupervised: each sample pulls its best-matching unit (BMU)
//! and the BMU's lattice neighbors towards it, with a learning rate and a
//! neighborhood radius that both decay exponentially over the epochs. After
//! training, two passes over the training set give every neuron a dominant
//! class (majority vote of the samples it wins) and a prototype (the won
//! sample closest to its weights). A sample is then classified by the
//! dominant class of its BMU.
//!
//! ## Architecture
//!
//! - [`som`] - lattice, training engine and post-training labeling
//! - [`metrics`] - accuracy, confusion matrix and precision/recall/F1
//! - [`dataset`] - samples plus IDX and NPY loaders
//! - [`render`] - PNG atlas of the trained prototypes
//! - [`config`] - serde configuration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kohonen3d::{load_idx_dataset, Config, DatasetType, KohonenNetwork};
//!
//! let train = load_idx_dataset("train-images-idx3-ubyte", "train-labels-idx1-ubyte",
//!     DatasetType::Mnist, Some(10_000))?;
//! let test = load_idx_dataset("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte",
//!     DatasetType::Mnist, None)?;
//!
//! let config = Config::default();
//! let mut network = KohonenNetwork::from_config(&config, train[0].features.len())?;
//! network.initialize();
//! network.train(&train, config.training.epochs)?;
//!
//! let report = network.evaluate_on_dataset(&test);
//! println!("{}", report);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod render;
pub mod som;

// Re-export commonly used types
pub use config::{Config, EvaluationConfig, LatticeConfig, TrainingConfig};
pub use dataset::{load_idx_dataset, samples_from_npy, DatasetType, NpyArray, Sample};
pub use error::{KohonenError, Result};
pub use metrics::{ClassScores, ClassificationResult, Metrics, MetricsReport};
pub use render::{prototype_atlas, save_atlas};
pub use som::{EpochStats, KohonenNetwork, Lattice, LatticeView, Neuron, Schedule};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of classes in both supported datasets.
pub const DEFAULT_NUM_CLASSES: usize = 10;

/// Feature length of a 28×28 image.
pub const MNIST_INPUT_SIZE: usize = 28 * 28;
