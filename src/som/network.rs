//! The trainable network: a lattice plus the state that drives it.

use crate::config::{Config, TrainingConfig};
use crate::dataset::{DatasetType, Sample};
use crate::error::{KohonenError, Result};
use crate::metrics::{ClassificationResult, Metrics, MetricsReport};
use crate::som::lattice::linear_index;
use crate::som::{Lattice, Neuron};
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// A Kohonen network over a 3D lattice.
///
/// The network owns a single random stream used both for weight
/// initialization and for the per-epoch shuffles, so a seeded network
/// trains deterministically.
#[derive(Debug, Clone)]
pub struct KohonenNetwork {
    pub(super) lattice: Lattice,
    pub(super) rng: ChaCha8Rng,
    pub(super) training: TrainingConfig,
    pub(super) num_classes: usize,
    pub(super) current_epoch: usize,
    pub(super) dataset_type: DatasetType,
}

impl KohonenNetwork {
    /// Creates a network with zero weights, seeded from system entropy.
    ///
    /// Call [`KohonenNetwork::initialize`] before training.
    pub fn new(width: usize, height: usize, depth: usize, input_size: usize) -> Result<Self> {
        let lattice = Lattice::new(width, height, depth, input_size)?;
        Ok(Self::from_lattice(lattice, None))
    }

    /// Creates a network from a full configuration.
    pub fn from_config(config: &Config, input_size: usize) -> Result<Self> {
        config.validate()?;
        let lattice = Lattice::new(
            config.lattice.width,
            config.lattice.height,
            config.lattice.depth,
            input_size,
        )?;

        let mut network = Self::from_lattice(lattice, config.training.seed);
        network.training = config.training.clone();
        network.num_classes = config.evaluation.num_classes;
        Ok(network)
    }

    /// Wraps an existing lattice, keeping its weights.
    pub fn from_lattice(lattice: Lattice, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            lattice,
            rng,
            training: TrainingConfig::default(),
            num_classes: 10,
            current_epoch: 0,
            dataset_type: DatasetType::default(),
        }
    }

    /// Restarts the random stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Draws every weight from `U[0, 1)` using the network's random stream.
    pub fn initialize(&mut self) {
        self.lattice.initialize(&mut self.rng);
        info!("Network initialized with {} neurons", self.lattice.len());
    }

    /// The underlying lattice.
    #[inline]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// All neurons in linear index order.
    #[inline]
    pub fn neurons(&self) -> &[Neuron] {
        self.lattice.neurons()
    }

    /// Training schedule settings.
    #[inline]
    pub fn training_config(&self) -> &TrainingConfig {
        &self.training
    }

    /// Replaces the training schedule settings. The seed field is ignored;
    /// use [`KohonenNetwork::reseed`].
    pub fn set_training_config(&mut self, training: TrainingConfig) {
        self.training = training;
    }

    /// Size of the confusion matrix built by [`KohonenNetwork::evaluate_on_dataset`].
    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Sets the evaluation class count.
    pub fn set_num_classes(&mut self, num_classes: usize) {
        self.num_classes = num_classes;
    }

    /// Index of the epoch most recently started by training.
    #[inline]
    pub fn current_epoch(&self) -> usize {
        self.current_epoch
    }

    /// Dataset family the network was last trained on.
    #[inline]
    pub fn dataset_type(&self) -> DatasetType {
        self.dataset_type
    }

    /// Overrides the dataset family used for coloring and reports.
    pub fn set_dataset_type(&mut self, dataset_type: DatasetType) {
        self.dataset_type = dataset_type;
    }

    /// Checks that every sample has one feature per weight.
    pub fn check_dimensions(&self, dataset: &[Sample]) -> Result<()> {
        let input_size = self.lattice.input_size();
        match dataset.iter().find(|s| s.features.len() != input_size) {
            Some(bad) => Err(KohonenError::DimensionMismatch {
                expected: input_size,
                actual: bad.features.len(),
            }),
            None => Ok(()),
        }
    }

    /// Classifies one sample by its BMU's dominant class.
    ///
    /// The confidence is the distance to the BMU; lower is a tighter match.
    pub fn classify_sample(&self, sample: &Sample) -> ClassificationResult {
        let (bmu, distance) = self.lattice.find_bmu_with_distance(&sample.features);
        ClassificationResult {
            predicted: self.lattice.neurons()[bmu].dominant_class,
            truth: sample.label,
            confidence: distance,
        }
    }

    /// Classifies every sample and summarizes the results.
    ///
    /// Samples are assumed to match the lattice's input size; see
    /// [`KohonenNetwork::check_dimensions`].
    pub fn evaluate_on_dataset(&self, dataset: &[Sample]) -> MetricsReport {
        info!("Evaluating network on {} samples", dataset.len());

        let results: Vec<ClassificationResult> = dataset
            .par_iter()
            .map(|sample| self.classify_sample(sample))
            .collect();

        let dataset_type = dataset
            .first()
            .map(|s| s.dataset_type)
            .unwrap_or(self.dataset_type);

        let report = Metrics::evaluate_classification(&results, dataset_type, self.num_classes);
        info!("Evaluation completed: accuracy {:.4}", report.accuracy);
        report
    }

    /// Read-only view for display collaborators.
    pub fn view(&self) -> LatticeView<'_> {
        LatticeView {
            neurons: self.lattice.neurons(),
            width: self.lattice.width(),
            height: self.lattice.height(),
            depth: self.lattice.depth(),
            input_size: self.lattice.input_size(),
            current_epoch: self.current_epoch,
            dataset_type: self.dataset_type,
        }
    }
}

/// A borrowed, read-only snapshot of a network for rendering.
///
/// Viewers receive this explicitly instead of reaching into the network.
#[derive(Debug, Clone, Copy)]
pub struct LatticeView<'a> {
    /// Neurons in linear index order.
    pub neurons: &'a [Neuron],
    /// Number of neurons along x.
    pub width: usize,
    /// Number of neurons along y.
    pub height: usize,
    /// Number of neurons along z.
    pub depth: usize,
    /// Length of every weight and prototype vector.
    pub input_size: usize,
    /// Last epoch started by training.
    pub current_epoch: usize,
    /// Dataset family used for colors.
    pub dataset_type: DatasetType,
}

impl<'a> LatticeView<'a> {
    /// Neuron at grid coordinates `(x, y, z)`.
    pub fn neuron_at(&self, x: usize, y: usize, z: usize) -> Option<&'a Neuron> {
        if x < self.width && y < self.height && z < self.depth {
            self.neurons.get(linear_index(self.width, self.height, x, y, z))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(label: usize, value: f32) -> Sample {
        Sample::new(label, vec![value], DatasetType::Mnist)
    }

    #[test]
    fn test_seeded_initialization_is_reproducible() {
        let mut config = Config::default();
        config.lattice.width = 3;
        config.lattice.height = 3;
        config.lattice.depth = 3;
        config.training.seed = Some(42);

        let mut a = KohonenNetwork::from_config(&config, 8).unwrap();
        let mut b = KohonenNetwork::from_config(&config, 8).unwrap();
        a.initialize();
        b.initialize();
        assert_eq!(a.neurons(), b.neurons());

        b.reseed(43);
        b.initialize();
        assert_ne!(a.neurons(), b.neurons());
    }

    #[test]
    fn test_classify_sample() {
        let lattice = Lattice::with_weights(2, 1, 1, vec![vec![0.0], vec![1.0]]).unwrap();
        let mut network = KohonenNetwork::from_lattice(lattice, Some(1));
        network.lattice.neurons_mut()[1].dominant_class = Some(3);

        let result = network.classify_sample(&sample(3, 0.9));
        assert_eq!(result.predicted, Some(3));
        assert_eq!(result.truth, 3);
        assert!((result.confidence - 0.1).abs() < 1e-6);

        let result = network.classify_sample(&sample(3, 0.2));
        assert_eq!(result.predicted, None);
    }

    #[test]
    fn test_evaluate_empty_dataset() {
        let mut network = KohonenNetwork::new(2, 2, 2, 4).unwrap();
        network.set_dataset_type(DatasetType::FashionMnist);
        let report = network.evaluate_on_dataset(&[]);
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.dataset_type, DatasetType::FashionMnist);
        assert_eq!(report.confusion_matrix.len(), 10);
    }

    #[test]
    fn test_check_dimensions() {
        let network = KohonenNetwork::new(2, 2, 1, 4).unwrap();
        let good = Sample::new(1, vec![0.0; 4], DatasetType::Mnist);
        let bad = Sample::new(1, vec![0.0; 9], DatasetType::Mnist);

        assert!(network.check_dimensions(&[]).is_ok());
        assert!(network.check_dimensions(&[good.clone()]).is_ok());
        assert!(matches!(
            network.check_dimensions(&[good, bad]),
            Err(KohonenError::DimensionMismatch {
                expected: 4,
                actual: 9
            })
        ));
    }

    #[test]
    fn test_view() {
        let network = KohonenNetwork::new(3, 2, 2, 5).unwrap();
        let view = network.view();
        assert_eq!(view.neurons.len(), 12);
        assert_eq!((view.width, view.height, view.depth), (3, 2, 2));
        assert!(std::ptr::eq(
            view.neuron_at(2, 1, 1).unwrap(),
            &network.neurons()[network.lattice().index_of(2, 1, 1)]
        ));
        assert!(view.neuron_at(3, 0, 0).is_none());
    }
}
