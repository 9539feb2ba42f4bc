//! Online SOM training with exponentially decaying schedules.

use crate::dataset::Sample;
use crate::error::{KohonenError, Result};
use crate::som::KohonenNetwork;
use log::{debug, info};
use rand::seq::SliceRandom;

/// Learning-rate and radius schedule over a fixed number of epochs.
///
/// Both quantities decay as `exp(−epoch / τ)` with `τ = epochs / decay_divisor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    initial_learning_rate: f32,
    initial_radius: f32,
    tau: f32,
}

impl Schedule {
    /// Builds a schedule for `epochs` passes.
    ///
    /// Returns an error for `epochs == 0`, which would make `τ` zero.
    pub fn new(
        epochs: usize,
        initial_learning_rate: f32,
        initial_radius: f32,
        decay_divisor: f32,
    ) -> Result<Self> {
        if epochs == 0 {
            return Err(KohonenError::Training(
                "epoch count must be at least 1".to_string(),
            ));
        }
        if !(decay_divisor > 0.0) {
            return Err(KohonenError::Training(format!(
                "decay divisor must be positive, got {}",
                decay_divisor
            )));
        }

        Ok(Self {
            initial_learning_rate,
            initial_radius,
            tau: epochs as f32 / decay_divisor,
        })
    }

    /// Computes the learning rate at a given epoch.
    #[inline]
    pub fn learning_rate(&self, epoch: usize) -> f32 {
        self.initial_learning_rate * self.decay(epoch)
    }

    /// Computes the neighborhood radius at a given epoch.
    #[inline]
    pub fn radius(&self, epoch: usize) -> f32 {
        self.initial_radius * self.decay(epoch)
    }

    #[inline]
    fn decay(&self, epoch: usize) -> f32 {
        (-(epoch as f32) / self.tau).exp()
    }
}

/// Statistics for one completed epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochStats {
    /// Zero-based epoch index.
    pub epoch: usize,
    /// Total number of epochs in the run.
    pub epochs: usize,
    /// Learning rate used in this epoch.
    pub learning_rate: f32,
    /// Neighborhood radius used in this epoch.
    pub radius: f32,
    /// Mean distance from each sample to its BMU, measured before the update.
    pub quantization_error: f32,
}

impl KohonenNetwork {
    /// Builds the schedule this network uses for an `epochs`-long run.
    pub fn schedule(&self, epochs: usize) -> Result<Schedule> {
        Schedule::new(
            epochs,
            self.training.initial_learning_rate,
            self.lattice.max_dimension() as f32 / 2.0,
            self.training.decay_divisor,
        )
    }

    /// Trains the network, then labels, prototypes and colors every neuron.
    pub fn train(&mut self, dataset: &[Sample], epochs: usize) -> Result<()> {
        self.train_with_progress(dataset, epochs, |_| {})
    }

    /// Like [`KohonenNetwork::train`], calling `on_epoch` after every epoch.
    pub fn train_with_progress<F>(
        &mut self,
        dataset: &[Sample],
        epochs: usize,
        mut on_epoch: F,
    ) -> Result<()>
    where
        F: FnMut(&EpochStats),
    {
        let schedule = self.schedule(epochs)?;
        if dataset.is_empty() {
            return Err(KohonenError::EmptyInput(
                "No training samples provided".to_string(),
            ));
        }
        self.check_dimensions(dataset)?;

        self.dataset_type = dataset[0].dataset_type;
        info!(
            "Starting training for {} epochs on {} {} samples ({} neurons)",
            epochs,
            dataset.len(),
            self.dataset_type.name(),
            self.lattice.len()
        );

        let mut order: Vec<usize> = Vec::with_capacity(dataset.len());

        for epoch in 0..epochs {
            self.current_epoch = epoch;
            let learning_rate = schedule.learning_rate(epoch);
            let radius = schedule.radius(epoch);

            self.shuffle_order(&mut order, dataset.len());

            let mut total_distance = 0.0f64;
            for &idx in &order {
                let (_, distance) = self.train_step(&dataset[idx], learning_rate, radius);
                total_distance += distance as f64;
            }

            let stats = EpochStats {
                epoch,
                epochs,
                learning_rate,
                radius,
                quantization_error: (total_distance / dataset.len() as f64) as f32,
            };

            if epoch % 10 == 0 || epoch == epochs - 1 {
                info!(
                    "Epoch {}/{}: lr={:.4}, radius={:.3}, qe={:.4}",
                    epoch, epochs, learning_rate, radius, stats.quantization_error
                );
            } else {
                debug!(
                    "Epoch {}/{}: lr={:.4}, radius={:.3}, qe={:.4}",
                    epoch, epochs, learning_rate, radius, stats.quantization_error
                );
            }
            on_epoch(&stats);
        }

        self.classify_neurons(dataset);
        self.find_prototypes(dataset);
        self.update_colors();

        info!("Training completed");
        Ok(())
    }

    /// Refills `order` with `0..len` and shuffles it.
    pub(super) fn shuffle_order(&mut self, order: &mut Vec<usize>, len: usize) {
        order.clear();
        order.extend(0..len);
        order.shuffle(&mut self.rng);
    }

    /// Performs one online update for a single sample.
    ///
    /// Returns the BMU index and the sample's distance to it before the
    /// update. Only the BMU's activation counter is incremented.
    pub fn train_step(&mut self, sample: &Sample, learning_rate: f32, radius: f32) -> (usize, f32) {
        let (bmu, distance) = self.lattice.find_bmu_with_distance(&sample.features);
        self.lattice.update(&sample.features, bmu, learning_rate, radius);
        self.lattice.neurons_mut()[bmu].activation_count += 1;
        (bmu, distance)
    }
}
