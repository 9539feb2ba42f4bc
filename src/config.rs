//! Configuration for the kohonen3d engine.

use crate::error::{KohonenError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lattice geometry.
    pub lattice: LatticeConfig,

    /// Training schedule.
    pub training: TrainingConfig,

    /// Evaluation settings.
    pub evaluation: EvaluationConfig,
}

impl Config {
    /// Loads a configuration from a JSON file.
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(KohonenError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        self.lattice.validate()?;
        self.training.validate()?;
        if self.evaluation.num_classes == 0 {
            return Err(KohonenError::Config(
                "num_classes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lattice geometry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    /// Number of neurons along x.
    /// Default: 10.
    pub width: usize,

    /// Number of neurons along y.
    /// Default: 10.
    pub height: usize,

    /// Number of neurons along z.
    /// Default: 10.
    pub depth: usize,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            depth: 10,
        }
    }
}

impl LatticeConfig {
    /// Returns the total number of neurons in the lattice.
    #[inline]
    pub fn total_neurons(&self) -> usize {
        self.width * self.height * self.depth
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(KohonenError::Config(format!(
                "lattice dimensions must be non-zero, got {}x{}x{}",
                self.width, self.height, self.depth
            )));
        }
        Ok(())
    }
}

/// Training schedule configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of passes over the training set.
    /// Default: 50.
    pub epochs: usize,

    /// Learning rate at epoch 0.
    /// Default: 0.5.
    pub initial_learning_rate: f32,

    /// The decay constant is `epochs / decay_divisor`.
    /// Default: 3.0.
    pub decay_divisor: f32,

    /// Random seed for reproducibility.
    /// Default: None (seeded from system entropy).
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            initial_learning_rate: 0.5,
            decay_divisor: 3.0,
            seed: None,
        }
    }
}

impl TrainingConfig {
    fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(KohonenError::Config("epochs must be at least 1".to_string()));
        }
        if !(self.initial_learning_rate > 0.0) {
            return Err(KohonenError::Config(format!(
                "initial_learning_rate must be positive, got {}",
                self.initial_learning_rate
            )));
        }
        if !(self.decay_divisor > 0.0) {
            return Err(KohonenError::Config(format!(
                "decay_divisor must be positive, got {}",
                self.decay_divisor
            )));
        }
        Ok(())
    }
}

/// Evaluation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Size of the confusion matrix.
    /// Default: 10.
    pub num_classes: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { num_classes: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.lattice.total_neurons(), 1000);
        assert_eq!(config.training.epochs, 50);
        assert!((config.training.initial_learning_rate - 0.5).abs() < 1e-6);
        assert_eq!(config.evaluation.num_classes, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_dimension() {
        let mut config = Config::default();
        config.lattice.depth = 0;
        assert!(matches!(config.validate(), Err(KohonenError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_epochs() {
        let mut config = Config::default();
        config.training.epochs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json() {
        let config: Config =
            serde_json::from_str(r#"{"lattice": {"width": 4}, "training": {"seed": 7}}"#).unwrap();
        assert_eq!(config.lattice.width, 4);
        assert_eq!(config.lattice.height, 10);
        assert_eq!(config.training.seed, Some(7));
        assert_eq!(config.training.epochs, 50);
    }
}
