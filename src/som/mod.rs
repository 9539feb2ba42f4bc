//! Self-Organizing Map over a rectangular 3D lattice.
//!
//! - **Lattice**: neuron storage and grid arithmetic (lattice.rs)
//! - **Training**: online updates with decaying schedules (training.rs)
//! - **Labeling**: dominant class, prototypes and colors after training (labeling.rs)

mod labeling;
mod lattice;
mod network;
mod neuron;
pub mod training;

pub use lattice::Lattice;
pub use network::{KohonenNetwork, LatticeView};
pub use neuron::Neuron;
pub use training::{EpochStats, Schedule};
