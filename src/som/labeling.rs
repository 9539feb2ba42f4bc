//! Post-training passes: dominant class, prototype sample and display color.

use crate::dataset::Sample;
use crate::som::KohonenNetwork;
use log::info;
use rayon::prelude::*;
use std::collections::BTreeMap;

impl KohonenNetwork {
    /// BMU index and distance for every sample, in dataset order.
    ///
    /// The lattice is not modified here, so the search runs in parallel.
    fn bmus_for(&self, dataset: &[Sample]) -> Vec<(usize, f32)> {
        dataset
            .par_iter()
            .map(|sample| self.lattice.find_bmu_with_distance(&sample.features))
            .collect()
    }

    /// Assigns each neuron the most frequent label among the samples it wins.
    ///
    /// Ties go to the lowest label. Neurons that win no sample are left
    /// unclassified.
    pub fn classify_neurons(&mut self, dataset: &[Sample]) {
        let bmus = self.bmus_for(dataset);

        let mut votes: Vec<BTreeMap<usize, usize>> = vec![BTreeMap::new(); self.lattice.len()];
        for (sample, &(bmu, _)) in dataset.iter().zip(&bmus) {
            *votes[bmu].entry(sample.label).or_insert(0) += 1;
        }

        let mut classified = 0;
        for (neuron, counts) in self.lattice.neurons_mut().iter_mut().zip(&votes) {
            let mut best: Option<(usize, usize)> = None;
            for (&label, &count) in counts {
                if best.map_or(true, |(_, c)| count > c) {
                    best = Some((label, count));
                }
            }
            neuron.dominant_class = best.map(|(label, _)| label);
            if best.is_some() {
                classified += 1;
            }
        }

        info!(
            "Classified {}/{} neurons",
            classified,
            self.lattice.len()
        );
    }

    /// Stores, for each neuron, the won sample closest to its weights.
    pub fn find_prototypes(&mut self, dataset: &[Sample]) {
        let bmus = self.bmus_for(dataset);

        let mut best: Vec<Option<(f32, usize)>> = vec![None; self.lattice.len()];
        for (sample_idx, &(bmu, distance)) in bmus.iter().enumerate() {
            if best[bmu].map_or(true, |(d, _)| distance < d) {
                best[bmu] = Some((distance, sample_idx));
            }
        }

        for (neuron, entry) in self.lattice.neurons_mut().iter_mut().zip(best) {
            neuron.prototype = entry.map(|(_, idx)| dataset[idx].features.clone());
        }
    }

    /// Recomputes every neuron's display color from its dominant class.
    pub fn update_colors(&mut self) {
        let dataset_type = self.dataset_type;
        for neuron in self.lattice.neurons_mut() {
            neuron.color = dataset_type.color_for(neuron.dominant_class);
        }
    }
}
