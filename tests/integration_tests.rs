//! Integration tests for the kohonen3d engine.

use kohonen3d::dataset::idx::{encode_idx, IMAGES_MAGIC, LABELS_MAGIC};
use kohonen3d::dataset::npy::encode_npy_u8;
use kohonen3d::{
    load_idx_dataset, samples_from_npy, save_atlas, ClassificationResult, Config, DatasetType,
    KohonenNetwork, Lattice, Metrics, NpyArray, Sample,
};
use tempfile::tempdir;

/// Two well-separated clusters of 4-dimensional vectors.
fn create_clustered_dataset(per_class: usize) -> Vec<Sample> {
    let mut samples = Vec::new();
    for k in 0..per_class {
        let jitter = k as f32 * 0.01;
        samples.push(Sample::new(
            0,
            vec![0.9 - jitter, 0.85 + jitter, 0.1, 0.05 + jitter],
            DatasetType::Mnist,
        ));
        samples.push(Sample::new(
            1,
            vec![0.1 + jitter, 0.05, 0.9 - jitter, 0.95 - jitter],
            DatasetType::Mnist,
        ));
    }
    samples
}

fn small_config(seed: u64) -> Config {
    let mut config = Config::default();
    config.lattice.width = 3;
    config.lattice.height = 3;
    config.lattice.depth = 2;
    config.training.epochs = 15;
    config.training.seed = Some(seed);
    config.evaluation.num_classes = 2;
    config
}

#[test]
fn test_end_to_end_training() {
    let dataset = create_clustered_dataset(10);
    let config = small_config(42);

    let mut network = KohonenNetwork::from_config(&config, 4).unwrap();
    network.initialize();
    network.train(&dataset, config.training.epochs).unwrap();

    // Weight length is preserved.
    assert!(network.neurons().iter().all(|n| n.weights.len() == 4));

    // Every sample was a BMU exactly once per epoch.
    let activations: u32 = network.neurons().iter().map(|n| n.activation_count).sum();
    assert_eq!(activations as usize, dataset.len() * config.training.epochs);

    // Both classes are represented on the map.
    let classes: std::collections::BTreeSet<usize> = network
        .neurons()
        .iter()
        .filter_map(|n| n.dominant_class)
        .collect();
    assert_eq!(classes.into_iter().collect::<Vec<_>>(), vec![0, 1]);

    // Classified neurons carry a prototype and a palette color.
    for neuron in network.neurons() {
        match neuron.dominant_class {
            Some(class) => {
                assert!(neuron.prototype.is_some());
                assert_eq!(neuron.color, DatasetType::Mnist.palette()[class]);
            }
            None => assert!(neuron.prototype.is_none()),
        }
    }

    let report = network.evaluate_on_dataset(&dataset);
    assert!(report.accuracy >= 0.9, "accuracy {}", report.accuracy);
    assert_eq!(report.confusion_matrix.len(), 2);
    let total: u32 = report.confusion_matrix.iter().flatten().sum();
    assert_eq!(total as usize, dataset.len());
}

#[test]
fn test_seeded_runs_match() {
    let dataset = create_clustered_dataset(5);
    let config = small_config(7);

    let run = || {
        let mut network = KohonenNetwork::from_config(&config, 4).unwrap();
        network.initialize();
        network.train(&dataset, config.training.epochs).unwrap();
        network.neurons().to_vec()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_two_neuron_bmu_scenario() {
    let lattice = Lattice::with_weights(2, 1, 1, vec![vec![0.0], vec![1.0]]).unwrap();
    assert_eq!(lattice.find_bmu(&[0.1]), 0);
    assert_eq!(lattice.find_bmu(&[0.9]), 1);
}

#[test]
fn test_majority_labels_scenario() {
    let lattice = Lattice::with_weights(2, 1, 1, vec![vec![0.0], vec![1.0]]).unwrap();
    let mut network = KohonenNetwork::from_lattice(lattice, Some(0));
    let dataset = vec![
        Sample::new(0, vec![0.1], DatasetType::Mnist),
        Sample::new(0, vec![0.2], DatasetType::Mnist),
        Sample::new(1, vec![0.9], DatasetType::Mnist),
    ];
    network.classify_neurons(&dataset);

    assert_eq!(network.neurons()[0].dominant_class, Some(0));
    assert_eq!(network.neurons()[1].dominant_class, Some(1));
}

#[test]
fn test_confusion_scenarios() {
    let results = vec![
        ClassificationResult::new(Some(1), 1, 0.0),
        ClassificationResult::new(Some(0), 1, 0.0),
    ];
    let report = Metrics::evaluate_classification(&results, DatasetType::Mnist, 2);
    assert_eq!(report.confusion_matrix, vec![vec![0, 0], vec![1, 1]]);
    assert!((report.f1[1] - 0.6667).abs() < 1e-3);

    assert_eq!(Metrics::confusion_matrix(&[], 5), vec![vec![0u32; 5]; 5]);

    let out_of_range = vec![
        ClassificationResult::new(Some(2), 2, 0.0),
        ClassificationResult::new(Some(1), 2, 0.0),
    ];
    let report = Metrics::evaluate_classification(&out_of_range, DatasetType::Mnist, 2);
    assert!(report.confusion_matrix.iter().flatten().all(|&c| c == 0));
    assert!(report.accuracy > 0.0);
}

#[test]
fn test_idx_files_to_report() {
    let dir = tempdir().unwrap();
    let images_path = dir.path().join("images-idx3-ubyte");
    let labels_path = dir.path().join("labels-idx1-ubyte");

    // Six 2x2 images: three dark ones labelled 0, three bright ones labelled 1.
    let mut pixels = Vec::new();
    let mut labels = Vec::new();
    for i in 0..6u8 {
        let v = if i % 2 == 0 { 10 + i } else { 240 - i };
        pixels.extend_from_slice(&[v; 4]);
        labels.push(i % 2);
    }
    std::fs::write(&images_path, encode_idx(IMAGES_MAGIC, &[6, 2, 2], &pixels)).unwrap();
    std::fs::write(&labels_path, encode_idx(LABELS_MAGIC, &[6], &labels)).unwrap();

    let dataset =
        load_idx_dataset(&images_path, &labels_path, DatasetType::FashionMnist, None).unwrap();
    assert_eq!(dataset.len(), 6);
    assert_eq!(dataset[1].label, 1);
    assert!(dataset.iter().all(|s| s.features.len() == 4));
    assert!(dataset
        .iter()
        .flat_map(|s| s.features.iter())
        .all(|&v| (0.0..=1.0).contains(&v)));

    let limited =
        load_idx_dataset(&images_path, &labels_path, DatasetType::FashionMnist, Some(4)).unwrap();
    assert_eq!(limited.len(), 4);

    let mut network = KohonenNetwork::new(2, 2, 1, 4).unwrap();
    network.reseed(5);
    network.initialize();
    network.train(&dataset, 10).unwrap();
    assert_eq!(network.dataset_type(), DatasetType::FashionMnist);

    let report = network.evaluate_on_dataset(&dataset);
    let report_path = dir.path().join("report.tsv");
    report.save_tsv(&report_path).unwrap();

    let text = std::fs::read_to_string(&report_path).unwrap();
    assert!(text.starts_with("Classification Report - Fashion-MNIST"));
    assert!(text.contains("Class\tPrecision\tRecall\tF1-Score"));
    assert!(text.contains("Ankle boot\t"));

    let atlas_path = dir.path().join("atlas.png");
    save_atlas(&network.view(), 3, &atlas_path).unwrap();
    assert!(std::fs::metadata(&atlas_path).unwrap().len() > 0);
}

#[test]
fn test_npy_files_to_samples() {
    let dir = tempdir().unwrap();
    let images_path = dir.path().join("images.npy");
    let labels_path = dir.path().join("labels.npy");

    std::fs::write(&images_path, encode_npy_u8(&[3, 2, 2], &[0, 255, 0, 255, 51, 51, 51, 51, 255, 0, 255, 0])).unwrap();
    std::fs::write(&labels_path, encode_npy_u8(&[3], &[1, 2, 3])).unwrap();

    let images = NpyArray::load(&images_path).unwrap();
    let labels = NpyArray::load(&labels_path).unwrap();
    assert_eq!(images.shape, vec![3, 2, 2]);

    let samples = samples_from_npy(&images, &labels, DatasetType::Mnist).unwrap();
    assert_eq!(samples.len(), 3);
    assert_eq!(samples[2].label, 3);
    assert_eq!(samples[0].features, vec![0.0, 1.0, 0.0, 1.0]);
    assert!((samples[1].features[0] - 0.2).abs() < 1e-6);
}

#[test]
fn test_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"lattice": {"width": 5, "height": 4, "depth": 3}, "training": {"epochs": 8, "seed": 11}}"#,
    )
    .unwrap();

    let config = Config::from_json_file(&path).unwrap();
    assert_eq!(config.lattice.total_neurons(), 60);
    assert_eq!(config.training.epochs, 8);

    let network = KohonenNetwork::from_config(&config, 9).unwrap();
    assert_eq!(network.lattice().len(), 60);
    assert_eq!(network.lattice().max_dimension(), 5);

    std::fs::write(&path, r#"{"lattice": {"width": 0}}"#).unwrap();
    assert!(Config::from_json_file(&path).is_err());
    assert!(Config::from_json_file(dir.path().join("missing.json")).is_err());
}
