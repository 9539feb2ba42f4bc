//! kohonen3d CLI - 3D Self-Organizing Map classifier
//!
//! Command-line interface for training a lattice on MNIST-style data and
//! evaluating it as a classifier.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use kohonen3d::dataset::{read_idx_images, IdxHeader};
use kohonen3d::{
    load_idx_dataset, samples_from_npy, save_atlas, Config, DatasetType, KohonenNetwork,
    NpyArray, Result, Sample,
};
use log::error;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "kohonen3d")]
#[command(version)]
#[command(about = "3D Self-Organizing Map classifier", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DatasetArg {
    /// Handwritten digits
    Mnist,
    /// Zalando clothing images
    Fashion,
}

impl From<DatasetArg> for DatasetType {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::Mnist => DatasetType::Mnist,
            DatasetArg::Fashion => DatasetType::FashionMnist,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Train a lattice and evaluate it
    Train {
        /// Training images (IDX or .npy)
        #[arg(long)]
        train_images: PathBuf,

        /// Training labels (IDX or .npy)
        #[arg(long)]
        train_labels: PathBuf,

        /// Test images; the training set is reused when omitted
        #[arg(long, requires = "test_labels")]
        test_images: Option<PathBuf>,

        /// Test labels
        #[arg(long, requires = "test_images")]
        test_labels: Option<PathBuf>,

        /// Dataset family, used for class names and colors
        #[arg(short, long, value_enum, default_value = "mnist")]
        dataset: DatasetArg,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Lattice width (overrides config)
        #[arg(long)]
        width: Option<usize>,

        /// Lattice height (overrides config)
        #[arg(long)]
        height: Option<usize>,

        /// Lattice depth (overrides config)
        #[arg(long)]
        depth: Option<usize>,

        /// Number of epochs (overrides config)
        #[arg(short = 'n', long)]
        epochs: Option<usize>,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Use at most this many samples from each file
        #[arg(short, long)]
        max_samples: Option<usize>,

        /// Save the report as TSV
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Save a PNG atlas of the neuron prototypes
        #[arg(short, long)]
        atlas: Option<PathBuf>,

        /// Screen pixels per prototype pixel in the atlas
        #[arg(long, default_value = "2")]
        scale: u32,
    },

    /// Show the header of an IDX or .npy file
    Inspect {
        /// File to inspect
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = match cli.command {
        Commands::Train {
            train_images,
            train_labels,
            test_images,
            test_labels,
            dataset,
            config,
            width,
            height,
            depth,
            epochs,
            seed,
            max_samples,
            report,
            atlas,
            scale,
        } => {
            let test = test_images.zip(test_labels);
            load_config(config, width, height, depth, epochs, seed).and_then(|config| {
                train(TrainArgs {
                    train: (train_images, train_labels),
                    test,
                    dataset_type: dataset.into(),
                    config,
                    max_samples,
                    report,
                    atlas,
                    scale,
                })
            })
        }

        Commands::Inspect { file } => inspect(&file),
    };

    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

struct TrainArgs {
    train: (PathBuf, PathBuf),
    test: Option<(PathBuf, PathBuf)>,
    dataset_type: DatasetType,
    config: Config,
    max_samples: Option<usize>,
    report: Option<PathBuf>,
    atlas: Option<PathBuf>,
    scale: u32,
}

fn load_config(
    path: Option<PathBuf>,
    width: Option<usize>,
    height: Option<usize>,
    depth: Option<usize>,
    epochs: Option<usize>,
    seed: Option<u64>,
) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    if let Some(w) = width {
        config.lattice.width = w;
    }
    if let Some(h) = height {
        config.lattice.height = h;
    }
    if let Some(d) = depth {
        config.lattice.depth = d;
    }
    if let Some(e) = epochs {
        config.training.epochs = e;
    }
    if seed.is_some() {
        config.training.seed = seed;
    }

    config.validate()?;
    Ok(config)
}

fn is_npy(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("npy"))
}

fn load_samples(
    images: &Path,
    labels: &Path,
    dataset_type: DatasetType,
    max_samples: Option<usize>,
) -> Result<Vec<Sample>> {
    if is_npy(images) {
        let mut samples = samples_from_npy(
            &NpyArray::load(images)?,
            &NpyArray::load(labels)?,
            dataset_type,
        )?;
        if let Some(max) = max_samples {
            samples.truncate(max);
        }
        Ok(samples)
    } else {
        load_idx_dataset(images, labels, dataset_type, max_samples)
    }
}

fn train(args: TrainArgs) -> Result<()> {
    let start_time = Instant::now();
    let config = args.config;

    println!("kohonen3d - 3D Self-Organizing Map");
    println!("   Training data: {}", args.train.0.display());
    println!();

    let spinner_style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap();

    let bar_style = ProgressStyle::default_bar()
        .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} epochs ETA: {eta}")
        .unwrap()
        .progress_chars("█▓▒░  ");

    // Step 1: Load data
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style.clone());
    pb.set_message("Loading samples...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let train_set = load_samples(&args.train.0, &args.train.1, args.dataset_type, args.max_samples)?;
    let test_set = match &args.test {
        Some((images, labels)) => Some(load_samples(images, labels, args.dataset_type, args.max_samples)?),
        None => None,
    };

    pb.finish_and_clear();
    let input_size = match train_set.first() {
        Some(sample) => sample.features.len(),
        None => {
            return Err(kohonen3d::KohonenError::EmptyInput(format!(
                "{} contains no samples",
                args.train.0.display()
            )))
        }
    };
    println!(
        "✓ Loaded {} training samples ({} features)",
        train_set.len(),
        input_size
    );
    if let Some(test) = &test_set {
        println!("✓ Loaded {} test samples", test.len());
    }

    // Step 2: Initialize the lattice
    let mut network = KohonenNetwork::from_config(&config, input_size)?;
    if let Some(test) = &test_set {
        network.check_dimensions(test)?;
    }
    network.initialize();
    println!(
        "✓ Initialized lattice ({}x{}x{} = {} neurons)",
        config.lattice.width,
        config.lattice.height,
        config.lattice.depth,
        config.lattice.total_neurons()
    );

    // Step 3: Train
    println!();
    let pb = ProgressBar::new(config.training.epochs as u64);
    pb.set_style(bar_style);
    pb.set_message("Training...");

    network.train_with_progress(&train_set, config.training.epochs, |stats| {
        pb.set_message(format!(
            "Training: lr={:.4} radius={:.3} qe={:.4}",
            stats.learning_rate, stats.radius, stats.quantization_error
        ));
        pb.inc(1);
    })?;

    pb.finish_and_clear();
    let classified = network
        .neurons()
        .iter()
        .filter(|n| n.dominant_class.is_some())
        .count();
    println!(
        "✓ Trained {} epochs, {} of {} neurons classified",
        config.training.epochs,
        classified,
        network.neurons().len()
    );

    // Step 4: Evaluate
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style);
    pb.set_message("Evaluating...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let eval_set = test_set.as_deref().unwrap_or(&train_set);
    let report = network.evaluate_on_dataset(eval_set);

    pb.finish_and_clear();
    println!();
    println!("{}", report);

    // Step 5: Outputs
    if let Some(path) = &args.report {
        report.save_tsv(path)?;
        println!("✓ Saved report to {}", path.display());
    }
    if let Some(path) = &args.atlas {
        save_atlas(&network.view(), args.scale, path)?;
        println!("✓ Saved prototype atlas to {}", path.display());
    }

    println!();
    println!("Done in {}", HumanDuration(start_time.elapsed()));

    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    println!("File: {}", path.display());

    if is_npy(path) {
        let array = NpyArray::load(path)?;
        println!("   Format: NPY");
        println!("   Dtype: {:?}", array.dtype);
        println!("   Shape: {:?}", array.shape);
        if let (Some(min), Some(max)) = (
            array.data.iter().copied().reduce(f32::min),
            array.data.iter().copied().reduce(f32::max),
        ) {
            println!("   Range: [{}, {}]", min, max);
        }
    } else {
        let bytes = std::fs::read(path)?;
        let header = IdxHeader::from_bytes(&bytes)?;
        println!("   Format: IDX");
        println!("   Magic: {}", header.magic);
        println!("   Dimensions: {:?}", header.dims);
        println!("   Items: {}", header.count());
        if header.dims.len() == 3 {
            let images = read_idx_images(path, Some(1))?;
            if let Some(first) = images.first() {
                let mean = first.iter().sum::<f32>() / first.len().max(1) as f32;
                println!("   First image mean intensity: {:.4}", mean);
            }
        }
    }

    Ok(())
}
