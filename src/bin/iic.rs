//! `iic` binary — Invariant Information Clustering on image data.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin iic -- --train
//! cargo run --bin iic -- --train --heads 2 --save-weights iic.ot
//! cargo run --bin iic -- --eval --restore-weights iic.ot
//! cargo run --bin iic -- --config config.json --train
//! ```

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use infoclust::config::{DatasetKind, TrainingConfig};
use infoclust::dataset::{ImageDataset, MnistDataset, Split, SyntheticDigits};
use infoclust::trainer::IicTrainer;

/// Command-line arguments for the IIC binary.
#[derive(Parser, Debug)]
#[command(
    name = "iic",
    version,
    about = "Invariant Information Clustering trainer",
    long_about = None
)]
struct Args {
    /// Path to a JSON configuration file.
    ///
    /// If not provided, the default `TrainingConfig` is used.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the data directory from the config.
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Train the model.
    #[arg(long, default_value_t = false)]
    train: bool,

    /// Evaluate with restored weights instead of training.
    #[arg(long, default_value_t = false)]
    eval: bool,

    /// Number of cluster heads.
    #[arg(long)]
    heads: Option<usize>,

    /// Number of training epochs.
    #[arg(long)]
    epochs: Option<usize>,

    /// Train batch size.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Pixels to crop from each image axis.
    #[arg(long)]
    crop: Option<usize>,

    /// File name to store improved weights under.
    #[arg(long, value_name = "FILE")]
    save_weights: Option<String>,

    /// File name to restore weights from.
    #[arg(long, value_name = "FILE")]
    restore_weights: Option<String>,

    /// Use the deterministic synthetic dataset instead of MNIST files.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Enable CUDA training (overrides config `use_gpu`).
    #[arg(long, default_value_t = false)]
    cuda: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    let log_level_filter = args
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(log_level_filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    info!("IIC trainer v{}", infoclust::VERSION);

    let mut config = match args.config.as_deref() {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            match TrainingConfig::from_json(path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    error!("failed to load configuration: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => TrainingConfig::default(),
    };

    // Apply CLI overrides.
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(heads) = args.heads {
        config.heads = heads;
    }
    if let Some(epochs) = args.epochs {
        config.epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(crop) = args.crop {
        config.crop_size = crop;
    }
    if args.save_weights.is_some() {
        config.save_weights = args.save_weights;
    }
    if args.restore_weights.is_some() {
        config.restore_weights = args.restore_weights;
    }
    if args.synthetic {
        config.dataset = DatasetKind::Synthetic;
    }
    if args.cuda {
        config.use_gpu = true;
    }

    if let Err(e) = config.validate() {
        error!("configuration validation failed: {e}");
        std::process::exit(1);
    }

    info!("  dataset      : {:?}", config.dataset);
    info!("  crop size    : {}", config.crop_size);
    info!("  heads        : {}", config.heads);
    info!("  batch size   : {}", config.batch_size);
    info!("  epochs       : {}", config.epochs);
    info!("  learning rate: {}", config.learning_rate);
    info!("  device       : {}", if config.use_gpu { "GPU" } else { "CPU" });

    if let Err(e) = run(config, args.train, args.eval) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: TrainingConfig, train: bool, eval: bool) -> infoclust::TrainResult<()> {
    let (train_data, test_data): (Box<dyn ImageDataset>, Box<dyn ImageDataset>) =
        match config.dataset {
            DatasetKind::Mnist => (
                Box::new(MnistDataset::load(&config.data_dir, Split::Train)?),
                Box::new(MnistDataset::load(&config.data_dir, Split::Test)?),
            ),
            DatasetKind::Synthetic => (
                Box::new(SyntheticDigits::new(4096, 10, 28)),
                Box::new(SyntheticDigits::new(1024, 10, 28)),
            ),
        };

    let mut trainer = IicTrainer::new(config, train_data.as_ref(), test_data.as_ref())?;

    if eval {
        trainer.restore()?;
        let outcome = trainer.evaluate(0.0)?;
        for (head, acc) in outcome.head_accuracy.iter().enumerate() {
            info!("head {head} accuracy: {:.2}%", acc * 100.0);
        }
    } else if train {
        let outcome = trainer.train()?;
        info!("training complete, best accuracy {:.2}%", outcome.best * 100.0);
    } else {
        info!("nothing to do: pass --train or --eval");
    }
    Ok(())
}
