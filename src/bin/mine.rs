//! `mine` binary — Mutual Information Neural Estimation.
//!
//! Two modes:
//!
//! - `--gaussian`: train the standalone critic on a correlated 2-D Gaussian
//!   and compare the learned bound against the histogram estimate and the
//!   closed form.
//! - `--train`: unsupervised representation learning on image data, scored
//!   by a supervised linear probe over the frozen encoder.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin mine -- --gaussian --cov-xy 0.9
//! cargo run --bin mine -- --train --save-weights mine.ot
//! ```

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use infoclust::config::{DatasetKind, TrainingConfig};
use infoclust::dataset::{ImageDataset, MnistDataset, Split, SyntheticDigits};
use infoclust::gaussian::{gaussian_mi_exact, histogram_mi, sample_joint};
use infoclust::rng::Xorshift64;
use infoclust::trainer::{MineTrainer, SimpleMineTrainer};

/// Samples drawn for the histogram MI reference estimate.
const HISTOGRAM_SAMPLES: usize = 1_000_000;

/// Bins per axis for the histogram MI reference estimate.
const HISTOGRAM_BINS: usize = 100;

/// Command-line arguments for the MINE binary.
#[derive(Parser, Debug)]
#[command(
    name = "mine",
    version,
    about = "Mutual Information Neural Estimation trainer",
    long_about = None
)]
struct Args {
    /// Path to a JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the data directory from the config.
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Estimate the MI of a 2-D Gaussian instead of training on images.
    #[arg(long, default_value_t = false)]
    gaussian: bool,

    /// Off-diagonal covariance for the Gaussian mode.
    #[arg(long)]
    cov_xy: Option<f64>,

    /// Train the image-mode encoder.
    #[arg(long, default_value_t = false)]
    train: bool,

    /// Number of training epochs.
    #[arg(long)]
    epochs: Option<usize>,

    /// Train batch size.
    #[arg(long)]
    batch_size: Option<usize>,

    /// File name to store improved weights under.
    #[arg(long, value_name = "FILE")]
    save_weights: Option<String>,

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

    info!("MINE trainer v{}", infoclust::VERSION);

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
        None => {
            let mut cfg = TrainingConfig::default();
            // MINE defaults differ from IIC: shorter runs, bigger batches
            // in Gaussian mode.
            cfg.epochs = 1000;
            cfg
        }
    };

    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(cov) = args.cov_xy {
        config.cov_xy = cov;
    }
    if let Some(epochs) = args.epochs {
        config.epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if args.save_weights.is_some() {
        config.save_weights = args.save_weights;
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

    info!("  covariance   : {}", config.cov_xy);
    info!("  batch size   : {}", config.batch_size);
    info!("  epochs       : {}", config.epochs);

    let result = if args.gaussian {
        run_gaussian(config)
    } else if args.train {
        run_images(config)
    } else {
        info!("nothing to do: pass --gaussian or --train");
        Ok(())
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

/// Standalone mode: learned bound vs histogram vs closed form.
fn run_gaussian(config: TrainingConfig) -> infoclust::TrainResult<()> {
    let cov = config.cov_xy;
    let mut trainer = SimpleMineTrainer::new(&config)?;
    let learned = trainer.train()?;

    let mut rng = Xorshift64::new(config.seed);
    let samples = sample_joint(HISTOGRAM_SAMPLES, cov, &mut rng);
    let binned = histogram_mi(&samples, HISTOGRAM_BINS);

    info!("covariance        : {cov}");
    info!("MINE estimate     : {learned:.6} nats");
    info!("histogram estimate: {binned:.6} nats");
    info!("closed form       : {:.6} nats", gaussian_mi_exact(cov));
    Ok(())
}

/// Image mode: unsupervised encoder training with probe evaluation.
fn run_images(config: TrainingConfig) -> infoclust::TrainResult<()> {
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

    let mut trainer = MineTrainer::new(config, train_data.as_ref(), test_data.as_ref())?;
    let outcome = trainer.train()?;
    info!(
        "training complete, best probe accuracy {:.2}%",
        outcome.best * 100.0
    );
    Ok(())
}
