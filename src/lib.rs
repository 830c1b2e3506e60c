//! # infoclust
//!
//! Unsupervised representation learning via mutual information, built on
//! `tch` (PyTorch bindings): Invariant Information Clustering (IIC) and
//! Mutual Information Neural Estimation (MINE) over image datasets.
//!
//! ## Architecture
//!
//! ```text
//! TrainingConfig ──► IicTrainer / MineTrainer
//!       │                   │
//!       │          PairedSampleGenerator ──► augment (crop / rotate)
//!       │                   │
//!       │          ImageDataset (MnistDataset | SyntheticDigits)
//!       │                   │
//!       └──► losses (iic_loss / mine_loss), matching, gaussian
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use infoclust::dataset::{ImageDataset, SyntheticDigits};
//! use infoclust::pairing::PairedSampleGenerator;
//!
//! let data = SyntheticDigits::new(64, 10, 28);
//! let mut gen = PairedSampleGenerator::new(&data, 16, 4, false, 42).unwrap();
//! gen.begin_epoch();
//!
//! let batch = gen.siamese_batch(0).unwrap();
//! assert_eq!(batch.x.shape(), &[32, 24, 24, 1]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod augment;
pub mod config;
pub mod dataset;
pub mod error;
pub mod gaussian;
pub mod losses;
pub mod matching;
pub mod model;
pub mod pairing;
pub mod rng;
pub mod trainer;

// Convenient re-exports at the crate root.
pub use config::{DatasetKind, TrainingConfig};
pub use dataset::{DatasetSpec, ImageDataset, ImageSample, MnistDataset, Split, SyntheticDigits};
pub use error::{ConfigError, DatasetError, TrainError, TrainResult};
pub use losses::{iic_loss, joint_distribution, mine_loss};
pub use matching::unsupervised_accuracy;
pub use pairing::{MineBatch, PairedSampleGenerator, SiameseBatch};
pub use trainer::{EvalOutcome, IicTrainer, MineTrainer, SimpleMineTrainer};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
