//! Error types for the infoclust training pipeline.
//!
//! This module is the single source of truth for all error types in the
//! crate. Every module that produces an error imports its error type from
//! here rather than defining it inline, keeping the hierarchy centralised.
//!
//! ## Hierarchy
//!
//! ```text
//! TrainError (top-level)
//! ├── ConfigError    (config validation / file loading / missing weights)
//! └── DatasetError   (IDX parsing, I/O, index bounds)
//! ```
//!
//! Numeric degeneracy (near-zero joint probabilities, large critic scores)
//! is not represented here: the loss functions clamp and stabilise inline
//! and never surface an error for it.

use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// TrainResult
// ---------------------------------------------------------------------------

/// Convenient `Result` alias used by orchestration-level functions.
pub type TrainResult<T> = Result<T, TrainError>;

// ---------------------------------------------------------------------------
// TrainError — top-level aggregator
// ---------------------------------------------------------------------------

/// Top-level error type for the training pipeline.
///
/// Orchestration-level functions (the trainers and the binaries) return
/// `TrainResult<T>`. Lower-level modules return their own error types which
/// coerce into `TrainError` via [`From`].
#[derive(Debug, Error)]
pub enum TrainError {
    /// A configuration validation or loading error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A dataset loading or access error.
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error raised by the tch / libtorch layer.
    #[error("Torch error: {0}")]
    Tch(#[from] tch::TchError),

    /// The dataset is empty and no training can be performed.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// The declared class count does not match the declared cluster count.
    ///
    /// Unsupervised label matching requires a square contingency matrix;
    /// a mismatch is a configuration error, not a recoverable condition.
    #[error("Class/cluster count mismatch: {classes} classes vs {clusters} clusters")]
    ClassClusterMismatch {
        /// Number of ground-truth classes.
        classes: usize,
        /// Number of predicted clusters.
        clusters: usize,
    },

    /// Predicted/true label sequences differ in length.
    #[error("Label length mismatch: {truth} true labels vs {predicted} predictions")]
    LabelLengthMismatch {
        /// Length of the ground-truth sequence.
        truth: usize,
        /// Length of the predicted sequence.
        predicted: usize,
    },

    /// A batch index is out of bounds for the current epoch.
    #[error("Batch index {index} out of bounds (epoch has {num_batches} batches)")]
    BatchOutOfBounds {
        /// The requested batch index.
        index: usize,
        /// Number of batches in the epoch.
        num_batches: usize,
    },

    /// Model weights could not be saved or loaded.
    #[error("Checkpoint error: {message} (path: {path:?})")]
    Checkpoint {
        /// Human-readable description.
        message: String,
        /// Path that was being accessed.
        path: PathBuf,
    },
}

impl TrainError {
    /// Construct a [`TrainError::Checkpoint`].
    pub fn checkpoint<S: Into<String>>(msg: S, path: impl Into<PathBuf>) -> Self {
        TrainError::Checkpoint {
            message: msg.into(),
            path: path.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors produced when loading or validating a
/// [`TrainingConfig`](crate::config::TrainingConfig).
///
/// All of these are fatal at startup: there is no retry path.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an invalid value.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// A configuration file could not be read from or written to disk.
    #[error("Cannot access config file `{path}`: {source}")]
    FileRead {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Evaluation was requested but no weights file is available.
    #[error("Evaluation requested but no weights file at `{path}`")]
    MissingWeights {
        /// Path that was expected to hold model weights.
        path: PathBuf,
    },
}

impl ConfigError {
    /// Construct a [`ConfigError::InvalidValue`].
    pub fn invalid_value<S: Into<String>>(field: &'static str, reason: S) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetError
// ---------------------------------------------------------------------------

/// Errors produced while loading or accessing dataset samples.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The data directory does not exist.
    #[error("Directory not found: {path}")]
    DirectoryNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// None of the accepted file names for a split were found.
    #[error("No {kind} file found under `{dir}` (tried: {tried:?})")]
    FileNotFound {
        /// What was being looked for ("images", "labels").
        kind: &'static str,
        /// Directory that was searched.
        dir: PathBuf,
        /// File names that were tried.
        tried: Vec<String>,
    },

    /// A low-level I/O error while reading a data file.
    #[error("I/O error reading `{path}`: {source}")]
    Io {
        /// Path being read when the error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An IDX file starts with an unexpected magic number.
    #[error("Bad IDX magic in `{path}`: expected {expected:#010x}, found {found:#010x}")]
    BadMagic {
        /// Path of the offending file.
        path: PathBuf,
        /// Magic number required for this file kind.
        expected: u32,
        /// Magic number actually present.
        found: u32,
    },

    /// An IDX file ended before its declared payload.
    #[error("Truncated IDX file `{path}`: header declares {declared} bytes, file holds {actual}")]
    Truncated {
        /// Path of the offending file.
        path: PathBuf,
        /// Payload size implied by the header.
        declared: usize,
        /// Payload size actually present.
        actual: usize,
    },

    /// The image and label files disagree on the sample count.
    #[error("Image/label count mismatch: {images} images vs {labels} labels")]
    CountMismatch {
        /// Number of images in the image file.
        images: usize,
        /// Number of labels in the label file.
        labels: usize,
    },

    /// A sample index is out of bounds.
    #[error("Index {idx} out of bounds (dataset has {len} samples)")]
    IndexOutOfBounds {
        /// The requested index.
        idx: usize,
        /// Total length of the dataset.
        len: usize,
    },
}

impl DatasetError {
    /// Construct a [`DatasetError::Io`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }
}
