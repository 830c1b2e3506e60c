//! Training configuration for the IIC / MINE experiments.
//!
//! [`TrainingConfig`] is the single source of truth for all hyper-parameters,
//! dataset selection, and checkpoint paths used throughout the pipeline. It
//! is serializable via [`serde`] so it can be stored to / restored from JSON
//! files.
//!
//! # Example
//!
//! ```rust
//! use infoclust::config::TrainingConfig;
//!
//! let cfg = TrainingConfig::default();
//! cfg.validate().expect("default config is valid");
//!
//! assert_eq!(cfg.crop_size, 4);
//! assert_eq!(cfg.batch_size, 512);
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tch::Device;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// DatasetKind
// ---------------------------------------------------------------------------

/// Which dataset the pipeline trains on.
///
/// The dataset's geometry (image size, channel count, class count) is *not*
/// configured here; it is resolved once at load time into a
/// [`DatasetSpec`](crate::dataset::DatasetSpec) so the rest of the pipeline
/// never branches on dataset identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// MNIST handwritten digits, loaded from IDX files on disk.
    Mnist,
    /// Deterministic synthetic striped digits; for tests and dry runs.
    Synthetic,
}

// ---------------------------------------------------------------------------
// TrainingConfig
// ---------------------------------------------------------------------------

/// Complete configuration for an IIC or MINE training run.
///
/// All fields have documented defaults matching the reference experimental
/// setup. Use [`TrainingConfig::default()`] as a starting point and override
/// individual fields as needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    // -----------------------------------------------------------------------
    // Data
    // -----------------------------------------------------------------------
    /// Dataset to train on. Default: **Mnist**.
    pub dataset: DatasetKind,

    /// Directory holding the IDX data files. Default: **`data/mnist`**.
    pub data_dir: PathBuf,

    /// Pixels removed per image axis by the evaluation-time center crop; the
    /// training-time random crop windows are derived from this value.
    /// `0` disables cropping entirely. Default: **4**.
    pub crop_size: usize,

    /// When `true`, view A of each training pair is a random crop rather
    /// than the fixed center crop (the affine-pairing variant).
    /// Default: **false**.
    pub affine_views: bool,

    // -----------------------------------------------------------------------
    // Model
    // -----------------------------------------------------------------------
    /// Number of parallel cluster heads on top of the backbone (IIC).
    /// Default: **1**.
    pub heads: usize,

    /// Width of the MINE encoder output. Default: **16**.
    pub latent_dim: i64,

    /// Hidden width of the MINE critic in image mode. Default: **256**.
    pub mine_hidden: i64,

    // -----------------------------------------------------------------------
    // Optimisation
    // -----------------------------------------------------------------------
    /// Mini-batch size (per view; siamese batches hold twice this many
    /// rows). Default: **512**.
    pub batch_size: usize,

    /// Total number of training epochs. Default: **4375**.
    pub epochs: usize,

    /// Initial learning rate for the Adam optimiser. Default: **1e-3**.
    pub learning_rate: f64,

    /// The learning rate is multiplied by [`lr_gamma`](Self::lr_gamma)
    /// every this many epochs. Default: **400**.
    pub lr_decay_every: usize,

    /// Multiplicative learning-rate decay factor. Default: **0.8**.
    pub lr_gamma: f64,

    // -----------------------------------------------------------------------
    // Checkpointing
    // -----------------------------------------------------------------------
    /// Directory where weight files are written. Default: **`weights`**.
    pub save_dir: PathBuf,

    /// File name to save improved weights under, or `None` to disable
    /// saving. Default: **None**.
    pub save_weights: Option<String>,

    /// File name to restore weights from before evaluation, or `None`.
    /// Default: **None**.
    pub restore_weights: Option<String>,

    // -----------------------------------------------------------------------
    // Gaussian demonstration
    // -----------------------------------------------------------------------
    /// Off-diagonal covariance of the 2-D Gaussian used by the standalone
    /// MINE demonstration. Must lie in (-1, 1). Default: **0.5**.
    pub cov_xy: f64,

    // -----------------------------------------------------------------------
    // Device / reproducibility
    // -----------------------------------------------------------------------
    /// Use a CUDA GPU when available. Default: **false**.
    pub use_gpu: bool,

    /// CUDA device index when `use_gpu` is `true`. Default: **0**.
    pub gpu_device_id: usize,

    /// Global seed for the data-pairing RNG and model initialisation.
    /// Default: **42**.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            // Data
            dataset: DatasetKind::Mnist,
            data_dir: PathBuf::from("data/mnist"),
            crop_size: 4,
            affine_views: false,
            // Model
            heads: 1,
            latent_dim: 16,
            mine_hidden: 256,
            // Optimisation
            batch_size: 512,
            epochs: 4375,
            learning_rate: 1e-3,
            lr_decay_every: 400,
            lr_gamma: 0.8,
            // Checkpointing
            save_dir: PathBuf::from("weights"),
            save_weights: None,
            restore_weights: None,
            // Gaussian demo
            cov_xy: 0.5,
            // Device / reproducibility
            use_gpu: false,
            gpu_device_id: 0,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    /// Load a [`TrainingConfig`] from a JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the file cannot be opened and
    /// [`ConfigError::InvalidValue`] if the JSON is malformed or the loaded
    /// configuration fails validation.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: TrainingConfig = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::invalid_value("(file)", e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize this configuration to pretty-printed JSON at `path`,
    /// creating parent directories if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the directory cannot be created
    /// or the file cannot be written.
    pub fn to_json(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::FileRead {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::invalid_value("(serialization)", e.to_string()))?;
        std::fs::write(path, json).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// The torch device this configuration selects.
    pub fn device(&self) -> Device {
        if self.use_gpu {
            Device::Cuda(self.gpu_device_id)
        } else {
            Device::Cpu
        }
    }

    /// Learning rate in effect at `epoch` under the step-decay schedule.
    ///
    /// The base rate is multiplied by `lr_gamma` once per completed
    /// `lr_decay_every`-epoch block.
    pub fn lr_for_epoch(&self, epoch: usize) -> f64 {
        let power = (epoch / self.lr_decay_every) as i32;
        self.learning_rate * self.lr_gamma.powi(power)
    }

    /// Full path of the save-weights file, if saving is configured.
    pub fn save_path(&self) -> Option<PathBuf> {
        self.save_weights.as_ref().map(|f| self.save_dir.join(f))
    }

    /// Full path of the restore-weights file, if restoring is configured.
    pub fn restore_path(&self) -> Option<PathBuf> {
        self.restore_weights.as_ref().map(|f| self.save_dir.join(f))
    }

    /// Validate all fields and return an error describing the first problem
    /// found, or `Ok(())` if the configuration is coherent.
    ///
    /// Crop geometry is additionally validated against the concrete image
    /// size when the paired-sample generator is constructed, since the image
    /// size is a property of the loaded dataset, not of this struct.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heads == 0 {
            return Err(ConfigError::invalid_value("heads", "must be > 0"));
        }
        if self.latent_dim <= 0 {
            return Err(ConfigError::invalid_value("latent_dim", "must be > 0"));
        }
        if self.mine_hidden <= 0 {
            return Err(ConfigError::invalid_value("mine_hidden", "must be > 0"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid_value("batch_size", "must be > 0"));
        }
        if self.epochs == 0 {
            return Err(ConfigError::invalid_value("epochs", "must be > 0"));
        }
        if self.learning_rate <= 0.0 {
            return Err(ConfigError::invalid_value("learning_rate", "must be > 0.0"));
        }
        if self.lr_decay_every == 0 {
            return Err(ConfigError::invalid_value("lr_decay_every", "must be > 0"));
        }
        if self.lr_gamma <= 0.0 || self.lr_gamma >= 1.0 {
            return Err(ConfigError::invalid_value("lr_gamma", "must be in (0.0, 1.0)"));
        }
        if self.cov_xy <= -1.0 || self.cov_xy >= 1.0 {
            return Err(ConfigError::invalid_value("cov_xy", "must be in (-1.0, 1.0)"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_valid() {
        let cfg = TrainingConfig::default();
        cfg.validate().expect("default config should be valid");
    }

    #[test]
    fn json_round_trip() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.json");

        let mut original = TrainingConfig::default();
        original.heads = 3;
        original.save_weights = Some("iic.ot".to_string());
        original.to_json(&path).expect("serialization should succeed");

        let loaded = TrainingConfig::from_json(&path).expect("deserialization should succeed");
        assert_eq!(loaded.heads, 3);
        assert_eq!(loaded.save_weights.as_deref(), Some("iic.ot"));
        assert_eq!(loaded.batch_size, original.batch_size);
        assert_eq!(loaded.seed, original.seed);
    }

    #[test]
    fn from_json_rejects_invalid_loaded_config() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.json");

        let mut bad = TrainingConfig::default();
        bad.batch_size = 0;
        // to_json does not validate; from_json must.
        bad.to_json(&path).unwrap();
        assert!(TrainingConfig::from_json(&path).is_err());
    }

    #[test]
    fn zero_heads_is_invalid() {
        let mut cfg = TrainingConfig::default();
        cfg.heads = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_batch_size_is_invalid() {
        let mut cfg = TrainingConfig::default();
        cfg.batch_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn negative_learning_rate_is_invalid() {
        let mut cfg = TrainingConfig::default();
        cfg.learning_rate = -0.001;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn lr_gamma_of_one_is_invalid() {
        let mut cfg = TrainingConfig::default();
        cfg.lr_gamma = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn cov_xy_outside_open_interval_is_invalid() {
        let mut cfg = TrainingConfig::default();
        cfg.cov_xy = 1.0;
        assert!(cfg.validate().is_err());
        cfg.cov_xy = -1.0;
        assert!(cfg.validate().is_err());
        cfg.cov_xy = 0.999;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn lr_schedule_steps_every_400_epochs() {
        let cfg = TrainingConfig::default();
        assert!((cfg.lr_for_epoch(0) - 1e-3).abs() < 1e-12);
        assert!((cfg.lr_for_epoch(399) - 1e-3).abs() < 1e-12);
        assert!((cfg.lr_for_epoch(400) - 0.8e-3).abs() < 1e-12);
        assert!((cfg.lr_for_epoch(800) - 0.64e-3).abs() < 1e-12);
    }

    #[test]
    fn save_and_restore_paths_join_save_dir() {
        let mut cfg = TrainingConfig::default();
        assert!(cfg.save_path().is_none());
        cfg.save_weights = Some("model.ot".into());
        assert_eq!(cfg.save_path().unwrap(), PathBuf::from("weights/model.ot"));
        cfg.restore_weights = Some("model.ot".into());
        assert_eq!(
            cfg.restore_path().unwrap(),
            PathBuf::from("weights/model.ot")
        );
    }
}
