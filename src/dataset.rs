//! Dataset abstractions and concrete image datasets.
//!
//! This module defines the [`ImageDataset`] trait plus two implementations:
//!
//! - [`MnistDataset`]: reads the classic IDX files from disk.
//! - [`SyntheticDigits`]: generates fully deterministic striped images from
//!   the sample index alone; used by unit tests, integration tests, and
//!   dry-run sanity checks. **Never uses random data.**
//!
//! Every dataset carries a [`DatasetSpec`] capability descriptor (image
//! size, channel count, class count) resolved once at load time, so
//! downstream code never branches on dataset identity.
//!
//! # Example — synthetic dataset
//!
//! ```rust
//! use infoclust::dataset::{ImageDataset, SyntheticDigits};
//!
//! let ds = SyntheticDigits::new(64, 10, 28);
//! assert_eq!(ds.len(), 64);
//! let sample = ds.get(0).unwrap();
//! assert_eq!(sample.pixels.shape(), &[28, 28, 1]);
//! ```

use ndarray::Array3;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::DatasetError;

// ---------------------------------------------------------------------------
// DatasetSpec
// ---------------------------------------------------------------------------

/// Capability descriptor attached to every dataset.
///
/// Resolved once when the dataset is constructed; downstream components
/// (pairing, models, evaluation) read geometry from here instead of
/// checking which dataset they were handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSpec {
    /// Side length of the square source images.
    pub image_size: usize,
    /// Number of channels per pixel.
    pub channels: usize,
    /// Number of distinct ground-truth classes.
    pub n_classes: usize,
}

impl DatasetSpec {
    /// Side length after removing `crop` pixels per axis.
    pub fn side(&self, crop: usize) -> usize {
        self.image_size - crop
    }
}

// ---------------------------------------------------------------------------
// ImageSample / ImageDataset
// ---------------------------------------------------------------------------

/// A single image paired with its ground-truth class label.
///
/// Pixels are stored `H × W × C`, `f32`, normalised to `[0, 1]`. The label
/// is used only for post-hoc evaluation, never by a training loss.
#[derive(Debug, Clone)]
pub struct ImageSample {
    /// Normalised pixel data, shape `[H, W, C]`.
    pub pixels: Array3<f32>,
    /// Ground-truth class index.
    pub label: i64,
}

/// Common interface for all image datasets.
///
/// Implementations must be `Send + Sync` so batches can be produced from
/// worker threads without additional synchronisation.
pub trait ImageDataset: Send + Sync {
    /// Total number of samples in this dataset.
    fn len(&self) -> usize;

    /// Returns `true` when the dataset contains no samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load the sample at position `idx`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::IndexOutOfBounds`] when `idx >= self.len()`.
    fn get(&self, idx: usize) -> Result<ImageSample, DatasetError>;

    /// The capability descriptor for this dataset.
    fn spec(&self) -> DatasetSpec;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Split
// ---------------------------------------------------------------------------

/// Which half of a train/test dataset to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// The training portion.
    Train,
    /// The held-out test portion, used for evaluation only.
    Test,
}

// ---------------------------------------------------------------------------
// MnistDataset
// ---------------------------------------------------------------------------

const IDX_IMAGES_MAGIC: u32 = 0x0000_0803;
const IDX_LABELS_MAGIC: u32 = 0x0000_0801;

/// MNIST-style dataset read from IDX files.
///
/// The loader accepts both common file-name conventions
/// (`train-images-idx3-ubyte` and `train-images.idx3-ubyte`). Pixels are
/// kept as raw `u8` in memory and normalised to `f32` lazily in
/// [`ImageDataset::get`].
#[derive(Debug)]
pub struct MnistDataset {
    images: Vec<u8>,
    labels: Vec<u8>,
    spec: DatasetSpec,
    split: Split,
}

impl MnistDataset {
    /// Load one split of an IDX image dataset from `dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`DatasetError`] when the directory or files are missing,
    /// the IDX headers are malformed, the payload is truncated, or the image
    /// and label counts disagree.
    pub fn load(dir: &Path, split: Split) -> Result<Self, DatasetError> {
        if !dir.is_dir() {
            return Err(DatasetError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        let stem = match split {
            Split::Train => "train",
            Split::Test => "t10k",
        };
        let image_path = locate(dir, "images", &idx_candidates(stem, "images", 3))?;
        let label_path = locate(dir, "labels", &idx_candidates(stem, "labels", 1))?;

        let (images, n_images, rows, cols) = read_idx_images(&image_path)?;
        let labels = read_idx_labels(&label_path)?;

        if n_images != labels.len() {
            return Err(DatasetError::CountMismatch {
                images: n_images,
                labels: labels.len(),
            });
        }

        // Class count from the distinct labels actually present, not from an
        // assumption about the file.
        let mut present = [false; 256];
        for &l in &labels {
            present[l as usize] = true;
        }
        let n_classes = present.iter().filter(|&&p| p).count();

        let spec = DatasetSpec {
            image_size: rows.max(cols),
            channels: 1,
            n_classes,
        };

        info!(
            "MnistDataset: loaded {} {}x{} images, {} classes ({:?} split from {})",
            n_images,
            rows,
            cols,
            n_classes,
            split,
            dir.display()
        );

        Ok(MnistDataset {
            images,
            labels,
            spec,
            split,
        })
    }
}

impl ImageDataset for MnistDataset {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn get(&self, idx: usize) -> Result<ImageSample, DatasetError> {
        if idx >= self.labels.len() {
            return Err(DatasetError::IndexOutOfBounds {
                idx,
                len: self.labels.len(),
            });
        }
        let size = self.spec.image_size;
        let stride = size * size;
        let raw = &self.images[idx * stride..(idx + 1) * stride];
        let pixels = Array3::from_shape_fn((size, size, 1), |(r, c, _)| {
            f32::from(raw[r * size + c]) / 255.0
        });
        Ok(ImageSample {
            pixels,
            label: i64::from(self.labels[idx]),
        })
    }

    fn spec(&self) -> DatasetSpec {
        self.spec
    }

    fn name(&self) -> &str {
        match self.split {
            Split::Train => "mnist-train",
            Split::Test => "mnist-test",
        }
    }
}

// ---------------------------------------------------------------------------
// IDX parsing helpers
// ---------------------------------------------------------------------------

/// Both file-name conventions in circulation for a split/kind pair.
fn idx_candidates(stem: &str, kind: &str, rank: u8) -> Vec<String> {
    vec![
        format!("{stem}-{kind}-idx{rank}-ubyte"),
        format!("{stem}-{kind}.idx{rank}-ubyte"),
    ]
}

/// Resolve the first existing candidate file under `dir`.
fn locate(dir: &Path, kind: &'static str, candidates: &[String]) -> Result<PathBuf, DatasetError> {
    for name in candidates {
        let path = dir.join(name);
        if path.is_file() {
            return Ok(path);
        }
    }
    Err(DatasetError::FileNotFound {
        kind,
        dir: dir.to_path_buf(),
        tried: candidates.to_vec(),
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>, DatasetError> {
    let mut buf = Vec::new();
    std::fs::File::open(path)
        .and_then(|mut f| f.read_to_end(&mut buf))
        .map_err(|source| DatasetError::io(path, source))?;
    Ok(buf)
}

fn read_be_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Parse an IDX3 image file: magic, count, rows, cols, then raw `u8` pixels.
fn read_idx_images(path: &Path) -> Result<(Vec<u8>, usize, usize, usize), DatasetError> {
    let bytes = read_file(path)?;
    if bytes.len() < 16 {
        return Err(DatasetError::Truncated {
            path: path.to_path_buf(),
            declared: 16,
            actual: bytes.len(),
        });
    }
    let magic = read_be_u32(&bytes, 0);
    if magic != IDX_IMAGES_MAGIC {
        return Err(DatasetError::BadMagic {
            path: path.to_path_buf(),
            expected: IDX_IMAGES_MAGIC,
            found: magic,
        });
    }
    let n = read_be_u32(&bytes, 4) as usize;
    let rows = read_be_u32(&bytes, 8) as usize;
    let cols = read_be_u32(&bytes, 12) as usize;
    let declared = n * rows * cols;
    let payload = &bytes[16..];
    if payload.len() < declared {
        return Err(DatasetError::Truncated {
            path: path.to_path_buf(),
            declared,
            actual: payload.len(),
        });
    }
    Ok((payload[..declared].to_vec(), n, rows, cols))
}

/// Parse an IDX1 label file: magic, count, then raw `u8` labels.
fn read_idx_labels(path: &Path) -> Result<Vec<u8>, DatasetError> {
    let bytes = read_file(path)?;
    if bytes.len() < 8 {
        return Err(DatasetError::Truncated {
            path: path.to_path_buf(),
            declared: 8,
            actual: bytes.len(),
        });
    }
    let magic = read_be_u32(&bytes, 0);
    if magic != IDX_LABELS_MAGIC {
        return Err(DatasetError::BadMagic {
            path: path.to_path_buf(),
            expected: IDX_LABELS_MAGIC,
            found: magic,
        });
    }
    let n = read_be_u32(&bytes, 4) as usize;
    let payload = &bytes[8..];
    if payload.len() < n {
        return Err(DatasetError::Truncated {
            path: path.to_path_buf(),
            declared: n,
            actual: payload.len(),
        });
    }
    Ok(payload[..n].to_vec())
}

// ---------------------------------------------------------------------------
// SyntheticDigits
// ---------------------------------------------------------------------------

/// Fully deterministic image dataset computed from the sample index alone.
///
/// Each class renders as a striped pattern with a class-dependent
/// orientation and frequency, plus a small per-sample phase shift so that
/// different indices of the same class differ. No RNG is involved; every
/// call with the same index returns identical pixels on every platform.
///
/// ## Pixel model
///
/// For sample `idx` with `label = idx % n_classes`, pixel `(r, c)`:
///
/// ```text
/// θ = π · label / n_classes
/// u = (r·cos θ + c·sin θ) / image_size
/// v = 0.5 + 0.45 · sin(2π · (label + 2) · u + 0.07 · idx)
/// ```
pub struct SyntheticDigits {
    num_samples: usize,
    spec: DatasetSpec,
}

impl SyntheticDigits {
    /// Create a synthetic dataset of `num_samples` images.
    pub fn new(num_samples: usize, n_classes: usize, image_size: usize) -> Self {
        SyntheticDigits {
            num_samples,
            spec: DatasetSpec {
                image_size,
                channels: 1,
                n_classes,
            },
        }
    }

    #[inline]
    fn pixel(&self, idx: usize, label: usize, r: usize, c: usize) -> f32 {
        let theta = std::f32::consts::PI * label as f32 / self.spec.n_classes as f32;
        let u = (r as f32 * theta.cos() + c as f32 * theta.sin()) / self.spec.image_size as f32;
        let phase = 2.0 * std::f32::consts::PI * (label as f32 + 2.0) * u + 0.07 * idx as f32;
        0.5 + 0.45 * phase.sin()
    }
}

impl ImageDataset for SyntheticDigits {
    fn len(&self) -> usize {
        self.num_samples
    }

    fn get(&self, idx: usize) -> Result<ImageSample, DatasetError> {
        if idx >= self.num_samples {
            return Err(DatasetError::IndexOutOfBounds {
                idx,
                len: self.num_samples,
            });
        }
        let label = idx % self.spec.n_classes;
        let size = self.spec.image_size;
        let pixels =
            Array3::from_shape_fn((size, size, 1), |(r, c, _)| self.pixel(idx, label, r, c));
        Ok(ImageSample {
            pixels,
            label: label as i64,
        })
    }

    fn spec(&self) -> DatasetSpec {
        self.spec
    }

    fn name(&self) -> &str {
        "synthetic-digits"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
