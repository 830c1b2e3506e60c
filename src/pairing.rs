//! Paired-sample batch generation for IIC and MINE training.
//!
//! [`PairedSampleGenerator`] walks a shuffled index ordering over a dataset
//! and, for each batch, derives two index-aligned views of the same source
//! examples:
//!
//! - **View A**: the fixed center crop, or a random crop when affine views
//!   are enabled.
//! - **View B**: per sample, a 50/50 choice between a random rotation
//!   (±20°) and an independently drawn random crop.
//!
//! For mutual-information estimation a third, decorrelated "marginal" pair
//! is appended: copies of the view tensors with one side shuffled so index
//! alignment is intentionally broken. Rows `[0, N)` of a MINE batch are
//! joint-sampled, rows `[N, 2N)` marginal-sampled.
//!
//! The index ordering is reshuffled once per epoch boundary (never per
//! batch) and `floor(len / batch_size)` batches are produced per epoch;
//! leftover samples are dropped, never padded.

use ndarray::{s, Array3, Array4};
use tracing::debug;

use crate::augment::{center_crop, random_crop, random_rotate};
use crate::dataset::ImageDataset;
use crate::error::{ConfigError, TrainError, TrainResult};
use crate::rng::Xorshift64;

/// Maximum rotation magnitude for view B, in degrees.
const ROTATE_DEG: i64 = 20;

// ---------------------------------------------------------------------------
// Batch types
// ---------------------------------------------------------------------------

/// A single-view batch (view A only), for evaluation-style pipelines.
#[derive(Debug)]
pub struct PlainBatch {
    /// Cropped images, shape `[N, side, side, C]`.
    pub x: Array4<f32>,
    /// Ground-truth labels, length `N`.
    pub labels: Vec<i64>,
}

/// A siamese batch for the IIC objective.
///
/// Rows `[0, N)` hold view A and rows `[N, 2N)` view B; row `i` and row
/// `N + i` originate from the same source example.
#[derive(Debug)]
pub struct SiameseBatch {
    /// Stacked views, shape `[2N, side, side, C]`.
    pub x: Array4<f32>,
    /// Labels for both halves, length `2N` (second half repeats the first).
    pub labels: Vec<i64>,
}

impl SiameseBatch {
    /// Number of source examples behind this batch (`N`).
    pub fn pair_count(&self) -> usize {
        self.labels.len() / 2
    }

    /// The label vector replicated once per classification head.
    pub fn labels_per_head(&self, heads: usize) -> Vec<Vec<i64>> {
        vec![self.labels.clone(); heads]
    }
}

/// A double-length paired batch for the MINE objective.
///
/// In both tensors, rows `[0, N)` are the joint-aligned pair (`x1[i]` and
/// `x2[i]` come from the same source example) and rows `[N, 2N)` are the
/// marginal pair, where `x2`'s copy has been shuffled to break alignment.
#[derive(Debug)]
pub struct MineBatch {
    /// First views, shape `[2N, side, side, C]`.
    pub x1: Array4<f32>,
    /// Second views, shape `[2N, side, side, C]`.
    pub x2: Array4<f32>,
    /// Labels for both halves, length `2N`.
    pub labels: Vec<i64>,
}

impl MineBatch {
    /// Number of joint-sampled pairs (`N`).
    pub fn pair_count(&self) -> usize {
        self.labels.len() / 2
    }
}

// ---------------------------------------------------------------------------
// PairedSampleGenerator
// ---------------------------------------------------------------------------

/// Produces index-aligned (and optionally marginal) view batches from a
/// dataset, one epoch at a time.
pub struct PairedSampleGenerator<'a> {
    dataset: &'a dyn ImageDataset,
    batch_size: usize,
    crop_size: usize,
    affine_views: bool,
    crop_windows: Vec<usize>,
    side: usize,
    channels: usize,
    indices: Vec<usize>,
    rng: Xorshift64,
}

impl<'a> std::fmt::Debug for PairedSampleGenerator<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairedSampleGenerator")
            .field("dataset", &"<dyn ImageDataset>")
            .field("batch_size", &self.batch_size)
            .field("crop_size", &self.crop_size)
            .field("affine_views", &self.affine_views)
            .field("crop_windows", &self.crop_windows)
            .field("side", &self.side)
            .field("channels", &self.channels)
            .field("indices", &self.indices)
            .field("rng", &self.rng)
            .finish()
    }
}

impl<'a> PairedSampleGenerator<'a> {
    /// Create a generator over `dataset`.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`ConfigError`] when the batch size is zero, the
    /// dataset is empty or too small for one batch, or the crop geometry is
    /// invalid for the dataset's image size (the largest derived crop
    /// window must leave at least one pixel).
    pub fn new(
        dataset: &'a dyn ImageDataset,
        batch_size: usize,
        crop_size: usize,
        affine_views: bool,
        seed: u64,
    ) -> TrainResult<Self> {
        if batch_size == 0 {
            return Err(ConfigError::invalid_value("batch_size", "must be > 0").into());
        }
        if dataset.is_empty() {
            return Err(TrainError::EmptyDataset);
        }
        let spec = dataset.spec();
        if crop_size >= spec.image_size {
            return Err(ConfigError::invalid_value(
                "crop_size",
                format!(
                    "must be smaller than the image size ({} >= {})",
                    crop_size, spec.image_size
                ),
            )
            .into());
        }
        // Window sizes for the random crop: 2c, 2c+2, 2c+4.
        let crop_windows: Vec<usize> = (0..3).map(|i| crop_size * 2 + 2 * i).collect();
        let largest = crop_windows[crop_windows.len() - 1];
        if largest >= spec.image_size {
            return Err(ConfigError::invalid_value(
                "crop_size",
                format!(
                    "largest crop window {} leaves no pixels of a {}-pixel image",
                    largest, spec.image_size
                ),
            )
            .into());
        }
        if dataset.len() < batch_size {
            return Err(ConfigError::invalid_value(
                "batch_size",
                format!(
                    "exceeds dataset size ({} > {})",
                    batch_size,
                    dataset.len()
                ),
            )
            .into());
        }

        Ok(PairedSampleGenerator {
            dataset,
            batch_size,
            crop_size,
            affine_views,
            crop_windows,
            side: spec.side(crop_size),
            channels: spec.channels,
            indices: (0..dataset.len()).collect(),
            rng: Xorshift64::new(seed),
        })
    }

    /// Side length of the generated views.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Number of batches per epoch; leftover samples are dropped.
    pub fn num_batches(&self) -> usize {
        self.dataset.len() / self.batch_size
    }

    /// Reshuffle the index ordering for a new epoch.
    ///
    /// The ordering is fixed for the whole epoch once this returns;
    /// individual batch calls never mutate it.
    pub fn begin_epoch(&mut self) {
        self.rng.shuffle(&mut self.indices);
        debug!("epoch shuffle complete ({} indices)", self.indices.len());
    }

    /// Build a single-view batch (view A only).
    pub fn plain_batch(&mut self, index: usize) -> TrainResult<PlainBatch> {
        let (raw, labels) = self.load_raw(index)?;
        let x = self.view_a(&raw);
        Ok(PlainBatch { x, labels })
    }

    /// Build a siamese batch: view A stacked on view B.
    pub fn siamese_batch(&mut self, index: usize) -> TrainResult<SiameseBatch> {
        let (raw, labels) = self.load_raw(index)?;
        let x1 = self.view_a(&raw);
        let x2 = self.view_b(&raw);
        let x = stack_pair(&x1, &x2);
        let mut both = labels.clone();
        both.extend_from_slice(&labels);
        Ok(SiameseBatch { x, labels: both })
    }

    /// Build a MINE batch: joint pair plus shuffled marginal pair.
    pub fn mine_batch(&mut self, index: usize) -> TrainResult<MineBatch> {
        let (raw, labels) = self.load_raw(index)?;
        let x1 = self.view_a(&raw);
        let x2 = self.view_b(&raw);
        let n = labels.len();

        // Marginal copies: m1 keeps the joint order, m2 is row-shuffled so
        // that m1[i] and m2[i] come from different source examples.
        let m1 = x1.clone();
        let mut order: Vec<usize> = (0..n).collect();
        self.rng.shuffle(&mut order);
        let mut m2 = Array4::zeros(x2.raw_dim());
        for (dst, &src) in order.iter().enumerate() {
            m2.slice_mut(s![dst, .., .., ..])
                .assign(&x2.slice(s![src, .., .., ..]));
        }

        let x1 = stack_pair(&x1, &m1);
        let x2 = stack_pair(&x2, &m2);
        let mut both = labels.clone();
        both.extend_from_slice(&labels);
        Ok(MineBatch { x1, x2, labels: both })
    }

    // ------------------------------------------------------------------
    // Internal view construction
    // ------------------------------------------------------------------

    /// Load the raw source images and labels for batch `index`.
    fn load_raw(&self, index: usize) -> TrainResult<(Vec<Array3<f32>>, Vec<i64>)> {
        let num_batches = self.num_batches();
        if index >= num_batches {
            return Err(TrainError::BatchOutOfBounds { index, num_batches });
        }
        let n = self.batch_size;
        let mut raw = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        for &idx in &self.indices[index * n..(index + 1) * n] {
            let sample = self.dataset.get(idx)?;
            raw.push(sample.pixels);
            labels.push(sample.label);
        }
        Ok((raw, labels))
    }

    /// View A: center crop, or a random crop under affine pairing.
    fn view_a(&mut self, raw: &[Array3<f32>]) -> Array4<f32> {
        let target = (self.side, self.side);
        let mut x = Array4::zeros((raw.len(), self.side, self.side, self.channels));
        for (row, image) in raw.iter().enumerate() {
            let a = if self.affine_views {
                random_crop(image, target, &self.crop_windows, &mut self.rng)
            } else {
                center_crop(image, self.crop_size)
            };
            x.slice_mut(s![row, .., .., ..]).assign(&a);
        }
        x
    }

    /// View B: per sample, 50/50 rotation vs an independent random crop.
    fn view_b(&mut self, raw: &[Array3<f32>]) -> Array4<f32> {
        let target = (self.side, self.side);
        let mut x = Array4::zeros((raw.len(), self.side, self.side, self.channels));
        for (row, image) in raw.iter().enumerate() {
            let b = if self.rng.next_usize_range(0, 3) < 2 {
                random_rotate(image, ROTATE_DEG, target, &mut self.rng)
            } else {
                random_crop(image, target, &self.crop_windows, &mut self.rng)
            };
            x.slice_mut(s![row, .., .., ..]).assign(&b);
        }
        x
    }
}

/// Stack two equal-shaped `[N, H, W, C]` arrays into `[2N, H, W, C]`.
fn stack_pair(a: &Array4<f32>, b: &Array4<f32>) -> Array4<f32> {
    let (n, h, w, c) = a.dim();
    let mut out = Array4::zeros((2 * n, h, w, c));
    out.slice_mut(s![..n, .., .., ..]).assign(a);
    out.slice_mut(s![n.., .., .., ..]).assign(b);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
