//! Network definitions built on `tch::nn`.
//!
//! # Architecture
//!
//! ```text
//! image [B, C, s, s]
//!       │
//!       ▼
//! ┌──────────────┐
//! │ VggBackbone  │  conv(3×3) + BN + ReLU blocks, max-pool at 'M'
//! └──────────────┘
//!       │ flat features [B, F]
//!   ┌───┴─────────────┐
//!   ▼                 ▼
//! ClusterModel      MineModel
//! heads × softmax   Linear(F → latent) ──► MineCritic T(z₁, z₂)
//! [B, K] each       [B, latent]            [B, 1]
//! ```
//!
//! Every model owns a single `nn::VarStore` so its parameters serialise
//! as one checkpoint file. Weights are initialised from scratch; no
//! pre-trained files are loaded.

use std::path::Path;
use tch::{nn, nn::ModuleT, Device, Kind, Tensor};

use crate::dataset::DatasetSpec;
use crate::error::{TrainError, TrainResult};

// ---------------------------------------------------------------------------
// Backbone configuration
// ---------------------------------------------------------------------------

/// One element of a VGG-style layer plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSpec {
    /// 3×3 same-padding convolution to the given channel count, with batch
    /// norm and ReLU.
    Conv(i64),
    /// 2×2 max pooling.
    MaxPool,
}

/// The compact VGG plan used by the experiments: `[64, M, 128, M, 256, M, 512]`.
pub const VGG_F: &[LayerSpec] = &[
    LayerSpec::Conv(64),
    LayerSpec::MaxPool,
    LayerSpec::Conv(128),
    LayerSpec::MaxPool,
    LayerSpec::Conv(256),
    LayerSpec::MaxPool,
    LayerSpec::Conv(512),
];

// ---------------------------------------------------------------------------
// VggBackbone
// ---------------------------------------------------------------------------

enum VggLayer {
    Conv { conv: nn::Conv2D, bn: nn::BatchNorm },
    Pool,
}

/// VGG-style convolutional feature extractor.
///
/// Maps `[B, C, side, side]` images to flat `[B, feature_dim]` vectors.
pub struct VggBackbone {
    layers: Vec<VggLayer>,
    feature_dim: i64,
}

impl VggBackbone {
    /// Build the backbone under `path` for `side`-pixel, `channels`-channel
    /// inputs.
    pub fn new(path: &nn::Path, plan: &[LayerSpec], channels: i64, side: i64) -> Self {
        let mut layers = Vec::with_capacity(plan.len());
        let mut in_ch = channels;
        let mut spatial = side;
        for (i, spec) in plan.iter().enumerate() {
            match *spec {
                LayerSpec::Conv(out_ch) => {
                    let conv = nn::conv2d(
                        path / format!("conv{i}"),
                        in_ch,
                        out_ch,
                        3,
                        nn::ConvConfig {
                            padding: 1,
                            ..Default::default()
                        },
                    );
                    let bn = nn::batch_norm2d(path / format!("bn{i}"), out_ch, Default::default());
                    layers.push(VggLayer::Conv { conv, bn });
                    in_ch = out_ch;
                }
                LayerSpec::MaxPool => {
                    layers.push(VggLayer::Pool);
                    spatial /= 2;
                }
            }
        }
        VggBackbone {
            layers,
            feature_dim: in_ch * spatial * spatial,
        }
    }

    /// Width of the flattened feature vector.
    pub fn feature_dim(&self) -> i64 {
        self.feature_dim
    }

    /// Forward pass; `train` toggles batch-norm statistics updates.
    pub fn forward_t(&self, x: &Tensor, train: bool) -> Tensor {
        let mut h = x.shallow_clone();
        for layer in &self.layers {
            h = match layer {
                VggLayer::Conv { conv, bn } => conv.forward_t(&h, train).apply_t(bn, train).relu(),
                VggLayer::Pool => h.max_pool2d_default(2),
            };
        }
        h.flatten(1, -1)
    }
}

// ---------------------------------------------------------------------------
// ClusterModel (IIC)
// ---------------------------------------------------------------------------

/// Backbone plus parallel softmax cluster heads.
pub struct ClusterModel {
    vs: nn::VarStore,
    backbone: VggBackbone,
    heads: Vec<nn::Linear>,
}

impl ClusterModel {
    /// Build a model for `spec`-shaped inputs cropped by `crop` pixels,
    /// with `heads` parallel heads of `spec.n_classes` clusters each.
    pub fn new(spec: &DatasetSpec, crop: usize, heads: usize, device: Device) -> Self {
        let vs = nn::VarStore::new(device);
        let root = vs.root();
        let side = spec.side(crop) as i64;
        let backbone = VggBackbone::new(&(&root / "backbone"), VGG_F, spec.channels as i64, side);
        let head_layers = (0..heads)
            .map(|i| {
                nn::linear(
                    &root / format!("head{i}"),
                    backbone.feature_dim(),
                    spec.n_classes as i64,
                    Default::default(),
                )
            })
            .collect();
        ClusterModel {
            vs,
            backbone,
            heads: head_layers,
        }
    }

    /// Soft cluster assignments, one `[B, K]` row-stochastic tensor per head.
    pub fn forward_t(&self, x: &Tensor, train: bool) -> Vec<Tensor> {
        let features = self.backbone.forward_t(x, train);
        self.heads
            .iter()
            .map(|head| head.forward_t(&features, train).softmax(-1, Kind::Float))
            .collect()
    }

    /// Number of heads this model was built with.
    pub fn num_heads(&self) -> usize {
        self.heads.len()
    }

    /// The variable store backing this model (for optimiser construction).
    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    /// Count of trainable parameters.
    pub fn num_parameters(&self) -> usize {
        count_parameters(&self.vs)
    }

    /// Save all weights to `path`.
    pub fn save(&self, path: &Path) -> TrainResult<()> {
        self.vs
            .save(path)
            .map_err(|e| TrainError::checkpoint(e.to_string(), path))
    }

    /// Load weights from `path` into this model.
    pub fn load(&mut self, path: &Path) -> TrainResult<()> {
        self.vs
            .load(path)
            .map_err(|e| TrainError::checkpoint(e.to_string(), path))
    }
}

// ---------------------------------------------------------------------------
// MineCritic
// ---------------------------------------------------------------------------

/// The MINE statistics network `T(x, y)`.
///
/// Two input projections are summed, passed through ReLU, and reduced to a
/// single score: `T(x, y) = W_o · relu(W_x·x + W_y·y)`.
pub struct MineCritic {
    fc_x: nn::Linear,
    fc_y: nn::Linear,
    out: nn::Linear,
}

impl MineCritic {
    /// Build a critic under `path` for `input_dim`-wide inputs.
    pub fn new(path: &nn::Path, input_dim: i64, hidden: i64) -> Self {
        MineCritic {
            fc_x: nn::linear(path / "fc_x", input_dim, hidden, Default::default()),
            fc_y: nn::linear(path / "fc_y", input_dim, hidden, Default::default()),
            out: nn::linear(path / "out", hidden, 1, Default::default()),
        }
    }

    /// Score a batch of `(x, y)` pairs; returns `[B, 1]`.
    pub fn forward(&self, x: &Tensor, y: &Tensor) -> Tensor {
        let h = (self.fc_x.forward_t(x, false) + self.fc_y.forward_t(y, false)).relu();
        self.out.forward_t(&h, false)
    }
}

// ---------------------------------------------------------------------------
// MineModel
// ---------------------------------------------------------------------------

/// Backbone encoder plus critic for image-level MI maximisation.
pub struct MineModel {
    vs: nn::VarStore,
    backbone: VggBackbone,
    project: nn::Linear,
    critic: MineCritic,
    latent_dim: i64,
}

impl MineModel {
    /// Build an encoder + critic for `spec`-shaped inputs cropped by `crop`
    /// pixels.
    pub fn new(
        spec: &DatasetSpec,
        crop: usize,
        latent_dim: i64,
        critic_hidden: i64,
        device: Device,
    ) -> Self {
        let vs = nn::VarStore::new(device);
        let root = vs.root();
        let side = spec.side(crop) as i64;
        let backbone = VggBackbone::new(&(&root / "backbone"), VGG_F, spec.channels as i64, side);
        let project = nn::linear(
            &root / "project",
            backbone.feature_dim(),
            latent_dim,
            Default::default(),
        );
        let critic = MineCritic::new(&(&root / "critic"), latent_dim, critic_hidden);
        MineModel {
            vs,
            backbone,
            project,
            critic,
            latent_dim,
        }
    }

    /// Encode images to latent vectors `[B, latent_dim]`.
    pub fn encode(&self, x: &Tensor, train: bool) -> Tensor {
        let features = self.backbone.forward_t(x, train);
        self.project.forward_t(&features, train)
    }

    /// Critic scores for two index-aligned image batches; returns `[B, 1]`.
    pub fn forward_t(&self, x1: &Tensor, x2: &Tensor, train: bool) -> Tensor {
        let z1 = self.encode(x1, train);
        let z2 = self.encode(x2, train);
        self.critic.forward(&z1, &z2)
    }

    /// Width of the encoder output.
    pub fn latent_dim(&self) -> i64 {
        self.latent_dim
    }

    /// The variable store backing this model.
    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    /// Count of trainable parameters.
    pub fn num_parameters(&self) -> usize {
        count_parameters(&self.vs)
    }

    /// Save all weights to `path`.
    pub fn save(&self, path: &Path) -> TrainResult<()> {
        self.vs
            .save(path)
            .map_err(|e| TrainError::checkpoint(e.to_string(), path))
    }

    /// Load weights from `path` into this model.
    pub fn load(&mut self, path: &Path) -> TrainResult<()> {
        self.vs
            .load(path)
            .map_err(|e| TrainError::checkpoint(e.to_string(), path))
    }
}

// ---------------------------------------------------------------------------
// LinearProbe
// ---------------------------------------------------------------------------

/// Small supervised classifier over frozen latents.
///
/// Used only to score representation quality after MINE training; it is
/// never part of the unsupervised objective.
pub struct LinearProbe {
    vs: nn::VarStore,
    fc1: nn::Linear,
    fc2: nn::Linear,
}

impl LinearProbe {
    /// Build a probe mapping `latent_dim` inputs to `n_classes` logits.
    pub fn new(latent_dim: i64, n_classes: i64, device: Device) -> Self {
        let vs = nn::VarStore::new(device);
        let root = vs.root();
        let fc1 = nn::linear(&root / "fc1", latent_dim, 128, Default::default());
        let fc2 = nn::linear(&root / "fc2", 128, n_classes, Default::default());
        LinearProbe { vs, fc1, fc2 }
    }

    /// Class logits `[B, n_classes]`.
    pub fn forward(&self, z: &Tensor) -> Tensor {
        let h = self.fc1.forward_t(z, false);
        self.fc2.forward_t(&h, false)
    }

    /// The variable store backing this probe.
    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }
}

fn count_parameters(vs: &nn::VarStore) -> usize {
    vs.trainable_variables()
        .iter()
        .map(|t| t.numel())
        .sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_spec() -> DatasetSpec {
        DatasetSpec {
            image_size: 16,
            channels: 1,
            n_classes: 4,
        }
    }

    #[test]
    fn backbone_feature_dim_tracks_pooling() {
        tch::manual_seed(0);
        let vs = nn::VarStore::new(Device::Cpu);
        // 16-pixel input, three pools → 2×2 spatial, 512 channels.
        let bb = VggBackbone::new(&vs.root(), VGG_F, 1, 16);
        assert_eq!(bb.feature_dim(), 512 * 2 * 2);

        let x = Tensor::rand([2, 1, 16, 16], (Kind::Float, Device::Cpu));
        let f = bb.forward_t(&x, false);
        assert_eq!(f.size(), vec![2, 2048]);
    }

    #[test]
    fn cluster_model_outputs_are_row_stochastic() {
        tch::manual_seed(0);
        let model = ClusterModel::new(&tiny_spec(), 4, 2, Device::Cpu);
        // side = 16 - 4 = 12
        let x = Tensor::rand([3, 1, 12, 12], (Kind::Float, Device::Cpu));
        let outs = model.forward_t(&x, false);
        assert_eq!(outs.len(), 2);
        for y in &outs {
            assert_eq!(y.size(), vec![3, 4]);
            let row_sums = y.sum_dim_intlist(&[1i64][..], false, Kind::Float);
            let err = (row_sums - 1.0).abs().max().double_value(&[]);
            assert!(err < 1e-5, "softmax rows must sum to 1, err {err}");
        }
    }

    #[test]
    fn cluster_model_has_parameters() {
        tch::manual_seed(0);
        let model = ClusterModel::new(&tiny_spec(), 4, 1, Device::Cpu);
        assert!(model.num_parameters() > 0);
        assert_eq!(model.num_heads(), 1);
    }

    #[test]
    fn cluster_model_checkpoint_round_trip() {
        tch::manual_seed(0);
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cluster.ot");

        let model = ClusterModel::new(&tiny_spec(), 4, 1, Device::Cpu);
        let x = Tensor::rand([2, 1, 12, 12], (Kind::Float, Device::Cpu));
        let before = model.forward_t(&x, false).remove(0);
        model.save(&path).unwrap();

        tch::manual_seed(99);
        let mut restored = ClusterModel::new(&tiny_spec(), 4, 1, Device::Cpu);
        restored.load(&path).unwrap();
        let after = restored.forward_t(&x, false).remove(0);

        let diff = (&before - &after).abs().max().double_value(&[]);
        assert!(diff < 1e-6, "restored model must reproduce outputs, diff {diff}");
    }

    #[test]
    fn load_from_missing_path_is_a_checkpoint_error() {
        tch::manual_seed(0);
        let mut model = ClusterModel::new(&tiny_spec(), 4, 1, Device::Cpu);
        let err = model.load(Path::new("/nonexistent/weights.ot")).unwrap_err();
        assert!(matches!(err, TrainError::Checkpoint { .. }));
    }

    #[test]
    fn critic_scores_one_per_pair() {
        tch::manual_seed(0);
        let vs = nn::VarStore::new(Device::Cpu);
        let critic = MineCritic::new(&vs.root(), 16, 32);
        let x = Tensor::rand([5, 16], (Kind::Float, Device::Cpu));
        let y = Tensor::rand([5, 16], (Kind::Float, Device::Cpu));
        assert_eq!(critic.forward(&x, &y).size(), vec![5, 1]);
    }

    #[test]
    fn mine_model_shapes() {
        tch::manual_seed(0);
        let model = MineModel::new(&tiny_spec(), 4, 16, 32, Device::Cpu);
        let x1 = Tensor::rand([4, 1, 12, 12], (Kind::Float, Device::Cpu));
        let x2 = Tensor::rand([4, 1, 12, 12], (Kind::Float, Device::Cpu));
        assert_eq!(model.encode(&x1, false).size(), vec![4, 16]);
        assert_eq!(model.forward_t(&x1, &x2, false).size(), vec![4, 1]);
        assert_eq!(model.latent_dim(), 16);
        assert!(model.num_parameters() > 0);
    }

    #[test]
    fn probe_logit_shape() {
        tch::manual_seed(0);
        let probe = LinearProbe::new(16, 10, Device::Cpu);
        let z = Tensor::rand([7, 16], (Kind::Float, Device::Cpu));
        assert_eq!(probe.forward(&z).size(), vec![7, 10]);
    }
}
