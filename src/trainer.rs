//! Training loop orchestrators.
//!
//! Three trainers share the same shape: a model, an Adam optimiser over its
//! `VarStore`, a [`PairedSampleGenerator`] (except the Gaussian demo, which
//! samples directly), and an explicit post-epoch evaluation step.
//!
//! Evaluation is a pure function of `(model, eval set, previous best)`: it
//! returns an [`EvalOutcome`] rather than mutating hidden trainer state,
//! and the caller threads the best-so-far accuracy back in. Checkpoints
//! are written when the outcome reports an improvement and a save path is
//! configured.
//!
//! A failed step aborts the run with a [`TrainError`]; there are no
//! retries and no silently skipped batches.

use ndarray::Array4;
use tch::{nn, nn::OptimizerConfig, Device, Kind, Reduction, Tensor};
use tracing::{debug, info};

use crate::config::TrainingConfig;
use crate::dataset::ImageDataset;
use crate::error::{ConfigError, TrainError, TrainResult};
use crate::gaussian::{sample_joint, sample_marginal};
use crate::losses::{iic_loss, mine_loss};
use crate::matching::unsupervised_accuracy;
use crate::model::{ClusterModel, LinearProbe, MineCritic, MineModel};
use crate::pairing::PairedSampleGenerator;
use crate::rng::Xorshift64;

/// Mini-batch size used when training and scoring the linear probe.
const PROBE_BATCH: i64 = 128;

/// Mini-batch size used for chunked evaluation forwards.
const EVAL_BATCH: i64 = 512;

// ---------------------------------------------------------------------------
// Tensor plumbing
// ---------------------------------------------------------------------------

/// Convert an `[N, H, W, C]` batch buffer into an NCHW float tensor.
pub fn to_nchw(x: &Array4<f32>, device: Device) -> Tensor {
    let (n, h, w, c) = x.dim();
    let data: Vec<f32> = x.iter().copied().collect();
    Tensor::from_slice(&data)
        .reshape([n as i64, h as i64, w as i64, c as i64])
        .permute([0, 3, 1, 2])
        .to_device(device)
}

/// Column `col` of a `[N, 2]` sample matrix as an `[N, 1]` float tensor.
fn column_tensor(samples: &ndarray::Array2<f64>, col: usize, device: Device) -> Tensor {
    let data: Vec<f32> = samples.column(col).iter().map(|&v| v as f32).collect();
    Tensor::from_slice(&data)
        .reshape([data.len() as i64, 1])
        .to_device(device)
}

// ---------------------------------------------------------------------------
// EvalOutcome
// ---------------------------------------------------------------------------

/// Result of one evaluation pass, with best-so-far threading.
#[derive(Debug, Clone)]
pub struct EvalOutcome {
    /// Accuracy per head (IIC) or the single probe accuracy (MINE), in [0, 1].
    pub head_accuracy: Vec<f64>,
    /// Best accuracy across heads for this evaluation.
    pub accuracy: f64,
    /// Running best accuracy including this evaluation.
    pub best: f64,
    /// `true` when this evaluation improved on the previous best.
    pub improved: bool,
}

impl EvalOutcome {
    /// The outcome to thread into the first evaluation of a run.
    pub fn start() -> Self {
        EvalOutcome {
            head_accuracy: Vec::new(),
            accuracy: 0.0,
            best: 0.0,
            improved: false,
        }
    }

    fn from_accuracies(head_accuracy: Vec<f64>, previous_best: f64) -> Self {
        let accuracy = head_accuracy.iter().copied().fold(0.0, f64::max);
        EvalOutcome {
            head_accuracy,
            accuracy,
            best: previous_best.max(accuracy),
            improved: accuracy > previous_best,
        }
    }
}

// ---------------------------------------------------------------------------
// EvalSet
// ---------------------------------------------------------------------------

/// Held-out data prepared once for evaluation: every test image center
/// cropped and stacked into a single NCHW tensor.
struct EvalSet {
    x: Tensor,
    labels: Vec<i64>,
    n_classes: usize,
}

impl EvalSet {
    fn build(dataset: &dyn ImageDataset, crop: usize, device: Device) -> TrainResult<Self> {
        if dataset.is_empty() {
            return Err(TrainError::EmptyDataset);
        }
        let spec = dataset.spec();
        let side = spec.side(crop);
        let mut batch = Array4::zeros((dataset.len(), side, side, spec.channels));
        let mut labels = Vec::with_capacity(dataset.len());
        for idx in 0..dataset.len() {
            let sample = dataset.get(idx)?;
            let cropped = crate::augment::center_crop(&sample.pixels, crop);
            batch
                .slice_mut(ndarray::s![idx, .., .., ..])
                .assign(&cropped);
            labels.push(sample.label);
        }
        info!(
            "eval set: {} center-cropped {}x{} images from {}",
            labels.len(),
            side,
            side,
            dataset.name()
        );
        Ok(EvalSet {
            x: to_nchw(&batch, device),
            labels,
            n_classes: spec.n_classes,
        })
    }

    fn len(&self) -> i64 {
        self.labels.len() as i64
    }
}

// ---------------------------------------------------------------------------
// IicTrainer
// ---------------------------------------------------------------------------

/// Invariant Information Clustering: trains cluster heads to agree across
/// paired views, evaluated by optimal label matching.
pub struct IicTrainer<'a> {
    config: TrainingConfig,
    model: ClusterModel,
    opt: nn::Optimizer,
    generator: PairedSampleGenerator<'a>,
    eval_set: EvalSet,
    device: Device,
}

impl<'a> IicTrainer<'a> {
    /// Build a trainer over a train/test dataset pair.
    pub fn new(
        config: TrainingConfig,
        train_data: &'a dyn ImageDataset,
        test_data: &dyn ImageDataset,
    ) -> TrainResult<Self> {
        config.validate()?;
        let device = config.device();
        tch::manual_seed(config.seed as i64);

        let spec = train_data.spec();
        if test_data.spec() != spec {
            return Err(ConfigError::invalid_value(
                "dataset",
                "train and test datasets disagree on geometry",
            )
            .into());
        }
        let generator = PairedSampleGenerator::new(
            train_data,
            config.batch_size,
            config.crop_size,
            config.affine_views,
            config.seed,
        )?;
        let model = ClusterModel::new(&spec, config.crop_size, config.heads, device);
        let opt = nn::Adam::default().build(model.var_store(), config.learning_rate)?;
        let eval_set = EvalSet::build(test_data, config.crop_size, device)?;

        info!(
            "IIC: {} heads x {} clusters, {} parameters, {} train batches/epoch",
            config.heads,
            spec.n_classes,
            model.num_parameters(),
            generator.num_batches()
        );

        Ok(IicTrainer {
            config,
            model,
            opt,
            generator,
            eval_set,
            device,
        })
    }

    /// Restore model weights from the configured restore path.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingWeights`] when no restore path is configured
    /// or the file does not exist.
    pub fn restore(&mut self) -> TrainResult<()> {
        let path = self
            .config
            .restore_path()
            .ok_or_else(|| ConfigError::MissingWeights {
                path: self.config.save_dir.clone(),
            })?;
        if !path.is_file() {
            return Err(ConfigError::MissingWeights { path }.into());
        }
        info!("loading weights from {}", path.display());
        self.model.load(&path)
    }

    /// Run the full training loop, evaluating after every epoch.
    ///
    /// Returns the final [`EvalOutcome`]; its `best` field is the highest
    /// accuracy observed across the run.
    pub fn train(&mut self) -> TrainResult<EvalOutcome> {
        let mut outcome = EvalOutcome::start();
        for epoch in 0..self.config.epochs {
            let lr = self.config.lr_for_epoch(epoch);
            self.opt.set_lr(lr);
            self.generator.begin_epoch();

            let num_batches = self.generator.num_batches();
            let mut epoch_loss = 0.0;
            for b in 0..num_batches {
                let batch = self.generator.siamese_batch(b)?;
                let n = batch.pair_count() as i64;
                let x = to_nchw(&batch.x, self.device);
                let outputs = self.model.forward_t(&x, true);

                let mut loss = iic_loss(&outputs[0], n);
                for head_output in &outputs[1..] {
                    loss = loss + iic_loss(head_output, n);
                }
                self.opt.backward_step(&loss);
                epoch_loss += loss.double_value(&[]);
            }
            info!(
                "epoch {:4}: loss {:.6}  lr {:.6e}",
                epoch,
                epoch_loss / num_batches as f64,
                lr
            );

            // Post-epoch evaluation, threaded through the running best.
            outcome = self.evaluate(outcome.best)?;
            if outcome.improved {
                if let Some(path) = self.config.save_path() {
                    std::fs::create_dir_all(&self.config.save_dir)
                        .map_err(|e| TrainError::checkpoint(e.to_string(), &self.config.save_dir))?;
                    info!("saving improved weights to {}", path.display());
                    self.model.save(&path)?;
                }
            }
        }
        Ok(outcome)
    }

    /// Evaluate unsupervised accuracy on the held-out set.
    ///
    /// Pure with respect to trainer state: the best-so-far accuracy comes
    /// in as `previous_best` and leaves inside the returned outcome.
    pub fn evaluate(&self, previous_best: f64) -> TrainResult<EvalOutcome> {
        let heads = self.model.num_heads();
        let predictions = tch::no_grad(|| -> TrainResult<Vec<Vec<i64>>> {
            let mut per_head: Vec<Vec<i64>> =
                vec![Vec::with_capacity(self.eval_set.labels.len()); heads];
            let total = self.eval_set.len();
            let mut start = 0;
            while start < total {
                let len = EVAL_BATCH.min(total - start);
                let xb = self.eval_set.x.narrow(0, start, len);
                let outputs = self.model.forward_t(&xb, false);
                for (head, output) in outputs.iter().enumerate() {
                    let picked = Vec::<i64>::try_from(&output.argmax(-1, false))?;
                    per_head[head].extend(picked);
                }
                start += len;
            }
            Ok(per_head)
        })?;

        let k = self.eval_set.n_classes;
        let mut head_accuracy = Vec::with_capacity(heads);
        for (head, preds) in predictions.iter().enumerate() {
            let acc = unsupervised_accuracy(&self.eval_set.labels, preds, k, k)?;
            head_accuracy.push(acc);
            debug!("head {head} accuracy: {:.2}%", acc * 100.0);
        }

        let outcome = EvalOutcome::from_accuracies(head_accuracy, previous_best);
        info!(
            "accuracy: {:.2}%  best: {:.2}%",
            outcome.accuracy * 100.0,
            outcome.best * 100.0
        );
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// MineTrainer
// ---------------------------------------------------------------------------

/// MINE over images: maximises the Donsker–Varadhan bound between the
/// latents of paired views; representation quality is scored by a linear
/// probe trained on the frozen encoder.
pub struct MineTrainer<'a> {
    config: TrainingConfig,
    model: MineModel,
    opt: nn::Optimizer,
    generator: PairedSampleGenerator<'a>,
    eval_set: EvalSet,
    device: Device,
}

impl<'a> MineTrainer<'a> {
    /// Build a trainer over a train/test dataset pair.
    pub fn new(
        config: TrainingConfig,
        train_data: &'a dyn ImageDataset,
        test_data: &dyn ImageDataset,
    ) -> TrainResult<Self> {
        config.validate()?;
        let device = config.device();
        tch::manual_seed(config.seed as i64);

        let spec = train_data.spec();
        if test_data.spec() != spec {
            return Err(ConfigError::invalid_value(
                "dataset",
                "train and test datasets disagree on geometry",
            )
            .into());
        }
        let generator = PairedSampleGenerator::new(
            train_data,
            config.batch_size,
            config.crop_size,
            config.affine_views,
            config.seed,
        )?;
        let model = MineModel::new(
            &spec,
            config.crop_size,
            config.latent_dim,
            config.mine_hidden,
            device,
        );
        let opt = nn::Adam::default().build(model.var_store(), config.learning_rate)?;
        let eval_set = EvalSet::build(test_data, config.crop_size, device)?;

        info!(
            "MINE: latent {} / critic hidden {}, {} parameters, {} train batches/epoch",
            config.latent_dim,
            config.mine_hidden,
            model.num_parameters(),
            generator.num_batches()
        );

        Ok(MineTrainer {
            config,
            model,
            opt,
            generator,
            eval_set,
            device,
        })
    }

    /// Restore model weights from the configured restore path.
    pub fn restore(&mut self) -> TrainResult<()> {
        let path = self
            .config
            .restore_path()
            .ok_or_else(|| ConfigError::MissingWeights {
                path: self.config.save_dir.clone(),
            })?;
        if !path.is_file() {
            return Err(ConfigError::MissingWeights { path }.into());
        }
        info!("loading weights from {}", path.display());
        self.model.load(&path)
    }

    /// Run the full training loop, evaluating after every epoch.
    pub fn train(&mut self) -> TrainResult<EvalOutcome> {
        let mut outcome = EvalOutcome::start();
        for epoch in 0..self.config.epochs {
            let lr = self.config.lr_for_epoch(epoch);
            self.opt.set_lr(lr);
            self.generator.begin_epoch();

            let num_batches = self.generator.num_batches();
            let mut epoch_loss = 0.0;
            for b in 0..num_batches {
                let batch = self.generator.mine_batch(b)?;
                let n = batch.pair_count() as i64;
                let x1 = to_nchw(&batch.x1, self.device);
                let x2 = to_nchw(&batch.x2, self.device);
                let scores = self.model.forward_t(&x1, &x2, true);
                let loss = mine_loss(&scores, n);
                self.opt.backward_step(&loss);
                epoch_loss += loss.double_value(&[]);
            }
            info!(
                "epoch {:4}: loss {:.6}  (MI bound {:.6})  lr {:.6e}",
                epoch,
                epoch_loss / num_batches as f64,
                -epoch_loss / num_batches as f64,
                lr
            );

            outcome = self.evaluate(outcome.best)?;
            if outcome.improved {
                if let Some(path) = self.config.save_path() {
                    std::fs::create_dir_all(&self.config.save_dir)
                        .map_err(|e| TrainError::checkpoint(e.to_string(), &self.config.save_dir))?;
                    info!("saving improved weights to {}", path.display());
                    self.model.save(&path)?;
                }
            }
        }
        Ok(outcome)
    }

    /// Score the current encoder with a freshly trained linear probe.
    ///
    /// The probe sees true labels; this is evaluation only and never feeds
    /// back into the unsupervised objective.
    pub fn evaluate(&self, previous_best: f64) -> TrainResult<EvalOutcome> {
        // Encode the held-out set with the frozen encoder.
        let latents = tch::no_grad(|| {
            let total = self.eval_set.len();
            let mut chunks = Vec::new();
            let mut start = 0;
            while start < total {
                let len = EVAL_BATCH.min(total - start);
                let xb = self.eval_set.x.narrow(0, start, len);
                chunks.push(self.model.encode(&xb, false));
                start += len;
            }
            Tensor::cat(&chunks, 0)
        });

        let accuracy = probe_accuracy(
            &latents,
            &self.eval_set.labels,
            self.eval_set.n_classes as i64,
            self.device,
            self.config.seed,
        )?;
        let outcome = EvalOutcome::from_accuracies(vec![accuracy], previous_best);
        info!(
            "probe accuracy: {:.2}%  best: {:.2}%",
            outcome.accuracy * 100.0,
            outcome.best * 100.0
        );
        Ok(outcome)
    }
}

/// Train a fresh [`LinearProbe`] on `latents` for one epoch and return its
/// accuracy on the same data.
fn probe_accuracy(
    latents: &Tensor,
    labels: &[i64],
    n_classes: i64,
    device: Device,
    seed: u64,
) -> TrainResult<f64> {
    let latent_dim = latents.size()[1];
    let probe = LinearProbe::new(latent_dim, n_classes, device);
    let mut opt = nn::Adam::default().build(probe.var_store(), 1e-3)?;

    let targets = Tensor::from_slice(labels).to_device(device);
    let total = labels.len() as i64;

    // One epoch over a shuffled ordering.
    let mut order: Vec<i64> = (0..total).collect();
    Xorshift64::new(seed).shuffle(&mut order);
    let order = Tensor::from_slice(&order).to_device(device);

    let mut start = 0;
    while start < total {
        let len = PROBE_BATCH.min(total - start);
        let idx = order.narrow(0, start, len);
        let zb = latents.index_select(0, &idx);
        let yb = targets.index_select(0, &idx);
        let logits = probe.forward(&zb);
        let loss = logits.cross_entropy_loss::<Tensor>(&yb, None, Reduction::Mean, -100, 0.0);
        opt.backward_step(&loss);
        start += len;
    }

    // Accuracy of the trained probe.
    let correct = tch::no_grad(|| {
        probe
            .forward(latents)
            .argmax(-1, false)
            .eq_tensor(&targets)
            .to_kind(Kind::Float)
            .mean(Kind::Float)
            .double_value(&[])
    });
    Ok(correct)
}

// ---------------------------------------------------------------------------
// SimpleMineTrainer (2-D Gaussian demonstration)
// ---------------------------------------------------------------------------

/// Standalone MINE on a correlated 2-D Gaussian.
///
/// Validates the estimator: the learned bound should approach the
/// histogram / closed-form MI of the configured covariance.
pub struct SimpleMineTrainer {
    // Owns the critic parameters.
    _vs: nn::VarStore,
    critic: MineCritic,
    opt: nn::Optimizer,
    batch_size: usize,
    epochs: usize,
    cov_xy: f64,
    device: Device,
    rng: Xorshift64,
}

/// Epochs per logged MI estimate in the Gaussian demo.
const DEMO_LOG_EVERY: usize = 100;

/// Learning rate for the Gaussian demo critic.
const DEMO_LR: f64 = 0.01;

/// Hidden width of the Gaussian demo critic.
const DEMO_HIDDEN: i64 = 16;

impl SimpleMineTrainer {
    /// Build the demo trainer from `config` (`cov_xy`, `batch_size`,
    /// `epochs`, `seed`, device selection).
    pub fn new(config: &TrainingConfig) -> TrainResult<Self> {
        config.validate()?;
        let device = config.device();
        tch::manual_seed(config.seed as i64);
        let vs = nn::VarStore::new(device);
        let critic = MineCritic::new(&vs.root(), 1, DEMO_HIDDEN);
        let opt = nn::Adam::default().build(&vs, DEMO_LR)?;
        Ok(SimpleMineTrainer {
            _vs: vs,
            critic,
            opt,
            batch_size: config.batch_size,
            epochs: config.epochs,
            cov_xy: config.cov_xy,
            device,
            rng: Xorshift64::new(config.seed),
        })
    }

    /// Train the critic and return the final MI estimate (nats), the mean
    /// of the negated loss over the last logging window.
    pub fn train(&mut self) -> TrainResult<f64> {
        let n = self.batch_size as i64;
        let mut window = 0.0;
        let mut window_len = 0;
        let mut estimate = 0.0;

        for epoch in 0..self.epochs {
            let joint = sample_joint(self.batch_size, self.cov_xy, &mut self.rng);
            let marginal = sample_marginal(self.batch_size, self.cov_xy, &mut self.rng);

            let x = Tensor::cat(
                &[
                    column_tensor(&joint, 0, self.device),
                    column_tensor(&marginal, 0, self.device),
                ],
                0,
            );
            let y = Tensor::cat(
                &[
                    column_tensor(&joint, 1, self.device),
                    column_tensor(&marginal, 1, self.device),
                ],
                0,
            );

            let scores = self.critic.forward(&x, &y);
            let loss = mine_loss(&scores, n);
            self.opt.backward_step(&loss);

            window -= loss.double_value(&[]);
            window_len += 1;
            if (epoch + 1) % DEMO_LOG_EVERY == 0 {
                estimate = window / window_len as f64;
                info!("epoch {:5}: MINE MI {:.6}", epoch + 1, estimate);
                window = 0.0;
                window_len = 0;
            }
        }
        if window_len > 0 {
            estimate = window / window_len as f64;
        }
        Ok(estimate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetKind;
    use crate::dataset::SyntheticDigits;
    use ndarray::Array4;

    fn tiny_config() -> TrainingConfig {
        let mut cfg = TrainingConfig::default();
        cfg.dataset = DatasetKind::Synthetic;
        cfg.crop_size = 4;
        cfg.batch_size = 8;
        cfg.epochs = 1;
        cfg.heads = 2;
        cfg.latent_dim = 8;
        cfg.mine_hidden = 16;
        cfg
    }

    #[test]
    fn to_nchw_reorders_axes() {
        let mut x = Array4::<f32>::zeros((2, 3, 3, 1));
        x[[1, 0, 2, 0]] = 0.7;
        let t = to_nchw(&x, Device::Cpu);
        assert_eq!(t.size(), vec![2, 1, 3, 3]);
        let v = t.double_value(&[1, 0, 0, 2]);
        assert!((v - 0.7).abs() < 1e-6);
    }

    #[test]
    fn eval_outcome_threads_best() {
        let first = EvalOutcome::from_accuracies(vec![0.4, 0.6], 0.0);
        assert!((first.accuracy - 0.6).abs() < 1e-12);
        assert!(first.improved);

        let second = EvalOutcome::from_accuracies(vec![0.5], first.best);
        assert!(!second.improved);
        assert!((second.best - 0.6).abs() < 1e-12);
    }

    #[test]
    fn iic_trainer_runs_one_epoch_on_synthetic_data() {
        let train = SyntheticDigits::new(24, 4, 16);
        let test = SyntheticDigits::new(16, 4, 16);
        let mut trainer = IicTrainer::new(tiny_config(), &train, &test).unwrap();
        let outcome = trainer.train().unwrap();
        assert_eq!(outcome.head_accuracy.len(), 2);
        for acc in &outcome.head_accuracy {
            assert!((0.0..=1.0).contains(acc), "accuracy {acc} out of range");
        }
        assert!(outcome.best >= outcome.head_accuracy[0].min(outcome.head_accuracy[1]));
    }

    #[test]
    fn iic_evaluate_is_repeatable() {
        let train = SyntheticDigits::new(24, 4, 16);
        let test = SyntheticDigits::new(16, 4, 16);
        let trainer = IicTrainer::new(tiny_config(), &train, &test).unwrap();
        let a = trainer.evaluate(0.0).unwrap();
        let b = trainer.evaluate(0.0).unwrap();
        assert_eq!(a.head_accuracy, b.head_accuracy);
    }

    #[test]
    fn iic_restore_without_weights_is_a_config_error() {
        let train = SyntheticDigits::new(24, 4, 16);
        let test = SyntheticDigits::new(16, 4, 16);
        let mut trainer = IicTrainer::new(tiny_config(), &train, &test).unwrap();
        let err = trainer.restore().unwrap_err();
        assert!(matches!(
            err,
            TrainError::Config(ConfigError::MissingWeights { .. })
        ));
    }

    #[test]
    fn mine_trainer_runs_one_epoch_on_synthetic_data() {
        let train = SyntheticDigits::new(24, 4, 16);
        let test = SyntheticDigits::new(16, 4, 16);
        let mut trainer = MineTrainer::new(tiny_config(), &train, &test).unwrap();
        let outcome = trainer.train().unwrap();
        assert_eq!(outcome.head_accuracy.len(), 1);
        assert!((0.0..=1.0).contains(&outcome.accuracy));
    }

    #[test]
    fn simple_mine_estimate_tracks_strong_correlation() {
        let mut cfg = tiny_config();
        cfg.batch_size = 256;
        cfg.epochs = 500;
        cfg.cov_xy = 0.9;
        let mut trainer = SimpleMineTrainer::new(&cfg).unwrap();
        let estimate = trainer.train().unwrap();
        // Exact MI at ρ=0.9 is ≈0.830 nats; the learned bound should be
        // clearly positive after a short run.
        assert!(
            estimate > 0.2,
            "MI estimate {estimate} too low for ρ=0.9"
        );
    }

    #[test]
    fn probe_learns_separable_latents() {
        tch::manual_seed(0);
        // Two well-separated clusters in latent space; enough samples for a
        // meaningful number of probe optimisation steps in one epoch.
        let n = 8192;
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n {
            let class = i % 2;
            let offset: f32 = if class == 0 { -2.0 } else { 2.0 };
            data.extend((0..4).map(|d| offset + 0.01 * ((i + d) % 64) as f32 / 64.0));
            labels.push(class as i64);
        }
        let latents = Tensor::from_slice(&data).reshape([n as i64, 4]);
        let acc = probe_accuracy(&latents, &labels, 2, Device::Cpu, 42).unwrap();
        assert!(acc > 0.7, "probe accuracy {acc} on separable latents");
    }

    #[test]
    fn mismatched_dataset_geometry_is_rejected() {
        let train = SyntheticDigits::new(24, 4, 16);
        let test = SyntheticDigits::new(16, 4, 20);
        assert!(matches!(
            IicTrainer::new(tiny_config(), &train, &test),
            Err(TrainError::Config(_))
        ));
    }
}
