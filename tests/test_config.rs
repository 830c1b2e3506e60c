//! Integration tests for [`infoclust::config`].

use infoclust::config::{DatasetKind, TrainingConfig};
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn default_config_round_trips_through_json() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("nested").join("config.json");

    let original = TrainingConfig::default();
    original.to_json(&path).expect("write should create parents");

    let loaded = TrainingConfig::from_json(&path).expect("read back");
    assert_eq!(loaded.dataset, DatasetKind::Mnist);
    assert_eq!(loaded.crop_size, original.crop_size);
    assert_eq!(loaded.heads, original.heads);
    assert_eq!(loaded.batch_size, original.batch_size);
    assert_eq!(loaded.epochs, original.epochs);
    assert!((loaded.learning_rate - original.learning_rate).abs() < 1e-12);
    assert_eq!(loaded.lr_decay_every, original.lr_decay_every);
    assert!((loaded.lr_gamma - original.lr_gamma).abs() < 1e-12);
    assert!((loaded.cov_xy - original.cov_xy).abs() < 1e-12);
    assert_eq!(loaded.seed, original.seed);
}

#[test]
fn dataset_kind_serialises_snake_case() {
    let mut cfg = TrainingConfig::default();
    cfg.dataset = DatasetKind::Synthetic;
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(json.contains("\"synthetic\""), "got {json}");
}

#[test]
fn missing_file_is_an_error() {
    let err = TrainingConfig::from_json(&PathBuf::from("/no/such/config.json")).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("config"), "unexpected message: {msg}");
}

#[test]
fn malformed_json_is_an_error() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(TrainingConfig::from_json(&path).is_err());
}

#[test]
fn validation_matrix() {
    let cases: Vec<(&str, Box<dyn Fn(&mut TrainingConfig)>)> = vec![
        ("heads", Box::new(|c| c.heads = 0)),
        ("latent_dim", Box::new(|c| c.latent_dim = 0)),
        ("mine_hidden", Box::new(|c| c.mine_hidden = -1)),
        ("batch_size", Box::new(|c| c.batch_size = 0)),
        ("epochs", Box::new(|c| c.epochs = 0)),
        ("learning_rate", Box::new(|c| c.learning_rate = 0.0)),
        ("lr_decay_every", Box::new(|c| c.lr_decay_every = 0)),
        ("lr_gamma zero", Box::new(|c| c.lr_gamma = 0.0)),
        ("lr_gamma one", Box::new(|c| c.lr_gamma = 1.0)),
        ("cov_xy high", Box::new(|c| c.cov_xy = 1.0)),
        ("cov_xy low", Box::new(|c| c.cov_xy = -1.0)),
    ];
    for (name, mutate) in cases {
        let mut cfg = TrainingConfig::default();
        mutate(&mut cfg);
        assert!(cfg.validate().is_err(), "case `{name}` should be rejected");
    }
}

#[test]
fn lr_schedule_decays_by_gamma_per_block() {
    let mut cfg = TrainingConfig::default();
    cfg.learning_rate = 0.01;
    cfg.lr_decay_every = 100;
    cfg.lr_gamma = 0.5;
    assert!((cfg.lr_for_epoch(0) - 0.01).abs() < 1e-15);
    assert!((cfg.lr_for_epoch(99) - 0.01).abs() < 1e-15);
    assert!((cfg.lr_for_epoch(100) - 0.005).abs() < 1e-15);
    assert!((cfg.lr_for_epoch(250) - 0.0025).abs() < 1e-15);
}
