//! End-to-end checks of models built from serialized layer lists.

use stockcast_core::{ConfigurationError, LayerSpec};
use stockcast_layers::prelude::*;

const STACKED: &str = r#"[
    {"kind": "recurrent", "units": 6, "return_full_sequence": true},
    {"kind": "dropout", "rate": 0.2},
    {"kind": "recurrent", "units": 4},
    {"kind": "dense", "units": 3, "activation": "tanh"},
    {"kind": "dense", "units": 1}
]"#;

fn ramp_batch(batch: usize, window: usize) -> (Tensor, Tensor) {
    let mut inputs = Vec::with_capacity(batch * window);
    let mut targets = Vec::with_capacity(batch);
    for b in 0..batch {
        let start = b as f32 / (batch + window) as f32;
        for t in 0..window {
            inputs.push(start + t as f32 * 0.01);
        }
        targets.push(start + window as f32 * 0.01);
    }
    (
        Tensor::from_data(&[batch, window, 1], inputs),
        Tensor::from_data(&[batch, 1], targets),
    )
}

fn mse(prediction: &Tensor, target: &Tensor) -> f32 {
    prediction.sub(target).map(|d| d * d).mean()
}

#[test]
fn test_json_architecture_builds_and_predicts() {
    let layers: Vec<LayerSpec> = serde_json::from_str(STACKED).unwrap();
    let model = ArchitectureBuilder::new().build(&layers, 10).unwrap();
    assert_eq!(model.specs(), layers.as_slice());

    let (inputs, _) = ramp_batch(5, 10);
    let out = model.predict(&inputs).unwrap();
    assert_eq!(out.shape(), &[5, 1]);
    assert!(out.is_finite());
}

#[test]
fn test_same_seed_builds_identical_models() {
    let layers: Vec<LayerSpec> = serde_json::from_str(STACKED).unwrap();
    let a = ArchitectureBuilder::new().with_seed(11).build(&layers, 8).unwrap();
    let b = ArchitectureBuilder::new().with_seed(11).build(&layers, 8).unwrap();
    let c = ArchitectureBuilder::new().with_seed(12).build(&layers, 8).unwrap();

    let (inputs, _) = ramp_batch(3, 8);
    assert_eq!(a.predict(&inputs).unwrap(), b.predict(&inputs).unwrap());
    assert_ne!(a.predict(&inputs).unwrap(), c.predict(&inputs).unwrap());
}

#[test]
fn test_gradient_steps_reduce_loss() {
    let layers: Vec<LayerSpec> = serde_json::from_str(STACKED).unwrap();
    let mut model = ArchitectureBuilder::new().with_seed(3).build(&layers, 8).unwrap();
    let (inputs, targets) = ramp_batch(16, 8);

    let initial = mse(&model.predict(&inputs).unwrap(), &targets);
    for _ in 0..60 {
        let out = model.forward_train(&inputs).unwrap();
        let n = out.numel() as f32;
        let grad = out.sub(&targets).scale(2.0 / n);
        model.backward(&grad).unwrap();
        let grads = model.gradients().unwrap();
        for (param, g) in model.parameters_mut().into_iter().zip(grads) {
            let step = g.scale(-0.05);
            param.add_assign(&step);
        }
    }
    let trained = mse(&model.predict(&inputs).unwrap(), &targets);
    assert!(
        trained < initial,
        "loss did not decrease: {} -> {}",
        initial,
        trained
    );
}

#[test]
fn test_invalid_json_architecture_is_a_configuration_error() {
    let layers: Vec<LayerSpec> = serde_json::from_str(
        r#"[{"kind": "dense", "units": 8, "activation": "relu"}, {"kind": "dense", "units": 1}]"#,
    )
    .unwrap();
    let err = ArchitectureBuilder::new().build(&layers, 10).unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::InvalidArchitecture { index: 0, .. }
    ));
    assert!(err.to_string().contains("layer 0"));
}
