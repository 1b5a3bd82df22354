//! An ordered stack of layers built by [`ArchitectureBuilder`](crate::ArchitectureBuilder).

use std::collections::BTreeMap;
use std::fmt::Write as _;

use stockcast_core::LayerSpec;

use crate::architecture::PlannedLayer;
use crate::dense::Dense;
use crate::dropout::Dropout;
use crate::error::LayerError;
use crate::layer::Layer;
use crate::lstm::Lstm;
use crate::tensor::Tensor;

/// The closed set of layers a model can hold.
#[derive(Debug, Clone)]
pub enum ModelLayer {
    Recurrent(Lstm),
    Dense(Dense),
    Dropout(Dropout),
}

impl ModelLayer {
    fn inner(&self) -> &dyn Layer {
        match self {
            ModelLayer::Recurrent(l) => l,
            ModelLayer::Dense(l) => l,
            ModelLayer::Dropout(l) => l,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Layer {
        match self {
            ModelLayer::Recurrent(l) => l,
            ModelLayer::Dense(l) => l,
            ModelLayer::Dropout(l) => l,
        }
    }
}

impl Layer for ModelLayer {
    fn forward(&self, input: &Tensor) -> Result<Tensor, LayerError> {
        self.inner().forward(input)
    }

    fn forward_train(&mut self, input: &Tensor) -> Result<Tensor, LayerError> {
        self.inner_mut().forward_train(input)
    }

    fn backward(&mut self, grad: &Tensor) -> Result<Tensor, LayerError> {
        self.inner_mut().backward(grad)
    }

    fn parameters(&self) -> Vec<&Tensor> {
        self.inner().parameters()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        self.inner_mut().parameters_mut()
    }

    fn gradients(&self) -> Vec<Option<&Tensor>> {
        self.inner().gradients()
    }

    fn parameter_names(&self) -> Vec<&'static str> {
        self.inner().parameter_names()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}

/// A trainable regressor mapping `[batch, window, 1]` to `[batch, 1]`.
#[derive(Debug, Clone)]
pub struct Sequential {
    layers: Vec<ModelLayer>,
    plan: Vec<PlannedLayer>,
    specs: Vec<LayerSpec>,
    window_size: usize,
}

impl Sequential {
    pub(crate) fn new(
        layers: Vec<ModelLayer>,
        plan: Vec<PlannedLayer>,
        specs: Vec<LayerSpec>,
        window_size: usize,
    ) -> Self {
        Self {
            layers,
            plan,
            specs,
            window_size,
        }
    }

    pub fn layers(&self) -> &[ModelLayer] {
        &self.layers
    }

    /// The layer list this model was built from.
    pub fn specs(&self) -> &[LayerSpec] {
        &self.specs
    }

    pub fn plan(&self) -> &[PlannedLayer] {
        &self.plan
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    fn check_input(&self, input: &Tensor) -> Result<(), LayerError> {
        let shape = input.shape();
        if shape.len() != 3 || shape[1] != self.window_size || shape[2] != 1 {
            let batch = shape.first().copied().unwrap_or(0);
            return Err(LayerError::ShapeMismatch {
                expected: vec![batch, self.window_size, 1],
                actual: shape.to_vec(),
            });
        }
        Ok(())
    }

    /// Inference pass with dropout disabled.
    pub fn predict(&self, input: &Tensor) -> Result<Tensor, LayerError> {
        self.check_input(input)?;
        self.layers
            .iter()
            .try_fold(input.clone(), |x, layer| layer.forward(&x))
    }

    /// Predicts the next scaled value from one window of scaled values.
    pub fn predict_window(&self, window: &[f64]) -> Result<f64, LayerError> {
        let data = window.iter().map(|v| *v as f32).collect();
        let input = Tensor::try_from_data(&[1, window.len(), 1], data)?;
        let output = self.predict(&input)?;
        output
            .data()
            .first()
            .map(|v| f64::from(*v))
            .ok_or_else(|| LayerError::ForwardError {
                message: "model produced an empty output".to_string(),
            })
    }

    /// Training pass with dropout active; caches activations for
    /// [`Sequential::backward`].
    pub fn forward_train(&mut self, input: &Tensor) -> Result<Tensor, LayerError> {
        self.check_input(input)?;
        let mut x = input.clone();
        for layer in &mut self.layers {
            x = layer.forward_train(&x)?;
        }
        Ok(x)
    }

    /// Backpropagates the gradient of the loss with respect to the output.
    pub fn backward(&mut self, grad: &Tensor) -> Result<(), LayerError> {
        let mut g = grad.clone();
        for layer in self.layers.iter_mut().rev() {
            g = layer.backward(&g)?;
        }
        Ok(())
    }

    /// Owned copies of the parameter gradients, aligned with
    /// [`Sequential::parameters_mut`].
    pub fn gradients(&self) -> Result<Vec<Tensor>, LayerError> {
        self.layers
            .iter()
            .flat_map(|layer| layer.gradients())
            .map(|g| g.cloned().ok_or(LayerError::NotInitialized))
            .collect()
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        self.layers
            .iter_mut()
            .flat_map(|layer| layer.parameters_mut())
            .collect()
    }

    /// Parameters keyed as `<layer>/<parameter>`, e.g. `recurrent_0/kernel`.
    pub fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        self.layers
            .iter()
            .zip(&self.plan)
            .flat_map(|(layer, planned)| {
                let prefix = planned.display_name();
                layer
                    .parameter_names()
                    .into_iter()
                    .zip(layer.parameters())
                    .map(move |(name, tensor)| (format!("{}/{}", prefix, name), tensor))
            })
            .collect()
    }

    /// Restores parameters by name. Every parameter of the model must be
    /// present with a matching shape and no unknown names are accepted.
    pub fn load_parameters(&mut self, params: &BTreeMap<String, Tensor>) -> Result<(), LayerError> {
        let expected: Vec<String> = self.named_parameters().into_iter().map(|(n, _)| n).collect();
        if let Some(unknown) = params.keys().find(|k| !expected.contains(k)) {
            return Err(LayerError::ParameterError {
                message: format!("unknown parameter '{}'", unknown),
            });
        }
        let mut values = Vec::with_capacity(expected.len());
        for (name, current) in self.named_parameters() {
            let value = params.get(&name).ok_or_else(|| LayerError::ParameterError {
                message: format!("missing parameter '{}'", name),
            })?;
            if value.shape() != current.shape() {
                return Err(LayerError::ShapeMismatch {
                    expected: current.shape().to_vec(),
                    actual: value.shape().to_vec(),
                });
            }
            values.push(value);
        }
        // Nothing is written until every parameter checked out.
        for (slot, value) in self.parameters_mut().into_iter().zip(values) {
            *slot = value.clone();
        }
        Ok(())
    }

    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.num_parameters()).sum()
    }

    /// A printable table of layers, output shapes and parameter counts.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:<16} {:<18} {:>10}", "Layer", "Output shape", "Params");
        let _ = writeln!(out, "{}", "-".repeat(46));
        for (layer, planned) in self.layers.iter().zip(&self.plan) {
            let _ = writeln!(
                out,
                "{:<16} {:<18} {:>10}",
                planned.display_name(),
                planned.output.describe(Some(self.window_size)),
                layer.num_parameters()
            );
        }
        let _ = writeln!(out, "{}", "-".repeat(46));
        let _ = write!(out, "Total params: {}", self.num_parameters());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArchitectureBuilder;
    use stockcast_core::ModelArchitecture;

    fn small() -> Sequential {
        let layers = vec![
            LayerSpec::recurrent(4, true),
            LayerSpec::dropout(0.2),
            LayerSpec::recurrent(3, false),
            LayerSpec::dense(2, Some("relu")),
            LayerSpec::dense(1, None),
        ];
        ArchitectureBuilder::new().with_seed(5).build(&layers, 6).unwrap()
    }

    #[test]
    fn test_predict_shape() {
        let model = small();
        let out = model.predict(&Tensor::ones(&[3, 6, 1])).unwrap();
        assert_eq!(out.shape(), &[3, 1]);
        assert!(out.is_finite());
    }

    #[test]
    fn test_predict_rejects_wrong_window() {
        let model = small();
        assert!(matches!(
            model.predict(&Tensor::ones(&[3, 5, 1])),
            Err(LayerError::ShapeMismatch { .. })
        ));
        assert!(model.predict_window(&[0.1; 4]).is_err());
    }

    #[test]
    fn test_predict_window_matches_batch_predict() {
        let model = small();
        let window = [0.1, 0.2, 0.3, 0.25, 0.4, 0.5];
        let single = model.predict_window(&window).unwrap();
        let data: Vec<f32> = window.iter().map(|v| *v as f32).collect();
        let batch = model.predict(&Tensor::from_data(&[1, 6, 1], data)).unwrap();
        assert_eq!(single, f64::from(batch.data()[0]));
    }

    #[test]
    fn test_named_parameters() {
        let model = small();
        let names: Vec<String> = model.named_parameters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "recurrent_0/kernel",
                "recurrent_0/recurrent_kernel",
                "recurrent_0/bias",
                "recurrent_2/kernel",
                "recurrent_2/recurrent_kernel",
                "recurrent_2/bias",
                "dense_3/kernel",
                "dense_3/bias",
                "dense_4/kernel",
                "dense_4/bias",
            ]
        );
    }

    #[test]
    fn test_gradients_align_with_parameters() {
        let mut model = small();
        assert_eq!(model.gradients().unwrap_err(), LayerError::NotInitialized);

        let out = model.forward_train(&Tensor::ones(&[2, 6, 1])).unwrap();
        model.backward(&Tensor::ones(out.shape())).unwrap();
        let grads = model.gradients().unwrap();
        let params = model.parameters_mut();
        assert_eq!(grads.len(), params.len());
        for (g, p) in grads.iter().zip(params) {
            assert_eq!(g.shape(), p.shape());
        }
    }

    #[test]
    fn test_load_parameters_round_trip() {
        let source = ArchitectureBuilder::new().with_seed(1).build(small().specs(), 6).unwrap();
        let mut target = small();
        let params: BTreeMap<String, Tensor> = source
            .named_parameters()
            .into_iter()
            .map(|(n, t)| (n, t.clone()))
            .collect();
        target.load_parameters(&params).unwrap();

        let input = Tensor::full(&[2, 6, 1], 0.3);
        assert_eq!(
            source.predict(&input).unwrap(),
            target.predict(&input).unwrap()
        );
    }

    #[test]
    fn test_load_parameters_rejects_bad_input() {
        let mut model = small();
        let mut params: BTreeMap<String, Tensor> = model
            .named_parameters()
            .into_iter()
            .map(|(n, t)| (n, t.clone()))
            .collect();

        let mut missing = params.clone();
        missing.remove("dense_4/bias");
        assert!(matches!(
            model.load_parameters(&missing),
            Err(LayerError::ParameterError { .. })
        ));

        params.insert("dense_4/bias".to_string(), Tensor::zeros(&[2]));
        assert!(matches!(
            model.load_parameters(&params),
            Err(LayerError::ShapeMismatch { .. })
        ));

        params.insert("dense_4/bias".to_string(), Tensor::zeros(&[1]));
        params.insert("dense_9/bias".to_string(), Tensor::zeros(&[1]));
        assert!(matches!(
            model.load_parameters(&params),
            Err(LayerError::ParameterError { .. })
        ));
    }

    #[test]
    fn test_summary_of_default_architecture() {
        let model = ArchitectureBuilder::new()
            .build(&ModelArchitecture::default().layers, 60)
            .unwrap();
        let summary = model.summary();
        assert!(summary.contains("recurrent_0"));
        assert!(summary.contains("(None, 60, 64)"));
        assert!(summary.contains("(None, 1)"));
        // 4*64*(1+64+1) + 4*64*(64+64+1) + 64*32+32 + 32+1
        assert_eq!(model.num_parameters(), 16_896 + 33_024 + 2_080 + 33);
        assert!(summary.ends_with("Total params: 52033"));
    }
}
