//! Declarative description of a model architecture.
//!
//! A model is an ordered list of [`LayerSpec`] values. Only the first layer
//! sees the external input shape; every other layer infers its input size
//! from its predecessor.

use serde::{Deserialize, Serialize};

/// One entry of the layer-description language.
///
/// Serialized with a `kind` tag:
///
/// ```
/// use stockcast_core::LayerSpec;
///
/// let json = r#"[
///     {"kind": "recurrent", "units": 64, "return_full_sequence": true},
///     {"kind": "dropout", "rate": 0.2},
///     {"kind": "recurrent", "units": 64},
///     {"kind": "dense", "units": 1}
/// ]"#;
/// let layers: Vec<LayerSpec> = serde_json::from_str(json).unwrap();
/// assert_eq!(layers.len(), 4);
/// assert!(layers[0].is_recurrent());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerSpec {
    /// An LSTM layer.
    Recurrent {
        /// Hidden state size
        units: usize,
        /// Emit the hidden state at every step instead of only the last one
        #[serde(default)]
        return_full_sequence: bool,
    },
    /// A fully connected layer.
    Dense {
        /// Output size
        units: usize,
        /// Activation name; absent means linear
        #[serde(default, skip_serializing_if = "Option::is_none")]
        activation: Option<String>,
    },
    /// Inverted dropout, active only while training.
    Dropout {
        /// Fraction of units dropped
        rate: f64,
    },
}

impl LayerSpec {
    /// Shorthand for a recurrent layer.
    pub fn recurrent(units: usize, return_full_sequence: bool) -> Self {
        LayerSpec::Recurrent {
            units,
            return_full_sequence,
        }
    }

    /// Shorthand for a dense layer with an optional activation.
    pub fn dense(units: usize, activation: Option<&str>) -> Self {
        LayerSpec::Dense {
            units,
            activation: activation.map(str::to_string),
        }
    }

    /// Shorthand for a dropout layer.
    pub fn dropout(rate: f64) -> Self {
        LayerSpec::Dropout { rate }
    }

    /// The tag used in serialized form.
    pub fn kind(&self) -> &'static str {
        match self {
            LayerSpec::Recurrent { .. } => "recurrent",
            LayerSpec::Dense { .. } => "dense",
            LayerSpec::Dropout { .. } => "dropout",
        }
    }

    pub fn is_recurrent(&self) -> bool {
        matches!(self, LayerSpec::Recurrent { .. })
    }

    /// Number of units, if the layer has any.
    pub fn units(&self) -> Option<usize> {
        match self {
            LayerSpec::Recurrent { units, .. } | LayerSpec::Dense { units, .. } => Some(*units),
            LayerSpec::Dropout { .. } => None,
        }
    }
}

/// A named architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArchitecture {
    /// Name used for the run directory and the model card
    pub name: String,
    /// Ordered layer list
    pub layers: Vec<LayerSpec>,
}

impl Default for ModelArchitecture {
    fn default() -> Self {
        Self {
            name: "LSTM_v1".to_string(),
            layers: vec![
                LayerSpec::recurrent(64, true),
                LayerSpec::dropout(0.2),
                LayerSpec::recurrent(64, false),
                LayerSpec::dropout(0.2),
                LayerSpec::dense(32, Some("relu")),
                LayerSpec::dense(1, None),
            ],
        }
    }
}
