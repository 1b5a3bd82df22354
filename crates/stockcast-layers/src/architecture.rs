//! Validation and construction of a model from a [`LayerSpec`] list.
//!
//! Validation walks the list once, tracking whether the stack currently
//! carries a sequence or a single vector. Every rule that would otherwise
//! surface as a shape mismatch inside a layer is reported up front as
//! [`ConfigurationError::InvalidArchitecture`] with the offending index.

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use stockcast_core::{ConfigurationError, LayerSpec};

use crate::activation::ActivationType;
use crate::dense::Dense;
use crate::dropout::Dropout;
use crate::lstm::Lstm;
use crate::sequential::{ModelLayer, Sequential};

/// What flows between two layers, excluding the batch dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackShape {
    /// `[time, features]`
    Sequence(usize),
    /// `[features]`
    Vector(usize),
}

impl StackShape {
    pub fn features(&self) -> usize {
        match self {
            StackShape::Sequence(f) | StackShape::Vector(f) => *f,
        }
    }

    /// Renders the shape with the batch dimension, e.g. `(None, 60, 64)`.
    pub fn describe(&self, window_size: Option<usize>) -> String {
        let steps = window_size.map_or_else(|| "T".to_string(), |w| w.to_string());
        match self {
            StackShape::Sequence(f) => format!("(None, {}, {})", steps, f),
            StackShape::Vector(f) => format!("(None, {})", f),
        }
    }
}

impl fmt::Display for StackShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(None))
    }
}

/// A layer after validation, with resolved settings and shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedKind {
    Recurrent {
        units: usize,
        return_full_sequence: bool,
    },
    Dense {
        units: usize,
        activation: ActivationType,
    },
    Dropout {
        rate: f32,
    },
}

/// One entry of a validated plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLayer {
    pub index: usize,
    pub kind: PlannedKind,
    pub input: StackShape,
    pub output: StackShape,
}

impl PlannedLayer {
    /// Summary name such as `recurrent_0` or `dense_4`.
    pub fn display_name(&self) -> String {
        let kind = match self.kind {
            PlannedKind::Recurrent { .. } => "recurrent",
            PlannedKind::Dense { .. } => "dense",
            PlannedKind::Dropout { .. } => "dropout",
        };
        format!("{}_{}", kind, self.index)
    }
}

fn invalid(index: usize, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidArchitecture {
        index,
        reason: reason.into(),
    }
}

/// Interprets a layer list into a validated, buildable model.
///
/// # Example
///
/// ```
/// use stockcast_core::LayerSpec;
/// use stockcast_layers::ArchitectureBuilder;
///
/// let layers = vec![
///     LayerSpec::recurrent(8, true),
///     LayerSpec::dropout(0.2),
///     LayerSpec::recurrent(8, false),
///     LayerSpec::dense(1, None),
/// ];
/// let model = ArchitectureBuilder::new().build(&layers, 30).unwrap();
/// assert_eq!(model.window_size(), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchitectureBuilder {
    seed: u64,
}

impl Default for ArchitectureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchitectureBuilder {
    pub fn new() -> Self {
        Self { seed: 42 }
    }

    /// Seed for weight initialization and dropout masks.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks a layer list and returns its resolved plan.
    ///
    /// Rules: the list is non-empty, starts with a recurrent layer, has
    /// positive `units`, dropout rates strictly between 0 and 1, known
    /// activation names, a recurrent layer that feeds another recurrent
    /// layer emits a full sequence, the last recurrent layer emits a single
    /// vector, dense layers consume vectors, and the stack ends in one unit.
    pub fn validate(layers: &[LayerSpec]) -> Result<Vec<PlannedLayer>, ConfigurationError> {
        let first = layers
            .first()
            .ok_or_else(|| invalid(0, "layer list is empty"))?;
        if !first.is_recurrent() {
            return Err(invalid(
                0,
                format!("first layer must be recurrent, got {}", first.kind()),
            ));
        }

        let mut plan = Vec::with_capacity(layers.len());
        let mut shape = StackShape::Sequence(1);
        for (index, spec) in layers.iter().enumerate() {
            let input = shape;
            let kind = match spec {
                LayerSpec::Recurrent {
                    units,
                    return_full_sequence,
                } => {
                    if *units == 0 {
                        return Err(invalid(index, "units must be a positive integer"));
                    }
                    if let StackShape::Vector(_) = input {
                        return Err(invalid(
                            index,
                            "recurrent layer needs a sequence input, but the previous layer emits a single vector",
                        ));
                    }
                    match next_non_dropout(layers, index) {
                        Some((next, LayerSpec::Recurrent { .. })) if !*return_full_sequence => {
                            return Err(invalid(
                                index,
                                format!(
                                    "return_full_sequence must be true because layer {} is recurrent",
                                    next
                                ),
                            ));
                        }
                        _ => {}
                    }
                    if *return_full_sequence && !has_later_recurrent(layers, index) {
                        return Err(invalid(
                            index,
                            "the last recurrent layer must set return_full_sequence to false",
                        ));
                    }
                    shape = if *return_full_sequence {
                        StackShape::Sequence(*units)
                    } else {
                        StackShape::Vector(*units)
                    };
                    PlannedKind::Recurrent {
                        units: *units,
                        return_full_sequence: *return_full_sequence,
                    }
                }
                LayerSpec::Dense { units, activation } => {
                    if *units == 0 {
                        return Err(invalid(index, "units must be a positive integer"));
                    }
                    let activation = match activation.as_deref() {
                        None => ActivationType::Linear,
                        Some(name) => ActivationType::from_name(name).ok_or_else(|| {
                            invalid(
                                index,
                                format!(
                                    "unknown activation '{}', expected one of {}",
                                    name,
                                    ActivationType::ALLOWED.join(", ")
                                ),
                            )
                        })?,
                    };
                    if let StackShape::Sequence(_) = input {
                        return Err(invalid(
                            index,
                            "dense layer needs a single vector input, but the previous layer emits a sequence",
                        ));
                    }
                    shape = StackShape::Vector(*units);
                    PlannedKind::Dense {
                        units: *units,
                        activation,
                    }
                }
                LayerSpec::Dropout { rate } => {
                    if !(rate.is_finite() && *rate > 0.0 && *rate < 1.0) {
                        return Err(invalid(
                            index,
                            format!("dropout rate must be in (0, 1), got {}", rate),
                        ));
                    }
                    PlannedKind::Dropout { rate: *rate as f32 }
                }
            };
            plan.push(PlannedLayer {
                index,
                kind,
                input,
                output: shape,
            });
        }

        if shape != StackShape::Vector(1) {
            let terminal = layers
                .iter()
                .rposition(|l| !matches!(l, LayerSpec::Dropout { .. }))
                .unwrap_or(0);
            return Err(invalid(
                terminal,
                format!(
                    "terminal layer must have a single output unit, got {}",
                    shape.features()
                ),
            ));
        }
        Ok(plan)
    }

    /// Validates `layers` and builds a model whose first recurrent layer
    /// receives `(window_size, 1)` input.
    pub fn build(
        &self,
        layers: &[LayerSpec],
        window_size: usize,
    ) -> Result<Sequential, ConfigurationError> {
        if window_size == 0 {
            return Err(ConfigurationError::NonPositive {
                name: "window_size".to_string(),
            });
        }
        let plan = Self::validate(layers)?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let model_layers = plan
            .iter()
            .map(|planned| match planned.kind {
                PlannedKind::Recurrent {
                    units,
                    return_full_sequence,
                } => ModelLayer::Recurrent(Lstm::new(
                    planned.input.features(),
                    units,
                    return_full_sequence,
                    &mut rng,
                )),
                PlannedKind::Dense { units, activation } => ModelLayer::Dense(Dense::new(
                    planned.input.features(),
                    units,
                    activation,
                    &mut rng,
                )),
                PlannedKind::Dropout { rate } => ModelLayer::Dropout(Dropout::new(
                    rate,
                    self.seed.wrapping_add(planned.index as u64 + 1),
                )),
            })
            .collect();

        Ok(Sequential::new(model_layers, plan, layers.to_vec(), window_size))
    }
}

fn next_non_dropout(layers: &[LayerSpec], index: usize) -> Option<(usize, &LayerSpec)> {
    layers
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|(_, l)| !matches!(l, LayerSpec::Dropout { .. }))
}

fn has_later_recurrent(layers: &[LayerSpec], index: usize) -> bool {
    layers.iter().skip(index + 1).any(LayerSpec::is_recurrent)
}
