//! Recurrent regressor layers for stockcast.
//!
//! This crate turns a declarative [`LayerSpec`](stockcast_core::LayerSpec)
//! list into a trainable [`Sequential`] model. It includes:
//!
//! - **LSTM**: recurrent layer with full backpropagation through time
//! - **Dense**: fully connected layer with a fused activation
//! - **Dropout**: inverted dropout, active only in training passes
//! - **ArchitectureBuilder**: validates a layer list and wires shapes
//!
//! # Quick Start
//!
//! ```
//! use stockcast_core::ModelArchitecture;
//! use stockcast_layers::prelude::*;
//!
//! let model = ArchitectureBuilder::new()
//!     .with_seed(7)
//!     .build(&ModelArchitecture::default().layers, 60)
//!     .unwrap();
//!
//! let windows = Tensor::zeros(&[16, 60, 1]); // batch of 16
//! let prediction = model.predict(&windows).unwrap();
//! assert_eq!(prediction.shape(), &[16, 1]);
//! ```

pub mod activation;
pub mod architecture;
pub mod dense;
pub mod dropout;
pub mod error;
pub mod initializer;
pub mod layer;
pub mod lstm;
pub mod sequential;
pub mod tensor;

pub use activation::ActivationType;
pub use architecture::{ArchitectureBuilder, PlannedKind, PlannedLayer, StackShape};
pub use dense::Dense;
pub use dropout::Dropout;
pub use error::{LayerError, LayerResult};
pub use initializer::Initializer;
pub use layer::Layer;
pub use lstm::Lstm;
pub use sequential::{ModelLayer, Sequential};
pub use tensor::Tensor;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::activation::ActivationType;
    pub use crate::architecture::ArchitectureBuilder;
    pub use crate::error::{LayerError, LayerResult};
    pub use crate::layer::Layer;
    pub use crate::sequential::Sequential;
    pub use crate::tensor::Tensor;
}
