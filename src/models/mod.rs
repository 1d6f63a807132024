//! Model artifact and classifier components

pub mod classifier;
pub mod inference;
pub mod loader;
pub mod onnx;

pub use classifier::{Classifier, LogisticClassifier, StandardScaler};
pub use inference::InferenceEngine;
pub use loader::{ArtifactLoader, ModelArtifact};
pub use onnx::OnnxClassifier;
