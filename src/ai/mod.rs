//! Placeholder training and inference elements.
//!
//! The trainer runs a fake training loop and writes a model artifact; the
//! inference element validates that artifact at startup and serves a
//! trivial prediction.

pub mod artifact;
pub mod inference;
pub mod model;
pub mod train;

pub use artifact::{ArtifactMetadata, ARTIFACT_DIR, METADATA_FILE, MODEL_FILE};
pub use model::{Model, TrainingMetrics};

use uuid::uuid;

use crate::elements::{ElementDescriptor, ElementKind};

/// Parent element grouping the trainer and the predictor.
pub const DESCRIPTOR: ElementDescriptor = ElementDescriptor {
    id: uuid!("76d615a1-66bd-4577-b621-c7d7926ac699"),
    name: "simple_ai",
    display_name: "Simple AI",
    version: "0.1.0",
    framework_version: None,
    kind: ElementKind::Group,
};

/// Elements grouped under [`DESCRIPTOR`].
pub fn sub_elements() -> [ElementDescriptor; 2] {
    [train::DESCRIPTOR, inference::DESCRIPTOR]
}
