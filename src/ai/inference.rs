//! Inference element.

use std::path::Path;
use uuid::uuid;

use crate::ai::artifact::{ArtifactMetadata, ArtifactPaths};
use crate::ai::model::Model;
use crate::elements::{ElementDescriptor, ElementKind};
use crate::error::Result;

pub const DESCRIPTOR: ElementDescriptor = ElementDescriptor {
    id: uuid!("8d59c59f-86bc-4f38-b132-4b5e07fb265f"),
    name: "inference",
    display_name: "Simple AI Predictor",
    version: "0.1.0",
    framework_version: None,
    kind: ElementKind::Inference,
};

/// Input used by the executor.
pub const SAMPLE_INPUT: i64 = 123;

/// Inference element after a successful startup.
#[derive(Debug)]
pub struct Predictor {
    model: Model,
    pub metadata: ArtifactMetadata,
}

impl Predictor {
    /// Validates the artifact under `root` and loads the model once.
    pub fn startup(root: impl AsRef<Path>) -> Result<Self> {
        let paths = ArtifactPaths::new(root);
        paths.ensure_dir()?;

        let metadata = paths.verify_metadata(&ArtifactMetadata::default())?;
        tracing::info!(name = %metadata.name, version = %metadata.version, "Artifact metadata");

        let model = Model::new().load(paths.model())?;
        Ok(Self { model, metadata })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Runs one prediction on the sample input.
    pub fn run(&self) -> i64 {
        let inference = self.model.predict(SAMPLE_INPUT);
        tracing::info!(input = SAMPLE_INPUT, output = inference, "Inference");
        inference
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::train::{self, TrainSettings};
    use crate::error::Error;
    use std::time::Duration;

    #[tokio::test]
    async fn test_startup_after_training() {
        let root = tempfile::tempdir().unwrap();
        let settings = TrainSettings {
            epochs: 1,
            epoch_delay: Duration::ZERO,
            root: root.path().to_path_buf(),
        };
        train::run(&settings, |_| {}).await.unwrap();

        let predictor = Predictor::startup(root.path()).unwrap();
        assert_eq!(predictor.run(), 246);
        assert!(predictor.model().weights().unwrap().ends_with("model.txt"));
    }

    #[test]
    fn test_startup_without_artifact_fails() {
        let root = tempfile::tempdir().unwrap();
        let err = Predictor::startup(root.path()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        // The artifact folder is still created
        assert!(root.path().join("artifact").is_dir());
    }

    #[test]
    fn test_startup_rejects_foreign_metadata() {
        let root = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(root.path());
        paths.ensure_dir().unwrap();
        paths
            .write_metadata(&ArtifactMetadata {
                name: "Other".to_string(),
                ..Default::default()
            })
            .unwrap();

        assert!(matches!(
            Predictor::startup(root.path()),
            Err(Error::ArtifactMismatch { .. })
        ));
    }
}
