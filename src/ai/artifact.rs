//! Model artifact layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Directory holding the artifact, relative to the working root.
pub const ARTIFACT_DIR: &str = "artifact";
pub const METADATA_FILE: &str = "metadata.json";
pub const MODEL_FILE: &str = "model.txt";

/// Contents of `model.txt` written by the trainer.
pub const MODEL_CONTENT: &str = "hello world";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl Default for ArtifactMetadata {
    fn default() -> Self {
        Self {
            name: "Sample Artifact".to_string(),
            version: "1.0".to_string(),
            description: "This is a sample metadata file.".to_string(),
        }
    }
}

/// Resolved paths of an artifact under some root directory.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(ARTIFACT_DIR),
        }
    }

    pub fn metadata(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    pub fn model(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    /// Creates the artifact directory if missing.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn write_metadata(&self, metadata: &ArtifactMetadata) -> Result<()> {
        let mut json = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        metadata.serialize(&mut serde_json::Serializer::with_formatter(&mut json, formatter))?;
        std::fs::write(self.metadata(), json)?;
        Ok(())
    }

    pub fn read_metadata(&self) -> Result<ArtifactMetadata> {
        let json = std::fs::read_to_string(self.metadata())?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Reads the metadata and checks it against `expected`.
    pub fn verify_metadata(&self, expected: &ArtifactMetadata) -> Result<ArtifactMetadata> {
        let actual = self.read_metadata()?;
        if &actual != expected {
            return Err(Error::ArtifactMismatch {
                expected: serde_json::to_string(expected)?,
                actual: serde_json::to_string(&actual)?,
            });
        }
        Ok(actual)
    }
}
