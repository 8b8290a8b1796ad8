//! Trainer element.
//!
//! Runs the placeholder training loop, forwards each metrics update, and
//! writes the model artifact the inference element expects.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use uuid::uuid;

use crate::ai::artifact::{ArtifactMetadata, ArtifactPaths, MODEL_CONTENT};
use crate::ai::model::{Model, TrainingMetrics};
use crate::elements::{ElementDescriptor, ElementKind};
use crate::error::Result;

pub const DESCRIPTOR: ElementDescriptor = ElementDescriptor {
    id: uuid!("72a0a0c5-86ed-46a9-88d3-aa75acd51286"),
    name: "train",
    display_name: "Simple AI Trainer",
    version: "0.1.0",
    framework_version: None,
    kind: ElementKind::Training,
};

/// How a frontend should render one training chart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSchema {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_labels: BTreeMap<&'static str, &'static str>,
}

fn epoch_chart(title: &'static str) -> ChartSchema {
    ChartSchema {
        title,
        x_label: "Epochs",
        y_labels: BTreeMap::from([("train", "Train"), ("validation", "Validation")]),
    }
}

/// Charts reported through [`TrainingMetrics`].
pub fn metrics_schema() -> BTreeMap<&'static str, ChartSchema> {
    BTreeMap::from([
        ("accuracy", epoch_chart("Accuracy")),
        ("loss", epoch_chart("Loss")),
    ])
}

/// Settings for the trainer.
#[derive(Debug, Clone)]
pub struct TrainSettings {
    /// Number of fake epochs (default: 5).
    pub epochs: u32,

    /// Time spent per epoch (default: 200ms).
    pub epoch_delay: Duration,

    /// Directory the `artifact/` folder is created in.
    pub root: PathBuf,
}

impl Default for TrainSettings {
    fn default() -> Self {
        Self {
            epochs: 5,
            epoch_delay: Duration::from_millis(200),
            root: PathBuf::from("."),
        }
    }
}

/// Trains the model and writes the artifact.
///
/// `on_metrics` receives every progress update. Returns the artifact paths.
pub async fn run<F>(settings: &TrainSettings, mut on_metrics: F) -> Result<ArtifactPaths>
where
    F: FnMut(&TrainingMetrics),
{
    tracing::info!(epochs = settings.epochs, "Training started");

    let model = Model::new().with_epoch_delay(settings.epoch_delay);
    model
        .train(settings.epochs, |metrics| {
            tracing::info!(
                progress = metrics.progress,
                accuracy = metrics.charts.accuracy.y.train,
                loss = metrics.charts.loss.y.train,
                "Training metrics"
            );
            on_metrics(metrics);
        })
        .await;

    let paths = ArtifactPaths::new(&settings.root);
    paths.ensure_dir()?;
    paths.write_metadata(&ArtifactMetadata::default())?;
    std::fs::write(paths.model(), MODEL_CONTENT)?;

    tracing::info!(artifact = %paths.dir.display(), "Training finished, artifact written");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_json() {
        let json = serde_json::to_value(metrics_schema()).unwrap();
        assert_eq!(json["accuracy"]["title"], "Accuracy");
        assert_eq!(json["loss"]["xLabel"], "Epochs");
        assert_eq!(json["loss"]["yLabels"]["validation"], "Validation");
    }

    #[tokio::test]
    async fn test_run_writes_artifact() {
        let root = tempfile::tempdir().unwrap();
        let settings = TrainSettings {
            epochs: 3,
            epoch_delay: Duration::ZERO,
            root: root.path().to_path_buf(),
        };

        let mut updates = Vec::new();
        let paths = run(&settings, |m| updates.push(m.progress)).await.unwrap();

        assert_eq!(updates, vec![0.333, 0.667, 1.0]);
        assert_eq!(
            std::fs::read_to_string(paths.model()).unwrap(),
            "hello world"
        );
        assert_eq!(paths.read_metadata().unwrap(), ArtifactMetadata::default());
    }
}
