mod labels;
mod model;
mod preprocess;
mod ranking;

pub use labels::PLANT_CLASS_NAMES;
pub use model::{ImageModel, OnnxModel};
pub use preprocess::{InputSize, decode, preprocess};
pub use ranking::{TOP_K, to_percentage, top_k};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlant {
    pub plant_name: String,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_plant: String,
    pub accuracy: f64,
    pub top_predictions: Vec<RankedPlant>,
}

/// Immutable handle pairing a loaded model with its label table.
///
/// Built once at startup and shared behind an `Arc`; every method takes
/// `&self`.
pub struct Classifier {
    model: Box<dyn ImageModel>,
    labels: &'static [&'static str],
}

impl Classifier {
    pub fn new(model: impl ImageModel + 'static) -> Result<Self> {
        Self::with_labels(model, PLANT_CLASS_NAMES)
    }

    /// Fails when the model declares an output width that disagrees with `labels`.
    pub fn with_labels(
        model: impl ImageModel + 'static,
        labels: &'static [&'static str],
    ) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::model("label table is empty"));
        }
        if let Some(classes) = model.output_classes() {
            if classes != labels.len() {
                return Err(Error::model(format!(
                    "model outputs {} classes but {} labels are configured",
                    classes,
                    labels.len()
                )));
            }
        }
        Ok(Self {
            model: Box::new(model),
            labels,
        })
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    pub fn input_size(&self) -> InputSize {
        self.model.input_size()
    }

    /// Decodes, preprocesses, and classifies an uploaded image.
    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<Prediction> {
        let image = decode(bytes)?;
        let tensor = preprocess(&image, self.input_size())?;
        let scores = self.model.run(tensor)?;
        self.rank(&scores)
    }

    /// Turns raw model scores into the top prediction and its runners-up.
    pub fn rank(&self, scores: &[f32]) -> Result<Prediction> {
        if scores.len() != self.labels.len() {
            return Err(Error::inference(format!(
                "expected {} scores, model returned {}",
                self.labels.len(),
                scores.len()
            )));
        }

        let ranked = top_k(scores, TOP_K)?;
        let (best_index, best_score) = ranked[0];
        debug!("Top class index {} with score {}", best_index, best_score);

        let top_predictions = ranked
            .iter()
            .map(|&(index, score)| RankedPlant {
                plant_name: self.labels[index].to_string(),
                accuracy: to_percentage(score),
            })
            .collect();

        Ok(Prediction {
            predicted_plant: self.labels[best_index].to_string(),
            accuracy: to_percentage(best_score),
            top_predictions,
        })
    }
}
