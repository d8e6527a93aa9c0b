//! The five interchangeable classifiers and the registry that owns them.

mod artifact;
mod onnx;
mod registry;

pub use artifact::{ArtifactError, FixedScorer, ModelArtifact, Scorer};
pub use onnx::{OnnxModel, NUMERIC_INPUT};
pub use registry::{ModelEntry, ModelRegistry};

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::{class_label, DISPLACEMENT_CLASS, OTHER_CLASS};
use crate::features::{EncodingError, ModelFamily};

/// Probabilities at or above this value predict forced displacement.
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ModelName {
    #[serde(rename = "Logistic_Regression")]
    LogisticRegression,
    #[serde(rename = "Random_Forest")]
    RandomForest,
    #[serde(rename = "XGBoost")]
    XGBoost,
    #[serde(rename = "ResNet_Style")]
    ResNetStyle,
    #[serde(rename = "Deep")]
    Deep,
}

impl ModelName {
    pub const ALL: [ModelName; 5] = [
        ModelName::LogisticRegression,
        ModelName::RandomForest,
        ModelName::XGBoost,
        ModelName::ResNetStyle,
        ModelName::Deep,
    ];

    /// Exact, case-sensitive match on the wire name.
    pub fn parse(name: &str) -> Result<Self, PredictError> {
        Self::ALL
            .into_iter()
            .find(|model| model.as_str() == name)
            .ok_or_else(|| PredictError::UnknownModel(name.to_string()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelName::LogisticRegression => "Logistic_Regression",
            ModelName::RandomForest => "Random_Forest",
            ModelName::XGBoost => "XGBoost",
            ModelName::ResNetStyle => "ResNet_Style",
            ModelName::Deep => "Deep",
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            ModelName::LogisticRegression => "Logistic Regression",
            ModelName::RandomForest => "Random Forest",
            ModelName::XGBoost => "XGBoost",
            ModelName::ResNetStyle => "ResNet Style",
            ModelName::Deep => "Deep (Wide & Deep)",
        }
    }

    pub fn family(self) -> ModelFamily {
        match self {
            ModelName::LogisticRegression | ModelName::RandomForest | ModelName::XGBoost => {
                ModelFamily::Classical
            }
            ModelName::ResNetStyle | ModelName::Deep => ModelFamily::Neural,
        }
    }

    /// Exported graph file name inside the family directory.
    pub fn file_name(self) -> String {
        format!("{}.onnx", self.as_str())
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Class decision of one model for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub prediction: u8,
    pub probability: f64,
    pub model: ModelName,
    pub label: &'static str,
}

impl PredictionResult {
    pub fn from_probability(model: ModelName, probability: f64) -> Self {
        let prediction = if probability >= DECISION_THRESHOLD {
            DISPLACEMENT_CLASS
        } else {
            OTHER_CLASS
        };
        Self {
            prediction,
            probability,
            model,
            label: class_label(prediction),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("unknown model '{0}'")]
    UnknownModel(String),
    #[error("model {model} is not available")]
    Unavailable {
        model: ModelName,
        available: Vec<ModelName>,
    },
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("model {model} failed to score the request")]
    Inference {
        model: ModelName,
        #[source]
        source: ArtifactError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_exact() {
        assert_eq!(
            ModelName::parse("Random_Forest").expect("known"),
            ModelName::RandomForest
        );
        assert!(matches!(
            ModelName::parse("random_forest"),
            Err(PredictError::UnknownModel(name)) if name == "random_forest"
        ));
        assert!("SVM".parse::<ModelName>().is_err());
    }

    #[test]
    fn names_round_trip_through_wire_form() {
        for model in ModelName::ALL {
            assert_eq!(ModelName::parse(model.as_str()).expect("known"), model);
            assert_eq!(
                serde_json::to_value(model).expect("serializes"),
                serde_json::json!(model.as_str())
            );
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let at = PredictionResult::from_probability(ModelName::XGBoost, 0.5);
        assert_eq!(at.prediction, 1);
        assert_eq!(at.label, "Desplazamiento Forzado");

        let below = PredictionResult::from_probability(ModelName::XGBoost, 0.4999);
        assert_eq!(below.prediction, 0);
        assert_eq!(below.label, "Otro Hecho Victimizante");
    }

    #[test]
    fn families_split_three_and_two() {
        let classical = ModelName::ALL
            .iter()
            .filter(|model| model.family() == ModelFamily::Classical)
            .count();
        assert_eq!(classical, 3);
        assert_eq!(ModelName::Deep.display(), "Deep (Wide & Deep)");
        assert_eq!(ModelName::ResNetStyle.file_name(), "ResNet_Style.onnx");
    }
}
