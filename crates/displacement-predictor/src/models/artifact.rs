use std::fmt;
use std::path::{Path, PathBuf};

use super::onnx::OnnxModel;
use crate::features::{EncodedFeatureVector, EncodingError, FeaturePreprocessor, ModelFamily};

/// Raw class scores of a fitted classifier for one encoded request.
///
/// A single score is the positive-class probability; two scores are the
/// `[other, displacement]` class probabilities.
pub trait Scorer: Send + Sync + fmt::Debug {
    fn raw_scores(&self, encoded: &EncodedFeatureVector) -> Result<Vec<f32>, ArtifactError>;
}

/// Scores every request with the same stored output.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedScorer {
    scores: Vec<f32>,
}

impl FixedScorer {
    pub fn new(scores: impl Into<Vec<f32>>) -> Self {
        Self {
            scores: scores.into(),
        }
    }
}

impl Scorer for FixedScorer {
    fn raw_scores(&self, _encoded: &EncodedFeatureVector) -> Result<Vec<f32>, ArtifactError> {
        Ok(self.scores.clone())
    }
}

/// The artifact cannot be loaded, cannot score the vector it was handed, or
/// does not fit the loaded encoders.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("model file {} not found", .0.display())]
    Missing(PathBuf),
    #[error("failed to load {}: {message}", path.display())]
    Load { path: PathBuf, message: String },
    #[error("model input '{0}' has no encoded counterpart")]
    UnknownInput(String),
    #[error("model takes {expected} inputs, the encoder produces {found}")]
    InputCount { expected: usize, found: usize },
    #[error("model graph declares no output")]
    NoOutput,
    #[error("inference failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    #[error("model produced {0} scores, expected one or two")]
    OutputWidth(usize),
    #[error("model produced a non-finite score ({0})")]
    NonFinite(f32),
}

/// A fitted classifier bound to the encoder family that feeds it.
#[derive(Debug)]
pub struct ModelArtifact {
    family: ModelFamily,
    scorer: Box<dyn Scorer>,
}

impl ModelArtifact {
    pub fn new(family: ModelFamily, scorer: impl Scorer + 'static) -> Self {
        Self {
            family,
            scorer: Box::new(scorer),
        }
    }

    /// Open an exported ONNX graph.
    pub fn load_onnx(path: &Path, family: ModelFamily) -> Result<Self, ArtifactError> {
        Ok(Self::new(family, OnnxModel::load(path)?))
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// Score a neutral request through the graph, so input names, widths and
    /// embedding sizes that disagree with the fitted encoders fail at load.
    pub fn check_compatible(&self, preprocessor: &FeaturePreprocessor) -> Result<(), ArtifactError> {
        let unavailable = EncodingError::FamilyUnavailable(self.family);
        let encoded = match self.family {
            ModelFamily::Classical => {
                let encoder = preprocessor.classical().ok_or(unavailable)?;
                EncodedFeatureVector::Classical {
                    values: vec![0.0; encoder.width()],
                }
            }
            ModelFamily::Neural => {
                let encoder = preprocessor.neural().ok_or(unavailable)?;
                // The last embedding row is the highest index the graph must accept.
                let indices = encoder
                    .fields()
                    .map(|field| {
                        let last = encoder
                            .embedding(field)
                            .map_or(0, |spec| spec.vocab_size.saturating_sub(1));
                        (field, last)
                    })
                    .collect();
                EncodedFeatureVector::Neural {
                    indices,
                    numeric: vec![0.0; crate::domain::NUMERIC_FIELDS.len()],
                }
            }
        };
        self.probability(&encoded).map(|_| ())
    }

    /// Positive-class probability in [0, 1].
    pub fn probability(&self, encoded: &EncodedFeatureVector) -> Result<f64, ArtifactError> {
        if encoded.family() != self.family {
            return Err(EncodingError::FamilyMismatch {
                expected: self.family,
                actual: encoded.family(),
            }
            .into());
        }

        let scores = self.scorer.raw_scores(encoded)?;
        let positive = match scores.as_slice() {
            [positive] | [_, positive] => *positive,
            other => return Err(ArtifactError::OutputWidth(other.len())),
        };
        if !positive.is_finite() {
            return Err(ArtifactError::NonFinite(positive));
        }
        Ok(f64::from(positive).clamp(0.0, 1.0))
    }
}
