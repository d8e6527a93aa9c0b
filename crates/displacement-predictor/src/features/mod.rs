//! Turns a normalized request into the numeric representation each model
//! family was trained on.

mod bundle;
mod classical;
mod neural;

pub use bundle::{EmbeddingSpec, FeatureLoadError, NumericScalers, Scaler};
pub use classical::ClassicalEncoder;
pub use neural::NeuralEncoder;

use serde::Serialize;
use std::fmt;

use crate::domain::{CategoricalField, NormalizedInput};
use crate::geo::GeoFeatures;

/// Encoding scheme shared by a group of models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Linear and tree models: one-hot/ordinal categoricals and scaled numerics.
    Classical,
    /// Networks: integer embedding indices and scaled numerics.
    Neural,
}

impl ModelFamily {
    /// Sub-directory of the artifacts root holding the family's files.
    pub fn dir_name(self) -> &'static str {
        match self {
            ModelFamily::Classical => "classical",
            ModelFamily::Neural => "neural",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A request encoded for one model family.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedFeatureVector {
    Classical {
        values: Vec<f64>,
    },
    Neural {
        indices: Vec<(CategoricalField, usize)>,
        numeric: Vec<f64>,
    },
}

impl EncodedFeatureVector {
    pub fn family(&self) -> ModelFamily {
        match self {
            EncodedFeatureVector::Classical { .. } => ModelFamily::Classical,
            EncodedFeatureVector::Neural { .. } => ModelFamily::Neural,
        }
    }
}

/// The fitted encoders disagree with a value that passed normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("{field} value '{value}' is absent from the fitted encoder")]
    UnknownCategory {
        field: CategoricalField,
        value: String,
    },
    #[error("no fitted encoders loaded for the {0} family")]
    FamilyUnavailable(ModelFamily),
    #[error("a {actual} feature vector cannot feed a {expected} model")]
    FamilyMismatch {
        expected: ModelFamily,
        actual: ModelFamily,
    },
}

/// Both fitted encoder bundles. Either may be missing when its files failed to
/// load; encoding for that family then fails.
#[derive(Debug, Clone, Default)]
pub struct FeaturePreprocessor {
    classical: Option<ClassicalEncoder>,
    neural: Option<NeuralEncoder>,
}

impl FeaturePreprocessor {
    pub fn new(classical: Option<ClassicalEncoder>, neural: Option<NeuralEncoder>) -> Self {
        Self { classical, neural }
    }

    pub fn supports(&self, family: ModelFamily) -> bool {
        match family {
            ModelFamily::Classical => self.classical.is_some(),
            ModelFamily::Neural => self.neural.is_some(),
        }
    }

    pub fn classical(&self) -> Option<&ClassicalEncoder> {
        self.classical.as_ref()
    }

    pub fn neural(&self) -> Option<&NeuralEncoder> {
        self.neural.as_ref()
    }

    /// Encode `input` for `family`. Pure: the same input always yields the same
    /// vector.
    pub fn encode(
        &self,
        input: &NormalizedInput,
        geo: &GeoFeatures,
        family: ModelFamily,
    ) -> Result<EncodedFeatureVector, EncodingError> {
        let encoded = match family {
            ModelFamily::Classical => self
                .classical
                .as_ref()
                .ok_or(EncodingError::FamilyUnavailable(family))?
                .encode(input, geo)
                .map(|values| EncodedFeatureVector::Classical { values }),
            ModelFamily::Neural => self
                .neural
                .as_ref()
                .ok_or(EncodingError::FamilyUnavailable(family))?
                .encode(input, geo)
                .map(|(indices, numeric)| EncodedFeatureVector::Neural { indices, numeric }),
        };

        if let Err(EncodingError::UnknownCategory { field, value }) = &encoded {
            tracing::error!(%field, %value, %family, "normalized value missing from fitted encoder");
        }

        encoded
    }
}
