use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::{ModelArtifact, ModelName, PredictError, PredictionResult};
use crate::config::ArtifactConfig;
use crate::domain::NormalizedInput;
use crate::features::{
    ClassicalEncoder, EncodedFeatureVector, FeaturePreprocessor, ModelFamily, NeuralEncoder,
};
use crate::geo::GeoFeatures;

/// Catalog row describing one model and whether it can serve requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelEntry {
    pub name: ModelName,
    pub display: &'static str,
    pub family: ModelFamily,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Loaded models and encoders. Immutable once built; share it behind an `Arc`.
#[derive(Debug)]
pub struct ModelRegistry {
    preprocessor: FeaturePreprocessor,
    models: BTreeMap<ModelName, ModelArtifact>,
    failures: BTreeMap<ModelName, String>,
    loaded_at: DateTime<Utc>,
}

impl ModelRegistry {
    /// Load every artifact under `config.root`. A file that fails to load
    /// only disables the models depending on it.
    pub fn load(config: &ArtifactConfig) -> Self {
        let mut failures = BTreeMap::new();

        let classical_dir = config.root.join(ModelFamily::Classical.dir_name());
        let classical = match ClassicalEncoder::load(&classical_dir) {
            Ok(encoder) => Some(encoder),
            Err(err) => {
                tracing::warn!(error = %err, dir = %classical_dir.display(), "classical encoders failed to load");
                record_family_failure(&mut failures, ModelFamily::Classical, &err.to_string());
                None
            }
        };

        let neural_dir = config.root.join(ModelFamily::Neural.dir_name());
        let neural = match NeuralEncoder::load(&neural_dir) {
            Ok(encoder) => Some(encoder),
            Err(err) => {
                tracing::warn!(error = %err, dir = %neural_dir.display(), "neural encoders failed to load");
                record_family_failure(&mut failures, ModelFamily::Neural, &err.to_string());
                None
            }
        };

        let preprocessor = FeaturePreprocessor::new(classical, neural);
        let mut models = BTreeMap::new();

        for model in ModelName::ALL {
            if config.exclude.contains(&model) {
                tracing::info!(%model, "model excluded by configuration");
                failures.insert(model, "excluded by configuration".to_string());
                continue;
            }
            if failures.contains_key(&model) {
                continue;
            }

            match load_artifact(&config.root, model, &preprocessor) {
                Ok(artifact) => {
                    models.insert(model, artifact);
                }
                Err(reason) => {
                    tracing::warn!(%model, error = %reason, "model artifact failed to load");
                    failures.insert(model, reason);
                }
            }
        }

        let registry = Self {
            preprocessor,
            models,
            failures,
            loaded_at: Utc::now(),
        };
        tracing::info!(
            available = ?registry.available(),
            unavailable = registry.failures.len(),
            "model registry ready"
        );
        registry
    }

    /// Build a registry from already loaded parts.
    pub fn from_parts(
        preprocessor: FeaturePreprocessor,
        models: impl IntoIterator<Item = (ModelName, ModelArtifact)>,
    ) -> Self {
        let models: BTreeMap<_, _> = models.into_iter().collect();
        let failures = ModelName::ALL
            .into_iter()
            .filter(|model| !models.contains_key(model))
            .map(|model| (model, "not loaded".to_string()))
            .collect();
        Self {
            preprocessor,
            models,
            failures,
            loaded_at: Utc::now(),
        }
    }

    pub fn preprocessor(&self) -> &FeaturePreprocessor {
        &self.preprocessor
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Models able to serve requests, in catalog order.
    pub fn available(&self) -> Vec<ModelName> {
        self.models.keys().copied().collect()
    }

    pub fn is_ready(&self) -> bool {
        !self.models.is_empty()
    }

    pub fn catalog(&self) -> Vec<ModelEntry> {
        ModelName::ALL
            .into_iter()
            .map(|name| ModelEntry {
                name,
                display: name.display(),
                family: name.family(),
                available: self.models.contains_key(&name),
                reason: self.failures.get(&name).cloned(),
            })
            .collect()
    }

    /// Encode `input` for the named model and score it.
    pub fn predict(
        &self,
        model: &str,
        input: &NormalizedInput,
        geo: &GeoFeatures,
    ) -> Result<PredictionResult, PredictError> {
        let model = ModelName::parse(model)?;
        self.artifact(model)?;
        let encoded = self.preprocessor.encode(input, geo, model.family())?;
        self.predict_encoded(model, &encoded)
    }

    pub fn predict_encoded(
        &self,
        model: ModelName,
        encoded: &EncodedFeatureVector,
    ) -> Result<PredictionResult, PredictError> {
        let artifact = self.artifact(model)?;
        tracing::debug!(%model, family = %artifact.family(), "dispatching prediction");

        let probability = artifact
            .probability(encoded)
            .map_err(|source| PredictError::Inference { model, source })?;
        Ok(PredictionResult::from_probability(model, probability))
    }

    fn artifact(&self, model: ModelName) -> Result<&ModelArtifact, PredictError> {
        self.models.get(&model).ok_or_else(|| PredictError::Unavailable {
            model,
            available: self.available(),
        })
    }
}

fn record_family_failure(
    failures: &mut BTreeMap<ModelName, String>,
    family: ModelFamily,
    reason: &str,
) {
    for model in ModelName::ALL
        .into_iter()
        .filter(|model| model.family() == family)
    {
        failures.insert(model, format!("{family} encoders unavailable: {reason}"));
    }
}

fn load_artifact(
    root: &Path,
    model: ModelName,
    preprocessor: &FeaturePreprocessor,
) -> Result<ModelArtifact, String> {
    let path = root.join(model.family().dir_name()).join(model.file_name());
    let artifact =
        ModelArtifact::load_onnx(&path, model.family()).map_err(|err| err.to_string())?;

    artifact
        .check_compatible(preprocessor)
        .map_err(|err| format!("{} does not match the fitted encoders: {err}", path.display()))?;

    Ok(artifact)
}
