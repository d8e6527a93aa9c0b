//! Request flow: normalize, derive geography, predict, look up matching
//! registry records, and classify the match.

use serde::Serialize;
use std::sync::Arc;

use crate::catalog::{self, NormalizeError};
use crate::domain::{NormalizedInput, RawInput};
use crate::features::EncodingError;
use crate::geo::{self, GeoFeatures};
use crate::models::{ModelName, ModelRegistry, PredictError, PredictionResult};
use crate::sources::{RecordFilter, RecordSource};
use crate::validation::{self, ExternalRecordSet, ValidationOutcome, ValidationReport};

/// Prediction plus its registry cross-check.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    #[serde(flatten)]
    pub prediction: PredictionResult,
    #[serde(flatten)]
    pub validation: ValidationReport,
    #[serde(skip)]
    pub outcome: ValidationOutcome,
    #[serde(skip)]
    pub input: NormalizedInput,
    #[serde(skip)]
    pub geo: GeoFeatures,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] NormalizeError),
    #[error("unknown model '{0}'")]
    UnknownModel(String),
    #[error("model {model} is not available")]
    Unavailable {
        model: ModelName,
        available: Vec<ModelName>,
    },
    #[error("fitted encoders disagree with the normalized input")]
    EncodingInconsistency(#[source] EncodingError),
    #[error("model {model} failed to score the request")]
    Inference {
        model: ModelName,
        #[source]
        source: crate::models::ArtifactError,
    },
}

impl From<PredictError> for PipelineError {
    fn from(value: PredictError) -> Self {
        match value {
            PredictError::UnknownModel(name) => Self::UnknownModel(name),
            PredictError::Unavailable { model, available } => Self::Unavailable { model, available },
            PredictError::Encoding(err) => Self::EncodingInconsistency(err),
            PredictError::Inference { model, source } => Self::Inference { model, source },
        }
    }
}

/// The single entry point wiring normalization, prediction and validation.
pub struct PredictionPipeline<S: ?Sized> {
    registry: Arc<ModelRegistry>,
    source: Arc<S>,
}

impl<S: ?Sized> Clone for PredictionPipeline<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: RecordSource + ?Sized> PredictionPipeline<S> {
    pub fn new(registry: Arc<ModelRegistry>, source: Arc<S>) -> Self {
        Self { registry, source }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn run(&self, raw: &RawInput, model: &str) -> Result<PipelineOutcome, PipelineError> {
        let input = catalog::normalize(raw)?;
        let geo = raw
            .supplied_geo()
            .unwrap_or_else(|| geo::distances(&input.region));

        let prediction = self.registry.predict(model, &input, &geo)?;
        let records = self.lookup(raw);
        let outcome = validation::validate(&records, &prediction);

        tracing::info!(
            model = %prediction.model,
            prediction = prediction.prediction,
            probability = prediction.probability,
            match_type = outcome.match_type(),
            "prediction complete"
        );

        Ok(PipelineOutcome {
            validation: outcome.report(),
            prediction,
            outcome,
            input,
            geo,
        })
    }

    /// Registry records for the request as submitted, cleaned the same way
    /// requests are. A failed lookup yields an empty set.
    fn lookup(&self, raw: &RawInput) -> ExternalRecordSet {
        let filter = RecordFilter::from_raw(raw);
        match self.source.fetch(&filter) {
            Ok(records) => catalog::clean_records(records),
            Err(err) => {
                tracing::warn!(error = %err, "registry lookup failed; continuing without validation");
                ExternalRecordSet::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{ClassicalEncoder, FeaturePreprocessor, NumericScalers};
    use crate::features::ModelFamily;
    use crate::models::{FixedScorer, ModelArtifact};
    use crate::sources::LookupError;
    use crate::validation::ExternalRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        records: Vec<ExternalRecord>,
        fail: bool,
    }

    impl RecordSource for CountingSource {
        fn fetch(&self, _filter: &RecordFilter) -> Result<ExternalRecordSet, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LookupError::Status { status: 503 });
            }
            Ok(self.records.clone().into())
        }
    }

    fn registry(probability: f32) -> Arc<ModelRegistry> {
        let encoder = ClassicalEncoder::from_parts(Default::default(), NumericScalers::default())
            .expect("numeric-only bundle");
        Arc::new(ModelRegistry::from_parts(
            FeaturePreprocessor::new(Some(encoder), None),
            [(
                ModelName::LogisticRegression,
                ModelArtifact::new(ModelFamily::Classical, FixedScorer::new([probability])),
            )],
        ))
    }

    fn raw() -> RawInput {
        RawInput {
            region: "Putumayo".to_string(),
            sex: "Mujer".to_string(),
            ethnicity: "Indigena (Acreditado RA)".to_string(),
            disability: "Ninguna".to_string(),
            age_bracket: "entre 12 y 17".to_string(),
            reporting_year: 2004,
            prior_events: 2,
            north_south_km: None,
            east_west_km: None,
            total_km: None,
        }
    }

    #[test]
    fn undefined_region_aborts_before_any_model_or_lookup() {
        let source = Arc::new(CountingSource::default());
        let pipeline = PredictionPipeline::new(Arc::new(ModelRegistry::from_parts(
            FeaturePreprocessor::default(),
            [],
        )), Arc::clone(&source));

        let mut raw = raw();
        raw.region = "SIN DEFINIR".to_string();

        // An empty registry would answer Unavailable if the request reached it.
        let err = pipeline
            .run(&raw, "Logistic_Regression")
            .expect_err("rejected");
        assert!(matches!(err, PipelineError::InvalidInput(NormalizeError::Disallowed { .. })));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_lookup_still_returns_prediction() {
        let source = Arc::new(CountingSource {
            fail: true,
            ..Default::default()
        });
        let pipeline = PredictionPipeline::new(registry(0.9), Arc::clone(&source));

        let outcome = pipeline.run(&raw(), "Logistic_Regression").expect("predicts");
        assert_eq!(outcome.prediction.prediction, 1);
        assert_eq!(outcome.outcome, ValidationOutcome::NoMatch);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_geo_fields_are_derived_from_region() {
        let pipeline = PredictionPipeline::new(registry(0.5), Arc::new(CountingSource::default()));

        let mut raw = raw();
        raw.north_south_km = Some(1.0);
        let derived = pipeline.run(&raw, "Logistic_Regression").expect("predicts");
        assert_eq!(derived.geo, geo::distances("Putumayo"));
        assert_eq!(derived.input.ethnicity, "Indigena");

        raw.east_west_km = Some(2.0);
        raw.total_km = Some(3.0);
        let supplied = pipeline.run(&raw, "Logistic_Regression").expect("predicts");
        assert_eq!(supplied.geo.total_km, 3.0);
    }

    #[test]
    fn fetched_records_are_cleaned_before_validation() {
        let source = Arc::new(CountingSource {
            records: vec![
                ExternalRecord::from_pairs([("hecho", "Desplazamiento forzado")]),
                ExternalRecord::from_pairs([("hecho", "Sin informacion")]),
            ],
            ..Default::default()
        });
        let pipeline = PredictionPipeline::new(registry(0.05), source);

        let outcome = pipeline.run(&raw(), "Logistic_Regression").expect("predicts");
        assert_eq!(
            outcome.outcome,
            ValidationOutcome::ExactMatch {
                real_value: 1,
                is_correct: false
            }
        );

        let body = serde_json::to_value(&outcome).expect("serializes");
        assert_eq!(body["match_type"], "exact_match");
        assert_eq!(body["model"], "Logistic_Regression");
        assert_eq!(body["prediction"], 0);
        assert_eq!(body["real_label"], "Desplazamiento Forzado");
    }
}
