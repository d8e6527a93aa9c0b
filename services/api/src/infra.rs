use displacement_predictor::config::{AppConfig, DatasetConfig};
use displacement_predictor::models::ModelRegistry;
use displacement_predictor::narrative::NarrativeGenerator;
use displacement_predictor::pipeline::PredictionPipeline;
use displacement_predictor::sources::{OfflineSource, RecordSource, SocrataSource};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type Pipeline = PredictionPipeline<dyn RecordSource>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) pipeline: Pipeline,
    pub(crate) narrator: Arc<dyn NarrativeGenerator>,
}

/// Registry lookups go to the open-data portal unless running offline.
pub(crate) fn record_source(config: &DatasetConfig, offline: bool) -> Arc<dyn RecordSource> {
    if offline {
        Arc::new(OfflineSource)
    } else {
        Arc::new(SocrataSource::new(config.clone()))
    }
}

pub(crate) fn build_pipeline(config: &AppConfig, offline: bool) -> Pipeline {
    let registry = Arc::new(ModelRegistry::load(&config.artifacts));
    PredictionPipeline::new(registry, record_source(&config.dataset, offline))
}
