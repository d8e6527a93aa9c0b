use crate::cli::ServeArgs;
use crate::infra::{build_pipeline, AppState};
use crate::routes::app;
use axum_prometheus::PrometheusMetricLayer;
use displacement_predictor::config::AppConfig;
use displacement_predictor::error::AppError;
use displacement_predictor::narrative::BriefingNarrator;
use displacement_predictor::telemetry::{self, LogTarget};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(artifacts) = args.artifacts.take() {
        config.artifacts.root = artifacts;
    }

    telemetry::init(&config.telemetry, LogTarget::Stdout)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));

    let pipeline = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || build_pipeline(&config, false))
            .await
            .map_err(|err| AppError::Internal(err.to_string()))?
    };

    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        pipeline,
        narrator: Arc::new(BriefingNarrator),
    };

    let app = app(app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "displacement predictor ready");

    axum::serve(listener, app).await?;
    Ok(())
}
