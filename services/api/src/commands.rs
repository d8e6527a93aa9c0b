use crate::infra::build_pipeline;
use clap::Args;
use displacement_predictor::config::AppConfig;
use displacement_predictor::domain::RawInput;
use displacement_predictor::error::AppError;
use displacement_predictor::geo;
use displacement_predictor::narrative::{BriefingNarrator, NarrativeContext, NarrativeGenerator};
use displacement_predictor::telemetry::{self, LogTarget};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Department (ESTADO_DEPTO)
    #[arg(long)]
    pub(crate) region: String,
    /// Sex (SEXO)
    #[arg(long)]
    pub(crate) sex: String,
    /// Ethnicity (ETNIA)
    #[arg(long, default_value = "Ninguna")]
    pub(crate) ethnicity: String,
    /// Disability (DISCAPACIDAD)
    #[arg(long, default_value = "Ninguna")]
    pub(crate) disability: String,
    /// Age bracket (CICLO_VITAL), e.g. "entre 18 y 28"
    #[arg(long)]
    pub(crate) age_bracket: String,
    /// Reporting year (VIGENCIA)
    #[arg(long)]
    pub(crate) year: i32,
    /// Prior events (EVENTOS)
    #[arg(long, default_value_t = 1)]
    pub(crate) events: i64,
    /// Model to score with
    #[arg(long, default_value = "XGBoost")]
    pub(crate) model: String,
    /// Override the directory holding the model artifacts
    #[arg(long)]
    pub(crate) artifacts: Option<PathBuf>,
    /// Skip the registry lookup
    #[arg(long)]
    pub(crate) offline: bool,
    /// Print the plain-text briefing after the JSON result
    #[arg(long)]
    pub(crate) explain: bool,
}

impl PredictArgs {
    fn raw_input(&self) -> RawInput {
        RawInput {
            region: self.region.clone(),
            sex: self.sex.clone(),
            ethnicity: self.ethnicity.clone(),
            disability: self.disability.clone(),
            age_bracket: self.age_bracket.clone(),
            reporting_year: self.year,
            prior_events: self.events,
            north_south_km: None,
            east_west_km: None,
            total_km: None,
        }
    }
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(artifacts) = args.artifacts.clone() {
        config.artifacts.root = artifacts;
    }
    telemetry::init(&config.telemetry, LogTarget::Stderr)?;

    let pipeline = build_pipeline(&config, args.offline);
    let outcome = pipeline.run(&args.raw_input(), &args.model)?;

    let rendered = serde_json::to_string_pretty(&outcome)
        .map_err(|err| AppError::Internal(err.to_string()))?;
    println!("{rendered}");

    if args.explain {
        let context = NarrativeContext::new(
            outcome.input,
            outcome.geo,
            outcome.prediction,
            outcome.validation,
        );
        match BriefingNarrator.explain(&context) {
            Ok(text) => println!("\n{text}"),
            Err(err) => tracing::warn!(error = %err, "explanation unavailable"),
        }
    }

    Ok(())
}

pub(crate) fn run_regions() -> Result<(), AppError> {
    println!(
        "{:<48} {:<28} {:>10} {:>10} {:>10}",
        "Departamento", "Capital", "N-S km", "E-O km", "Total km"
    );
    for info in geo::regions() {
        println!(
            "{:<48} {:<28} {:>10.2} {:>10.2} {:>10.2}",
            info.department,
            info.capital,
            info.distances.north_south_km,
            info.distances.east_west_km,
            info.distances.total_km
        );
    }
    Ok(())
}
