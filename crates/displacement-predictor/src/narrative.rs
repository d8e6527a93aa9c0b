//! Context handed to explanation generators, and the static evaluation metrics
//! of each model.

use serde::Serialize;
use std::fmt;

use crate::domain::NormalizedInput;
use crate::geo::GeoFeatures;
use crate::models::{ModelName, PredictionResult};
use crate::validation::ValidationReport;

/// Held-out evaluation scores of a trained model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: f64,
}

impl ModelMetrics {
    pub fn for_model(model: ModelName) -> Self {
        let (accuracy, precision, recall, f1_score, roc_auc) = match model {
            ModelName::LogisticRegression => (0.7416, 0.6305, 0.7471, 0.6839, 0.8185),
            ModelName::RandomForest => (0.9188, 0.8712, 0.9187, 0.8943, 0.9822),
            ModelName::XGBoost => (0.8629, 0.7818, 0.8788, 0.8274, 0.9510),
            ModelName::ResNetStyle => (0.8673, 0.9822, 0.6572, 0.7875, 0.9622),
            ModelName::Deep => (0.8261, 0.9716, 0.5512, 0.7034, 0.9438),
        };
        Self {
            accuracy,
            precision,
            recall,
            f1_score,
            roc_auc,
        }
    }
}

/// Inclusive bounds of the training data for the numeric inputs.
pub const TRAINING_YEARS: (i32, i32) = (1985, 2025);
pub const TRAINING_EVENTS: (i64, i64) = (0, 351_905);

/// Warnings for numeric inputs outside the range the models were trained on.
pub fn range_warnings(input: &NormalizedInput) -> Vec<String> {
    let mut warnings = Vec::new();

    let (min_year, max_year) = TRAINING_YEARS;
    if !(min_year..=max_year).contains(&input.reporting_year) {
        warnings.push(format!(
            "Año: {} (rango de entrenamiento: {min_year}-{max_year})",
            input.reporting_year
        ));
    }

    let (min_events, max_events) = TRAINING_EVENTS;
    if !(min_events..=max_events).contains(&input.prior_events) {
        warnings.push(format!(
            "Eventos: {} (rango de entrenamiento: {min_events}-{})",
            group_thousands(input.prior_events),
            group_thousands(max_events)
        ));
    }

    warnings
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Everything an explanation generator needs about one prediction.
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeContext {
    pub user_input: NormalizedInput,
    pub geo: GeoFeatures,
    pub prediction: PredictionResult,
    pub validation: ValidationReport,
    pub model_metrics: ModelMetrics,
    pub range_warnings: Vec<String>,
}

impl NarrativeContext {
    pub fn new(
        user_input: NormalizedInput,
        geo: GeoFeatures,
        prediction: PredictionResult,
        validation: ValidationReport,
    ) -> Self {
        let range_warnings = range_warnings(&user_input);
        let model_metrics = ModelMetrics::for_model(prediction.model);
        Self {
            user_input,
            geo,
            prediction,
            validation,
            model_metrics,
            range_warnings,
        }
    }

    /// Plain-text briefing of the prediction, suitable as a prompt preamble.
    pub fn briefing(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NarrativeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = &self.user_input;
        let metrics = &self.model_metrics;

        writeln!(f, "Variables de entrada:")?;
        writeln!(f, "- Departamento: {}", input.region)?;
        writeln!(f, "- Género: {}", input.sex)?;
        writeln!(f, "- Etnia: {}", input.ethnicity)?;
        writeln!(f, "- Discapacidad: {}", input.disability)?;
        writeln!(f, "- Rango de edad: {}", input.age_bracket)?;
        writeln!(f, "- Año: {}", input.reporting_year)?;
        writeln!(f, "- Eventos previos: {}", input.prior_events)?;
        writeln!(f)?;
        writeln!(f, "Variables geográficas (desde Bogotá D.C.):")?;
        writeln!(f, "- Distancia Norte-Sur: {} km", self.geo.north_south_km)?;
        writeln!(f, "- Distancia Este-Oeste: {} km", self.geo.east_west_km)?;
        writeln!(f, "- Distancia Total: {} km", self.geo.total_km)?;
        writeln!(f)?;
        writeln!(f, "Resultado del modelo:")?;
        writeln!(f, "- Modelo: {}", self.prediction.model.display())?;
        writeln!(
            f,
            "- Predicción: {} (Clase {})",
            self.prediction.label, self.prediction.prediction
        )?;
        writeln!(f, "- Validación: {}", self.validation.message)?;
        writeln!(f)?;
        writeln!(f, "Rendimiento del modelo:")?;
        writeln!(f, "- Accuracy: {:.2}%", metrics.accuracy * 100.0)?;
        writeln!(f, "- Precision: {:.2}%", metrics.precision * 100.0)?;
        writeln!(f, "- Recall: {:.2}%", metrics.recall * 100.0)?;
        writeln!(f, "- F1-Score: {:.2}%", metrics.f1_score * 100.0)?;
        writeln!(f, "- ROC-AUC: {:.2}%", metrics.roc_auc * 100.0)?;

        if !self.range_warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Advertencia, valores fuera del rango de entrenamiento:")?;
            for warning in &self.range_warnings {
                writeln!(f, "- {warning}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error("narrative generator unavailable: {0}")]
    Unavailable(String),
}

/// Produces a human-readable explanation of a prediction.
pub trait NarrativeGenerator: Send + Sync {
    fn explain(&self, context: &NarrativeContext) -> Result<String, NarrativeError>;
}

/// Generator that returns the briefing itself, with no external service.
#[derive(Debug, Clone, Copy, Default)]
pub struct BriefingNarrator;

impl NarrativeGenerator for BriefingNarrator {
    fn explain(&self, context: &NarrativeContext) -> Result<String, NarrativeError> {
        Ok(context.briefing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationOutcome;

    fn input(year: i32, events: i64) -> NormalizedInput {
        NormalizedInput {
            region: "Choco".to_string(),
            sex: "Hombre".to_string(),
            ethnicity: "Afrocolombiano(a)".to_string(),
            disability: "Ninguna".to_string(),
            age_bracket: "entre 29 y 59".to_string(),
            reporting_year: year,
            prior_events: events,
            north_south_km: None,
            east_west_km: None,
            total_km: None,
        }
    }

    #[test]
    fn in_range_inputs_have_no_warnings() {
        assert!(range_warnings(&input(2000, 351_905)).is_empty());
    }

    #[test]
    fn out_of_range_inputs_are_flagged() {
        let warnings = range_warnings(&input(2028, 400_000));
        assert_eq!(
            warnings,
            vec![
                "Año: 2028 (rango de entrenamiento: 1985-2025)".to_string(),
                "Eventos: 400,000 (rango de entrenamiento: 0-351,905)".to_string(),
            ]
        );
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(-1_234_567), "-1,234,567");
    }

    #[test]
    fn metrics_table_covers_every_model() {
        assert_eq!(ModelMetrics::for_model(ModelName::RandomForest).roc_auc, 0.9822);
        assert_eq!(ModelMetrics::for_model(ModelName::Deep).recall, 0.5512);
    }

    #[test]
    fn briefing_names_model_and_warnings() {
        let context = NarrativeContext::new(
            input(2029, 10),
            crate::geo::distances("Choco"),
            PredictionResult::from_probability(ModelName::ResNetStyle, 0.9),
            ValidationOutcome::NoMatch.report(),
        );
        let text = BriefingNarrator.explain(&context).expect("explains");
        assert!(text.contains("ResNet Style"));
        assert!(text.contains("Desplazamiento Forzado (Clase 1)"));
        assert!(text.contains("Accuracy: 86.73%"));
        assert!(text.contains("Año: 2029"));
    }

    #[test]
    fn briefing_sections_appear_in_order() {
        let in_range = NarrativeContext::new(
            input(2010, 10),
            crate::geo::distances("Choco"),
            PredictionResult::from_probability(ModelName::XGBoost, 0.2),
            ValidationOutcome::NoMatch.report(),
        );
        let text = in_range.briefing();
        let headers = [
            "Variables de entrada:",
            "Variables geográficas (desde Bogotá D.C.):",
            "Resultado del modelo:",
            "Rendimiento del modelo:",
        ];
        let positions: Vec<usize> = headers
            .iter()
            .map(|header| text.find(header).expect("section present"))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(text.ends_with("%\n"));
        assert!(!text.contains("Advertencia"));
        assert_eq!(text, in_range.to_string());

        let out_of_range = NarrativeContext::new(
            input(2030, 10),
            crate::geo::distances("Choco"),
            PredictionResult::from_probability(ModelName::XGBoost, 0.2),
            ValidationOutcome::NoMatch.report(),
        );
        assert!(out_of_range.briefing().ends_with(
            "Advertencia, valores fuera del rango de entrenamiento:\n\
             - Año: 2030 (rango de entrenamiento: 1985-2025)\n"
        ));
    }
}
