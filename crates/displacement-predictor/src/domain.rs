use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// Categorical columns in the order the fitted encoders were trained on.
pub const CATEGORICAL_FIELDS: [CategoricalField; 5] = [
    CategoricalField::Sex,
    CategoricalField::Ethnicity,
    CategoricalField::AgeBracket,
    CategoricalField::Disability,
    CategoricalField::Region,
];

/// Numeric columns in the order the fitted scalers were trained on.
pub const NUMERIC_FIELDS: [NumericField; 5] = [
    NumericField::PriorEvents,
    NumericField::ReportingYear,
    NumericField::NorthSouthKm,
    NumericField::EastWestKm,
    NumericField::TotalKm,
];

/// Positive class: the record describes a forced displacement.
pub const DISPLACEMENT_CLASS: u8 = 1;
pub const OTHER_CLASS: u8 = 0;

/// Human-readable label for a binary class.
pub fn class_label(class: u8) -> &'static str {
    if class == DISPLACEMENT_CLASS {
        "Desplazamiento Forzado"
    } else {
        "Otro Hecho Victimizante"
    }
}

/// Categorical attributes of a registry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoricalField {
    #[serde(rename = "ESTADO_DEPTO")]
    Region,
    #[serde(rename = "SEXO")]
    Sex,
    #[serde(rename = "ETNIA")]
    Ethnicity,
    #[serde(rename = "DISCAPACIDAD")]
    Disability,
    #[serde(rename = "CICLO_VITAL")]
    AgeBracket,
    /// Victimizing event. Present on registry records only, never on requests.
    #[serde(rename = "HECHO")]
    EventType,
}

impl CategoricalField {
    pub fn column(self) -> &'static str {
        match self {
            CategoricalField::Region => "ESTADO_DEPTO",
            CategoricalField::Sex => "SEXO",
            CategoricalField::Ethnicity => "ETNIA",
            CategoricalField::Disability => "DISCAPACIDAD",
            CategoricalField::AgeBracket => "CICLO_VITAL",
            CategoricalField::EventType => "HECHO",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        [
            CategoricalField::Region,
            CategoricalField::Sex,
            CategoricalField::Ethnicity,
            CategoricalField::Disability,
            CategoricalField::AgeBracket,
            CategoricalField::EventType,
        ]
        .into_iter()
        .find(|field| field.column().eq_ignore_ascii_case(column))
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Numeric attributes fed to the models after scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NumericField {
    #[serde(rename = "EVENTOS")]
    PriorEvents,
    #[serde(rename = "VIGENCIA")]
    ReportingYear,
    #[serde(rename = "km_norte_sur")]
    NorthSouthKm,
    #[serde(rename = "km_este_oeste")]
    EastWestKm,
    #[serde(rename = "distancia_total")]
    TotalKm,
}

impl NumericField {
    pub fn column(self) -> &'static str {
        match self {
            NumericField::PriorEvents => "EVENTOS",
            NumericField::ReportingYear => "VIGENCIA",
            NumericField::NorthSouthKm => "km_norte_sur",
            NumericField::EastWestKm => "km_este_oeste",
            NumericField::TotalKm => "distancia_total",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        NUMERIC_FIELDS
            .into_iter()
            .find(|field| field.column().eq_ignore_ascii_case(column))
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Request payload exactly as the caller submitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    #[serde(rename = "ESTADO_DEPTO")]
    pub region: String,
    #[serde(rename = "SEXO")]
    pub sex: String,
    #[serde(rename = "ETNIA")]
    pub ethnicity: String,
    #[serde(rename = "DISCAPACIDAD")]
    pub disability: String,
    #[serde(rename = "CICLO_VITAL")]
    pub age_bracket: String,
    #[serde(rename = "VIGENCIA", deserialize_with = "deserialize_integer")]
    pub reporting_year: i32,
    #[serde(rename = "EVENTOS", deserialize_with = "deserialize_integer")]
    pub prior_events: i64,
    #[serde(
        rename = "km_norte_sur",
        default,
        deserialize_with = "deserialize_optional_float",
        skip_serializing_if = "Option::is_none"
    )]
    pub north_south_km: Option<f64>,
    #[serde(
        rename = "km_este_oeste",
        default,
        deserialize_with = "deserialize_optional_float",
        skip_serializing_if = "Option::is_none"
    )]
    pub east_west_km: Option<f64>,
    #[serde(
        rename = "distancia_total",
        default,
        deserialize_with = "deserialize_optional_float",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_km: Option<f64>,
}

impl RawInput {
    pub fn categorical(&self, field: CategoricalField) -> Option<&str> {
        match field {
            CategoricalField::Region => Some(&self.region),
            CategoricalField::Sex => Some(&self.sex),
            CategoricalField::Ethnicity => Some(&self.ethnicity),
            CategoricalField::Disability => Some(&self.disability),
            CategoricalField::AgeBracket => Some(&self.age_bracket),
            CategoricalField::EventType => None,
        }
    }

    /// Geo features supplied by the caller, if all three are present.
    pub fn supplied_geo(&self) -> Option<crate::geo::GeoFeatures> {
        match (self.north_south_km, self.east_west_km, self.total_km) {
            (Some(north_south_km), Some(east_west_km), Some(total_km)) => {
                Some(crate::geo::GeoFeatures {
                    north_south_km,
                    east_west_km,
                    total_km,
                })
            }
            _ => None,
        }
    }
}

/// A numeric form field as posted: a JSON number or its decimal text.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl NumberOrText {
    fn is_blank(&self) -> bool {
        matches!(self, NumberOrText::Text(text) if text.trim().is_empty())
    }

    fn to_integer(&self) -> Result<i64, String> {
        match self {
            NumberOrText::Integer(value) => Ok(*value),
            // Fractional numbers truncate toward zero.
            NumberOrText::Float(value) if value.is_finite() => Ok(value.trunc() as i64),
            NumberOrText::Float(value) => Err(format!("{value} is not an integer")),
            NumberOrText::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| format!("'{text}' is not an integer")),
        }
    }

    fn to_float(&self) -> Result<f64, String> {
        let value = match self {
            NumberOrText::Integer(value) => *value as f64,
            NumberOrText::Float(value) => *value,
            NumberOrText::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| format!("'{text}' is not a number"))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("{value} is not a finite number"))
        }
    }
}

fn narrow<T: TryFrom<i64>, E: de::Error>(value: i64) -> Result<T, E> {
    T::try_from(value).map_err(|_| E::custom(format!("{value} is out of range")))
}

/// Integer field accepting `2015`, `2015.0` or `"2015"`.
pub fn deserialize_integer<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let raw = NumberOrText::deserialize(deserializer)?;
    let value = raw.to_integer().map_err(<D::Error as de::Error>::custom)?;
    narrow(value)
}

/// Like [`deserialize_integer`], with null or blank text read as absent.
pub fn deserialize_optional_integer<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let opt = Option::<NumberOrText>::deserialize(deserializer)?;
    opt.filter(|raw| !raw.is_blank())
        .map(|raw| {
            let value = raw.to_integer().map_err(<D::Error as de::Error>::custom)?;
            narrow(value)
        })
        .transpose()
}

/// Float field accepting a number or its text; null or blank text is absent.
pub fn deserialize_optional_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<NumberOrText>::deserialize(deserializer)?;
    opt.filter(|raw| !raw.is_blank())
        .map(|raw| raw.to_float().map_err(<D::Error as de::Error>::custom))
        .transpose()
}

/// Request after canonical substitution; every categorical value is a member of
/// the enumerated value set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedInput {
    pub region: String,
    pub sex: String,
    pub ethnicity: String,
    pub disability: String,
    pub age_bracket: String,
    pub reporting_year: i32,
    pub prior_events: i64,
    pub north_south_km: Option<f64>,
    pub east_west_km: Option<f64>,
    pub total_km: Option<f64>,
}

impl NormalizedInput {
    pub fn categorical(&self, field: CategoricalField) -> Option<&str> {
        match field {
            CategoricalField::Region => Some(&self.region),
            CategoricalField::Sex => Some(&self.sex),
            CategoricalField::Ethnicity => Some(&self.ethnicity),
            CategoricalField::Disability => Some(&self.disability),
            CategoricalField::AgeBracket => Some(&self.age_bracket),
            CategoricalField::EventType => None,
        }
    }

    /// Numeric column value, taking geo columns from `geo`.
    pub fn numeric(&self, field: NumericField, geo: &crate::geo::GeoFeatures) -> f64 {
        match field {
            NumericField::PriorEvents => self.prior_events as f64,
            NumericField::ReportingYear => f64::from(self.reporting_year),
            NumericField::NorthSouthKm => geo.north_south_km,
            NumericField::EastWestKm => geo.east_west_km,
            NumericField::TotalKm => geo.total_km,
        }
    }
}

impl From<&NormalizedInput> for RawInput {
    fn from(value: &NormalizedInput) -> Self {
        Self {
            region: value.region.clone(),
            sex: value.sex.clone(),
            ethnicity: value.ethnicity.clone(),
            disability: value.disability.clone(),
            age_bracket: value.age_bracket.clone(),
            reporting_year: value.reporting_year,
            prior_events: value.prior_events,
            north_south_km: value.north_south_km,
            east_west_km: value.east_west_km,
            total_km: value.total_km,
        }
    }
}
