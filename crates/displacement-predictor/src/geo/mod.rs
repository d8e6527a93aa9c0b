//! Geographic context features measured from the national capital.

mod geodesic;
mod regions;

use serde::Serialize;

use regions::REGIONS;

/// Origin of every derived distance (Bogotá D.C.).
pub const REFERENCE_POINT: (f64, f64) = (4.5981, -74.0758);

/// Signed axis offsets and total distance from the reference point, in km.
///
/// Negative `north_south_km` means south of the reference, negative
/// `east_west_km` means west of it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GeoFeatures {
    #[serde(rename = "km_norte_sur")]
    pub north_south_km: f64,
    #[serde(rename = "km_este_oeste")]
    pub east_west_km: f64,
    #[serde(rename = "distancia_total")]
    pub total_km: f64,
}

impl GeoFeatures {
    /// All offsets are zero: an unknown region, or one located at the reference point.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Department metadata exposed to map and form builders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionInfo {
    pub department: &'static str,
    pub capital: &'static str,
    pub lat: f64,
    pub lon: f64,
    #[serde(flatten)]
    pub distances: GeoFeatures,
}

/// Derived distance features for `region`; unknown regions yield all zeros.
pub fn distances(region: &str) -> GeoFeatures {
    match coordinates(region) {
        Some(coords) => features_for(coords),
        None => GeoFeatures::default(),
    }
}

pub fn region_info(region: &str) -> Option<RegionInfo> {
    REGIONS
        .iter()
        .find(|(name, ..)| *name == region)
        .map(|&(department, capital, lat, lon)| RegionInfo {
            department,
            capital,
            lat,
            lon,
            distances: features_for((lat, lon)),
        })
}

/// All departments in table order.
pub fn regions() -> Vec<RegionInfo> {
    REGIONS
        .iter()
        .filter_map(|(name, ..)| region_info(name))
        .collect()
}

pub fn region_names() -> impl Iterator<Item = &'static str> {
    REGIONS.iter().map(|(name, ..)| *name)
}

pub fn is_known_region(region: &str) -> bool {
    coordinates(region).is_some()
}

fn coordinates(region: &str) -> Option<(f64, f64)> {
    REGIONS
        .iter()
        .find(|(name, ..)| *name == region)
        .map(|&(_, _, lat, lon)| (lat, lon))
}

fn features_for((lat, lon): (f64, f64)) -> GeoFeatures {
    let (ref_lat, ref_lon) = REFERENCE_POINT;

    let mut north_south_km = geodesic::distance_km(REFERENCE_POINT, (lat, ref_lon));
    if lat < ref_lat {
        north_south_km = -north_south_km;
    }

    let mut east_west_km = geodesic::distance_km(REFERENCE_POINT, (ref_lat, lon));
    if lon < ref_lon {
        east_west_km = -east_west_km;
    }

    let total_km = geodesic::distance_km(REFERENCE_POINT, (lat, lon));

    GeoFeatures {
        north_south_km: round_2(north_south_km),
        east_west_km: round_2(east_west_km),
        total_km: round_2(total_km),
    }
}

fn round_2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
