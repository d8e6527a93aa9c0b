//! Distances on the WGS-84 ellipsoid.

const SEMI_MAJOR_M: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const MEAN_RADIUS_KM: f64 = 6_371.008_8;
const MAX_ITERATIONS: usize = 200;
const CONVERGENCE: f64 = 1e-12;

/// Geodesic distance in kilometres between two (lat, lon) points in degrees.
///
/// Uses Vincenty's inverse formula; nearly antipodal pairs that do not converge
/// fall back to a spherical great-circle distance.
pub(crate) fn distance_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    vincenty_km(from, to).unwrap_or_else(|| great_circle_km(from, to))
}

fn vincenty_km((lat1, lon1): (f64, f64), (lat2, lon2): (f64, f64)) -> Option<f64> {
    let semi_minor = SEMI_MAJOR_M * (1.0 - FLATTENING);
    let l = (lon2 - lon1).to_radians();
    let u1 = ((1.0 - FLATTENING) * lat1.to_radians().tan()).atan();
    let u2 = ((1.0 - FLATTENING) * lat2.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial lines have cos²α = 0.
        let cos_2sigma_m = if cos_sq_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };
        let c = FLATTENING / 16.0 * cos_sq_alpha * (4.0 + FLATTENING * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * FLATTENING
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

        if (lambda - previous).abs() < CONVERGENCE {
            let u_sq = cos_sq_alpha * (SEMI_MAJOR_M.powi(2) - semi_minor.powi(2))
                / semi_minor.powi(2);
            let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = b
                * sin_sigma
                * (cos_2sigma_m
                    + b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                            - b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));
            let meters = semi_minor * a * (sigma - delta_sigma);
            return Some(meters / 1000.0);
        }
    }

    None
}

pub(crate) fn great_circle_km((lat1, lon1): (f64, f64), (lat2, lon2): (f64, f64)) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * MEAN_RADIUS_KM * a.sqrt().asin()
}
