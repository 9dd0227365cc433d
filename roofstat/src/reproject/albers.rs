//! Projection conique équivalente d'Albers (EPSG:5070, NAD83 / Conus Albers)
//!
//! Projection native des rasters NLCD (imperméabilisation, occupation du sol,
//! canopée). Formules ellipsoïdales de Snyder, ellipsoïde GRS80.

use super::ellipsoid::GRS80;
use super::Geographic;

/// Paramètres d'une conique d'Albers (degrés, mètres)
#[derive(Debug, Clone, Copy)]
pub struct AlbersParams {
    pub lat0: f64,
    pub lon0: f64,
    pub lat1: f64,
    pub lat2: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

/// NAD83 / Conus Albers
pub const CONUS: AlbersParams = AlbersParams {
    lat0: 23.0,
    lon0: -96.0,
    lat1: 29.5,
    lat2: 45.5,
    false_easting: 0.0,
    false_northing: 0.0,
};

const MAX_ITERATIONS: usize = 15;
const TOLERANCE: f64 = 1e-12;

fn q(sin_phi: f64) -> f64 {
    let e = GRS80::E;
    let e2 = GRS80::E2;
    (1.0 - e2)
        * (sin_phi / (1.0 - e2 * sin_phi * sin_phi)
            - (1.0 / (2.0 * e)) * ((1.0 - e * sin_phi) / (1.0 + e * sin_phi)).ln())
}

fn m(phi: f64) -> f64 {
    phi.cos() / (1.0 - GRS80::E2 * phi.sin().powi(2)).sqrt()
}

/// Constantes dérivées d'un jeu de paramètres
#[derive(Debug, Clone, Copy)]
pub struct AlbersConic {
    params: AlbersParams,
    n: f64,
    c: f64,
    rho0: f64,
}

impl AlbersConic {
    pub fn new(params: AlbersParams) -> Self {
        let phi0 = params.lat0.to_radians();
        let phi1 = params.lat1.to_radians();
        let phi2 = params.lat2.to_radians();

        let m1 = m(phi1);
        let m2 = m(phi2);
        let q0 = q(phi0.sin());
        let q1 = q(phi1.sin());
        let q2 = q(phi2.sin());

        let n = (m1 * m1 - m2 * m2) / (q2 - q1);
        let c = m1 * m1 + n * q1;
        let rho0 = GRS80::A * (c - n * q0).sqrt() / n;

        Self { params, n, c, rho0 }
    }

    /// Géographique (radians) → Albers (mètres)
    pub fn forward(&self, geo: Geographic) -> (f64, f64) {
        let q = q(geo.lat.sin());
        let rho = GRS80::A * (self.c - self.n * q).sqrt() / self.n;
        let theta = self.n * (geo.lon - self.params.lon0.to_radians());

        let x = self.params.false_easting + rho * theta.sin();
        let y = self.params.false_northing + self.rho0 - rho * theta.cos();
        (x, y)
    }

    /// Albers (mètres) → géographique (radians)
    pub fn inverse(&self, x: f64, y: f64) -> Geographic {
        let a = GRS80::A;
        let e = GRS80::E;
        let e2 = GRS80::E2;

        let dx = x - self.params.false_easting;
        let dy = self.rho0 - (y - self.params.false_northing);
        let rho = (dx * dx + dy * dy).sqrt();
        let theta = dx.atan2(dy);
        let q = (self.c - rho * rho * self.n * self.n / (a * a)) / self.n;

        // Itération de Snyder (3-16)
        let mut phi = (q / 2.0).clamp(-1.0, 1.0).asin();
        for _ in 0..MAX_ITERATIONS {
            let sin_phi = phi.sin();
            let one = 1.0 - e2 * sin_phi * sin_phi;
            let delta = one * one / (2.0 * phi.cos())
                * (q / (1.0 - e2) - sin_phi / one
                    + (1.0 / (2.0 * e)) * ((1.0 - e * sin_phi) / (1.0 + e * sin_phi)).ln());
            phi += delta;
            if delta.abs() < TOLERANCE {
                break;
            }
        }

        let lon = self.params.lon0.to_radians() + theta / self.n;
        Geographic::new(lon, phi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_zero() {
        let conic = AlbersConic::new(CONUS);
        let (x, y) = conic.forward(Geographic::from_degrees(-96.0, 23.0));
        assert!(x.abs() < 1e-6, "x={}", x);
        assert!(y.abs() < 1e-6, "y={}", y);
    }

    #[test]
    fn test_northing_along_central_meridian() {
        let conic = AlbersConic::new(CONUS);
        let (x, y) = conic.forward(Geographic::from_degrees(-96.0, 40.0));
        assert!(x.abs() < 1e-6);
        assert!(y > 1850000.0 && y < 1950000.0, "y={}", y);
    }

    #[test]
    fn test_roundtrip_salt_lake_city() {
        let conic = AlbersConic::new(CONUS);
        let (x, y) = conic.forward(Geographic::from_degrees(-111.891, 40.761));
        assert!(x < 0.0, "west of -96 should be negative, x={}", x);
        let (lon, lat) = conic.inverse(x, y).to_degrees();
        assert!((lon - (-111.891)).abs() < 1e-8, "lon={}", lon);
        assert!((lat - 40.761).abs() < 1e-8, "lat={}", lat);
    }
}
