//! Projection Web Mercator (EPSG:3857)
//!
//! Acceptée en entrée/sortie uniquement: les surfaces y sont fortement
//! déformées, elle n'est jamais utilisée comme CRS de travail.

use super::ellipsoid::WGS84;
use super::Geographic;

/// Latitude maximale représentable
const MAX_LAT_DEG: f64 = 85.06;

/// Géographique → Web Mercator
pub fn geographic_to_web_mercator(geo: Geographic) -> (f64, f64) {
    let r = WGS84::A;
    let lat = geo
        .lat
        .clamp(-MAX_LAT_DEG.to_radians(), MAX_LAT_DEG.to_radians());

    let x = r * geo.lon;
    let y = r * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
    (x, y)
}

/// Web Mercator → géographique
pub fn web_mercator_to_geographic(x: f64, y: f64) -> Geographic {
    let r = WGS84::A;
    let lon = x / r;
    let lat = 2.0 * (y / r).exp().atan() - std::f64::consts::FRAC_PI_2;
    Geographic::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let geo = Geographic::from_degrees(-111.891, 40.761);
        let (x, y) = geographic_to_web_mercator(geo);
        assert!((x - (-12455600.0)).abs() < 2000.0, "x={}", x);
        let (lon, lat) = web_mercator_to_geographic(x, y).to_degrees();
        assert!((lon - (-111.891)).abs() < 1e-9);
        assert!((lat - 40.761).abs() < 1e-9);
    }
}
