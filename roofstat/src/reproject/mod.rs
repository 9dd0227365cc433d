//! Reprojection légère en Rust pur
//!
//! Supporte les CRS rencontrés dans le screening de toitures :
//! - WGS84 / NAD83 géographique (EPSG:4326, EPSG:4269)
//! - Web Mercator (EPSG:3857)
//! - UTM WGS84 nord/sud (EPSG:326zz, EPSG:327zz)
//! - UTM NAD83 (EPSG:269zz, zones 1 à 23)
//! - NAD83 / Conus Albers (EPSG:5070), CRS des rasters NLCD
//!
//! Toute conversion passe par les coordonnées géographiques. Les autres CRS
//! nécessitent la feature `proj` (voir [`SmartReprojector`]).

mod albers;
mod ellipsoid;
mod mercator;
#[cfg(feature = "proj")]
pub mod proj;
mod smart;
mod utm;

pub use albers::{AlbersConic, AlbersParams, CONUS};
pub use ellipsoid::{GRS80, WGS84};
pub use smart::SmartReprojector;

use geo::{Coord, MapCoords};

use crate::{Result, ScreeningError};

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// CRS connu de la reprojection légère
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crs {
    Geographic,
    WebMercator,
    Utm { zone: u32, south: bool },
    ConusAlbers,
}

impl Crs {
    /// Résout un code EPSG
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            4326 | 4269 => Some(Crs::Geographic),
            3857 => Some(Crs::WebMercator),
            32601..=32660 => Some(Crs::Utm {
                zone: epsg - 32600,
                south: false,
            }),
            32701..=32760 => Some(Crs::Utm {
                zone: epsg - 32700,
                south: true,
            }),
            26901..=26923 => Some(Crs::Utm {
                zone: epsg - 26900,
                south: false,
            }),
            5070 => Some(Crs::ConusAlbers),
            _ => None,
        }
    }

    /// Projeté, en mètres, et sans déformation de surface rédhibitoire
    pub fn is_metric(self) -> bool {
        matches!(self, Crs::Utm { .. } | Crs::ConusAlbers)
    }

    fn unproject(self, x: f64, y: f64) -> Geographic {
        match self {
            Crs::Geographic => Geographic::from_degrees(x, y),
            Crs::WebMercator => mercator::web_mercator_to_geographic(x, y),
            Crs::Utm { zone, south } => utm::utm_to_geographic(x, y, zone, south),
            Crs::ConusAlbers => AlbersConic::new(CONUS).inverse(x, y),
        }
    }

    fn project(self, geo: Geographic) -> (f64, f64) {
        match self {
            Crs::Geographic => geo.to_degrees(),
            Crs::WebMercator => mercator::geographic_to_web_mercator(geo),
            Crs::Utm { zone, south } => utm::geographic_to_utm(geo, zone, south),
            Crs::ConusAlbers => AlbersConic::new(CONUS).forward(geo),
        }
    }
}

/// Indique si un EPSG convient au calcul des surfaces.
///
/// `None` quand le CRS est inconnu de la reprojection légère.
pub fn is_metric_epsg(epsg: u32) -> Option<bool> {
    Crs::from_epsg(epsg).map(Crs::is_metric)
}

/// Reprojection légère entre deux CRS connus
pub struct ReprojectorLite {
    source_epsg: u32,
    target_epsg: u32,
    source: Crs,
    target: Crs,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let source =
            Crs::from_epsg(source_epsg).ok_or(ScreeningError::UnsupportedCrs(source_epsg))?;
        let target =
            Crs::from_epsg(target_epsg).ok_or(ScreeningError::UnsupportedCrs(target_epsg))?;

        Ok(Self {
            source_epsg,
            target_epsg,
            source,
            target,
        })
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: u32, target: u32) -> bool {
        Crs::from_epsg(source).is_some() && Crs::from_epsg(target).is_some()
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let geo = self.source.unproject(x, y);
        let (tx, ty) = self.target.project(geo);

        if !tx.is_finite() || !ty.is_finite() {
            return Err(ScreeningError::reprojection(
                self.source_epsg,
                self.target_epsg,
                format!("non-finite result for ({}, {})", x, y),
            ));
        }
        Ok((tx, ty))
    }

    /// Transforme une géométrie
    pub fn transform_geometry<G>(&self, geom: &G) -> Result<G>
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geom.try_map_coords(|c| -> Result<Coord> {
            let (x, y) = self.transform_point(c.x, c.y)?;
            Ok(Coord { x, y })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area, Geometry};

    #[test]
    fn test_from_epsg() {
        assert_eq!(Crs::from_epsg(4326), Some(Crs::Geographic));
        assert_eq!(
            Crs::from_epsg(26912),
            Some(Crs::Utm {
                zone: 12,
                south: false
            })
        );
        assert_eq!(
            Crs::from_epsg(32740),
            Some(Crs::Utm {
                zone: 40,
                south: true
            })
        );
        assert_eq!(Crs::from_epsg(5070), Some(Crs::ConusAlbers));
        assert_eq!(Crs::from_epsg(2154), None);
    }

    #[test]
    fn test_metric_classification() {
        assert_eq!(is_metric_epsg(26912), Some(true));
        assert_eq!(is_metric_epsg(5070), Some(true));
        assert_eq!(is_metric_epsg(4326), Some(false));
        assert_eq!(is_metric_epsg(3857), Some(false));
        assert_eq!(is_metric_epsg(2154), None);
    }

    #[test]
    fn test_utm_to_albers_chain() {
        let to_utm = ReprojectorLite::new(4326, 26912).unwrap();
        let to_albers = ReprojectorLite::new(26912, 5070).unwrap();
        let back = ReprojectorLite::new(5070, 4326).unwrap();

        let (x, y) = to_utm.transform_point(-111.891, 40.761).unwrap();
        let (ax, ay) = to_albers.transform_point(x, y).unwrap();
        let (lon, lat) = back.transform_point(ax, ay).unwrap();

        assert!((lon - (-111.891)).abs() < 1e-6, "lon={}", lon);
        assert!((lat - 40.761).abs() < 1e-6, "lat={}", lat);
    }

    #[test]
    fn test_area_preserved_between_metric_crs() {
        let to_utm = ReprojectorLite::new(4326, 26912).unwrap();
        let footprint = Geometry::Polygon(polygon![
            (x: -111.8910, y: 40.7610),
            (x: -111.8905, y: 40.7610),
            (x: -111.8905, y: 40.7614),
            (x: -111.8910, y: 40.7614),
            (x: -111.8910, y: 40.7610),
        ]);
        let utm = to_utm.transform_geometry(&footprint).unwrap();
        let albers = ReprojectorLite::new(26912, 5070)
            .unwrap()
            .transform_geometry(&utm)
            .unwrap();

        let a_utm = utm.unsigned_area();
        let a_albers = albers.unsigned_area();
        // Albers est équivalente, UTM à moins de 0.1% près loin du bord de zone
        assert!(a_utm > 1000.0 && a_utm < 2000.0, "a_utm={}", a_utm);
        assert!((a_utm - a_albers).abs() / a_albers < 0.002, "{} vs {}", a_utm, a_albers);
    }

    #[test]
    fn test_unsupported_epsg() {
        assert!(ReprojectorLite::new(2154, 4326).is_err());
        assert!(!ReprojectorLite::is_supported(4326, 2154));
    }
}
