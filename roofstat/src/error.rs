//! Types d'erreurs pour le crate roofstat

use thiserror::Error;

/// Erreurs pouvant survenir pendant le screening
#[derive(Debug, Error)]
pub enum ScreeningError {
    /// Erreur d'I/O lors de la lecture d'une source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// GeoJSON illisible
    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Feature inutilisable (géométrie absente ou non surfacique)
    #[error("Invalid feature #{index}: {reason}")]
    InvalidFeature { index: usize, reason: String },

    /// Aucun bâtiment en entrée: les quantiles seraient indéfinis
    #[error("Empty batch: no building footprints to screen")]
    EmptyBatch,

    /// CRS non pris en charge par le reprojecteur
    #[error("Unsupported CRS: EPSG:{0}")]
    UnsupportedCrs(u32),

    /// Échec d'une transformation de coordonnées
    #[error("Reprojection EPSG:{from} -> EPSG:{to} failed: {reason}")]
    Reprojection { from: u32, to: u32, reason: String },

    /// Le CRS de travail doit être projeté et métrique pour le calcul des surfaces
    #[error("Working CRS EPSG:{0} is not a projected metric CRS; roof areas would be distorted")]
    NonMetricWorkingCrs(u32),

    /// Le sampler n'a pas rendu une valeur par polygone
    #[error("Layer {layer}: sampler returned {got} values for {expected} polygons")]
    SampleCountMismatch {
        layer: String,
        expected: usize,
        got: usize,
    },

    /// Raster mal formé
    #[error("Raster format error in {source_name}: {reason}")]
    RasterFormat { source_name: String, reason: String },

    /// Valeurs incompatibles avec l'unité déclarée
    #[error("Layer {layer}: value {value} is outside 0-100 after unit scaling (declared {units})")]
    UnitMismatch {
        layer: String,
        value: f64,
        units: String,
    },

    /// Paramétrage invalide
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ScreeningError {
    /// Crée une erreur de feature invalide
    pub fn invalid_feature(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidFeature {
            index,
            reason: reason.into(),
        }
    }

    /// Crée une erreur de reprojection avec contexte
    pub fn reprojection(from: u32, to: u32, reason: impl Into<String>) -> Self {
        Self::Reprojection {
            from,
            to,
            reason: reason.into(),
        }
    }

    /// Crée une erreur de format raster
    pub fn raster_format(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RasterFormat {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Alias de résultat du crate
pub type Result<T> = std::result::Result<T, ScreeningError>;
