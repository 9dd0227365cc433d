//! # roofstat
//!
//! Statistiques zonales, score et classement pour le repérage de toitures
//! candidates à la végétalisation.
//!
//! ## Features
//!
//! - Chargement d'emprises GeoJSON et calcul des surfaces en CRS métrique
//! - Contrat [`ZonalSampler`] et implémentation en mémoire ([`GridRaster`])
//! - Reprojection légère en Rust pur (UTM, Albers CONUS, Web Mercator)
//! - Seuils du lot figés en deux passes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use roofstat::{loader, raster::ascii, PercentLayer, RasterSet, ScreeningSettings, ValueUnits};
//! use std::path::Path;
//!
//! let buildings = loader::read_geojson(Path::new("buildings.geojson"))?;
//! let impervious = ascii::read(Path::new("impervious.asc"), 5070)?;
//! let rasters = RasterSet::new(PercentLayer::new(Box::new(impervious), ValueUnits::Percent));
//!
//! let screening = roofstat::screen(buildings, &rasters, &ScreeningSettings::default())?;
//! for record in &screening.records {
//!     println!("{:?} {:?} {:?}", record.index, record.score, record.tier);
//! }
//! ```

pub mod aggregate;
pub mod classify;
pub mod error;
pub mod explain;
pub mod loader;
pub mod pipeline;
pub mod quantile;
pub mod raster;
pub mod reproject;
pub mod score;
pub mod types;

pub use aggregate::{LayerCoverage, LayerKind, PercentLayer, RasterSet, ValueUnits};
pub use classify::{QaRules, TierThresholds};
pub use error::{Result, ScreeningError};
pub use pipeline::{screen, BatchThresholds, Screening, ScreeningSettings};
pub use raster::{GeoTransform, GridRaster, ZonalSampler};
pub use types::{BuildingRecord, FeatureId, Footprint, FootprintCollection, QaFlag, Statistic, Tier};
