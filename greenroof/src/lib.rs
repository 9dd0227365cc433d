//! # greenroof
//!
//! Repérage des toitures candidates à la végétalisation.
//!
//! ## Features
//!
//! - Configuration JSON et presets NLCD embarqués
//! - Export GeoJSON (variantes complète et minimale) en CRS géographique
//! - Rapport de run avec checksums des entrées
//! - CLI simple
//!
//! ## Usage CLI
//!
//! ```bash
//! # Screening avec le preset NLCD
//! greenroof screen --buildings ./buildings.geojson --impervious ./impervious.asc \
//!     --land-cover ./nlcd.asc --canopy ./canopy.asc --output ./ranked.geojson
//!
//! # Variante minimale, rapport JSON
//! greenroof screen --config nlcd-minimal -b ./buildings.geojson \
//!     --impervious ./impervious.asc -o ./ranked.geojson --report ./report.json
//!
//! # Inspecter un raster
//! greenroof inspect ./impervious.asc --epsg 5070
//! ```

pub mod config;
pub mod export;
pub mod job;
pub mod report;

pub use config::Config;
pub use export::{ExportOptions, ExportVariant};
pub use report::{RunReport, RunStatus};
