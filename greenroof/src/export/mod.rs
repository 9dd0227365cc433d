//! Export des résultats du screening

pub mod geojson;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use geojson::{export_to_geojson, ExportSummary};

/// Jeu d'attributs exporté
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportVariant {
    /// Tous les bâtiments, tous les attributs
    #[default]
    Full,
    /// Bâtiments échantillonnés seulement: surface, imperméabilisation, score
    Minimal,
}

impl fmt::Display for ExportVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportVariant::Full => f.write_str("full"),
            ExportVariant::Minimal => f.write_str("minimal"),
        }
    }
}

/// Options d'écriture
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub variant: ExportVariant,
    /// CRS des géométries écrites
    pub output_epsg: u32,
    /// Recopier les attributs d'entrée (les attributs calculés l'emportent)
    pub keep_source_properties: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            variant: ExportVariant::Full,
            output_epsg: 4326,
            keep_source_properties: false,
        }
    }
}
