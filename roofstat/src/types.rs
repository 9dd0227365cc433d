//! Types de données pour le crate roofstat

use std::fmt;

use geo::MultiPolygon;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

pub use geojson::feature::Id as FeatureId;

/// Emprise de bâtiment telle que lue en entrée
#[derive(Debug, Clone)]
pub struct Footprint {
    /// Position dans la collection source (identité stable)
    pub index: usize,

    /// Identifiant GeoJSON de la feature, chaîne ou nombre, si présent
    pub source_id: Option<FeatureId>,

    /// Emprise dans le CRS de la collection (Polygon normalisé en MultiPolygon)
    pub geometry: MultiPolygon,

    /// Attributs d'origine de la feature
    pub properties: Map<String, Value>,
}

/// Collection d'emprises avec son CRS déclaré
#[derive(Debug, Clone)]
pub struct FootprintCollection {
    /// Code EPSG des coordonnées
    pub epsg: u32,

    pub footprints: Vec<Footprint>,
}

/// Un bâtiment enrichi étape par étape par le pipeline
#[derive(Debug, Clone)]
pub struct BuildingRecord {
    pub index: usize,
    pub source_id: Option<FeatureId>,
    pub properties: Map<String, Value>,

    /// Géométrie dans le CRS de travail (métrique)
    pub geometry: MultiPolygon,

    /// Surface calculée une seule fois, juste après la projection métrique
    pub roof_area_m2: f64,

    /// Moyenne d'imperméabilisation (0-100)
    pub imp_mean: Option<f64>,

    /// Classe d'occupation du sol majoritaire
    pub lc_major: Option<i64>,

    /// Moyenne de canopée (0-100)
    pub canopy_mean: Option<f64>,

    /// Score composite arrondi au dixième
    pub score: Option<f64>,

    pub qa_flag: Option<QaFlag>,
    pub tier: Option<Tier>,
    pub why_top: Option<String>,
}

impl BuildingRecord {
    /// Crée un enregistrement à partir d'une emprise déjà projetée
    pub fn new(footprint: Footprint, roof_area_m2: f64) -> Self {
        Self {
            index: footprint.index,
            source_id: footprint.source_id,
            properties: footprint.properties,
            geometry: footprint.geometry,
            roof_area_m2,
            imp_mean: None,
            lc_major: None,
            canopy_mean: None,
            score: None,
            qa_flag: None,
            tier: None,
            why_top: None,
        }
    }
}

/// Drapeau de contrôle qualité (une seule valeur par bâtiment)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QaFlag {
    NoImperviousSample,
    CanopyInsideFootprint,
    LandCover,
    LowImpervious,
    Ok,
}

impl QaFlag {
    pub const ALL: [QaFlag; 5] = [
        QaFlag::NoImperviousSample,
        QaFlag::CanopyInsideFootprint,
        QaFlag::LandCover,
        QaFlag::LowImpervious,
        QaFlag::Ok,
    ];

    /// Libellé exporté
    pub fn as_str(self) -> &'static str {
        match self {
            QaFlag::NoImperviousSample => "no impervious sample",
            QaFlag::CanopyInsideFootprint => "needs review: canopy inside footprint",
            QaFlag::LandCover => "needs review: land cover",
            QaFlag::LowImpervious => "needs review: low impervious",
            QaFlag::Ok => "ok",
        }
    }

    /// Inverse de `as_str`
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == label)
    }
}

impl fmt::Display for QaFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for QaFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Niveau de priorité
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::High => "High",
            Tier::Medium => "Medium",
            Tier::Low => "Low",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistique zonale demandée au sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Mean,
    Majority,
}

impl Statistic {
    pub fn as_str(self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Majority => "majority",
        }
    }
}
