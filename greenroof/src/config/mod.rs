//! Configuration d'un run de screening

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use roofstat::classify::DEFAULT_NON_BUILDABLE_CODES;
use roofstat::reproject::SmartReprojector;
use roofstat::{QaRules, ScreeningSettings, ValueUnits};

use crate::export::{ExportOptions, ExportVariant};

/// Presets embarqués
pub const PRESETS: [&str; 2] = ["nlcd-full", "nlcd-minimal"];

/// CRS des rasters NLCD (CONUS Albers)
pub const DEFAULT_RASTER_EPSG: u32 = 5070;

/// Configuration principale
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Emprises GeoJSON (surchargé par `--buildings`)
    #[serde(default)]
    pub buildings: Option<PathBuf>,

    /// Fichier GeoJSON de sortie (surchargé par `--output`)
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// CRS métrique de calcul des surfaces
    #[serde(default = "default_working_epsg")]
    pub working_epsg: u32,

    /// CRS des géométries exportées
    #[serde(default = "default_output_epsg")]
    pub output_epsg: u32,

    /// Cellules touchées (`true`) ou centres inclus (`false`)
    #[serde(default = "default_true")]
    pub all_touched: bool,

    #[serde(default)]
    pub variant: ExportVariant,

    #[serde(default)]
    pub keep_source_properties: bool,

    /// Classes d'occupation du sol signalées en QA
    #[serde(default = "default_non_buildable_codes")]
    pub non_buildable_codes: Vec<i64>,

    #[serde(default)]
    pub layers: LayersConfig,
}

/// Rasters du run
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LayersConfig {
    #[serde(default)]
    pub impervious: Option<LayerConfig>,

    #[serde(default)]
    pub land_cover: Option<LayerConfig>,

    #[serde(default)]
    pub canopy: Option<LayerConfig>,
}

/// Un raster (grille ESRI ASCII)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayerConfig {
    /// Absent dans les presets: fourni en ligne de commande
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// CRS natif du raster (le format n'en porte pas)
    #[serde(default = "default_raster_epsg")]
    pub epsg: u32,

    /// Ignoré pour l'occupation du sol
    #[serde(default)]
    pub units: ValueUnits,
}

impl LayerConfig {
    fn from_path(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            epsg: DEFAULT_RASTER_EPSG,
            units: ValueUnits::Percent,
        }
    }
}

/// Valeurs passées en ligne de commande
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub buildings: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub impervious: Option<PathBuf>,
    pub land_cover: Option<PathBuf>,
    pub canopy: Option<PathBuf>,
    pub working_epsg: Option<u32>,
    pub output_epsg: Option<u32>,
    pub variant: Option<ExportVariant>,
}

fn default_working_epsg() -> u32 {
    26912
}

fn default_output_epsg() -> u32 {
    4326
}

fn default_raster_epsg() -> u32 {
    DEFAULT_RASTER_EPSG
}

fn default_true() -> bool {
    true
}

fn default_non_buildable_codes() -> Vec<i64> {
    DEFAULT_NON_BUILDABLE_CODES.to_vec()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buildings: None,
            output: None,
            working_epsg: default_working_epsg(),
            output_epsg: default_output_epsg(),
            all_touched: true,
            variant: ExportVariant::Full,
            keep_source_properties: false,
            non_buildable_codes: default_non_buildable_codes(),
            layers: LayersConfig::default(),
        }
    }
}

fn set_layer_path(layer: &mut Option<LayerConfig>, path: Option<PathBuf>) {
    let Some(path) = path else {
        return;
    };
    match layer {
        Some(layer) => layer.path = Some(path),
        None => *layer = Some(LayerConfig::from_path(path)),
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .context(format!("Failed to parse config JSON: {}", path.display()))
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "nlcd-full" => Self::load_embedded(include_str!("presets/nlcd-full.json")),
            "nlcd-minimal" => Self::load_embedded(include_str!("presets/nlcd-minimal.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: {}", preset, PRESETS.join(", ")),
        }
    }

    /// Nom de preset ou chemin vers un fichier JSON
    pub fn resolve(name_or_path: &str) -> Result<Self> {
        if PRESETS.contains(&name_or_path) {
            Self::from_preset(name_or_path)
        } else {
            Self::load(Path::new(name_or_path))
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Applique les valeurs de ligne de commande
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(buildings) = overrides.buildings {
            self.buildings = Some(buildings);
        }
        if let Some(output) = overrides.output {
            self.output = Some(output);
        }
        if let Some(epsg) = overrides.working_epsg {
            self.working_epsg = epsg;
        }
        if let Some(epsg) = overrides.output_epsg {
            self.output_epsg = epsg;
        }
        if let Some(variant) = overrides.variant {
            self.variant = variant;
        }
        set_layer_path(&mut self.layers.impervious, overrides.impervious);
        set_layer_path(&mut self.layers.land_cover, overrides.land_cover);
        set_layer_path(&mut self.layers.canopy, overrides.canopy);
    }

    /// Vérifie que le run est exécutable avant de lire les données
    pub fn validate(&self) -> Result<()> {
        roofstat::loader::ensure_metric_working_crs(self.working_epsg)?;

        let impervious = self
            .layers
            .impervious
            .as_ref()
            .and_then(|l| l.path.as_ref());
        if impervious.is_none() {
            anyhow::bail!("No impervious raster configured (use --impervious or layers.impervious.path)");
        }

        SmartReprojector::new(self.working_epsg, self.output_epsg)
            .context(format!("Output CRS EPSG:{} is not usable", self.output_epsg))?;
        for (name, layer) in self.configured_layers() {
            SmartReprojector::new(self.working_epsg, layer.epsg)
                .context(format!("CRS of layer {} (EPSG:{}) is not usable", name, layer.epsg))?;
        }
        Ok(())
    }

    /// Couches dont le chemin est renseigné
    pub fn configured_layers(&self) -> impl Iterator<Item = (&'static str, &LayerConfig)> {
        [
            ("impervious", self.layers.impervious.as_ref()),
            ("land_cover", self.layers.land_cover.as_ref()),
            ("canopy", self.layers.canopy.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, layer)| layer.filter(|l| l.path.is_some()).map(|l| (name, l)))
    }

    pub fn settings(&self) -> ScreeningSettings {
        ScreeningSettings {
            working_epsg: self.working_epsg,
            all_touched: self.all_touched,
            qa_rules: QaRules::new(self.non_buildable_codes.clone()),
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            variant: self.variant,
            output_epsg: self.output_epsg,
            keep_source_properties: self.keep_source_properties,
        }
    }
}
