//! Exécution d'un run: lecture, screening, export

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use roofstat::raster::ascii;
use roofstat::{loader, GridRaster, PercentLayer, RasterSet, Screening};

use crate::config::{Config, LayerConfig};
use crate::export::export_to_geojson;
use crate::report::RunReport;

/// Calcule le checksum blake3 d'un fichier
pub fn compute_file_checksum(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 65536]; // 64KB buffer

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize().as_bytes()))
}

/// Chemins résolus d'un run
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub buildings: PathBuf,
    pub output: PathBuf,
}

impl RunPaths {
    pub fn from_config(config: &Config) -> Result<Self> {
        let buildings = config
            .buildings
            .clone()
            .context("No buildings file (use --buildings or the `buildings` config key)")?;
        let output = config
            .output
            .clone()
            .context("No output file (use --output or the `output` config key)")?;
        Ok(Self { buildings, output })
    }
}

fn read_layer(role: &str, layer: &LayerConfig, report: &mut RunReport) -> Result<Option<GridRaster>> {
    let Some(path) = layer.path.as_deref() else {
        return Ok(None);
    };
    let grid = ascii::read(path, layer.epsg)
        .with_context(|| format!("Failed to read {} raster {}", role, path.display()))?;
    report.record_input(role, path, compute_file_checksum(path)?, Some(layer.epsg));
    info!(
        layer = role,
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        epsg = layer.epsg,
        "Raster loaded"
    );
    Ok(Some(grid))
}

/// Charge les rasters configurés
fn load_rasters(config: &Config, report: &mut RunReport) -> Result<RasterSet> {
    let impervious_cfg = config
        .layers
        .impervious
        .as_ref()
        .context("No impervious raster configured")?;
    let impervious = read_layer("impervious", impervious_cfg, report)?
        .context("No impervious raster path configured")?;
    let mut rasters = RasterSet::new(PercentLayer::new(Box::new(impervious), impervious_cfg.units));

    match &config.layers.land_cover {
        Some(cfg) => {
            if let Some(grid) = read_layer("land_cover", cfg, report)? {
                rasters = rasters.with_land_cover(Box::new(grid));
            }
        }
        None => info!("No land-cover raster, lc_major left undefined"),
    }
    match &config.layers.canopy {
        Some(cfg) => {
            if let Some(grid) = read_layer("canopy", cfg, report)? {
                rasters = rasters.with_canopy(PercentLayer::new(Box::new(grid), cfg.units));
            }
        }
        None => info!("No canopy raster, canopy_mean left undefined"),
    }
    Ok(rasters)
}

/// Exécute un run complet et alimente le rapport
pub fn run(config: &Config, paths: &RunPaths, report: &mut RunReport) -> Result<Screening> {
    config.validate()?;

    let buildings = loader::read_geojson(&paths.buildings)
        .with_context(|| format!("Failed to read buildings {}", paths.buildings.display()))?;
    report.record_input(
        "buildings",
        &paths.buildings,
        compute_file_checksum(&paths.buildings)?,
        Some(buildings.epsg),
    );
    info!(
        count = buildings.footprints.len(),
        epsg = buildings.epsg,
        path = %paths.buildings.display(),
        "Buildings loaded"
    );

    let rasters = load_rasters(config, report)?;
    for (name, layer) in [("land_cover", &config.layers.land_cover), ("canopy", &config.layers.canopy)] {
        if layer.as_ref().map_or(true, |l| l.path.is_none()) {
            report.record_warning(format!("Optional {} raster not provided", name));
        }
    }

    let screening = roofstat::screen(buildings, &rasters, &config.settings())
        .context("Screening failed")?;
    report.record_screening(&screening);
    if screening.unsampled() > 0 {
        warn!(
            unsampled = screening.unsampled(),
            total = screening.records.len(),
            "Some buildings have no impervious sample"
        );
    }

    if let Some(parent) = paths.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create {}", parent.display()))?;
    }
    let summary = export_to_geojson(&screening, &config.export_options(), &paths.output)?;
    report.record_export(&paths.output, &summary);

    Ok(screening)
}
