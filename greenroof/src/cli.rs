//! Définition et implémentation des commandes CLI
//!
//! - `screen`: emprises + rasters → GeoJSON classé
//! - `inspect`: en-tête et statistiques d'un raster ou d'un fichier d'emprises

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::{error, info};

use greenroof::config::{Config, Overrides};
use greenroof::export::ExportVariant;
use greenroof::job::{self, RunPaths};
use greenroof::report::RunReport;
use roofstat::quantile::quantile;
use roofstat::raster::ascii;

#[derive(Subcommand)]
pub enum Commands {
    /// Score building footprints and export a classified GeoJSON
    Screen {
        /// Building footprints (GeoJSON FeatureCollection)
        #[arg(short, long)]
        buildings: Option<PathBuf>,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config preset name (nlcd-full/nlcd-minimal) or path to a JSON config
        #[arg(long, default_value = "nlcd-full")]
        config: String,

        /// Impervious surface raster (ESRI ASCII grid)
        #[arg(long)]
        impervious: Option<PathBuf>,

        /// Land-cover raster (ESRI ASCII grid)
        #[arg(long)]
        land_cover: Option<PathBuf>,

        /// Tree-canopy raster (ESRI ASCII grid)
        #[arg(long)]
        canopy: Option<PathBuf>,

        /// Metric working CRS used for roof areas (e.g., 26912 for UTM 12N)
        #[arg(long)]
        working_epsg: Option<u32>,

        /// CRS of the exported geometries (default: 4326 / WGS84)
        #[arg(long)]
        output_epsg: Option<u32>,

        /// Exported attribute set
        #[arg(long, value_enum)]
        variant: Option<ExportVariant>,

        /// Save the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print header and statistics of a raster (.asc) or a footprint file
    Inspect {
        /// Path to an ESRI ASCII grid or a GeoJSON file
        path: PathBuf,

        /// CRS of the raster (ignored for GeoJSON)
        #[arg(long, default_value_t = greenroof::config::DEFAULT_RASTER_EPSG)]
        epsg: u32,

        /// Working CRS for footprint areas
        #[arg(long, default_value_t = 26912)]
        working_epsg: u32,
    },
}

/// Exécute la commande screen
pub fn cmd_screen(config_arg: &str, overrides: Overrides, report_path: Option<&Path>, quiet: bool) -> Result<()> {
    let mut config = Config::resolve(config_arg)?;
    config.apply_overrides(overrides);
    let paths = RunPaths::from_config(&config)?;

    info!(
        buildings = %paths.buildings.display(),
        output = %paths.output.display(),
        config = config_arg,
        "Screening"
    );

    let started = Instant::now();
    let mut report = RunReport::new(config.working_epsg, config.output_epsg, config.variant);
    let outcome = job::run(&config, &paths, &mut report);
    report.set_duration(started.elapsed());

    if let Err(e) = &outcome {
        error!("{:#}", e);
        report.record_failure(format!("{:#}", e));
    }
    report.finalize();

    if !quiet {
        report.display();
    }
    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to save report {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }
    info!("{}", report.summary());

    outcome.map(|_| ())
}

/// Exécute la commande inspect
pub fn cmd_inspect(path: &Path, epsg: u32, working_epsg: u32) -> Result<()> {
    let is_raster = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("asc"));

    if is_raster {
        inspect_raster(path, epsg)
    } else {
        inspect_buildings(path, working_epsg)
    }
}

fn inspect_raster(path: &Path, epsg: u32) -> Result<()> {
    let grid = ascii::read(path, epsg).with_context(|| format!("Failed to read {}", path.display()))?;
    let bounds = grid.bounds();
    let summary = grid.summary();
    let t = grid.transform();

    println!("Raster: {}", grid.name());
    println!("  Size: {} x {} ({} cells)", grid.width(), grid.height(), summary.cells);
    println!("  CRS: EPSG:{}", epsg);
    println!("  Pixel: {} x {}", t.pixel_width, t.pixel_height.abs());
    println!(
        "  Bounds: [{:.3}, {:.3}] - [{:.3}, {:.3}]",
        bounds.min().x,
        bounds.min().y,
        bounds.max().x,
        bounds.max().y
    );
    println!(
        "  NoData: {}",
        grid.nodata().map_or_else(|| "none".to_string(), |v| v.to_string())
    );
    println!("  Valid cells: {}", summary.valid_count);
    if let (Some(min), Some(max), Some(mean)) = (summary.min, summary.max, summary.mean) {
        println!("  Values: min {} / max {} / mean {:.3}", min, max, mean);
        if max <= 1.0 {
            println!("  Note: all values <= 1, this looks like a fraction raster (units: fraction)");
        }
    }
    Ok(())
}

fn inspect_buildings(path: &Path, working_epsg: u32) -> Result<()> {
    let collection = roofstat::loader::read_geojson(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let declared = collection.epsg;
    let count = collection.footprints.len();
    let with_id = collection.footprints.iter().filter(|f| f.source_id.is_some()).count();

    println!("Buildings: {}", path.display());
    println!("  Features: {} ({} with id)", count, with_id);
    println!("  Declared CRS: EPSG:{}", declared);

    if count > 0 {
        let records = roofstat::loader::project_to_working(collection, working_epsg)?;
        let areas = || records.iter().map(|r| Some(r.roof_area_m2));
        let total: f64 = records.iter().map(|r| r.roof_area_m2).sum();
        println!("  Roof area (EPSG:{}): {:.1} m2 total", working_epsg, total);
        if let (Some(p50), Some(p95)) = (quantile(areas(), 0.50), quantile(areas(), 0.95)) {
            println!("  Median {:.1} m2, P95 {:.1} m2", p50, p95);
        }
    }
    Ok(())
}
