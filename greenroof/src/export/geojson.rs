//! Export GeoJSON des bâtiments classés (géométries via geozero)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geo::{Geometry, MultiPolygon};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use roofstat::reproject::SmartReprojector;
use roofstat::{BuildingRecord, FeatureId, Screening};

use super::{ExportOptions, ExportVariant};

/// Bilan d'un export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub written: usize,
    /// Bâtiments écartés par la variante minimale
    pub dropped: usize,
    pub output_epsg: u32,
}

/// Exporte un screening dans un fichier GeoJSON
pub fn export_to_geojson(
    screening: &Screening,
    options: &ExportOptions,
    output_path: &Path,
) -> Result<ExportSummary> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    let summary = write_collection(&mut writer, &screening.records, screening.working_epsg, options)
        .context(format!("Failed to write {}", output_path.display()))?;
    writer.flush()?;

    info!(
        written = summary.written,
        dropped = summary.dropped,
        epsg = summary.output_epsg,
        output = %output_path.display(),
        "GeoJSON exported"
    );
    Ok(summary)
}

/// Écrit la FeatureCollection complète
pub fn write_collection<W: Write>(
    writer: &mut W,
    records: &[BuildingRecord],
    working_epsg: u32,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let reprojector = SmartReprojector::new(working_epsg, options.output_epsg)?;

    // Header FeatureCollection avec CRS
    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::{}"}}}},"features":["#,
        options.output_epsg
    )?;

    let mut summary = ExportSummary {
        output_epsg: options.output_epsg,
        ..Default::default()
    };
    for record in records {
        if options.variant == ExportVariant::Minimal && record.imp_mean.is_none() {
            summary.dropped += 1;
            continue;
        }
        if summary.written > 0 {
            write!(writer, ",")?;
        }
        let geometry = reprojector.transform_geometry(&record.geometry)?;
        write_feature(writer, record, &geometry, options)?;
        summary.written += 1;
    }

    write!(writer, "]}}")?;
    Ok(summary)
}

/// Identifiant de la feature: `id` d'origine, sinon la position
fn feature_id(record: &BuildingRecord) -> Value {
    match &record.source_id {
        Some(FeatureId::String(s)) => Value::String(s.clone()),
        Some(FeatureId::Number(n)) => Value::Number(n.clone()),
        None => Value::from(record.index),
    }
}

/// Attributs écrits pour un bâtiment, `null` quand indéfini
fn feature_properties(record: &BuildingRecord, options: &ExportOptions) -> Map<String, Value> {
    let mut properties = if options.keep_source_properties {
        record.properties.clone()
    } else {
        Map::new()
    };

    let computed = match options.variant {
        ExportVariant::Full => json!({
            "tier": record.tier,
            "score": record.score,
            "roof_area_m2": record.roof_area_m2,
            "imp_mean": record.imp_mean,
            "canopy_mean": record.canopy_mean,
            "lc_major": record.lc_major,
            "qa_flag": record.qa_flag,
            "why_top": record.why_top,
        }),
        ExportVariant::Minimal => json!({
            "roof_area_m2": record.roof_area_m2,
            "imp_mean": record.imp_mean,
            "score": record.score,
        }),
    };
    if let Value::Object(computed) = computed {
        properties.extend(computed);
    }
    properties
}

/// Écrit une feature en GeoJSON
fn write_feature<W: Write>(
    writer: &mut W,
    record: &BuildingRecord,
    geometry: &MultiPolygon,
    options: &ExportOptions,
) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","id":"#)?;
    serde_json::to_writer(&mut *writer, &feature_id(record))?;

    // Un seul polygone: réécrit en Polygon
    let geometry = match geometry.0.as_slice() {
        [polygon] => Geometry::Polygon(polygon.clone()),
        _ => Geometry::MultiPolygon(geometry.clone()),
    };
    write!(writer, r#","geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    geometry.process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(writer, r#","properties":"#)?;
    serde_json::to_writer(&mut *writer, &feature_properties(record, options))?;
    write!(writer, "}}")?;

    Ok(())
}
