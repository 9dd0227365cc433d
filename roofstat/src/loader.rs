//! Chargement des emprises de bâtiments et projection dans le CRS de travail

use std::path::Path;
use std::sync::OnceLock;

use geo::{Area, Geometry, MultiPolygon};
use geojson::{Feature, GeoJson, JsonObject};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::reproject::{is_metric_epsg, SmartReprojector};
use crate::types::{BuildingRecord, Footprint, FootprintCollection};
use crate::{Result, ScreeningError};

/// CRS par défaut d'un GeoJSON (RFC 7946)
pub const GEOJSON_DEFAULT_EPSG: u32 = 4326;

fn epsg_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)EPSG:{1,2}(?:[\d.]*:)?(\d+)$").expect("valid regex"))
}

/// Résout un nom de CRS (`urn:ogc:def:crs:EPSG::26912`, `EPSG:26912`, `...CRS84`)
pub fn parse_crs_name(name: &str) -> Option<u32> {
    let name = name.trim();
    if name.to_ascii_uppercase().ends_with("CRS84") {
        return Some(4326);
    }
    epsg_pattern()
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Lit le membre `crs` historique d'une FeatureCollection
fn declared_epsg(foreign_members: Option<&JsonObject>) -> Result<u32> {
    let Some(crs) = foreign_members.and_then(|m| m.get("crs")) else {
        return Ok(GEOJSON_DEFAULT_EPSG);
    };
    let name = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str())
        .ok_or_else(|| ScreeningError::InvalidConfig("GeoJSON crs member has no name".into()))?;

    parse_crs_name(name)
        .ok_or_else(|| ScreeningError::InvalidConfig(format!("unrecognised GeoJSON crs '{}'", name)))
}

fn to_footprint(index: usize, feature: Feature) -> Result<Footprint> {
    let geometry = feature
        .geometry
        .ok_or_else(|| ScreeningError::invalid_feature(index, "null geometry"))?;

    let geometry = match Geometry::<f64>::try_from(geometry.value)? {
        Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
        Geometry::MultiPolygon(mp) => mp,
        other => {
            return Err(ScreeningError::invalid_feature(
                index,
                format!("expected Polygon or MultiPolygon, got {}", geometry_kind(&other)),
            ))
        }
    };

    Ok(Footprint {
        index,
        source_id: feature.id,
        geometry,
        properties: feature.properties.unwrap_or_default(),
    })
}

fn geometry_kind(geom: &Geometry) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
        #[allow(unreachable_patterns)]
        _ => "Geometry",
    }
}

/// Parse un document GeoJSON d'emprises
pub fn parse_geojson(content: &str) -> Result<FootprintCollection> {
    let geojson: GeoJson = content.parse()?;

    let (epsg, features) = match geojson {
        GeoJson::FeatureCollection(fc) => (declared_epsg(fc.foreign_members.as_ref())?, fc.features),
        GeoJson::Feature(f) => (declared_epsg(f.foreign_members.as_ref())?, vec![f]),
        GeoJson::Geometry(_) => {
            return Err(ScreeningError::InvalidConfig(
                "expected a FeatureCollection of building footprints, got a bare geometry".into(),
            ))
        }
    };

    let footprints = features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| to_footprint(index, feature))
        .collect::<Result<Vec<_>>>()?;

    debug!(count = footprints.len(), epsg, "Parsed footprints");
    Ok(FootprintCollection { epsg, footprints })
}

/// Lit un fichier GeoJSON d'emprises
pub fn read_geojson(path: &Path) -> Result<FootprintCollection> {
    let content = std::fs::read_to_string(path)?;
    parse_geojson(&content)
}

/// Vérifie qu'un CRS convient au calcul des surfaces
pub fn ensure_metric_working_crs(epsg: u32) -> Result<()> {
    match is_metric_epsg(epsg) {
        Some(true) => Ok(()),
        Some(false) => Err(ScreeningError::NonMetricWorkingCrs(epsg)),
        None => {
            warn!(epsg, "Working CRS unknown to the built-in reprojector, assuming projected metres");
            Ok(())
        }
    }
}

/// Projette les emprises dans le CRS de travail et calcule les surfaces.
///
/// C'est le seul endroit où `roof_area_m2` est calculé: les reprojections
/// ultérieures (raster, export) ne touchent plus à la surface.
pub fn project_to_working(
    collection: FootprintCollection,
    working_epsg: u32,
) -> Result<Vec<BuildingRecord>> {
    ensure_metric_working_crs(working_epsg)?;

    let reprojector = SmartReprojector::new(collection.epsg, working_epsg)?;
    info!(
        from = collection.epsg,
        to = working_epsg,
        method = reprojector.description(),
        count = collection.footprints.len(),
        "Projecting footprints to working CRS"
    );

    collection
        .footprints
        .into_iter()
        .map(|mut footprint| {
            footprint.geometry = reprojector.transform_geometry(&footprint.geometry)?;
            let area = footprint.geometry.unsigned_area();
            Ok(BuildingRecord::new(footprint, area))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeatureId;

    const BUILDINGS: &str = r#"{
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::26912"}},
        "features": [
            {"type": "Feature", "id": "b-1", "properties": {"height": 12},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[10,0],[10,20],[0,20],[0,0]]]}},
            {"type": "Feature", "id": 7, "properties": null,
             "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[100,100],[110,100],[110,110],[100,110],[100,100]]],
                [[[200,200],[205,200],[205,205],[200,205],[200,200]]]
             ]}}
        ]
    }"#;

    #[test]
    fn test_parse_crs_name() {
        assert_eq!(parse_crs_name("urn:ogc:def:crs:EPSG::26912"), Some(26912));
        assert_eq!(parse_crs_name("EPSG:5070"), Some(5070));
        assert_eq!(parse_crs_name("urn:ogc:def:crs:EPSG:6.6:4269"), Some(4269));
        assert_eq!(parse_crs_name("urn:ogc:def:crs:OGC:1.3:CRS84"), Some(4326));
        assert_eq!(parse_crs_name("something else"), None);
    }

    #[test]
    fn test_parse_collection() {
        let collection = parse_geojson(BUILDINGS).unwrap();
        assert_eq!(collection.epsg, 26912);
        assert_eq!(collection.footprints.len(), 2);

        let first = &collection.footprints[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.source_id, Some(FeatureId::String("b-1".to_string())));
        assert_eq!(first.properties.get("height").and_then(|v| v.as_i64()), Some(12));
        assert_eq!(first.geometry.0.len(), 1);

        let second = &collection.footprints[1];
        assert_eq!(second.source_id, Some(FeatureId::Number(7u64.into())));
        assert!(second.properties.is_empty());
        assert_eq!(second.geometry.0.len(), 2);
    }

    #[test]
    fn test_default_crs_is_wgs84() {
        let content = r#"{"type": "FeatureCollection", "features": []}"#;
        assert_eq!(parse_geojson(content).unwrap().epsg, 4326);
    }

    #[test]
    fn test_rejects_point_feature() {
        let content = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [1, 2]}}
        ]}"#;
        match parse_geojson(content) {
            Err(ScreeningError::InvalidFeature { index, reason }) => {
                assert_eq!(index, 0);
                assert!(reason.contains("Point"));
            }
            other => panic!("Expected InvalidFeature, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_null_geometry() {
        let content = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "geometry": null}
        ]}"#;
        assert!(matches!(
            parse_geojson(content),
            Err(ScreeningError::InvalidFeature { index: 0, .. })
        ));
    }

    #[test]
    fn test_area_computed_in_working_crs() {
        let collection = parse_geojson(BUILDINGS).unwrap();
        let records = project_to_working(collection, 26912).unwrap();
        assert_eq!(records[0].roof_area_m2, 200.0);
        assert_eq!(records[1].roof_area_m2, 125.0);
    }

    #[test]
    fn test_geographic_working_crs_rejected() {
        let collection = parse_geojson(BUILDINGS).unwrap();
        assert!(matches!(
            project_to_working(collection.clone(), 4326),
            Err(ScreeningError::NonMetricWorkingCrs(4326))
        ));
        assert!(matches!(
            project_to_working(collection, 3857),
            Err(ScreeningError::NonMetricWorkingCrs(3857))
        ));
    }

    #[test]
    fn test_wgs84_input_projected_before_area() {
        let content = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "geometry": {"type": "Polygon", "coordinates":
                [[[-111.8910, 40.7610], [-111.8905, 40.7610], [-111.8905, 40.7614],
                  [-111.8910, 40.7614], [-111.8910, 40.7610]]]}}
        ]}"#;
        let records = project_to_working(parse_geojson(content).unwrap(), 26912).unwrap();
        let area = records[0].roof_area_m2;
        // ~42m x ~44m
        assert!(area > 1800.0 && area < 1950.0, "area={}", area);
    }
}
