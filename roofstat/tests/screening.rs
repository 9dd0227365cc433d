//! Tests d'intégration du pipeline de screening

use roofstat::reproject::ReprojectorLite;
use roofstat::{
    loader, raster::ascii, screen, FeatureId, GeoTransform, GridRaster, PercentLayer, QaFlag, QaRules,
    RasterSet, ScreeningError, ScreeningSettings, Tier, ValueUnits,
};

/// Carré ou rectangle GeoJSON en coordonnées UTM 12N
fn rect_feature(id: &str, x0: f64, y0: f64, w: f64, h: f64) -> String {
    format!(
        r#"{{"type": "Feature", "id": "{id}", "properties": {{"name": "{id}"}},
            "geometry": {{"type": "Polygon", "coordinates": [[[{x0},{y0}],[{x1},{y0}],[{x1},{y1}],[{x0},{y1}],[{x0},{y0}]]]}}}}"#,
        id = id,
        x0 = x0,
        y0 = y0,
        x1 = x0 + w,
        y1 = y0 + h
    )
}

fn collection(features: &[String]) -> String {
    format!(
        r#"{{"type": "FeatureCollection",
            "crs": {{"type": "name", "properties": {{"name": "urn:ogc:def:crs:EPSG::26912"}}}},
            "features": [{}]}}"#,
        features.join(",")
    )
}

/// Trois cellules de 100 m: 10 %, 50 %, 90 %
fn impervious_grid() -> GridRaster {
    GridRaster::new(
        "impervious",
        26912,
        3,
        1,
        GeoTransform::new(0.0, 100.0, 100.0, -100.0),
        Some(255.0),
        vec![10.0, 50.0, 90.0],
    )
    .unwrap()
}

fn reference_buildings() -> Vec<String> {
    vec![
        rect_feature("a", 10.0, 10.0, 5.0, 10.0),
        rect_feature("b", 110.0, 10.0, 20.0, 25.0),
        rect_feature("c", 210.0, 10.0, 25.0, 40.0),
    ]
}

fn settings() -> ScreeningSettings {
    ScreeningSettings {
        working_epsg: 26912,
        all_touched: true,
        qa_rules: QaRules::default(),
    }
}

#[test]
fn test_reference_scenario() {
    let buildings = loader::parse_geojson(&collection(&reference_buildings())).unwrap();
    let rasters = RasterSet::new(PercentLayer::new(Box::new(impervious_grid()), ValueUnits::Percent));

    let screening = screen(buildings, &rasters, &settings()).unwrap();
    let records = &screening.records;

    let areas: Vec<f64> = records.iter().map(|r| r.roof_area_m2).collect();
    assert_eq!(areas, vec![50.0, 500.0, 1000.0]);
    assert!((screening.thresholds.area_p95 - 950.0).abs() < 1e-9);

    let scores: Vec<_> = records.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![Some(7.2), Some(51.6), Some(96.0)]);

    let flags: Vec<_> = records.iter().map(|r| r.qa_flag).collect();
    assert_eq!(
        flags,
        vec![Some(QaFlag::LowImpervious), Some(QaFlag::Ok), Some(QaFlag::Ok)]
    );

    let tiers: Vec<_> = records.iter().map(|r| r.tier).collect();
    assert_eq!(tiers, vec![Some(Tier::Low), Some(Tier::Medium), Some(Tier::High)]);

    // Optionnels absents: attributs indéfinis partout
    assert!(records.iter().all(|r| r.lc_major.is_none() && r.canopy_mean.is_none()));
    assert_eq!(records[1].source_id, Some(FeatureId::String("b".to_string())));
}

#[test]
fn test_building_outside_coverage() {
    let mut features = reference_buildings();
    features.push(rect_feature("outside", 5000.0, 5000.0, 10.0, 10.0));
    let buildings = loader::parse_geojson(&collection(&features)).unwrap();
    let rasters = RasterSet::new(PercentLayer::new(Box::new(impervious_grid()), ValueUnits::Percent));

    let screening = screen(buildings, &rasters, &settings()).unwrap();
    let outside = &screening.records[3];

    assert_eq!(screening.records.len(), 4);
    assert_eq!(screening.unsampled(), 1);
    assert_eq!(outside.imp_mean, None);
    assert_eq!(outside.score, None);
    assert_eq!(outside.qa_flag, Some(QaFlag::NoImperviousSample));
    assert_eq!(outside.tier, Some(Tier::Low));
    assert_eq!(
        outside.why_top.as_deref(),
        Some("smaller roof; moderate/low impervious context")
    );
    assert_eq!(screening.coverage[0].sampled, 3);
    assert_eq!(screening.coverage[0].total, 4);
}

#[test]
fn test_optional_layers_and_qa() {
    let buildings = loader::parse_geojson(&collection(&reference_buildings())).unwrap();

    // Canopée forte sur le bâtiment c, eau sur b
    let canopy = GridRaster::new(
        "canopy",
        26912,
        3,
        1,
        GeoTransform::new(0.0, 100.0, 100.0, -100.0),
        None,
        vec![0.0, 0.05, 0.4],
    )
    .unwrap();
    let land_cover = GridRaster::new(
        "nlcd",
        26912,
        3,
        1,
        GeoTransform::new(0.0, 100.0, 100.0, -100.0),
        None,
        vec![23.0, 11.0, 24.0],
    )
    .unwrap();
    let rasters = RasterSet::new(PercentLayer::new(Box::new(impervious_grid()), ValueUnits::Percent))
        .with_canopy(PercentLayer::new(Box::new(canopy), ValueUnits::Fraction))
        .with_land_cover(Box::new(land_cover));

    let screening = screen(buildings, &rasters, &settings()).unwrap();
    let r = &screening.records;

    assert_eq!(r[1].lc_major, Some(11));
    assert_eq!(r[1].qa_flag, Some(QaFlag::LandCover));
    assert!((r[2].canopy_mean.unwrap() - 40.0).abs() < 1e-9);
    assert_eq!(r[2].qa_flag, Some(QaFlag::CanopyInsideFootprint));
    // Meilleur score mais QA non ok
    assert_eq!(r[2].tier, Some(Tier::Medium));
}

#[test]
fn test_empty_batch_fails_fast() {
    let buildings = loader::parse_geojson(&collection(&[])).unwrap();
    let rasters = RasterSet::new(PercentLayer::new(Box::new(impervious_grid()), ValueUnits::Percent));
    assert!(matches!(
        screen(buildings, &rasters, &settings()),
        Err(ScreeningError::EmptyBatch)
    ));
}

#[test]
fn test_geographic_working_crs_rejected_by_screen() {
    let rasters = RasterSet::new(PercentLayer::new(Box::new(impervious_grid()), ValueUnits::Percent));
    let geographic = ScreeningSettings {
        working_epsg: 4326,
        ..settings()
    };

    let buildings = loader::parse_geojson(&collection(&reference_buildings())).unwrap();
    assert!(matches!(
        screen(buildings, &rasters, &geographic),
        Err(ScreeningError::NonMetricWorkingCrs(4326))
    ));

    // Lot vide: EmptyBatch passe avant le contrôle du CRS
    let empty = loader::parse_geojson(&collection(&[])).unwrap();
    assert!(matches!(
        screen(empty, &rasters, &geographic),
        Err(ScreeningError::EmptyBatch)
    ));
}

#[test]
fn test_raster_in_albers_footprints_in_wgs84() {
    // Bâtiment à Salt Lake City, raster NLCD-like en Albers CONUS
    let content = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {}, "geometry": {"type": "Polygon", "coordinates":
            [[[-111.8910, 40.7610], [-111.8905, 40.7610], [-111.8905, 40.7614],
              [-111.8910, 40.7614], [-111.8910, 40.7610]]]}}
    ]}"#;
    let buildings = loader::parse_geojson(content).unwrap();

    let (x, y) = ReprojectorLite::new(4326, 5070)
        .unwrap()
        .transform_point(-111.89075, 40.7612)
        .unwrap();
    let grid = GridRaster::new(
        "impervious",
        5070,
        1,
        1,
        GeoTransform::new(x - 5000.0, y + 5000.0, 10000.0, -10000.0),
        None,
        vec![72.0],
    )
    .unwrap();
    let rasters = RasterSet::new(PercentLayer::new(Box::new(grid), ValueUnits::Percent));

    let screening = screen(buildings, &rasters, &settings()).unwrap();
    assert_eq!(screening.records[0].imp_mean, Some(72.0));
    assert_eq!(screening.coverage[0].raster_epsg, Some(5070));
}

#[test]
fn test_ascii_grid_from_file() {
    let path = std::env::temp_dir().join("roofstat_test_impervious.asc");
    std::fs::write(
        &path,
        "ncols 3\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 100\nNODATA_value 255\n10 50 90\n",
    )
    .unwrap();

    let grid = ascii::read(&path, 26912).unwrap();
    let buildings = loader::parse_geojson(&collection(&reference_buildings())).unwrap();
    let rasters = RasterSet::new(PercentLayer::new(Box::new(grid), ValueUnits::Percent));
    let screening = screen(buildings, &rasters, &settings()).unwrap();

    let imp: Vec<_> = screening.records.iter().map(|r| r.imp_mean).collect();
    assert_eq!(imp, vec![Some(10.0), Some(50.0), Some(90.0)]);

    let _ = std::fs::remove_file(&path);
}
