//! Agrégation des statistiques raster sur les emprises
//!
//! Un appel au sampler par couple (raster, statistique). Les résultats sont
//! rattachés aux bâtiments par position: l'ordre des polygones envoyés au
//! sampler est exactement celui des enregistrements.

use std::fmt;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::raster::ZonalSampler;
use crate::reproject::SmartReprojector;
use crate::types::{BuildingRecord, Statistic};
use crate::{Result, ScreeningError};

/// Tolérance sur les bornes 0-100 après mise à l'échelle
const UNIT_TOLERANCE: f64 = 1e-6;

/// Unité des valeurs d'un raster de pourcentage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueUnits {
    /// Points de pourcentage (0-100)
    #[default]
    Percent,
    /// Fraction (0-1), multipliée par 100 avant stockage
    Fraction,
}

impl ValueUnits {
    fn scale(self) -> f64 {
        match self {
            ValueUnits::Percent => 1.0,
            ValueUnits::Fraction => 100.0,
        }
    }
}

impl fmt::Display for ValueUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueUnits::Percent => f.write_str("percent"),
            ValueUnits::Fraction => f.write_str("fraction"),
        }
    }
}

/// Rôle d'un raster dans le screening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Impervious,
    LandCover,
    Canopy,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Impervious => "impervious",
            LayerKind::LandCover => "land_cover",
            LayerKind::Canopy => "canopy",
        }
    }

    fn statistic(self) -> Statistic {
        match self {
            LayerKind::LandCover => Statistic::Majority,
            LayerKind::Impervious | LayerKind::Canopy => Statistic::Mean,
        }
    }
}

/// Raster de pourcentage avec son unité déclarée
pub struct PercentLayer {
    pub sampler: Box<dyn ZonalSampler>,
    pub units: ValueUnits,
}

impl PercentLayer {
    pub fn new(sampler: Box<dyn ZonalSampler>, units: ValueUnits) -> Self {
        Self { sampler, units }
    }
}

/// Rasters disponibles pour un run (seul l'imperméabilisation est requise)
pub struct RasterSet {
    pub impervious: PercentLayer,
    pub land_cover: Option<Box<dyn ZonalSampler>>,
    pub canopy: Option<PercentLayer>,
}

impl RasterSet {
    pub fn new(impervious: PercentLayer) -> Self {
        Self {
            impervious,
            land_cover: None,
            canopy: None,
        }
    }

    pub fn with_land_cover(mut self, sampler: Box<dyn ZonalSampler>) -> Self {
        self.land_cover = Some(sampler);
        self
    }

    pub fn with_canopy(mut self, layer: PercentLayer) -> Self {
        self.canopy = Some(layer);
        self
    }
}

/// Couverture obtenue pour une couche
#[derive(Debug, Clone, Serialize)]
pub struct LayerCoverage {
    pub layer: LayerKind,
    /// `false` quand le raster optionnel est absent
    pub available: bool,
    pub raster_epsg: Option<u32>,
    /// Bâtiments ayant au moins une cellule valide
    pub sampled: usize,
    pub total: usize,
}

impl LayerCoverage {
    fn unavailable(layer: LayerKind, total: usize) -> Self {
        Self {
            layer,
            available: false,
            raster_epsg: None,
            sampled: 0,
            total,
        }
    }
}

/// Échantillonne une couche dans son CRS natif
fn sample_layer(
    kind: LayerKind,
    sampler: &dyn ZonalSampler,
    polygons: &[MultiPolygon],
    working_epsg: u32,
    all_touched: bool,
) -> Result<Vec<Option<f64>>> {
    let raster_epsg = sampler.epsg();
    let reprojector = SmartReprojector::new(working_epsg, raster_epsg)?;
    let aligned = reprojector.transform_all(polygons)?;

    debug!(
        layer = kind.as_str(),
        statistic = kind.statistic().as_str(),
        raster_epsg,
        method = reprojector.description(),
        "Sampling layer"
    );

    let values = sampler.sample(&aligned, kind.statistic(), all_touched)?;
    if values.len() != polygons.len() {
        return Err(ScreeningError::SampleCountMismatch {
            layer: kind.as_str().to_string(),
            expected: polygons.len(),
            got: values.len(),
        });
    }

    if !polygons.is_empty() && values.iter().all(Option::is_none) {
        warn!(
            layer = kind.as_str(),
            raster_epsg,
            "No footprint overlaps a valid cell; check the raster extent and CRS"
        );
    }
    Ok(values)
}

/// Met à l'échelle et valide une série de pourcentages
fn to_percent(kind: LayerKind, units: ValueUnits, values: Vec<Option<f64>>) -> Result<Vec<Option<f64>>> {
    let scaled: Vec<Option<f64>> = values
        .into_iter()
        .map(|v| v.map(|v| v * units.scale()))
        .collect();

    if let Some(bad) = scaled
        .iter()
        .flatten()
        .find(|&&v| !(-UNIT_TOLERANCE..=100.0 + UNIT_TOLERANCE).contains(&v))
    {
        return Err(ScreeningError::UnitMismatch {
            layer: kind.as_str().to_string(),
            value: *bad,
            units: units.to_string(),
        });
    }

    let mut defined = scaled.iter().flatten().peekable();
    if units == ValueUnits::Percent && defined.peek().is_some() && defined.all(|&v| v <= 1.0) {
        warn!(
            layer = kind.as_str(),
            "All sampled means are <= 1 but the layer is declared as percent; is it a fraction raster?"
        );
    }
    Ok(scaled)
}

fn coverage(kind: LayerKind, raster_epsg: u32, values: &[Option<f64>]) -> LayerCoverage {
    LayerCoverage {
        layer: kind,
        available: true,
        raster_epsg: Some(raster_epsg),
        sampled: values.iter().filter(|v| v.is_some()).count(),
        total: values.len(),
    }
}

/// Rattache `imp_mean`, `lc_major` et `canopy_mean` à chaque bâtiment
pub fn aggregate(
    records: &mut [BuildingRecord],
    rasters: &RasterSet,
    working_epsg: u32,
    all_touched: bool,
) -> Result<Vec<LayerCoverage>> {
    let polygons: Vec<MultiPolygon> = records.iter().map(|r| r.geometry.clone()).collect();
    let total = records.len();
    let mut report = Vec::with_capacity(3);

    // Imperméabilisation (requis)
    let kind = LayerKind::Impervious;
    let layer = &rasters.impervious;
    let raw = sample_layer(kind, layer.sampler.as_ref(), &polygons, working_epsg, all_touched)?;
    let values = to_percent(kind, layer.units, raw)?;
    report.push(coverage(kind, layer.sampler.epsg(), &values));
    for (record, value) in records.iter_mut().zip(values) {
        record.imp_mean = value;
    }

    // Occupation du sol (optionnel)
    let kind = LayerKind::LandCover;
    match &rasters.land_cover {
        Some(sampler) => {
            let values = sample_layer(kind, sampler.as_ref(), &polygons, working_epsg, all_touched)?;
            report.push(coverage(kind, sampler.epsg(), &values));
            for (record, value) in records.iter_mut().zip(values) {
                record.lc_major = value.map(|v| v.round() as i64);
            }
        }
        None => report.push(LayerCoverage::unavailable(kind, total)),
    }

    // Canopée (optionnel)
    let kind = LayerKind::Canopy;
    match &rasters.canopy {
        Some(layer) => {
            let raw = sample_layer(kind, layer.sampler.as_ref(), &polygons, working_epsg, all_touched)?;
            let values = to_percent(kind, layer.units, raw)?;
            report.push(coverage(kind, layer.sampler.epsg(), &values));
            for (record, value) in records.iter_mut().zip(values) {
                record.canopy_mean = value;
            }
        }
        None => report.push(LayerCoverage::unavailable(kind, total)),
    }

    for c in &report {
        info!(
            layer = c.layer.as_str(),
            available = c.available,
            sampled = c.sampled,
            total = c.total,
            "Layer aggregated"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{GeoTransform, GridRaster};
    use crate::types::Footprint;
    use geo::polygon;
    use serde_json::Map;

    /// Sampler qui renvoie des valeurs fixées, quel que soit le polygone
    struct Fixed {
        epsg: u32,
        values: Vec<Option<f64>>,
    }

    impl ZonalSampler for Fixed {
        fn epsg(&self) -> u32 {
            self.epsg
        }

        fn sample(
            &self,
            _polygons: &[MultiPolygon],
            _statistic: Statistic,
            _all_touched: bool,
        ) -> Result<Vec<Option<f64>>> {
            Ok(self.values.clone())
        }
    }

    fn fixed(values: Vec<Option<f64>>) -> Box<dyn ZonalSampler> {
        Box::new(Fixed { epsg: 26912, values })
    }

    fn record(index: usize, x0: f64) -> BuildingRecord {
        let footprint = Footprint {
            index,
            source_id: None,
            geometry: MultiPolygon::new(vec![polygon![
                (x: x0, y: 0.0),
                (x: x0 + 10.0, y: 0.0),
                (x: x0 + 10.0, y: 10.0),
                (x: x0, y: 10.0),
                (x: x0, y: 0.0),
            ]]),
            properties: Map::new(),
        };
        BuildingRecord::new(footprint, 100.0)
    }

    #[test]
    fn test_positional_join() {
        // Grille 3x1: colonnes 0..10, 10..20, 20..30 -> 10, 50, 90
        let grid = GridRaster::new(
            "imp",
            26912,
            3,
            1,
            GeoTransform::new(0.0, 10.0, 10.0, -10.0),
            None,
            vec![10.0, 50.0, 90.0],
        )
        .unwrap();
        let mut records = vec![record(0, 20.0), record(1, 0.0), record(2, 10.0)];
        let rasters = RasterSet::new(PercentLayer::new(Box::new(grid), ValueUnits::Percent));

        aggregate(&mut records, &rasters, 26912, false).unwrap();

        let imp: Vec<_> = records.iter().map(|r| r.imp_mean).collect();
        assert_eq!(imp, vec![Some(90.0), Some(10.0), Some(50.0)]);
    }

    #[test]
    fn test_optional_layers_absent() {
        let mut records = vec![record(0, 0.0), record(1, 20.0)];
        let rasters = RasterSet::new(PercentLayer::new(
            fixed(vec![Some(40.0), None]),
            ValueUnits::Percent,
        ));

        let coverage = aggregate(&mut records, &rasters, 26912, true).unwrap();

        assert_eq!(records[0].imp_mean, Some(40.0));
        assert_eq!(records[1].imp_mean, None);
        assert!(records.iter().all(|r| r.lc_major.is_none() && r.canopy_mean.is_none()));
        assert_eq!(coverage.len(), 3);
        assert_eq!(coverage[0].sampled, 1);
        assert!(!coverage[1].available);
        assert!(!coverage[2].available);
    }

    #[test]
    fn test_fraction_units_scaled() {
        let mut records = vec![record(0, 0.0)];
        let rasters = RasterSet::new(PercentLayer::new(fixed(vec![Some(0.42)]), ValueUnits::Fraction))
            .with_canopy(PercentLayer::new(fixed(vec![Some(0.3)]), ValueUnits::Fraction))
            .with_land_cover(fixed(vec![Some(23.0)]));

        aggregate(&mut records, &rasters, 26912, true).unwrap();

        assert!((records[0].imp_mean.unwrap() - 42.0).abs() < 1e-9);
        assert!((records[0].canopy_mean.unwrap() - 30.0).abs() < 1e-9);
        assert_eq!(records[0].lc_major, Some(23));
    }

    #[test]
    fn test_unit_mismatch_detected() {
        let mut records = vec![record(0, 0.0)];
        // Déclaré en fraction mais déjà en pourcentage
        let rasters = RasterSet::new(PercentLayer::new(fixed(vec![Some(65.0)]), ValueUnits::Fraction));

        match aggregate(&mut records, &rasters, 26912, true) {
            Err(ScreeningError::UnitMismatch { layer, value, .. }) => {
                assert_eq!(layer, "impervious");
                assert_eq!(value, 6500.0);
            }
            other => panic!("Expected UnitMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_sample_count_mismatch() {
        let mut records = vec![record(0, 0.0), record(1, 20.0)];
        let rasters = RasterSet::new(PercentLayer::new(fixed(vec![Some(1.0)]), ValueUnits::Percent));

        assert!(matches!(
            aggregate(&mut records, &rasters, 26912, true),
            Err(ScreeningError::SampleCountMismatch {
                expected: 2,
                got: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_polygons_reprojected_to_raster_crs() {
        // Raster en Albers; les emprises sont en UTM 12N
        struct ExpectAlbers;
        impl ZonalSampler for ExpectAlbers {
            fn epsg(&self) -> u32 {
                5070
            }
            fn sample(
                &self,
                polygons: &[MultiPolygon],
                _statistic: Statistic,
                _all_touched: bool,
            ) -> Result<Vec<Option<f64>>> {
                // Salt Lake City en Albers: x fortement négatif
                Ok(polygons
                    .iter()
                    .map(|p| {
                        let c = p.0[0].exterior().0[0];
                        (c.x < -1_000_000.0).then_some(60.0)
                    })
                    .collect())
            }
        }

        let mut records = vec![record(0, 424900.0)];
        for r in &mut records {
            r.geometry = MultiPolygon::new(vec![polygon![
                (x: 424900.0, y: 4512500.0),
                (x: 424910.0, y: 4512500.0),
                (x: 424910.0, y: 4512510.0),
                (x: 424900.0, y: 4512500.0),
            ]]);
        }
        let rasters = RasterSet::new(PercentLayer::new(Box::new(ExpectAlbers), ValueUnits::Percent));

        aggregate(&mut records, &rasters, 26912, true).unwrap();
        assert_eq!(records[0].imp_mean, Some(60.0));
    }
}
