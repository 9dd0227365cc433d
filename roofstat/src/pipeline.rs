//! Orchestration du screening en deux passes
//!
//! Passe 1: chargement, agrégation, calcul des seuils du lot (figés).
//! Passe 2: score, QA, niveau et explication pour chaque bâtiment.

use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{aggregate, LayerCoverage, RasterSet};
use crate::classify::{QaRules, TierThresholds};
use crate::explain::ExplainThresholds;
use crate::loader::project_to_working;
use crate::quantile::quantile;
use crate::score::Normalizer;
use crate::types::{BuildingRecord, FootprintCollection};
use crate::{Result, ScreeningError};

/// Paramètres d'un run
#[derive(Debug, Clone)]
pub struct ScreeningSettings {
    /// CRS métrique dans lequel les surfaces sont calculées
    pub working_epsg: u32,
    pub all_touched: bool,
    pub qa_rules: QaRules,
}

impl Default for ScreeningSettings {
    fn default() -> Self {
        Self {
            working_epsg: 26912,
            all_touched: true,
            qa_rules: QaRules::default(),
        }
    }
}

/// Quantiles du lot, calculés une fois avant toute classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchThresholds {
    pub area_p95: f64,
    pub area_p85: Option<f64>,
    pub imp_p85: Option<f64>,
    pub score_q50: Option<f64>,
    pub score_q85: Option<f64>,
}

impl BatchThresholds {
    pub fn tiers(&self) -> TierThresholds {
        TierThresholds {
            q50: self.score_q50,
            q85: self.score_q85,
        }
    }

    pub fn explain(&self) -> ExplainThresholds {
        ExplainThresholds {
            area_p85: self.area_p85,
            imp_p85: self.imp_p85,
        }
    }
}

/// Résultat d'un screening
#[derive(Debug, Clone)]
pub struct Screening {
    /// Un enregistrement par emprise, dans l'ordre d'entrée
    pub records: Vec<BuildingRecord>,
    pub thresholds: BatchThresholds,
    pub coverage: Vec<LayerCoverage>,
    pub working_epsg: u32,
}

impl Screening {
    /// Nombre de bâtiments sans échantillon d'imperméabilisation
    pub fn unsampled(&self) -> usize {
        self.records.iter().filter(|r| r.imp_mean.is_none()).count()
    }
}

/// Calcule les seuils sur des enregistrements déjà agrégés
fn freeze_thresholds(records: &[BuildingRecord]) -> (Normalizer, BatchThresholds) {
    let area_p95 = quantile(records.iter().map(|r| Some(r.roof_area_m2)), 0.95).unwrap_or(0.0);
    let normalizer = Normalizer::new(area_p95);

    let scores: Vec<Option<f64>> = records
        .iter()
        .map(|r| normalizer.score(r.roof_area_m2, r.imp_mean))
        .collect();
    let tiers = TierThresholds::from_scores(scores.iter().copied());
    let explain = ExplainThresholds::from_records(records);

    let thresholds = BatchThresholds {
        area_p95,
        area_p85: explain.area_p85,
        imp_p85: explain.imp_p85,
        score_q50: tiers.q50,
        score_q85: tiers.q85,
    };
    (normalizer, thresholds)
}

/// Score, QA, niveau et explication (passe 2)
pub fn classify_records(
    records: &mut [BuildingRecord],
    settings: &ScreeningSettings,
) -> BatchThresholds {
    let (normalizer, thresholds) = freeze_thresholds(records);
    debug!(?thresholds, "Batch thresholds frozen");

    let tiers = thresholds.tiers();
    let explain = thresholds.explain();
    for record in records.iter_mut() {
        record.score = normalizer.score(record.roof_area_m2, record.imp_mean);
        settings.qa_rules.apply(record);
        tiers.apply(record);
        explain.apply(record);
    }
    thresholds
}

/// Exécute le screening complet d'une collection d'emprises
pub fn screen(
    collection: FootprintCollection,
    rasters: &RasterSet,
    settings: &ScreeningSettings,
) -> Result<Screening> {
    if collection.footprints.is_empty() {
        return Err(ScreeningError::EmptyBatch);
    }

    // Valide aussi le CRS de travail
    let mut records = project_to_working(collection, settings.working_epsg)?;
    let coverage = aggregate(
        &mut records,
        rasters,
        settings.working_epsg,
        settings.all_touched,
    )?;
    let thresholds = classify_records(&mut records, settings);

    info!(
        buildings = records.len(),
        area_p95 = thresholds.area_p95,
        "Screening complete"
    );

    Ok(Screening {
        records,
        thresholds,
        coverage,
        working_epsg: settings.working_epsg,
    })
}
