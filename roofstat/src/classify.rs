//! Contrôle qualité et attribution des niveaux de priorité

use serde::Serialize;

use crate::quantile::quantile;
use crate::types::{BuildingRecord, QaFlag, Tier};

/// Canopée moyenne au-delà de laquelle l'emprise est douteuse (%)
pub const CANOPY_REVIEW_THRESHOLD: f64 = 25.0;

/// Imperméabilisation en dessous de laquelle l'emprise est douteuse (%)
pub const LOW_IMPERVIOUS_THRESHOLD: f64 = 20.0;

/// Classes NLCD incompatibles avec un toit: eau, arbustes, zones humides
pub const DEFAULT_NON_BUILDABLE_CODES: [i64; 4] = [11, 52, 90, 95];

/// Règles QA évaluées dans l'ordre; la première qui s'applique gagne
#[derive(Debug, Clone)]
pub struct QaRules {
    non_buildable_codes: Vec<i64>,
}

impl Default for QaRules {
    fn default() -> Self {
        Self::new(DEFAULT_NON_BUILDABLE_CODES.to_vec())
    }
}

impl QaRules {
    pub fn new(non_buildable_codes: Vec<i64>) -> Self {
        Self { non_buildable_codes }
    }

    pub fn non_buildable_codes(&self) -> &[i64] {
        &self.non_buildable_codes
    }

    pub fn evaluate(&self, imp_mean: Option<f64>, canopy_mean: Option<f64>, lc_major: Option<i64>) -> QaFlag {
        let Some(imp) = imp_mean else {
            return QaFlag::NoImperviousSample;
        };
        if canopy_mean.is_some_and(|c| c > CANOPY_REVIEW_THRESHOLD) {
            return QaFlag::CanopyInsideFootprint;
        }
        if lc_major.is_some_and(|lc| self.non_buildable_codes.contains(&lc)) {
            return QaFlag::LandCover;
        }
        if imp < LOW_IMPERVIOUS_THRESHOLD {
            return QaFlag::LowImpervious;
        }
        QaFlag::Ok
    }

    pub fn apply(&self, record: &mut BuildingRecord) {
        record.qa_flag = Some(self.evaluate(record.imp_mean, record.canopy_mean, record.lc_major));
    }
}

/// Seuils de score figés sur le lot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierThresholds {
    pub q50: Option<f64>,
    pub q85: Option<f64>,
}

impl TierThresholds {
    /// Médiane et P85 des scores définis
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>> + Clone,
    {
        Self {
            q50: quantile(scores.clone(), 0.50),
            q85: quantile(scores, 0.85),
        }
    }

    /// High exige un QA `ok`; un score indéfini donne Low
    pub fn tier(&self, score: Option<f64>, qa: QaFlag) -> Tier {
        let Some(score) = score else {
            return Tier::Low;
        };
        if qa == QaFlag::Ok && self.q85.is_some_and(|q| score >= q) {
            Tier::High
        } else if self.q50.is_some_and(|q| score >= q) {
            Tier::Medium
        } else {
            Tier::Low
        }
    }

    pub fn apply(&self, record: &mut BuildingRecord) {
        let qa = record.qa_flag.unwrap_or(QaFlag::NoImperviousSample);
        record.tier = Some(self.tier(record.score, qa));
    }
}
