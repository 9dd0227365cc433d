//! Explication courte du classement (`why_top`)

use serde::Serialize;

use crate::quantile::quantile;
use crate::types::BuildingRecord;

/// P85 de la surface et de l'imperméabilisation du lot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExplainThresholds {
    pub area_p85: Option<f64>,
    pub imp_p85: Option<f64>,
}

impl ExplainThresholds {
    pub fn from_records(records: &[BuildingRecord]) -> Self {
        Self {
            area_p85: quantile(records.iter().map(|r| Some(r.roof_area_m2)), 0.85),
            imp_p85: quantile(records.iter().map(|r| r.imp_mean), 0.85),
        }
    }

    pub fn explain(&self, area: f64, imp_mean: Option<f64>) -> String {
        let size = if self.area_p85.is_some_and(|p| area >= p) {
            "large roof"
        } else {
            "smaller roof"
        };
        let context = match (imp_mean, self.imp_p85) {
            (Some(imp), Some(p)) if imp >= p => "high impervious context",
            _ => "moderate/low impervious context",
        };
        format!("{}; {}", size, context)
    }

    pub fn apply(&self, record: &mut BuildingRecord) {
        record.why_top = Some(self.explain(record.roof_area_m2, record.imp_mean));
    }
}
