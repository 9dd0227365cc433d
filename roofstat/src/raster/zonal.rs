//! Statistiques zonales sur une grille en mémoire

use geo::{BoundingRect, Contains, Intersects, MultiPolygon, Point, Relate};

use super::{GridRaster, ZonalSampler};
use crate::types::Statistic;
use crate::Result;

impl GridRaster {
    /// Valeurs valides des cellules retenues pour un polygone.
    ///
    /// En mode all_touched, une cellule est retenue si l'intérieur du polygone
    /// la pénètre: un simple contact par un bord ou un coin ne suffit pas.
    fn covered_values(&self, polygon: &MultiPolygon, all_touched: bool) -> Vec<f64> {
        let Some(bounds) = polygon.bounding_rect() else {
            return Vec::new();
        };
        let Some((cols, rows)) = self.transform.window(bounds, self.width, self.height) else {
            return Vec::new();
        };

        let mut values = Vec::new();
        for row in rows {
            for col in cols.clone() {
                let Some(v) = self.valid(col, row) else {
                    continue;
                };
                let covered = if all_touched {
                    let cell = self.transform.cell_rect(col, row).to_polygon();
                    polygon.intersects(&cell) && !polygon.relate(&cell).is_touches()
                } else {
                    let center = Point::from(self.transform.cell_center(col, row));
                    polygon.0.iter().any(|p| p.contains(&center))
                };
                if covered {
                    values.push(v);
                }
            }
        }
        values
    }
}

/// Moyenne arithmétique
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Valeur la plus fréquente; à égalité, la plus petite
fn majority(values: &mut [f64]) -> Option<f64> {
    values.sort_by(|a, b| a.total_cmp(b));

    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < values.len() {
        let v = values[i];
        let run = values[i..].iter().take_while(|&&x| x == v).count();
        if best.map_or(true, |(_, count)| run > count) {
            best = Some((v, run));
        }
        i += run;
    }
    best.map(|(v, _)| v)
}

impl ZonalSampler for GridRaster {
    fn epsg(&self) -> u32 {
        self.epsg
    }

    fn sample(
        &self,
        polygons: &[MultiPolygon],
        statistic: Statistic,
        all_touched: bool,
    ) -> Result<Vec<Option<f64>>> {
        Ok(polygons
            .iter()
            .map(|polygon| {
                let mut values = self.covered_values(polygon, all_touched);
                match statistic {
                    Statistic::Mean => mean(&values),
                    Statistic::Majority => majority(&mut values),
                }
            })
            .collect())
    }
}
