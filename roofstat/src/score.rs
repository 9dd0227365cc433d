//! Score composite de potentiel
//!
//! `score = 60 * surface_normalisée + 40 * imperméabilisation_normalisée`,
//! arrondi au dixième (arrondi bancaire).

/// Poids de la surface de toiture
pub const AREA_WEIGHT: f64 = 60.0;

/// Poids de l'imperméabilisation environnante
pub const IMPERVIOUS_WEIGHT: f64 = 40.0;

/// Normalisation par le P95 des surfaces du lot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    area_p95: f64,
}

impl Normalizer {
    pub fn new(area_p95: f64) -> Self {
        Self { area_p95 }
    }

    pub fn area_p95(&self) -> f64 {
        self.area_p95
    }

    /// `min(surface / P95, 1)`; avec un P95 nul, 1 pour toute surface positive
    pub fn area_norm(&self, area: f64) -> f64 {
        if self.area_p95 > 0.0 {
            (area / self.area_p95).clamp(0.0, 1.0)
        } else if area > 0.0 {
            1.0
        } else {
            0.0
        }
    }

    /// Score d'un bâtiment, `None` sans échantillon d'imperméabilisation
    pub fn score(&self, area: f64, imp_mean: Option<f64>) -> Option<f64> {
        let imp = imp_mean?;
        let raw = AREA_WEIGHT * self.area_norm(area) + IMPERVIOUS_WEIGHT * imp_norm(imp);
        Some(round_tenth(raw))
    }
}

/// Imperméabilisation ramenée dans [0, 1]
pub fn imp_norm(imp_mean: f64) -> f64 {
    (imp_mean / 100.0).clamp(0.0, 1.0)
}

/// Arrondi au dixième, demi vers le pair
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_of_reference_batch() {
        let n = Normalizer::new(950.0);
        assert_eq!(n.score(50.0, Some(10.0)), Some(7.2));
        assert_eq!(n.score(500.0, Some(50.0)), Some(51.6));
        assert_eq!(n.score(1000.0, Some(90.0)), Some(96.0));
    }

    #[test]
    fn test_area_norm_capped() {
        let n = Normalizer::new(100.0);
        assert_eq!(n.area_norm(250.0), 1.0);
        assert_eq!(n.area_norm(25.0), 0.25);
    }

    #[test]
    fn test_zero_p95() {
        let n = Normalizer::new(0.0);
        assert_eq!(n.area_norm(12.0), 1.0);
        assert_eq!(n.area_norm(0.0), 0.0);
    }

    #[test]
    fn test_missing_impervious() {
        assert_eq!(Normalizer::new(10.0).score(5.0, None), None);
    }

    #[test]
    fn test_imp_norm_clamped() {
        assert_eq!(imp_norm(120.0), 1.0);
        assert_eq!(imp_norm(-1.0), 0.0);
    }

    #[test]
    fn test_half_to_even() {
        assert_eq!(round_tenth(0.25), 0.2);
        assert_eq!(round_tenth(0.35), 0.4);
        assert_eq!(round_tenth(51.57), 51.6);
    }
}
