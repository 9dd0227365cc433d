//! Quantiles empiriques (interpolation linéaire entre statistiques d'ordre)
//!
//! Méthode dite « type 7 »: position `h = (n - 1) * p`, interpolation entre
//! les valeurs triées encadrant `h`. Les valeurs indéfinies sont ignorées.

/// Quantile `p` (0..=1) des valeurs définies, `None` si aucune
pub fn quantile<I>(values: I, p: f64) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut sorted: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(quantile_sorted(&sorted, p))
}

/// Quantile d'une série déjà triée et non vide
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}
