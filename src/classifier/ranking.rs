use crate::{Error, Result};

/// Number of ranked alternatives returned alongside the top prediction.
pub const TOP_K: usize = 3;

/// Returns the `k` highest-scoring `(index, score)` pairs, best first.
///
/// The sort is stable, so equal scores keep ascending index order and the
/// first entry is always the lowest index among the maxima.
pub fn top_k(scores: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
    if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
        return Err(Error::inference(format!(
            "model produced a non-finite score at index {}",
            index
        )));
    }

    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);
    Ok(ranked)
}

/// Converts a probability to a percentage rounded to two decimals.
///
/// Exact halves round to the even digit, so `0.03125` gives `3.12`.
pub fn to_percentage(score: f32) -> f64 {
    (f64::from(score) * 100.0 * 100.0).round_ties_even() / 100.0
}
