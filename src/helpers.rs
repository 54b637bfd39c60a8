//! Shared numeric helpers.
//!
//! Summary tiles are displayed with one decimal place. Nothing is stored, so
//! plain f64 rounding is enough; records keep full f64 precision so exports
//! can be re-processed without drift.

/// Round an f64 to 1 decimal place for display.
///
/// Returns 0.0 for non-finite inputs (NaN, ±Inf).
pub(crate) fn round_1dp(v: f64) -> f64 {
    if !v.is_finite() {
        tracing::warn!("round_1dp received non-finite value {}, defaulting to 0", v);
        return 0.0;
    }
    (v * 10.0).round() / 10.0
}

/// Arithmetic mean, or `None` for an empty iterator.
pub(crate) fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
