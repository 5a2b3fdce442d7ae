//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

use crate::constants::GAUGE_SCALE;

/// Stat value as a display gauge fraction (`value / 100`), unclamped.
#[must_use]
pub fn gauge_fraction(value: i32) -> f32 {
    clamp_f64_to_f32(f64::from(value) / GAUGE_SCALE)
}

/// Clamp a f64 to the f32 range and downcast, returning 0.0 for non-finite values.
#[must_use]
pub fn clamp_f64_to_f32(value: f64) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    let min = cast::<f32, f64>(f32::MIN).unwrap_or(f64::MIN);
    let max = cast::<f32, f64>(f32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max);
    cast::<f64, f32>(clamped).unwrap_or(0.0)
}

/// Share of `part` in `whole` as f64, 0.0 when `whole` is zero.
#[must_use]
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let part = cast::<usize, f64>(part).unwrap_or(0.0);
    let whole = cast::<usize, f64>(whole).unwrap_or(1.0);
    part / whole
}
