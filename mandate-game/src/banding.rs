//! Threshold banding shared by live backgrounds and final endings.
//!
//! One ascending threshold array is configured per run. It is read through two
//! views: the live view takes the first `n` entries (one per background sprite),
//! the ending view takes every third entry.
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_THRESHOLDS, ENDING_STRIDE};
use crate::error::RunConfigError;

/// Highest index `i` with `value >= boundaries[i]`, or 0 when none is met.
#[must_use]
pub fn band(value: i32, boundaries: &[i32]) -> usize {
    boundaries
        .iter()
        .enumerate()
        .filter(|(_, boundary)| value >= **boundary)
        .map(|(idx, _)| idx)
        .last()
        .unwrap_or(0)
}

/// Band over every `stride`-th boundary. The index counts sampled boundaries.
#[must_use]
pub fn band_strided(value: i32, boundaries: &[i32], stride: usize) -> usize {
    boundaries
        .iter()
        .step_by(stride.max(1))
        .enumerate()
        .filter(|(_, boundary)| value >= **boundary)
        .map(|(idx, _)| idx)
        .last()
        .unwrap_or(0)
}

/// The configured ascending threshold array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thresholds(Vec<i32>);

impl Default for Thresholds {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLDS.to_vec())
    }
}

impl Thresholds {
    #[must_use]
    pub const fn new(values: Vec<i32>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// # Errors
    ///
    /// Returns [`RunConfigError::ThresholdsNotAscending`] at the first descent.
    pub fn validate(&self) -> Result<(), RunConfigError> {
        for (index, pair) in self.0.windows(2).enumerate() {
            if pair[0] > pair[1] {
                return Err(RunConfigError::ThresholdsNotAscending {
                    index: index + 1,
                    previous: pair[0],
                    value: pair[1],
                });
            }
        }
        Ok(())
    }

    /// Boundaries used for a stat with `sprite_count` live backgrounds.
    #[must_use]
    pub fn live_view(&self, sprite_count: usize) -> &[i32] {
        &self.0[..sprite_count.min(self.0.len())]
    }

    /// Live background index for `value`.
    #[must_use]
    pub fn live_band(&self, value: i32, sprite_count: usize) -> usize {
        band(value, self.live_view(sprite_count))
    }

    /// Ending boundaries: every third threshold.
    pub fn ending_view(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().step_by(ENDING_STRIDE).copied()
    }

    /// Ending band for `value`.
    #[must_use]
    pub fn ending_band(&self, value: i32) -> usize {
        band_strided(value, &self.0, ENDING_STRIDE)
    }
}
