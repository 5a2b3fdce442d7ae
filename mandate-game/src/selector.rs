//! Scenario selection without replacement.
use rand::Rng;

use crate::data::{Scenario, ScenarioSet};
use crate::error::RunError;

/// Pool of scenario indices not yet shown this run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioSelector {
    remaining: Vec<usize>,
    drawn: usize,
}

impl ScenarioSelector {
    /// Refill the pool with every index in `0..scenario_count`.
    pub fn initialize(&mut self, scenario_count: usize) {
        self.remaining = (0..scenario_count).collect();
        self.drawn = 0;
    }

    #[must_use]
    pub fn with_count(scenario_count: usize) -> Self {
        let mut selector = Self::default();
        selector.initialize(scenario_count);
        selector
    }

    /// Draw one remaining index uniformly and remove it from the pool.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::ExhaustedPool`] when nothing is left to draw.
    pub fn next_index<R: Rng>(&mut self, rng: &mut R) -> Result<usize, RunError> {
        if self.remaining.is_empty() {
            return Err(RunError::ExhaustedPool { drawn: self.drawn });
        }
        let pick = rng.gen_range(0..self.remaining.len());
        let index = self.remaining.remove(pick);
        self.drawn += 1;
        log::debug!(
            "scenario draw | index {index} | {} remaining",
            self.remaining.len()
        );
        Ok(index)
    }

    /// Draw the next scenario from `set`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::ExhaustedPool`] when nothing is left to draw.
    pub fn next<'a, R: Rng>(
        &mut self,
        set: &'a ScenarioSet,
        rng: &mut R,
    ) -> Result<(usize, &'a Scenario), RunError> {
        let drawn = self.drawn;
        let index = self.next_index(rng)?;
        set.get(index)
            .map(|scenario| (index, scenario))
            .ok_or(RunError::ExhaustedPool { drawn })
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    #[must_use]
    pub const fn drawn(&self) -> usize {
        self.drawn
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }
}
