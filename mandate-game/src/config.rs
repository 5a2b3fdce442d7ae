//! Run configuration consumed by the controller.
use serde::{Deserialize, Serialize};

use crate::banding::Thresholds;
use crate::constants::{DEFAULT_LIVE_SPRITES, DEFAULT_MAX_CHOICES};
use crate::error::RunConfigError;
use crate::stats::StatTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Decisions per run.
    #[serde(default = "RunConfig::default_max_choices")]
    pub max_choices: u32,
    /// Shared ascending threshold array (live and ending views).
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Background sprites per stat for live banding.
    #[serde(default = "RunConfig::default_live_sprites")]
    pub live_sprites: StatTable<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_choices: Self::default_max_choices(),
            thresholds: Thresholds::default(),
            live_sprites: Self::default_live_sprites(),
        }
    }
}

impl RunConfig {
    const fn default_max_choices() -> u32 {
        DEFAULT_MAX_CHOICES
    }

    const fn default_live_sprites() -> StatTable<usize> {
        StatTable::uniform(DEFAULT_LIVE_SPRITES)
    }

    #[must_use]
    pub const fn with_max_choices(mut self, max_choices: u32) -> Self {
        self.max_choices = max_choices;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Vec<i32>) -> Self {
        self.thresholds = Thresholds::new(thresholds);
        self
    }

    /// # Errors
    ///
    /// Returns the first configuration invariant that does not hold.
    pub fn validate(&self) -> Result<(), RunConfigError> {
        if self.max_choices == 0 {
            return Err(RunConfigError::NoChoices);
        }
        self.thresholds.validate()?;
        let available = self.thresholds.len();
        for (stat, count) in self.live_sprites.iter() {
            if *count == 0 || *count > available {
                return Err(RunConfigError::LiveSprites {
                    stat,
                    count: *count,
                    available,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Stat;

    #[test]
    fn missing_fields_use_defaults() {
        let cfg: RunConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(cfg, RunConfig::default());
        cfg.validate().expect("defaults are valid");
        assert_eq!(cfg.max_choices, 12);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg: RunConfig =
            serde_json::from_str(r#"{"max_choices": 2, "thresholds": [0, 30, 70]}"#).unwrap();
        assert_eq!(cfg.max_choices, 2);
        assert_eq!(cfg.thresholds.as_slice(), &[0, 30, 70]);
        assert_eq!(cfg.live_sprites, StatTable::uniform(3));
        cfg.validate().unwrap();
    }

    #[test]
    fn validation_catches_each_invariant() {
        assert_eq!(
            RunConfig::default().with_max_choices(0).validate(),
            Err(RunConfigError::NoChoices)
        );
        assert!(matches!(
            RunConfig::default().with_thresholds(vec![5, 1]).validate(),
            Err(RunConfigError::ThresholdsNotAscending { .. })
        ));
        let cfg = RunConfig {
            live_sprites: StatTable {
                finance: 0,
                ..StatTable::uniform(3)
            },
            ..RunConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(RunConfigError::LiveSprites {
                stat: Stat::Finance,
                ..
            })
        ));
    }
}
