use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;

use crate::constants::{
    BONUS_SCENARIO_ID, CHOICE_ALPHABET, CHOICES_PER_SCENARIO, ENDING_BACKGROUND_PREFIX,
    ENDING_BACKGROUND_TIERS,
};
use crate::error::ContentFormatError;
use crate::stats::{Stat, StatTable};

/// Stat deltas applied when a choice is selected. Approval is derived, never a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChoiceDelta {
    #[serde(default, rename = "Efficiency", alias = "efficiency")]
    pub efficiency: i32,
    #[serde(default, rename = "Environment", alias = "environment")]
    pub environment: i32,
    #[serde(default, rename = "Finance", alias = "finance")]
    pub finance: i32,
}

impl ChoiceDelta {
    #[must_use]
    pub const fn new(efficiency: i32, environment: i32, finance: i32) -> Self {
        Self {
            efficiency,
            environment,
            finance,
        }
    }

    /// Net movement across the three stats.
    #[must_use]
    pub const fn total(&self) -> i32 {
        self.efficiency + self.environment + self.finance
    }
}

/// A choice within a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(rename = "Choice", alias = "text")]
    pub text: String,
    #[serde(flatten)]
    pub delta: ChoiceDelta,
}

/// Label for the choice at `index` (`A`, `B`, ...).
#[must_use]
pub fn choice_label(index: usize) -> Option<char> {
    CHOICE_ALPHABET.get(index).copied()
}

/// A scenario presented to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(rename = "ID", alias = "id")]
    pub id: u32,
    #[serde(rename = "Setup", alias = "text")]
    pub text: String,
    #[serde(default, rename = "Icon", alias = "icon")]
    pub icon: String,
    #[serde(rename = "Decisions", alias = "choices")]
    pub choices: SmallVec<[Choice; CHOICES_PER_SCENARIO]>,
}

impl Scenario {
    /// Whether showing this scenario unlocks the bonus ending.
    #[must_use]
    pub const fn is_bonus_trigger(&self) -> bool {
        self.id == BONUS_SCENARIO_ID
    }
}

/// Ordered list of scenarios making up one content set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScenarioSet {
    #[serde(rename = "Setups", alias = "scenarios")]
    pub scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    /// Create an empty set (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self {
            scenarios: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_scenarios(scenarios: Vec<Scenario>) -> Self {
        Self { scenarios }
    }

    /// Parse and validate a scenario set.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a scenario breaks the content rules.
    pub fn from_json(json: &str) -> Result<Self, ContentFormatError> {
        let set: Self = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    /// Check that ids are unique and every scenario offers exactly two choices.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ContentFormatError> {
        let mut seen = HashSet::with_capacity(self.scenarios.len());
        for scenario in &self.scenarios {
            if scenario.choices.len() != CHOICES_PER_SCENARIO {
                return Err(ContentFormatError::ChoiceCount {
                    id: scenario.id,
                    found: scenario.choices.len(),
                    expected: CHOICES_PER_SCENARIO,
                });
            }
            if !seen.insert(scenario.id) {
                return Err(ContentFormatError::DuplicateId { id: scenario.id });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Scenario> {
        self.scenarios.get(index)
    }
}

/// Ending text for one band, with an optional explicit background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EndingEntryRepr")]
pub struct EndingEntry {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EndingEntryRepr {
    Text(String),
    Full {
        text: String,
        #[serde(default)]
        background: Option<String>,
    },
}

impl From<EndingEntryRepr> for EndingEntry {
    fn from(repr: EndingEntryRepr) -> Self {
        match repr {
            EndingEntryRepr::Text(text) => Self {
                text,
                background: None,
            },
            EndingEntryRepr::Full { text, background } => Self { text, background },
        }
    }
}

impl EndingEntry {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            background: None,
        }
    }

    /// Explicit background, or the stock per-stat background for `band`.
    #[must_use]
    pub fn background_key(&self, stat: Stat, band: usize) -> String {
        self.background
            .clone()
            .unwrap_or_else(|| default_ending_background(stat, band))
    }
}

/// Stock background key for a stat's ending band (`Endings/Backgrounds/FinanceGood`).
#[must_use]
pub fn default_ending_background(stat: Stat, band: usize) -> String {
    let tier = ENDING_BACKGROUND_TIERS
        .get(band)
        .or_else(|| ENDING_BACKGROUND_TIERS.last())
        .copied()
        .unwrap_or_default();
    format!("{ENDING_BACKGROUND_PREFIX}{}{tier}", stat.asset_key())
}

/// Per-stat ending arrays, ordered worst to best.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EndingsTable {
    #[serde(rename = "Approval", alias = "approval")]
    pub approval: Vec<EndingEntry>,
    #[serde(rename = "Efficiency", alias = "efficiency")]
    pub efficiency: Vec<EndingEntry>,
    #[serde(rename = "Environment", alias = "environment", alias = "Envrionment")]
    pub environment: Vec<EndingEntry>,
    #[serde(rename = "Finance", alias = "finance")]
    pub finance: Vec<EndingEntry>,
}

impl EndingsTable {
    /// Parse and validate an endings table.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a stat has no endings.
    pub fn from_json(json: &str) -> Result<Self, ContentFormatError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// # Errors
    ///
    /// Returns [`ContentFormatError::MissingEndings`] for the first stat with no entries.
    pub fn validate(&self) -> Result<(), ContentFormatError> {
        match Stat::ORDER
            .into_iter()
            .find(|stat| self.for_stat(*stat).is_empty())
        {
            Some(stat) => Err(ContentFormatError::MissingEndings { stat }),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn for_stat(&self, stat: Stat) -> &[EndingEntry] {
        match stat {
            Stat::Approval => &self.approval,
            Stat::Efficiency => &self.efficiency,
            Stat::Environment => &self.environment,
            Stat::Finance => &self.finance,
        }
    }

    /// Number of ending bands configured per stat.
    #[must_use]
    pub fn band_counts(&self) -> StatTable<usize> {
        StatTable::from_fn(|stat| self.for_stat(stat).len())
    }
}

const BUNDLED_SCENARIOS: &str = include_str!("../assets/data/scenarios.json");
const BUNDLED_ENDINGS: &str = include_str!("../assets/data/endings.json");

/// Immutable scenario and ending content shared by every run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentStore {
    pub scenarios: ScenarioSet,
    pub endings: EndingsTable,
}

impl ContentStore {
    #[must_use]
    pub const fn new(scenarios: ScenarioSet, endings: EndingsTable) -> Self {
        Self { scenarios, endings }
    }

    /// Content compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled JSON fails to parse or validate.
    pub fn bundled() -> Result<Self, ContentFormatError> {
        Self::from_json(BUNDLED_SCENARIOS, BUNDLED_ENDINGS)
    }

    /// Parse and validate both content documents.
    ///
    /// # Errors
    ///
    /// Returns the first parse or validation failure.
    pub fn from_json(scenarios: &str, endings: &str) -> Result<Self, ContentFormatError> {
        Ok(Self::new(
            ScenarioSet::from_json(scenarios)?,
            EndingsTable::from_json(endings)?,
        ))
    }
}
