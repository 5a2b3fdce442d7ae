use std::fmt;

use mandate_game::{ChoiceView, StatVector, TurnView};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub choice_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub const fn new(choice_index: usize, rationale: Option<String>) -> Self {
        Self {
            choice_index,
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select a choice for the scenario on screen.
    fn pick_choice(&mut self, view: &TurnView<'_>) -> PolicyDecision;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameplayStrategy {
    /// Keep the weakest stat as high as possible.
    Balanced,
    /// Chase efficiency.
    Growth,
    /// Chase environment.
    Green,
    /// Chase finance.
    Thrifty,
    /// Coin flip per decision.
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 5] = [
        Self::Balanced,
        Self::Growth,
        Self::Green,
        Self::Thrifty,
        Self::Random,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Growth => "Growth",
            Self::Green => "Green",
            Self::Thrifty => "Thrifty",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Growth => Box::new(FocusPolicy::new("Growth", |c| c.delta.efficiency)),
            Self::Green => Box::new(FocusPolicy::new("Green", |c| c.delta.environment)),
            Self::Thrifty => Box::new(FocusPolicy::new("Thrifty", |c| c.delta.finance)),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct BalancedPolicy;

struct FocusPolicy {
    name: &'static str,
    focus: fn(&ChoiceView<'_>) -> i32,
}

impl FocusPolicy {
    const fn new(name: &'static str, focus: fn(&ChoiceView<'_>) -> i32) -> Self {
        Self { name, focus }
    }
}

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_choice(&mut self, view: &TurnView<'_>) -> PolicyDecision {
        let (idx, floor) = view
            .choices
            .iter()
            .map(|choice| (choice.index, weakest_stat(&view.stats.projected(&choice.delta))))
            .max_by_key(|(idx, floor)| (*floor, std::cmp::Reverse(*idx)))
            .unwrap_or((0, 0));

        PolicyDecision::new(idx, Some(format!("floor {floor}")))
    }
}

impl PlayerPolicy for FocusPolicy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn pick_choice(&mut self, view: &TurnView<'_>) -> PolicyDecision {
        let (idx, gain) = view
            .choices
            .iter()
            .map(|choice| (choice.index, (self.focus)(choice), choice.delta.total()))
            .max_by_key(|(idx, gain, total)| (*gain, *total, std::cmp::Reverse(*idx)))
            .map_or((0, 0), |(idx, gain, _)| (idx, gain));

        PolicyDecision::new(idx, Some(format!("gain {gain}")))
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_choice(&mut self, view: &TurnView<'_>) -> PolicyDecision {
        if view.choices.is_empty() {
            return PolicyDecision::new(0, Some("no choices".to_string()));
        }
        let idx = self.rng.gen_range(0..view.choices.len());
        PolicyDecision::new(idx, None)
    }
}

fn weakest_stat(stats: &StatVector) -> i32 {
    stats
        .as_table()
        .iter()
        .map(|(_, value)| *value)
        .min()
        .unwrap_or_default()
}
