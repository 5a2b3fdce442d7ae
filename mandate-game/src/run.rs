//! Run controller: one playthrough from setup to the last ending page.
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::RunConfig;
use crate::data::{ChoiceDelta, ContentStore, Scenario, choice_label};
use crate::endings::{EndingContext, EndingPage, EndingResolver, EndingStep};
use crate::error::{RunConfigError, RunError};
use crate::numbers::gauge_fraction;
use crate::result::RunSummary;
use crate::rng::RngBundle;
use crate::selector::ScenarioSelector;
use crate::stats::{StatTable, StatVector};

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    /// Waiting for a run to start.
    Menu,
    /// A scenario is on screen awaiting a choice.
    Deciding,
    /// Decisions are done; ending pages are being shown.
    Endings,
}

/// Mutable per-run state, reset wholesale at every start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    selector: ScenarioSelector,
    current: Option<usize>,
    choices_made: u32,
    bonus_pending: bool,
    bonus_triggered: bool,
    endings: EndingResolver,
}

impl RunState {
    fn new(scenario_count: usize) -> Self {
        Self {
            selector: ScenarioSelector::with_count(scenario_count),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn choices_made(&self) -> u32 {
        self.choices_made
    }

    #[must_use]
    pub fn scenarios_remaining(&self) -> usize {
        self.selector.remaining()
    }

    /// The bonus scenario appeared and the bonus background has not been drawn yet.
    #[must_use]
    pub const fn bonus_pending(&self) -> bool {
        self.bonus_pending
    }

    /// The bonus scenario appeared at some point this run.
    #[must_use]
    pub const fn bonus_triggered(&self) -> bool {
        self.bonus_triggered
    }

    #[must_use]
    pub const fn pages_shown(&self) -> u8 {
        self.endings.pages_shown()
    }
}

/// A labelled choice as presented to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceView<'a> {
    pub index: usize,
    pub label: char,
    pub text: &'a str,
    pub delta: ChoiceDelta,
}

/// Everything a display sink needs to render the current decision.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnView<'a> {
    /// One-based turn number.
    pub turn: u32,
    pub max_choices: u32,
    pub scenario: &'a Scenario,
    pub choices: Vec<ChoiceView<'a>>,
    pub stats: StatVector,
    /// Live background index per stat.
    pub live_bands: StatTable<usize>,
    /// Stat values scaled for gauges (`value / 100`).
    pub gauges: StatTable<f32>,
}

/// A decision that was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub turn: u32,
    pub scenario_id: u32,
    pub choice_index: usize,
    pub choice_label: char,
    pub delta: ChoiceDelta,
    pub approval_after: i32,
}

/// Result of a successful [`RunController::submit_choice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub decision: DecisionRecord,
    /// The run moved to the ending pages.
    pub run_complete: bool,
}

/// Orchestrates selector, stats and endings across one run.
#[derive(Debug, Clone)]
pub struct RunController {
    content: Arc<ContentStore>,
    config: RunConfig,
    rng: RngBundle,
    phase: RunPhase,
    stats: StatVector,
    state: RunState,
    history: Vec<DecisionRecord>,
    pages: Vec<EndingPage>,
}

impl RunController {
    /// Create a controller in the menu phase.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(
        content: Arc<ContentStore>,
        config: RunConfig,
        seed: u64,
    ) -> Result<Self, RunConfigError> {
        config.validate()?;
        Ok(Self {
            content,
            config,
            rng: RngBundle::from_user_seed(seed),
            phase: RunPhase::Menu,
            stats: StatVector::default(),
            state: RunState::default(),
            history: Vec::new(),
            pages: Vec::new(),
        })
    }

    /// Reset every piece of run state and show the first scenario.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::ExhaustedPool`] if the content holds no scenarios;
    /// the controller stays in the menu.
    pub fn start(&mut self) -> Result<(), RunError> {
        self.phase = RunPhase::Menu;
        self.stats = StatVector::default();
        self.state = RunState::new(self.content.scenarios.len());
        self.history.clear();
        self.pages.clear();
        self.draw_next()?;
        self.phase = RunPhase::Deciding;
        log::info!(
            "run started | seed {} | {} scenarios | {} decisions",
            self.rng.seed(),
            self.content.scenarios.len(),
            self.config.max_choices
        );
        Ok(())
    }

    /// Abandon the current run and start a new one.
    ///
    /// # Errors
    ///
    /// See [`RunController::start`].
    pub fn restart(&mut self) -> Result<(), RunError> {
        self.start()
    }

    /// Replace the RNG streams; takes effect from the next draw.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = RngBundle::from_user_seed(seed);
    }

    /// Apply the choice at `index` on the current scenario.
    ///
    /// # Errors
    ///
    /// Rejected calls leave every piece of state untouched:
    /// - [`RunError::NotDeciding`] outside the decision phase,
    /// - [`RunError::InvalidChoice`] for an out-of-range index,
    /// - [`RunError::ExhaustedPool`] if another scenario is needed but none remain.
    pub fn submit_choice(&mut self, index: usize) -> Result<TurnOutcome, RunError> {
        let content = Arc::clone(&self.content);
        let Some(scenario) = self.current_scenario_in(&content) else {
            log::warn!("choice {index} rejected in {:?}", self.phase);
            return Err(RunError::NotDeciding { phase: self.phase });
        };
        let Some(choice) = scenario.choices.get(index) else {
            log::warn!(
                "choice {index} rejected: scenario {} offers {}",
                scenario.id,
                scenario.choices.len()
            );
            return Err(RunError::InvalidChoice {
                index,
                available: scenario.choices.len(),
            });
        };

        let turn = self.state.choices_made + 1;
        let run_complete = turn >= self.config.max_choices;
        if !run_complete && self.state.selector.is_exhausted() {
            log::warn!("turn {turn} needs a scenario but the pool is empty");
            return Err(RunError::ExhaustedPool {
                drawn: self.state.selector.drawn(),
            });
        }

        self.stats.apply_choice(&choice.delta);
        self.state.choices_made = turn;
        let decision = DecisionRecord {
            turn,
            scenario_id: scenario.id,
            choice_index: index,
            choice_label: choice_label(index).unwrap_or('?'),
            delta: choice.delta,
            approval_after: self.stats.approval(),
        };
        log::debug!(
            "turn {turn} | scenario {} choice {} | stats {:?}",
            scenario.id,
            decision.choice_label,
            self.stats
        );
        self.history.push(decision.clone());

        if run_complete {
            self.state.current = None;
            self.phase = RunPhase::Endings;
            log::info!("decisions complete after {turn} turns, showing endings");
        } else {
            self.draw_next()?;
        }

        Ok(TurnOutcome {
            decision,
            run_complete,
        })
    }

    /// Produce the next ending page, or return to the menu after the last one.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::NotInEndings`] unless decisions are finished.
    pub fn request_next_ending_page(&mut self) -> Result<EndingStep, RunError> {
        if self.phase != RunPhase::Endings {
            log::warn!("ending page requested in {:?}", self.phase);
            return Err(RunError::NotInEndings { phase: self.phase });
        }
        let ctx = EndingContext {
            stats: &self.stats,
            endings: &self.content.endings,
            thresholds: &self.config.thresholds,
        };
        let step = self
            .state
            .endings
            .resolve_next(ctx, &mut self.state.bonus_pending, self.rng.ending());
        match &step {
            EndingStep::Page(page) => self.pages.push(page.clone()),
            EndingStep::ReturnToMenu => self.return_to_menu(),
        }
        Ok(step)
    }

    /// The decision currently on screen.
    #[must_use]
    pub fn current_turn(&self) -> Option<TurnView<'_>> {
        let scenario = self.current_scenario_in(&self.content)?;
        let choices = scenario
            .choices
            .iter()
            .enumerate()
            .map(|(index, choice)| ChoiceView {
                index,
                label: choice_label(index).unwrap_or('?'),
                text: choice.text.as_str(),
                delta: choice.delta,
            })
            .collect();
        Some(TurnView {
            turn: self.state.choices_made + 1,
            max_choices: self.config.max_choices,
            scenario,
            choices,
            stats: self.stats,
            live_bands: self.live_bands(),
            gauges: StatTable::from_fn(|stat| gauge_fraction(self.stats.get(stat))),
        })
    }

    /// Live background index per stat for the current values.
    #[must_use]
    pub fn live_bands(&self) -> StatTable<usize> {
        self.config
            .live_sprites
            .map(|stat, sprites| self.config.thresholds.live_band(self.stats.get(stat), *sprites))
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_run(self)
    }

    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    #[must_use]
    pub const fn stats(&self) -> &StatVector {
        &self.stats
    }

    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    #[must_use]
    pub fn history(&self) -> &[DecisionRecord] {
        &self.history
    }

    #[must_use]
    pub fn pages(&self) -> &[EndingPage] {
        &self.pages
    }

    fn current_scenario_in<'c>(&self, content: &'c ContentStore) -> Option<&'c Scenario> {
        if self.phase != RunPhase::Deciding {
            return None;
        }
        self.state
            .current
            .and_then(|index| content.scenarios.get(index))
    }

    fn draw_next(&mut self) -> Result<(), RunError> {
        let (index, scenario) = self
            .state
            .selector
            .next(&self.content.scenarios, self.rng.selection())?;
        if scenario.is_bonus_trigger() {
            log::debug!("bonus scenario {} drawn", scenario.id);
            self.state.bonus_pending = true;
            self.state.bonus_triggered = true;
        }
        self.state.current = Some(index);
        Ok(())
    }

    fn return_to_menu(&mut self) {
        self.phase = RunPhase::Menu;
        self.state.bonus_pending = false;
        self.state.current = None;
        log::info!("run finished, back to menu");
    }
}
