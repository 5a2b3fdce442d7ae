use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;

use mandate_game::{
    ContentStore, DecisionRecord, EndingPage, EndingStep, RunConfig, RunController, RunError,
    RunPhase, RunSummary, Stat, stats::derive_approval,
};

use super::assets::TesterAssets;
use super::policy::GameplayStrategy;

/// Upper bound on ending requests so a broken resolver cannot spin forever.
const MAX_ENDING_REQUESTS: usize = 16;

/// Parameters of one automated playthrough.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    /// Overrides the configured decision count.
    pub max_choices: Option<u32>,
    /// Sets the decision count to the pool size plus this many.
    pub pool_relative: Option<u32>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            max_choices: None,
            pool_relative: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_choices(mut self, max_choices: u32) -> Self {
        self.max_choices = Some(max_choices);
        self
    }

    /// One decision per scenario in the pool.
    #[must_use]
    pub const fn covering_pool(self) -> Self {
        self.beyond_pool(0)
    }

    /// Ask for `extra` more decisions than the content holds scenarios.
    #[must_use]
    pub const fn beyond_pool(mut self, extra: u32) -> Self {
        self.pool_relative = Some(extra);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    /// # Errors
    ///
    /// Returns the expectation's failure message.
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub config: RunConfig,
    pub content: Arc<ContentStore>,
    /// Scenario ids in the order they were shown.
    pub scenario_ids: Vec<u32>,
    pub decisions: Vec<DecisionRecord>,
    pub pages: Vec<EndingPage>,
    /// Turns on which approval did not match the floored average.
    pub approval_mismatches: Vec<u32>,
    /// Error that stopped the run early, if any.
    pub halted: Option<RunError>,
    /// A choice submitted after the last decision was rejected.
    pub late_choice_rejected: bool,
    /// Requests answered with `ReturnToMenu`.
    pub return_to_menu_count: usize,
    pub final_phase: RunPhase,
    pub result: RunSummary,
}

impl SimulationSummary {
    #[must_use]
    pub fn completed(&self) -> bool {
        self.halted.is_none() && self.return_to_menu_count == 1
    }
}

/// Headless deterministic runner for the decision core.
#[derive(Clone)]
pub struct GameTester {
    verbose: bool,
    assets: Arc<TesterAssets>,
    config: RunConfig,
}

impl GameTester {
    #[must_use]
    pub const fn new(assets: Arc<TesterAssets>, config: RunConfig, verbose: bool) -> Self {
        Self {
            verbose,
            assets,
            config,
        }
    }

    #[must_use]
    pub fn assets(&self) -> &TesterAssets {
        &self.assets
    }

    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    fn plan_config(&self, plan: &SimulationPlan) -> RunConfig {
        let mut config = self.config.clone();
        if let Some(max_choices) = plan.max_choices {
            config.max_choices = max_choices;
        }
        if let Some(extra) = plan.pool_relative {
            let pool = u32::try_from(self.assets.scenario_count()).unwrap_or(u32::MAX);
            config.max_choices = pool.saturating_add(extra);
        }
        config
    }

    /// Play one run to the menu with the plan's strategy.
    ///
    /// # Errors
    ///
    /// Returns an error only if the plan's configuration is invalid; run
    /// errors are recorded in the summary instead.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let config = self.plan_config(plan);
        let content = self.assets.content();
        let mut run = RunController::new(Arc::clone(&content), config.clone(), seed)?;
        let mut policy = plan.strategy.create_policy(seed);

        if self.verbose {
            println!(
                "🎮 Starting simulation | seed:{seed} strategy:{} decisions:{}",
                plan.strategy.label(),
                config.max_choices
            );
        }

        let mut scenario_ids = Vec::new();
        let mut approval_mismatches = Vec::new();
        let mut halted = run.start().err();

        while halted.is_none() {
            let decision = {
                let Some(view) = run.current_turn() else {
                    break;
                };
                scenario_ids.push(view.scenario.id);
                policy.pick_choice(&view)
            };
            match run.submit_choice(decision.choice_index) {
                Ok(outcome) => {
                    let stats = run.stats();
                    let expected = derive_approval(
                        stats.get(Stat::Efficiency),
                        stats.get(Stat::Environment),
                        stats.get(Stat::Finance),
                    );
                    if stats.approval() != expected {
                        approval_mismatches.push(outcome.decision.turn);
                    }
                    if self.verbose {
                        log_decision(&outcome.decision, policy.name(), decision.rationale.as_deref());
                    }
                }
                Err(err) => halted = Some(err),
            }
        }

        let late_choice_rejected = halted.is_none()
            && matches!(
                run.submit_choice(0),
                Err(RunError::NotDeciding {
                    phase: RunPhase::Endings
                })
            );

        let mut return_to_menu_count = 0;
        if halted.is_none() {
            for _ in 0..MAX_ENDING_REQUESTS {
                match run.request_next_ending_page() {
                    Ok(EndingStep::Page(page)) => {
                        if self.verbose {
                            log_page(&page);
                        }
                    }
                    Ok(EndingStep::ReturnToMenu) => return_to_menu_count += 1,
                    Err(_) => break,
                }
            }
        }

        let result = run.summary();
        if self.verbose {
            println!("🏁 {}", result.headline());
        }

        Ok(SimulationSummary {
            seed,
            strategy: plan.strategy,
            config,
            content,
            scenario_ids,
            decisions: run.history().to_vec(),
            pages: run.pages().to_vec(),
            approval_mismatches,
            halted,
            late_choice_rejected,
            return_to_menu_count,
            final_phase: run.phase(),
            result,
        })
    }
}

fn log_decision(decision: &DecisionRecord, policy: &str, rationale: Option<&str>) {
    println!(
        "🎯 Turn {}: scenario {} -> {} ({policy}, {}) approval {}",
        decision.turn,
        decision.scenario_id,
        decision.choice_label,
        rationale.unwrap_or("-"),
        decision.approval_after
    );
}

fn log_page(page: &EndingPage) {
    let line = format!(
        "📜 Page {} {} {} -> band {} [{}]",
        page.page, page.stat, page.value, page.band, page.background
    );
    if page.bonus {
        println!("{}", line.bright_magenta());
    } else {
        println!("{line}");
    }
}
