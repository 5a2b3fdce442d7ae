//! Mandate Game Engine
//!
//! Platform-agnostic decision core for the Mandate city-governance game.
//! Scenarios are drawn without replacement, each choice moves three stats,
//! approval follows their average and four ending pages close the run.
//! Rendering, input and asset loading belong to the host.

pub mod banding;
pub mod config;
pub mod constants;
pub mod data;
pub mod endings;
pub mod error;
pub mod numbers;
pub mod result;
pub mod rng;
pub mod run;
pub mod seed;
pub mod selector;
pub mod stats;

use std::sync::Arc;

// Re-export commonly used types
pub use banding::{Thresholds, band, band_strided};
pub use config::RunConfig;
pub use data::{
    Choice, ChoiceDelta, ContentStore, EndingEntry, EndingsTable, Scenario, ScenarioSet,
    choice_label,
};
pub use endings::{EndingPage, EndingResolver, EndingStep};
pub use error::{ContentFormatError, RunConfigError, RunError};
pub use result::RunSummary;
pub use rng::RngBundle;
pub use run::{
    ChoiceView, DecisionRecord, RunController, RunPhase, RunState, TurnOutcome, TurnView,
};
pub use seed::{
    decode_to_seed, encode_friendly, generate_code_from_entropy, replay_code, replay_token,
};
pub use selector::ScenarioSelector;
pub use stats::{Stat, StatTable, StatVector};

/// Trait for abstracting content loading operations
/// Platform-specific implementations should provide this
pub trait ContentLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a named scenario set
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario set cannot be found, read or parsed.
    fn load_scenario_set(&self, name: &str) -> Result<ScenarioSet, Self::Error>;

    /// Load the ending tables
    ///
    /// # Errors
    ///
    /// Returns an error if the endings cannot be read or parsed.
    fn load_endings(&self) -> Result<EndingsTable, Self::Error>;
}

/// Loader serving the content compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledContent;

impl ContentLoader for BundledContent {
    type Error = ContentFormatError;

    fn load_scenario_set(&self, name: &str) -> Result<ScenarioSet, Self::Error> {
        log::debug!("loading bundled scenario set `{name}`");
        ContentStore::bundled().map(|store| store.scenarios)
    }

    fn load_endings(&self) -> Result<EndingsTable, Self::Error> {
        ContentStore::bundled().map(|store| store.endings)
    }
}

/// Error raised while creating a run from loaded content.
#[derive(Debug, thiserror::Error)]
pub enum EngineError<E: std::error::Error + 'static> {
    #[error("failed to load content: {0}")]
    Content(#[source] E),
    #[error(transparent)]
    Config(#[from] RunConfigError),
}

/// Main game engine for creating runs over loaded content
pub struct GameEngine<L>
where
    L: ContentLoader,
{
    loader: L,
}

impl<L> GameEngine<L>
where
    L: ContentLoader,
{
    /// Create a new game engine with the provided content loader
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load the named scenario set together with the endings.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if either document cannot be loaded.
    pub fn load_content(&self, scenario_set: &str) -> Result<Arc<ContentStore>, L::Error> {
        let scenarios = self.loader.load_scenario_set(scenario_set)?;
        let endings = self.loader.load_endings()?;
        Ok(Arc::new(ContentStore::new(scenarios, endings)))
    }

    /// Create a run controller in the menu phase.
    ///
    /// # Errors
    ///
    /// Returns an error if content cannot be loaded or `config` is invalid.
    pub fn create_run(
        &self,
        scenario_set: &str,
        seed: u64,
        config: RunConfig,
    ) -> Result<RunController, EngineError<L::Error>> {
        let content = self
            .load_content(scenario_set)
            .map_err(EngineError::Content)?;
        Ok(RunController::new(content, config, seed)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl ContentLoader for FixtureLoader {
        type Error = Infallible;

        fn load_scenario_set(&self, _name: &str) -> Result<ScenarioSet, Self::Error> {
            let scenarios = (1..=3)
                .map(|id| Scenario {
                    id,
                    text: format!("fixture {id}"),
                    icon: String::new(),
                    choices: smallvec![
                        Choice {
                            text: "yes".to_string(),
                            delta: ChoiceDelta::new(10, -5, 3),
                        },
                        Choice {
                            text: "no".to_string(),
                            delta: ChoiceDelta::default(),
                        },
                    ],
                })
                .collect();
            Ok(ScenarioSet::from_scenarios(scenarios))
        }

        fn load_endings(&self) -> Result<EndingsTable, Self::Error> {
            Ok(EndingsTable {
                approval: vec![EndingEntry::new("a")],
                efficiency: vec![EndingEntry::new("e")],
                environment: vec![EndingEntry::new("v")],
                finance: vec![EndingEntry::new("f")],
            })
        }
    }

    #[test]
    fn engine_creates_runs_in_menu() {
        let engine = GameEngine::new(FixtureLoader);
        let mut run = engine
            .create_run("fixture", 9, RunConfig::default().with_max_choices(3))
            .unwrap();
        assert_eq!(run.phase(), RunPhase::Menu);
        run.start().unwrap();
        assert_eq!(run.content().scenarios.len(), 3);
        assert_eq!(run.current_turn().unwrap().choices.len(), 2);
    }

    #[test]
    fn engine_rejects_invalid_config() {
        let engine = GameEngine::new(FixtureLoader);
        let err = engine
            .create_run("fixture", 9, RunConfig::default().with_max_choices(0))
            .err()
            .expect("config rejected");
        assert!(matches!(err, EngineError::Config(RunConfigError::NoChoices)));
    }

    #[test]
    fn bundled_content_includes_bonus_scenario() {
        let store = GameEngine::new(BundledContent)
            .load_content("default")
            .unwrap();
        assert!(store.scenarios.len() >= 12);
        assert!(
            store
                .scenarios
                .scenarios
                .iter()
                .any(Scenario::is_bonus_trigger)
        );
        assert_eq!(store.endings.band_counts(), StatTable::uniform(3));
    }
}
