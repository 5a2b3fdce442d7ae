pub mod assets;
pub mod playability;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use assets::TesterAssets;
pub use playability::{
    PlayabilityAggregate, PlayabilityRecord, aggregate_playability, run_playability_analysis,
    validate_playability_targets,
};
pub use policy::GameplayStrategy;
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use simulation::{GameTester, SimulationPlan, SimulationSummary};
pub use tester::*;
