//! Error taxonomy for the decision engine.
use thiserror::Error;

use crate::run::RunPhase;
use crate::stats::Stat;

/// Errors raised while advancing a run. None of them mutate run state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    /// A scenario was requested but every scenario has already been shown.
    #[error("scenario pool exhausted after {drawn} draws")]
    ExhaustedPool { drawn: usize },
    /// The submitted choice index does not exist on the current scenario.
    #[error("choice {index} is out of range (scenario offers {available})")]
    InvalidChoice { index: usize, available: usize },
    /// A choice was submitted while no scenario is awaiting a decision.
    #[error("no decision pending (run is in {phase:?})")]
    NotDeciding { phase: RunPhase },
    /// An ending page was requested before the decisions were finished.
    #[error("ending pages unavailable (run is in {phase:?})")]
    NotInEndings { phase: RunPhase },
}

/// Malformed content handed over by a content store.
#[derive(Debug, Error)]
pub enum ContentFormatError {
    #[error("content is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("scenario {id} offers {found} choices (expected {expected})")]
    ChoiceCount {
        id: u32,
        found: usize,
        expected: usize,
    },
    #[error("scenario id {id} appears more than once")]
    DuplicateId { id: u32 },
    #[error("no endings configured for {stat}")]
    MissingEndings { stat: Stat },
}

/// Errors raised when run configuration invariants are violated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunConfigError {
    #[error("max_choices must be at least 1")]
    NoChoices,
    #[error("thresholds must be ascending (index {index}: {previous} > {value})")]
    ThresholdsNotAscending {
        index: usize,
        previous: i32,
        value: i32,
    },
    #[error("{stat} live sprite count {count} must be between 1 and {available}")]
    LiveSprites {
        stat: Stat,
        count: usize,
        available: usize,
    },
}
