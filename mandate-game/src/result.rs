//! End-of-run summary
use serde::Serialize;

use crate::endings::EndingPage;
use crate::run::{DecisionRecord, RunController, RunPhase};
use crate::seed::{replay_code, replay_token};
use crate::stats::{Stat, StatTable, StatVector};

/// Snapshot of a run suitable for result screens and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    /// Share code that replays this run (`MN-WORD42`); `None` for seeds not minted from a code.
    pub share_code: Option<String>,
    pub phase: RunPhase,
    pub decisions: u32,
    pub final_stats: StatVector,
    /// Ending band per stat for the final stats, capped to the configured entries.
    pub ending_bands: StatTable<usize>,
    pub bonus_triggered: bool,
    pub bonus_shown: bool,
    pub pages: Vec<EndingPage>,
    pub history: Vec<DecisionRecord>,
}

impl RunSummary {
    #[must_use]
    pub fn from_run(run: &RunController) -> Self {
        let stats = *run.stats();
        let thresholds = &run.config().thresholds;
        let counts = run.content().endings.band_counts();
        let ending_bands = StatTable::from_fn(|stat| {
            thresholds
                .ending_band(stats.get(stat))
                .min(counts.get(stat).saturating_sub(1))
        });
        Self {
            seed: run.seed(),
            share_code: replay_code(run.seed()),
            phase: run.phase(),
            decisions: run.state().choices_made(),
            final_stats: stats,
            ending_bands,
            bonus_triggered: run.state().bonus_triggered(),
            bonus_shown: run.pages().iter().any(|page| page.bonus),
            pages: run.pages().to_vec(),
            history: run.history().to_vec(),
        }
    }

    /// Band of the given stat's ending.
    #[must_use]
    pub fn band(&self, stat: Stat) -> usize {
        *self.ending_bands.get(stat)
    }

    /// Share code or decimal seed, whichever reproduces this run.
    #[must_use]
    pub fn replay_token(&self) -> String {
        self.share_code
            .clone()
            .unwrap_or_else(|| replay_token(self.seed))
    }

    /// One-line description for logs and share text.
    #[must_use]
    pub fn headline(&self) -> String {
        let stats = Stat::ORDER
            .iter()
            .map(|stat| format!("{stat} {}", self.final_stats.get(*stat)))
            .collect::<Vec<_>>()
            .join(", ");
        let bonus = if self.bonus_shown { " | kaiju sighted" } else { "" };
        format!(
            "{} | {} decisions | {stats}{bonus}",
            self.replay_token(),
            self.decisions
        )
    }
}
