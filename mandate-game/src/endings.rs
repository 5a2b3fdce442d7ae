//! Post-game ending pages and the bonus background roll.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::banding::Thresholds;
use crate::constants::{
    BONUS_BACKGROUND, BONUS_CANDIDATE_INDEX, BONUS_FILLER_COPIES, ENDING_PAGE_COUNT,
};
use crate::data::{EndingsTable, default_ending_background};
use crate::stats::{Stat, StatVector};

/// One rendered ending page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndingPage {
    /// Zero-based page index (0 = approval ... 3 = finance).
    pub page: u8,
    pub stat: Stat,
    pub value: i32,
    pub band: usize,
    pub text: String,
    pub background: String,
    /// The bonus background was drawn for this page.
    pub bonus: bool,
    /// Size of the weighted candidate list the background was drawn from.
    pub candidates: usize,
    /// Last ordinary page; hosts relabel "continue" as "restart".
    pub is_final: bool,
}

/// Result of asking for the next ending page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndingStep {
    Page(EndingPage),
    /// Every page has been shown; the host should go back to the menu.
    ReturnToMenu,
}

/// Inputs the resolver reads but never changes.
#[derive(Debug, Clone, Copy)]
pub struct EndingContext<'a> {
    pub stats: &'a StatVector,
    pub endings: &'a EndingsTable,
    pub thresholds: &'a Thresholds,
}

/// Page cursor over the four ordinary ending pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndingResolver {
    page: u8,
}

impl EndingResolver {
    #[must_use]
    pub const fn new() -> Self {
        Self { page: 0 }
    }

    /// Pages produced so far.
    #[must_use]
    pub const fn pages_shown(&self) -> u8 {
        self.page
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.page >= ENDING_PAGE_COUNT
    }

    /// Produce the next page, or [`EndingStep::ReturnToMenu`] once all four are shown.
    ///
    /// `bonus_pending` is cleared when the bonus background is drawn.
    pub fn resolve_next<R: Rng>(
        &mut self,
        ctx: EndingContext<'_>,
        bonus_pending: &mut bool,
        rng: &mut R,
    ) -> EndingStep {
        let Some(stat) = Stat::from_page(self.page) else {
            log::info!("ending pages exhausted, returning to menu");
            return EndingStep::ReturnToMenu;
        };

        let value = ctx.stats.get(stat);
        let entries = ctx.endings.for_stat(stat);
        let band = ctx
            .thresholds
            .ending_band(value)
            .min(entries.len().saturating_sub(1));
        let (text, regular) = entries.get(band).map_or_else(
            || (String::new(), default_ending_background(stat, band)),
            |entry| (entry.text.clone(), entry.background_key(stat, band)),
        );

        let candidates = build_candidates(&regular, *bonus_pending);
        let roll = rng.gen_range(0..candidates.len());
        let bonus = *bonus_pending && roll == BONUS_CANDIDATE_INDEX;
        if bonus {
            *bonus_pending = false;
        }
        let background = candidates
            .get(roll)
            .map_or_else(|| regular.clone(), |key| (*key).to_string());

        log::debug!(
            "ending page {} | {stat} {value} -> band {band} | roll {roll}/{} bonus:{bonus}",
            self.page,
            candidates.len()
        );

        let page = EndingPage {
            page: self.page,
            stat,
            value,
            band,
            text,
            background,
            bonus,
            candidates: candidates.len(),
            is_final: self.page + 1 == ENDING_PAGE_COUNT,
        };
        self.page += 1;
        EndingStep::Page(page)
    }
}

/// Weighted background list: the regular key once, plus the bonus key at index 1
/// and nine more regular copies while the bonus is still available.
fn build_candidates(regular: &str, bonus_available: bool) -> Vec<&str> {
    let mut candidates = vec![regular];
    if bonus_available {
        candidates.push(BONUS_BACKGROUND);
        candidates.extend(std::iter::repeat_n(regular, BONUS_FILLER_COPIES));
    }
    candidates
}
