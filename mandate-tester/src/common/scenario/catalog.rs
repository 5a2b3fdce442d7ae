use anyhow::{Result, ensure};
use std::collections::HashSet;
use std::sync::Arc;

use super::CatalogEntry;
use crate::logic::{GameTester, GameplayStrategy, SimulationPlan, SimulationSummary, TesterAssets};
use mandate_game::constants::{BONUS_BACKGROUND, ENDING_PAGE_COUNT};
use mandate_game::{
    ChoiceDelta, RunError, RunPhase, Stat, decode_to_seed, generate_code_from_entropy, replay_code,
};

const CATALOG: [CatalogEntry; 10] = [
    CatalogEntry::new("smoke", "Balanced playthrough reaches the menu", smoke_plan),
    CatalogEntry::new(
        "approval-invariant",
        "Approval equals the floored average after every decision",
        approval_plan,
    ),
    CatalogEntry::new(
        "no-repeat",
        "A run covering the whole pool never repeats a scenario",
        no_repeat_plan,
    ),
    CatalogEntry::new(
        "exhaustion",
        "Asking for more decisions than scenarios surfaces ExhaustedPool",
        exhaustion_plan,
    ),
    CatalogEntry::new(
        "ending-pages",
        "Four ending pages in canonical order, then one return to menu",
        ending_pages_plan,
    ),
    CatalogEntry::new(
        "bonus-one-shot",
        "The bonus background appears at most once and only after its scenario",
        bonus_plan,
    ),
    CatalogEntry::new(
        "post-completion",
        "Choices submitted after the last decision are rejected",
        post_completion_plan,
    ),
    CatalogEntry::new(
        "deterministic-replay",
        "Replaying a seed reproduces scenarios, stats and backgrounds",
        replay_plan,
    ),
    CatalogEntry::new(
        "share-code",
        "Printed replay tokens resolve back to the seed that produced the run",
        share_code_plan,
    ),
    CatalogEntry::new(
        "focus-choices",
        "Focused strategies always take the choice that helps their stat most",
        focus_plan,
    ),
];

#[must_use]
pub fn catalog_scenarios() -> &'static [CatalogEntry] {
    &CATALOG
}

fn completed_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.halted.is_none(),
        "run halted early: {:?}",
        summary.halted
    );
    ensure!(
        summary.completed(),
        "run did not return to the menu exactly once"
    );
    ensure!(
        summary.final_phase == RunPhase::Menu,
        "run ended in {:?}",
        summary.final_phase
    );
    Ok(())
}

fn decision_count_expectation(summary: &SimulationSummary) -> Result<()> {
    let expected = usize::try_from(summary.config.max_choices)?;
    ensure!(
        summary.decisions.len() == expected,
        "expected {expected} decisions, saw {}",
        summary.decisions.len()
    );
    Ok(())
}

fn approval_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.approval_mismatches.is_empty(),
        "approval drifted on turns {:?}",
        summary.approval_mismatches
    );
    Ok(())
}

fn no_repeat_expectation(summary: &SimulationSummary) -> Result<()> {
    let unique: HashSet<u32> = summary.scenario_ids.iter().copied().collect();
    ensure!(
        unique.len() == summary.scenario_ids.len(),
        "scenario repeated within a run: {:?}",
        summary.scenario_ids
    );
    Ok(())
}

fn exhaustion_expectation(summary: &SimulationSummary) -> Result<()> {
    let pool = summary.content.scenarios.len();
    ensure!(
        summary.halted == Some(RunError::ExhaustedPool { drawn: pool }),
        "expected exhaustion after {pool} draws, got {:?}",
        summary.halted
    );
    ensure!(
        summary.decisions.len() + 1 == pool,
        "exhaustion must reject the choice on the last scenario"
    );
    ensure!(summary.pages.is_empty(), "exhausted run produced ending pages");
    Ok(())
}

fn ending_pages_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.pages.len() == usize::from(ENDING_PAGE_COUNT),
        "expected {ENDING_PAGE_COUNT} pages, saw {}",
        summary.pages.len()
    );
    for (page, stat) in summary.pages.iter().zip(Stat::ORDER) {
        ensure!(page.stat == stat, "page {} showed {}", page.page, page.stat);
        ensure!(
            page.value == summary.result.final_stats.get(stat),
            "page {} value differs from final {stat}",
            page.page
        );
        let available = summary.content.endings.for_stat(stat).len();
        ensure!(
            page.band < available,
            "page {} band {} outside {available} endings",
            page.page,
            page.band
        );
    }
    ensure!(
        summary.pages.last().is_some_and(|page| page.is_final),
        "last page not flagged final"
    );
    Ok(())
}

fn bonus_expectation(summary: &SimulationSummary) -> Result<()> {
    let bonus_pages = summary.pages.iter().filter(|page| page.bonus).count();
    ensure!(bonus_pages <= 1, "bonus shown {bonus_pages} times");
    let triggered = summary
        .scenario_ids
        .contains(&mandate_game::constants::BONUS_SCENARIO_ID);
    ensure!(
        triggered || bonus_pages == 0,
        "bonus shown without its scenario"
    );
    ensure!(
        triggered == summary.result.bonus_triggered,
        "summary disagrees on bonus trigger"
    );
    for page in &summary.pages {
        ensure!(
            page.bonus == (page.background == BONUS_BACKGROUND),
            "page {} bonus flag disagrees with background {}",
            page.page,
            page.background
        );
    }
    Ok(())
}

fn post_completion_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.late_choice_rejected,
        "choice after completion was not rejected"
    );
    Ok(())
}

fn replay_expectation(summary: &SimulationSummary) -> Result<()> {
    let assets = Arc::new(TesterAssets::from_content(
        Arc::clone(&summary.content),
        "replay",
    ));
    let tester = GameTester::new(assets, summary.config.clone(), false);
    let replay = tester.run_plan(&SimulationPlan::new(summary.strategy), summary.seed)?;
    ensure!(
        replay.scenario_ids == summary.scenario_ids,
        "scenario order differs on replay"
    );
    ensure!(
        replay.result.final_stats == summary.result.final_stats,
        "final stats differ on replay"
    );
    let backgrounds = |s: &SimulationSummary| {
        s.pages
            .iter()
            .map(|page| page.background.clone())
            .collect::<Vec<_>>()
    };
    ensure!(
        backgrounds(&replay) == backgrounds(summary),
        "ending backgrounds differ on replay"
    );
    Ok(())
}

fn share_code_expectation(summary: &SimulationSummary) -> Result<()> {
    let token = summary.result.replay_token();
    let replayed = match &summary.result.share_code {
        Some(code) => {
            ensure!(code.starts_with("MN-"), "unexpected share code {code}");
            decode_to_seed(code).ok_or_else(|| anyhow::anyhow!("cannot decode {code}"))?
        }
        None => token.parse::<u64>()?,
    };
    ensure!(
        replayed == summary.seed,
        "replay token {token} resolves to seed {replayed}, not {}",
        summary.seed
    );

    let minted_code = generate_code_from_entropy(summary.seed);
    let minted = decode_to_seed(&minted_code)
        .ok_or_else(|| anyhow::anyhow!("cannot decode {minted_code}"))?;
    ensure!(
        replay_code(minted).as_deref() == Some(minted_code.as_str()),
        "code-minted seed from {minted_code} does not replay through its own code"
    );
    Ok(())
}

fn focus_expectation(summary: &SimulationSummary) -> Result<()> {
    let focus = match summary.strategy {
        GameplayStrategy::Growth => Stat::Efficiency,
        GameplayStrategy::Green => Stat::Environment,
        GameplayStrategy::Thrifty => Stat::Finance,
        GameplayStrategy::Balanced | GameplayStrategy::Random => return Ok(()),
    };
    let gain = |delta: &ChoiceDelta| match focus {
        Stat::Efficiency => delta.efficiency,
        Stat::Environment => delta.environment,
        _ => delta.finance,
    };
    for decision in &summary.decisions {
        let scenario = summary
            .content
            .scenarios
            .scenarios
            .iter()
            .find(|scenario| scenario.id == decision.scenario_id)
            .ok_or_else(|| anyhow::anyhow!("unknown scenario {}", decision.scenario_id))?;
        let best = scenario
            .choices
            .iter()
            .map(|choice| gain(&choice.delta))
            .max()
            .unwrap_or_default();
        ensure!(
            gain(&decision.delta) == best,
            "{} strategy took {focus} {:+} on scenario {} when {best:+} was offered",
            summary.strategy,
            gain(&decision.delta),
            decision.scenario_id
        );
    }
    Ok(())
}

fn full_run(strategy: GameplayStrategy) -> SimulationPlan {
    SimulationPlan::new(strategy)
        .with_expectation(completed_expectation)
        .with_expectation(decision_count_expectation)
}

fn smoke_plan() -> SimulationPlan {
    full_run(GameplayStrategy::Balanced)
}

fn approval_plan() -> SimulationPlan {
    full_run(GameplayStrategy::Random).with_expectation(approval_expectation)
}

fn no_repeat_plan() -> SimulationPlan {
    full_run(GameplayStrategy::Random)
        .covering_pool()
        .with_expectation(no_repeat_expectation)
}

fn exhaustion_plan() -> SimulationPlan {
    SimulationPlan::new(GameplayStrategy::Balanced)
        .beyond_pool(1)
        .with_expectation(exhaustion_expectation)
}

fn ending_pages_plan() -> SimulationPlan {
    full_run(GameplayStrategy::Green).with_expectation(ending_pages_expectation)
}

fn bonus_plan() -> SimulationPlan {
    full_run(GameplayStrategy::Random).with_expectation(bonus_expectation)
}

fn post_completion_plan() -> SimulationPlan {
    full_run(GameplayStrategy::Thrifty)
        .with_max_choices(2)
        .with_expectation(post_completion_expectation)
}

fn replay_plan() -> SimulationPlan {
    full_run(GameplayStrategy::Random).with_expectation(replay_expectation)
}

fn share_code_plan() -> SimulationPlan {
    SimulationPlan::new(GameplayStrategy::Balanced).with_expectation(share_code_expectation)
}

fn focus_plan() -> SimulationPlan {
    full_run(GameplayStrategy::Growth).with_expectation(focus_expectation)
}
