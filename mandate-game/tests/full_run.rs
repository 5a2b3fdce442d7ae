use std::collections::HashSet;
use std::sync::Arc;

use mandate_game::{
    ContentStore, EndingStep, RunConfig, RunController, RunError, RunPhase, Stat, StatVector,
    stats::derive_approval,
};

const SEEDS: u64 = 256;

fn content() -> Arc<ContentStore> {
    Arc::new(ContentStore::bundled().expect("bundled content"))
}

fn play(run: &mut RunController, pick: impl Fn(u32) -> usize) -> Vec<u32> {
    run.start().unwrap();
    let mut shown = Vec::new();
    loop {
        let choice = match run.current_turn() {
            Some(view) => {
                shown.push(view.scenario.id);
                pick(view.turn)
            }
            None => break,
        };
        run.submit_choice(choice).unwrap();
        let stats = run.stats();
        assert_eq!(
            stats.approval(),
            derive_approval(
                stats.get(Stat::Efficiency),
                stats.get(Stat::Environment),
                stats.get(Stat::Finance)
            )
        );
    }
    shown
}

#[test]
fn approval_stays_derived_across_seeds() {
    let content = content();
    for seed in 0..SEEDS {
        let mut run = RunController::new(Arc::clone(&content), RunConfig::default(), seed).unwrap();
        let shown = play(&mut run, |turn| (turn as usize + seed as usize) % 2);
        assert_eq!(shown.len(), 12);
        assert_eq!(run.phase(), RunPhase::Endings);
    }
}

#[test]
fn scenarios_never_repeat_within_a_run() {
    let content = content();
    let total = content.scenarios.len();
    let config = RunConfig::default().with_max_choices(u32::try_from(total).unwrap());
    for seed in 0..SEEDS {
        let mut run = RunController::new(Arc::clone(&content), config.clone(), seed).unwrap();
        let shown = play(&mut run, |_| 0);
        let unique: HashSet<u32> = shown.iter().copied().collect();
        assert_eq!(unique.len(), total, "seed {seed} repeated a scenario");
        assert_eq!(run.state().scenarios_remaining(), 0);
    }
}

#[test]
fn exhausted_pool_rejects_without_mutation() {
    let content = content();
    let total = u32::try_from(content.scenarios.len()).unwrap();
    let config = RunConfig::default().with_max_choices(total + 5);
    let mut run = RunController::new(content, config, 3).unwrap();
    run.start().unwrap();
    for _ in 1..total {
        run.submit_choice(0).unwrap();
    }
    let stats = *run.stats();
    assert_eq!(
        run.submit_choice(0),
        Err(RunError::ExhaustedPool {
            drawn: total as usize
        })
    );
    assert_eq!(*run.stats(), stats);
    assert_eq!(run.state().choices_made(), total - 1);
}

#[test]
fn identical_seeds_replay_identically() {
    let content = content();
    let replay = |seed| {
        let mut run = RunController::new(Arc::clone(&content), RunConfig::default(), seed).unwrap();
        let shown = play(&mut run, |turn| usize::from(turn % 3 == 0));
        let mut backgrounds = Vec::new();
        while let EndingStep::Page(page) = run.request_next_ending_page().unwrap() {
            backgrounds.push(page.background);
        }
        (shown, *run.stats(), backgrounds)
    };
    for seed in [1_u64, 77, 0xDEAD_BEEF] {
        assert_eq!(replay(seed), replay(seed));
    }
}

#[test]
fn restart_resets_everything() {
    let content = content();
    let mut run = RunController::new(content, RunConfig::default().with_max_choices(2), 11).unwrap();
    play(&mut run, |_| 0);
    assert_eq!(run.phase(), RunPhase::Endings);
    run.request_next_ending_page().unwrap();

    run.restart().unwrap();
    assert_eq!(run.phase(), RunPhase::Deciding);
    assert_eq!(*run.stats(), StatVector::default());
    assert_eq!(run.state().choices_made(), 0);
    assert_eq!(run.state().pages_shown(), 0);
    assert!(run.history().is_empty());
    assert!(run.pages().is_empty());
    assert_eq!(
        run.state().scenarios_remaining(),
        run.content().scenarios.len() - 1
    );
}

#[test]
fn exactly_four_pages_then_menu() {
    let content = content();
    for seed in 0..32 {
        let mut run =
            RunController::new(Arc::clone(&content), RunConfig::default().with_max_choices(5), seed)
                .unwrap();
        play(&mut run, |_| 1);
        let mut pages = 0;
        loop {
            match run.request_next_ending_page().unwrap() {
                EndingStep::Page(page) => {
                    assert_eq!(page.stat, Stat::ORDER[usize::from(page.page)]);
                    assert!(page.band < 3);
                    pages += 1;
                }
                EndingStep::ReturnToMenu => break,
            }
        }
        assert_eq!(pages, 4);
        assert_eq!(run.phase(), RunPhase::Menu);
        assert!(matches!(
            run.request_next_ending_page(),
            Err(RunError::NotInEndings { .. })
        ));
    }
}
