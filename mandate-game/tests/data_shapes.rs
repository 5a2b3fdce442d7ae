use std::collections::{BTreeMap, HashSet};
use std::hash::Hasher;

use mandate_game::{
    ContentStore, EndingStep, RunConfig, RunController, RunPhase, Stat, StatTable,
};
use serde_json::Value;
use std::sync::Arc;
use twox_hash::XxHash64;

#[test]
fn bundled_content_is_well_formed() {
    let store = ContentStore::bundled().expect("bundled content parses");
    let ids: HashSet<u32> = store.scenarios.scenarios.iter().map(|s| s.id).collect();
    assert_eq!(ids.len(), store.scenarios.len());
    assert!(ids.contains(&7), "bonus scenario missing from bundled content");
    for scenario in &store.scenarios.scenarios {
        assert_eq!(scenario.choices.len(), 2, "scenario {}", scenario.id);
        assert!(!scenario.text.is_empty());
    }
    assert_eq!(store.endings.band_counts(), StatTable::uniform(3));
    for stat in Stat::ORDER {
        for (band, entry) in store.endings.for_stat(stat).iter().enumerate() {
            assert!(!entry.text.is_empty(), "{stat} band {band} has no text");
        }
    }
}

#[test]
fn run_config_snapshot_stable() {
    let mut snapshot = BTreeMap::new();
    for max_choices in [1_u32, 2, 12] {
        let config = RunConfig::default().with_max_choices(max_choices);
        config.validate().unwrap();
        snapshot.insert(
            format!("max_choices:{max_choices}"),
            serde_json::to_value(&config).unwrap(),
        );
    }
    let canonical = serde_json::to_string_pretty(&snapshot).unwrap();
    let first = snapshot_hash(canonical.as_bytes());

    let reparsed: BTreeMap<String, RunConfig> = serde_json::from_str(&canonical).unwrap();
    let again = serde_json::to_string_pretty(&reparsed).unwrap();
    assert_eq!(
        first,
        snapshot_hash(again.as_bytes()),
        "run config snapshot changed across a reparse\n{canonical}"
    );

    let shifted = RunConfig::default().with_thresholds(vec![0, 40, 61, 60, 60, 60, 75, 75, 75]);
    let shifted = serde_json::to_string_pretty(&shifted).unwrap();
    assert_ne!(first, snapshot_hash(shifted.as_bytes()));
}

#[test]
fn default_config_serializes_documented_shape() {
    let value = serde_json::to_value(RunConfig::default()).unwrap();
    assert_eq!(value["max_choices"], 12);
    assert_eq!(
        value["thresholds"],
        serde_json::json!([0, 40, 60, 60, 60, 60, 75, 75, 75])
    );
    assert_eq!(value["live_sprites"]["finance"], 3);
}

#[test]
fn run_summary_serializes_for_reports() {
    let content = Arc::new(ContentStore::bundled().unwrap());
    let mut run =
        RunController::new(content, RunConfig::default().with_max_choices(4), 0x5EED).unwrap();
    run.start().unwrap();
    while run.phase() == RunPhase::Deciding {
        run.submit_choice(1).unwrap();
    }
    while let EndingStep::Page(_) = run.request_next_ending_page().unwrap() {}

    let value = serde_json::to_value(run.summary()).unwrap();
    assert_eq!(value["decisions"], 4);
    assert_eq!(value["phase"], "Menu");
    let pages = value["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 4);
    let stats: Vec<&str> = pages
        .iter()
        .filter_map(|page| page["stat"].as_str())
        .collect();
    assert_eq!(stats, ["approval", "efficiency", "environment", "finance"]);
    assert!(matches!(value["final_stats"]["approval"], Value::Number(_)));
}

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}
