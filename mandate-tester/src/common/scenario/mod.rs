pub mod catalog;

use crate::logic::SimulationPlan;
use catalog::catalog_scenarios;

/// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn new(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

/// Catalog entry: CLI key, description and plan builder.
#[derive(Clone, Copy)]
pub struct CatalogEntry {
    pub key: &'static str,
    pub description: &'static str,
    build: fn() -> SimulationPlan,
}

impl CatalogEntry {
    pub const fn new(
        key: &'static str,
        description: &'static str,
        build: fn() -> SimulationPlan,
    ) -> Self {
        Self {
            key,
            description,
            build,
        }
    }

    #[must_use]
    pub fn scenario(&self) -> TestScenario {
        TestScenario::new(self.key, (self.build)())
    }
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    catalog_scenarios()
        .iter()
        .find(|entry| entry.key.eq_ignore_ascii_case(key))
        .map(CatalogEntry::scenario)
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog_scenarios()
        .iter()
        .map(|entry| (entry.key, entry.description))
        .collect()
}

/// Every catalog key, used when `all` is requested.
#[must_use]
pub fn all_scenario_keys() -> Vec<String> {
    catalog_scenarios()
        .iter()
        .map(|entry| entry.key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_keys_are_unique_and_resolvable() {
        let keys = all_scenario_keys();
        let mut deduped = keys.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(keys.len(), deduped.len());
        for key in &keys {
            assert!(get_scenario(key).is_some(), "{key} missing");
        }
        assert!(get_scenario("SMOKE").is_some());
        assert!(get_scenario("nope").is_none());
        assert_eq!(list_scenarios().len(), keys.len());
    }
}
