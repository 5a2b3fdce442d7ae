//! Running stats and the choice update rule.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{APPROVAL_SOURCES, INITIAL_STAT};
use crate::data::ChoiceDelta;

/// One of the four tracked stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Approval,
    Efficiency,
    Environment,
    Finance,
}

impl Stat {
    /// Canonical order used for display and for ending pages.
    pub const ORDER: [Self; 4] = [
        Self::Approval,
        Self::Efficiency,
        Self::Environment,
        Self::Finance,
    ];

    /// Stat shown on the given ending page, if the page is an ordinary one.
    #[must_use]
    pub fn from_page(page: u8) -> Option<Self> {
        Self::ORDER.get(usize::from(page)).copied()
    }

    /// Name used in asset keys (`ApprovalBad`, `FinanceGood`, ...).
    #[must_use]
    pub const fn asset_key(self) -> &'static str {
        match self {
            Self::Approval => "Approval",
            Self::Efficiency => "Efficiency",
            Self::Environment => "Environment",
            Self::Finance => "Finance",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approval => write!(f, "approval"),
            Self::Efficiency => write!(f, "efficiency"),
            Self::Environment => write!(f, "environment"),
            Self::Finance => write!(f, "finance"),
        }
    }
}

/// One value per stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatTable<T> {
    pub approval: T,
    pub efficiency: T,
    pub environment: T,
    pub finance: T,
}

impl<T> StatTable<T> {
    pub const fn uniform(value: T) -> Self
    where
        T: Copy,
    {
        Self {
            approval: value,
            efficiency: value,
            environment: value,
            finance: value,
        }
    }

    pub fn from_fn(mut f: impl FnMut(Stat) -> T) -> Self {
        Self {
            approval: f(Stat::Approval),
            efficiency: f(Stat::Efficiency),
            environment: f(Stat::Environment),
            finance: f(Stat::Finance),
        }
    }

    #[must_use]
    pub const fn get(&self, stat: Stat) -> &T {
        match stat {
            Stat::Approval => &self.approval,
            Stat::Efficiency => &self.efficiency,
            Stat::Environment => &self.environment,
            Stat::Finance => &self.finance,
        }
    }

    /// Pairs in canonical stat order.
    pub fn iter(&self) -> impl Iterator<Item = (Stat, &T)> {
        Stat::ORDER.into_iter().map(move |stat| (stat, self.get(stat)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Stat, &T) -> U) -> StatTable<U> {
        StatTable::from_fn(|stat| f(stat, self.get(stat)))
    }
}

/// The four running stat values of a run.
///
/// Approval is never set directly: it is always the floored average of the
/// other three, recomputed on every [`StatVector::apply_choice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatVector {
    approval: i32,
    efficiency: i32,
    environment: i32,
    finance: i32,
}

impl Default for StatVector {
    fn default() -> Self {
        Self {
            approval: INITIAL_STAT,
            efficiency: INITIAL_STAT,
            environment: INITIAL_STAT,
            finance: INITIAL_STAT,
        }
    }
}

impl StatVector {
    /// Build a vector from the three independent stats, deriving approval.
    #[must_use]
    pub const fn from_parts(efficiency: i32, environment: i32, finance: i32) -> Self {
        Self {
            approval: derive_approval(efficiency, environment, finance),
            efficiency,
            environment,
            finance,
        }
    }

    #[must_use]
    pub const fn approval(&self) -> i32 {
        self.approval
    }

    #[must_use]
    pub const fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Approval => self.approval,
            Stat::Efficiency => self.efficiency,
            Stat::Environment => self.environment,
            Stat::Finance => self.finance,
        }
    }

    /// Apply a choice's deltas and recompute approval.
    ///
    /// No game bounds are applied: stats move freely below 0 and above 100.
    /// The only limit is the `i32` domain itself, where additions saturate at
    /// `i32::MIN`/`i32::MAX` instead of wrapping.
    pub fn apply_choice(&mut self, delta: &ChoiceDelta) {
        self.efficiency = self.efficiency.saturating_add(delta.efficiency);
        self.environment = self.environment.saturating_add(delta.environment);
        self.finance = self.finance.saturating_add(delta.finance);
        self.approval = derive_approval(self.efficiency, self.environment, self.finance);
    }

    /// Copy of the stats after a hypothetical choice.
    #[must_use]
    pub fn projected(&self, delta: &ChoiceDelta) -> Self {
        let mut next = *self;
        next.apply_choice(delta);
        next
    }

    #[must_use]
    pub fn as_table(&self) -> StatTable<i32> {
        StatTable::from_fn(|stat| self.get(stat))
    }
}

/// Floored integer average of the three independent stats.
#[must_use]
pub const fn derive_approval(efficiency: i32, environment: i32, finance: i32) -> i32 {
    let sum = efficiency as i64 + environment as i64 + finance as i64;
    // div_euclid by a positive divisor floors, matching the rule for negative sums too
    let avg = sum.div_euclid(APPROVAL_SOURCES as i64);
    avg as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_leave_the_gauge_range_unclamped() {
        let mut stats = StatVector::default();
        stats.apply_choice(&ChoiceDelta {
            efficiency: 180,
            environment: -230,
            finance: 0,
        });
        assert_eq!(stats.get(Stat::Efficiency), 230);
        assert_eq!(stats.get(Stat::Environment), -180);
        assert_eq!(stats.approval(), derive_approval(230, -180, 50));
        assert_eq!(stats.approval(), 33);

        let mut edge = StatVector::from_parts(i32::MAX - 1, i32::MIN + 1, 0);
        edge.apply_choice(&ChoiceDelta {
            efficiency: 5,
            environment: -5,
            finance: 0,
        });
        assert_eq!(edge.get(Stat::Efficiency), i32::MAX);
        assert_eq!(edge.get(Stat::Environment), i32::MIN);
        assert_eq!(edge.approval(), -1);
    }

    #[test]
    fn stats_start_at_midpoint() {
        let stats = StatVector::default();
        for stat in Stat::ORDER {
            assert_eq!(stats.get(stat), 50);
        }
    }

    #[test]
    fn apply_choice_updates_and_derives_approval() {
        let mut stats = StatVector::default();
        stats.apply_choice(&ChoiceDelta::new(10, -5, 3));
        assert_eq!(stats.get(Stat::Efficiency), 60);
        assert_eq!(stats.get(Stat::Environment), 45);
        assert_eq!(stats.get(Stat::Finance), 53);
        assert_eq!(stats.approval(), 52);
    }

    #[test]
    fn approval_floors_negative_sums() {
        assert_eq!(derive_approval(-1, 0, 0), -1);
        assert_eq!(derive_approval(-3, -1, 0), -2);
        assert_eq!(derive_approval(1, 1, 0), 0);
    }

    #[test]
    fn values_are_not_clamped() {
        let mut stats = StatVector::default();
        stats.apply_choice(&ChoiceDelta::new(-120, 200, 0));
        assert_eq!(stats.get(Stat::Efficiency), -70);
        assert_eq!(stats.get(Stat::Environment), 250);
        assert_eq!(stats.approval(), 76);
    }

    #[test]
    fn stat_table_iterates_in_canonical_order() {
        let table = StatTable::from_fn(|stat| stat.asset_key().len());
        let order: Vec<Stat> = table.iter().map(|(stat, _)| stat).collect();
        assert_eq!(order, Stat::ORDER.to_vec());
        assert_eq!(Stat::from_page(3), Some(Stat::Finance));
        assert_eq!(Stat::from_page(4), None);
    }
}
