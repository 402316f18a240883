//! Derived values recomputed once per tick.
//!
//! A calculator is a pure function of the simulation state. Results are cached
//! by name in [`Derived`], which tiles read through their context.

use crate::state::SimState;
use std::collections::BTreeMap;
use tracing::warn;

pub const GROWTH_RATE: &str = "growthRate";
pub const CHOP_POWER: &str = "chopPower";
pub const EXCAVATOR_POWER: &str = "excavatorPower";
pub const TUNNELER_POWER: &str = "tunnelerPower";
pub const MINER_POWER: &str = "minerPower";
pub const LUCKY_SEED_CHANCE: &str = "luckySeedChance";
pub const SELF_SEED_CHANCE: &str = "selfSeedChance";
pub const RARITY_CHANCE: &str = "rarityChance";
pub const RARE_FISH_LUCK: &str = "rareFishLuck";
pub const RARE_FIND_LUCK: &str = "rareFindLuck";
pub const DONUT_YIELD: &str = "donutYield";
pub const WINDMILL_RATE: &str = "windmillRate";

pub type CalculatorFn = fn(&SimState) -> f64;

#[derive(Clone, Copy, Debug)]
pub struct Calculator {
    pub name: &'static str,
    pub compute: CalculatorFn,
}

impl Calculator {
    pub fn new(name: &'static str, compute: CalculatorFn) -> Self {
        Self { name, compute }
    }
}

/// Cached calculator outputs. Unknown names read as zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Derived(BTreeMap<&'static str, f64>);

impl Derived {
    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, name: &'static str, value: f64) {
        self.0.insert(name, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// Evaluate every calculator against the current state and store the results.
/// All calculators see the same state; none sees another's fresh output.
pub fn recompute(calculators: &[Calculator], state: &mut SimState) {
    let values: Vec<(&'static str, f64)> = calculators
        .iter()
        .map(|c| (c.name, (c.compute)(state)))
        .collect();
    for (name, value) in values {
        if !value.is_finite() {
            warn!(calculator = name, value, "non-finite calculator output ignored");
            continue;
        }
        state.derived.set(name, value);
    }
}
