#![deny(warnings)]

//! Core domain models and invariants for Idle Acres.
//!
//! This crate defines the resource ledger, the currency wallet, run statistics
//! and the simulation configuration, with validation helpers to guarantee basic
//! invariants. Nothing here draws random numbers or reads the clock.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Tolerance used when comparing accumulated resource quantities.
pub const EPSILON: f64 = 1e-9;

/// Unique identifier for a resource kind, e.g. "wood", "seeds", "diamond".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ResourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registration record for a resource kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceDef {
    /// Resource identifier.
    pub id: ResourceId,
    /// Human-readable name.
    pub title: String,
    /// Display glyph.
    pub icon: String,
    /// Capacity at storage level 1 with no multiplier (> 0).
    pub base_capacity: f64,
    /// Price of one unit before multipliers (>= 0).
    pub base_price: Decimal,
    /// Floor that selling and spending can never cross.
    pub minimum_reserve: f64,
    /// Whether gains beyond capacity are booked as lost (true) or refused (false).
    pub overflow: bool,
    /// Whether the market buys this resource at all.
    pub sellable: bool,
    /// Whether the auto-seller includes this resource.
    pub auto_sell: bool,
    /// Default batch size for one sale.
    pub sell_num: f64,
}

impl ResourceDef {
    /// A sellable, overflowing resource with no reserve. `price_cents` is the
    /// base unit price in hundredths of a coin.
    pub fn new(name: &str, title: &str, icon: &str, base_capacity: f64, price_cents: i64) -> Self {
        Self {
            id: ResourceId::new(name),
            title: title.to_string(),
            icon: icon.to_string(),
            base_capacity,
            base_price: Decimal::new(price_cents, 2),
            minimum_reserve: 0.0,
            overflow: true,
            sellable: true,
            auto_sell: false,
            sell_num: 10.0,
        }
    }

    pub fn reserve(mut self, minimum: f64) -> Self {
        self.minimum_reserve = minimum;
        self
    }

    pub fn no_overflow(mut self) -> Self {
        self.overflow = false;
        self
    }

    pub fn unsellable(mut self) -> Self {
        self.sellable = false;
        self
    }

    pub fn auto_sell(mut self) -> Self {
        self.auto_sell = true;
        self
    }
}

/// A named countable stockpile with storage and market bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct Resource {
    /// Static registration data.
    pub def: ResourceDef,
    /// Current quantity (>= 0, <= capacity).
    pub owned: f64,
    /// Lifetime quantity accepted into storage.
    pub total_owned: f64,
    /// Quantity discarded because storage was full.
    pub lost: f64,
    /// Quantity sold on the market.
    pub sold: f64,
    /// Quantity spent on costs and recipes.
    pub incurred: f64,
    /// Lifetime currency from sales.
    pub earnings: Decimal,
    /// Storage level (starts at 1).
    pub storage: f64,
    /// Multiplier applied on top of the storage level.
    pub storage_multiplier: f64,
    /// Multiplier applied to the base price.
    pub price_multiplier: Decimal,
    /// Units sold per sale action.
    pub sell_num: f64,
}

impl Resource {
    pub fn new(def: ResourceDef) -> Self {
        let sell_num = def.sell_num;
        Self {
            def,
            owned: 0.0,
            total_owned: 0.0,
            lost: 0.0,
            sold: 0.0,
            incurred: 0.0,
            earnings: Decimal::ZERO,
            storage: 1.0,
            storage_multiplier: 1.0,
            price_multiplier: Decimal::ONE,
            sell_num,
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.def.id
    }

    /// `base_capacity × storage × storage_multiplier`.
    pub fn capacity(&self) -> f64 {
        self.def.base_capacity * self.storage * self.storage_multiplier
    }

    /// `base_price × price_multiplier`, rounded to cents.
    pub fn unit_price(&self) -> Decimal {
        (self.def.base_price * self.price_multiplier).round_dp(2)
    }

    /// Quantity that may be sold or spent without crossing the reserve.
    pub fn available(&self) -> f64 {
        (self.owned - self.def.minimum_reserve).max(0.0)
    }

    /// Add `n` units. Returns the quantity that ended up in storage.
    ///
    /// Overflowing resources count the full gain in `total_owned` and book the
    /// excess as lost. The others refuse the excess and count only what fit.
    pub fn gain(&mut self, n: f64) -> f64 {
        if !n.is_finite() || n <= 0.0 {
            return 0.0;
        }
        let room = (self.capacity() - self.owned).max(0.0);
        let accepted = n.min(room);
        self.owned += accepted;
        if self.def.overflow {
            self.total_owned += n;
            self.lost += n - accepted;
        } else {
            self.total_owned += accepted;
        }
        accepted
    }

    /// Spend `n` units. Fails without mutation if that would cross the reserve.
    pub fn incur(&mut self, n: f64) -> bool {
        if !n.is_finite() || n < 0.0 {
            return false;
        }
        if !self.can_incur(n) {
            return false;
        }
        self.owned = (self.owned - n).max(0.0);
        self.incurred += n;
        true
    }

    pub fn can_incur(&self, n: f64) -> bool {
        self.owned - n + EPSILON >= self.def.minimum_reserve && self.owned + EPSILON >= n
    }

    /// Sell up to `n` units, never below the reserve. Returns the proceeds.
    pub fn sell(&mut self, n: f64) -> Decimal {
        if !self.def.sellable || !n.is_finite() || n <= 0.0 {
            return Decimal::ZERO;
        }
        let clamped = n.min(self.available());
        if clamped <= 0.0 {
            return Decimal::ZERO;
        }
        let units = Decimal::from_f64(clamped).unwrap_or(Decimal::ZERO);
        let proceeds = (units * self.unit_price()).round_dp(2);
        self.owned -= clamped;
        self.sold += clamped;
        self.earnings += proceeds;
        proceeds
    }

    /// Move up to `n` lost units back into storage without exceeding capacity.
    pub fn reclaim(&mut self, n: f64) -> f64 {
        if !n.is_finite() || n <= 0.0 {
            return 0.0;
        }
        let room = (self.capacity() - self.owned).max(0.0);
        let moved = n.min(self.lost).min(room);
        if moved <= 0.0 {
            return 0.0;
        }
        self.lost -= moved;
        self.owned += moved;
        moved
    }
}

/// Spendable currency plus the cumulative total ever received.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: Decimal,
    pub lifetime: Decimal,
}

impl Wallet {
    pub fn with_balance(balance: Decimal) -> Self {
        Self {
            balance,
            lifetime: balance,
        }
    }

    pub fn credit(&mut self, amount: Decimal) {
        if amount <= Decimal::ZERO {
            return;
        }
        self.balance += amount;
        self.lifetime += amount;
    }

    /// Debit `amount` if the balance covers it.
    pub fn debit(&mut self, amount: Decimal) -> bool {
        if amount < Decimal::ZERO || self.balance < amount {
            return false;
        }
        self.balance -= amount;
        true
    }
}

/// All resources of a run, keyed by id, plus the wallet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ledger {
    resources: BTreeMap<ResourceId, Resource>,
    pub wallet: Wallet,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource kind. Registering the same id twice is an error.
    pub fn register(&mut self, def: ResourceDef) -> Result<(), ValidationError> {
        validate_resource_def(&def)?;
        if self.resources.contains_key(def.id.as_str()) {
            return Err(ValidationError::DuplicateResource(def.id.0.clone()));
        }
        self.resources.insert(def.id.clone(), Resource::new(def));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Resource> {
        self.resources.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Resource> {
        self.resources.values_mut()
    }

    /// Owned quantity, zero for unknown names.
    pub fn owned(&self, name: &str) -> f64 {
        self.get(name).map_or(0.0, |r| r.owned)
    }

    pub fn total_owned(&self, name: &str) -> f64 {
        self.get(name).map_or(0.0, |r| r.total_owned)
    }

    pub fn gain(&mut self, name: &str, n: f64) -> f64 {
        match self.resources.get_mut(name) {
            Some(r) => r.gain(n),
            None => {
                warn!(resource = name, "gain on unknown resource ignored");
                0.0
            }
        }
    }

    pub fn incur(&mut self, name: &str, n: f64) -> bool {
        match self.resources.get_mut(name) {
            Some(r) => r.incur(n),
            None => {
                warn!(resource = name, "spend on unknown resource refused");
                false
            }
        }
    }

    /// Whether every cost could be paid right now. Unknown resources are
    /// skipped with a warning.
    pub fn can_afford(&self, costs: &[(ResourceId, f64)]) -> bool {
        costs.iter().all(|(id, n)| match self.get(id.as_str()) {
            Some(r) => r.can_incur(*n),
            None => {
                warn!(resource = %id, "cost references unknown resource; skipped");
                true
            }
        })
    }

    /// Pay every cost or none of them.
    pub fn incur_all(&mut self, costs: &[(ResourceId, f64)]) -> bool {
        if !self.can_afford(costs) {
            return false;
        }
        for (id, n) in costs {
            if let Some(r) = self.resources.get_mut(id.as_str()) {
                r.incur(*n);
            }
        }
        true
    }

    /// Sell one batch (`sell_num` units) and credit the wallet.
    pub fn sell(&mut self, name: &str) -> Decimal {
        let Some(r) = self.resources.get_mut(name) else {
            warn!(resource = name, "sale of unknown resource ignored");
            return Decimal::ZERO;
        };
        let batch = r.sell_num;
        let proceeds = r.sell(batch);
        self.wallet.credit(proceeds);
        proceeds
    }

    pub fn reclaim(&mut self, name: &str, n: f64) -> f64 {
        self.resources.get_mut(name).map_or(0.0, |r| r.reclaim(n))
    }
}

/// Lifetime counters for a run. Missing fields load as zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stats {
    pub manual_clicks: u64,
    pub holes_dug: u64,
    pub trees_planted: u64,
    pub trees_chopped: u64,
    pub trees_self_seeded: u64,
    pub lucky_seeds: u64,
    pub fruit_harvested: u64,
    pub evolutions: u64,
    pub rocks_cleared: u64,
    pub beams_placed: u64,
    pub resources_mined: u64,
    pub fish_caught: u64,
    pub fish_escaped: u64,
    pub premature_casts: u64,
    pub rare_finds: u64,
    pub bakes: u64,
    pub donuts_made: u64,
    pub monster_pokes: u64,
    pub tiles_sold: u64,
    pub upgrades_bought: u64,
    pub automator_runs: u64,
    pub won: bool,
    /// Species icon to number caught, persisted as `[[icon, count], ...]`.
    #[serde(with = "fish_tank_pairs")]
    pub fish_tank: BTreeMap<String, u64>,
}

impl Stats {
    pub fn record_catch(&mut self, species: &str) {
        *self.fish_tank.entry(species.to_string()).or_insert(0) += 1;
    }
}

mod fish_tank_pairs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(tank: &BTreeMap<String, u64>, s: S) -> Result<S::Ok, S::Error> {
        let pairs: Vec<(&String, &u64)> = tank.iter().collect();
        pairs.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, u64>, D::Error> {
        let pairs: Vec<(String, u64)> = Vec::deserialize(d)?;
        Ok(pairs.into_iter().fold(BTreeMap::new(), |mut tank, (icon, n)| {
            *tank.entry(icon).or_insert(0) += n;
            tank
        }))
    }
}

/// Tuning knobs for chance-based mechanics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Base chance of an extra seed when a tree is chopped.
    pub lucky_seed_chance: f64,
    /// Base chance that a chopped tree replants itself.
    pub self_seed_chance: f64,
    /// Base chance that a pond bite is a rare find instead of a fish.
    pub rarity_chance: f64,
    /// Base luck for the pond's weighted tables, in (0, 1).
    pub fish_luck: f64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            lucky_seed_chance: 0.05,
            self_seed_chance: 0.01,
            rarity_chance: 0.05,
            fish_luck: 0.3,
        }
    }
}

/// Simulation configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the deterministic RNG.
    pub rng_seed: u64,
    /// Currency granted to a fresh run.
    pub starting_currency: Decimal,
    /// Fraction of an upgrade's base cost at which it first appears.
    pub visibility_threshold: f64,
    /// Fraction of an upgrade's base cost at which full detail is revealed.
    pub unblur_threshold: f64,
    /// Ticks longer than this suppress cosmetic cues.
    pub cosmetic_cutoff_secs: f64,
    pub balance: BalanceConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            starting_currency: Decimal::ZERO,
            visibility_threshold: 0.25,
            unblur_threshold: 0.5,
            cosmetic_cutoff_secs: 5.0,
            balance: BalanceConfig::default(),
        }
    }
}

/// Validation errors for domain invariants and catalog consistency.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A resource id was registered twice.
    #[error("duplicate resource: {0}")]
    DuplicateResource(String),
    /// A catalog entry references a resource nobody registered.
    #[error("unknown resource referenced by {owner}: {resource}")]
    UnknownResource { owner: String, resource: String },
    /// An upgrade name was registered twice.
    #[error("duplicate upgrade: {0}")]
    DuplicateUpgrade(String),
    /// An automation upgrade has no automator to run.
    #[error("automation upgrade {0} has no registered automator")]
    MissingAutomator(String),
    /// An automator is bound to a missing or non-automation upgrade.
    #[error("automator {0} is not bound to an automation upgrade")]
    OrphanAutomator(String),
    /// A calculator name was registered twice.
    #[error("duplicate calculator: {0}")]
    DuplicateCalculator(String),
    /// Cost multipliers below one would make prices fall.
    #[error("cost multiplier of {0} must be >= 1")]
    InvalidCostMultiplier(String),
    /// A probability or fraction lies outside [0, 1].
    #[error("{0} must be within [0,1]")]
    OutOfUnitRange(&'static str),
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
    /// Price or cost must be non-negative.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
}

/// Validate a resource registration record.
pub fn validate_resource_def(def: &ResourceDef) -> Result<(), ValidationError> {
    if !(def.base_capacity.is_finite() && def.minimum_reserve.is_finite() && def.sell_num.is_finite()) {
        return Err(ValidationError::NonFinite);
    }
    if def.base_capacity <= 0.0 || def.minimum_reserve < 0.0 || def.sell_num <= 0.0 {
        return Err(ValidationError::NonFinite);
    }
    if def.base_price < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    Ok(())
}

/// Validate configuration fields.
pub fn validate_config(cfg: &SimConfig) -> Result<(), ValidationError> {
    let unit = |v: f64, name: &'static str| {
        if !v.is_finite() {
            Err(ValidationError::NonFinite)
        } else if !(0.0..=1.0).contains(&v) {
            Err(ValidationError::OutOfUnitRange(name))
        } else {
            Ok(())
        }
    };
    unit(cfg.visibility_threshold, "visibility_threshold")?;
    unit(cfg.unblur_threshold, "unblur_threshold")?;
    unit(cfg.balance.lucky_seed_chance, "lucky_seed_chance")?;
    unit(cfg.balance.self_seed_chance, "self_seed_chance")?;
    unit(cfg.balance.rarity_chance, "rarity_chance")?;
    unit(cfg.balance.fish_luck, "fish_luck")?;
    if !cfg.cosmetic_cutoff_secs.is_finite() || cfg.cosmetic_cutoff_secs <= 0.0 {
        return Err(ValidationError::NonFinite);
    }
    if cfg.starting_currency < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wood() -> Resource {
        Resource::new(ResourceDef::new("wood", "Wood", "🪵", 50.0, 100))
    }

    fn seeds() -> Resource {
        Resource::new(ResourceDef::new("seeds", "Seeds", "🌰", 10.0, 50).reserve(1.0))
    }

    #[test]
    fn gain_books_overflow_as_lost() {
        let mut r = wood();
        assert_eq!(r.gain(45.0), 45.0);
        assert_eq!(r.gain(10.0), 5.0);
        assert_eq!(r.owned, 50.0);
        assert_eq!(r.lost, 5.0);
        assert_eq!(r.total_owned, 55.0);
    }

    #[test]
    fn non_overflowing_resource_refuses_excess() {
        let mut r = Resource::new(ResourceDef::new("energy", "Energy", "⚡", 10.0, 0).no_overflow());
        r.gain(8.0);
        assert_eq!(r.gain(5.0), 2.0);
        assert_eq!(r.owned, 10.0);
        assert_eq!(r.lost, 0.0);
        assert_eq!(r.total_owned, 10.0);
    }

    #[test]
    fn incur_fails_without_mutation() {
        let mut r = wood();
        r.gain(3.0);
        assert!(!r.incur(5.0));
        assert_eq!(r.owned, 3.0);
        assert_eq!(r.incurred, 0.0);
        assert!(r.incur(3.0));
        assert_eq!(r.owned, 0.0);
        assert_eq!(r.incurred, 3.0);
    }

    #[test]
    fn incur_respects_reserve() {
        let mut r = seeds();
        r.gain(2.0);
        assert!(r.incur(1.0));
        assert!(!r.incur(1.0));
        assert_eq!(r.owned, 1.0);
    }

    #[test]
    fn sell_clamps_to_minimum_reserve() {
        let mut r = seeds();
        r.gain(3.0);
        assert_eq!(r.sell_num, 10.0);
        let proceeds = r.sell(r.sell_num);
        assert_eq!(proceeds, Decimal::new(2, 0) * r.unit_price());
        assert_eq!(r.owned, 1.0);
        assert_eq!(r.sold, 2.0);
        assert_eq!(r.earnings, proceeds);
        assert_eq!(r.sell(10.0), Decimal::ZERO);
    }

    #[test]
    fn unit_price_applies_multiplier() {
        let mut r = wood();
        r.price_multiplier = Decimal::new(125, 2);
        assert_eq!(r.unit_price(), Decimal::new(125, 2));
    }

    #[test]
    fn reclaim_never_overflows() {
        let mut r = wood();
        r.gain(60.0);
        assert_eq!(r.lost, 10.0);
        assert_eq!(r.reclaim(5.0), 0.0);
        r.incur(4.0);
        assert_eq!(r.reclaim(10.0), 4.0);
        assert_eq!(r.owned, 50.0);
        assert_eq!(r.lost, 6.0);
        r.storage = 2.0;
        assert_eq!(r.reclaim(100.0), 6.0);
        assert_eq!(r.lost, 0.0);
    }

    #[test]
    fn ledger_incur_all_is_all_or_nothing() {
        let mut l = Ledger::new();
        l.register(ResourceDef::new("wood", "Wood", "🪵", 50.0, 100)).unwrap();
        l.register(ResourceDef::new("clay", "Clay", "🧱", 20.0, 200)).unwrap();
        l.gain("wood", 5.0);
        l.gain("clay", 1.0);
        let costs = vec![(ResourceId::new("wood"), 2.0), (ResourceId::new("clay"), 2.0)];
        assert!(!l.incur_all(&costs));
        assert_eq!(l.owned("wood"), 5.0);
        l.gain("clay", 1.0);
        assert!(l.incur_all(&costs));
        assert_eq!(l.owned("wood"), 3.0);
        assert_eq!(l.owned("clay"), 0.0);
    }

    #[test]
    fn ledger_sell_credits_wallet() {
        let mut l = Ledger::new();
        l.register(ResourceDef::new("wood", "Wood", "🪵", 50.0, 150)).unwrap();
        l.gain("wood", 4.0);
        let got = l.sell("wood");
        assert_eq!(got, Decimal::new(600, 2));
        assert_eq!(l.wallet.balance, got);
        assert_eq!(l.wallet.lifetime, got);
        assert!(l.wallet.debit(Decimal::new(5, 0)));
        assert!(!l.wallet.debit(Decimal::new(5, 0)));
        assert_eq!(l.wallet.lifetime, got);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut l = Ledger::new();
        l.register(ResourceDef::new("wood", "Wood", "🪵", 50.0, 100)).unwrap();
        assert_eq!(
            l.register(ResourceDef::new("wood", "Wood", "🪵", 50.0, 100)),
            Err(ValidationError::DuplicateResource("wood".into()))
        );
    }

    #[test]
    fn unknown_resource_is_harmless() {
        let mut l = Ledger::new();
        assert_eq!(l.gain("mithril", 3.0), 0.0);
        assert!(!l.incur("mithril", 1.0));
        assert_eq!(l.sell("mithril"), Decimal::ZERO);
    }

    #[test]
    fn stats_fish_tank_is_pair_list() {
        let mut s = Stats::default();
        s.record_catch("🐟");
        s.record_catch("🐟");
        s.record_catch("🦈");
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["fishTank"], serde_json::json!([["🐟", 2], ["🦈", 1]]));
        let back: Stats = serde_json::from_value(v).unwrap();
        assert_eq!(back, s);
        let sparse: Stats = serde_json::from_str(r#"{"treesChopped": 3}"#).unwrap();
        assert_eq!(sparse.trees_chopped, 3);
        assert!(sparse.fish_tank.is_empty());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&SimConfig::default()).is_ok());
        let mut bad = SimConfig::default();
        bad.visibility_threshold = 1.5;
        assert_eq!(
            validate_config(&bad),
            Err(ValidationError::OutOfUnitRange("visibility_threshold"))
        );
    }

    #[test]
    fn partial_config_uses_defaults() {
        let cfg: SimConfig = serde_json::from_str(r#"{"rng_seed": 7}"#).unwrap();
        assert_eq!(cfg.rng_seed, 7);
        assert_eq!(cfg.balance, BalanceConfig::default());
    }

    proptest! {
        #[test]
        fn storage_never_exceeds_capacity(gains in proptest::collection::vec(0.0f64..40.0, 1..40)) {
            let mut r = wood();
            for g in &gains {
                r.gain(*g);
                prop_assert!(r.owned <= r.capacity() + EPSILON);
            }
            let total: f64 = gains.iter().sum();
            prop_assert!((r.owned + r.lost - r.total_owned).abs() < 1e-6);
            prop_assert!((r.total_owned - total).abs() < 1e-6);
        }

        #[test]
        fn reserve_is_a_hard_floor(start in 1.0f64..10.0,
                                   ops in proptest::collection::vec((any::<bool>(), 0.0f64..12.0), 1..30)) {
            let mut r = seeds();
            r.gain(start);
            for (sell, n) in ops {
                if sell {
                    r.sell(n);
                } else {
                    r.incur(n);
                }
                prop_assert!(r.owned + EPSILON >= 1.0);
            }
        }
    }
}
