//! Upgrade catalog entries and the purchase engine.

use crate::feed::CueKind;
use crate::forest::Forest;
use crate::kiln::Kiln;
use crate::mine::{Mine, MineSubtype};
use crate::minor::{Donut, Monster};
use crate::pond::Pond;
use crate::state::SimState;
use crate::tile::Tile;
use crate::windmill::Windmill;
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use sim_core::ResourceId;
use sim_econ::upgrade_cost;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Land,
    Tool,
    Storage,
    Market,
    Automation,
    Special,
}

/// Kind of tile a land upgrade claims.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileTemplate {
    Forest,
    Mine(MineSubtype),
    Pond,
    Kiln,
    Windmill,
    Donut,
    Monster,
}

impl TileTemplate {
    pub fn build(self, rng: &mut ChaCha8Rng) -> Tile {
        match self {
            TileTemplate::Forest => Tile::Forest(Forest::default()),
            TileTemplate::Mine(subtype) => Tile::Mine(Mine::new(subtype)),
            TileTemplate::Pond => Tile::Pond(Pond::new(rng)),
            TileTemplate::Kiln => Tile::Kiln(Kiln::default()),
            TileTemplate::Windmill => Tile::Windmill(Windmill::default()),
            TileTemplate::Donut => Tile::Donut(Donut::default()),
            TileTemplate::Monster => Tile::Monster(Monster::default()),
        }
    }

    /// Template a placed tile was claimed from, `None` for empty land.
    pub fn of(tile: &Tile) -> Option<TileTemplate> {
        match tile {
            Tile::Empty(_) => None,
            Tile::Forest(_) => Some(TileTemplate::Forest),
            Tile::Mine(m) => Some(TileTemplate::Mine(m.subtype)),
            Tile::Pond(_) => Some(TileTemplate::Pond),
            Tile::Kiln(_) => Some(TileTemplate::Kiln),
            Tile::Windmill(_) => Some(TileTemplate::Windmill),
            Tile::Donut(_) => Some(TileTemplate::Donut),
            Tile::Monster(_) => Some(TileTemplate::Monster),
        }
    }
}

/// What buying one more of an upgrade does.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect {
    /// Only the purchase count changes; calculators read it.
    None,
    ClaimTile(TileTemplate),
    AddColumn,
    AddRow,
    Win,
    StorageLevel(&'static str),
    /// Scales the capacity of every resource.
    StorageMultiplier(f64),
    PriceMultiplier(&'static str, Decimal),
}

/// Scheduling parameters of an automation upgrade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutomationSpec {
    /// Invocations per second contributed by each owned unit.
    pub ticks_per_unit_speed: f64,
    /// Energy drawn per owned unit per second, if any.
    pub energy_per_unit_speed: Option<f64>,
}

pub type VisibilityFn = fn(&SimState) -> bool;

/// An immutable catalog entry.
#[derive(Clone, Debug)]
pub struct Upgrade {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub base_cost: Decimal,
    pub cost_multiplier: Decimal,
    pub initial: u32,
    pub max: Option<u32>,
    pub resource_costs: Vec<(ResourceId, f64)>,
    pub effect: Effect,
    pub visible_when: Option<VisibilityFn>,
    pub automation: Option<AutomationSpec>,
}

impl Upgrade {
    /// New entry costing `cost_cents`, growing 15% per purchase.
    pub fn new(name: &'static str, title: &'static str, category: Category, cost_cents: i64) -> Self {
        Self {
            name,
            title,
            description: "",
            category,
            base_cost: Decimal::new(cost_cents, 2),
            cost_multiplier: Decimal::new(115, 2),
            initial: 0,
            max: None,
            resource_costs: Vec::new(),
            effect: Effect::None,
            visible_when: None,
            automation: None,
        }
    }

    pub fn describe(mut self, text: &'static str) -> Self {
        self.description = text;
        self
    }

    /// Cost growth per purchase in percent, e.g. 150 for ×1.5.
    pub fn growth(mut self, percent: i64) -> Self {
        self.cost_multiplier = Decimal::new(percent, 2);
        self
    }

    pub fn initial(mut self, count: u32) -> Self {
        self.initial = count;
        self
    }

    pub fn max(mut self, count: u32) -> Self {
        self.max = Some(count);
        self
    }

    pub fn needs(mut self, resource: &str, amount: f64) -> Self {
        self.resource_costs.push((ResourceId::new(resource), amount));
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    pub fn visible_when(mut self, predicate: VisibilityFn) -> Self {
        self.visible_when = Some(predicate);
        self
    }

    pub fn automation(mut self, ticks_per_unit_speed: f64, energy_per_unit_speed: Option<f64>) -> Self {
        self.automation = Some(AutomationSpec {
            ticks_per_unit_speed,
            energy_per_unit_speed,
        });
        self
    }

    pub fn is_maxed(&self, owned: u32) -> bool {
        self.max.is_some_and(|max| owned >= max)
    }
}

/// Price of the next purchase when `owned` have been bought.
pub fn cost(upgrade: &Upgrade, owned: u32) -> Decimal {
    match upgrade_cost(upgrade.base_cost, upgrade.cost_multiplier, owned, upgrade.initial) {
        Ok(cost) => cost,
        Err(err) => {
            warn!(upgrade = upgrade.name, %err, "unpriceable upgrade");
            Decimal::MAX
        }
    }
}

/// Whether the next purchase is currently allowed and affordable.
pub fn can_purchase(upgrade: &Upgrade, state: &SimState) -> bool {
    let owned = state.owned(upgrade.name);
    if upgrade.is_maxed(owned) {
        return false;
    }
    if matches!(upgrade.effect, Effect::ClaimTile(_)) && !state.land.has_room() {
        return false;
    }
    if !state.ledger.can_afford(&upgrade.resource_costs) {
        return false;
    }
    state.ledger.wallet.balance >= cost(upgrade, owned)
}

/// Buy one more of `upgrade`. Every check happens before anything is spent.
pub fn purchase(upgrade: &Upgrade, state: &mut SimState) -> bool {
    if !can_purchase(upgrade, state) {
        return false;
    }
    let owned = state.owned(upgrade.name);
    let price = cost(upgrade, owned);
    if !state.ledger.wallet.debit(price) {
        return false;
    }
    if !state.ledger.incur_all(&upgrade.resource_costs) {
        // can_purchase already checked every cost
        state.ledger.wallet.balance += price;
        return false;
    }

    match upgrade.effect {
        Effect::AddColumn => state.land.add_column(),
        Effect::AddRow => state.land.add_row(),
        Effect::Win if !state.stats.won => {
            state.stats.won = true;
            state.feed.notice("You won! The acres are yours.");
            state.feed.cue(CueKind::Celebrate, 3.0);
        }
        _ => {}
    }

    state.owned.insert(upgrade.name.to_string(), owned + 1);
    state.stats.upgrades_bought += 1;
    on_purchase(upgrade, state);
    info!(upgrade = upgrade.name, count = owned + 1, %price, "upgrade purchased");
    true
}

fn on_purchase(upgrade: &Upgrade, state: &mut SimState) {
    match upgrade.effect {
        Effect::ClaimTile(template) => {
            let tile = template.build(&mut state.rng);
            if let Err(err) = state.land.add_tile(tile) {
                warn!(upgrade = upgrade.name, %err, "claimed tile could not be placed");
            }
        }
        Effect::StorageLevel(resource) => match state.ledger.get_mut(resource) {
            Some(r) => r.storage += 1.0,
            None => warn!(upgrade = upgrade.name, resource, "storage upgrade for unknown resource"),
        },
        Effect::StorageMultiplier(factor) => {
            for r in state.ledger.iter_mut() {
                r.storage_multiplier *= factor;
            }
        }
        Effect::PriceMultiplier(resource, factor) => match state.ledger.get_mut(resource) {
            Some(r) => r.price_multiplier = (r.price_multiplier * factor).round_dp(6),
            None => warn!(upgrade = upgrade.name, resource, "price upgrade for unknown resource"),
        },
        Effect::None | Effect::AddColumn | Effect::AddRow | Effect::Win => {}
    }
}

/// Reveal upgrades whose thresholds have been reached. Revealed upgrades stay
/// revealed.
pub fn refresh_visibility(upgrades: &[Upgrade], state: &mut SimState) {
    let lifetime = state.ledger.wallet.lifetime;
    let fraction = |f: f64| Decimal::from_f64(f).unwrap_or(Decimal::ONE);
    let visible_at = fraction(state.config.visibility_threshold);
    let unblur_at = fraction(state.config.unblur_threshold);
    for upgrade in upgrades {
        let shown = state.visible.contains(upgrade.name);
        if !shown {
            let predicate = upgrade.visible_when.map_or(true, |p| p(state));
            if predicate && lifetime >= upgrade.base_cost * visible_at {
                state.visible.insert(upgrade.name.to_string());
            }
        }
        if state.visible.contains(upgrade.name)
            && !state.unblurred.contains(upgrade.name)
            && lifetime >= upgrade.base_cost * unblur_at
        {
            state.unblurred.insert(upgrade.name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::land::{LandGrid, COLUMN_UPGRADE, ROW_UPGRADE};
    use crate::tile::TileKind;
    use proptest::prelude::*;
    use sim_core::SimConfig;

    fn state(columns: usize, rows: usize) -> SimState {
        SimState::new(SimConfig::default(), Catalog::standard().new_ledger(), LandGrid::new(columns, rows))
    }

    fn plot() -> Upgrade {
        Upgrade::new("forest_plot", "Forest plot", Category::Land, 1000)
            .growth(150)
            .initial(1)
            .effect(Effect::ClaimTile(TileTemplate::Forest))
    }

    #[test]
    fn cost_starts_at_base_for_initial_count() {
        let up = plot();
        assert_eq!(cost(&up, 1), Decimal::new(1000, 2));
        assert_eq!(cost(&up, 2), Decimal::new(1500, 2));
        assert_eq!(cost(&up, 0), Decimal::new(1000, 2));
    }

    #[test]
    fn purchase_checks_before_spending() {
        let mut s = state(1, 1);
        s.ledger.wallet.credit(Decimal::new(500, 2));
        assert!(!purchase(&plot(), &mut s));
        assert_eq!(s.ledger.wallet.balance, Decimal::new(500, 2));
        s.ledger.wallet.credit(Decimal::new(500, 2));
        assert!(purchase(&plot(), &mut s));
        assert_eq!(s.ledger.wallet.balance, Decimal::ZERO);
        assert_eq!(s.owned("forest_plot"), 1);
        assert_eq!(s.land.count(TileKind::Forest), 1);
    }

    #[test]
    fn claim_needs_empty_land() {
        let mut s = state(1, 1);
        s.ledger.wallet.credit(Decimal::new(10_000, 2));
        assert!(purchase(&plot(), &mut s));
        assert!(!can_purchase(&plot(), &s));
        assert!(!purchase(&plot(), &mut s));
    }

    #[test]
    fn resource_costs_are_all_or_nothing() {
        let mut s = state(2, 1);
        s.ledger.wallet.credit(Decimal::new(10_000, 2));
        s.ledger.gain("wood", 10.0);
        let up = Upgrade::new("thing", "Thing", Category::Tool, 100)
            .needs("wood", 5.0)
            .needs("clay", 2.0);
        assert!(!purchase(&up, &mut s));
        assert_eq!(s.ledger.owned("wood"), 10.0);
        s.ledger.gain("clay", 2.0);
        assert!(purchase(&up, &mut s));
        assert_eq!(s.ledger.owned("wood"), 5.0);
        assert_eq!(s.ledger.owned("clay"), 0.0);
    }

    #[test]
    fn unknown_cost_resource_is_skipped() {
        let mut s = state(1, 1);
        s.ledger.wallet.credit(Decimal::new(100, 2));
        let up = Upgrade::new("odd", "Odd", Category::Tool, 100).needs("unobtainium", 3.0);
        assert!(purchase(&up, &mut s));
    }

    #[test]
    fn max_count_is_enforced() {
        let mut s = state(1, 1);
        s.ledger.wallet.credit(Decimal::new(100_000, 2));
        let up = Upgrade::new("once", "Once", Category::Special, 100).max(1).effect(Effect::Win);
        assert!(purchase(&up, &mut s));
        assert!(s.stats.won);
        assert!(!purchase(&up, &mut s));
        assert_eq!(s.owned("once"), 1);
    }

    #[test]
    fn grid_upgrades_resize_land() {
        let mut s = state(2, 2);
        s.ledger.wallet.credit(Decimal::new(100_000, 2));
        let col = Upgrade::new(COLUMN_UPGRADE, "Column", Category::Land, 100).initial(2).effect(Effect::AddColumn);
        let row = Upgrade::new(ROW_UPGRADE, "Row", Category::Land, 100).initial(2).effect(Effect::AddRow);
        assert!(purchase(&col, &mut s));
        assert!(purchase(&row, &mut s));
        assert_eq!((s.land.columns(), s.land.rows()), (3, 3));
    }

    #[test]
    fn storage_and_price_effects() {
        let mut s = state(1, 1);
        s.ledger.wallet.credit(Decimal::new(100_000, 2));
        let shed = Upgrade::new("shed", "Shed", Category::Storage, 100).effect(Effect::StorageLevel("wood"));
        let market = Upgrade::new("market", "Market", Category::Market, 100)
            .effect(Effect::PriceMultiplier("wood", Decimal::new(15, 1)));
        let house = Upgrade::new("house", "House", Category::Storage, 100).effect(Effect::StorageMultiplier(2.0));
        assert!(purchase(&shed, &mut s));
        assert!(purchase(&market, &mut s));
        assert!(purchase(&house, &mut s));
        let wood = s.ledger.get("wood").unwrap();
        assert_eq!(wood.capacity(), 50.0 * 2.0 * 2.0);
        assert_eq!(wood.unit_price(), Decimal::new(150, 2));
    }

    #[test]
    fn visibility_is_monotonic() {
        let mut s = state(1, 1);
        let up = Upgrade::new("axe", "Axe", Category::Tool, 10_000);
        let ups = vec![up];
        refresh_visibility(&ups, &mut s);
        assert!(!s.visible.contains("axe"));
        s.ledger.wallet.credit(Decimal::new(2_500, 2));
        refresh_visibility(&ups, &mut s);
        assert!(s.visible.contains("axe"));
        assert!(!s.unblurred.contains("axe"));
        s.ledger.wallet.credit(Decimal::new(2_500, 2));
        assert!(s.ledger.wallet.debit(Decimal::new(5_000, 2)));
        refresh_visibility(&ups, &mut s);
        assert!(s.visible.contains("axe"));
        assert!(s.unblurred.contains("axe"));
    }

    #[test]
    fn predicate_gates_visibility() {
        let mut s = state(1, 1);
        s.ledger.wallet.credit(Decimal::new(100_000, 2));
        let ups = vec![Upgrade::new("gated", "Gated", Category::Tool, 100).visible_when(|s| s.owned("key") > 0)];
        refresh_visibility(&ups, &mut s);
        assert!(s.visible.is_empty());
        s.owned.insert("key".to_string(), 1);
        refresh_visibility(&ups, &mut s);
        assert!(s.visible.contains("gated"));
    }

    proptest! {
        #[test]
        fn cost_never_decreases(base in 1i64..1_000_000, growth in 100i64..250, initial in 0u32..3, n in 0u32..40) {
            let up = Upgrade::new("p", "P", Category::Tool, base).growth(growth).initial(initial);
            prop_assert!(cost(&up, initial + n + 1) >= cost(&up, initial + n));
        }
    }
}
