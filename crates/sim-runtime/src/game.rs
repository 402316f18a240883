//! The facade a driver talks to: one run of the game, advanced by `tick` and
//! poked by player actions.

use crate::automator::{self, AutomatorState};
use crate::calculator;
use crate::catalog::Catalog;
use crate::feed::FeedBatch;
use crate::forest::STARTING_SEEDS;
use crate::land::{LandGrid, COLUMN_UPGRADE, ROW_UPGRADE};
use crate::state::SimState;
use crate::tile::{Reaction, Tile, TileView};
use crate::upgrade::{self, Category, Effect, TileTemplate};
use rust_decimal::Decimal;
use serde::Serialize;
use sim_core::{validate_config, SimConfig, Stats, Wallet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct Game {
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) state: SimState,
    /// Parallel to `catalog.automators()`.
    pub(crate) automators: Vec<AutomatorState>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceView {
    pub name: String,
    pub title: String,
    pub icon: String,
    pub owned: f64,
    pub capacity: f64,
    pub lost: f64,
    pub sold: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub sellable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LandView {
    pub columns: usize,
    pub rows: usize,
    pub tiles: Vec<TileView>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeView {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: Category,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub resource_costs: Vec<(String, f64)>,
    pub owned: u32,
    pub max: Option<u32>,
    pub visible: bool,
    pub unblurred: bool,
    pub affordable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatorView {
    pub name: &'static str,
    pub owned: u32,
    pub enabled: bool,
    pub speed: f64,
    pub saturation: f64,
    pub no_power: bool,
}

impl Game {
    pub fn new(config: SimConfig) -> Self {
        Self::with_catalog(Arc::new(Catalog::standard()), config)
    }

    /// A fresh run over `catalog`. Catalog and config problems are logged;
    /// an invalid config is replaced by the defaults.
    pub fn with_catalog(catalog: Arc<Catalog>, config: SimConfig) -> Self {
        let config = match validate_config(&config) {
            Ok(()) => config,
            Err(err) => {
                error!(%err, "invalid config, using defaults");
                SimConfig::default()
            }
        };
        for finding in catalog.validate() {
            error!(%finding, "catalog inconsistency");
        }

        let mut ledger = catalog.new_ledger();
        ledger.wallet = Wallet::with_balance(config.starting_currency.round_dp(2));
        ledger.gain("seeds", STARTING_SEEDS);

        let mut state = SimState::new(config, ledger, LandGrid::new(0, 0));
        for up in catalog.upgrades() {
            if up.initial > 0 {
                state.owned.insert(up.name.to_string(), up.initial);
            }
        }
        state.land = LandGrid::new(
            state.owned(COLUMN_UPGRADE) as usize,
            state.owned(ROW_UPGRADE) as usize,
        );
        for up in catalog.upgrades() {
            let Effect::ClaimTile(template) = up.effect else {
                continue;
            };
            for _ in 0..up.initial {
                let tile = template.build(&mut state.rng);
                if let Err(err) = state.land.add_tile(tile) {
                    warn!(upgrade = up.name, %err, "starting tile does not fit");
                }
            }
        }

        let automators = vec![AutomatorState::default(); catalog.automators().len()];
        let mut game = Self {
            catalog,
            state,
            automators,
        };
        game.refresh_derived();
        info!(seed = game.state.config.rng_seed, tiles = game.state.land.len(), "new game");
        game
    }

    pub(crate) fn refresh_derived(&mut self) {
        calculator::recompute(self.catalog.calculators(), &mut self.state);
        upgrade::refresh_visibility(self.catalog.upgrades(), &mut self.state);
        for (def, auto) in self.catalog.automators().iter().zip(&mut self.automators) {
            if let Some(spec) = self.catalog.upgrade(def.upgrade).and_then(|u| u.automation) {
                auto.speed = spec.ticks_per_unit_speed * f64::from(self.state.owned(def.upgrade));
            }
        }
    }

    /// Advance the whole simulation by `elapsed` seconds: tiles, then
    /// visibility, then automators, then calculators.
    pub fn tick(&mut self, elapsed: f64) {
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return;
        }
        let quiet = elapsed > self.state.config.cosmetic_cutoff_secs;
        if quiet {
            debug!(elapsed, "long tick, cosmetic cues suppressed");
        }
        self.state.feed.set_quiet(quiet);
        self.state.clock += elapsed;

        self.state.update_tiles(elapsed);
        upgrade::refresh_visibility(self.catalog.upgrades(), &mut self.state);
        for (def, auto) in self.catalog.automators().iter().zip(self.automators.iter_mut()) {
            let Some(spec) = self.catalog.upgrade(def.upgrade).and_then(|u| u.automation) else {
                continue;
            };
            automator::run(def, spec, auto, &mut self.state, elapsed);
        }
        calculator::recompute(self.catalog.calculators(), &mut self.state);

        self.state.feed.set_quiet(false);
    }

    /// Route a click to tile `index`. Out-of-range clicks do nothing.
    pub fn click_tile(&mut self, index: usize, manual: bool) -> Reaction {
        self.state.click(index, manual).unwrap_or(Reaction::None)
    }

    pub fn purchase_upgrade(&mut self, name: &str) -> bool {
        let Some(up) = self.catalog.upgrade(name) else {
            warn!(upgrade = name, "purchase of unknown upgrade");
            return false;
        };
        let bought = upgrade::purchase(up, &mut self.state);
        if bought {
            calculator::recompute(self.catalog.calculators(), &mut self.state);
        }
        bought
    }

    /// Revert a claimed tile to empty land and give its plot back.
    pub fn sell_tile(&mut self, index: usize) -> bool {
        let Some(template) = self.state.land.get(index).and_then(TileTemplate::of) else {
            return false;
        };
        self.state.with_tile(index, false, |tile, ctx| tile.on_sell(ctx));
        if let Err(err) = self.state.land.replace(index, Tile::empty()) {
            error!(index, %err, "sold tile vanished");
            return false;
        }
        if let Some(up) = self.catalog.claim_upgrade(template) {
            let owned = self.state.owned(up.name);
            self.state.owned.insert(up.name.to_string(), owned.saturating_sub(1));
        }
        self.state.stats.tiles_sold += 1;
        calculator::recompute(self.catalog.calculators(), &mut self.state);
        info!(index, ?template, "tile sold");
        true
    }

    /// Flip an automator on or off. Returns the new enabled flag, `false` for
    /// unknown names.
    pub fn toggle_automator(&mut self, name: &str) -> bool {
        let found = self
            .catalog
            .automators()
            .iter()
            .position(|a| a.upgrade == name);
        match found.and_then(|i| self.automators.get_mut(i)) {
            Some(auto) => {
                auto.enabled = !auto.enabled;
                debug!(automator = name, enabled = auto.enabled, "automator toggled");
                auto.enabled
            }
            None => {
                warn!(automator = name, "toggle of unknown automator");
                false
            }
        }
    }

    /// Sell one batch of a resource; returns the proceeds.
    pub fn sell_resource(&mut self, name: &str) -> Decimal {
        self.state.ledger.sell(name)
    }

    pub fn reclaim_resource(&mut self, name: &str, amount: f64) -> f64 {
        self.state.ledger.reclaim(name, amount)
    }

    /// Answer a kiln's recipe request.
    pub fn select_recipe(&mut self, index: usize, recipe: &str) -> bool {
        match self.state.land.get_mut(index) {
            Some(Tile::Kiln(kiln)) => kiln.select_recipe(recipe),
            _ => false,
        }
    }

    pub fn select_windmill_product(&mut self, index: usize, product: &str) -> bool {
        match self.state.land.get_mut(index) {
            Some(Tile::Windmill(mill)) => mill.select_product(product),
            _ => false,
        }
    }

    /// Switch a windmill on or off; `None` when the tile is not a windmill.
    pub fn toggle_windmill(&mut self, index: usize) -> Option<bool> {
        match self.state.land.get_mut(index) {
            Some(Tile::Windmill(mill)) => Some(mill.toggle()),
            _ => None,
        }
    }

    /// Take everything the simulation wants to tell the UI.
    pub fn drain_feed(&mut self) -> FeedBatch {
        self.state.feed.drain()
    }

    pub fn resources(&self) -> Vec<ResourceView> {
        self.state
            .ledger
            .iter()
            .map(|r| ResourceView {
                name: r.id().0.clone(),
                title: r.def.title.clone(),
                icon: r.def.icon.clone(),
                owned: r.owned,
                capacity: r.capacity(),
                lost: r.lost,
                sold: r.sold,
                unit_price: r.unit_price(),
                sellable: r.def.sellable,
            })
            .collect()
    }

    pub fn land(&self) -> LandView {
        let land = &self.state.land;
        LandView {
            columns: land.columns(),
            rows: land.rows(),
            tiles: land.tiles().iter().enumerate().map(|(i, t)| t.view(i)).collect(),
        }
    }

    pub fn upgrades(&self) -> Vec<UpgradeView> {
        self.catalog
            .upgrades()
            .iter()
            .map(|up| {
                let owned = self.state.owned(up.name);
                UpgradeView {
                    name: up.name,
                    title: up.title,
                    description: up.description,
                    category: up.category,
                    cost: upgrade::cost(up, owned),
                    resource_costs: up
                        .resource_costs
                        .iter()
                        .map(|(id, n)| (id.0.clone(), *n))
                        .collect(),
                    owned,
                    max: up.max,
                    visible: self.state.visible.contains(up.name),
                    unblurred: self.state.unblurred.contains(up.name),
                    affordable: upgrade::can_purchase(up, &self.state),
                }
            })
            .collect()
    }

    pub fn automators(&self) -> Vec<AutomatorView> {
        self.catalog
            .automators()
            .iter()
            .zip(&self.automators)
            .map(|(def, auto)| AutomatorView {
                name: def.upgrade,
                owned: self.state.owned(def.upgrade),
                enabled: auto.enabled,
                speed: auto.speed,
                saturation: auto.saturation,
                no_power: auto.no_power,
            })
            .collect()
    }

    pub fn stats(&self) -> &Stats {
        &self.state.stats
    }

    pub fn balance(&self) -> Decimal {
        self.state.ledger.wallet.balance
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Read access for drivers and tests that need more than the views.
    pub fn state(&self) -> &SimState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileKind;

    fn rich() -> Game {
        Game::new(SimConfig {
            starting_currency: Decimal::new(1_000_000, 2),
            ..SimConfig::default()
        })
    }

    fn forest_index(game: &Game) -> usize {
        game.state
            .land
            .tiles()
            .iter()
            .position(|t| t.kind() == TileKind::Forest)
            .unwrap()
    }

    #[test]
    fn fresh_game_starts_with_a_forest_plot() {
        let game = Game::new(SimConfig::default());
        let land = game.land();
        assert_eq!((land.columns, land.rows), (2, 2));
        assert_eq!(land.tiles.len(), 4);
        assert_eq!(land.tiles[0].kind, TileKind::Forest);
        assert_eq!(game.state.ledger.owned("seeds"), STARTING_SEEDS);
        assert_eq!(game.state.derived.get(calculator::GROWTH_RATE), 1.0);
    }

    #[test]
    fn manual_forest_cycle_pays_out() {
        let mut game = Game::new(SimConfig::default());
        let i = forest_index(&game);
        for _ in 0..7 {
            game.click_tile(i, true);
        }
        game.tick(400.0);
        for _ in 0..8 {
            game.click_tile(i, true);
        }
        assert!(game.state.ledger.owned("wood") > 0.0);
        assert_eq!(game.stats().manual_clicks, 15);
        let before = game.balance();
        assert!(game.sell_resource("wood") > Decimal::ZERO);
        assert!(game.balance() > before);
    }

    #[test]
    fn out_of_range_click_is_ignored() {
        let mut game = Game::new(SimConfig::default());
        assert_eq!(game.click_tile(999, true), Reaction::None);
        assert_eq!(game.stats().manual_clicks, 0);
    }

    #[test]
    fn buying_and_selling_a_plot() {
        let mut game = rich();
        assert!(game.purchase_upgrade("pond"));
        assert_eq!(game.state.land.count(TileKind::Pond), 1);
        let pond = game
            .state
            .land
            .tiles()
            .iter()
            .position(|t| t.kind() == TileKind::Pond)
            .unwrap();
        assert!(game.sell_tile(pond));
        assert_eq!(game.state.land.count(TileKind::Pond), 0);
        assert_eq!(game.state.owned("pond"), 0);
        assert_eq!(game.stats().tiles_sold, 1);
        assert!(!game.sell_tile(pond));
        assert!(!game.purchase_upgrade("no_such_upgrade"));
    }

    #[test]
    fn land_grows_with_column_purchase() {
        let mut game = rich();
        assert!(game.purchase_upgrade(COLUMN_UPGRADE));
        let land = game.land();
        assert_eq!((land.columns, land.rows, land.tiles.len()), (3, 2, 6));
    }

    #[test]
    fn automators_run_during_tick() {
        let mut game = rich();
        game.state.owned.insert("auto_seller".to_string(), 10);
        game.state.ledger.gain("fish", 5.0);
        game.tick(1.0);
        assert_eq!(game.state.ledger.owned("fish"), 0.0);
        assert_eq!(game.stats().automator_runs, 1);

        assert!(!game.toggle_automator("auto_seller"));
        game.state.ledger.gain("fish", 5.0);
        game.tick(1.0);
        assert_eq!(game.state.ledger.owned("fish"), 5.0);
        assert!(!game.toggle_automator("ghost"));
        let view = game.automators();
        let seller = view.iter().find(|a| a.name == "auto_seller").unwrap();
        assert!(!seller.enabled);
        assert_eq!(seller.owned, 10);
    }

    #[test]
    fn automator_speed_is_known_before_the_first_tick() {
        let mut game = rich();
        game.state.owned.insert("auto_seller".to_string(), 3);
        let restored = Game::from_save(game.to_save(None), SimConfig::default());
        let view = restored.automators();
        let seller = view.iter().find(|a| a.name == "auto_seller").unwrap();
        assert!((seller.speed - 0.3).abs() < 1e-9);
        assert_eq!(restored.state.clock, 0.0);
    }

    #[test]
    fn long_tick_is_quiet_but_still_productive() {
        let mut game = Game::new(SimConfig::default());
        let i = forest_index(&game);
        for _ in 0..7 {
            game.click_tile(i, true);
        }
        game.drain_feed();
        game.tick(60.0);
        assert!(game.state.land.get(i).unwrap().stage() >= 2);
        game.tick(f64::NAN);
        game.tick(-1.0);
        assert_eq!(game.state.clock, 60.0);
        assert!(game.drain_feed().cues.is_empty());
    }

    #[test]
    fn kiln_and_windmill_selection() {
        let mut game = rich();
        game.state.ledger.gain("clay", 10.0);
        assert!(game.purchase_upgrade("kiln"));
        let kiln = game
            .state
            .land
            .tiles()
            .iter()
            .position(|t| t.kind() == TileKind::Kiln)
            .unwrap();
        assert_eq!(game.click_tile(kiln, true), Reaction::ChooseRecipe);
        assert!(!game.drain_feed().requests.is_empty());
        assert!(game.select_recipe(kiln, "bricks"));
        assert!(!game.select_recipe(kiln, "gold"));
        assert!(!game.select_windmill_product(kiln, "energy"));
        assert_eq!(game.toggle_windmill(kiln), None);
    }

    #[test]
    fn views_cover_the_catalog() {
        let game = Game::new(SimConfig::default());
        assert_eq!(game.resources().len(), game.catalog().resources().len());
        let ups = game.upgrades();
        assert_eq!(ups.len(), game.catalog().upgrades().len());
        let plot = ups.iter().find(|u| u.name == "forest_plot").unwrap();
        assert_eq!(plot.owned, 1);
        assert!(!plot.affordable);
        assert_eq!(game.automators().len(), game.catalog().automators().len());
    }

    #[test]
    fn invalid_config_falls_back_to_defaults() {
        let game = Game::new(SimConfig {
            visibility_threshold: f64::NAN,
            ..SimConfig::default()
        });
        assert_eq!(game.state.config, SimConfig::default());
    }

    #[test]
    fn game_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Game>();
    }
}
