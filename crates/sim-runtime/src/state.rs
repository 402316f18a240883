//! Mutable state of one run, shared by tiles, upgrades, automators and
//! calculators.

use crate::calculator::Derived;
use crate::feed::{Feed, UiRequest};
use crate::land::LandGrid;
use crate::tile::{Reaction, Tile, TileCtx};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::{Ledger, SimConfig, Stats};
use std::collections::{BTreeMap, BTreeSet};

pub struct SimState {
    pub ledger: Ledger,
    pub land: LandGrid,
    /// Purchase count per upgrade name.
    pub owned: BTreeMap<String, u32>,
    /// Upgrades revealed to the player. Never shrinks.
    pub visible: BTreeSet<String>,
    /// Upgrades shown with full detail. Never shrinks.
    pub unblurred: BTreeSet<String>,
    pub stats: Stats,
    pub feed: Feed,
    pub rng: ChaCha8Rng,
    pub derived: Derived,
    pub config: SimConfig,
    /// Simulated seconds since the run started.
    pub clock: f64,
}

impl SimState {
    pub fn new(config: SimConfig, ledger: Ledger, land: LandGrid) -> Self {
        Self {
            ledger,
            land,
            owned: BTreeMap::new(),
            visible: BTreeSet::new(),
            unblurred: BTreeSet::new(),
            stats: Stats::default(),
            feed: Feed::default(),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            derived: Derived::default(),
            config,
            clock: 0.0,
        }
    }

    /// Purchase count of an upgrade, zero when never bought.
    pub fn owned(&self, upgrade: &str) -> u32 {
        self.owned.get(upgrade).copied().unwrap_or(0)
    }

    /// Run `f` against tile `index` with a context borrowing the rest of the
    /// state. Messages queued meanwhile are attributed to that tile.
    pub fn with_tile<R>(
        &mut self,
        index: usize,
        manual: bool,
        f: impl FnOnce(&mut Tile, &mut TileCtx<'_>) -> R,
    ) -> Option<R> {
        let neighbors = self.land.neighbors(index);
        let tile = self.land.get_mut(index)?;
        self.feed.focus(Some(index));
        let mut ctx = TileCtx {
            ledger: &mut self.ledger,
            stats: &mut self.stats,
            feed: &mut self.feed,
            rng: &mut self.rng,
            derived: &self.derived,
            neighbors: &neighbors,
            manual,
        };
        let out = f(tile, &mut ctx);
        self.feed.focus(None);
        Some(out)
    }

    /// Route a click to tile `index`. Hand-offs are queued as UI requests.
    pub fn click(&mut self, index: usize, manual: bool) -> Option<Reaction> {
        let reaction = self.with_tile(index, manual, |tile, ctx| tile.click(ctx))?;
        if manual {
            self.stats.manual_clicks += 1;
        }
        let request = match reaction {
            Reaction::None => None,
            Reaction::ChooseRecipe => Some(UiRequest::ChooseRecipe { tile: index }),
            Reaction::ChooseProduct => Some(UiRequest::ChooseProduct { tile: index }),
            Reaction::BuyTile => Some(UiRequest::BuyTile { tile: index }),
            Reaction::Battle => Some(UiRequest::Battle { tile: index }),
        };
        if let Some(request) = request {
            self.feed.request(request);
        }
        Some(reaction)
    }

    /// Automated click on the first tile accepted by `pick`. Returns whether a
    /// tile was found.
    pub fn click_first(&mut self, pick: impl Fn(&Tile) -> bool) -> bool {
        match self.land.tiles().iter().position(pick) {
            Some(index) => self.click(index, false).is_some(),
            None => false,
        }
    }

    /// Advance every tile by `dt`, in grid order.
    pub fn update_tiles(&mut self, dt: f64) {
        for index in 0..self.land.len() {
            self.with_tile(index, false, |tile, ctx| tile.update(dt, ctx));
        }
    }
}
