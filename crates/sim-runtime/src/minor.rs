//! Empty land, donut shops and monsters.

use crate::automator::AutomatorDef;
use crate::calculator::{Calculator, DONUT_YIELD};
use crate::catalog::Catalog;
use crate::state::SimState;
use crate::tile::{Reaction, Tile, TileCtx, TileKind};
use crate::upgrade::{Category, Effect, TileTemplate, Upgrade};
use serde::{Deserialize, Serialize};
use sim_core::ResourceDef;

/// Unclaimed land.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Empty {}

impl Empty {
    pub fn click(&mut self, ctx: &mut TileCtx<'_>) -> Reaction {
        ctx.feed.notice("This land is unclaimed. Buy a tile to use it.");
        Reaction::BuyTile
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Donut {
    pub(crate) baked: u64,
    /// Fraction of a donut carried into the next batch.
    pub(crate) partial: f64,
}

impl Donut {
    /// Make `donutYield × multiplier` donuts.
    pub fn bake(&mut self, multiplier: f64, ctx: &mut TileCtx<'_>) {
        let amount = ctx.derived.get(DONUT_YIELD) * multiplier;
        let made = ctx.ledger.gain("donuts", amount);
        let total = self.partial.max(0.0) + made;
        let whole = total.floor();
        self.partial = total - whole;
        self.baked += whole as u64;
        ctx.stats.donuts_made += whole as u64;
    }

    pub fn click(&mut self, ctx: &mut TileCtx<'_>) -> Reaction {
        self.bake(1.0, ctx);
        Reaction::None
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Monster {
    pub(crate) pokes: u64,
}

impl Monster {
    pub fn click(&mut self, ctx: &mut TileCtx<'_>) -> Reaction {
        self.pokes += 1;
        ctx.stats.monster_pokes += 1;
        ctx.feed.notice("The monster glares at you. Prepare for battle!");
        Reaction::Battle
    }
}

/// Every owned oven bakes a batch in each donut shop.
fn donut_oven(state: &mut SimState, owned: u32) {
    for index in 0..state.land.len() {
        if matches!(state.land.get(index), Some(Tile::Donut(_))) {
            state.with_tile(index, false, |tile, ctx| {
                if let Tile::Donut(shop) = tile {
                    shop.bake(f64::from(owned), ctx);
                }
            });
        }
    }
}

fn donut_yield(s: &SimState) -> f64 {
    1.0 + f64::from(s.owned("donut_glaze"))
}

fn has_donut_shop(s: &SimState) -> bool {
    s.land.count(TileKind::Donut) > 0
}

pub fn register(catalog: &mut Catalog) {
    catalog.add_resource(ResourceDef::new("donuts", "Donuts", "🍩", 100.0, 100).auto_sell());

    catalog.add_upgrade(
        Upgrade::new("donut_shop", "Donut shop", Category::Land, 30000)
            .describe("Click for donuts.")
            .growth(200)
            .max(4)
            .needs("flour", 5.0)
            .effect(Effect::ClaimTile(TileTemplate::Donut)),
    );
    catalog.add_upgrade(
        Upgrade::new("monster_lair", "Monster lair", Category::Land, 66600)
            .describe("Something lives here.")
            .max(1)
            .effect(Effect::ClaimTile(TileTemplate::Monster)),
    );
    catalog.add_upgrade(
        Upgrade::new("donut_glaze", "Donut glaze", Category::Tool, 20000)
            .describe("Each batch makes one more donut.")
            .growth(200)
            .max(5)
            .visible_when(has_donut_shop),
    );
    catalog.add_upgrade(
        Upgrade::new("donut_oven", "Donut oven", Category::Automation, 40000)
            .describe("Bakes donuts in every shop.")
            .growth(180)
            .automation(1.0, None)
            .visible_when(has_donut_shop),
    );

    catalog.add_automator(AutomatorDef::new("donut_oven", donut_oven));
    catalog.add_calculator(Calculator::new(DONUT_YIELD, donut_yield));
}
