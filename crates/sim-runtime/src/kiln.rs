//! Kilns turn raw materials into goods, one timed batch at a time.

use crate::automator::AutomatorDef;
use crate::catalog::Catalog;
use crate::feed::CueKind;
use crate::state::SimState;
use crate::tile::{Reaction, Tile, TileCtx, TileKind};
use crate::upgrade::{Category, Effect, TileTemplate, Upgrade};
use serde::{Deserialize, Serialize};
use sim_core::{ResourceDef, ResourceId};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Recipe {
    pub id: &'static str,
    pub title: &'static str,
    pub inputs: &'static [(&'static str, f64)],
    pub output: &'static str,
    pub yield_amount: f64,
    pub seconds: f64,
}

pub const RECIPES: &[Recipe] = &[
    Recipe {
        id: "bricks",
        title: "Bricks",
        inputs: &[("clay", 2.0), ("wood", 1.0)],
        output: "bricks",
        yield_amount: 1.0,
        seconds: 5.0,
    },
    Recipe {
        id: "charcoal",
        title: "Charcoal",
        inputs: &[("wood", 5.0)],
        output: "charcoal",
        yield_amount: 2.0,
        seconds: 4.0,
    },
    Recipe {
        id: "ingots",
        title: "Ingots",
        inputs: &[("metal", 2.0), ("charcoal", 2.0)],
        output: "ingots",
        yield_amount: 1.0,
        seconds: 8.0,
    },
];

pub fn recipe(id: &str) -> Option<&'static Recipe> {
    RECIPES.iter().find(|r| r.id == id)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KilnState {
    #[default]
    Unset,
    Open,
    Baking,
}

impl KilnState {
    pub fn label(self) -> &'static str {
        match self {
            KilnState::Unset => "unset",
            KilnState::Open => "open",
            KilnState::Baking => "baking",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Kiln {
    pub(crate) state: KilnState,
    pub(crate) recipe: Option<String>,
    pub(crate) timer: f64,
    pub(crate) no_bake: bool,
}

impl Kiln {
    pub fn state(&self) -> KilnState {
        self.state
    }

    pub fn active_recipe(&self) -> Option<&'static Recipe> {
        self.recipe.as_deref().and_then(recipe)
    }

    /// Answer to a recipe request. Refused mid-bake or for unknown recipes.
    pub fn select_recipe(&mut self, id: &str) -> bool {
        if self.state == KilnState::Baking || recipe(id).is_none() {
            return false;
        }
        self.recipe = Some(id.to_string());
        self.state = KilnState::Open;
        self.no_bake = false;
        true
    }

    pub fn bake_fraction(&self) -> f64 {
        match (self.state, self.active_recipe()) {
            (KilnState::Baking, Some(r)) => (self.timer / r.seconds).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    pub fn update(&mut self, dt: f64, ctx: &mut TileCtx<'_>) {
        if self.state != KilnState::Baking {
            return;
        }
        let Some(r) = self.active_recipe() else {
            self.state = KilnState::Unset;
            self.timer = 0.0;
            return;
        };
        self.timer += dt;
        if self.timer >= r.seconds {
            ctx.ledger.gain(r.output, r.yield_amount);
            ctx.stats.bakes += 1;
            ctx.feed.notice(format!("Baked {} {}.", r.yield_amount, r.title.to_lowercase()));
            self.state = KilnState::Open;
            self.timer = 0.0;
            debug!(recipe = r.id, "bake finished");
        }
    }

    pub fn click(&mut self, ctx: &mut TileCtx<'_>) -> Reaction {
        let Some(r) = self.active_recipe() else {
            return Reaction::ChooseRecipe;
        };
        match self.state {
            KilnState::Unset => Reaction::ChooseRecipe,
            KilnState::Baking => Reaction::None,
            KilnState::Open => {
                let costs: Vec<(ResourceId, f64)> =
                    r.inputs.iter().map(|(id, n)| (ResourceId::new(id), *n)).collect();
                if ctx.ledger.incur_all(&costs) {
                    self.state = KilnState::Baking;
                    self.timer = 0.0;
                    self.no_bake = false;
                    ctx.feed.cue(CueKind::Bake, r.seconds);
                } else {
                    self.no_bake = true;
                    ctx.fail(format!("Not enough ingredients for {}.", r.title.to_lowercase()));
                }
                Reaction::None
            }
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.state {
            KilnState::Baking => "🔥",
            _ => "🏺",
        }
    }

    pub fn tooltip(&self) -> String {
        match (self.state, self.active_recipe()) {
            (KilnState::Baking, Some(r)) => {
                format!("Baking {}: {:.0}s left.", r.title.to_lowercase(), (r.seconds - self.timer).max(0.0))
            }
            (KilnState::Open, Some(r)) if self.no_bake => format!("Missing ingredients for {}.", r.title.to_lowercase()),
            (KilnState::Open, Some(r)) => format!("Ready to bake {}.", r.title.to_lowercase()),
            _ => "Choose a recipe.".to_string(),
        }
    }
}

fn auto_bake(state: &mut SimState, _owned: u32) {
    state.click_first(|t| matches!(t, Tile::Kiln(k) if k.state == KilnState::Open));
}

fn has_kiln(s: &SimState) -> bool {
    s.land.count(TileKind::Kiln) > 0
}

pub fn register(catalog: &mut Catalog) {
    catalog.add_resource(ResourceDef::new("bricks", "Bricks", "🧱", 20.0, 800));
    catalog.add_resource(ResourceDef::new("charcoal", "Charcoal", "⚫", 20.0, 400));
    catalog.add_resource(ResourceDef::new("ingots", "Ingots", "🪙", 10.0, 2000));

    catalog.add_upgrade(
        Upgrade::new("kiln", "Kiln", Category::Land, 15000)
            .describe("Bake clay, wood and metal into goods. Trees nearby wilt.")
            .growth(180)
            .needs("clay", 10.0)
            .effect(Effect::ClaimTile(TileTemplate::Kiln)),
    );
    catalog.add_upgrade(
        Upgrade::new("auto_baker", "Auto baker", Category::Automation, 30000)
            .describe("Restarts idle kilns. Runs on energy.")
            .growth(180)
            .automation(0.25, Some(0.1))
            .visible_when(has_kiln),
    );

    catalog.add_automator(AutomatorDef::new("auto_baker", auto_bake));
}
