//! Mines: clear the rock, tunnel with wooden support beams, then work the
//! cave until the vein runs dry and a deeper tunnel is needed.

use crate::automator::AutomatorDef;
use crate::calculator::{Calculator, EXCAVATOR_POWER, MINER_POWER, TUNNELER_POWER};
use crate::catalog::Catalog;
use crate::feed::CueKind;
use crate::state::SimState;
use crate::tile::{Progress, Reaction, Tile, TileCtx, TileKind};
use crate::upgrade::{Category, Effect, TileTemplate, Upgrade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::ResourceDef;
use tracing::debug;

/// Wood spent on each tunnelling level.
pub const BEAM_WOOD: f64 = 5.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MineSubtype {
    #[default]
    Clay,
    Metal,
    Diamond,
}

/// Per-subtype level tables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MineTable {
    pub resource: &'static str,
    pub opening_levels: u32,
    pub tunneling_levels: u32,
    pub clicks_per_resource: f64,
    pub max_per_level: u32,
}

impl MineSubtype {
    pub const ALL: [MineSubtype; 3] = [MineSubtype::Clay, MineSubtype::Metal, MineSubtype::Diamond];

    pub fn table(self) -> MineTable {
        match self {
            MineSubtype::Clay => MineTable {
                resource: "clay",
                opening_levels: 1,
                tunneling_levels: 2,
                clicks_per_resource: 2.0,
                max_per_level: 10,
            },
            MineSubtype::Metal => MineTable {
                resource: "metal",
                opening_levels: 2,
                tunneling_levels: 3,
                clicks_per_resource: 4.0,
                max_per_level: 6,
            },
            MineSubtype::Diamond => MineTable {
                resource: "diamond",
                opening_levels: 3,
                tunneling_levels: 4,
                clicks_per_resource: 10.0,
                max_per_level: 3,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MineState {
    #[default]
    Rock,
    Tunnel,
    Cave,
}

impl MineState {
    pub fn label(self) -> &'static str {
        match self {
            MineState::Rock => "rock",
            MineState::Tunnel => "tunnel",
            MineState::Cave => "cave",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Mine {
    pub(crate) subtype: MineSubtype,
    pub(crate) state: MineState,
    pub(crate) progress: Progress,
    /// Levels completed in the current phase.
    pub(crate) level: u32,
    /// Depth: caves exhausted so far.
    pub(crate) stage: u32,
    /// Units taken from the current cave.
    pub(crate) mined: u32,
    pub(crate) blocked: bool,
}

impl Mine {
    pub fn new(subtype: MineSubtype) -> Self {
        Self {
            subtype,
            ..Self::default()
        }
    }

    pub fn subtype(&self) -> MineSubtype {
        self.subtype
    }

    pub fn state(&self) -> MineState {
        self.state
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn click(&mut self, ctx: &mut TileCtx<'_>) -> Reaction {
        let table = self.subtype.table();
        match self.state {
            MineState::Rock => {
                if self.progress.push(ctx.derived.get(EXCAVATOR_POWER)) {
                    self.progress.reset();
                    self.level += 1;
                    if self.level >= table.opening_levels {
                        self.state = MineState::Tunnel;
                        self.level = 0;
                        ctx.stats.rocks_cleared += 1;
                        debug!(subtype = ?self.subtype, "rock cleared");
                    }
                }
            }
            MineState::Tunnel => {
                if self.progress.push(ctx.derived.get(TUNNELER_POWER)) {
                    if !ctx.ledger.incur("wood", BEAM_WOOD) {
                        self.blocked = true;
                        ctx.fail(format!("Need {BEAM_WOOD} wood for a support beam."));
                        return Reaction::None;
                    }
                    self.blocked = false;
                    self.progress.reset();
                    self.level += 1;
                    ctx.stats.beams_placed += 1;
                    if self.level >= table.tunneling_levels {
                        self.state = MineState::Cave;
                        self.level = 0;
                        self.mined = 0;
                        ctx.feed.cue(CueKind::Sparkle, 0.8);
                        debug!(subtype = ?self.subtype, depth = self.stage, "cave opened");
                    }
                }
            }
            MineState::Cave => {
                let power = ctx.derived.get(MINER_POWER) / table.clicks_per_resource;
                if self.progress.push(power) {
                    self.progress.reset();
                    ctx.ledger.gain(table.resource, 1.0);
                    ctx.stats.resources_mined += 1;
                    self.mined += 1;
                    if self.mined >= table.max_per_level {
                        self.state = MineState::Tunnel;
                        self.level = 0;
                        self.mined = 0;
                        self.stage += 1;
                        ctx.feed.notice("The vein is exhausted. Tunnel deeper.");
                    }
                }
            }
        }
        Reaction::None
    }

    pub fn icon(&self) -> &'static str {
        match self.state {
            MineState::Rock => "🪨",
            MineState::Tunnel => "⛏️",
            MineState::Cave => match self.subtype {
                MineSubtype::Clay => "🧱",
                MineSubtype::Metal => "🔩",
                MineSubtype::Diamond => "💎",
            },
        }
    }

    pub fn tooltip(&self) -> String {
        let table = self.subtype.table();
        match self.state {
            MineState::Rock => format!(
                "{:?} mine: rock, {}/{} cleared.",
                self.subtype, self.level, table.opening_levels
            ),
            MineState::Tunnel if self.blocked => format!("Blocked. Needs {BEAM_WOOD} wood for a beam."),
            MineState::Tunnel => format!(
                "Tunnel at depth {}, {}/{} beams.",
                self.stage, self.level, table.tunneling_levels
            ),
            MineState::Cave => format!(
                "Cave: {} of {} {} taken.",
                self.mined, table.max_per_level, table.resource
            ),
        }
    }
}

fn auto_mine(state: &mut SimState, _owned: u32) {
    let wood_ok = state.ledger.owned("wood") >= BEAM_WOOD;
    state.click_first(|t| matches!(t, Tile::Mine(m) if !m.blocked || wood_ok));
}

fn excavator_power(s: &SimState) -> f64 {
    0.25 * (1.0 + f64::from(s.owned("shovel")))
}

fn tunneler_power(s: &SimState) -> f64 {
    0.25 * (1.0 + f64::from(s.owned("drill")))
}

fn miner_power(s: &SimState) -> f64 {
    1.0 + f64::from(s.owned("pickaxe"))
}

fn has_mine(s: &SimState) -> bool {
    s.land.count(TileKind::Mine) > 0
}

pub fn register(catalog: &mut Catalog) {
    catalog.add_resource(ResourceDef::new("clay", "Clay", "🟤", 20.0, 200));
    catalog.add_resource(ResourceDef::new("metal", "Metal", "🔩", 10.0, 600));
    catalog.add_resource(ResourceDef::new("diamond", "Diamond", "💎", 5.0, 5000));

    catalog.add_upgrade(
        Upgrade::new("clay_mine", "Clay mine", Category::Land, 5000)
            .describe("Dig for clay.")
            .growth(160)
            .needs("wood", 10.0)
            .effect(Effect::ClaimTile(TileTemplate::Mine(MineSubtype::Clay))),
    );
    catalog.add_upgrade(
        Upgrade::new("metal_mine", "Metal mine", Category::Land, 20000)
            .describe("Dig for metal ore.")
            .growth(170)
            .needs("wood", 20.0)
            .effect(Effect::ClaimTile(TileTemplate::Mine(MineSubtype::Metal)))
            .visible_when(has_mine),
    );
    catalog.add_upgrade(
        Upgrade::new("diamond_mine", "Diamond mine", Category::Land, 100000)
            .describe("Dig for diamonds.")
            .growth(200)
            .needs("wood", 40.0)
            .needs("metal", 5.0)
            .effect(Effect::ClaimTile(TileTemplate::Mine(MineSubtype::Diamond)))
            .visible_when(has_mine),
    );
    catalog.add_upgrade(
        Upgrade::new("shovel", "Shovel", Category::Tool, 3000)
            .describe("Clear rock faster.")
            .growth(180)
            .max(3)
            .visible_when(has_mine),
    );
    catalog.add_upgrade(
        Upgrade::new("drill", "Drill", Category::Tool, 8000)
            .describe("Tunnel faster.")
            .growth(180)
            .max(3)
            .needs("metal", 2.0)
            .visible_when(has_mine),
    );
    catalog.add_upgrade(
        Upgrade::new("pickaxe", "Pickaxe", Category::Tool, 6000)
            .describe("Mine caves faster.")
            .growth(180)
            .max(4)
            .visible_when(has_mine),
    );
    catalog.add_upgrade(
        Upgrade::new("clay_pit", "Clay pit", Category::Storage, 4000)
            .describe("Store more clay.")
            .growth(160)
            .effect(Effect::StorageLevel("clay")),
    );
    catalog.add_upgrade(
        Upgrade::new("ore_crate", "Ore crate", Category::Storage, 9000)
            .describe("Store more metal.")
            .growth(160)
            .effect(Effect::StorageLevel("metal")),
    );
    catalog.add_upgrade(
        Upgrade::new("jeweler", "Jeweler", Category::Market, 50000)
            .describe("Diamonds sell for 50% more.")
            .growth(250)
            .max(3)
            .effect(Effect::PriceMultiplier("diamond", Decimal::new(150, 2))),
    );
    catalog.add_upgrade(
        Upgrade::new("auto_miner", "Auto miner", Category::Automation, 25000)
            .describe("Works your mines. Runs on energy.")
            .growth(180)
            .automation(1.0, Some(0.2))
            .visible_when(has_mine),
    );

    catalog.add_automator(AutomatorDef::new("auto_miner", auto_mine));

    catalog.add_calculator(Calculator::new(EXCAVATOR_POWER, excavator_power));
    catalog.add_calculator(Calculator::new(TUNNELER_POWER, tunneler_power));
    catalog.add_calculator(Calculator::new(MINER_POWER, miner_power));
}
