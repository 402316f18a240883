//! Forest plots: dig a hole, plant a seed, let the tree grow, chop it.
//!
//! A tree ages at the `growthRate` calculator's pace (slowed to a tenth next
//! to a kiln) through ten stages. Past maturity its health falls until it dies
//! of old age, at which point it fells itself and reseeds. Chopping yields
//! wood proportional to the stage, a seed back, fruit for mature fruit trees
//! and a few chance rolls, including an evolution of the plot's variant driven
//! by what grows next to it.

use crate::automator::AutomatorDef;
use crate::calculator::{
    Calculator, CHOP_POWER, GROWTH_RATE, LUCKY_SEED_CHANCE, SELF_SEED_CHANCE,
};
use crate::catalog::Catalog;
use crate::feed::CueKind;
use crate::state::SimState;
use crate::tile::{Neighbor, Progress, Reaction, Tile, TileCtx, TileKind};
use crate::upgrade::{Category, Effect, TileTemplate, Upgrade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::ResourceDef;
use sim_econ::roll;
use tracing::debug;

pub const DIG_POWER: f64 = 0.2;
pub const PLANT_POWER: f64 = 0.5;
pub const STAGE_SECONDS: f64 = 30.0;
pub const STAGES: u32 = 10;
pub const BASE_WOOD: f64 = 10.0;
pub const FRUIT_YIELD: f64 = 3.0;
/// Growth factor for trees next to a kiln.
pub const KILN_SICKNESS: f64 = 0.1;
pub const MATURITY_SECONDS: f64 = STAGE_SECONDS * STAGES as f64;
pub const DEATH_AGE: f64 = 2.0 * MATURITY_SECONDS;
/// Seeds a new run starts with.
pub const STARTING_SEEDS: f64 = 4.0;
const MAX_LIFETIMES_PER_UPDATE: usize = 10_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ForestState {
    #[default]
    Empty,
    Hole,
    Tree,
}

impl ForestState {
    pub fn label(self) -> &'static str {
        match self {
            ForestState::Empty => "empty",
            ForestState::Hole => "hole",
            ForestState::Tree => "tree",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreeVariant {
    #[default]
    Normal,
    Apple,
    Lemon,
    Cherry,
}

impl TreeVariant {
    /// Fruit harvested from a mature tree of this variant.
    pub fn fruit(self) -> Option<&'static str> {
        match self {
            TreeVariant::Normal => None,
            TreeVariant::Apple => Some("apples"),
            TreeVariant::Lemon => Some("lemons"),
            TreeVariant::Cherry => Some("cherries"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Pattern {
    Tree(TreeVariant),
    Kind(TileKind),
}

impl Pattern {
    fn matches(self, n: &Neighbor) -> bool {
        match self {
            Pattern::Tree(v) => n.tree == Some(v),
            Pattern::Kind(k) => n.kind == k,
        }
    }
}

struct Evolution {
    target: TreeVariant,
    /// Each pattern must be met by a different neighbour.
    requires: &'static [Pattern],
    chance: f64,
    from: &'static [TreeVariant],
}

const EVOLUTIONS: &[Evolution] = &[
    Evolution {
        target: TreeVariant::Apple,
        requires: &[Pattern::Tree(TreeVariant::Normal), Pattern::Tree(TreeVariant::Normal)],
        chance: 0.10,
        from: &[TreeVariant::Normal],
    },
    Evolution {
        target: TreeVariant::Lemon,
        requires: &[Pattern::Tree(TreeVariant::Apple), Pattern::Kind(TileKind::Pond)],
        chance: 0.08,
        from: &[TreeVariant::Normal, TreeVariant::Apple],
    },
    Evolution {
        target: TreeVariant::Cherry,
        requires: &[Pattern::Tree(TreeVariant::Apple), Pattern::Tree(TreeVariant::Lemon)],
        chance: 0.05,
        from: &[TreeVariant::Apple, TreeVariant::Lemon],
    },
];

/// Assign every pattern to a distinct neighbour.
fn satisfied(patterns: &[Pattern], neighbors: &[Neighbor], used: &mut [bool]) -> bool {
    let Some((first, rest)) = patterns.split_first() else {
        return true;
    };
    for (i, n) in neighbors.iter().enumerate() {
        if used[i] || !first.matches(n) {
            continue;
        }
        used[i] = true;
        if satisfied(rest, neighbors, used) {
            return true;
        }
        used[i] = false;
    }
    false
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Forest {
    pub(crate) state: ForestState,
    pub(crate) variant: TreeVariant,
    pub(crate) progress: Progress,
    pub(crate) age: f64,
    pub(crate) stage: u32,
    pub(crate) no_seeds: bool,
}

impl Forest {
    pub fn state(&self) -> ForestState {
        self.state
    }

    pub fn variant(&self) -> TreeVariant {
        self.variant
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn standing_variant(&self) -> Option<TreeVariant> {
        (self.state == ForestState::Tree).then_some(self.variant)
    }

    pub fn is_mature(&self) -> bool {
        self.state == ForestState::Tree && self.stage + 1 >= STAGES
    }

    /// 1 until maturity, then falling linearly to 0 at the death age.
    pub fn health(&self) -> f64 {
        if self.age <= MATURITY_SECONDS {
            1.0
        } else {
            ((DEATH_AGE - self.age) / (DEATH_AGE - MATURITY_SECONDS)).clamp(0.0, 1.0)
        }
    }

    /// Age the tree. A tree that withers mid-step reseeds and the rest of
    /// the step goes to the new sapling, so one long step lands where many
    /// short ones would.
    pub fn update(&mut self, dt: f64, ctx: &mut TileCtx<'_>) {
        if self.state != ForestState::Tree || dt <= 0.0 {
            return;
        }
        let sickness = if ctx.next_to(TileKind::Kiln) { KILN_SICKNESS } else { 1.0 };
        let rate = ctx.derived.get(GROWTH_RATE) * sickness;
        if rate <= 0.0 {
            return;
        }
        let mut left = dt;
        for _ in 0..MAX_LIFETIMES_PER_UPDATE {
            if left <= 0.0 || self.state != ForestState::Tree {
                return;
            }
            let to_death = ((DEATH_AGE - self.age) / rate).max(0.0);
            if left < to_death {
                self.age += left * rate;
                left = 0.0;
            } else {
                self.age = self.age.max(DEATH_AGE);
                left -= to_death;
            }
            let stage = ((self.age / STAGE_SECONDS) as u32).min(STAGES - 1);
            if stage > self.stage {
                self.stage = stage;
                ctx.feed.cue(CueKind::Grow, 0.5);
            }
            if self.health() <= 0.0 {
                debug!(age = self.age, "tree died of old age");
                self.fell(ctx);
            }
        }
        debug!(left, "forest update hit the lifetime cap, rest of step dropped");
    }

    pub fn click(&mut self, ctx: &mut TileCtx<'_>) -> Reaction {
        match self.state {
            ForestState::Empty => {
                if self.progress.push(DIG_POWER) {
                    self.progress.reset();
                    self.state = ForestState::Hole;
                    ctx.stats.holes_dug += 1;
                }
            }
            ForestState::Hole => {
                if self.progress.push(PLANT_POWER) {
                    if ctx.ledger.incur("seeds", 1.0) {
                        self.progress.reset();
                        self.state = ForestState::Tree;
                        self.age = 0.0;
                        self.stage = 0;
                        self.no_seeds = false;
                        ctx.stats.trees_planted += 1;
                        ctx.feed.cue(CueKind::Grow, 0.5);
                    } else {
                        self.no_seeds = true;
                        ctx.fail("No seeds to plant.");
                    }
                }
            }
            ForestState::Tree => {
                if self.progress.push(ctx.derived.get(CHOP_POWER)) {
                    self.fell(ctx);
                }
            }
        }
        Reaction::None
    }

    fn fell(&mut self, ctx: &mut TileCtx<'_>) {
        let wood = BASE_WOOD * f64::from(self.stage + 1) / f64::from(STAGES);
        ctx.ledger.gain("wood", wood);
        ctx.ledger.gain("seeds", 1.0);
        if let Some(fruit) = self.variant.fruit() {
            if self.stage + 1 >= STAGES {
                ctx.ledger.gain(fruit, FRUIT_YIELD);
                ctx.stats.fruit_harvested += 1;
            }
        }
        if roll(&mut *ctx.rng, ctx.derived.get(LUCKY_SEED_CHANCE)) {
            ctx.ledger.gain("seeds", 1.0);
            ctx.stats.lucky_seeds += 1;
            ctx.feed.notice("Found an extra seed!");
        }
        let withered = self.age >= DEATH_AGE;
        let reseed = withered || roll(&mut *ctx.rng, ctx.derived.get(SELF_SEED_CHANCE));
        self.evolve(ctx);

        ctx.stats.trees_chopped += 1;
        self.progress.reset();
        self.age = 0.0;
        self.stage = 0;
        if reseed {
            self.state = ForestState::Tree;
            ctx.stats.trees_self_seeded += 1;
            ctx.feed.cue(CueKind::Grow, 0.5);
        } else {
            self.state = ForestState::Empty;
        }
        debug!(wood, reseed, variant = ?self.variant, "tree felled");
    }

    /// The first rule this plot qualifies for gets one roll.
    fn evolve(&mut self, ctx: &mut TileCtx<'_>) {
        let mut used = [false; 4];
        let rule = EVOLUTIONS.iter().find(|rule| {
            used.iter_mut().for_each(|u| *u = false);
            rule.from.contains(&self.variant)
                && ctx.neighbors.len() <= used.len()
                && satisfied(rule.requires, ctx.neighbors, &mut used)
        });
        let Some(rule) = rule else {
            return;
        };
        if roll(&mut *ctx.rng, rule.chance) {
            self.variant = rule.target;
            ctx.stats.evolutions += 1;
            ctx.feed.notice(format!("The plot evolved into a {:?} tree!", rule.target).to_lowercase());
            ctx.feed.cue(CueKind::Sparkle, 1.0);
        }
    }

    pub fn on_sell(&mut self, ctx: &mut TileCtx<'_>) {
        if self.state == ForestState::Tree {
            ctx.ledger.gain("seeds", 1.0);
            ctx.feed.notice("The tree's seed was saved.");
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.state {
            ForestState::Empty => "🟫",
            ForestState::Hole => "🕳️",
            ForestState::Tree if self.stage < 3 => "🌱",
            ForestState::Tree => match self.variant {
                TreeVariant::Normal => "🌳",
                TreeVariant::Apple => "🍎",
                TreeVariant::Lemon => "🍋",
                TreeVariant::Cherry => "🍒",
            },
        }
    }

    pub fn tooltip(&self) -> String {
        match self.state {
            ForestState::Empty => "Empty plot. Click to dig a hole.".to_string(),
            ForestState::Hole if self.no_seeds => "A hole, but you have no seeds.".to_string(),
            ForestState::Hole => "A hole. Click to plant a seed.".to_string(),
            ForestState::Tree => format!(
                "{:?} tree, stage {}/{}, health {:.0}%. Click to chop.",
                self.variant,
                self.stage + 1,
                STAGES,
                self.health() * 100.0
            ),
        }
    }
}

fn auto_plant(state: &mut SimState, _owned: u32) {
    state.click_first(|t| matches!(t, Tile::Forest(f) if f.state != ForestState::Tree));
}

fn auto_chop(state: &mut SimState, _owned: u32) {
    state.click_first(|t| matches!(t, Tile::Forest(f) if f.is_mature()));
}

fn growth_rate(s: &SimState) -> f64 {
    1.0 + f64::from(s.owned("fertilizer"))
}

fn chop_power(s: &SimState) -> f64 {
    0.25 * (1.0 + f64::from(s.owned("sharper_axe")))
}

fn lucky_seed_chance(s: &SimState) -> f64 {
    (s.config.balance.lucky_seed_chance + 0.01 * f64::from(s.owned("lucky_clover"))).min(0.5)
}

fn self_seed_chance(s: &SimState) -> f64 {
    s.config.balance.self_seed_chance
}

fn has_forest(s: &SimState) -> bool {
    s.land.count(TileKind::Forest) > 0
}

pub fn register(catalog: &mut Catalog) {
    catalog.add_resource(ResourceDef::new("seeds", "Seeds", "🌰", 10.0, 50).reserve(1.0));
    catalog.add_resource(ResourceDef::new("wood", "Wood", "🪵", 50.0, 100));
    catalog.add_resource(ResourceDef::new("apples", "Apples", "🍎", 10.0, 500));
    catalog.add_resource(ResourceDef::new("lemons", "Lemons", "🍋", 10.0, 800));
    catalog.add_resource(ResourceDef::new("cherries", "Cherries", "🍒", 10.0, 1500));

    catalog.add_upgrade(
        Upgrade::new("forest_plot", "Forest plot", Category::Land, 1000)
            .describe("Claim a patch of land to grow trees on.")
            .growth(150)
            .initial(1)
            .effect(Effect::ClaimTile(TileTemplate::Forest)),
    );
    catalog.add_upgrade(
        Upgrade::new("sharper_axe", "Sharper axe", Category::Tool, 1500)
            .describe("Chop trees in fewer clicks.")
            .growth(180)
            .max(3)
            .visible_when(has_forest),
    );
    catalog.add_upgrade(
        Upgrade::new("fertilizer", "Fertilizer", Category::Tool, 2500)
            .describe("Trees grow faster.")
            .growth(200)
            .max(5)
            .visible_when(has_forest),
    );
    catalog.add_upgrade(
        Upgrade::new("wood_shed", "Wood shed", Category::Storage, 2000)
            .describe("Store more wood.")
            .growth(160)
            .needs("wood", 20.0)
            .effect(Effect::StorageLevel("wood")),
    );
    catalog.add_upgrade(
        Upgrade::new("seed_pouch", "Seed pouch", Category::Storage, 1200)
            .describe("Carry more seeds.")
            .growth(160)
            .effect(Effect::StorageLevel("seeds")),
    );
    catalog.add_upgrade(
        Upgrade::new("lumber_market", "Lumber market", Category::Market, 5000)
            .describe("Wood sells for 25% more.")
            .growth(200)
            .max(4)
            .effect(Effect::PriceMultiplier("wood", Decimal::new(125, 2))),
    );
    catalog.add_upgrade(
        Upgrade::new("auto_planter", "Auto planter", Category::Automation, 4000)
            .describe("Digs and plants empty plots.")
            .growth(170)
            .automation(0.5, None)
            .visible_when(has_forest),
    );
    catalog.add_upgrade(
        Upgrade::new("auto_chopper", "Auto chopper", Category::Automation, 6000)
            .describe("Chops fully grown trees.")
            .growth(170)
            .automation(0.5, None)
            .visible_when(has_forest),
    );

    catalog.add_automator(AutomatorDef::new("auto_planter", auto_plant));
    catalog.add_automator(AutomatorDef::new("auto_chopper", auto_chop));

    catalog.add_calculator(Calculator::new(GROWTH_RATE, growth_rate));
    catalog.add_calculator(Calculator::new(CHOP_POWER, chop_power));
    catalog.add_calculator(Calculator::new(LUCKY_SEED_CHANCE, lucky_seed_chance));
    catalog.add_calculator(Calculator::new(SELF_SEED_CHANCE, self_seed_chance));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::testbed::TestBed;

    fn tree(variant: TreeVariant) -> Neighbor {
        Neighbor {
            kind: TileKind::Forest,
            tree: Some(variant),
        }
    }

    #[test]
    fn dig_plant_chop_cycle() {
        let mut bed = TestBed::new();
        bed.ledger.gain("seeds", STARTING_SEEDS);
        let mut forest = Forest::default();

        for _ in 0..4 {
            forest.click(&mut bed.ctx());
            assert_eq!(forest.state, ForestState::Empty);
        }
        forest.click(&mut bed.ctx());
        assert_eq!(forest.state, ForestState::Hole);

        forest.click(&mut bed.ctx());
        assert_eq!(forest.state, ForestState::Hole);
        forest.click(&mut bed.ctx());
        assert_eq!(forest.state, ForestState::Tree);
        assert_eq!(bed.ledger.owned("seeds"), 3.0);

        for _ in 0..4 {
            forest.click(&mut bed.ctx());
        }
        assert_eq!(forest.state, ForestState::Empty);
        assert_eq!(bed.ledger.owned("wood"), 1.0);
        assert_eq!(bed.ledger.owned("seeds"), 4.0);
        assert_eq!(bed.stats.trees_chopped, 1);
    }

    #[test]
    fn planting_without_seeds_keeps_progress() {
        let mut bed = TestBed::new();
        let mut forest = Forest {
            state: ForestState::Hole,
            ..Forest::default()
        };
        forest.click(&mut bed.ctx());
        forest.click(&mut bed.ctx());
        assert!(forest.no_seeds);
        assert_eq!(forest.state, ForestState::Hole);
        assert_eq!(forest.progress.value(), 1.0);
        assert!(!bed.feed.cues().is_empty());

        bed.ledger.gain("seeds", 2.0);
        forest.click(&mut bed.ctx());
        assert_eq!(forest.state, ForestState::Tree);
        assert!(!forest.no_seeds);
    }

    #[test]
    fn growth_advances_stages_and_slows_by_kiln() {
        let mut bed = TestBed::new();
        let mut forest = Forest {
            state: ForestState::Tree,
            ..Forest::default()
        };
        forest.update(95.0, &mut bed.ctx());
        assert_eq!(forest.stage, 3);

        bed.neighbors = vec![Neighbor {
            kind: TileKind::Kiln,
            tree: None,
        }];
        forest.update(100.0, &mut bed.ctx());
        assert!((forest.age - 105.0).abs() < 1e-9);
    }

    #[test]
    fn mature_fruit_tree_yields_fruit() {
        let mut bed = TestBed::new();
        let mut forest = Forest {
            state: ForestState::Tree,
            variant: TreeVariant::Apple,
            ..Forest::default()
        };
        forest.update(MATURITY_SECONDS, &mut bed.ctx());
        assert!(forest.is_mature());
        for _ in 0..4 {
            forest.click(&mut bed.ctx());
        }
        assert_eq!(bed.ledger.owned("wood"), BASE_WOOD);
        assert_eq!(bed.ledger.owned("apples"), FRUIT_YIELD);
    }

    #[test]
    fn old_tree_fells_itself_and_reseeds() {
        let mut bed = TestBed::new();
        let mut forest = Forest {
            state: ForestState::Tree,
            ..Forest::default()
        };
        forest.update(MATURITY_SECONDS * 1.5, &mut bed.ctx());
        assert!((forest.health() - 0.5).abs() < 1e-9);
        forest.update(MATURITY_SECONDS, &mut bed.ctx());
        assert_eq!(forest.state, ForestState::Tree);
        assert!((forest.age - MATURITY_SECONDS * 0.5).abs() < 1e-9);
        assert_eq!(bed.stats.trees_chopped, 1);
        assert_eq!(bed.stats.trees_self_seeded, 1);
        assert_eq!(bed.ledger.owned("wood"), BASE_WOOD);
    }

    #[test]
    fn one_long_update_matches_many_short_ones() {
        let planted = || Forest {
            state: ForestState::Tree,
            ..Forest::default()
        };
        let mut long_bed = TestBed::new();
        let mut long = planted();
        long.update(900.0, &mut long_bed.ctx());

        let mut short_bed = TestBed::new();
        let mut short = planted();
        for _ in 0..9 {
            short.update(100.0, &mut short_bed.ctx());
        }

        assert_eq!(long.state, ForestState::Tree);
        assert_eq!(long.age, 300.0);
        assert_eq!(long.stage, STAGES - 1);
        assert_eq!((long.age, long.stage, long.state), (short.age, short.stage, short.state));
        assert_eq!(long_bed.stats.trees_chopped, 1);
        assert_eq!(long_bed.stats.trees_chopped, short_bed.stats.trees_chopped);
        assert_eq!(long_bed.ledger.owned("wood"), short_bed.ledger.owned("wood"));
    }

    #[test]
    fn evolution_needs_distinct_neighbours() {
        let one = [tree(TreeVariant::Normal)];
        let two = [tree(TreeVariant::Normal), tree(TreeVariant::Normal)];
        let rule = &EVOLUTIONS[0].requires;
        assert!(!satisfied(rule, &one, &mut [false; 4]));
        assert!(satisfied(rule, &two, &mut [false; 4]));
    }

    #[test]
    fn chopping_among_trees_eventually_evolves() {
        let mut bed = TestBed::new();
        bed.neighbors = vec![tree(TreeVariant::Normal), tree(TreeVariant::Normal)];
        let mut forest = Forest::default();
        for _ in 0..200 {
            forest.state = ForestState::Tree;
            for _ in 0..4 {
                forest.click(&mut bed.ctx());
            }
            if forest.variant == TreeVariant::Apple {
                break;
            }
        }
        assert_eq!(forest.variant, TreeVariant::Apple);
        assert_eq!(bed.stats.evolutions, 1);
    }

    #[test]
    fn selling_a_tree_returns_its_seed() {
        let mut bed = TestBed::new();
        let mut forest = Forest {
            state: ForestState::Tree,
            ..Forest::default()
        };
        forest.on_sell(&mut bed.ctx());
        assert_eq!(bed.ledger.owned("seeds"), 1.0);
    }
}
