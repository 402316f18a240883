//! Ponds: wait for a bite, click while the line wiggles, then haul in the
//! catch.
//!
//! There is no progress bar. A countdown runs to the bite, a shorter window
//! follows in which a click hooks something, and the hooked find waits until
//! it is collected. Clicking before the bite pushes the countdown back.

use crate::automator::AutomatorDef;
use crate::calculator::{Calculator, RARE_FIND_LUCK, RARE_FISH_LUCK, RARITY_CHANCE};
use crate::catalog::Catalog;
use crate::feed::CueKind;
use crate::state::SimState;
use crate::tile::{Reaction, Tile, TileCtx, TileKind};
use crate::upgrade::{Category, Effect, TileTemplate, Upgrade};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::ResourceDef;
use sim_econ::{dampen_luck, jitter, lucky_pick, roll};
use tracing::{debug, warn};

pub const CATCH_SECONDS: f64 = 8.0;
pub const CATCH_VARIANCE: f64 = 4.0;
pub const WIGGLE_SECONDS: f64 = 1.5;
pub const WIGGLE_VARIANCE: f64 = 0.5;
/// Seconds added to the countdown by a click before the bite.
pub const PREMATURE_PENALTY: f64 = 2.0;
/// Fish luck multiplier next to a kiln.
pub const KILN_LUCK_FACTOR: f64 = 0.5;
const MAX_PHASES_PER_UPDATE: usize = 10_000;

/// Sea life, commonest first: (species, fish gained).
pub const SEA_LIFE: &[(&str, f64)] = &[
    ("🐟", 1.0),
    ("🐠", 2.0),
    ("🐡", 3.0),
    ("🦐", 4.0),
    ("🦑", 5.0),
    ("🐙", 8.0),
    ("🦈", 15.0),
];

/// Rare non-fish finds, commonest first: (icon, resource, amount).
pub const RARE_FINDS: &[(&str, &str, f64)] = &[
    ("👢", "wood", 3.0),
    ("🌰", "seeds", 3.0),
    ("🦪", "pearls", 1.0),
    ("💎", "diamond", 1.0),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Find {
    pub species: String,
    pub resource: String,
    pub amount: f64,
    pub rare: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pond {
    pub(crate) catch_countdown: f64,
    pub(crate) wiggle_countdown: f64,
    pub(crate) current_find: Option<Find>,
}

impl Default for Pond {
    fn default() -> Self {
        Self {
            catch_countdown: CATCH_SECONDS,
            wiggle_countdown: 0.0,
            current_find: None,
        }
    }
}

impl Pond {
    pub fn new(rng: &mut ChaCha8Rng) -> Self {
        Self {
            catch_countdown: jitter(rng, CATCH_SECONDS, CATCH_VARIANCE),
            ..Self::default()
        }
    }

    pub fn catch_countdown(&self) -> f64 {
        self.catch_countdown
    }

    pub fn wiggle_countdown(&self) -> f64 {
        self.wiggle_countdown
    }

    pub fn current_find(&self) -> Option<&Find> {
        self.current_find.as_ref()
    }

    pub fn is_wiggling(&self) -> bool {
        self.current_find.is_none() && self.wiggle_countdown > 0.0
    }

    pub fn phase(&self) -> &'static str {
        if self.current_find.is_some() {
            "holding"
        } else if self.wiggle_countdown > 0.0 {
            "wiggling"
        } else {
            "waiting"
        }
    }

    /// Run the countdowns. Time left over when a phase ends carries into the
    /// next one, so one long step lands where many short ones would.
    pub fn update(&mut self, dt: f64, ctx: &mut TileCtx<'_>) {
        let mut left = dt;
        for _ in 0..MAX_PHASES_PER_UPDATE {
            if left <= 0.0 || self.current_find.is_some() {
                return;
            }
            if self.wiggle_countdown > 0.0 {
                if left < self.wiggle_countdown {
                    self.wiggle_countdown -= left;
                    return;
                }
                left -= self.wiggle_countdown;
                self.wiggle_countdown = 0.0;
                self.catch_countdown = jitter(&mut *ctx.rng, CATCH_SECONDS, CATCH_VARIANCE);
                ctx.stats.fish_escaped += 1;
                ctx.feed.cue(CueKind::Splash, 0.5);
                continue;
            }
            if left < self.catch_countdown {
                self.catch_countdown -= left;
                return;
            }
            left -= self.catch_countdown;
            self.catch_countdown = 0.0;
            self.wiggle_countdown = jitter(&mut *ctx.rng, WIGGLE_SECONDS, WIGGLE_VARIANCE);
            ctx.feed.cue(CueKind::Bite, self.wiggle_countdown);
        }
        warn!(dt, "pond update hit its phase limit");
    }

    pub fn click(&mut self, ctx: &mut TileCtx<'_>) -> Reaction {
        if let Some(find) = self.current_find.take() {
            ctx.ledger.gain(&find.resource, find.amount);
            if find.rare {
                ctx.stats.rare_finds += 1;
            } else {
                ctx.stats.fish_caught += 1;
                ctx.stats.record_catch(&find.species);
            }
            ctx.feed.notice(format!("Caught {}!", find.species));
            self.catch_countdown = jitter(&mut *ctx.rng, CATCH_SECONDS, CATCH_VARIANCE);
            return Reaction::None;
        }
        if self.wiggle_countdown > 0.0 {
            let find = self.hook(ctx);
            debug!(species = %find.species, rare = find.rare, "find hooked");
            self.current_find = Some(find);
            self.wiggle_countdown = 0.0;
            ctx.feed.cue(CueKind::Catch, 0.6);
            return Reaction::None;
        }
        self.catch_countdown += PREMATURE_PENALTY;
        ctx.stats.premature_casts += 1;
        ctx.fail("Too early! You scared the fish.");
        Reaction::None
    }

    fn hook(&self, ctx: &mut TileCtx<'_>) -> Find {
        let scared = ctx.next_to(TileKind::Kiln);
        let rng = &mut *ctx.rng;
        if roll(rng, ctx.derived.get(RARITY_CHANCE)) {
            let luck = ctx.derived.get(RARE_FIND_LUCK);
            let (icon, resource, amount) = RARE_FINDS[pick(rng, RARE_FINDS.len(), luck)];
            return Find {
                species: icon.to_string(),
                resource: resource.to_string(),
                amount,
                rare: true,
            };
        }
        let mut luck = ctx.derived.get(RARE_FISH_LUCK);
        if scared {
            luck = dampen_luck(luck, KILN_LUCK_FACTOR);
        }
        let (species, amount) = SEA_LIFE[pick(rng, SEA_LIFE.len(), luck)];
        Find {
            species: species.to_string(),
            resource: "fish".to_string(),
            amount,
            rare: false,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.phase() {
            "holding" => "🎣",
            "wiggling" => "🫧",
            _ => "🌊",
        }
    }

    pub fn tooltip(&self) -> String {
        match &self.current_find {
            Some(find) => format!("Something's hooked: {}. Click to reel it in.", find.species),
            None if self.wiggle_countdown > 0.0 => "A bite! Click now!".to_string(),
            None => "Waiting for a bite. Patience.".to_string(),
        }
    }
}

fn pick(rng: &mut ChaCha8Rng, len: usize, luck: f64) -> usize {
    lucky_pick(rng, len, luck).unwrap_or_else(|err| {
        warn!(%err, luck, "falling back to the commonest find");
        0
    })
}

fn auto_fish(state: &mut SimState, _owned: u32) {
    state.click_first(|t| matches!(t, Tile::Pond(p) if p.current_find.is_some() || p.is_wiggling()));
}

fn rarity_chance(s: &SimState) -> f64 {
    (s.config.balance.rarity_chance + 0.01 * f64::from(s.owned("lucky_clover"))).min(0.5)
}

fn rare_fish_luck(s: &SimState) -> f64 {
    (s.config.balance.fish_luck + 0.05 * f64::from(s.owned("bait"))).min(0.95)
}

fn rare_find_luck(s: &SimState) -> f64 {
    (s.config.balance.fish_luck + 0.05 * f64::from(s.owned("lucky_clover"))).min(0.95)
}

fn has_pond(s: &SimState) -> bool {
    s.land.count(TileKind::Pond) > 0
}

pub fn register(catalog: &mut Catalog) {
    catalog.add_resource(ResourceDef::new("fish", "Fish", "🐟", 20.0, 300).auto_sell());
    catalog.add_resource(ResourceDef::new("pearls", "Pearls", "🦪", 5.0, 2500));

    catalog.add_upgrade(
        Upgrade::new("pond", "Pond", Category::Land, 7500)
            .describe("Dig a pond and go fishing.")
            .growth(170)
            .effect(Effect::ClaimTile(TileTemplate::Pond)),
    );
    catalog.add_upgrade(
        Upgrade::new("bait", "Better bait", Category::Tool, 4000)
            .describe("Bigger fish bite.")
            .growth(190)
            .max(5)
            .visible_when(has_pond),
    );
    catalog.add_upgrade(
        Upgrade::new("lucky_clover", "Lucky clover", Category::Tool, 12000)
            .describe("Rare finds and lucky seeds turn up more often.")
            .growth(220)
            .max(5),
    );
    catalog.add_upgrade(
        Upgrade::new("fish_barrel", "Fish barrel", Category::Storage, 5000)
            .describe("Keep more fish.")
            .growth(160)
            .needs("wood", 10.0)
            .effect(Effect::StorageLevel("fish"))
            .visible_when(has_pond),
    );
    catalog.add_upgrade(
        Upgrade::new("fishmonger", "Fishmonger", Category::Market, 15000)
            .describe("Fish sells for 30% more.")
            .growth(200)
            .max(4)
            .effect(Effect::PriceMultiplier("fish", Decimal::new(130, 2)))
            .visible_when(has_pond),
    );
    catalog.add_upgrade(
        Upgrade::new("auto_fisher", "Auto fisher", Category::Automation, 10000)
            .describe("Reels in bites for you.")
            .growth(170)
            .automation(0.5, None)
            .visible_when(has_pond),
    );

    catalog.add_automator(AutomatorDef::new("auto_fisher", auto_fish));

    catalog.add_calculator(Calculator::new(RARITY_CHANCE, rarity_chance));
    catalog.add_calculator(Calculator::new(RARE_FISH_LUCK, rare_fish_luck));
    catalog.add_calculator(Calculator::new(RARE_FIND_LUCK, rare_find_luck));
}
