//! The closed set of tile kinds and the verbs every tile answers to.
//!
//! Tiles never hold a reference back to the game. Each call receives a
//! [`TileCtx`] carrying the ledger, stats, feed, RNG, derived values and a
//! snapshot of the four orthogonal neighbours.

use crate::calculator::Derived;
use crate::feed::{CueKind, Feed};
use crate::forest::{Forest, TreeVariant};
use crate::kiln::Kiln;
use crate::mine::Mine;
use crate::minor::{Donut, Empty, Monster};
use crate::pond::Pond;
use crate::windmill::Windmill;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sim_core::{Ledger, Stats, EPSILON};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileKind {
    Empty,
    Forest,
    Mine,
    Pond,
    Kiln,
    Windmill,
    Donut,
    Monster,
}

impl TileKind {
    /// Persisted `tileKind` tag.
    pub fn tag(self) -> &'static str {
        match self {
            TileKind::Empty => "empty",
            TileKind::Forest => "forest",
            TileKind::Mine => "mine",
            TileKind::Pond => "pond",
            TileKind::Kiln => "kiln",
            TileKind::Windmill => "windmill",
            TileKind::Donut => "donut",
            TileKind::Monster => "monster",
        }
    }
}

/// What a tile looks like to the tiles next to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbor {
    pub kind: TileKind,
    /// Variant of a standing tree, `None` for anything else.
    pub tree: Option<TreeVariant>,
}

/// Completion of the action in flight, always within [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Progress(f64);

impl Progress {
    pub fn clamped(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self(0.0)
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Add `power` and report whether the action is complete. A full bar stays
    /// full until [`Progress::reset`], so a blocked action retries on the next
    /// push.
    pub fn push(&mut self, power: f64) -> bool {
        if power.is_finite() && power > 0.0 {
            self.0 = (self.0 + power).min(1.0);
        }
        self.is_full()
    }

    pub fn is_full(self) -> bool {
        self.0 >= 1.0 - EPSILON
    }

    pub fn reset(&mut self) {
        self.0 = 0.0;
    }
}

impl<'de> Deserialize<'de> for Progress {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        f64::deserialize(d).map(Progress::clamped)
    }
}

/// Hand-off a click asks the UI layer to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reaction {
    None,
    ChooseRecipe,
    ChooseProduct,
    BuyTile,
    Battle,
}

/// Everything a tile may touch while updating or reacting to a click.
pub struct TileCtx<'a> {
    pub ledger: &'a mut Ledger,
    pub stats: &'a mut Stats,
    pub feed: &'a mut Feed,
    pub rng: &'a mut ChaCha8Rng,
    pub derived: &'a Derived,
    pub neighbors: &'a [Neighbor],
    /// Player click rather than automation or a timed update.
    pub manual: bool,
}

impl TileCtx<'_> {
    pub fn next_to(&self, kind: TileKind) -> bool {
        self.neighbors.iter().any(|n| n.kind == kind)
    }

    pub fn count_next_to(&self, kind: TileKind) -> usize {
        self.neighbors.iter().filter(|n| n.kind == kind).count()
    }

    /// Report a refused action: a notice plus a shake cue.
    pub fn fail(&mut self, text: impl Into<String>) {
        self.feed.notice(text);
        self.feed.cue(CueKind::Shake, 0.4);
    }
}

#[derive(Debug, Error)]
pub enum TileLoadError {
    #[error("tile record is not an object")]
    NotAnObject,
    #[error("tile record has no tileKind")]
    MissingKind,
    #[error("unknown tile kind: {0}")]
    UnknownKind(String),
    #[error("malformed {kind} tile: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One cell of the land grid.
#[derive(Clone, Debug, PartialEq)]
pub enum Tile {
    Empty(Empty),
    Forest(Forest),
    Mine(Mine),
    Pond(Pond),
    Kiln(Kiln),
    Windmill(Windmill),
    Donut(Donut),
    Monster(Monster),
}

/// Read-only projection of a tile for the UI.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileView {
    pub index: usize,
    pub kind: TileKind,
    pub state: &'static str,
    pub icon: &'static str,
    pub progress: f64,
    pub stage: u32,
    pub tooltip: String,
}

impl Tile {
    pub fn empty() -> Self {
        Tile::Empty(Empty::default())
    }

    pub fn kind(&self) -> TileKind {
        match self {
            Tile::Empty(_) => TileKind::Empty,
            Tile::Forest(_) => TileKind::Forest,
            Tile::Mine(_) => TileKind::Mine,
            Tile::Pond(_) => TileKind::Pond,
            Tile::Kiln(_) => TileKind::Kiln,
            Tile::Windmill(_) => TileKind::Windmill,
            Tile::Donut(_) => TileKind::Donut,
            Tile::Monster(_) => TileKind::Monster,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Tile::Empty(_))
    }

    pub fn as_neighbor(&self) -> Neighbor {
        let tree = match self {
            Tile::Forest(f) => f.standing_variant(),
            _ => None,
        };
        Neighbor {
            kind: self.kind(),
            tree,
        }
    }

    /// Advance continuous effects by `dt` simulated seconds.
    pub fn update(&mut self, dt: f64, ctx: &mut TileCtx<'_>) {
        match self {
            Tile::Forest(t) => t.update(dt, ctx),
            Tile::Pond(t) => t.update(dt, ctx),
            Tile::Kiln(t) => t.update(dt, ctx),
            Tile::Windmill(t) => t.update(dt, ctx),
            Tile::Empty(_) | Tile::Mine(_) | Tile::Donut(_) | Tile::Monster(_) => {}
        }
    }

    pub fn click(&mut self, ctx: &mut TileCtx<'_>) -> Reaction {
        match self {
            Tile::Empty(t) => t.click(ctx),
            Tile::Forest(t) => t.click(ctx),
            Tile::Mine(t) => t.click(ctx),
            Tile::Pond(t) => t.click(ctx),
            Tile::Kiln(t) => t.click(ctx),
            Tile::Windmill(t) => t.click(ctx),
            Tile::Donut(t) => t.click(ctx),
            Tile::Monster(t) => t.click(ctx),
        }
    }

    /// Side effects of selling the tile, run before it reverts to empty land.
    pub fn on_sell(&mut self, ctx: &mut TileCtx<'_>) {
        if let Tile::Forest(t) = self {
            t.on_sell(ctx);
        }
    }

    pub fn on_neighbors_changed(&mut self, neighbors: &[Neighbor]) {
        if let Tile::Windmill(t) = self {
            t.on_neighbors_changed(neighbors);
        }
    }

    pub fn progress(&self) -> f64 {
        match self {
            Tile::Forest(t) => t.progress.value(),
            Tile::Mine(t) => t.progress.value(),
            Tile::Kiln(t) => t.bake_fraction(),
            _ => 0.0,
        }
    }

    pub fn stage(&self) -> u32 {
        match self {
            Tile::Forest(t) => t.stage,
            Tile::Mine(t) => t.stage,
            _ => 0,
        }
    }

    pub fn state_label(&self) -> &'static str {
        match self {
            Tile::Empty(_) => "unclaimed",
            Tile::Forest(t) => t.state.label(),
            Tile::Mine(t) => t.state.label(),
            Tile::Pond(t) => t.phase(),
            Tile::Kiln(t) => t.state.label(),
            Tile::Windmill(t) => {
                if t.active {
                    "working"
                } else {
                    "idle"
                }
            }
            Tile::Donut(_) => "open",
            Tile::Monster(_) => "lurking",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Tile::Empty(_) => "🟩",
            Tile::Forest(t) => t.icon(),
            Tile::Mine(t) => t.icon(),
            Tile::Pond(t) => t.icon(),
            Tile::Kiln(t) => t.icon(),
            Tile::Windmill(_) => "🌬️",
            Tile::Donut(_) => "🍩",
            Tile::Monster(_) => "👾",
        }
    }

    pub fn tooltip(&self) -> String {
        match self {
            Tile::Empty(_) => "Unclaimed land. Buy a plot to use it.".to_string(),
            Tile::Forest(t) => t.tooltip(),
            Tile::Mine(t) => t.tooltip(),
            Tile::Pond(t) => t.tooltip(),
            Tile::Kiln(t) => t.tooltip(),
            Tile::Windmill(t) => t.tooltip(),
            Tile::Donut(t) => format!("Donut shop. {} donuts baked here.", t.baked),
            Tile::Monster(t) => format!("A monster. Poked {} times.", t.pokes),
        }
    }

    pub fn view(&self, index: usize) -> TileView {
        TileView {
            index,
            kind: self.kind(),
            state: self.state_label(),
            icon: self.icon(),
            progress: self.progress(),
            stage: self.stage(),
            tooltip: self.tooltip(),
        }
    }

    /// `{ "tileKind": ..., ...kind-specific fields }`.
    pub fn save_data(&self) -> Result<Value, serde_json::Error> {
        let body = match self {
            Tile::Empty(t) => serde_json::to_value(t)?,
            Tile::Forest(t) => serde_json::to_value(t)?,
            Tile::Mine(t) => serde_json::to_value(t)?,
            Tile::Pond(t) => serde_json::to_value(t)?,
            Tile::Kiln(t) => serde_json::to_value(t)?,
            Tile::Windmill(t) => serde_json::to_value(t)?,
            Tile::Donut(t) => serde_json::to_value(t)?,
            Tile::Monster(t) => serde_json::to_value(t)?,
        };
        let mut map = match body {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        map.insert("tileKind".to_string(), Value::String(self.kind().tag().to_string()));
        Ok(Value::Object(map))
    }

    /// Rebuild a tile through the `tileKind` constructor registry.
    pub fn from_save(record: Value) -> Result<Tile, TileLoadError> {
        let Value::Object(mut map) = record else {
            return Err(TileLoadError::NotAnObject);
        };
        let kind = match map.remove("tileKind") {
            Some(Value::String(kind)) => kind,
            _ => return Err(TileLoadError::MissingKind),
        };
        let Some((_, load)) = TILE_LOADERS.iter().find(|(tag, _)| *tag == kind) else {
            return Err(TileLoadError::UnknownKind(kind));
        };
        load(Value::Object(map)).map_err(|source| TileLoadError::Malformed { kind, source })
    }
}

type TileLoader = fn(Value) -> Result<Tile, serde_json::Error>;

const TILE_LOADERS: &[(&str, TileLoader)] = &[
    ("empty", load_empty),
    ("forest", load_forest),
    ("mine", load_mine),
    ("pond", load_pond),
    ("kiln", load_kiln),
    ("windmill", load_windmill),
    ("donut", load_donut),
    ("monster", load_monster),
];

fn load_empty(v: Value) -> Result<Tile, serde_json::Error> {
    serde_json::from_value(v).map(Tile::Empty)
}

fn load_forest(v: Value) -> Result<Tile, serde_json::Error> {
    serde_json::from_value(v).map(Tile::Forest)
}

fn load_mine(v: Value) -> Result<Tile, serde_json::Error> {
    serde_json::from_value(v).map(Tile::Mine)
}

fn load_pond(v: Value) -> Result<Tile, serde_json::Error> {
    serde_json::from_value(v).map(Tile::Pond)
}

fn load_kiln(v: Value) -> Result<Tile, serde_json::Error> {
    serde_json::from_value(v).map(Tile::Kiln)
}

fn load_windmill(v: Value) -> Result<Tile, serde_json::Error> {
    serde_json::from_value(v).map(Tile::Windmill)
}

fn load_donut(v: Value) -> Result<Tile, serde_json::Error> {
    serde_json::from_value(v).map(Tile::Donut)
}

fn load_monster(v: Value) -> Result<Tile, serde_json::Error> {
    serde_json::from_value(v).map(Tile::Monster)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::mine::MineSubtype;
    use serde_json::json;

    #[test]
    fn progress_clamps_and_holds_when_full() {
        let mut p = Progress::default();
        assert!(!p.push(0.6));
        assert!(p.push(0.6));
        assert_eq!(p.value(), 1.0);
        assert!(p.push(0.0));
        p.reset();
        assert_eq!(p.value(), 0.0);
        let loaded: Progress = serde_json::from_value(json!(3.5)).unwrap();
        assert_eq!(loaded.value(), 1.0);
    }

    #[test]
    fn save_record_carries_kind_tag() {
        let tile = Tile::Mine(Mine::new(MineSubtype::Metal));
        let v = tile.save_data().unwrap();
        assert_eq!(v["tileKind"], "mine");
        assert_eq!(v["subtype"], "metal");
        assert_eq!(Tile::from_save(v).unwrap(), tile);
    }

    #[test]
    fn empty_tile_saves_as_object() {
        let v = Tile::empty().save_data().unwrap();
        assert_eq!(v, json!({"tileKind": "empty"}));
    }

    #[test]
    fn unknown_kind_is_reported() {
        let err = Tile::from_save(json!({"tileKind": "volcano"})).unwrap_err();
        assert!(matches!(err, TileLoadError::UnknownKind(k) if k == "volcano"));
        assert!(matches!(Tile::from_save(json!(7)), Err(TileLoadError::NotAnObject)));
        assert!(matches!(Tile::from_save(json!({})), Err(TileLoadError::MissingKind)));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let tile = Tile::from_save(json!({"tileKind": "forest", "state": "hole"})).unwrap();
        let Tile::Forest(f) = tile else {
            panic!("expected a forest");
        };
        assert_eq!(f.stage, 0);
        assert_eq!(f.progress.value(), 0.0);
    }
}
