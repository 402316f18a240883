#![deny(warnings)]

//! Simulation runtime for Idle Acres.
//!
//! A [`Game`] owns the ledger, the land grid and the upgrade counts of one
//! run. Each tick advances the tiles, reveals upgrades, runs the automators
//! and finally refreshes the derived values the next tick reads. Tile kinds
//! register their resources, upgrades, automators and calculators in a
//! [`Catalog`]; nothing is discovered at runtime.

pub mod automator;
pub mod calculator;
pub mod catalog;
pub mod feed;
pub mod forest;
pub mod game;
pub mod kiln;
pub mod land;
pub mod mine;
pub mod minor;
pub mod pond;
pub mod save;
pub mod state;
pub mod tile;
pub mod upgrade;
pub mod windmill;

pub use catalog::Catalog;
pub use feed::{Cue, CueKind, FeedBatch, Notice, UiRequest};
pub use game::{AutomatorView, Game, LandView, ResourceView, UpgradeView};
pub use tile::{Reaction, Tile, TileKind, TileView};
