#![deny(warnings)]

//! Headless driver: plays Idle Acres with a simple scripted player for a
//! number of simulated seconds and prints the outcome.

use anyhow::{Context, Result};
use chrono::Utc;
use persistence::{default_save_path, read_save, FileStore};
use sim_core::SimConfig;
use sim_runtime::{Game, TileKind, UiRequest};
use std::path::PathBuf;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    seconds: Option<u32>,
    save: Option<PathBuf>,
    fresh: bool,
}

fn parse_args(args: impl Iterator<Item = String>) -> Args {
    let mut parsed = Args::default();
    let mut it = args;
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => parsed.config = it.next().map(PathBuf::from),
            "--seconds" => parsed.seconds = it.next().and_then(|s| s.parse().ok()),
            "--save" => parsed.save = it.next().map(PathBuf::from),
            "--fresh" => parsed.fresh = true,
            _ => {}
        }
    }
    parsed
}

fn load_config(path: Option<&PathBuf>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// One second of a player who clicks everything, answers every prompt the
/// same way, sells near-full stock and buys the cheapest upgrade on offer.
fn autoplay_step(game: &mut Game) {
    for tile in game.land().tiles {
        if !matches!(tile.kind, TileKind::Empty | TileKind::Monster) {
            game.click_tile(tile.index, true);
        }
    }
    for request in game.drain_feed().requests {
        match request {
            UiRequest::ChooseRecipe { tile } => {
                game.select_recipe(tile, "bricks");
            }
            UiRequest::ChooseProduct { tile } => {
                game.select_windmill_product(tile, "energy");
            }
            UiRequest::BuyTile { .. } | UiRequest::Battle { .. } => {}
        }
    }
    for r in game.resources() {
        if r.sellable && r.name != "seeds" && r.owned >= r.capacity * 0.8 {
            game.sell_resource(&r.name);
        }
    }
    let cheapest = game
        .upgrades()
        .into_iter()
        .filter(|u| u.visible && u.affordable)
        .min_by_key(|u| u.cost);
    if let Some(up) = cheapest {
        debug!(upgrade = up.name, cost = %up.cost, "autoplay buys");
        game.purchase_upgrade(up.name);
    }
    game.tick(1.0);
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args(std::env::args().skip(1));
    info!(?args, git_sha = env!("GIT_SHA"), "starting CLI");

    let config = load_config(args.config.as_ref())?;
    let mut store = FileStore::new(args.save.clone().unwrap_or_else(default_save_path));
    let start_time = read_save(&store)
        .ok()
        .flatten()
        .and_then(|save| save.start_time)
        .map(|t| t.0)
        .unwrap_or_else(Utc::now);
    let mut game = if args.fresh {
        Game::new(config)
    } else {
        Game::load_or_fresh(&mut store, config)
    };

    let seconds = args.seconds.unwrap_or(600);
    for _ in 0..seconds {
        autoplay_step(&mut game);
    }

    if args.save.is_some() {
        game.save_to(&mut store, Some(start_time))
            .with_context(|| format!("writing {}", store.path().display()))?;
    }

    let stats = game.stats();
    let land = game.land();
    println!(
        "Land OK | {}x{} | claimed: {} | upgrades bought: {}",
        land.columns,
        land.rows,
        land.tiles.iter().filter(|t| t.kind != TileKind::Empty).count(),
        stats.upgrades_bought
    );
    println!(
        "KPI | seconds: {} | balance: ${} | clicks: {} | trees chopped: {} | fish: {} | bakes: {} | automator runs: {} | won: {}",
        seconds,
        game.balance(),
        stats.manual_clicks,
        stats.trees_chopped,
        stats.fish_caught,
        stats.bakes,
        stats.automator_runs,
        stats.won
    );

    Ok(())
}
