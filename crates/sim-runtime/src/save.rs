//! Conversion between a running [`Game`] and the persisted [`SaveData`].

use crate::automator::AutomatorState;
use crate::catalog::Catalog;
use crate::game::Game;
use crate::land::{LandGrid, COLUMN_UPGRADE, ROW_UPGRADE};
use crate::tile::{Tile, TileKind};
use chrono::{DateTime, Utc};
use persistence::{
    read_save, write_save, AutomatorSave, PersistError, ResourceSave, SaveData, SaveStore, StartTime,
    SAVE_VERSION,
};
use rust_decimal::Decimal;
use serde_json::Value;
use sim_core::{SimConfig, Wallet};
use std::sync::Arc;
use tracing::{error, info, warn};

impl Game {
    /// Snapshot the run. `start_time` comes from the driver; the core never
    /// reads the wall clock.
    pub fn to_save(&self, start_time: Option<DateTime<Utc>>) -> SaveData {
        let state = &self.state;
        let land = state
            .land
            .tiles()
            .iter()
            .enumerate()
            .map(|(index, tile)| {
                tile.save_data().unwrap_or_else(|err| {
                    error!(index, %err, "tile could not be saved, writing empty land");
                    empty_record()
                })
            })
            .collect();
        let automators = self
            .catalog
            .automators()
            .iter()
            .zip(&self.automators)
            .map(|(def, auto)| AutomatorSave {
                upgrade_name: def.upgrade.to_string(),
                enabled: auto.enabled,
                saturation: auto.saturation,
            })
            .collect();
        SaveData {
            version: SAVE_VERSION,
            currency: state.ledger.wallet.balance,
            lifetime_currency: Some(state.ledger.wallet.lifetime),
            resources: state
                .ledger
                .iter()
                .map(|r| (r.id().0.clone(), ResourceSave::from(r)))
                .collect(),
            bought_upgrades: state.owned.clone(),
            land,
            automators,
            stats: state.stats.clone(),
            visible: state.visible.iter().cloned().collect(),
            unblurred: state.unblurred.iter().cloned().collect(),
            clock: state.clock,
            start_time: start_time.map(StartTime),
        }
    }

    pub fn from_save(save: SaveData, config: SimConfig) -> Self {
        Self::from_save_with_catalog(Arc::new(Catalog::standard()), save, config)
    }

    /// Restore a run. Entries the catalog no longer knows are logged and
    /// skipped; anything missing keeps its fresh-game value.
    pub fn from_save_with_catalog(catalog: Arc<Catalog>, save: SaveData, config: SimConfig) -> Self {
        let mut game = Game::with_catalog(catalog, config);
        let catalog = Arc::clone(&game.catalog);
        let state = &mut game.state;

        for (name, saved) in &save.resources {
            match state.ledger.get_mut(name) {
                Some(resource) => saved.apply(resource),
                None => warn!(resource = %name, "saved resource no longer exists"),
            }
        }

        let currency = non_negative(save.currency, "currency");
        let lifetime = save
            .lifetime_currency
            .map(|l| non_negative(l, "lifetimeCurrency"))
            .unwrap_or(currency)
            .max(currency);
        state.ledger.wallet = Wallet {
            balance: currency,
            lifetime,
        };

        for (name, count) in &save.bought_upgrades {
            let Some(up) = catalog.upgrade(name) else {
                warn!(upgrade = %name, "saved upgrade no longer exists");
                continue;
            };
            let count = match up.max {
                Some(max) if *count > max => {
                    warn!(upgrade = %name, count, max, "saved count above maximum, clamped");
                    max
                }
                _ => *count,
            };
            state.owned.insert(name.clone(), count);
        }

        let tiles = save
            .land
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                Tile::from_save(record).unwrap_or_else(|err| {
                    warn!(index, %err, "saved tile replaced by empty land");
                    Tile::empty()
                })
            })
            .collect();
        state.land = LandGrid::from_tiles(
            state.owned(COLUMN_UPGRADE) as usize,
            state.owned(ROW_UPGRADE) as usize,
            tiles,
        );

        state.visible = save.visible.into_iter().collect();
        state.unblurred = save.unblurred.into_iter().collect();
        state.stats = save.stats;
        if save.clock.is_finite() && save.clock >= 0.0 {
            state.clock = save.clock;
        }

        for saved in &save.automators {
            let slot = catalog
                .automators()
                .iter()
                .position(|a| a.upgrade == saved.upgrade_name);
            match slot.and_then(|i| game.automators.get_mut(i)) {
                Some(auto) => *auto = AutomatorState::with_saturation(saved.enabled, saved.saturation),
                None => warn!(automator = %saved.upgrade_name, "saved automator no longer exists"),
            }
        }

        game.refresh_derived();
        info!(
            version = save.version,
            tiles = game.state.land.len(),
            clock = game.state.clock,
            "game restored"
        );
        game
    }

    /// Restore from `store`, or start fresh when it is empty. A corrupt save
    /// is discarded and the player is told.
    pub fn load_or_fresh(store: &mut dyn SaveStore, config: SimConfig) -> Self {
        match read_save(&*store) {
            Ok(Some(save)) => Game::from_save(save, config),
            Ok(None) => Game::new(config),
            Err(PersistError::Corrupt(err)) => {
                error!(%err, "corrupt save discarded");
                if let Err(err) = store.clear() {
                    error!(%err, "corrupt save could not be cleared");
                }
                let mut game = Game::new(config);
                game.state
                    .feed
                    .notice("Your saved game was damaged and could not be loaded. Starting over.");
                game
            }
            Err(err) => {
                error!(%err, "save unreadable, starting fresh");
                Game::new(config)
            }
        }
    }

    pub fn save_to(&self, store: &mut dyn SaveStore, start_time: Option<DateTime<Utc>>) -> Result<(), PersistError> {
        write_save(store, &self.to_save(start_time))
    }
}

fn empty_record() -> Value {
    serde_json::json!({ "tileKind": TileKind::Empty.tag() })
}

fn non_negative(amount: Decimal, field: &'static str) -> Decimal {
    if amount.is_sign_negative() {
        warn!(field, %amount, "negative money in save, reset to zero");
        Decimal::ZERO
    } else {
        amount.round_dp(2)
    }
}
