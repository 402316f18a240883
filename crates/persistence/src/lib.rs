#![deny(warnings)]

//! Persistence layer: the saved-game schema, its JSON codec and the storage
//! seam the driver plugs a transport into.
//!
//! Every field of the schema has a default so older or partial saves load.
//! Malformed documents surface as [`PersistError::Corrupt`]; the caller
//! decides to discard them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sim_core::{Resource, Stats};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Current schema version written by [`encode`].
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("save data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("save storage failed: {0}")]
    Io(#[from] io::Error),
}

/// Snapshot of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveData {
    pub version: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub currency: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub lifetime_currency: Option<Decimal>,
    pub resources: BTreeMap<String, ResourceSave>,
    pub bought_upgrades: BTreeMap<String, u32>,
    /// Row-major tile records, each `{ "tileKind": ..., ... }`.
    pub land: Vec<serde_json::Value>,
    pub automators: Vec<AutomatorSave>,
    pub stats: Stats,
    pub visible: Vec<String>,
    pub unblurred: Vec<String>,
    /// Simulated seconds played.
    pub clock: f64,
    pub start_time: Option<StartTime>,
}

/// Persisted counters and multipliers of one resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceSave {
    #[serde(with = "rust_decimal::serde::float")]
    pub price_multiplier: Decimal,
    pub storage_multiplier: f64,
    pub storage: f64,
    pub sell_num: f64,
    pub owned: f64,
    pub total_owned: f64,
    pub lost: f64,
    pub sold: f64,
    pub incurred: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub earnings: Decimal,
}

impl Default for ResourceSave {
    fn default() -> Self {
        Self {
            price_multiplier: Decimal::ONE,
            storage_multiplier: 1.0,
            storage: 1.0,
            sell_num: 10.0,
            owned: 0.0,
            total_owned: 0.0,
            lost: 0.0,
            sold: 0.0,
            incurred: 0.0,
            earnings: Decimal::ZERO,
        }
    }
}

impl From<&Resource> for ResourceSave {
    fn from(r: &Resource) -> Self {
        Self {
            price_multiplier: r.price_multiplier,
            storage_multiplier: r.storage_multiplier,
            storage: r.storage,
            sell_num: r.sell_num,
            owned: r.owned,
            total_owned: r.total_owned,
            lost: r.lost,
            sold: r.sold,
            incurred: r.incurred,
            earnings: r.earnings,
        }
    }
}

impl ResourceSave {
    /// Copy the saved values onto a freshly registered resource. Non-finite
    /// or negative quantities are replaced by the resource's own values.
    pub fn apply(&self, r: &mut Resource) {
        let keep = |saved: f64, current: f64| if saved.is_finite() && saved >= 0.0 { saved } else { current };
        r.price_multiplier = self.price_multiplier.round_dp(6);
        r.storage_multiplier = keep(self.storage_multiplier, r.storage_multiplier);
        r.storage = keep(self.storage, r.storage);
        r.sell_num = keep(self.sell_num, r.sell_num);
        r.total_owned = keep(self.total_owned, r.total_owned);
        r.lost = keep(self.lost, r.lost);
        r.sold = keep(self.sold, r.sold);
        r.incurred = keep(self.incurred, r.incurred);
        r.earnings = self.earnings.round_dp(2);
        r.owned = keep(self.owned, r.owned).min(r.capacity());
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutomatorSave {
    pub upgrade_name: String,
    pub enabled: bool,
    pub saturation: f64,
}

impl Default for AutomatorSave {
    fn default() -> Self {
        Self {
            upgrade_name: String::new(),
            enabled: true,
            saturation: 0.0,
        }
    }
}

/// Wall-clock start of a run. Written as RFC 3339, read from RFC 3339 or
/// epoch milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartTime(pub DateTime<Utc>);

impl Serialize for StartTime {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for StartTime {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Millis(i64),
            Float(f64),
        }
        let parsed = match Raw::deserialize(d)? {
            Raw::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|t| t.with_timezone(&Utc))
                .ok(),
            Raw::Millis(ms) => DateTime::from_timestamp_millis(ms),
            Raw::Float(ms) if ms.is_finite() => DateTime::from_timestamp_millis(ms as i64),
            Raw::Float(_) => None,
        };
        parsed
            .map(StartTime)
            .ok_or_else(|| serde::de::Error::custom("startTime is neither RFC 3339 nor epoch millis"))
    }
}

/// Serialize a save, stamping the current schema version.
pub fn encode(save: &SaveData) -> Result<String, PersistError> {
    let mut save = save.clone();
    save.version = SAVE_VERSION;
    Ok(serde_json::to_string(&save)?)
}

pub fn decode(raw: &str) -> Result<SaveData, PersistError> {
    let save: SaveData = serde_json::from_str(raw)?;
    debug!(version = save.version, tiles = save.land.len(), "save decoded");
    Ok(save)
}

/// Where a serialized save lives. The simulation never touches the
/// transport directly.
pub trait SaveStore {
    /// The stored document, `None` when nothing has been saved.
    fn load(&self) -> Result<Option<String>, PersistError>;
    fn store(&mut self, raw: &str) -> Result<(), PersistError>;
    fn clear(&mut self) -> Result<(), PersistError>;
}

/// Decode whatever the store holds.
pub fn read_save(store: &dyn SaveStore) -> Result<Option<SaveData>, PersistError> {
    store.load()?.as_deref().map(decode).transpose()
}

pub fn write_save(store: &mut dyn SaveStore, save: &SaveData) -> Result<(), PersistError> {
    store.store(&encode(save)?)
}

/// In-process store, mostly for tests and headless runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    raw: Option<String>,
}

impl MemoryStore {
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self { raw: Some(raw.into()) }
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, PersistError> {
        Ok(self.raw.clone())
    }

    fn store(&mut self, raw: &str) -> Result<(), PersistError> {
        self.raw = Some(raw.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistError> {
        self.raw = None;
        Ok(())
    }
}

/// One JSON document on disk. Writes go through a sibling temp file and a
/// rename so a crash never leaves half a save.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for FileStore {
    fn load(&self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&mut self, raw: &str) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), bytes = raw.len(), "game saved");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Default location of the local save file.
pub fn default_save_path() -> PathBuf {
    PathBuf::from("./saves/idle-acres.json")
}
