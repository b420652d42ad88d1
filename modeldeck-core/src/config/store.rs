//! Setup stores.
//!
//! [`SetupStore`] is the read/merge seam the setup panel is written against.
//! [`DbSetupStore`] persists to SQLite; [`MemorySetupStore`] is for tests and
//! ephemeral sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, warn};

use super::setup::{normalize_setup, PartialSourceSetup, SourceSetup};
use crate::db::Database;

/// Errors that can occur while reading or writing a setup.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Unknown source: {0}")]
    UnknownSource(String),
}

/// Per-source setup storage.
pub trait SetupStore {
    /// Read the setup of a source, with defaults filled in.
    fn read(&self, source_id: &str) -> Result<SourceSetup, StoreError>;

    /// Overlay the fields present in `update` onto the stored setup.
    fn merge(&self, source_id: &str, update: PartialSourceSetup) -> Result<(), StoreError>;
}

// =============================================================================
// SQLite
// =============================================================================

/// Setup store backed by the `source_setups` table.
pub struct DbSetupStore<'a> {
    db: &'a Database,
}

impl<'a> DbSetupStore<'a> {
    /// Create a new store over an open, migrated database.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Load the stored partial setup.
    ///
    /// Missing or unparseable rows yield an empty partial setup.
    fn load_partial(&self, source_id: &str) -> Result<PartialSourceSetup, StoreError> {
        let Some(json) = self.db.get_source_setup(source_id)? else {
            return Ok(PartialSourceSetup::default());
        };
        match serde_json::from_str::<PartialSourceSetup>(&json) {
            Ok(partial) => Ok(partial),
            Err(e) => {
                warn!(source_id = %source_id, error = %e, "Failed to parse source setup, using defaults");
                Ok(PartialSourceSetup::default())
            }
        }
    }
}

impl SetupStore for DbSetupStore<'_> {
    fn read(&self, source_id: &str) -> Result<SourceSetup, StoreError> {
        Ok(normalize_setup(&self.load_partial(source_id)?))
    }

    fn merge(&self, source_id: &str, update: PartialSourceSetup) -> Result<(), StoreError> {
        if self.db.get_source(source_id)?.is_none() {
            return Err(StoreError::UnknownSource(source_id.to_string()));
        }

        let mut stored = self.load_partial(source_id)?;
        stored.merge(update);

        let json = serde_json::to_string(&stored)?;
        self.db.set_source_setup(source_id, &json)?;
        debug!(source_id = %source_id, "Source setup updated");
        Ok(())
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Setup store held in memory.
#[derive(Debug, Default)]
pub struct MemorySetupStore {
    setups: Mutex<HashMap<String, PartialSourceSetup>>,
}

impl MemorySetupStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored partial setup, if the source was ever written.
    pub fn stored(&self, source_id: &str) -> Option<PartialSourceSetup> {
        self.setups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(source_id)
            .cloned()
    }
}

impl SetupStore for MemorySetupStore {
    fn read(&self, source_id: &str) -> Result<SourceSetup, StoreError> {
        Ok(normalize_setup(
            &self.stored(source_id).unwrap_or_default(),
        ))
    }

    fn merge(&self, source_id: &str, update: PartialSourceSetup) -> Result<(), StoreError> {
        let mut setups = self.setups.lock().unwrap_or_else(|e| e.into_inner());
        setups
            .entry(source_id.to_string())
            .or_default()
            .merge(update);
        Ok(())
    }
}
