//! Model registry for loading and managing normalized model records.

use std::collections::{BTreeSet, HashMap};

use rusqlite::params;
use tracing::debug;

use crate::db::Database;
use crate::sources::{ModelSource, Vendor};

use super::types::{ModelRecord, ModelStoreError};

/// Where normalized model records end up.
pub trait ModelStore {
    /// Add records; a record with an existing id replaces the old one.
    fn add_models(&mut self, records: Vec<ModelRecord>) -> Result<(), ModelStoreError>;

    /// Whether any model of `source_id` is stored.
    fn has_models_for(&self, source_id: &str) -> bool;
}

fn context_tokens(raw: i64) -> rusqlite::Result<u32> {
    u32::try_from(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Integer, Box::new(e))
    })
}

/// Registry of available models, in memory.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, ModelRecord>,
}

impl ModelRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load models from the database.
    pub fn load_from_db(db: &Database) -> Result<Self, ModelStoreError> {
        let mut registry = Self::new();

        let mut stmt = db.conn().prepare(
            "SELECT m.id, m.label, m.created, m.description, m.tags, m.context_tokens,
                    m.settings, s.id, s.label, s.vendor
             FROM models m JOIN sources s ON s.id = m.source_id
             ORDER BY m.id",
        )?;

        let rows = stmt.query_map([], |row| {
            let tags: String = row.get(4)?;
            let settings: String = row.get(6)?;
            let vendor: String = row.get(9)?;
            let source = ModelSource {
                id: row.get(7)?,
                label: row.get(8)?,
                vendor: Vendor::parse_lossy(&vendor),
            };
            Ok((
                ModelRecord {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    created: row.get(2)?,
                    description: row.get(3)?,
                    tags: BTreeSet::new(),
                    context_tokens: context_tokens(row.get(5)?)?,
                    source_id: source.id.clone(),
                    source,
                    settings: Default::default(),
                },
                tags,
                settings,
            ))
        })?;

        for row in rows {
            let (mut record, tags, settings) = row?;
            record.tags = serde_json::from_str(&tags)?;
            record.settings = serde_json::from_str(&settings)?;
            debug!(
                model = %record.id,
                source_id = %record.source_id,
                "Loaded model from database"
            );
            registry.models.insert(record.id.clone(), record);
        }

        debug!(
            total_models = registry.models.len(),
            "ModelRegistry loaded from database"
        );

        Ok(registry)
    }

    /// Add models to the database in one transaction.
    pub fn add_models_to_db(db: &Database, records: &[ModelRecord]) -> Result<(), ModelStoreError> {
        let tx = db.conn().unchecked_transaction()?;
        for record in records {
            debug!(
                model = %record.id,
                source_id = %record.source_id,
                "Saving model to database"
            );
            tx.execute(
                "INSERT OR REPLACE INTO models (id, source_id, label, created, description,
                    tags, context_tokens, settings, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, unixepoch())",
                params![
                    &record.id,
                    &record.source_id,
                    &record.label,
                    record.created,
                    &record.description,
                    serde_json::to_string(&record.tags)?,
                    record.context_tokens as i64,
                    serde_json::to_string(&record.settings)?,
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    ModelStoreError::UnknownSource(record.source_id.clone())
                }
                other => ModelStoreError::Database(other),
            })?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Add a model to the registry (in memory).
    pub fn add(&mut self, record: ModelRecord) {
        self.models.insert(record.id.clone(), record);
    }

    /// Get a model by id.
    pub fn get(&self, id: &str) -> Option<&ModelRecord> {
        self.models.get(id)
    }

    /// Check if a model exists.
    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    /// Get all model ids as a sorted vector.
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        ids.sort();
        ids
    }

    /// Get all models.
    pub fn all(&self) -> impl Iterator<Item = &ModelRecord> {
        self.models.values()
    }

    /// Models of one source, sorted by id.
    pub fn for_source(&self, source_id: &str) -> Vec<&ModelRecord> {
        let mut models: Vec<&ModelRecord> = self
            .models
            .values()
            .filter(|m| m.source_id == source_id)
            .collect();
        models.sort_by(|a, b| a.id.cmp(&b.id));
        models
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Number of models in the registry.
    pub fn len(&self) -> usize {
        self.models.len()
    }
}

impl ModelStore for ModelRegistry {
    fn add_models(&mut self, records: Vec<ModelRecord>) -> Result<(), ModelStoreError> {
        for record in records {
            self.add(record);
        }
        Ok(())
    }

    fn has_models_for(&self, source_id: &str) -> bool {
        self.models.values().any(|m| m.source_id == source_id)
    }
}

/// A [`ModelRegistry`] that writes through to the database.
pub struct DbModelStore<'a> {
    db: &'a Database,
    registry: ModelRegistry,
}

impl<'a> DbModelStore<'a> {
    /// Open the store, loading the models already in the database.
    pub fn open(db: &'a Database) -> Result<Self, ModelStoreError> {
        Ok(Self {
            db,
            registry: ModelRegistry::load_from_db(db)?,
        })
    }

    /// The in-memory view.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }
}

impl ModelStore for DbModelStore<'_> {
    fn add_models(&mut self, records: Vec<ModelRecord>) -> Result<(), ModelStoreError> {
        ModelRegistry::add_models_to_db(self.db, &records)?;
        self.registry.add_models(records)
    }

    fn has_models_for(&self, source_id: &str) -> bool {
        self.registry.has_models_for(source_id)
    }
}
