//! SQLite database layer for Modeldeck.
//!
//! Provides persistent storage for:
//! - Vendor sources (one row per configured source)
//! - Source setups (API key, host, sampling parameters) as JSON
//! - Normalized model records (see [`crate::models::ModelRegistry`])

mod migrations;

use rusqlite::{params, Connection};
use std::path::PathBuf;

use crate::sources::{ModelSource, Vendor};

/// Environment variable overriding the default database location.
pub const DB_PATH_ENV: &str = "MODELDECK_DB";

/// Database connection wrapper.
///
/// Provides a high-level API for interacting with the SQLite database.
/// Automatically handles connection setup, migrations, and file permissions.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open the database at the default location.
    ///
    /// Default path: `~/.local/share/modeldeck/modeldeck.db`, or `$MODELDECK_DB`.
    pub fn open() -> anyhow::Result<Self> {
        let path = match std::env::var_os(DB_PATH_ENV) {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => Self::default_path()?,
        };
        Self::open_at(path)
    }

    /// Open the database at a specific path.
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 0600 on Unix (API keys live in here).
    pub fn open_at(path: PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
            {
                tracing::warn!(path = %path.display(), error = %e, "Failed to set database file permissions");
            }
        }

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn, path })
    }

    /// Get the default database path.
    ///
    /// Returns `~/.local/share/modeldeck/modeldeck.db` (or platform equivalent).
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".local/share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(data_dir.join("modeldeck").join("modeldeck.db"))
    }

    /// Run database migrations.
    ///
    /// Safe to call multiple times - migrations are tracked and only run once.
    pub fn migrate(&self) -> anyhow::Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Get the database file path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    // =========================================================================
    // Source Storage
    // =========================================================================

    /// Save a source (upsert on id).
    pub fn save_source(&self, source: &ModelSource) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO sources (id, label, vendor) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET label = excluded.label, vendor = excluded.vendor",
            params![&source.id, &source.label, source.vendor.to_string()],
        )?;
        Ok(())
    }

    /// Get a source by id.
    ///
    /// Returns `None` if the source doesn't exist.
    pub fn get_source(&self, id: &str) -> Result<Option<ModelSource>, rusqlite::Error> {
        let result = self.conn.query_row(
            "SELECT id, label, vendor FROM sources WHERE id = ?",
            [id],
            |row| {
                let vendor: String = row.get(2)?;
                Ok(ModelSource {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    vendor: Vendor::parse_lossy(&vendor),
                })
            },
        );
        match result {
            Ok(source) => Ok(Some(source)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// List all sources, in creation order.
    pub fn list_sources(&self) -> Result<Vec<ModelSource>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, label, vendor FROM sources ORDER BY created_at, id")?;
        let rows = stmt.query_map([], |row| {
            let vendor: String = row.get(2)?;
            Ok(ModelSource {
                id: row.get(0)?,
                label: row.get(1)?,
                vendor: Vendor::parse_lossy(&vendor),
            })
        })?;
        rows.collect()
    }

    // =========================================================================
    // Setup Storage
    // =========================================================================

    /// Save the raw setup JSON for a source (upsert).
    pub fn set_source_setup(&self, source_id: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO source_setups (source_id, value, updated_at) VALUES (?, ?, unixepoch())
             ON CONFLICT(source_id) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            [source_id, value],
        )?;
        Ok(())
    }

    /// Get the raw setup JSON for a source.
    ///
    /// Returns `None` if the source was never configured.
    pub fn get_source_setup(&self, source_id: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM source_setups WHERE source_id = ?")?;
        let result = stmt.query_row([source_id], |row| row.get(0));
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_db() -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Database::open_at(db_path).unwrap();
        db.migrate().unwrap();
        (temp_dir, db)
    }

    fn openai_source(id: &str) -> ModelSource {
        ModelSource {
            id: id.to_string(),
            label: "OpenAI".to_string(),
            vendor: Vendor::OpenAi,
        }
    }

    // -------------------------------------------------------------------------
    // Database Opening/Creation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_open_at_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let nested_path = tmp.path().join("deep").join("nested").join("test.db");

        assert!(!nested_path.parent().unwrap().exists());

        let _db = Database::open_at(nested_path.clone()).unwrap();

        assert!(nested_path.exists());
    }

    #[test]
    fn test_open_at_reuses_existing_database() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.db");

        {
            let db = Database::open_at(path.clone()).unwrap();
            db.migrate().unwrap();
            db.save_source(&openai_source("openai")).unwrap();
        }

        {
            let db = Database::open_at(path).unwrap();
            let source = db.get_source("openai").unwrap();
            assert_eq!(source, Some(openai_source("openai")));
        }
    }

    #[test]
    fn test_default_path_returns_valid_path() {
        if let Ok(path) = Database::default_path() {
            assert!(path.ends_with("modeldeck/modeldeck.db"));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_open_at_sets_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("secure.db");

        let _db = Database::open_at(path.clone()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "Database should have 0600 permissions");
    }

    // -------------------------------------------------------------------------
    // Source Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_get_source_returns_none_for_missing() {
        let (_temp, db) = setup_test_db();
        assert!(db.get_source("openai").unwrap().is_none());
    }

    #[test]
    fn test_save_source_upserts_label() {
        let (_temp, db) = setup_test_db();

        db.save_source(&openai_source("openai")).unwrap();
        let mut renamed = openai_source("openai");
        renamed.label = "Work OpenAI".to_string();
        db.save_source(&renamed).unwrap();

        let sources = db.list_sources().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].label, "Work OpenAI");
    }

    #[test]
    fn test_list_sources() {
        let (_temp, db) = setup_test_db();

        db.save_source(&openai_source("openai")).unwrap();
        db.save_source(&openai_source("openai-2")).unwrap();

        let ids: Vec<String> = db.list_sources().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["openai", "openai-2"]);
    }

    // -------------------------------------------------------------------------
    // Setup Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_source_setup_upserts() {
        let (_temp, db) = setup_test_db();
        db.save_source(&openai_source("openai")).unwrap();

        db.set_source_setup("openai", r#"{"api_key":"a"}"#).unwrap();
        db.set_source_setup("openai", r#"{"api_key":"b"}"#).unwrap();

        assert_eq!(
            db.get_source_setup("openai").unwrap(),
            Some(r#"{"api_key":"b"}"#.to_string())
        );
    }

    #[test]
    fn test_source_setup_requires_existing_source() {
        let (_temp, db) = setup_test_db();
        assert!(db.set_source_setup("ghost", "{}").is_err());
    }
}
