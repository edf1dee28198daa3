//! SQLite-backed title store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{TitleRecord, TitleStore, TitleStoreError};

const SELECT_COLUMNS: &str = "codename, display_title, season, correction, episode_index, \
     source_url, last_torrent_reference, last_publish_date, last_episode, release_group, \
     download_dir";

/// SQLite-backed title store.
pub struct SqliteTitleStore {
    conn: Mutex<Connection>,
}

/// A row as stored, before timestamps are parsed.
struct TitleRow {
    codename: String,
    display_title: String,
    season: u32,
    correction: i32,
    episode_index: i32,
    source_url: String,
    last_torrent_reference: Option<String>,
    last_publish_date: Option<String>,
    last_episode: Option<i64>,
    release_group: Option<String>,
    download_dir: Option<String>,
}

impl TitleRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            codename: row.get(0)?,
            display_title: row.get(1)?,
            season: row.get(2)?,
            correction: row.get(3)?,
            episode_index: row.get(4)?,
            source_url: row.get(5)?,
            last_torrent_reference: row.get(6)?,
            last_publish_date: row.get(7)?,
            last_episode: row.get(8)?,
            release_group: row.get(9)?,
            download_dir: row.get(10)?,
        })
    }

    fn into_record(self) -> Result<TitleRecord, TitleStoreError> {
        let last_publish_date = match self.last_publish_date {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| TitleStoreError::Corrupt {
                        codename: self.codename.clone(),
                        reason: format!("bad last_publish_date {:?}: {}", raw, e),
                    })?,
            ),
            None => None,
        };

        Ok(TitleRecord {
            codename: self.codename,
            display_title: self.display_title,
            season: self.season,
            correction: self.correction,
            episode_index: self.episode_index,
            source_url: self.source_url,
            last_torrent_reference: self.last_torrent_reference.filter(|r| !r.is_empty()),
            last_publish_date,
            last_episode: self.last_episode,
            release_group: self.release_group,
            download_dir: self.download_dir,
        })
    }
}

fn db_err(e: rusqlite::Error) -> TitleStoreError {
    TitleStoreError::Database(e.to_string())
}

impl SqliteTitleStore {
    /// Create a new SQLite title store, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, TitleStoreError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite title store (useful for testing).
    pub fn in_memory() -> Result<Self, TitleStoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TitleStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS titles (
                codename TEXT PRIMARY KEY,
                display_title TEXT NOT NULL,
                season INTEGER NOT NULL DEFAULT 1,
                correction INTEGER NOT NULL DEFAULT 0,
                episode_index INTEGER NOT NULL DEFAULT 0,
                source_url TEXT NOT NULL DEFAULT '',
                last_torrent_reference TEXT,
                last_publish_date TEXT,
                last_episode INTEGER,
                release_group TEXT,
                download_dir TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_titles_source_url ON titles(source_url);
            "#,
        )
        .map_err(db_err)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TitleStoreError> {
        self.conn
            .lock()
            .map_err(|_| TitleStoreError::Database("connection mutex poisoned".to_string()))
    }
}

impl TitleStore for SqliteTitleStore {
    fn get(&self, codename: &str) -> Result<Option<TitleRecord>, TitleStoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM titles WHERE codename = ?1", SELECT_COLUMNS),
                params![codename],
                TitleRow::from_row,
            )
            .optional()
            .map_err(db_err)?;

        row.map(TitleRow::into_record).transpose()
    }

    fn put(&self, record: &TitleRecord) -> Result<(), TitleStoreError> {
        let conn = self.lock()?;
        // Upsert keeps the rowid, so enumeration order stays the binding order.
        conn.execute(
            r#"
            INSERT INTO titles (
                codename, display_title, season, correction, episode_index, source_url,
                last_torrent_reference, last_publish_date, last_episode, release_group,
                download_dir
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(codename) DO UPDATE SET
                display_title = excluded.display_title,
                season = excluded.season,
                correction = excluded.correction,
                episode_index = excluded.episode_index,
                source_url = excluded.source_url,
                last_torrent_reference = excluded.last_torrent_reference,
                last_publish_date = excluded.last_publish_date,
                last_episode = excluded.last_episode,
                release_group = excluded.release_group,
                download_dir = excluded.download_dir
            "#,
            params![
                record.codename,
                record.display_title,
                record.season,
                record.correction,
                record.episode_index,
                record.source_url,
                record.last_torrent_reference,
                record.last_publish_date.map(|d| d.to_rfc3339()),
                record.last_episode,
                record.release_group,
                record.download_dir,
            ],
        )
        .map_err(db_err)?;

        Ok(())
    }

    fn list_all(&self) -> Result<Vec<TitleRecord>, TitleStoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM titles ORDER BY rowid", SELECT_COLUMNS))
            .map_err(db_err)?;

        let rows = stmt
            .query_map([], TitleRow::from_row)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        rows.into_iter().map(TitleRow::into_record).collect()
    }

    fn resolve_by_url(&self, url: &str) -> Result<Option<String>, TitleStoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT codename FROM titles WHERE source_url = ?1 ORDER BY rowid LIMIT 1",
            params![url],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_err)
    }
}
