use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::domain::{BestPages, EvaluationStatus};
use super::mapping::{
    ChurchAddress, ChurchDetail, DenominationSummary, EvaluationRecord, EvaluationWrite,
    ServiceTime,
};
use super::repository::{ChurchId, ChurchStore, StoreError};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS churches (
        id                      INTEGER PRIMARY KEY AUTOINCREMENT,
        name                    TEXT NOT NULL,
        website                 TEXT NOT NULL UNIQUE,
        phone                   TEXT,
        email                   TEXT,
        denomination_label      TEXT,
        denomination_confidence REAL,
        denomination_signals    TEXT NOT NULL DEFAULT '[]',
        confession_adopted      BOOLEAN NOT NULL DEFAULT 0,
        confession_name         TEXT,
        confession_source_url   TEXT,
        best_beliefs_url        TEXT,
        best_confession_url     TEXT,
        best_about_url          TEXT,
        best_leadership_url     TEXT,
        created_at              TEXT NOT NULL,
        updated_at              TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS church_addresses (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        church_id   INTEGER NOT NULL REFERENCES churches(id) ON DELETE CASCADE,
        street_1    TEXT,
        street_2    TEXT,
        city        TEXT,
        state       TEXT,
        post_code   TEXT,
        latitude    REAL,
        longitude   REAL,
        source_url  TEXT,
        is_primary  BOOLEAN NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_church_addresses_church ON church_addresses(church_id);

    CREATE TABLE IF NOT EXISTS church_service_times (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        church_id   INTEGER NOT NULL REFERENCES churches(id) ON DELETE CASCADE,
        label       TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_church_service_times_church ON church_service_times(church_id);

    CREATE TABLE IF NOT EXISTS church_evaluations (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        church_id           INTEGER NOT NULL REFERENCES churches(id) ON DELETE CASCADE,
        status              TEXT NOT NULL CHECK(status IN ('pass','caution','red_flag')),
        badges              TEXT NOT NULL,
        coverage_ratio      REAL NOT NULL,
        core_on_site_count  INTEGER NOT NULL,
        core_total_count    INTEGER NOT NULL,
        false_count         INTEGER NOT NULL,
        confession_adopted  BOOLEAN NOT NULL,
        core_doctrines      TEXT NOT NULL,
        secondary           TEXT NOT NULL,
        tertiary            TEXT NOT NULL,
        raw_evaluation      TEXT NOT NULL,
        created_at          TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_church_evaluations_latest
        ON church_evaluations(church_id, created_at DESC, id DESC);
";

const CHURCH_COLUMNS: &str = "id, name, website, phone, email, denomination_label, \
    denomination_confidence, denomination_signals, confession_adopted, confession_name, \
    confession_source_url, best_beliefs_url, best_confession_url, best_about_url, \
    best_leadership_url, created_at, updated_at";

const EVALUATION_COLUMNS: &str = "id, status, badges, coverage_ratio, core_on_site_count, \
    core_total_count, false_count, confession_adopted, core_doctrines, secondary, tertiary, \
    raw_evaluation, created_at";

/// SQLite-backed church store. A single connection serializes all writers.
pub struct SqliteChurchStore {
    conn: Mutex<Connection>,
}

impl SqliteChurchStore {
    /// Open (creating if needed) the database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(unavailable)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(unavailable)?;
        Self::initialize(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(unavailable)?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(unavailable)?;
        conn.execute_batch(SCHEMA).map_err(unavailable)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }
}

impl ChurchStore for SqliteChurchStore {
    fn record_evaluation(&self, write: EvaluationWrite) -> Result<ChurchDetail, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(transaction)?;
        let now = timestamp(Utc::now());
        let profile = &write.profile;
        let signals = to_json(&profile.denomination_signals)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM churches WHERE website = ?1",
                params![profile.website],
                |row| row.get(0),
            )
            .optional()
            .map_err(transaction)?;

        let church_id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE churches SET name = ?1, phone = ?2, email = ?3, denomination_label = ?4,
                        denomination_confidence = ?5, denomination_signals = ?6,
                        confession_adopted = ?7, confession_name = ?8, confession_source_url = ?9,
                        best_beliefs_url = ?10, best_confession_url = ?11, best_about_url = ?12,
                        best_leadership_url = ?13, updated_at = ?14
                     WHERE id = ?15",
                    params![
                        profile.name,
                        profile.phone,
                        profile.email,
                        profile.denomination_label,
                        profile.denomination_confidence,
                        signals,
                        profile.confession_adopted,
                        profile.confession_name,
                        profile.confession_source_url,
                        profile.best_pages.beliefs,
                        profile.best_pages.confession,
                        profile.best_pages.about,
                        profile.best_pages.leadership,
                        now,
                        id,
                    ],
                )
                .map_err(transaction)?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO churches (name, website, phone, email, denomination_label,
                        denomination_confidence, denomination_signals, confession_adopted,
                        confession_name, confession_source_url, best_beliefs_url,
                        best_confession_url, best_about_url, best_leadership_url,
                        created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
                    params![
                        profile.name,
                        profile.website,
                        profile.phone,
                        profile.email,
                        profile.denomination_label,
                        profile.denomination_confidence,
                        signals,
                        profile.confession_adopted,
                        profile.confession_name,
                        profile.confession_source_url,
                        profile.best_pages.beliefs,
                        profile.best_pages.confession,
                        profile.best_pages.about,
                        profile.best_pages.leadership,
                        now,
                    ],
                )
                .map_err(insert_conflict)?;
                tx.last_insert_rowid()
            }
        };

        tx.execute(
            "DELETE FROM church_addresses WHERE church_id = ?1",
            params![church_id],
        )
        .map_err(transaction)?;
        tx.execute(
            "DELETE FROM church_service_times WHERE church_id = ?1",
            params![church_id],
        )
        .map_err(transaction)?;

        for address in &write.addresses {
            tx.execute(
                "INSERT INTO church_addresses (church_id, street_1, street_2, city, state,
                    post_code, latitude, longitude, source_url, is_primary)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    church_id,
                    address.street_1,
                    address.street_2,
                    address.city,
                    address.state,
                    address.post_code,
                    address.latitude,
                    address.longitude,
                    address.source_url,
                    address.is_primary,
                ],
            )
            .map_err(transaction)?;
        }

        for label in &write.service_times {
            tx.execute(
                "INSERT INTO church_service_times (church_id, label) VALUES (?1, ?2)",
                params![church_id, label],
            )
            .map_err(transaction)?;
        }

        let processed = &write.processed;
        tx.execute(
            "INSERT INTO church_evaluations (church_id, status, badges, coverage_ratio,
                core_on_site_count, core_total_count, false_count, confession_adopted,
                core_doctrines, secondary, tertiary, raw_evaluation, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                church_id,
                processed.status.label(),
                to_json(&processed.badges)?,
                processed.coverage_ratio,
                processed.core_on_site_count,
                processed.core_total_count,
                processed.false_count,
                processed.confession_adopted,
                to_json(&processed.normalized_core)?,
                to_json(&processed.secondary)?,
                to_json(&processed.tertiary)?,
                to_json(&write.raw)?,
                now,
            ],
        )
        .map_err(transaction)?;

        let detail = load_detail(&tx, church_id)
            .map_err(rolled_back)?
            .ok_or_else(|| {
                StoreError::Transaction(format!("church {church_id} vanished before commit"))
            })?;
        tx.commit().map_err(transaction)?;

        debug!(church_id, "evaluation recorded");
        Ok(detail)
    }

    fn find_by_website(&self, website: &str) -> Result<Option<ChurchDetail>, StoreError> {
        let conn = self.lock()?;
        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM churches WHERE website = ?1",
                params![website],
                |row| row.get(0),
            )
            .optional()
            .map_err(unavailable)?;
        match id {
            Some(id) => load_detail(&conn, id),
            None => Ok(None),
        }
    }

    fn fetch(&self, id: ChurchId) -> Result<Option<ChurchDetail>, StoreError> {
        let conn = self.lock()?;
        load_detail(&conn, id.0)
    }

    fn history(&self, id: ChurchId) -> Result<Vec<EvaluationRecord>, StoreError> {
        let conn = self.lock()?;
        load_evaluations(&conn, id.0, None)
    }

    fn all(&self) -> Result<Vec<ChurchDetail>, StoreError> {
        let conn = self.lock()?;
        let ids: Vec<i64> = {
            let mut stmt = conn
                .prepare("SELECT id FROM churches ORDER BY id")
                .map_err(unavailable)?;
            let rows = stmt
                .query_map([], |row| row.get(0))
                .map_err(unavailable)?;
            rows.collect::<Result<_, _>>().map_err(unavailable)?
        };

        let mut details = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(detail) = load_detail(&conn, id)? {
                details.push(detail);
            }
        }
        Ok(details)
    }

    fn delete(&self, id: ChurchId) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM churches WHERE id = ?1", params![id.0])
            .map_err(unavailable)?;
        Ok(removed > 0)
    }
}

fn load_detail(conn: &Connection, id: i64) -> Result<Option<ChurchDetail>, StoreError> {
    let sql = format!("SELECT {CHURCH_COLUMNS} FROM churches WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id], ChurchRow::from_row)
        .optional()
        .map_err(unavailable)?;
    let Some(row) = row else {
        return Ok(None);
    };

    let addresses = {
        let mut stmt = conn
            .prepare(
                "SELECT id, street_1, street_2, city, state, post_code, latitude, longitude,
                    source_url, is_primary
                 FROM church_addresses WHERE church_id = ?1
                 ORDER BY is_primary DESC, id ASC",
            )
            .map_err(unavailable)?;
        let rows = stmt
            .query_map(params![id], |row| {
                Ok(ChurchAddress {
                    id: row.get(0)?,
                    street_1: row.get(1)?,
                    street_2: row.get(2)?,
                    city: row.get(3)?,
                    state: row.get(4)?,
                    post_code: row.get(5)?,
                    latitude: row.get(6)?,
                    longitude: row.get(7)?,
                    source_url: row.get(8)?,
                    is_primary: row.get(9)?,
                })
            })
            .map_err(unavailable)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(unavailable)?
    };

    let service_times = {
        let mut stmt = conn
            .prepare("SELECT id, label FROM church_service_times WHERE church_id = ?1 ORDER BY id")
            .map_err(unavailable)?;
        let rows = stmt
            .query_map(params![id], |row| {
                Ok(ServiceTime {
                    id: row.get(0)?,
                    label: row.get(1)?,
                })
            })
            .map_err(unavailable)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(unavailable)?
    };

    let evaluation = load_evaluations(conn, id, Some(1))?.into_iter().next();

    Ok(Some(ChurchDetail {
        id: ChurchId(row.id),
        name: row.name,
        website: row.website,
        phone: row.phone,
        email: row.email,
        denomination: DenominationSummary {
            label: row.denomination_label,
            confidence: row.denomination_confidence,
            signals: from_json(&row.denomination_signals)?,
        },
        confession_adopted: row.confession_adopted,
        confession_name: row.confession_name,
        confession_source_url: row.confession_source_url,
        best_pages: BestPages {
            beliefs: row.best_beliefs_url,
            confession: row.best_confession_url,
            about: row.best_about_url,
            leadership: row.best_leadership_url,
        },
        addresses,
        service_times,
        evaluation,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    }))
}

fn load_evaluations(
    conn: &Connection,
    church_id: i64,
    limit: Option<i64>,
) -> Result<Vec<EvaluationRecord>, StoreError> {
    let sql = format!(
        "SELECT {EVALUATION_COLUMNS} FROM church_evaluations WHERE church_id = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql).map_err(unavailable)?;
    let rows = stmt
        .query_map(params![church_id, limit.unwrap_or(-1)], EvaluationRow::from_row)
        .map_err(unavailable)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row.map_err(unavailable)?.into_record()?);
    }
    Ok(records)
}

struct ChurchRow {
    id: i64,
    name: String,
    website: String,
    phone: Option<String>,
    email: Option<String>,
    denomination_label: Option<String>,
    denomination_confidence: Option<f64>,
    denomination_signals: String,
    confession_adopted: bool,
    confession_name: Option<String>,
    confession_source_url: Option<String>,
    best_beliefs_url: Option<String>,
    best_confession_url: Option<String>,
    best_about_url: Option<String>,
    best_leadership_url: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ChurchRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            website: row.get(2)?,
            phone: row.get(3)?,
            email: row.get(4)?,
            denomination_label: row.get(5)?,
            denomination_confidence: row.get(6)?,
            denomination_signals: row.get(7)?,
            confession_adopted: row.get(8)?,
            confession_name: row.get(9)?,
            confession_source_url: row.get(10)?,
            best_beliefs_url: row.get(11)?,
            best_confession_url: row.get(12)?,
            best_about_url: row.get(13)?,
            best_leadership_url: row.get(14)?,
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
        })
    }
}

struct EvaluationRow {
    id: i64,
    status: String,
    badges: String,
    coverage_ratio: f64,
    core_on_site_count: u32,
    core_total_count: u32,
    false_count: u32,
    confession_adopted: bool,
    core_doctrines: String,
    secondary: String,
    tertiary: String,
    raw_evaluation: String,
    created_at: String,
}

impl EvaluationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            status: row.get(1)?,
            badges: row.get(2)?,
            coverage_ratio: row.get(3)?,
            core_on_site_count: row.get(4)?,
            core_total_count: row.get(5)?,
            false_count: row.get(6)?,
            confession_adopted: row.get(7)?,
            core_doctrines: row.get(8)?,
            secondary: row.get(9)?,
            tertiary: row.get(10)?,
            raw_evaluation: row.get(11)?,
            created_at: row.get(12)?,
        })
    }

    fn into_record(self) -> Result<EvaluationRecord, StoreError> {
        let status = EvaluationStatus::from_label(&self.status).ok_or_else(|| {
            StoreError::Serialization(format!("unknown evaluation status {:?}", self.status))
        })?;
        Ok(EvaluationRecord {
            id: self.id,
            status,
            badges: from_json(&self.badges)?,
            coverage_ratio: self.coverage_ratio,
            core_on_site_count: self.core_on_site_count,
            core_total_count: self.core_total_count,
            false_count: self.false_count,
            confession_adopted: self.confession_adopted,
            core_doctrines: from_json(&self.core_doctrines)?,
            secondary: from_json(&self.secondary)?,
            tertiary: from_json(&self.tertiary)?,
            raw: from_json(&self.raw_evaluation)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| StoreError::Serialization(format!("bad timestamp {value:?}: {err}")))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|err| StoreError::Serialization(err.to_string()))
}

fn from_json<T: DeserializeOwned>(value: &str) -> Result<T, StoreError> {
    serde_json::from_str(value).map_err(|err| StoreError::Serialization(err.to_string()))
}

fn unavailable(err: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn transaction(err: rusqlite::Error) -> StoreError {
    StoreError::Transaction(err.to_string())
}

/// A concurrent writer inserted the same website first.
fn insert_conflict(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::Conflict(err.to_string())
        }
        _ => transaction(err),
    }
}

/// Read failures inside an open transaction abort it.
fn rolled_back(err: StoreError) -> StoreError {
    match err {
        StoreError::Unavailable(message) => StoreError::Transaction(message),
        other => other,
    }
}
