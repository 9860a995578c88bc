//! SQLite ledger of debate builds
//!
//! Tracks which debates of a batch were built, which failed and why, and
//! keeps the node-link JSON of every built graph so interrupted batches can
//! resume where they stopped.

use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Errors that can occur during ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid stored data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Connection lock poisoned
    #[error("Ledger connection unavailable")]
    Unavailable,
}

/// Build status of a debate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// Registered, not built yet
    Pending,
    /// Built successfully
    Built,
    /// Last attempt failed
    Failed,
}

impl BuildStatus {
    fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Pending => "pending",
            BuildStatus::Built => "built",
            BuildStatus::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Result<Self, LedgerError> {
        match s {
            "pending" => Ok(BuildStatus::Pending),
            "built" => Ok(BuildStatus::Built),
            "failed" => Ok(BuildStatus::Failed),
            other => Err(LedgerError::InvalidData(format!("unknown status '{}'", other))),
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger row, without the graph payload
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// Debate identifier
    pub debate_id: String,
    /// Current status
    pub status: BuildStatus,
    /// Number of finished build attempts
    pub attempts: u32,
    /// Error of the last failed attempt
    pub last_error: Option<String>,
    /// Time of the last update (SQLite `CURRENT_TIMESTAMP`)
    pub updated_at: String,
}

/// Persistent ledger backed by SQLite
///
/// The connection sits behind a mutex so a ledger can be shared by the
/// concurrent builds of one batch.
///
/// # Examples
///
/// ```no_run
/// use argmap_store::DebateLedger;
///
/// let ledger = DebateLedger::open("debates.db").unwrap();
/// ledger.register("carbon-tax").unwrap();
/// ```
pub struct DebateLedger {
    conn: Mutex<Connection>,
}

impl DebateLedger {
    /// Open (or create) a ledger database
    ///
    /// Use `:memory:` for an in-memory ledger.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory ledger
    pub fn in_memory() -> Result<Self, LedgerError> {
        Self::open(":memory:")
    }

    /// Register a debate as pending; existing rows are left unchanged
    pub fn register(&self, debate_id: &str) -> Result<(), LedgerError> {
        self.conn()?.execute(
            "INSERT OR IGNORE INTO debates (debate_id, status) VALUES (?1, ?2)",
            params![debate_id, BuildStatus::Pending.as_str()],
        )?;
        Ok(())
    }

    /// Record a successful build with its graph JSON
    pub fn mark_built(&self, debate_id: &str, graph_json: &str) -> Result<(), LedgerError> {
        self.conn()?.execute(
            "INSERT INTO debates (debate_id, status, attempts, last_error, graph_json)
             VALUES (?1, ?2, 1, NULL, ?3)
             ON CONFLICT(debate_id) DO UPDATE SET
                status = excluded.status,
                attempts = attempts + 1,
                last_error = NULL,
                graph_json = excluded.graph_json,
                updated_at = CURRENT_TIMESTAMP",
            params![debate_id, BuildStatus::Built.as_str(), graph_json],
        )?;
        Ok(())
    }

    /// Record a failed build
    pub fn mark_failed(&self, debate_id: &str, error: &str) -> Result<(), LedgerError> {
        self.conn()?.execute(
            "INSERT INTO debates (debate_id, status, attempts, last_error)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(debate_id) DO UPDATE SET
                status = excluded.status,
                attempts = attempts + 1,
                last_error = excluded.last_error,
                updated_at = CURRENT_TIMESTAMP",
            params![debate_id, BuildStatus::Failed.as_str(), error],
        )?;
        Ok(())
    }

    /// Status of a debate, `None` if never registered
    pub fn status(&self, debate_id: &str) -> Result<Option<BuildStatus>, LedgerError> {
        let status: Option<String> = self
            .conn()?
            .query_row(
                "SELECT status FROM debates WHERE debate_id = ?1",
                params![debate_id],
                |row| row.get(0),
            )
            .optional()?;
        status.as_deref().map(BuildStatus::parse).transpose()
    }

    /// Whether a debate still needs to be built
    pub fn needs_build(&self, debate_id: &str) -> Result<bool, LedgerError> {
        Ok(self.status(debate_id)? != Some(BuildStatus::Built))
    }

    /// Full entry for a debate
    pub fn entry(&self, debate_id: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        let row = self
            .conn()?
            .query_row(
                "SELECT debate_id, status, attempts, last_error, updated_at
                 FROM debates WHERE debate_id = ?1",
                params![debate_id],
                Self::read_row,
            )
            .optional()?;
        row.map(Self::into_entry).transpose()
    }

    /// All entries, ordered by debate id
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT debate_id, status, attempts, last_error, updated_at
             FROM debates ORDER BY debate_id",
        )?;
        let rows = stmt.query_map([], Self::read_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(Self::into_entry(row?)?);
        }
        Ok(entries)
    }

    /// Stored graph JSON of a built debate
    pub fn graph_json(&self, debate_id: &str) -> Result<Option<String>, LedgerError> {
        let json: Option<Option<String>> = self
            .conn()?
            .query_row(
                "SELECT graph_json FROM debates WHERE debate_id = ?1",
                params![debate_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(json.flatten())
    }

    #[allow(clippy::type_complexity)]
    fn read_row(
        row: &rusqlite::Row<'_>,
    ) -> rusqlite::Result<(String, String, u32, Option<String>, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    }

    fn into_entry(
        (debate_id, status, attempts, last_error, updated_at): (
            String,
            String,
            u32,
            Option<String>,
            String,
        ),
    ) -> Result<LedgerEntry, LedgerError> {
        Ok(LedgerEntry {
            debate_id,
            status: BuildStatus::parse(&status)?,
            attempts,
            last_error,
            updated_at,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn.lock().map_err(|_| LedgerError::Unavailable)
    }
}
