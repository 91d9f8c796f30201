mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::models::{Budget, Expense, Income};

pub(crate) const INCOMES_SLOT: &str = "incomes";
pub(crate) const BUDGETS_SLOT: &str = "budgets";
pub(crate) const EXPENSES_SLOT: &str = "expenses";

/// The three persisted collections, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Snapshot {
    pub(crate) incomes: Vec<Income>,
    pub(crate) budgets: Vec<Budget>,
    pub(crate) expenses: Vec<Expense>,
}

/// Persistence collaborator for the ledger.
pub(crate) trait Store {
    /// Missing collections load as empty.
    fn load(&self) -> Result<Snapshot>;
    fn save(&mut self, snapshot: &Snapshot) -> Result<()>;
}

/// Key-value blob store on SQLite. Each collection is a JSON array under its
/// own slot.
pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn schema_version(&self) -> Result<i32> {
        Ok(self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })?)
    }

    // ── Slots ─────────────────────────────────────────────────

    pub(crate) fn get_slot(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    #[cfg(test)]
    pub(crate) fn set_slot(&self, key: &str, value: &str) -> Result<()> {
        write_slot(&self.conn, key, value)
    }

    fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.get_slot(key)? {
            Some(json) => serde_json::from_str(&json)
                .with_context(|| format!("Failed to decode slot '{key}'")),
            None => Ok(Vec::new()),
        }
    }
}

impl Store for Database {
    fn load(&self) -> Result<Snapshot> {
        let snapshot = Snapshot {
            incomes: self.read_collection(INCOMES_SLOT)?,
            budgets: self.read_collection(BUDGETS_SLOT)?,
            expenses: self.read_collection(EXPENSES_SLOT)?,
        };
        tracing::debug!(
            incomes = snapshot.incomes.len(),
            budgets = snapshot.budgets.len(),
            expenses = snapshot.expenses.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        let incomes = encode(INCOMES_SLOT, &snapshot.incomes)?;
        let budgets = encode(BUDGETS_SLOT, &snapshot.budgets)?;
        let expenses = encode(EXPENSES_SLOT, &snapshot.expenses)?;

        let tx = self.conn.transaction()?;
        write_slot(&tx, INCOMES_SLOT, &incomes)?;
        write_slot(&tx, BUDGETS_SLOT, &budgets)?;
        write_slot(&tx, EXPENSES_SLOT, &expenses)?;
        tx.commit().context("Failed to commit snapshot")?;

        tracing::debug!("saved snapshot");
        Ok(())
    }
}

fn encode<T: Serialize>(key: &str, items: &[T]) -> Result<String> {
    serde_json::to_string(items).with_context(|| format!("Failed to encode slot '{key}'"))
}

fn write_slot(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
        params![key, value, chrono::Local::now().to_rfc3339()],
    )
    .with_context(|| format!("Failed to write slot '{key}'"))?;
    Ok(())
}

#[cfg(test)]
mod tests;
