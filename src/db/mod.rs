mod expenses;
mod record;
mod schema;

use rusqlite::{params, Connection, ErrorCode};
use rust_decimal::Decimal;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::*;
use crate::summary::{round_money, BudgetSummary};

pub(crate) use record::{
    format_date, parse_date, BudgetFilter, EventFilter, Record, RevenueFilter,
};
use record::WhereClause;

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mut db = Self { conn };
        db.migrate()?;
        info!(path = %path.display(), "Opened budget database");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
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
            debug!(version = schema::CURRENT_VERSION, "Initialized schema");
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                debug!(from_version, "Applying migration");
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

    // ── Generic reads ─────────────────────────────────────────

    /// All records of one kind matching `filter`, in insertion order.
    pub(crate) fn read_all<T: Record>(&self, filter: &T::Filter) -> Result<Vec<T>> {
        read_all_on(&self.conn, filter)
    }

    pub(crate) fn get<T: Record>(&self, id: i64) -> Result<Option<T>> {
        get_on(&self.conn, id)
    }

    /// Removes a record if it exists. Missing ids are not an error; the return
    /// value says whether anything was deleted. The application itself only
    /// deletes through the expense workflow.
    #[cfg(test)]
    pub(crate) fn delete<T: Record>(&self, id: i64) -> Result<bool> {
        delete_on::<T>(&self.conn, id)
    }

    // ── Events ────────────────────────────────────────────────

    pub(crate) fn register_event(&self, name: &str) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("event name", "must not be empty"));
        }

        match self
            .conn
            .execute("INSERT INTO events (name) VALUES (?1)", params![name])
        {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                info!(id, event = name, "Registered event");
                Ok(id)
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(Error::ConstraintViolation(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn get_events(&self) -> Result<Vec<Event>> {
        self.read_all::<Event>(&EventFilter::default())
    }

    // ── Budgets ───────────────────────────────────────────────

    pub(crate) fn insert_budget(&self, budget: &NewBudget) -> Result<i64> {
        let creation_date = budget
            .creation_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        self.conn.execute(
            "INSERT INTO budgets (name, responsible, creation_date, description, linked_event_name, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                budget.name,
                budget.responsible,
                format_date(creation_date),
                budget.description,
                budget.linked_event_name,
                BudgetStatus::Elaborating.as_str(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(id, budget = %budget.name, "Created budget");
        Ok(id)
    }

    pub(crate) fn get_budget(&self, id: i64) -> Result<Option<Budget>> {
        self.get::<Budget>(id)
    }

    pub(crate) fn get_budgets(&self, filter: &BudgetFilter) -> Result<Vec<Budget>> {
        self.read_all::<Budget>(filter)
    }

    pub(crate) fn update_budget_status(&self, id: i64, status: BudgetStatus) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE budgets SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if updated == 0 {
            return Err(Error::not_found(Budget::KIND, id));
        }
        info!(id, status = %status, "Updated budget status");
        Ok(())
    }

    // ── Revenue lines ─────────────────────────────────────────

    pub(crate) fn insert_revenue_line(
        &self,
        budget_id: i64,
        source_label: &str,
        amount: Decimal,
    ) -> Result<i64> {
        let amount = validate_amount(amount)?;
        ensure_budget_exists(&self.conn, budget_id)?;
        self.conn.execute(
            "INSERT INTO revenue_lines (budget_id, source_label, projected_amount)
             VALUES (?1, ?2, ?3)",
            params![budget_id, source_label, amount.to_string()],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(id, budget_id, %amount, "Added revenue line");
        Ok(id)
    }

    pub(crate) fn get_revenue_lines(&self, budget_id: i64) -> Result<Vec<RevenueLine>> {
        self.read_all::<RevenueLine>(&RevenueFilter {
            budget_id: Some(budget_id),
        })
    }

    // ── Summary ───────────────────────────────────────────────

    /// Totals computed from the lines currently stored for `budget_id`.
    pub(crate) fn budget_summary(&self, budget_id: i64) -> Result<BudgetSummary> {
        ensure_budget_exists(&self.conn, budget_id)?;
        let revenue = self.get_revenue_lines(budget_id)?;
        let expenses = self.get_expense_lines(budget_id)?;
        BudgetSummary::compute(&revenue, &expenses)
    }
}

fn read_all_on<T: Record>(conn: &Connection, filter: &T::Filter) -> Result<Vec<T>> {
    let mut clause = WhereClause::default();
    T::apply_filter(filter, &mut clause);
    let sql = format!(
        "SELECT {} FROM {}{} ORDER BY id",
        T::COLUMNS,
        T::TABLE,
        clause.sql()
    );
    let params_ref = clause.params();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_ref.as_slice(), T::from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn get_on<T: Record>(conn: &Connection, id: i64) -> Result<Option<T>> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?1", T::COLUMNS, T::TABLE);
    match conn.query_row(&sql, params![id], T::from_row) {
        Ok(r) => Ok(Some(r)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn delete_on<T: Record>(conn: &Connection, id: i64) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", T::TABLE);
    let removed = conn.execute(&sql, params![id])?;
    Ok(removed > 0)
}

fn ensure_budget_exists(conn: &Connection, budget_id: i64) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM budgets WHERE id = ?1)",
        params![budget_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(Error::not_found(Budget::KIND, budget_id))
    }
}

/// Largest projected amount a single line may carry (10^15). Budget totals and
/// margins over any realistic number of capped lines stay within `Decimal`.
pub(crate) const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Projected amounts are non-negative, at most [`MAX_AMOUNT`], and kept to cents.
pub(crate) fn validate_amount(amount: Decimal) -> Result<Decimal> {
    if amount < Decimal::ZERO {
        return Err(Error::invalid_input(
            "amount",
            format!("{amount} is negative"),
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(Error::invalid_input(
            "amount",
            format!("{amount} exceeds the limit of {MAX_AMOUNT}"),
        ));
    }
    Ok(round_money(amount))
}

#[cfg(test)]
mod tests;
