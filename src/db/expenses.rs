//! Expense lines and the approval workflow applied to them.
//!
//! Every workflow operation re-reads the expense status inside a
//! `BEGIN IMMEDIATE` transaction before writing, so when two connections race
//! on the same expense the second one sees the first one's result and is
//! rejected with `InvalidState`.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use tracing::info;

use super::record::{expense_status_column, format_date, ExpenseFilter, Record};
use super::{delete_on, ensure_budget_exists, get_on, validate_amount, Database};
use crate::error::{Error, Result};
use crate::models::{ExpenseCategory, ExpenseLine, ExpenseStatus, PaymentMethod};
use crate::workflow::{self, ApprovalGate, ExpenseAction, Outcome};

impl Database {
    /// New expenses always start out `Pending`.
    pub(crate) fn insert_expense_line(
        &self,
        budget_id: i64,
        description: &str,
        category: ExpenseCategory,
        amount: Decimal,
    ) -> Result<i64> {
        let amount = validate_amount(amount)?;
        ensure_budget_exists(&self.conn, budget_id)?;
        self.conn.execute(
            "INSERT INTO expense_lines (budget_id, description, category, projected_amount, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                budget_id,
                description,
                category.as_str(),
                amount.to_string(),
                ExpenseStatus::Pending.as_str(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(id, budget_id, %amount, category = %category, "Added expense line");
        Ok(id)
    }

    pub(crate) fn get_expense_lines(&self, budget_id: i64) -> Result<Vec<ExpenseLine>> {
        self.read_all::<ExpenseLine>(&ExpenseFilter {
            budget_id: Some(budget_id),
            status: None,
        })
    }

    pub(crate) fn get_expense_line(&self, id: i64) -> Result<Option<ExpenseLine>> {
        get_on(&self.conn, id)
    }

    // ── Workflow ──────────────────────────────────────────────

    pub(crate) fn edit_expense_line(
        &mut self,
        id: i64,
        description: &str,
        category: ExpenseCategory,
        amount: Decimal,
    ) -> Result<()> {
        let amount = validate_amount(amount)?;
        self.apply_transition(id, ExpenseAction::Edit, |tx, _| {
            tx.execute(
                "UPDATE expense_lines SET description = ?1, category = ?2, projected_amount = ?3
                 WHERE id = ?4",
                params![description, category.as_str(), amount.to_string(), id],
            )?;
            Ok(())
        })
    }

    /// Unlike `Database::delete`, a missing id is reported as `NotFound`.
    pub(crate) fn delete_expense_line(&mut self, id: i64) -> Result<()> {
        self.apply_transition(id, ExpenseAction::Delete, |tx, _| {
            delete_on::<ExpenseLine>(tx, id)?;
            Ok(())
        })
    }

    pub(crate) fn cancel_expense_line(&mut self, id: i64) -> Result<()> {
        self.apply_transition(id, ExpenseAction::Cancel, |tx, outcome| {
            write_status(tx, id, outcome)
        })
    }

    /// The secret is checked before the expense is even looked up; a wrong
    /// secret leaves every field untouched.
    pub(crate) fn approve_expense_line(
        &mut self,
        id: i64,
        gate: &ApprovalGate,
        secret: &str,
        authorized_date: NaiveDate,
        payment_method: PaymentMethod,
    ) -> Result<()> {
        gate.check(secret)?;
        self.apply_transition(id, ExpenseAction::Approve, |tx, outcome| {
            tx.execute(
                "UPDATE expense_lines SET authorized_date = ?1, payment_method = ?2 WHERE id = ?3",
                params![format_date(authorized_date), payment_method.as_str(), id],
            )?;
            write_status(tx, id, outcome)
        })
    }

    pub(crate) fn set_expense_notes(&mut self, id: i64, notes: &str) -> Result<()> {
        self.apply_transition(id, ExpenseAction::SetNotes, |tx, _| {
            tx.execute(
                "UPDATE expense_lines SET notes = ?1 WHERE id = ?2",
                params![notes, id],
            )?;
            Ok(())
        })
    }

    pub(crate) fn post_expense_line(&mut self, id: i64) -> Result<()> {
        self.apply_transition(id, ExpenseAction::Post, |tx, outcome| {
            write_status(tx, id, outcome)
        })
    }

    fn apply_transition<F>(&mut self, id: i64, action: ExpenseAction, apply: F) -> Result<()>
    where
        F: FnOnce(&Transaction<'_>, Outcome) -> Result<()>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let status = current_status(&tx, id)?
            .ok_or_else(|| Error::not_found(ExpenseLine::KIND, id))?;
        let outcome = workflow::transition(status, action)
            .ok_or_else(|| Error::InvalidState { id, status, action })?;

        apply(&tx, outcome)?;
        tx.commit()?;

        match outcome {
            Outcome::Status(to) => info!(id, %action, from = %status, to = %to, "Expense updated"),
            Outcome::Removed => info!(id, %action, from = %status, "Expense removed"),
        }
        Ok(())
    }
}

fn current_status(conn: &Connection, id: i64) -> Result<Option<ExpenseStatus>> {
    match conn.query_row(
        "SELECT status FROM expense_lines WHERE id = ?1",
        params![id],
        |row| expense_status_column(row, 0),
    ) {
        Ok(s) => Ok(Some(s)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_status(conn: &Connection, id: i64, outcome: Outcome) -> Result<()> {
    if let Outcome::Status(status) = outcome {
        conn.execute(
            "UPDATE expense_lines SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "expenses_tests.rs"]
mod expenses_tests;
