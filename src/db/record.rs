//! Typed row mapping for each stored entity kind.
//!
//! Table and column names are fixed per type; callers only ever supply
//! values, which are always bound as parameters.

use chrono::NaiveDate;
use rusqlite::types::{ToSql, Type};
use rusqlite::Row;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::models::*;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) trait Record: Sized {
    /// Human-readable kind, used in `NotFound` errors.
    const KIND: &'static str;
    const TABLE: &'static str;
    const COLUMNS: &'static str;

    type Filter: Default;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn apply_filter(filter: &Self::Filter, clause: &mut WhereClause);
}

/// Accumulates `AND`-joined conditions with numbered parameters.
#[derive(Default)]
pub(crate) struct WhereClause {
    conditions: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl WhereClause {
    pub(crate) fn eq(&mut self, column: &'static str, value: impl ToSql + 'static) {
        self.params.push(Box::new(value));
        self.conditions
            .push(format!("{column} = ?{}", self.params.len()));
    }

    /// Case-insensitive substring match. `%` and `_` in `needle` match literally.
    pub(crate) fn contains(&mut self, column: &'static str, needle: &str) {
        let escaped = needle
            .to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        self.params.push(Box::new(format!("%{escaped}%")));
        self.conditions.push(format!(
            "LOWER(COALESCE({column}, '')) LIKE ?{} ESCAPE '\\'",
            self.params.len()
        ));
    }

    pub(crate) fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub(crate) fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    parse_date(&s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(s) if !s.is_empty() => parse_date(&s).map(Some).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        }),
        _ => Ok(None),
    }
}

fn amount_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    Ok(Decimal::from_str(&s).unwrap_or_default())
}

pub(crate) fn expense_status_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<ExpenseStatus> {
    let s: String = row.get(idx)?;
    ExpenseStatus::parse(&s).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown expense status '{s}'").into(),
        )
    })
}

// ── Events ────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub(crate) struct EventFilter {
    pub(crate) name_contains: Option<String>,
}

impl Record for Event {
    const KIND: &'static str = "Event";
    const TABLE: &'static str = "events";
    const COLUMNS: &'static str = "id, name";

    type Filter = EventFilter;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Event {
            id: Some(row.get(0)?),
            name: row.get(1)?,
        })
    }

    fn apply_filter(filter: &EventFilter, clause: &mut WhereClause) {
        if let Some(name) = &filter.name_contains {
            clause.contains("name", name);
        }
    }
}

// ── Budgets ───────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub(crate) struct BudgetFilter {
    pub(crate) event_contains: Option<String>,
    pub(crate) created_on: Option<NaiveDate>,
    pub(crate) status: Option<BudgetStatus>,
}

impl BudgetFilter {
    pub(crate) fn is_empty(&self) -> bool {
        self.event_contains.is_none() && self.created_on.is_none() && self.status.is_none()
    }
}

impl Record for Budget {
    const KIND: &'static str = "Budget";
    const TABLE: &'static str = "budgets";
    const COLUMNS: &'static str =
        "id, name, responsible, creation_date, description, linked_event_name, status";

    type Filter = BudgetFilter;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let status: String = row.get(6)?;
        Ok(Budget {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            responsible: row.get(2)?,
            creation_date: date_column(row, 3)?,
            description: row.get(4)?,
            linked_event_name: row.get(5)?,
            status: BudgetStatus::parse(&status).unwrap_or(BudgetStatus::Elaborating),
        })
    }

    fn apply_filter(filter: &BudgetFilter, clause: &mut WhereClause) {
        if let Some(event) = &filter.event_contains {
            clause.contains("linked_event_name", event);
        }
        if let Some(date) = filter.created_on {
            clause.eq("creation_date", format_date(date));
        }
        if let Some(status) = filter.status {
            clause.eq("status", status.as_str());
        }
    }
}

// ── Revenue lines ─────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub(crate) struct RevenueFilter {
    pub(crate) budget_id: Option<i64>,
}

impl Record for RevenueLine {
    const KIND: &'static str = "Revenue line";
    const TABLE: &'static str = "revenue_lines";
    const COLUMNS: &'static str = "id, budget_id, source_label, projected_amount";

    type Filter = RevenueFilter;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RevenueLine {
            id: Some(row.get(0)?),
            budget_id: row.get(1)?,
            source_label: row.get(2)?,
            projected_amount: amount_column(row, 3)?,
        })
    }

    fn apply_filter(filter: &RevenueFilter, clause: &mut WhereClause) {
        if let Some(id) = filter.budget_id {
            clause.eq("budget_id", id);
        }
    }
}

// ── Expense lines ─────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub(crate) struct ExpenseFilter {
    pub(crate) budget_id: Option<i64>,
    pub(crate) status: Option<ExpenseStatus>,
}

impl Record for ExpenseLine {
    const KIND: &'static str = "Expense line";
    const TABLE: &'static str = "expense_lines";
    const COLUMNS: &'static str = "id, budget_id, description, category, projected_amount, \
         status, authorized_date, payment_method, notes";

    type Filter = ExpenseFilter;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let category: String = row.get(3)?;
        let method: Option<String> = row.get(7)?;
        Ok(ExpenseLine {
            id: Some(row.get(0)?),
            budget_id: row.get(1)?,
            description: row.get(2)?,
            category: ExpenseCategory::parse(&category),
            projected_amount: amount_column(row, 4)?,
            status: expense_status_column(row, 5)?,
            authorized_date: optional_date_column(row, 6)?,
            payment_method: method.as_deref().map(PaymentMethod::parse),
            notes: row.get(8)?,
        })
    }

    fn apply_filter(filter: &ExpenseFilter, clause: &mut WhereClause) {
        if let Some(id) = filter.budget_id {
            clause.eq("budget_id", id);
        }
        if let Some(status) = filter.status {
            clause.eq("status", status.as_str());
        }
    }
}
