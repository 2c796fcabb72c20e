//! CSV export of a budget's revenue and expense lines.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::db::{format_date, Database};
use crate::error::Error;

const HEADER: [&str; 9] = [
    "kind",
    "id",
    "label",
    "category",
    "amount",
    "status",
    "authorized_date",
    "payment_method",
    "notes",
];

/// Writes every line of `budget_id` to `path`. Returns the number of rows written.
pub(crate) fn export_budget(db: &Database, budget_id: i64, path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let count = write_budget(db, budget_id, file)?;
    tracing::info!(budget_id, count, path = %path.display(), "Exported budget lines");
    Ok(count)
}

pub(crate) fn write_budget<W: Write>(db: &Database, budget_id: i64, out: W) -> Result<usize> {
    db.get_budget(budget_id)?
        .ok_or_else(|| Error::not_found("Budget", budget_id))?;
    let revenue = db.get_revenue_lines(budget_id)?;
    let expenses = db.get_expense_lines(budget_id)?;

    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER)?;

    for line in &revenue {
        let id = line.id.unwrap_or(0).to_string();
        let amount = line.projected_amount.to_string();
        wtr.write_record([
            "revenue",
            id.as_str(),
            line.source_label.as_str(),
            "",
            amount.as_str(),
            "",
            "",
            "",
            "",
        ])?;
    }

    for line in &expenses {
        let id = line.id.unwrap_or(0).to_string();
        let amount = line.projected_amount.to_string();
        let authorized = line.authorized_date.map(format_date).unwrap_or_default();
        wtr.write_record([
            "expense",
            id.as_str(),
            line.description.as_str(),
            line.category.as_str(),
            amount.as_str(),
            line.status.as_str(),
            authorized.as_str(),
            line.payment_method.map(|m| m.as_str()).unwrap_or(""),
            line.notes.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(revenue.len() + expenses.len())
}
