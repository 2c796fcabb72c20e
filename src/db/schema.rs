pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS budgets (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    name               TEXT NOT NULL,
    responsible        TEXT NOT NULL DEFAULT '',
    creation_date      TEXT NOT NULL DEFAULT (date('now')),
    description        TEXT NOT NULL DEFAULT '',
    linked_event_name  TEXT,
    status             TEXT NOT NULL DEFAULT 'Elaborating'
);

CREATE TABLE IF NOT EXISTS revenue_lines (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    budget_id         INTEGER NOT NULL REFERENCES budgets(id),
    source_label      TEXT NOT NULL,
    projected_amount  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS expense_lines (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    budget_id         INTEGER NOT NULL REFERENCES budgets(id),
    description       TEXT NOT NULL,
    category          TEXT NOT NULL DEFAULT 'Other',
    projected_amount  TEXT NOT NULL,
    status            TEXT NOT NULL DEFAULT 'Pending',
    authorized_date   TEXT,
    payment_method    TEXT,
    notes             TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_revenue_lines_budget ON revenue_lines(budget_id);
CREATE INDEX IF NOT EXISTS idx_expense_lines_budget ON expense_lines(budget_id);
CREATE INDEX IF NOT EXISTS idx_budgets_status ON budgets(status);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];
