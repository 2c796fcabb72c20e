#![allow(clippy::unwrap_used)]

use super::*;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn budget_on(db: &Database, name: &str, event: Option<&str>, created: NaiveDate) -> i64 {
    let mut new = NewBudget::new(name.into(), "Ana".into()).with_event(event.map(String::from));
    new.creation_date = Some(created);
    db.insert_budget(&new).unwrap()
}

// ── Schema ────────────────────────────────────────────────────

#[test]
fn test_schema_version_recorded() {
    let db = Database::open_in_memory().unwrap();
    let version: i32 = db
        .conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, schema::CURRENT_VERSION);
}

#[test]
fn test_migrate_is_idempotent() {
    let mut db = Database::open_in_memory().unwrap();
    db.register_event("Jazz Night").unwrap();
    db.migrate().unwrap();
    db.migrate().unwrap();

    let rows: i64 = db
        .conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(db.get_events().unwrap().len(), 1);
}

#[test]
fn test_reopen_file_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("budgets.db");
    {
        let db = Database::open(&path).unwrap();
        db.register_event("Harvest Fair").unwrap();
    }
    let db = Database::open(&path).unwrap();
    let events = db.get_events().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "Harvest Fair");
}

// ── Events ────────────────────────────────────────────────────

#[test]
fn test_register_event() {
    let db = Database::open_in_memory().unwrap();
    let id = db.register_event("  Jazz Night ").unwrap();
    let event = db.get::<Event>(id).unwrap().unwrap();
    assert_eq!(event.name, "Jazz Night");
}

#[test]
fn test_duplicate_event_is_constraint_violation() {
    let db = Database::open_in_memory().unwrap();
    db.register_event("Jazz Night").unwrap();
    let err = db.register_event("Jazz Night").unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation(ref n) if n == "Jazz Night"));
    assert_eq!(db.get_events().unwrap().len(), 1);
}

#[test]
fn test_empty_event_name_rejected() {
    let db = Database::open_in_memory().unwrap();
    assert!(matches!(
        db.register_event("   "),
        Err(Error::InvalidInput { .. })
    ));
    assert!(db.get_events().unwrap().is_empty());
}

#[test]
fn test_events_in_insertion_order() {
    let db = Database::open_in_memory().unwrap();
    for name in ["Zine Fest", "Art Walk", "Mural Day"] {
        db.register_event(name).unwrap();
    }
    let names: Vec<String> = db.get_events().unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["Zine Fest", "Art Walk", "Mural Day"]);
}

#[test]
fn test_event_name_filter() {
    let db = Database::open_in_memory().unwrap();
    db.register_event("Summer Jazz").unwrap();
    db.register_event("Winter Folk").unwrap();
    let hits = db
        .read_all::<Event>(&EventFilter {
            name_contains: Some("JAZZ".into()),
        })
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Summer Jazz");
}

// ── Budgets ───────────────────────────────────────────────────

#[test]
fn test_budget_defaults() {
    let db = Database::open_in_memory().unwrap();
    let id = db
        .insert_budget(&NewBudget::new("Festival".into(), "Ana".into()))
        .unwrap();
    let budget = db.get_budget(id).unwrap().unwrap();
    assert_eq!(budget.status, BudgetStatus::Elaborating);
    assert_eq!(budget.creation_date, chrono::Local::now().date_naive());
    assert_eq!(budget.linked_event_name, None);
    assert_eq!(budget.event_label(), NO_LINKED_EVENT);
}

#[test]
fn test_budget_event_link_is_not_validated() {
    let db = Database::open_in_memory().unwrap();
    let id = budget_on(&db, "Orphan", Some("Never Registered"), date(2024, 3, 1));
    let budget = db.get_budget(id).unwrap().unwrap();
    assert_eq!(budget.event_label(), "Never Registered");
}

#[test]
fn test_update_budget_status() {
    let db = Database::open_in_memory().unwrap();
    let id = budget_on(&db, "Fair", None, date(2024, 3, 1));
    db.update_budget_status(id, BudgetStatus::Finalized).unwrap();
    assert_eq!(
        db.get_budget(id).unwrap().unwrap().status,
        BudgetStatus::Finalized
    );
}

#[test]
fn test_update_missing_budget_status_not_found() {
    let db = Database::open_in_memory().unwrap();
    assert!(matches!(
        db.update_budget_status(77, BudgetStatus::Cancelled),
        Err(Error::NotFound { kind: "Budget", id: 77 })
    ));
}

#[test]
fn test_budget_filters() {
    let db = Database::open_in_memory().unwrap();
    let jazz = budget_on(&db, "Stage", Some("Summer Jazz"), date(2024, 5, 1));
    let folk = budget_on(&db, "Tent", Some("Winter Folk"), date(2024, 5, 2));
    let none = budget_on(&db, "Misc", None, date(2024, 5, 1));
    db.update_budget_status(folk, BudgetStatus::Finalized).unwrap();

    let ids = |filter: BudgetFilter| -> Vec<i64> {
        db.get_budgets(&filter)
            .unwrap()
            .into_iter()
            .filter_map(|b| b.id)
            .collect()
    };

    assert_eq!(ids(BudgetFilter::default()), vec![jazz, folk, none]);
    assert_eq!(
        ids(BudgetFilter {
            event_contains: Some("jAzZ".into()),
            ..Default::default()
        }),
        vec![jazz]
    );
    assert_eq!(
        ids(BudgetFilter {
            created_on: Some(date(2024, 5, 1)),
            ..Default::default()
        }),
        vec![jazz, none]
    );
    assert_eq!(
        ids(BudgetFilter {
            status: Some(BudgetStatus::Finalized),
            ..Default::default()
        }),
        vec![folk]
    );
    assert_eq!(
        ids(BudgetFilter {
            event_contains: Some("folk".into()),
            created_on: Some(date(2024, 5, 1)),
            status: None,
        }),
        Vec::<i64>::new()
    );
}

#[test]
fn test_event_filter_matches_wildcards_literally() {
    let db = Database::open_in_memory().unwrap();
    budget_on(&db, "A", Some("100% Rock"), date(2024, 1, 1));
    budget_on(&db, "B", Some("1000 Rock"), date(2024, 1, 1));
    let hits = db
        .get_budgets(&BudgetFilter {
            event_contains: Some("0%".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "A");
}

#[test]
fn test_generic_delete_reports_missing() {
    let db = Database::open_in_memory().unwrap();
    let id = budget_on(&db, "Temp", None, date(2024, 1, 1));
    assert!(db.delete::<Budget>(id).unwrap());
    assert!(!db.delete::<Budget>(id).unwrap());
    assert!(db.get_budget(id).unwrap().is_none());
}

// ── Revenue lines ─────────────────────────────────────────────

#[test]
fn test_revenue_lines_per_budget() {
    let db = Database::open_in_memory().unwrap();
    let a = budget_on(&db, "A", None, date(2024, 1, 1));
    let b = budget_on(&db, "B", None, date(2024, 1, 1));
    db.insert_revenue_line(a, "Tickets", dec!(800)).unwrap();
    db.insert_revenue_line(a, "Sponsor", dec!(200)).unwrap();
    db.insert_revenue_line(b, "Grant", dec!(5000)).unwrap();

    let lines = db.get_revenue_lines(a).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].source_label, "Tickets");
    assert!(lines.iter().all(|l| l.budget_id == a));
}

#[test]
fn test_revenue_for_missing_budget_not_found() {
    let db = Database::open_in_memory().unwrap();
    assert!(matches!(
        db.insert_revenue_line(404, "Tickets", dec!(10)),
        Err(Error::NotFound { id: 404, .. })
    ));
}

#[test]
fn test_revenue_amount_validation() {
    let db = Database::open_in_memory().unwrap();
    let b = budget_on(&db, "A", None, date(2024, 1, 1));
    assert!(matches!(
        db.insert_revenue_line(b, "Refund", dec!(-0.01)),
        Err(Error::InvalidInput { field: "amount", .. })
    ));
    let id = db.insert_revenue_line(b, "Free", Decimal::ZERO).unwrap();
    let id2 = db.insert_revenue_line(b, "Odd", dec!(12.345)).unwrap();

    let line = db.get::<RevenueLine>(id).unwrap().unwrap();
    assert_eq!(line.projected_amount, Decimal::ZERO);
    let line = db.get::<RevenueLine>(id2).unwrap().unwrap();
    assert_eq!(line.projected_amount, dec!(12.35));
}

// ── Summary ───────────────────────────────────────────────────

#[test]
fn test_summary_of_missing_budget_not_found() {
    let db = Database::open_in_memory().unwrap();
    assert!(matches!(
        db.budget_summary(1),
        Err(Error::NotFound { kind: "Budget", .. })
    ));
}

#[test]
fn test_summary_empty_budget() {
    let db = Database::open_in_memory().unwrap();
    let b = budget_on(&db, "Empty", None, date(2024, 1, 1));
    let s = db.budget_summary(b).unwrap();
    assert_eq!(s.total_revenue, Decimal::ZERO);
    assert_eq!(s.total_expense, Decimal::ZERO);
    assert_eq!(s.margin_percent, Decimal::ZERO);
    assert!(!s.has_lines());
}

#[test]
fn test_summary_reads_do_not_write() {
    let db = Database::open_in_memory().unwrap();
    let b = budget_on(&db, "Fair", None, date(2024, 1, 1));
    db.insert_revenue_line(b, "Tickets", dec!(300)).unwrap();
    db.insert_expense_line(b, "Stage", ExpenseCategory::Materials, dec!(100))
        .unwrap();

    let lines_before = db.get_expense_lines(b).unwrap();
    let first = db.budget_summary(b).unwrap();
    let second = db.budget_summary(b).unwrap();
    assert_eq!(first, second);
    assert_eq!(db.get_expense_lines(b).unwrap(), lines_before);
    assert_eq!(first.balance, dec!(200));
}

#[test]
fn test_summary_isolated_between_budgets() {
    let db = Database::open_in_memory().unwrap();
    let a = budget_on(&db, "A", None, date(2024, 1, 1));
    let b = budget_on(&db, "B", None, date(2024, 1, 1));
    db.insert_revenue_line(a, "Tickets", dec!(100)).unwrap();
    db.insert_expense_line(b, "Chairs", ExpenseCategory::Materials, dec!(40))
        .unwrap();

    let sa = db.budget_summary(a).unwrap();
    assert_eq!(sa.total_expense, Decimal::ZERO);
    assert_eq!(sa.margin_percent, dec!(100));
    let sb = db.budget_summary(b).unwrap();
    assert_eq!(sb.total_revenue, Decimal::ZERO);
    assert_eq!(sb.balance, dec!(-40));
}

#[test]
fn test_amount_limit_is_enforced() {
    let db = Database::open_in_memory().unwrap();
    let b = budget_on(&db, "A", None, date(2024, 1, 1));
    assert_eq!(MAX_AMOUNT, dec!(1_000_000_000_000_000));

    db.insert_revenue_line(b, "Sponsor", MAX_AMOUNT).unwrap();
    assert!(matches!(
        db.insert_revenue_line(b, "Sponsor", MAX_AMOUNT + dec!(0.01)),
        Err(Error::InvalidInput { field: "amount", .. })
    ));
    assert!(matches!(
        db.insert_expense_line(b, "Stage", ExpenseCategory::Other, dec!(1_000_000_000_000_000_000)),
        Err(Error::InvalidInput { field: "amount", .. })
    ));
}

#[test]
fn test_summary_of_oversized_stored_lines_is_an_error() {
    let db = Database::open_in_memory().unwrap();
    let b = budget_on(&db, "A", None, date(2024, 1, 1));
    for _ in 0..2 {
        db.conn
            .execute(
                "INSERT INTO expense_lines (budget_id, description, projected_amount)
                 VALUES (?1, 'Big', '50000000000000000000000000000')",
                [b],
            )
            .unwrap();
    }

    assert!(matches!(
        db.budget_summary(b),
        Err(Error::InvalidInput { field: "amount", .. })
    ));
}
