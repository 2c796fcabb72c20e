#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;

// ── ExpenseCategory ───────────────────────────────────────────

#[test]
fn test_category_parse() {
    assert_eq!(ExpenseCategory::parse("staff"), ExpenseCategory::Staff);
    assert_eq!(ExpenseCategory::parse("STAFF"), ExpenseCategory::Staff);
    assert_eq!(ExpenseCategory::parse("team"), ExpenseCategory::Staff);
    assert_eq!(ExpenseCategory::parse("Materials"), ExpenseCategory::Materials);
    assert_eq!(ExpenseCategory::parse("travel"), ExpenseCategory::Travel);
    assert_eq!(ExpenseCategory::parse("catering"), ExpenseCategory::Other);
}

#[test]
fn test_category_roundtrip() {
    for c in ExpenseCategory::all() {
        assert_eq!(ExpenseCategory::parse(c.as_str()), *c, "Roundtrip failed for {c}");
    }
}

// ── ExpenseStatus ─────────────────────────────────────────────

#[test]
fn test_expense_status_parse() {
    assert_eq!(ExpenseStatus::parse("pending"), Some(ExpenseStatus::Pending));
    assert_eq!(ExpenseStatus::parse("Approved"), Some(ExpenseStatus::Approved));
    assert_eq!(ExpenseStatus::parse("canceled"), Some(ExpenseStatus::Cancelled));
    assert_eq!(ExpenseStatus::parse("POSTED"), Some(ExpenseStatus::Posted));
    assert_eq!(ExpenseStatus::parse("paid"), None);
}

#[test]
fn test_expense_status_roundtrip() {
    for s in ExpenseStatus::all() {
        assert_eq!(ExpenseStatus::parse(s.as_str()), Some(*s));
    }
}

#[test]
fn test_terminal_statuses() {
    assert!(!ExpenseStatus::Pending.is_terminal());
    assert!(!ExpenseStatus::Approved.is_terminal());
    assert!(ExpenseStatus::Cancelled.is_terminal());
    assert!(ExpenseStatus::Posted.is_terminal());
}

// ── PaymentMethod ─────────────────────────────────────────────

#[test]
fn test_payment_method_pix_display() {
    assert_eq!(PaymentMethod::parse("PIX"), PaymentMethod::Pix);
    assert_eq!(PaymentMethod::parse("pix"), PaymentMethod::Pix);
    assert_eq!(format!("{}", PaymentMethod::Pix), "PIX");
}

#[test]
fn test_payment_method_roundtrip() {
    for m in PaymentMethod::all() {
        assert_eq!(PaymentMethod::parse(m.as_str()), *m);
    }
    assert_eq!(PaymentMethod::parse("barter"), PaymentMethod::Other);
}

// ── BudgetStatus ──────────────────────────────────────────────

#[test]
fn test_budget_status_parse() {
    assert_eq!(BudgetStatus::parse("elaborating"), Some(BudgetStatus::Elaborating));
    assert_eq!(BudgetStatus::parse("Finalized"), Some(BudgetStatus::Finalized));
    assert_eq!(BudgetStatus::parse("canceled"), Some(BudgetStatus::Cancelled));
    assert_eq!(BudgetStatus::parse("archived"), None);
    for s in BudgetStatus::all() {
        assert_eq!(BudgetStatus::parse(s.as_str()), Some(*s));
    }
}

// ── NewBudget ─────────────────────────────────────────────────

#[test]
fn test_new_budget_defaults() {
    let nb = NewBudget::new("Festival".into(), "Ana".into());
    assert_eq!(nb.name, "Festival");
    assert!(nb.linked_event_name.is_none());
    assert!(nb.creation_date.is_none());
    assert!(nb.description.is_empty());
}

#[test]
fn test_new_budget_event_sentinel_is_none() {
    let nb = NewBudget::new("A".into(), "B".into()).with_event(Some(NO_LINKED_EVENT.into()));
    assert!(nb.linked_event_name.is_none());
    let nb = NewBudget::new("A".into(), "B".into()).with_event(Some("  ".into()));
    assert!(nb.linked_event_name.is_none());
    let nb = NewBudget::new("A".into(), "B".into()).with_event(Some(" Jazz Night ".into()));
    assert_eq!(nb.linked_event_name.as_deref(), Some("Jazz Night"));
}

#[test]
fn test_budget_event_label() {
    let budget = Budget {
        id: Some(1),
        name: "B".into(),
        responsible: "R".into(),
        creation_date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        description: String::new(),
        linked_event_name: None,
        status: BudgetStatus::Elaborating,
    };
    assert_eq!(budget.event_label(), NO_LINKED_EVENT);
}

// ── ExpenseLine / Event ───────────────────────────────────────

#[test]
fn test_expense_line_starts_pending() {
    let line = ExpenseLine::new(1, "Venue".into(), ExpenseCategory::Materials, dec!(400.00));
    assert!(line.id.is_none());
    assert_eq!(line.status, ExpenseStatus::Pending);
    assert!(line.authorized_date.is_none());
    assert!(line.payment_method.is_none());
    assert!(line.notes.is_empty());
}

#[test]
fn test_event_find_by_name() {
    let events = vec![Event::new("Jazz Night".into()), Event::new("Book Fair".into())];
    assert!(Event::find_by_name(&events, "jazz night").is_some());
    assert!(Event::find_by_name(&events, "Opera").is_none());
}
