#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::models::NewBudget;
use crate::workflow::transition;

const SECRET: &str = "correct horse";

fn gate() -> ApprovalGate {
    ApprovalGate::new(Some(SECRET.into()))
}

fn may_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn setup() -> (Database, i64) {
    let db = Database::open_in_memory().unwrap();
    let budget_id = db
        .insert_budget(&NewBudget::new("Festival".into(), "Ana".into()))
        .unwrap();
    (db, budget_id)
}

fn add_venue(db: &Database, budget_id: i64) -> i64 {
    db.insert_expense_line(budget_id, "Venue", ExpenseCategory::Materials, dec!(400.00))
        .unwrap()
}

fn status_of(db: &Database, id: i64) -> ExpenseStatus {
    db.get_expense_line(id).unwrap().unwrap().status
}

// ── Creation ──────────────────────────────────────────────────

#[test]
fn test_new_expense_is_pending() {
    let (db, b) = setup();
    let id = add_venue(&db, b);
    let line = db.get_expense_line(id).unwrap().unwrap();
    assert_eq!(line.status, ExpenseStatus::Pending);
    assert_eq!(line.category, ExpenseCategory::Materials);
    assert_eq!(line.projected_amount, dec!(400.00));
    assert!(line.authorized_date.is_none());
    assert!(line.payment_method.is_none());
}

#[test]
fn test_expense_for_missing_budget_is_not_found() {
    let (db, _) = setup();
    let err = db
        .insert_expense_line(999, "Ghost", ExpenseCategory::Other, dec!(1))
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { id: 999, .. }));
    assert!(db.get_expense_lines(999).unwrap().is_empty());
}

#[test]
fn test_negative_expense_rejected() {
    let (db, b) = setup();
    let err = db
        .insert_expense_line(b, "Refund?", ExpenseCategory::Other, dec!(-5))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { field: "amount", .. }));
    assert!(db.get_expense_lines(b).unwrap().is_empty());
}

#[test]
fn test_amount_rounded_to_cents_on_insert() {
    let (db, b) = setup();
    let id = db
        .insert_expense_line(b, "Paint", ExpenseCategory::Materials, dec!(10.005))
        .unwrap();
    assert_eq!(
        db.get_expense_line(id).unwrap().unwrap().projected_amount,
        dec!(10.01)
    );
}

// ── Full lifecycle ────────────────────────────────────────────

#[test]
fn test_venue_scenario_end_to_end() {
    let (mut db, b) = setup();
    db.insert_revenue_line(b, "Sponsor", dec!(1000.00)).unwrap();
    let id = add_venue(&db, b);
    assert_eq!(status_of(&db, id), ExpenseStatus::Pending);

    db.approve_expense_line(id, &gate(), SECRET, may_first(), PaymentMethod::Pix)
        .unwrap();
    let line = db.get_expense_line(id).unwrap().unwrap();
    assert_eq!(line.status, ExpenseStatus::Approved);
    assert_eq!(line.authorized_date, Some(may_first()));
    assert_eq!(line.payment_method, Some(PaymentMethod::Pix));

    db.post_expense_line(id).unwrap();
    assert_eq!(status_of(&db, id), ExpenseStatus::Posted);

    let s = db.budget_summary(b).unwrap();
    assert_eq!(s.total_revenue, dec!(1000.00));
    assert_eq!(s.total_expense, dec!(400.00));
    assert_eq!(s.balance, dec!(600.00));
    assert_eq!(s.margin_percent, dec!(60.00));
}

#[test]
fn test_cancelled_expense_still_in_totals() {
    let (mut db, b) = setup();
    db.insert_revenue_line(b, "Sponsor", dec!(1000.00)).unwrap();
    let venue = add_venue(&db, b);
    let snacks = db
        .insert_expense_line(b, "Snacks", ExpenseCategory::Other, dec!(50.00))
        .unwrap();

    db.cancel_expense_line(snacks).unwrap();
    assert_eq!(status_of(&db, snacks), ExpenseStatus::Cancelled);
    assert_eq!(status_of(&db, venue), ExpenseStatus::Pending);

    let s = db.budget_summary(b).unwrap();
    assert_eq!(s.total_expense, dec!(450.00));
}

#[test]
fn test_wrong_secret_then_correct_secret() {
    let (mut db, b) = setup();
    let id = add_venue(&db, b);

    let err = db
        .approve_expense_line(id, &gate(), "guess", may_first(), PaymentMethod::Pix)
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized));

    let line = db.get_expense_line(id).unwrap().unwrap();
    assert_eq!(line.status, ExpenseStatus::Pending);
    assert!(line.authorized_date.is_none());
    assert!(line.payment_method.is_none());

    db.approve_expense_line(id, &gate(), SECRET, may_first(), PaymentMethod::Invoiced)
        .unwrap();
    let line = db.get_expense_line(id).unwrap().unwrap();
    assert_eq!(line.status, ExpenseStatus::Approved);
    assert_eq!(line.payment_method, Some(PaymentMethod::Invoiced));
}

#[test]
fn test_unconfigured_secret_blocks_approval() {
    let (mut db, b) = setup();
    let id = add_venue(&db, b);
    let err = db
        .approve_expense_line(
            id,
            &ApprovalGate::new(None),
            "",
            may_first(),
            PaymentMethod::Pix,
        )
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(status_of(&db, id), ExpenseStatus::Pending);
}

// ── Guards ────────────────────────────────────────────────────

#[test]
fn test_edit_pending_overwrites_fields() {
    let (mut db, b) = setup();
    let id = add_venue(&db, b);
    db.edit_expense_line(id, "Bigger venue", ExpenseCategory::Other, dec!(550))
        .unwrap();
    let line = db.get_expense_line(id).unwrap().unwrap();
    assert_eq!(line.description, "Bigger venue");
    assert_eq!(line.category, ExpenseCategory::Other);
    assert_eq!(line.projected_amount, dec!(550));
    assert_eq!(line.status, ExpenseStatus::Pending);
}

#[test]
fn test_edit_approved_is_invalid_state() {
    let (mut db, b) = setup();
    let id = add_venue(&db, b);
    db.approve_expense_line(id, &gate(), SECRET, may_first(), PaymentMethod::Pix)
        .unwrap();

    let err = db
        .edit_expense_line(id, "Sneaky", ExpenseCategory::Travel, dec!(1))
        .unwrap_err();
    match err {
        Error::InvalidState { id: eid, status, action } => {
            assert_eq!(eid, id);
            assert_eq!(status, ExpenseStatus::Approved);
            assert_eq!(action, ExpenseAction::Edit);
        }
        other => panic!("expected InvalidState, got {other:?}"),
    }
    let line = db.get_expense_line(id).unwrap().unwrap();
    assert_eq!(line.description, "Venue");
    assert_eq!(line.projected_amount, dec!(400.00));
}

#[test]
fn test_notes_only_while_approved() {
    let (mut db, b) = setup();
    let id = add_venue(&db, b);

    assert!(matches!(
        db.set_expense_notes(id, "too early"),
        Err(Error::InvalidState { .. })
    ));

    db.approve_expense_line(id, &gate(), SECRET, may_first(), PaymentMethod::Pix)
        .unwrap();
    db.set_expense_notes(id, "paid half up front").unwrap();
    db.set_expense_notes(id, "paid in full").unwrap();
    assert_eq!(
        db.get_expense_line(id).unwrap().unwrap().notes,
        "paid in full"
    );

    db.post_expense_line(id).unwrap();
    assert!(matches!(
        db.set_expense_notes(id, "too late"),
        Err(Error::InvalidState { .. })
    ));
}

#[test]
fn test_post_requires_approval() {
    let (mut db, b) = setup();
    let id = add_venue(&db, b);
    assert!(matches!(
        db.post_expense_line(id),
        Err(Error::InvalidState {
            status: ExpenseStatus::Pending,
            ..
        })
    ));
    assert_eq!(status_of(&db, id), ExpenseStatus::Pending);
}

#[test]
fn test_cancelled_accepts_nothing() {
    let (mut db, b) = setup();
    let id = add_venue(&db, b);
    db.cancel_expense_line(id).unwrap();

    assert!(db.cancel_expense_line(id).is_err());
    assert!(db.delete_expense_line(id).is_err());
    assert!(db
        .edit_expense_line(id, "x", ExpenseCategory::Other, dec!(1))
        .is_err());
    assert!(db
        .approve_expense_line(id, &gate(), SECRET, may_first(), PaymentMethod::Pix)
        .is_err());
    assert!(db.post_expense_line(id).is_err());
    assert_eq!(status_of(&db, id), ExpenseStatus::Cancelled);
}

#[test]
fn test_approve_twice_is_invalid_state() {
    let (mut db, b) = setup();
    let id = add_venue(&db, b);
    db.approve_expense_line(id, &gate(), SECRET, may_first(), PaymentMethod::Pix)
        .unwrap();
    let later = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    assert!(matches!(
        db.approve_expense_line(id, &gate(), SECRET, later, PaymentMethod::Other),
        Err(Error::InvalidState { .. })
    ));
    let line = db.get_expense_line(id).unwrap().unwrap();
    assert_eq!(line.authorized_date, Some(may_first()));
    assert_eq!(line.payment_method, Some(PaymentMethod::Pix));
}

// ── Delete ────────────────────────────────────────────────────

#[test]
fn test_delete_pending_removes_record() {
    let (mut db, b) = setup();
    let id = add_venue(&db, b);
    db.delete_expense_line(id).unwrap();
    assert!(db.get_expense_line(id).unwrap().is_none());
    assert!(db.get_expense_lines(b).unwrap().is_empty());
}

#[test]
fn test_delete_missing_expense_is_not_found() {
    let (mut db, b) = setup();
    let keep = add_venue(&db, b);
    let before = db.get_expense_lines(b).unwrap();

    let err = db.delete_expense_line(424242).unwrap_err();
    assert!(matches!(err, Error::NotFound { id: 424242, .. }));

    assert_eq!(db.get_expense_lines(b).unwrap(), before);
    assert_eq!(status_of(&db, keep), ExpenseStatus::Pending);
}

#[test]
fn test_delete_approved_is_invalid_state() {
    let (mut db, b) = setup();
    let id = add_venue(&db, b);
    db.approve_expense_line(id, &gate(), SECRET, may_first(), PaymentMethod::Pix)
        .unwrap();
    assert!(matches!(
        db.delete_expense_line(id),
        Err(Error::InvalidState { .. })
    ));
    assert!(db.get_expense_line(id).unwrap().is_some());
}

#[test]
fn test_operations_on_missing_id_are_not_found() {
    let (mut db, _) = setup();
    assert!(matches!(db.cancel_expense_line(7), Err(Error::NotFound { .. })));
    assert!(matches!(db.post_expense_line(7), Err(Error::NotFound { .. })));
    assert!(matches!(
        db.set_expense_notes(7, "n"),
        Err(Error::NotFound { .. })
    ));
    assert!(matches!(
        db.edit_expense_line(7, "d", ExpenseCategory::Staff, dec!(1)),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn test_expense_filter_by_status() {
    let (mut db, b) = setup();
    let a = add_venue(&db, b);
    let c = add_venue(&db, b);
    db.cancel_expense_line(c).unwrap();

    let pending = db
        .read_all::<ExpenseLine>(&ExpenseFilter {
            budget_id: Some(b),
            status: Some(ExpenseStatus::Pending),
        })
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, Some(a));
}

// ── Concurrency ───────────────────────────────────────────────

#[test]
fn test_concurrent_approvals_first_commit_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");

    let mut first = Database::open(&path).unwrap();
    let mut second = Database::open(&path).unwrap();
    let budget_id = first
        .insert_budget(&NewBudget::new("Race".into(), "R".into()))
        .unwrap();
    let id = add_venue(&first, budget_id);

    let barrier = std::sync::Barrier::new(2);
    let gate = gate();
    let (r1, r2) = std::thread::scope(|s| {
        let h1 = s.spawn(|| {
            barrier.wait();
            first.approve_expense_line(id, &gate, SECRET, may_first(), PaymentMethod::Pix)
        });
        let h2 = s.spawn(|| {
            barrier.wait();
            second.approve_expense_line(id, &gate, SECRET, may_first(), PaymentMethod::Other)
        });
        (h1.join().unwrap(), h2.join().unwrap())
    });

    let outcomes = [r1, r2];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|r| matches!(
        r,
        Err(Error::InvalidState {
            status: ExpenseStatus::Approved,
            action: ExpenseAction::Approve,
            ..
        })
    )));

    let reader = Database::open(&path).unwrap();
    assert_eq!(status_of(&reader, id), ExpenseStatus::Approved);
}

#[test]
fn test_stale_handle_cannot_post_cancelled_expense() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stale.db");

    let mut a = Database::open(&path).unwrap();
    let mut b = Database::open(&path).unwrap();
    let budget_id = a
        .insert_budget(&NewBudget::new("Stale".into(), "S".into()))
        .unwrap();
    let id = add_venue(&a, budget_id);

    // Both handles see a Pending expense...
    assert_eq!(status_of(&b, id), ExpenseStatus::Pending);
    a.cancel_expense_line(id).unwrap();
    // ...but b's approval is checked against the committed state.
    assert!(matches!(
        b.approve_expense_line(id, &gate(), SECRET, may_first(), PaymentMethod::Pix),
        Err(Error::InvalidState {
            status: ExpenseStatus::Cancelled,
            ..
        })
    ));
    assert_eq!(status_of(&a, id), ExpenseStatus::Cancelled);
}

// ── Random operation sequences ────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Edit(i64),
    Delete,
    Cancel,
    Approve { right_secret: bool },
    Notes,
    Post,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0i64..100_000).prop_map(Op::Edit),
        Just(Op::Delete),
        Just(Op::Cancel),
        any::<bool>().prop_map(|right_secret| Op::Approve { right_secret }),
        Just(Op::Notes),
        Just(Op::Post),
    ]
}

impl Op {
    fn action(&self) -> ExpenseAction {
        match self {
            Op::Edit(_) => ExpenseAction::Edit,
            Op::Delete => ExpenseAction::Delete,
            Op::Cancel => ExpenseAction::Cancel,
            Op::Approve { .. } => ExpenseAction::Approve,
            Op::Notes => ExpenseAction::SetNotes,
            Op::Post => ExpenseAction::Post,
        }
    }

    fn run(&self, db: &mut Database, id: i64) -> crate::error::Result<()> {
        match self {
            Op::Edit(cents) => db.edit_expense_line(
                id,
                "edited",
                ExpenseCategory::Staff,
                Decimal::new(*cents, 2),
            ),
            Op::Delete => db.delete_expense_line(id),
            Op::Cancel => db.cancel_expense_line(id),
            Op::Approve { right_secret } => {
                let secret = if *right_secret { SECRET } else { "nope" };
                db.approve_expense_line(id, &gate(), secret, may_first(), PaymentMethod::Pix)
            }
            Op::Notes => db.set_expense_notes(id, "note"),
            Op::Post => db.post_expense_line(id),
        }
    }
}

#[test]
fn test_wrong_secret_on_deleted_line_is_unauthorized() {
    let (mut db, b) = setup();
    let id = add_venue(&db, b);
    db.delete_expense_line(id).unwrap();

    let err = db
        .approve_expense_line(id, &gate(), "guess", may_first(), PaymentMethod::Pix)
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
    let err = db
        .approve_expense_line(id, &gate(), SECRET, may_first(), PaymentMethod::Pix)
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever the caller tries, the stored status only ever follows an
    /// edge of the transition table.
    #[test]
    fn prop_status_follows_transition_table(ops in prop::collection::vec(arb_op(), 1..20)) {
        let (mut db, b) = setup();
        let id = add_venue(&db, b);
        let mut expected: Option<ExpenseStatus> = Some(ExpenseStatus::Pending);

        for op in &ops {
            let before = db.get_expense_line(id).unwrap();
            let result = op.run(&mut db, id);
            let after = db.get_expense_line(id).unwrap();

            match expected {
                None => {
                    // The secret is checked before the line is looked up.
                    if matches!(op, Op::Approve { right_secret: false }) {
                        prop_assert!(
                            matches!(result, Err(Error::Unauthorized)),
                            "expected Unauthorized for a removed line, got {:?}",
                            result
                        );
                    } else {
                        prop_assert!(
                            matches!(result, Err(Error::NotFound { .. })),
                            "expected NotFound for a removed line, got {:?}",
                            result
                        );
                    }
                }
                Some(status) => {
                    let allowed = transition(status, op.action());
                    let rejected_secret = matches!(op, Op::Approve { right_secret: false });
                    if rejected_secret {
                        prop_assert!(
                            matches!(result, Err(Error::Unauthorized)),
                            "expected Unauthorized, got {:?}",
                            result
                        );
                    } else if allowed.is_none() {
                        prop_assert!(
                            matches!(result, Err(Error::InvalidState { .. })),
                            "expected InvalidState, got {:?}",
                            result
                        );
                    } else {
                        prop_assert!(result.is_ok(), "{:?} from {} failed: {:?}", op, status, result);
                    }

                    if result.is_ok() {
                        expected = match allowed {
                            Some(Outcome::Status(next)) => Some(next),
                            Some(Outcome::Removed) | None => None,
                        };
                    } else {
                        // Rejected operations leave the row exactly as it was.
                        prop_assert_eq!(&before, &after);
                    }
                }
            }

            prop_assert_eq!(after.map(|l| l.status), expected);
        }
    }
}
