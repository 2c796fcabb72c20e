//! Expense approval workflow.
//!
//! An expense line moves `Pending -> Approved -> Posted`, or `Pending -> Cancelled`.
//! Which actions are legal depends only on the current status:
//!
//! | From     | Action    | To        |
//! |----------|-----------|-----------|
//! | Pending  | Edit      | Pending   |
//! | Pending  | Delete    | (removed) |
//! | Pending  | Cancel    | Cancelled |
//! | Pending  | Approve   | Approved  |
//! | Approved | SetNotes  | Approved  |
//! | Approved | Post      | Posted    |
//!
//! Cancelled and Posted accept nothing. Approval is additionally gated by the
//! shared secret held in [`ApprovalGate`]. The store applies these rules inside
//! a write transaction (see `db::expenses`), so a stale caller cannot skip a step.

mod gate;

pub(crate) use gate::ApprovalGate;

use crate::models::ExpenseStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpenseAction {
    Edit,
    Delete,
    Cancel,
    Approve,
    SetNotes,
    Post,
}

impl ExpenseAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Cancel => "cancel",
            Self::Approve => "approve",
            Self::SetNotes => "update notes",
            Self::Post => "post",
        }
    }

    pub fn all() -> &'static [ExpenseAction] {
        &[
            Self::Edit,
            Self::Delete,
            Self::Cancel,
            Self::Approve,
            Self::SetNotes,
            Self::Post,
        ]
    }
}

impl std::fmt::Display for ExpenseAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where an expense ends up after a permitted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Status(ExpenseStatus),
    Removed,
}

/// The transition table. `None` means the action is not allowed from `from`.
pub fn transition(from: ExpenseStatus, action: ExpenseAction) -> Option<Outcome> {
    use ExpenseAction as A;
    use ExpenseStatus as S;

    match (from, action) {
        (S::Pending, A::Edit) => Some(Outcome::Status(S::Pending)),
        (S::Pending, A::Delete) => Some(Outcome::Removed),
        (S::Pending, A::Cancel) => Some(Outcome::Status(S::Cancelled)),
        (S::Pending, A::Approve) => Some(Outcome::Status(S::Approved)),
        (S::Approved, A::SetNotes) => Some(Outcome::Status(S::Approved)),
        (S::Approved, A::Post) => Some(Outcome::Status(S::Posted)),
        _ => None,
    }
}

impl ExpenseStatus {
    /// Actions offered for an expense in this status, in menu order.
    pub fn available_actions(&self) -> Vec<ExpenseAction> {
        ExpenseAction::all()
            .iter()
            .copied()
            .filter(|a| transition(*self, *a).is_some())
            .collect()
    }

    pub fn allows(&self, action: ExpenseAction) -> bool {
        transition(*self, action).is_some()
    }
}
