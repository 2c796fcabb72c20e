mod budget;
mod event;
mod expense;
mod revenue;

pub use budget::{Budget, BudgetStatus, NewBudget, NO_LINKED_EVENT};
pub use event::Event;
pub use expense::{ExpenseCategory, ExpenseLine, ExpenseStatus, PaymentMethod};
pub use revenue::RevenueLine;

#[cfg(test)]
mod tests;
