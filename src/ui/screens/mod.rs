pub(crate) mod budget;
pub(crate) mod budgets;
pub(crate) mod events;
