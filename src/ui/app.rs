use anyhow::Result;
use chrono::NaiveDate;

use crate::db::{BudgetFilter, Database};
use crate::models::*;
use crate::summary::BudgetSummary;
use crate::workflow::ApprovalGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Events,
    Budgets,
    Budget,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Events, Self::Budgets, Self::Budget]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Events => write!(f, "Events"),
            Self::Budgets => write!(f, "Budgets"),
            Self::Budget => write!(f, "Budget"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Search,
    /// Masked entry of the approval secret.
    Secret,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Search => write!(f, "SEARCH"),
            Self::Secret => write!(f, "SECRET"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone)]
pub(crate) enum PendingAction {
    DeleteExpense { id: i64, description: String },
    CancelExpense { id: i64, description: String },
}

/// Approval form filled in by `:approve`, waiting for the secret.
#[derive(Debug, Clone)]
pub(crate) struct PendingApproval {
    pub(crate) id: i64,
    pub(crate) authorized_date: NaiveDate,
    pub(crate) payment_method: PaymentMethod,
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) search_input: String,
    pub(crate) secret_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,
    pub(crate) gate: ApprovalGate,

    // Events
    pub(crate) events: Vec<Event>,
    pub(crate) event_index: usize,
    pub(crate) event_scroll: usize,

    // Budgets
    pub(crate) budgets: Vec<Budget>,
    pub(crate) budget_index: usize,
    pub(crate) budget_scroll: usize,
    pub(crate) budget_filter: BudgetFilter,

    // Open budget
    pub(crate) budget: Option<Budget>,
    pub(crate) revenue_lines: Vec<RevenueLine>,
    pub(crate) expense_lines: Vec<ExpenseLine>,
    pub(crate) expense_index: usize,
    pub(crate) expense_scroll: usize,
    pub(crate) summary: Option<BudgetSummary>,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) pending_approval: Option<PendingApproval>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(gate: ApprovalGate) -> Self {
        Self {
            running: true,
            screen: Screen::Budgets,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            search_input: String::new(),
            secret_input: String::new(),
            status_message: String::new(),
            show_help: false,
            gate,

            events: Vec::new(),
            event_index: 0,
            event_scroll: 0,

            budgets: Vec::new(),
            budget_index: 0,
            budget_scroll: 0,
            budget_filter: BudgetFilter::default(),

            budget: None,
            revenue_lines: Vec::new(),
            expense_lines: Vec::new(),
            expense_index: 0,
            expense_scroll: 0,
            summary: None,

            pending_action: None,
            pending_approval: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    pub(crate) fn refresh_events(&mut self, db: &Database) -> Result<()> {
        self.events = db.get_events()?;
        clamp_index(&mut self.event_index, self.events.len());
        Ok(())
    }

    pub(crate) fn refresh_budgets(&mut self, db: &Database) -> Result<()> {
        self.budget_filter.event_contains = if self.search_input.is_empty() {
            None
        } else {
            Some(self.search_input.clone())
        };
        self.budgets = db.get_budgets(&self.budget_filter)?;
        clamp_index(&mut self.budget_index, self.budgets.len());
        if self.budget_scroll > self.budget_index {
            self.budget_scroll = self.budget_index;
        }
        Ok(())
    }

    /// Re-reads the open budget, its lines and its totals from the store.
    pub(crate) fn refresh_budget(&mut self, db: &Database) -> Result<()> {
        let Some(id) = self.budget.as_ref().and_then(|b| b.id) else {
            self.revenue_lines.clear();
            self.expense_lines.clear();
            self.summary = None;
            return Ok(());
        };

        self.budget = db.get_budget(id)?;
        if self.budget.is_none() {
            self.revenue_lines.clear();
            self.expense_lines.clear();
            self.summary = None;
            return Ok(());
        }
        self.revenue_lines = db.get_revenue_lines(id)?;
        self.expense_lines = db.get_expense_lines(id)?;
        self.summary = match BudgetSummary::compute(&self.revenue_lines, &self.expense_lines) {
            Ok(summary) => Some(summary),
            Err(e) => {
                self.set_status(format!("Error: {e}"));
                None
            }
        };
        clamp_index(&mut self.expense_index, self.expense_lines.len());
        if self.expense_scroll > self.expense_index {
            self.expense_scroll = self.expense_index;
        }
        Ok(())
    }

    pub(crate) fn refresh_all(&mut self, db: &Database) -> Result<()> {
        self.refresh_events(db)?;
        self.refresh_budgets(db)?;
        self.refresh_budget(db)?;
        Ok(())
    }

    /// Opens the budget under the cursor on the Budgets screen.
    pub(crate) fn open_selected_budget(&mut self, db: &Database) -> Result<bool> {
        let Some(budget) = self.budgets.get(self.budget_index).cloned() else {
            return Ok(false);
        };
        self.budget = Some(budget);
        self.expense_index = 0;
        self.expense_scroll = 0;
        self.screen = Screen::Budget;
        self.refresh_budget(db)?;
        Ok(true)
    }

    /// The budget commands act on: the open one on the Budget screen, the
    /// highlighted one elsewhere.
    pub(crate) fn target_budget(&self) -> Option<&Budget> {
        match self.screen {
            Screen::Budget => self.budget.as_ref(),
            _ => self.budgets.get(self.budget_index),
        }
    }

    pub(crate) fn selected_expense(&self) -> Option<&ExpenseLine> {
        if self.screen != Screen::Budget {
            return None;
        }
        self.expense_lines.get(self.expense_index)
    }

    /// Bottom line of the expense table: what the highlighted line allows next.
    pub(crate) fn expense_hint(&self) -> String {
        let Some(line) = self.selected_expense() else {
            return String::new();
        };
        if line.status.is_terminal() {
            return format!("[{}: no further actions] ", line.status);
        }
        let actions: Vec<&str> = line
            .status
            .available_actions()
            .iter()
            .map(|a| a.as_str())
            .collect();
        format!("[{}] ", actions.join(", "))
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}

fn clamp_index(index: &mut usize, len: usize) {
    if *index >= len {
        *index = len.saturating_sub(1);
    }
}
