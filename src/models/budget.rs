use chrono::NaiveDate;

/// Label shown for budgets that are not tied to any registered event.
pub const NO_LINKED_EVENT: &str = "No linked event";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Elaborating,
    Finalized,
    Cancelled,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Elaborating => "Elaborating",
            Self::Finalized => "Finalized",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "elaborating" | "draft" => Some(Self::Elaborating),
            "finalized" | "final" => Some(Self::Finalized),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn all() -> &'static [BudgetStatus] {
        &[Self::Elaborating, Self::Finalized, Self::Cancelled]
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Budget {
    pub id: Option<i64>,
    pub name: String,
    pub responsible: String,
    pub creation_date: NaiveDate,
    pub description: String,
    /// Denormalized event name; not checked against the events table.
    pub linked_event_name: Option<String>,
    pub status: BudgetStatus,
}

impl Budget {
    pub fn event_label(&self) -> &str {
        self.linked_event_name.as_deref().unwrap_or(NO_LINKED_EVENT)
    }
}

/// Fields collected by the budget creation form.
#[derive(Debug, Clone)]
pub struct NewBudget {
    pub name: String,
    pub responsible: String,
    pub description: String,
    pub linked_event_name: Option<String>,
    /// Defaults to today when `None`.
    pub creation_date: Option<NaiveDate>,
}

impl NewBudget {
    pub fn new(name: String, responsible: String) -> Self {
        Self {
            name,
            responsible,
            description: String::new(),
            linked_event_name: None,
            creation_date: None,
        }
    }

    pub fn with_event(mut self, event: Option<String>) -> Self {
        self.linked_event_name = event
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case(NO_LINKED_EVENT));
        self
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }
}
