use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseCategory {
    Staff,
    Materials,
    Travel,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staff => "Staff",
            Self::Materials => "Materials",
            Self::Travel => "Travel",
            Self::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "staff" | "team" => Self::Staff,
            "materials" | "material" => Self::Materials,
            "travel" | "trips" => Self::Travel,
            _ => Self::Other,
        }
    }

    pub fn all() -> &'static [ExpenseCategory] {
        &[Self::Staff, Self::Materials, Self::Travel, Self::Other]
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of an expense line. See `crate::workflow` for the legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpenseStatus {
    Pending,
    Approved,
    Cancelled,
    Posted,
}

impl ExpenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Cancelled => "Cancelled",
            Self::Posted => "Posted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            "posted" => Some(Self::Posted),
            _ => None,
        }
    }

    pub fn all() -> &'static [ExpenseStatus] {
        &[Self::Pending, Self::Approved, Self::Cancelled, Self::Posted]
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Posted)
    }
}

impl std::fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Upfront,
    Installments,
    Invoiced,
    Pix,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upfront => "Upfront",
            Self::Installments => "Installments",
            Self::Invoiced => "Invoiced",
            Self::Pix => "PIX",
            Self::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "upfront" | "cash" => Self::Upfront,
            "installments" | "installment" => Self::Installments,
            "invoiced" | "invoice" => Self::Invoiced,
            "pix" => Self::Pix,
            _ => Self::Other,
        }
    }

    pub fn all() -> &'static [PaymentMethod] {
        &[
            Self::Upfront,
            Self::Installments,
            Self::Invoiced,
            Self::Pix,
            Self::Other,
        ]
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseLine {
    pub id: Option<i64>,
    pub budget_id: i64,
    pub description: String,
    pub category: ExpenseCategory,
    pub projected_amount: Decimal,
    pub status: ExpenseStatus,
    /// Set by approval only.
    pub authorized_date: Option<NaiveDate>,
    /// Set by approval only.
    pub payment_method: Option<PaymentMethod>,
    pub notes: String,
}

impl ExpenseLine {
    #[cfg(test)]
    pub fn new(
        budget_id: i64,
        description: String,
        category: ExpenseCategory,
        projected_amount: Decimal,
    ) -> Self {
        Self {
            id: None,
            budget_id,
            description,
            category,
            projected_amount,
            status: ExpenseStatus::Pending,
            authorized_date: None,
            payment_method: None,
            notes: String::new(),
        }
    }
}
