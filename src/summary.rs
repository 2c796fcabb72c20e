//! Budget totals: revenue, expense, balance and margin.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Error, Result};
use crate::models::{ExpenseLine, RevenueLine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSummary {
    pub total_revenue: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    /// Balance as a percentage of revenue, 2 dp. Zero when there is no revenue.
    pub margin_percent: Decimal,
    pub revenue_lines: usize,
    pub expense_lines: usize,
}

impl BudgetSummary {
    /// Cancelled expense lines are included in `total_expense`. Totals that do
    /// not fit in a `Decimal` are reported as `InvalidInput` on `amount`.
    pub fn compute(revenue: &[RevenueLine], expenses: &[ExpenseLine]) -> Result<Self> {
        let total_revenue = checked_total(revenue.iter().map(|r| r.projected_amount))?;
        let total_expense = checked_total(expenses.iter().map(|e| e.projected_amount))?;
        let balance = total_revenue
            .checked_sub(total_expense)
            .ok_or_else(overflow)?;
        let margin_percent = if total_revenue > Decimal::ZERO {
            let ratio = balance.checked_div(total_revenue).ok_or_else(overflow)?;
            round_money(ratio.checked_mul(Decimal::ONE_HUNDRED).ok_or_else(overflow)?)
        } else {
            Decimal::ZERO
        };

        Ok(Self {
            total_revenue,
            total_expense,
            balance,
            margin_percent,
            revenue_lines: revenue.len(),
            expense_lines: expenses.len(),
        })
    }

    pub fn has_lines(&self) -> bool {
        self.revenue_lines > 0 || self.expense_lines > 0
    }

    /// Bars for the revenue vs. expense comparison chart.
    pub fn chart_bars(&self) -> [(&'static str, Decimal); 2] {
        [
            ("Revenue", self.total_revenue),
            ("Expenses", self.total_expense),
        ]
    }
}

fn checked_total(mut amounts: impl Iterator<Item = Decimal>) -> Result<Decimal> {
    amounts.try_fold(Decimal::ZERO, |acc, amount| {
        acc.checked_add(amount).ok_or_else(overflow)
    })
}

fn overflow() -> Error {
    Error::invalid_input("amount", "budget totals are too large to compute")
}

/// Round to cents, halves away from zero.
pub fn round_money(val: Decimal) -> Decimal {
    val.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod summary_tests;
