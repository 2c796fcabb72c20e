use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::db::{parse_date, BudgetFilter};
use crate::models::{BudgetStatus, ExpenseCategory, PaymentMethod};

/// Format a decimal amount with thousand separators and 2 decimal places.
/// e.g. `1234567.89` → `"1,234,567.89"`
pub(crate) fn format_amount(val: Decimal) -> String {
    let abs = val.abs();
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if val < Decimal::ZERO {
        format!("-{with_commas}.{dec_part}")
    } else {
        format!("{with_commas}.{dec_part}")
    }
}

/// Margin with two decimals and a percent sign.
pub(crate) fn format_percent(val: Decimal) -> String {
    format!("{val:.2}%")
}

/// Parses a user-typed amount. Thousand separators and a leading currency
/// symbol are accepted: `"R$ 1,200.50"`, `"$40"`, `"12"`.
pub(crate) fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .trim_start_matches("R$")
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Case-insensitive match of `input` against the display names of `options`.
pub(crate) fn pick<T: Copy + std::fmt::Display>(input: &str, options: &[T]) -> Option<T> {
    let input = input.trim();
    options
        .iter()
        .copied()
        .find(|o| o.to_string().eq_ignore_ascii_case(input))
}

/// Comma-separated display names, for usage messages.
pub(crate) fn choices<T: std::fmt::Display>(options: &[T]) -> String {
    options
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parses `event=<text> date=<YYYY-MM-DD> status=<status>` into a budget
/// filter. Keys may appear in any order; an empty string clears everything.
/// The event value runs until the next `key=`, so it may contain spaces.
pub(crate) fn parse_budget_filter(args: &str) -> Result<BudgetFilter, String> {
    let mut filter = BudgetFilter::default();
    let mut key: Option<&str> = None;
    let mut value: Vec<&str> = Vec::new();

    let mut apply = |key: Option<&str>, value: &[&str]| -> Result<(), String> {
        let Some(key) = key else {
            return match value.first() {
                Some(stray) => Err(format!("Expected key=value, got '{stray}'")),
                None => Ok(()),
            };
        };
        let joined = value.join(" ");
        match key {
            "event" => {
                filter.event_contains = Some(joined).filter(|v| !v.is_empty());
            }
            "date" => {
                let date = parse_date(&joined)
                    .map_err(|_| format!("Invalid date '{joined}'. Use YYYY-MM-DD"))?;
                filter.created_on = Some(date);
            }
            "status" => {
                let status = BudgetStatus::parse(&joined).ok_or_else(|| {
                    format!(
                        "Unknown status '{joined}'. Use one of: {}",
                        choices(BudgetStatus::all())
                    )
                })?;
                filter.status = Some(status);
            }
            other => return Err(format!("Unknown filter '{other}'. Use event, date or status")),
        }
        Ok(())
    };

    for word in args.split_whitespace() {
        if let Some((k, v)) = word.split_once('=') {
            apply(key, &value)?;
            key = Some(k);
            value.clear();
            if !v.is_empty() {
                value.push(v);
            }
        } else {
            value.push(word);
        }
    }
    apply(key, &value)?;

    Ok(filter)
}

/// Horizontal text bar scaled against `max`, e.g. `"████████░░"`.
pub(crate) fn text_bar(value: Decimal, max: Decimal, width: usize) -> String {
    let filled = if max > Decimal::ZERO {
        let ratio = (value / max).min(Decimal::ONE).max(Decimal::ZERO);
        (ratio * Decimal::from(width)).round().to_usize().unwrap_or(0)
    } else {
        0
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(width.saturating_sub(filled)))
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
/// The result is guaranteed to be at most `max` characters (counting "…" as one).
/// Safe for multi-byte UTF-8 characters.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let char_count = s.chars().count();
    if char_count <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}

/// Move a list cursor down by one, adjusting scroll to keep cursor visible.
pub(crate) fn scroll_down(index: &mut usize, scroll: &mut usize, len: usize, page: usize) {
    if *index + 1 < len {
        *index += 1;
        if *index >= *scroll + page {
            *scroll = index.saturating_sub(page.saturating_sub(1));
        }
    }
}

/// Move a list cursor up by one, adjusting scroll to keep cursor visible.
pub(crate) fn scroll_up(index: &mut usize, scroll: &mut usize) {
    *index = index.saturating_sub(1);
    if *index < *scroll {
        *scroll = *index;
    }
}

pub(crate) fn scroll_to_top(index: &mut usize, scroll: &mut usize) {
    *index = 0;
    *scroll = 0;
}

pub(crate) fn scroll_to_bottom(index: &mut usize, scroll: &mut usize, len: usize, page: usize) {
    if len > 0 {
        *index = len - 1;
        *scroll = index.saturating_sub(page.saturating_sub(1));
    }
}

/// `<amount> <source...>`
pub(crate) fn parse_revenue_args(args: &str) -> Result<(Decimal, String), String> {
    let (amount, rest) = split_first_word(args);
    let amount = parse_amount(amount).ok_or_else(|| format!("Invalid amount '{amount}'"))?;
    if rest.is_empty() {
        return Err("Missing revenue source".into());
    }
    Ok((amount, rest.to_string()))
}

/// `<amount> <category> <description...>`
pub(crate) fn parse_expense_args(
    args: &str,
) -> Result<(Decimal, ExpenseCategory, String), String> {
    let (amount, rest) = split_first_word(args);
    let amount = parse_amount(amount).ok_or_else(|| format!("Invalid amount '{amount}'"))?;
    let (category, description) = split_first_word(rest);
    let category = pick(category, ExpenseCategory::all()).ok_or_else(|| {
        format!(
            "Unknown category '{category}'. Use one of: {}",
            choices(ExpenseCategory::all())
        )
    })?;
    if description.is_empty() {
        return Err("Missing expense description".into());
    }
    Ok((amount, category, description.to_string()))
}

/// `<payment method> [YYYY-MM-DD]`; the date defaults to `today`.
pub(crate) fn parse_approval_args(
    args: &str,
    today: NaiveDate,
) -> Result<(PaymentMethod, NaiveDate), String> {
    let (method, rest) = split_first_word(args);
    let method = pick(method, PaymentMethod::all()).ok_or_else(|| {
        format!(
            "Unknown payment method '{method}'. Use one of: {}",
            choices(PaymentMethod::all())
        )
    })?;
    let date = if rest.is_empty() {
        today
    } else {
        parse_date(rest).map_err(|_| format!("Invalid date '{rest}'. Use YYYY-MM-DD"))?
    };
    Ok((method, date))
}

fn split_first_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (s, ""),
    }
}
