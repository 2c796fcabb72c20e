use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{expand_home, Config, SECRET_VAR};
use crate::db::{format_date, parse_date, BudgetFilter, Database};
use crate::export;
use crate::models::{BudgetStatus, NewBudget, NO_LINKED_EVENT};
use crate::summary::BudgetSummary;
use crate::ui::util::{
    choices, format_amount, format_percent, parse_approval_args,
    parse_expense_args, parse_revenue_args, text_bar,
};

pub(crate) fn as_cli(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "events" => cli_events(db),
        "add-event" => cli_add_event(rest, db),
        "budgets" => cli_budgets(rest, db),
        "add-budget" => cli_add_budget(rest, db),
        "budget-status" => cli_budget_status(rest, db),
        "show" => cli_show(rest, db),
        "add-revenue" => cli_add_revenue(rest, db),
        "add-expense" => cli_add_expense(rest, db),
        "edit-expense" => cli_edit_expense(rest, db),
        "delete-expense" => {
            let id = id_arg(rest, "delete-expense <expense-id>")?;
            db.delete_expense_line(id)?;
            println!("Deleted expense {id}");
            Ok(())
        }
        "cancel-expense" => {
            let id = id_arg(rest, "cancel-expense <expense-id>")?;
            db.cancel_expense_line(id)?;
            println!("Cancelled expense {id}");
            Ok(())
        }
        "approve" => cli_approve(rest, db, config),
        "notes" => cli_notes(rest, db),
        "post" => {
            let id = id_arg(rest, "post <expense-id>")?;
            db.post_expense_line(id)?;
            println!("Posted expense {id}");
            Ok(())
        }
        "summary" | "s" => cli_summary(rest, db),
        "export" => cli_export(rest, db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("eventbudget {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("EventBudget: budgets and expense approvals for cultural events");
    println!();
    println!("Usage: eventbudget [command]");
    println!();
    println!("Commands:");
    println!("  (none)                                   Launch interactive TUI");
    println!("  events                                   List registered events");
    println!("  add-event <name>                         Register an event");
    println!("  budgets                                  List budgets");
    println!("    --event <text>                         Linked event contains text");
    println!("    --date <YYYY-MM-DD>                    Created on date");
    println!("    --status <status>                      Elaborating, Finalized or Cancelled");
    println!("  add-budget <name> <responsible>          Create a budget");
    println!("    --event <name>                         Link to an event");
    println!("    --description <text>                   Free-text description");
    println!("    --date <YYYY-MM-DD>                    Creation date (default: today)");
    println!("  budget-status <id> <status>              Change a budget's status");
    println!("  show <budget-id>                         Print a budget with its lines");
    println!("  add-revenue <budget-id> <amount> <source>");
    println!("  add-expense <budget-id> <amount> <category> <description>");
    println!("  edit-expense <id> <amount> <category> <description>");
    println!("  delete-expense <id>                      Remove a pending expense");
    println!("  cancel-expense <id>                      Cancel a pending expense");
    println!("  approve <id> <method> [YYYY-MM-DD]       Approve a pending expense");
    println!("    --secret <secret>                      Otherwise read from stdin");
    println!("  notes <id> <text>                        Set notes on an approved expense");
    println!("  post <id>                                Mark an approved expense as posted");
    println!("  summary <budget-id>                      Print budget totals");
    println!("  export <budget-id> [path]                Export budget lines to CSV");
    println!("  --help, -h                               Show this help");
    println!("  --version, -V                            Show version");
    println!();
    println!("Environment:");
    println!("  {SECRET_VAR:<40} Approval secret (approvals are refused when unset)");
    println!("  {:<40} Database path override", crate::config::DB_VAR);
    println!("  {:<40} Log filter, e.g. debug", crate::config::LOG_VAR);
}

// ── Argument helpers ─────────────────────────────────────────

const FLAGS: &[&str] = &["--event", "--date", "--status", "--description", "--secret"];

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither a known flag nor a flag's value.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
        } else if FLAGS.contains(&arg.as_str()) {
            skip = true;
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn parse_id(value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .with_context(|| format!("Invalid id '{value}'"))
}

fn id_arg(args: &[String], usage: &str) -> Result<i64> {
    match positional(args).first() {
        Some(id) => parse_id(id),
        None => anyhow::bail!("Usage: eventbudget {usage}"),
    }
}

// ── Events & budgets ─────────────────────────────────────────

fn cli_events(db: &Database) -> Result<()> {
    let events = db.get_events()?;
    if events.is_empty() {
        println!("No events");
        return Ok(());
    }
    println!("{:<5} Name", "ID");
    println!("{}", "─".repeat(40));
    for event in &events {
        println!("{:<5} {}", event.id.unwrap_or(0), event.name);
    }
    Ok(())
}

fn cli_add_event(args: &[String], db: &Database) -> Result<()> {
    let name = positional(args).join(" ");
    if name.trim().is_empty() {
        anyhow::bail!("Usage: eventbudget add-event <name>");
    }
    let id = db.register_event(&name)?;
    println!("Registered event {id}: {}", name.trim());
    Ok(())
}

fn cli_budgets(args: &[String], db: &Database) -> Result<()> {
    let mut filter = BudgetFilter {
        event_contains: flag(args, "--event").map(str::to_string),
        ..BudgetFilter::default()
    };
    if let Some(date) = flag(args, "--date") {
        filter.created_on =
            Some(parse_date(date).with_context(|| format!("Invalid date '{date}'"))?);
    }
    if let Some(status) = flag(args, "--status") {
        filter.status = Some(parse_status(status)?);
    }

    let budgets = db.get_budgets(&filter)?;
    if budgets.is_empty() {
        println!("No budgets");
        return Ok(());
    }
    println!(
        "{:<5} {:<24} {:<18} {:<22} {:<11} Status",
        "ID", "Name", "Responsible", "Event", "Created"
    );
    println!("{}", "─".repeat(94));
    for b in &budgets {
        println!(
            "{:<5} {:<24} {:<18} {:<22} {:<11} {}",
            b.id.unwrap_or(0),
            b.name,
            b.responsible,
            b.event_label(),
            format_date(b.creation_date),
            b.status,
        );
    }
    Ok(())
}

fn cli_add_budget(args: &[String], db: &Database) -> Result<()> {
    let pos = positional(args);
    let (Some(name), Some(responsible)) = (pos.first(), pos.get(1)) else {
        anyhow::bail!(
            "Usage: eventbudget add-budget <name> <responsible> [--event <name>] [--description <text>] [--date <YYYY-MM-DD>]"
        );
    };

    let event = flag(args, "--event").map(str::to_string);
    if let Some(event) = &event {
        let events = db.get_events()?;
        if crate::models::Event::find_by_name(&events, event).is_none() {
            println!("Note: '{event}' is not a registered event");
        }
    }

    let mut budget = NewBudget::new(name.to_string(), responsible.to_string())
        .with_event(event)
        .with_description(flag(args, "--description").unwrap_or_default().to_string());
    if let Some(date) = flag(args, "--date") {
        budget.creation_date =
            Some(parse_date(date).with_context(|| format!("Invalid date '{date}'"))?);
    }

    let id = db.insert_budget(&budget)?;
    println!(
        "Created budget {id}: {} ({})",
        budget.name,
        budget.linked_event_name.as_deref().unwrap_or(NO_LINKED_EVENT)
    );
    Ok(())
}

fn cli_budget_status(args: &[String], db: &Database) -> Result<()> {
    let pos = positional(args);
    let (Some(id), Some(status)) = (pos.first(), pos.get(1)) else {
        anyhow::bail!(
            "Usage: eventbudget budget-status <id> <{}>",
            choices(BudgetStatus::all()).replace(", ", "|")
        );
    };
    let id = parse_id(id)?;
    let status = parse_status(status)?;
    db.update_budget_status(id, status)?;
    println!("Budget {id} is now {status}");
    Ok(())
}

fn parse_status(value: &str) -> Result<BudgetStatus> {
    BudgetStatus::parse(value).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown status '{value}'. Use one of: {}",
            choices(BudgetStatus::all())
        )
    })
}

fn cli_show(args: &[String], db: &Database) -> Result<()> {
    let id = id_arg(args, "show <budget-id>")?;
    let budget = db
        .get_budget(id)?
        .ok_or(crate::error::Error::not_found("Budget", id))?;
    let summary = db.budget_summary(id)?;

    println!("{} (#{id}) {}", budget.name, budget.status);
    println!(
        "  {} · {} · created {}",
        budget.responsible,
        budget.event_label(),
        format_date(budget.creation_date)
    );
    if !budget.description.is_empty() {
        println!("  {}", budget.description);
    }

    println!();
    println!("Revenue:");
    let revenue = db.get_revenue_lines(id)?;
    if revenue.is_empty() {
        println!("  (none)");
    }
    for line in &revenue {
        println!(
            "  {:<5} {:<32} {:>14}",
            line.id.unwrap_or(0),
            line.source_label,
            format_amount(line.projected_amount)
        );
    }

    println!();
    println!("Expenses:");
    let expenses = db.get_expense_lines(id)?;
    if expenses.is_empty() {
        println!("  (none)");
    }
    for line in &expenses {
        println!(
            "  {:<5} {:<28} {:<10} {:>14} {:<10} {:<11} {:<13} {}",
            line.id.unwrap_or(0),
            line.description,
            line.category,
            format_amount(line.projected_amount),
            line.status,
            line.authorized_date.map(format_date).unwrap_or_default(),
            line.payment_method.map(|m| m.as_str()).unwrap_or_default(),
            line.notes,
        );
    }

    println!();
    print_summary(&summary);
    Ok(())
}

// ── Lines & workflow ─────────────────────────────────────────

fn cli_add_revenue(args: &[String], db: &Database) -> Result<()> {
    let pos = positional(args);
    let Some((budget_id, rest)) = pos.split_first() else {
        anyhow::bail!("Usage: eventbudget add-revenue <budget-id> <amount> <source>");
    };
    let budget_id = parse_id(budget_id)?;
    let (amount, source) = parse_revenue_args(&rest.join(" ")).map_err(anyhow::Error::msg)?;
    let id = db.insert_revenue_line(budget_id, &source, amount)?;
    println!("Added revenue line {id}: {source} {}", format_amount(amount));
    Ok(())
}

fn cli_add_expense(args: &[String], db: &Database) -> Result<()> {
    let pos = positional(args);
    let Some((budget_id, rest)) = pos.split_first() else {
        anyhow::bail!(
            "Usage: eventbudget add-expense <budget-id> <amount> <category> <description>"
        );
    };
    let budget_id = parse_id(budget_id)?;
    let (amount, category, description) =
        parse_expense_args(&rest.join(" ")).map_err(anyhow::Error::msg)?;
    let id = db.insert_expense_line(budget_id, &description, category, amount)?;
    println!(
        "Added expense line {id}: {description} ({category}) {}, Pending",
        format_amount(amount)
    );
    Ok(())
}

fn cli_edit_expense(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positional(args);
    let Some((id, rest)) = pos.split_first() else {
        anyhow::bail!("Usage: eventbudget edit-expense <id> <amount> <category> <description>");
    };
    let id = parse_id(id)?;
    let (amount, category, description) =
        parse_expense_args(&rest.join(" ")).map_err(anyhow::Error::msg)?;
    db.edit_expense_line(id, &description, category, amount)?;
    println!("Updated expense {id}");
    Ok(())
}

fn cli_approve(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let pos = positional(args);
    let Some((id, rest)) = pos.split_first() else {
        anyhow::bail!("Usage: eventbudget approve <id> <method> [YYYY-MM-DD] [--secret <secret>]");
    };
    let id = parse_id(id)?;
    let today = chrono::Local::now().date_naive();
    let (method, date) = parse_approval_args(&rest.join(" "), today).map_err(anyhow::Error::msg)?;

    let secret = match flag(args, "--secret") {
        Some(secret) => secret.to_string(),
        None => read_secret()?,
    };

    db.approve_expense_line(id, &config.gate, &secret, date, method)?;
    println!("Approved expense {id} on {} via {method}", format_date(date));
    Ok(())
}

fn read_secret() -> Result<String> {
    eprint!("Approval secret: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read approval secret")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn cli_notes(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positional(args);
    let Some((id, rest)) = pos.split_first() else {
        anyhow::bail!("Usage: eventbudget notes <id> <text>");
    };
    let id = parse_id(id)?;
    db.set_expense_notes(id, &rest.join(" "))?;
    println!("Notes saved for expense {id}");
    Ok(())
}

// ── Reports ──────────────────────────────────────────────────

fn cli_summary(args: &[String], db: &Database) -> Result<()> {
    let id = id_arg(args, "summary <budget-id>")?;
    let summary = db.budget_summary(id)?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &BudgetSummary) {
    println!("Summary");
    println!("{}", "─".repeat(40));
    println!("  Revenue:   {:>14}", format_amount(summary.total_revenue));
    println!("  Expenses:  {:>14}", format_amount(summary.total_expense));
    println!("  Balance:   {:>14}", format_amount(summary.balance));
    println!("  Margin:    {:>14}", format_percent(summary.margin_percent));

    if summary.has_lines() {
        let bars = summary.chart_bars();
        let max = bars
            .iter()
            .map(|(_, amount)| amount.abs())
            .max()
            .unwrap_or_default();
        println!();
        for (label, amount) in &bars {
            println!("  {label:<9} {} {}", text_bar(amount.abs(), max, 30), format_amount(*amount));
        }
    }
}

fn cli_export(args: &[String], db: &Database) -> Result<()> {
    let pos = positional(args);
    let Some(id) = pos.first() else {
        anyhow::bail!("Usage: eventbudget export <budget-id> [path]");
    };
    let id = parse_id(id)?;
    let path = pos
        .get(1)
        .map(|p| PathBuf::from(expand_home(p)))
        .unwrap_or_else(|| PathBuf::from(format!("budget-{id}.csv")));

    let count = export::export_budget(db, id, &path)?;
    println!("Exported {count} lines to {}", path.display());
    Ok(())
}
