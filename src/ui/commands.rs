use std::collections::HashMap;
use std::sync::LazyLock;

use super::app::{App, InputMode, PendingAction, PendingApproval, Screen};
use super::util::{
    choices, parse_approval_args, parse_budget_filter, parse_expense_args, parse_revenue_args,
};
use crate::db::Database;
use crate::models::{BudgetStatus, Event, ExpenseLine, NewBudget};

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Database) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit EventBudget", cmd_quit, r);
    register_command!("quit", "Quit EventBudget", cmd_quit, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!("e", "Go to Events", cmd_events, r);
    register_command!("events", "Go to Events", cmd_events, r);
    register_command!("b", "Go to Budgets", cmd_budgets, r);
    register_command!("budgets", "Go to Budgets", cmd_budgets, r);
    register_command!("o", "Open selected budget", cmd_open, r);
    register_command!("open", "Open selected budget", cmd_open, r);
    register_command!(
        "event",
        "Register event (e.g. :event Summer Jazz)",
        cmd_event,
        r
    );
    register_command!(
        "budget",
        "New budget (:budget name | responsible [| event [| description]])",
        cmd_budget,
        r
    );
    register_command!(
        "status",
        "Set budget status (e.g. :status finalized)",
        cmd_status,
        r
    );
    register_command!(
        "revenue",
        "Add revenue line (e.g. :revenue 1000 Sponsor)",
        cmd_revenue,
        r
    );
    register_command!(
        "expense",
        "Add expense line (e.g. :expense 400 materials Venue)",
        cmd_expense,
        r
    );
    register_command!(
        "edit",
        "Edit pending expense (e.g. :edit 450 materials Venue)",
        cmd_edit,
        r
    );
    register_command!("delete", "Delete pending expense", cmd_delete, r);
    register_command!("cancel", "Cancel pending expense", cmd_cancel, r);
    register_command!(
        "approve",
        "Approve expense (e.g. :approve pix 2024-05-01)",
        cmd_approve,
        r
    );
    register_command!(
        "notes",
        "Set notes on approved expense (e.g. :notes paid half)",
        cmd_notes,
        r
    );
    register_command!("post", "Mark approved expense as posted", cmd_post, r);
    register_command!(
        "filter",
        "Filter budgets (e.g. :filter event=jazz status=finalized)",
        cmd_filter,
        r
    );
    register_command!(
        "export",
        "Export budget lines to CSV (e.g. :export ~/festival.csv)",
        cmd_export,
        r
    );

    r
});

/// Runs one `:` command. Failures are reported in the status bar and never end
/// the session.
pub(crate) fn handle_command(input: &str, app: &mut App, db: &mut Database) {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        if let Err(e) = (cmd.run)(args, app, db) {
            tracing::debug!(command = cmd_name, error = %e, "Command failed");
            app.set_status(format!("Error: {e}"));
        }
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn selected_expense(app: &App) -> anyhow::Result<ExpenseLine> {
    app.selected_expense()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("No expense selected. Open a budget and pick a line"))
}

fn open_budget_id(app: &App) -> anyhow::Result<i64> {
    if app.screen != Screen::Budget {
        anyhow::bail!("Open a budget first (Enter on the Budgets screen)");
    }
    app.budget
        .as_ref()
        .and_then(|b| b.id)
        .ok_or_else(|| anyhow::anyhow!("No budget open"))
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_events(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Events;
    app.refresh_events(db)?;
    Ok(())
}

fn cmd_budgets(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Budgets;
    app.refresh_budgets(db)?;
    Ok(())
}

fn cmd_open(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if app.screen == Screen::Budget {
        return Ok(());
    }
    if !app.open_selected_budget(db)? {
        app.set_status("No budget selected");
    }
    Ok(())
}

fn cmd_event(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :event <name>");
        return Ok(());
    }
    db.register_event(args)?;
    app.refresh_events(db)?;
    app.set_status(format!("Registered event: {args}"));
    Ok(())
}

fn cmd_budget(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let fields: Vec<&str> = args.split('|').map(str::trim).collect();
    let (name, responsible) = match fields.as_slice() {
        [name, responsible, ..] if !name.is_empty() && !responsible.is_empty() => {
            (*name, *responsible)
        }
        _ => {
            app.set_status("Usage: :budget <name> | <responsible> [| <event> [| <description>]]");
            return Ok(());
        }
    };

    let budget = NewBudget::new(name.to_string(), responsible.to_string())
        .with_event(fields.get(2).map(|e| e.to_string()))
        .with_description(fields.get(3).map(|d| d.to_string()).unwrap_or_default());

    // Event links are by name and are not validated.
    let unregistered = budget
        .linked_event_name
        .as_deref()
        .filter(|event| Event::find_by_name(&app.events, event).is_none())
        .map(str::to_string);

    let id = db.insert_budget(&budget)?;
    app.refresh_budgets(db)?;
    if let Some(pos) = app.budgets.iter().position(|b| b.id == Some(id)) {
        app.budget_index = pos;
    }
    match unregistered {
        Some(event) => app.set_status(format!(
            "Created budget: {name} (event '{event}' is not registered)"
        )),
        None => app.set_status(format!("Created budget: {name}")),
    }
    Ok(())
}

fn cmd_status(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(status) = BudgetStatus::parse(args) else {
        app.set_status(format!(
            "Usage: :status <{}>",
            choices(BudgetStatus::all()).replace(", ", "|")
        ));
        return Ok(());
    };
    let Some((id, name)) = app
        .target_budget()
        .and_then(|b| b.id.map(|id| (id, b.name.clone())))
    else {
        app.set_status("No budget selected");
        return Ok(());
    };

    db.update_budget_status(id, status)?;
    app.refresh_budgets(db)?;
    app.refresh_budget(db)?;
    app.set_status(format!("{name} is now {status}"));
    Ok(())
}

fn cmd_revenue(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let budget_id = open_budget_id(app)?;
    let (amount, source) = match parse_revenue_args(args) {
        Ok(parsed) => parsed,
        Err(msg) => {
            app.set_status(format!("{msg}. Usage: :revenue <amount> <source>"));
            return Ok(());
        }
    };
    db.insert_revenue_line(budget_id, &source, amount)?;
    app.refresh_budget(db)?;
    app.set_status(format!("Added revenue: {source}"));
    Ok(())
}

fn cmd_expense(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let budget_id = open_budget_id(app)?;
    let (amount, category, description) = match parse_expense_args(args) {
        Ok(parsed) => parsed,
        Err(msg) => {
            app.set_status(format!(
                "{msg}. Usage: :expense <amount> <category> <description>"
            ));
            return Ok(());
        }
    };
    let id = db.insert_expense_line(budget_id, &description, category, amount)?;
    app.refresh_budget(db)?;
    if let Some(pos) = app.expense_lines.iter().position(|e| e.id == Some(id)) {
        app.expense_index = pos;
    }
    app.set_status(format!("Added expense: {description} (Pending)"));
    Ok(())
}

fn cmd_edit(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let expense = selected_expense(app)?;
    let id = expense.id.ok_or_else(|| anyhow::anyhow!("Expense has no ID"))?;
    let (amount, category, description) = match parse_expense_args(args) {
        Ok(parsed) => parsed,
        Err(msg) => {
            app.set_status(format!(
                "{msg}. Usage: :edit <amount> <category> <description>"
            ));
            return Ok(());
        }
    };
    db.edit_expense_line(id, &description, category, amount)?;
    app.refresh_budget(db)?;
    app.set_status(format!("Updated expense: {description}"));
    Ok(())
}

fn cmd_delete(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    let expense = selected_expense(app)?;
    let id = expense.id.ok_or_else(|| anyhow::anyhow!("Expense has no ID"))?;
    app.confirm_message = format!("Delete expense '{}'?", expense.description);
    app.pending_action = Some(PendingAction::DeleteExpense {
        id,
        description: expense.description,
    });
    app.input_mode = InputMode::Confirm;
    Ok(())
}

fn cmd_cancel(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    let expense = selected_expense(app)?;
    let id = expense.id.ok_or_else(|| anyhow::anyhow!("Expense has no ID"))?;
    app.confirm_message = format!(
        "Cancel expense '{}'? Cancelled expenses cannot be changed again.",
        expense.description
    );
    app.pending_action = Some(PendingAction::CancelExpense {
        id,
        description: expense.description,
    });
    app.input_mode = InputMode::Confirm;
    Ok(())
}

/// Collects the approval form, then asks for the secret in masked input.
fn cmd_approve(args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    let expense = selected_expense(app)?;
    let id = expense.id.ok_or_else(|| anyhow::anyhow!("Expense has no ID"))?;
    let today = chrono::Local::now().date_naive();
    let (payment_method, authorized_date) = match parse_approval_args(args, today) {
        Ok(parsed) => parsed,
        Err(msg) => {
            app.set_status(format!(
                "{msg}. Usage: :approve <{}> [YYYY-MM-DD]",
                choices(crate::models::PaymentMethod::all()).replace(", ", "|")
            ));
            return Ok(());
        }
    };

    app.pending_approval = Some(PendingApproval {
        id,
        authorized_date,
        payment_method,
    });
    app.secret_input.clear();
    app.input_mode = InputMode::Secret;
    Ok(())
}

fn cmd_notes(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let expense = selected_expense(app)?;
    let id = expense.id.ok_or_else(|| anyhow::anyhow!("Expense has no ID"))?;
    db.set_expense_notes(id, args)?;
    app.refresh_budget(db)?;
    app.set_status(format!("Notes saved for: {}", expense.description));
    Ok(())
}

fn cmd_post(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let expense = selected_expense(app)?;
    let id = expense.id.ok_or_else(|| anyhow::anyhow!("Expense has no ID"))?;
    db.post_expense_line(id)?;
    app.refresh_budget(db)?;
    app.set_status(format!("Posted: {}", expense.description));
    Ok(())
}

fn cmd_filter(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let filter = match parse_budget_filter(args) {
        Ok(f) => f,
        Err(msg) => {
            app.set_status(msg);
            return Ok(());
        }
    };
    app.search_input = filter.event_contains.clone().unwrap_or_default();
    let cleared = filter.is_empty();
    app.budget_filter = filter;
    app.screen = Screen::Budgets;
    app.budget_index = 0;
    app.budget_scroll = 0;
    app.refresh_budgets(db)?;
    if cleared {
        app.set_status("Filter cleared, showing all budgets");
    } else {
        app.set_status(format!("{} budgets match", app.budgets.len()));
    }
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(budget_id) = app.target_budget().and_then(|b| b.id) else {
        app.set_status("No budget selected");
        return Ok(());
    };
    let path = if args.is_empty() {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/eventbudget-budget-{budget_id}.csv")
    } else {
        crate::config::expand_home(args)
    };

    let count = crate::export::export_budget(db, budget_id, std::path::Path::new(&path))?;
    app.set_status(format!("Exported {count} lines to {path}"));
    Ok(())
}

/// Applies a confirmed delete or cancel.
pub(crate) fn apply_pending(
    action: PendingAction,
    app: &mut App,
    db: &mut Database,
) -> anyhow::Result<()> {
    match action {
        PendingAction::DeleteExpense { id, description } => {
            db.delete_expense_line(id)?;
            app.refresh_budget(db)?;
            app.set_status(format!("Deleted: {description}"));
        }
        PendingAction::CancelExpense { id, description } => {
            db.cancel_expense_line(id)?;
            app.refresh_budget(db)?;
            app.set_status(format!("Cancelled: {description}"));
        }
    }
    Ok(())
}

/// Submits the approval form with the secret typed in masked input.
pub(crate) fn submit_approval(
    approval: PendingApproval,
    secret: &str,
    app: &mut App,
    db: &mut Database,
) -> anyhow::Result<()> {
    let gate = app.gate.clone();
    db.approve_expense_line(
        approval.id,
        &gate,
        secret,
        approval.authorized_date,
        approval.payment_method,
    )?;
    app.refresh_budget(db)?;
    app.set_status(format!(
        "Approved on {} via {}",
        crate::db::format_date(approval.authorized_date),
        approval.payment_method
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("aprove", "approve"), 1);
        assert_eq!(levenshtein("", "post"), 4);
        assert_eq!(levenshtein("post", "post"), 0);
    }

    #[test]
    fn test_suggestion_skips_aliases() {
        assert_eq!(find_closest("aprove"), "approve");
        assert_eq!(find_closest("budgt"), "budget");
    }

    fn session() -> (App, Database) {
        let db = Database::open_in_memory().unwrap();
        let mut app = App::new(crate::workflow::ApprovalGate::new(Some("s3cret".into())));
        app.refresh_all(&db).unwrap();
        (app, db)
    }

    fn open_festival(app: &mut App, db: &mut Database) {
        handle_command("budget Festival | Ana | Summer Jazz", app, db);
        handle_command("open", app, db);
        assert_eq!(app.screen, Screen::Budget);
    }

    #[test]
    fn test_budget_command_notes_unregistered_event() {
        let (mut app, mut db) = session();
        handle_command("budget Festival | Ana | Summer Jazz", &mut app, &mut db);
        assert_eq!(app.budgets.len(), 1);
        assert_eq!(app.budgets[0].event_label(), "Summer Jazz");
        assert!(app.status_message.contains("not registered"));
    }

    #[test]
    fn test_line_commands_need_open_budget() {
        let (mut app, mut db) = session();
        handle_command("expense 400 materials Venue", &mut app, &mut db);
        assert!(app.status_message.starts_with("Error:"));
    }

    #[test]
    fn test_approval_goes_through_secret_prompt() {
        let (mut app, mut db) = session();
        open_festival(&mut app, &mut db);
        handle_command("revenue 1000 Sponsor", &mut app, &mut db);
        handle_command("expense 400 materials Venue", &mut app, &mut db);

        handle_command("approve pix 2024-05-01", &mut app, &mut db);
        assert_eq!(app.input_mode, InputMode::Secret);
        let approval = app.pending_approval.take().unwrap();

        assert!(submit_approval(approval.clone(), "guess", &mut app, &mut db).is_err());
        assert_eq!(
            app.expense_lines[0].status,
            crate::models::ExpenseStatus::Pending
        );

        submit_approval(approval, "s3cret", &mut app, &mut db).unwrap();
        let line = &app.expense_lines[0];
        assert_eq!(line.status, crate::models::ExpenseStatus::Approved);
        assert_eq!(line.payment_method, Some(crate::models::PaymentMethod::Pix));

        handle_command("post", &mut app, &mut db);
        assert_eq!(
            app.expense_lines[0].status,
            crate::models::ExpenseStatus::Posted
        );
        let summary = app.summary.as_ref().unwrap();
        assert_eq!(summary.balance, rust_decimal::Decimal::from(600));
    }

    #[test]
    fn test_delete_waits_for_confirmation() {
        let (mut app, mut db) = session();
        open_festival(&mut app, &mut db);
        handle_command("expense 50 other Snacks", &mut app, &mut db);

        handle_command("delete", &mut app, &mut db);
        assert_eq!(app.input_mode, InputMode::Confirm);
        assert_eq!(app.expense_lines.len(), 1);

        let action = app.pending_action.take().unwrap();
        apply_pending(action, &mut app, &mut db).unwrap();
        assert!(app.expense_lines.is_empty());
    }

    #[test]
    fn test_cancelled_expense_rejects_edit() {
        let (mut app, mut db) = session();
        open_festival(&mut app, &mut db);
        handle_command("expense 50 other Snacks", &mut app, &mut db);
        handle_command("cancel", &mut app, &mut db);
        let action = app.pending_action.take().unwrap();
        apply_pending(action, &mut app, &mut db).unwrap();

        handle_command("edit 60 other Snacks", &mut app, &mut db);
        assert!(app.status_message.starts_with("Error:"));
        assert_eq!(
            app.expense_lines[0].status,
            crate::models::ExpenseStatus::Cancelled
        );
        assert_eq!(app.expense_hint(), "[Cancelled: no further actions] ");
    }

    #[test]
    fn test_expense_hint_lists_pending_actions() {
        let (mut app, mut db) = session();
        open_festival(&mut app, &mut db);
        assert_eq!(app.expense_hint(), "");

        handle_command("expense 400 materials Venue", &mut app, &mut db);
        let hint = app.expense_hint();
        assert!(hint.starts_with('[') && hint.ends_with("] "));
        for action in crate::models::ExpenseStatus::Pending.available_actions() {
            assert!(hint.contains(action.as_str()), "{hint} lacks {action:?}");
        }
    }

    #[test]
    fn test_every_command_has_description() {
        assert!(COMMANDS.values().all(|c| !c.description.is_empty()));
        for name in ["approve", "cancel", "delete", "edit", "notes", "post"] {
            assert!(COMMANDS.contains_key(name), "missing :{name}");
        }
    }
}
