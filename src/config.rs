//! Runtime configuration read from the environment.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::workflow::ApprovalGate;

pub(crate) const SECRET_VAR: &str = "EVENTBUDGET_APPROVAL_SECRET";
pub(crate) const DB_VAR: &str = "EVENTBUDGET_DB";
pub(crate) const LOG_VAR: &str = "EVENTBUDGET_LOG";

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) db_path: PathBuf,
    pub(crate) log_path: PathBuf,
    /// `None` lets each front end pick its own default level.
    pub(crate) log_filter: Option<String>,
    pub(crate) gate: ApprovalGate,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        let data_dir = data_dir()?;
        Ok(Self::from_vars(|key| std::env::var(key).ok(), data_dir))
    }

    /// Builds a config from an arbitrary variable lookup. `data_dir` holds the
    /// database and log file unless the database path is overridden.
    pub(crate) fn from_vars(var: impl Fn(&str) -> Option<String>, data_dir: PathBuf) -> Self {
        let db_path = var(DB_VAR)
            .filter(|p| !p.trim().is_empty())
            .map(|p| PathBuf::from(expand_home(p.trim())))
            .unwrap_or_else(|| data_dir.join("eventbudget.db"));

        let log_filter = var(LOG_VAR)
            .or_else(|| var("RUST_LOG"))
            .filter(|f| !f.trim().is_empty());

        Self {
            db_path,
            log_path: data_dir.join("eventbudget.log"),
            log_filter,
            gate: ApprovalGate::new(var(SECRET_VAR)),
        }
    }
}

fn data_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("org", "eventbudget", "EventBudget")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.to_path_buf())
}

pub(crate) fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
