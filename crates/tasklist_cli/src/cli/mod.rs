use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tasklist_core::config::ConfigOverrides;
use tasklist_core::error::AppError;
use tasklist_core::model::{Filter, Priority};

#[derive(Parser, Debug)]
#[command(name = "tasklist", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: tasklist add "Buy milk" --priority high
    Add {
        text: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
    },
    /// Delete a task
    ///
    /// Example: tasklist delete 3f2a
    Delete { id: String },
    /// Mark a task completed, or active again
    ///
    /// Example: tasklist toggle 3f2a
    Toggle { id: String },
    /// Edit a task's text
    ///
    /// Example: tasklist edit 3f2a "Buy oat milk"
    Edit { id: String, new_text: String },
    /// Change a task's priority
    ///
    /// Example: tasklist priority 3f2a low
    Priority { id: String, priority: Priority },
    /// Remove every completed task
    ClearCompleted,
    /// Remove every task
    ///
    /// Example: tasklist clear-all --yes
    ClearAll {
        /// Confirm removing all tasks
        #[arg(long)]
        yes: bool,
    },
    /// List tasks
    ///
    /// Example: tasklist list --filter active --search milk
    List {
        #[arg(long)]
        filter: Option<Filter>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show task statistics
    Stats,
    /// Set the list filter for this session (all, active, completed)
    ///
    /// Interactive sessions only; one-shot runs use `list --filter`.
    Filter { filter: Filter },
    /// Set the search term for this session; no term clears it
    ///
    /// Interactive sessions only; one-shot runs use `list --search`.
    Search { term: Option<String> },
    /// Write all tasks to a JSON backup file
    ///
    /// Example: tasklist export
    /// Example: tasklist export --output backup.json
    /// Example: tasklist export --output - (prints to stdout)
    Export {
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Merge tasks from a JSON backup file in front of the current list
    ///
    /// Example: tasklist import todo-backup-2025-12-20.json
    Import { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    StoreDir,
    DefaultFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "store_dir" | "store" => ConfigOverrideTarget::StoreDir,
        "filter" | "default_filter" => ConfigOverrideTarget::DefaultFilter,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::StoreDir => overrides.store_dir = Some(parsed.value),
            ConfigOverrideTarget::DefaultFilter => {
                overrides.default_filter = Some(parsed.value.parse()?)
            }
        }
    }
    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
