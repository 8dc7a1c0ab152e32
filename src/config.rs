//! Runtime configuration.
//!
//! Configuration can be set via environment variables:
//! - `POCKET_LEDGER_DIR` - Optional. Directory holding `incomes.txt` and `spendings.txt`. Defaults to current directory.
//! - `POCKET_LEDGER_TODAY` - Optional. Pin "today" (`YYYY-MM-DD`) instead of the system date.
//! - `POCKET_LEDGER_ASSUME_YES` - Optional. `1`/`true` answers the backlog prompt with yes.
//!
//! Command-line flags override the environment.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::entry::parse_date;
use crate::recurrence::{Clock, SystemClock};

pub const INCOMES_FILE: &str = "incomes.txt";
pub const SPENDINGS_FILE: &str = "spendings.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the ledger files
    pub data_dir: PathBuf,

    /// Pinned "today"; `None` uses the system date
    pub today: Option<NaiveDate>,

    /// Skip the interactive backlog prompt and accept
    pub assume_yes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            today: None,
            assume_yes: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(dir) = lookup("POCKET_LEDGER_DIR").filter(|d| !d.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(today) = lookup("POCKET_LEDGER_TODAY").filter(|d| !d.is_empty()) {
            config.today = Some(parse_today("POCKET_LEDGER_TODAY", &today)?);
        }

        if let Some(flag) = lookup("POCKET_LEDGER_ASSUME_YES") {
            config.assume_yes = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "" | "0" | "false" | "no" => false,
                other => {
                    return Err(ConfigError::InvalidValue(
                        "POCKET_LEDGER_ASSUME_YES".to_string(),
                        other.to_string(),
                    ))
                }
            };
        }

        Ok(config)
    }

    pub fn income_path(&self) -> PathBuf {
        self.data_dir.join(INCOMES_FILE)
    }

    pub fn spending_path(&self) -> PathBuf {
        self.data_dir.join(SPENDINGS_FILE)
    }

    /// Effective "today": the pinned date or the system date
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| SystemClock.today())
    }
}

/// Parse a `YYYY-MM-DD` override, naming the source in the error
pub fn parse_today(source: &str, value: &str) -> Result<NaiveDate, ConfigError> {
    parse_date(value).ok_or_else(|| ConfigError::InvalidValue(source.to_string(), value.to_string()))
}
