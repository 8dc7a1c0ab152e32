// Pocket Ledger - Core Library
// Income/spending entries, recurring catch-up and the persisted record format

pub mod collection;
pub mod commands;
pub mod config;
pub mod entry;
pub mod error;
pub mod prompt;
pub mod record;
pub mod recurrence;
pub mod storage;

// Re-export commonly used types
pub use collection::{BudgetPeriod, Budgets, EntryList, Ledger};
pub use config::{Config, ConfigError};
pub use entry::{Entry, EntryKind, RecurrenceFrequency};
pub use error::{LedgerError, RecordField, ValidationError};
pub use prompt::{ConfirmPrompt, ScriptedPrompt, TerminalPrompt};
pub use record::{format_entry, RecordValidator};
pub use recurrence::{Backlog, Clock, FixedClock, RecurrenceEngine, SystemClock};
pub use storage::{LoadReport, Storage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
