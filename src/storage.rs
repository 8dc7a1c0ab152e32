// 💾 Storage
// Loads and saves both lists as line-oriented text files
//
// spendings.txt: budget header line, then one entry per line
// incomes.txt:   one entry per line
//
// A corrupted line is reported and skipped; the rest of the file still loads.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::collection::{Budgets, EntryList, Ledger};
use crate::config::Config;
use crate::entry::EntryKind;
use crate::error::ValidationError;
use crate::record::{budget_fields, entry_fields, parse_budgets, writer_builder, RecordValidator};
use crate::recurrence::{Clock, RecurrenceEngine};

/// What happened while loading
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    /// Rejected lines, each carrying its 1-based entry number
    pub corrupted: Vec<ValidationError>,
    /// Kinds whose file was missing or empty
    pub first_run: Vec<EntryKind>,
    /// Spending header was malformed and budgets fell back to zero
    pub budgets_reset: bool,
    /// Occurrences appended by load-time catch-up
    pub caught_up: usize,
}

impl LoadReport {
    pub fn is_first_run(&self, kind: EntryKind) -> bool {
        self.first_run.contains(&kind)
    }
}

pub struct Storage {
    income_path: PathBuf,
    spending_path: PathBuf,
}

impl Storage {
    pub fn new(income_path: impl Into<PathBuf>, spending_path: impl Into<PathBuf>) -> Self {
        Storage {
            income_path: income_path.into(),
            spending_path: spending_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Storage::new(config.income_path(), config.spending_path())
    }

    pub fn path(&self, kind: EntryKind) -> &Path {
        match kind {
            EntryKind::Income => &self.income_path,
            EntryKind::Spending => &self.spending_path,
        }
    }

    // ========================================================================
    // LOAD
    // ========================================================================

    /// Load both files into `ledger`, then catch up recurring entries.
    pub fn load<C: Clock>(&self, ledger: &mut Ledger, engine: &RecurrenceEngine<C>) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        for kind in [EntryKind::Spending, EntryKind::Income] {
            self.load_list(ledger.list_mut(kind), &mut report)?;
        }

        report.caught_up =
            engine.catch_up_all(&mut ledger.spendings) + engine.catch_up_all(&mut ledger.incomes);

        Ok(report)
    }

    fn load_list(&self, list: &mut EntryList, report: &mut LoadReport) -> Result<()> {
        let kind = list.kind();
        let path = self.path(kind);
        info!(kind = %kind, path = %path.display(), "Starting to load entries");

        if is_missing_or_empty(path)? {
            info!(kind = %kind, "No saved entries, starting fresh");
            report.first_run.push(kind);
            return Ok(());
        }

        // Read bytes so one badly encoded line cannot fail the whole file
        let content = fs::read(path)
            .with_context(|| format!("Failed to read {} file: {}", kind, path.display()))?;
        let mut lines = split_lines(&content);

        if kind == EntryKind::Spending {
            let header = lines.next().unwrap_or_default();
            match std::str::from_utf8(header).ok().and_then(parse_budgets) {
                Some(budgets) => *list.budgets_mut() = budgets,
                None => {
                    warn!("Corrupted budget details found in spendings file");
                    *list.budgets_mut() = Budgets::default();
                    report.budgets_reset = true;
                }
            }
        }

        let validator = RecordValidator::new(kind);
        for (index, line) in lines.enumerate() {
            let entry_number = index + 1;
            match validator.parse_bytes(line) {
                Ok(entry) => {
                    list.push(entry);
                    report.loaded += 1;
                }
                Err(err) => {
                    let err = err.at_line(entry_number);
                    warn!(kind = %kind, line = entry_number, "Corrupted entry skipped: {}", err);
                    report.corrupted.push(err);
                }
            }
        }

        info!(kind = %kind, entries = list.len(), "Finished loading entries");
        Ok(())
    }

    // ========================================================================
    // SAVE
    // ========================================================================

    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        for list in [&ledger.spendings, &ledger.incomes] {
            self.save_list(list)?;
        }
        Ok(())
    }

    fn save_list(&self, list: &EntryList) -> Result<()> {
        let kind = list.kind();
        let path = self.path(kind);
        info!(kind = %kind, path = %path.display(), "Starting to save entries");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut writer = writer_builder()
            .from_path(path)
            .with_context(|| format!("Failed to open {} file: {}", kind, path.display()))?;

        if kind == EntryKind::Spending {
            writer.write_record(budget_fields(list.budgets()))?;
        }
        for entry in list {
            writer.write_record(entry_fields(entry))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write {} file: {}", kind, path.display()))?;

        info!(kind = %kind, entries = list.len(), "Finished saving entries");
        Ok(())
    }
}

/// Same line rules as `str::lines`: `\n` separated, optional `\r` before it,
/// no empty trailing line after a final newline.
fn split_lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    let content = content.strip_suffix(b"\n").unwrap_or(content);
    content
        .split(|byte| *byte == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

fn is_missing_or_empty(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len() == 0),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(err) => Err(err).with_context(|| format!("Failed to inspect {}", path.display())),
    }
}
