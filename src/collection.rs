// 🗂️ Entry Collections
// Insertion-ordered income/spending lists plus the application state that owns them

use serde::{Deserialize, Serialize};

use crate::entry::{Entry, EntryKind};
use crate::error::LedgerError;

// ============================================================================
// BUDGETS
// ============================================================================

/// Spending thresholds. Not interpreted by the recurrence engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Budgets {
    pub daily: f64,
    pub monthly: f64,
    pub yearly: f64,
}

/// Which budget threshold a command targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetPeriod {
    Daily,
    Monthly,
    Yearly,
}

impl std::str::FromStr for BudgetPeriod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(BudgetPeriod::Daily),
            "monthly" => Ok(BudgetPeriod::Monthly),
            "yearly" => Ok(BudgetPeriod::Yearly),
            _ => Err(LedgerError::UserInput(format!(
                "unknown budget period '{}', expected daily, monthly or yearly",
                s
            ))),
        }
    }
}

impl Budgets {
    pub fn set(&mut self, period: BudgetPeriod, amount: f64) {
        match period {
            BudgetPeriod::Daily => self.daily = amount,
            BudgetPeriod::Monthly => self.monthly = amount,
            BudgetPeriod::Yearly => self.yearly = amount,
        }
    }
}

// ============================================================================
// ENTRY LIST
// ============================================================================

/// Ordered list of entries of one kind. Index order is display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryList {
    kind: EntryKind,
    entries: Vec<Entry>,
    budgets: Budgets,
}

impl EntryList {
    pub fn new(kind: EntryKind) -> Self {
        EntryList {
            kind,
            entries: Vec::new(),
            budgets: Budgets::default(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn push(&mut self, entry: Entry) {
        debug_assert_eq!(entry.kind(), self.kind, "entry kind must match list kind");
        self.entries.push(entry);
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entry> {
        self.entries.get_mut(index)
    }

    /// Remove by 0-based position
    pub fn remove(&mut self, index: usize) -> Result<Entry, LedgerError> {
        if index >= self.entries.len() {
            return Err(LedgerError::UserInput("Invalid index".to_string()));
        }
        Ok(self.entries.remove(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn total(&self) -> f64 {
        crate::entry::round_to_cents(self.entries.iter().map(Entry::amount).sum())
    }

    pub fn budgets(&self) -> &Budgets {
        &self.budgets
    }

    pub fn budgets_mut(&mut self) -> &mut Budgets {
        &mut self.budgets
    }
}

impl<'a> IntoIterator for &'a EntryList {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// LEDGER (application state)
// ============================================================================

/// Both lists, constructed once at start-up and passed down explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub incomes: EntryList,
    pub spendings: EntryList,
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            incomes: EntryList::new(EntryKind::Income),
            spendings: EntryList::new(EntryKind::Spending),
        }
    }

    pub fn list(&self, kind: EntryKind) -> &EntryList {
        match kind {
            EntryKind::Income => &self.incomes,
            EntryKind::Spending => &self.spendings,
        }
    }

    pub fn list_mut(&mut self, kind: EntryKind) -> &mut EntryList {
        match kind {
            EntryKind::Income => &mut self.incomes,
            EntryKind::Spending => &mut self.spendings,
        }
    }
}
