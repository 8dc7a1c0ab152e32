// 📒 Entry Model
// One ledger line (income or spending) with optional recurrence metadata

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// Canonical text format for every civil date the ledger reads or writes
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// ENTRY KIND
// ============================================================================

/// Which list an entry belongs to. Same shape, different semantic role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Income,
    Spending,
}

impl EntryKind {
    /// Lowercase name used in messages and file names
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Spending => "spending",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(EntryKind::Income),
            "spending" => Ok(EntryKind::Spending),
            _ => Err(LedgerError::UserInput(format!(
                "unknown entry type '{}', expected income or spending",
                s
            ))),
        }
    }
}

// ============================================================================
// RECURRENCE FREQUENCY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurrenceFrequency {
    #[default]
    None,
    Daily,
    Monthly,
    Yearly,
}

impl RecurrenceFrequency {
    /// Persisted token (exact, uppercase)
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceFrequency::None => "NONE",
            RecurrenceFrequency::Daily => "DAILY",
            RecurrenceFrequency::Monthly => "MONTHLY",
            RecurrenceFrequency::Yearly => "YEARLY",
        }
    }

    pub fn is_recurring(&self) -> bool {
        *self != RecurrenceFrequency::None
    }
}

impl fmt::Display for RecurrenceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact match only: `daily` is not `DAILY`.
impl FromStr for RecurrenceFrequency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(RecurrenceFrequency::None),
            "DAILY" => Ok(RecurrenceFrequency::Daily),
            "MONTHLY" => Ok(RecurrenceFrequency::Monthly),
            "YEARLY" => Ok(RecurrenceFrequency::Yearly),
            _ => Err(()),
        }
    }
}

// ============================================================================
// ENTRY
// ============================================================================

/// A single income or spending line.
///
/// `last_recurrence` is only meaningful when `frequency` is not `None`.
/// `day_of_recurrence` anchors monthly/yearly occurrences to a calendar day
/// and is clamped per month when an occurrence is materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    kind: EntryKind,
    amount: f64,
    description: String,
    date: NaiveDate,
    tag: String,
    frequency: RecurrenceFrequency,
    last_recurrence: Option<NaiveDate>,
    day_of_recurrence: u32,
}

impl Entry {
    /// Create an entry. The amount is rounded to 2 decimal places.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: EntryKind,
        amount: f64,
        description: impl Into<String>,
        date: NaiveDate,
        tag: impl Into<String>,
        frequency: RecurrenceFrequency,
        last_recurrence: Option<NaiveDate>,
        day_of_recurrence: u32,
    ) -> Self {
        Entry {
            kind,
            amount: round_to_cents(amount),
            description: description.into(),
            date,
            tag: tag.into(),
            frequency,
            last_recurrence,
            day_of_recurrence,
        }
    }

    /// Non-recurring entry anchored on its own day
    pub fn one_off(
        kind: EntryKind,
        amount: f64,
        description: impl Into<String>,
        date: NaiveDate,
        tag: impl Into<String>,
    ) -> Self {
        Entry::new(
            kind,
            amount,
            description,
            date,
            tag,
            RecurrenceFrequency::None,
            None,
            date.day(),
        )
    }

    /// Recurring entry whose first occurrence is `date` itself
    pub fn recurring(
        kind: EntryKind,
        amount: f64,
        description: impl Into<String>,
        date: NaiveDate,
        tag: impl Into<String>,
        frequency: RecurrenceFrequency,
    ) -> Self {
        let last_recurrence = frequency.is_recurring().then_some(date);
        Entry::new(
            kind,
            amount,
            description,
            date,
            tag,
            frequency,
            last_recurrence,
            date.day(),
        )
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn frequency(&self) -> RecurrenceFrequency {
        self.frequency
    }

    pub fn last_recurrence(&self) -> Option<NaiveDate> {
        self.last_recurrence
    }

    pub fn day_of_recurrence(&self) -> u32 {
        self.day_of_recurrence
    }

    pub fn is_recurring(&self) -> bool {
        self.frequency.is_recurring()
    }

    // ========================================================================
    // MUTATORS
    // ========================================================================

    pub fn set_amount(&mut self, amount: f64) {
        self.amount = round_to_cents(amount);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    pub(crate) fn set_last_recurrence(&mut self, date: NaiveDate) {
        self.last_recurrence = Some(date);
    }

    /// Concrete copy of this entry on `date`: same values, no recurrence.
    pub fn occurrence_on(&self, date: NaiveDate) -> Entry {
        Entry {
            kind: self.kind,
            amount: self.amount,
            description: self.description.clone(),
            date,
            tag: self.tag.clone(),
            frequency: RecurrenceFrequency::None,
            last_recurrence: None,
            day_of_recurrence: self.day_of_recurrence,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} - {}", self.description, self.amount, self.date)?;
        if !self.tag.is_empty() {
            write!(f, " - Tag: {}", self.tag)?;
        }
        if self.is_recurring() {
            write!(f, " - Recurring: {}", self.frequency)?;
        }
        Ok(())
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Round half away from zero to 2 decimal places.
/// Values too large to scale are already whole cents and pass through.
pub fn round_to_cents(amount: f64) -> f64 {
    let scaled = amount * 100.0;
    if !scaled.is_finite() {
        return amount;
    }
    scaled.round() / 100.0
}

/// Parse a user- or file-supplied amount: must be a number greater than 0.
/// Returns the value rounded to 2 decimal places.
pub fn format_amount(text: &str) -> Result<f64, AmountError> {
    let value: f64 = text.trim().parse().map_err(|_| AmountError::NotANumber)?;
    if !value.is_finite() {
        return Err(AmountError::NotANumber);
    }
    if value <= 0.0 {
        return Err(AmountError::NotPositive);
    }
    if !(value * 100.0).is_finite() {
        return Err(AmountError::TooLarge);
    }
    Ok(round_to_cents(value))
}

/// Why an amount was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    NotANumber,
    NotPositive,
    TooLarge,
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::NotANumber => f.write_str("amount must be a number"),
            AmountError::NotPositive => f.write_str("amount must be greater than 0"),
            AmountError::TooLarge => f.write_str("amount is too large"),
        }
    }
}

/// Parse a `YYYY-MM-DD` civil date
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}
