// 🚨 Error Taxonomy
// Corrupted persisted records and bad user input

use crate::entry::EntryKind;
use thiserror::Error;

// ============================================================================
// RECORD FIELDS
// ============================================================================

/// The field a corrupted record was rejected on.
/// Variants are in the order fields are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    /// Line is not valid UTF-8, so no field could be read
    Encoding,
    FieldCount,
    Amount,
    Description,
    Date,
    Tag,
    Frequency,
    LastRecurrence,
    DayOfRecurrence,
}

impl RecordField {
    pub fn name(&self) -> &'static str {
        match self {
            RecordField::Encoding => "text encoding",
            RecordField::FieldCount => "field count",
            RecordField::Amount => "amount",
            RecordField::Description => "description",
            RecordField::Date => "date",
            RecordField::Tag => "tag",
            RecordField::Frequency => "recurrence frequency",
            RecordField::LastRecurrence => "last recurred date",
            RecordField::DayOfRecurrence => "day of recurrence",
        }
    }
}

// ============================================================================
// VALIDATION ERROR
// ============================================================================

/// A persisted line that failed validation. Always attributed to exactly one field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", line_suffix(.line))]
pub struct ValidationError {
    pub kind: EntryKind,
    pub field: RecordField,
    pub message: String,
    /// 1-based entry line, when known
    pub line: Option<usize>,
}

impl ValidationError {
    /// "Corrupted <kind> entry detected, error with <detail>"
    pub fn field(kind: EntryKind, field: RecordField, detail: &str) -> Self {
        ValidationError {
            kind,
            field,
            message: format!("Corrupted {} entry detected, error with {}", kind, detail),
            line: None,
        }
    }

    pub fn field_count(kind: EntryKind, expected: usize) -> Self {
        ValidationError {
            kind,
            field: RecordField::FieldCount,
            message: format!(
                "Corrupted {} entry detected, supposed to have {} parameters!",
                kind, expected
            ),
            line: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|n| format!(" (entry {})", n)).unwrap_or_default()
}

// ============================================================================
// LEDGER ERROR
// ============================================================================

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    CorruptedRecord(#[from] ValidationError),

    /// Bad index, malformed numeric argument, unknown keyword
    #[error("{0}")]
    UserInput(String),
}
