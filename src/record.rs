// 🧾 Record Validator
// Line format for persisted entries, parsed strictly left to right
//
// amount|description|date|tag|frequency|last_recurrence|day_of_recurrence
//
// Fields go through the `csv` crate with a `|` delimiter, so a delimiter or
// quote inside free text is quoted on write instead of shifting columns.

use chrono::NaiveDate;
use tracing::warn;

use crate::collection::Budgets;
use crate::entry::{format_amount, parse_date, Entry, EntryKind, RecurrenceFrequency, DATE_FORMAT};
use crate::error::{RecordField, ValidationError};

pub const FIELD_SEPARATOR: u8 = b'|';
pub const FIELD_COUNT: usize = 7;
pub const BUDGET_FIELD_COUNT: usize = 3;
/// Persisted stand-in for "no last-recurrence date"
pub const NO_RECURRENCE: &str = "null";

const AMOUNT_INDEX: usize = 0;
const DESCRIPTION_INDEX: usize = 1;
const DATE_INDEX: usize = 2;
const TAG_INDEX: usize = 3;
const FREQUENCY_INDEX: usize = 4;
const LAST_RECURRED_INDEX: usize = 5;
const DAY_OF_RECURRENCE_INDEX: usize = 6;

// ============================================================================
// LINE SPLITTING
// ============================================================================

/// Split one persisted line into its fields. An empty line has no fields.
pub fn split_line(line: &str) -> Result<Vec<String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(FIELD_SEPARATOR)
        .from_reader(line.as_bytes());

    let mut record = csv::StringRecord::new();
    if reader.read_record(&mut record)? {
        Ok(record.iter().map(str::to_string).collect())
    } else {
        Ok(Vec::new())
    }
}

/// Writer configured for the persisted format: `|` delimiter, `\n` endings,
/// variable field count (budget header has 3 fields, entries 7).
pub fn writer_builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .delimiter(FIELD_SEPARATOR)
        .terminator(csv::Terminator::Any(b'\n'));
    builder
}

// ============================================================================
// SERIALIZATION (inverse of the validator)
// ============================================================================

/// Fields of an entry in persisted order.
/// Line breaks in free text become spaces so one entry stays one line.
pub fn entry_fields(entry: &Entry) -> [String; FIELD_COUNT] {
    [
        entry.amount().to_string(),
        single_line(entry.description()),
        entry.date().format(DATE_FORMAT).to_string(),
        single_line(entry.tag()),
        entry.frequency().to_string(),
        entry
            .last_recurrence()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| NO_RECURRENCE.to_string()),
        entry.day_of_recurrence().to_string(),
    ]
}

pub fn budget_fields(budgets: &Budgets) -> [String; BUDGET_FIELD_COUNT] {
    [
        budgets.daily.to_string(),
        budgets.monthly.to_string(),
        budgets.yearly.to_string(),
    ]
}

/// Render one entry as a persisted line (without terminator)
pub fn format_entry(entry: &Entry) -> anyhow::Result<String> {
    let mut writer = writer_builder().from_writer(Vec::new());
    writer.write_record(entry_fields(entry))?;
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    let line = String::from_utf8(bytes)?;
    Ok(line.trim_end_matches('\n').to_string())
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Parse the spending file's header line. `None` if malformed.
pub fn parse_budgets(line: &str) -> Option<Budgets> {
    let fields = split_line(line).ok()?;
    if fields.len() != BUDGET_FIELD_COUNT {
        return None;
    }
    let parse = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0);
    Some(Budgets {
        daily: parse(&fields[0])?,
        monthly: parse(&fields[1])?,
        yearly: parse(&fields[2])?,
    })
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// Rebuilds entries of one kind from persisted lines.
/// The first invalid field decides the reported cause.
#[derive(Debug, Clone, Copy)]
pub struct RecordValidator {
    kind: EntryKind,
}

impl RecordValidator {
    pub fn new(kind: EntryKind) -> Self {
        RecordValidator { kind }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn parse(&self, line: &str) -> Result<Entry, ValidationError> {
        let fields = split_line(line).map_err(|_| self.corrupted_count())?;
        if fields.len() != FIELD_COUNT {
            return Err(self.corrupted_count());
        }
        let field = |index: usize| fields.get(index).map(String::as_str);

        let amount = self.parse_amount(field(AMOUNT_INDEX))?;
        let description = self.validate_description(field(DESCRIPTION_INDEX))?;
        let date = self.parse_date(field(DATE_INDEX))?;
        let tag = self.validate_tag(field(TAG_INDEX))?;
        let frequency = self.parse_frequency(field(FREQUENCY_INDEX))?;
        let last_recurrence = self.parse_last_recurrence(field(LAST_RECURRED_INDEX), frequency)?;
        let day_of_recurrence = self.parse_day_of_recurrence(field(DAY_OF_RECURRENCE_INDEX))?;

        Ok(Entry::new(
            self.kind,
            amount,
            description,
            date,
            tag,
            frequency,
            last_recurrence,
            day_of_recurrence,
        ))
    }

    /// Parse a raw line as read from disk. Invalid UTF-8 rejects only this line.
    pub fn parse_bytes(&self, line: &[u8]) -> Result<Entry, ValidationError> {
        let line = std::str::from_utf8(line)
            .map_err(|_| self.corrupted(RecordField::Encoding, "text encoding!"))?;
        self.parse(line)
    }

    fn corrupted(&self, field: RecordField, detail: &str) -> ValidationError {
        let err = ValidationError::field(self.kind, field, detail);
        warn!(kind = %self.kind, field = field.name(), "{}", err.message);
        err
    }

    fn corrupted_count(&self) -> ValidationError {
        let err = ValidationError::field_count(self.kind, FIELD_COUNT);
        warn!(kind = %self.kind, field = RecordField::FieldCount.name(), "{}", err.message);
        err
    }

    fn parse_amount(&self, text: Option<&str>) -> Result<f64, ValidationError> {
        text.and_then(|t| format_amount(t).ok())
            .ok_or_else(|| self.corrupted(RecordField::Amount, "amount!"))
    }

    fn validate_description<'a>(&self, text: Option<&'a str>) -> Result<&'a str, ValidationError> {
        text.filter(|t| !t.is_empty())
            .ok_or_else(|| self.corrupted(RecordField::Description, "description!"))
    }

    fn parse_date(&self, text: Option<&str>) -> Result<NaiveDate, ValidationError> {
        text.and_then(parse_date)
            .ok_or_else(|| self.corrupted(RecordField::Date, "date!"))
    }

    fn validate_tag<'a>(&self, text: Option<&'a str>) -> Result<&'a str, ValidationError> {
        text.ok_or_else(|| self.corrupted(RecordField::Tag, "tag!"))
    }

    fn parse_frequency(&self, text: Option<&str>) -> Result<RecurrenceFrequency, ValidationError> {
        text.and_then(|t| t.parse().ok())
            .ok_or_else(|| self.corrupted(RecordField::Frequency, "recurrence frequency!"))
    }

    fn parse_last_recurrence(
        &self,
        text: Option<&str>,
        frequency: RecurrenceFrequency,
    ) -> Result<Option<NaiveDate>, ValidationError> {
        let last_recurrence = match text {
            None | Some(NO_RECURRENCE) => None,
            Some(t) => Some(
                parse_date(t)
                    .ok_or_else(|| self.corrupted(RecordField::LastRecurrence, "last recurred date!"))?,
            ),
        };

        if frequency.is_recurring() && last_recurrence.is_none() {
            return Err(self.corrupted(RecordField::LastRecurrence, "last recurred date!"));
        }
        Ok(last_recurrence)
    }

    fn parse_day_of_recurrence(&self, text: Option<&str>) -> Result<u32, ValidationError> {
        let day: i64 = text
            .and_then(|t| t.trim().parse().ok())
            .ok_or_else(|| self.corrupted(RecordField::DayOfRecurrence, "day of recurrence!"))?;

        if !(1..=31).contains(&day) {
            return Err(self.corrupted(
                RecordField::DayOfRecurrence,
                "day of recurrence between 1 and 31!",
            ));
        }
        Ok(day as u32)
    }
}
