// ⌨️ Commands
// User-facing operations on the ledger: add, edit, delete, budget, list, tags

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::collection::{BudgetPeriod, EntryList, Ledger};
use crate::entry::{format_amount, parse_date, Entry, EntryKind, RecurrenceFrequency};
use crate::error::LedgerError;
use crate::prompt::ConfirmPrompt;
use crate::recurrence::{Clock, RecurrenceEngine};

// ============================================================================
// ARGUMENT PARSING
// ============================================================================

/// 1-based index from user text → 0-based position
pub fn parse_index(text: &str) -> Result<usize, LedgerError> {
    let index: i64 = text
        .trim()
        .parse()
        .map_err(|_| LedgerError::UserInput("Please input an integer as index.".to_string()))?;
    if index < 1 {
        return Err(LedgerError::UserInput("Invalid index".to_string()));
    }
    Ok(index as usize - 1)
}

pub fn parse_amount_arg(text: &str) -> Result<f64, LedgerError> {
    format_amount(text).map_err(|e| LedgerError::UserInput(format!("Invalid amount '{}': {}", text, e)))
}

pub fn parse_date_arg(text: &str) -> Result<NaiveDate, LedgerError> {
    parse_date(text).ok_or_else(|| {
        LedgerError::UserInput(format!("Invalid date '{}', expected YYYY-MM-DD", text))
    })
}

/// `daily`, `monthly` or `yearly` (case-insensitive)
pub fn parse_frequency_arg(text: &str) -> Result<RecurrenceFrequency, LedgerError> {
    text.to_uppercase()
        .parse::<RecurrenceFrequency>()
        .ok()
        .filter(|f| f.is_recurring())
        .ok_or_else(|| {
            LedgerError::UserInput(format!(
                "Invalid recurrence '{}', expected daily, monthly or yearly",
                text
            ))
        })
}

// ============================================================================
// ADD
// ============================================================================

#[derive(Debug, Clone)]
pub struct AddRequest {
    pub kind: EntryKind,
    pub amount: f64,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub tag: String,
    pub recurrence: Option<RecurrenceFrequency>,
}

/// Append a new entry. A recurring entry dated in the past goes through the
/// backlog prompt. Returns how many backlog occurrences were added.
pub fn add_entry<C: Clock>(
    ledger: &mut Ledger,
    engine: &RecurrenceEngine<C>,
    prompt: &mut dyn ConfirmPrompt,
    request: AddRequest,
) -> Result<usize, LedgerError> {
    if request.description.trim().is_empty() {
        return Err(LedgerError::UserInput("Description cannot be empty".to_string()));
    }
    let amount = crate::entry::round_to_cents(request.amount);
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::UserInput("Invalid amount".to_string()));
    }

    let date = request.date.unwrap_or_else(|| engine.today());
    let entry = match request.recurrence {
        Some(frequency) => Entry::recurring(request.kind, amount, request.description, date, request.tag, frequency),
        None => Entry::one_off(request.kind, amount, request.description, date, request.tag),
    };

    let list = ledger.list_mut(request.kind);
    list.push(entry);
    let index = list.len() - 1;
    Ok(engine.check_backlog(list, index, prompt))
}

// ============================================================================
// EDIT / DELETE / BUDGET
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Amount,
    Description,
    Tag,
}

impl std::str::FromStr for EditField {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "amount" => Ok(EditField::Amount),
            "description" => Ok(EditField::Description),
            "tag" => Ok(EditField::Tag),
            _ => Err(LedgerError::UserInput(format!(
                "Cannot edit '{}', expected amount, description or tag",
                s
            ))),
        }
    }
}

pub fn edit_entry(
    ledger: &mut Ledger,
    kind: EntryKind,
    index_text: &str,
    field: EditField,
    value: &str,
) -> Result<(), LedgerError> {
    let index = parse_index(index_text)?;
    let entry = ledger
        .list_mut(kind)
        .get_mut(index)
        .ok_or_else(|| LedgerError::UserInput("Invalid index".to_string()))?;

    match field {
        EditField::Amount => entry.set_amount(parse_amount_arg(value)?),
        EditField::Description => {
            if value.trim().is_empty() {
                return Err(LedgerError::UserInput("Description cannot be empty".to_string()));
            }
            entry.set_description(value)
        }
        EditField::Tag => entry.set_tag(value),
    }
    Ok(())
}

pub fn delete_entry(ledger: &mut Ledger, kind: EntryKind, index_text: &str) -> Result<Entry, LedgerError> {
    let index = parse_index(index_text)?;
    ledger.list_mut(kind).remove(index)
}

pub fn set_budget(ledger: &mut Ledger, period: BudgetPeriod, amount_text: &str) -> Result<(), LedgerError> {
    let amount = parse_amount_arg(amount_text)?;
    ledger.spendings.budgets_mut().set(period, amount);
    Ok(())
}

// ============================================================================
// LIST
// ============================================================================

fn heading(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Income => "Incomes",
        EntryKind::Spending => "Spendings",
    }
}

/// Tab-indented listing with 1-based indexes and a total line
pub fn render_list(list: &EntryList) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\t{}", heading(list.kind()));
    for (i, entry) in list.iter().enumerate() {
        let _ = writeln!(out, "\t{}. {}", i + 1, entry);
    }
    let _ = writeln!(out, "\tTotal {}: {}", heading(list.kind()).to_lowercase(), list.total());
    out
}

#[derive(Serialize)]
struct ListJson<'a> {
    kind: EntryKind,
    total: f64,
    entries: &'a [Entry],
}

pub fn render_json(lists: &[&EntryList]) -> serde_json::Result<String> {
    let payload: Vec<ListJson> = lists
        .iter()
        .map(|list| ListJson {
            kind: list.kind(),
            total: list.total(),
            entries: list.entries(),
        })
        .collect();
    serde_json::to_string_pretty(&payload)
}

// ============================================================================
// TAGS
// ============================================================================

/// Distinct non-empty tags across both lists, sorted
pub fn tags(ledger: &Ledger) -> BTreeSet<&str> {
    [&ledger.spendings, &ledger.incomes]
        .into_iter()
        .flat_map(|list| list.iter())
        .map(Entry::tag)
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Entries carrying `tag`, with their 1-based index in their own list
fn tagged<'a>(list: &'a EntryList, tag: &str) -> Vec<(usize, &'a Entry)> {
    list.iter()
        .enumerate()
        .filter(|(_, entry)| entry.tag() == tag)
        .map(|(i, entry)| (i + 1, entry))
        .collect()
}

/// Tagged entries grouped by tag. `only` restricts the listing to one tag.
pub fn render_tags(ledger: &Ledger, only: Option<&str>) -> Result<String, LedgerError> {
    let selected: Vec<&str> = match only {
        Some(tag) if tags(ledger).contains(tag) => vec![tag],
        Some(tag) => return Err(LedgerError::UserInput(format!("No entries tagged '{}'", tag))),
        None => tags(ledger).into_iter().collect(),
    };

    let mut out = String::new();
    if selected.is_empty() {
        let _ = writeln!(out, "	No tagged entries");
        return Ok(out);
    }
    for tag in selected {
        let _ = writeln!(out, "	Tag: {}", tag);
        for list in [&ledger.spendings, &ledger.incomes] {
            let entries = tagged(list, tag);
            if entries.is_empty() {
                continue;
            }
            let _ = writeln!(out, "	{}", heading(list.kind()));
            for (index, entry) in entries {
                let _ = writeln!(out, "	{}. {}", index, entry);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use crate::recurrence::FixedClock;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(kind: EntryKind, date: Option<NaiveDate>, recurrence: Option<RecurrenceFrequency>) -> AddRequest {
        AddRequest {
            kind,
            amount: 10.0,
            description: "food".to_string(),
            date,
            tag: String::new(),
            recurrence,
        }
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("1").unwrap(), 0);
        assert_eq!(parse_index(" 3 ").unwrap(), 2);
        assert!(matches!(parse_index("0"), Err(LedgerError::UserInput(_))));
        let err = parse_index("one").unwrap_err();
        assert_eq!(err.to_string(), "Please input an integer as index.");
    }

    #[test]
    fn test_parse_frequency_arg() {
        assert_eq!(parse_frequency_arg("monthly").unwrap(), RecurrenceFrequency::Monthly);
        assert!(parse_frequency_arg("none").is_err());
        assert!(parse_frequency_arg("weekly").is_err());
    }

    #[test]
    fn test_add_defaults_to_today() {
        let mut ledger = Ledger::new();
        let engine = RecurrenceEngine::new(FixedClock(date(2024, 2, 2)));
        let mut prompt = ScriptedPrompt::always(true);

        let added = add_entry(&mut ledger, &engine, &mut prompt, request(EntryKind::Spending, None, None)).unwrap();

        assert_eq!(added, 0);
        assert_eq!(ledger.spendings.get(0).unwrap().date(), date(2024, 2, 2));
        assert_eq!(prompt.asked(), 0);
    }

    #[test]
    fn test_add_past_recurring_asks_for_backlog() {
        let mut ledger = Ledger::new();
        let engine = RecurrenceEngine::new(FixedClock(date(2024, 2, 2)));
        let mut prompt = ScriptedPrompt::new(["y"]);

        let added = add_entry(
            &mut ledger,
            &engine,
            &mut prompt,
            request(EntryKind::Spending, Some(date(2024, 1, 31)), Some(RecurrenceFrequency::Daily)),
        )
        .unwrap();

        assert_eq!(added, 2);
        assert_eq!(ledger.spendings.len(), 3);
        assert_eq!(prompt.asked(), 1);
    }

    #[test]
    fn test_add_past_recurring_declined() {
        let mut ledger = Ledger::new();
        let engine = RecurrenceEngine::new(FixedClock(date(2024, 2, 2)));
        let mut prompt = ScriptedPrompt::new(["n"]);

        let added = add_entry(
            &mut ledger,
            &engine,
            &mut prompt,
            request(EntryKind::Income, Some(date(2024, 2, 1)), Some(RecurrenceFrequency::Daily)),
        )
        .unwrap();

        assert_eq!(added, 0);
        assert_eq!(ledger.incomes.len(), 1);
        assert_eq!(ledger.incomes.get(0).unwrap().last_recurrence(), Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_edit_and_delete() {
        let mut ledger = Ledger::new();
        ledger.spendings.push(Entry::one_off(EntryKind::Spending, 5.0, "bus", date(2024, 1, 1), ""));

        edit_entry(&mut ledger, EntryKind::Spending, "1", EditField::Amount, "6.789").unwrap();
        edit_entry(&mut ledger, EntryKind::Spending, "1", EditField::Tag, "travel").unwrap();
        let entry = ledger.spendings.get(0).unwrap();
        assert_eq!(entry.amount(), 6.79);
        assert_eq!(entry.tag(), "travel");

        assert!(edit_entry(&mut ledger, EntryKind::Spending, "2", EditField::Tag, "x").is_err());
        assert!(delete_entry(&mut ledger, EntryKind::Spending, "2").is_err());
        assert!(delete_entry(&mut ledger, EntryKind::Spending, "1").is_ok());
        assert!(ledger.spendings.is_empty());
    }

    #[test]
    fn test_set_budget() {
        let mut ledger = Ledger::new();
        set_budget(&mut ledger, BudgetPeriod::Yearly, "1200").unwrap();
        assert_eq!(ledger.spendings.budgets().yearly, 1200.0);
        assert!(set_budget(&mut ledger, BudgetPeriod::Daily, "-1").is_err());
    }

    #[test]
    fn test_render_list() {
        let mut list = EntryList::new(EntryKind::Spending);
        list.push(Entry::recurring(
            EntryKind::Spending,
            10.0,
            "food",
            date(2024, 2, 1),
            "",
            RecurrenceFrequency::Daily,
        ));
        list.push(Entry::one_off(EntryKind::Spending, 10.0, "food", date(2024, 2, 2), ""));

        assert_eq!(
            render_list(&list),
            "\tSpendings\n\
             \t1. food - 10 - 2024-02-01 - Recurring: DAILY\n\
             \t2. food - 10 - 2024-02-02\n\
             \tTotal spendings: 20\n"
        );
    }

    #[test]
    fn test_render_json() {
        let mut list = EntryList::new(EntryKind::Income);
        list.push(Entry::one_off(EntryKind::Income, 2.5, "tip", date(2024, 2, 2), ""));

        let json = render_json(&[&list]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["kind"], "Income");
        assert_eq!(value[0]["total"], 2.5);
        assert_eq!(value[0]["entries"][0]["frequency"], "NONE");
        assert_eq!(value[0]["entries"][0]["date"], "2024-02-02");
    }

    fn create_test_tagged_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.spendings.push(Entry::one_off(EntryKind::Spending, 12.0, "lunch", date(2024, 2, 1), "food"));
        ledger.spendings.push(Entry::one_off(EntryKind::Spending, 3.0, "bus", date(2024, 2, 1), ""));
        ledger.spendings.push(Entry::one_off(EntryKind::Spending, 40.0, "groceries", date(2024, 2, 3), "food"));
        ledger.incomes.push(Entry::one_off(EntryKind::Income, 100.0, "freelance", date(2024, 2, 4), "work"));
        ledger.incomes.push(Entry::one_off(EntryKind::Income, 20.0, "cookie sale", date(2024, 2, 5), "food"));
        ledger
    }

    #[test]
    fn test_tags_are_distinct_and_sorted() {
        let ledger = create_test_tagged_ledger();
        let found: Vec<&str> = tags(&ledger).into_iter().collect();
        assert_eq!(found, vec!["food", "work"]);
    }

    #[test]
    fn test_render_tags_groups_by_tag() {
        let ledger = create_test_tagged_ledger();

        assert_eq!(
            render_tags(&ledger, None).unwrap(),
            "\tTag: food\n\
             \tSpendings\n\
             \t1. lunch - 12 - 2024-02-01 - Tag: food\n\
             \t3. groceries - 40 - 2024-02-03 - Tag: food\n\
             \tIncomes\n\
             \t2. cookie sale - 20 - 2024-02-05 - Tag: food\n\
             \tTag: work\n\
             \tIncomes\n\
             \t1. freelance - 100 - 2024-02-04 - Tag: work\n"
        );
    }

    #[test]
    fn test_render_single_tag() {
        let ledger = create_test_tagged_ledger();

        let out = render_tags(&ledger, Some("work")).unwrap();
        assert!(out.starts_with("\tTag: work\n"));
        assert!(!out.contains("food"));

        let err = render_tags(&ledger, Some("travel")).unwrap_err();
        assert!(matches!(err, LedgerError::UserInput(_)));
        assert_eq!(render_tags(&Ledger::new(), None).unwrap(), "\tNo tagged entries\n");
    }
}
