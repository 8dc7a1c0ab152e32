// 🔁 Recurrence Engine
// Materializes missed occurrences of recurring entries up to "today"
//
// One catch-up algorithm, parameterized by a per-frequency step function:
//   DAILY   → next day
//   MONTHLY → same anchor day next month (clamped to month length)
//   YEARLY  → same month and anchor day next year (Feb 29 → Feb 28)

use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, info};

use crate::collection::EntryList;
use crate::entry::{Entry, RecurrenceFrequency};
use crate::prompt::ConfirmPrompt;

pub const BACKLOG_QUESTION: &str =
    "Some recurring entries were missed since they last recurred. Add them now?";

// ============================================================================
// CLOCK
// ============================================================================

/// Source of "today". Injected so catch-up is deterministic under test.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Pinned date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

// ============================================================================
// CALENDAR STEPS
// ============================================================================

/// `next(date, day_of_recurrence)`; `None` only past chrono's date range
pub type StepFn = fn(NaiveDate, u32) -> Option<NaiveDate>;

pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// `anchor` clamped to the length of the given month
fn anchored(year: i32, month: u32, anchor: u32) -> Option<NaiveDate> {
    let day = anchor.clamp(1, last_day_of_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

fn next_day(date: NaiveDate, _anchor: u32) -> Option<NaiveDate> {
    date.succ_opt()
}

fn next_month(date: NaiveDate, anchor: u32) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    anchored(year, month, anchor)
}

fn next_year(date: NaiveDate, anchor: u32) -> Option<NaiveDate> {
    anchored(date.year() + 1, date.month(), anchor)
}

/// Step function for a frequency; `None` for non-recurring entries
pub fn step_for(frequency: RecurrenceFrequency) -> Option<StepFn> {
    match frequency {
        RecurrenceFrequency::None => None,
        RecurrenceFrequency::Daily => Some(next_day as StepFn),
        RecurrenceFrequency::Monthly => Some(next_month as StepFn),
        RecurrenceFrequency::Yearly => Some(next_year as StepFn),
    }
}

/// Whether `last` already covers `today` at the frequency's granularity
pub fn is_current(frequency: RecurrenceFrequency, last: NaiveDate, today: NaiveDate) -> bool {
    match frequency {
        RecurrenceFrequency::None => true,
        RecurrenceFrequency::Daily => last >= today,
        RecurrenceFrequency::Monthly => (last.year(), last.month()) >= (today.year(), today.month()),
        RecurrenceFrequency::Yearly => last.year() >= today.year(),
    }
}

// ============================================================================
// BACKLOG
// ============================================================================

/// Occurrences a recurring entry owes, and where its bookkeeping lands afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Backlog {
    pub occurrences: Vec<Entry>,
    pub last_recurrence: NaiveDate,
}

impl Backlog {
    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct RecurrenceEngine<C: Clock = SystemClock> {
    clock: C,
}

impl Default for RecurrenceEngine<SystemClock> {
    fn default() -> Self {
        RecurrenceEngine::new(SystemClock)
    }
}

impl<C: Clock> RecurrenceEngine<C> {
    pub fn new(clock: C) -> Self {
        RecurrenceEngine { clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Compute the backlog for `entry` without touching anything.
    ///
    /// Returns `None` when the entry does not recur, is already current, or its
    /// next occurrence is still in the future.
    pub fn plan(&self, entry: &Entry) -> Option<Backlog> {
        let step = step_for(entry.frequency())?;
        let last = entry.last_recurrence()?;
        let today = self.today();

        if is_current(entry.frequency(), last, today) {
            return None;
        }

        let anchor = entry.day_of_recurrence();
        let mut occurrences = Vec::new();
        let mut last_produced = None;
        let mut candidate = step(last, anchor);

        while let Some(date) = candidate.filter(|d| *d <= today) {
            occurrences.push(entry.occurrence_on(date));
            last_produced = Some(date);
            candidate = step(date, anchor);
        }

        last_produced.map(|last_recurrence| Backlog {
            occurrences,
            last_recurrence,
        })
    }

    /// Load-time catch-up for the entry at `index`. No confirmation.
    /// Returns how many occurrences were appended.
    pub fn catch_up(&self, list: &mut EntryList, index: usize) -> usize {
        match list.get(index).and_then(|entry| self.plan(entry)) {
            Some(backlog) => apply(list, index, backlog),
            None => 0,
        }
    }

    /// Interactive catch-up for the entry at `index`.
    ///
    /// Asks once before materializing anything; a "no" leaves the entry and
    /// the list untouched.
    pub fn check_backlog(
        &self,
        list: &mut EntryList,
        index: usize,
        prompt: &mut dyn ConfirmPrompt,
    ) -> usize {
        let Some(backlog) = list.get(index).and_then(|entry| self.plan(entry)) else {
            return 0;
        };

        if !prompt.confirm(BACKLOG_QUESTION) {
            info!(
                kind = %list.kind(),
                index,
                pending = backlog.len(),
                "backlog declined"
            );
            return 0;
        }

        apply(list, index, backlog)
    }

    /// Run load-time catch-up over every recurring entry already in the list.
    /// Occurrences appended during the pass are not revisited.
    pub fn catch_up_all(&self, list: &mut EntryList) -> usize {
        let existing = list.len();
        let mut added = 0;
        for index in 0..existing {
            added += self.catch_up(list, index);
        }
        if added > 0 {
            info!(kind = %list.kind(), added, "recurring entries caught up");
        }
        added
    }
}

fn apply(list: &mut EntryList, index: usize, backlog: Backlog) -> usize {
    let count = backlog.len();
    for occurrence in backlog.occurrences {
        debug!(
            kind = %occurrence.kind(),
            date = %occurrence.date(),
            description = occurrence.description(),
            "materialized occurrence"
        );
        list.push(occurrence);
    }
    if let Some(entry) = list.get_mut(index) {
        entry.set_last_recurrence(backlog.last_recurrence);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;
    use crate::prompt::ScriptedPrompt;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn engine_at(today: NaiveDate) -> RecurrenceEngine<FixedClock> {
        RecurrenceEngine::new(FixedClock(today))
    }

    /// Recurring spending whose last occurrence is `last`
    fn create_test_entry(
        frequency: RecurrenceFrequency,
        last: NaiveDate,
        day_of_recurrence: u32,
    ) -> Entry {
        Entry::new(
            EntryKind::Spending,
            10.0,
            "food",
            last,
            "",
            frequency,
            Some(last),
            day_of_recurrence,
        )
    }

    fn list_with(entry: Entry) -> EntryList {
        let mut list = EntryList::new(EntryKind::Spending);
        list.push(entry);
        list
    }

    fn dates(list: &EntryList) -> Vec<NaiveDate> {
        list.iter().skip(1).map(Entry::date).collect()
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(2024, 2), 29);
        assert_eq!(last_day_of_month(2023, 2), 28);
        assert_eq!(last_day_of_month(2100, 2), 28);
        assert_eq!(last_day_of_month(2024, 4), 30);
        assert_eq!(last_day_of_month(2024, 12), 31);
    }

    #[test]
    fn test_steps_clamp_without_drift() {
        let monthly = step_for(RecurrenceFrequency::Monthly).unwrap();
        assert_eq!(monthly(date(2024, 1, 31), 31), Some(date(2024, 2, 29)));
        assert_eq!(monthly(date(2024, 2, 29), 31), Some(date(2024, 3, 31)));
        assert_eq!(monthly(date(2024, 12, 15), 15), Some(date(2025, 1, 15)));

        let yearly = step_for(RecurrenceFrequency::Yearly).unwrap();
        assert_eq!(yearly(date(2020, 2, 29), 29), Some(date(2021, 2, 28)));
        assert_eq!(yearly(date(2023, 2, 28), 29), Some(date(2024, 2, 29)));

        let daily = step_for(RecurrenceFrequency::Daily).unwrap();
        assert_eq!(daily(date(2024, 1, 31), 31), Some(date(2024, 2, 1)));

        assert!(step_for(RecurrenceFrequency::None).is_none());
    }

    #[test]
    fn test_daily_scenario() {
        let mut list = list_with(create_test_entry(
            RecurrenceFrequency::Daily,
            date(2024, 1, 31),
            31,
        ));
        let engine = engine_at(date(2024, 2, 2));
        let mut prompt = ScriptedPrompt::new(["y"]);

        let added = engine.check_backlog(&mut list, 0, &mut prompt);

        assert_eq!(added, 2);
        assert_eq!(dates(&list), vec![date(2024, 2, 1), date(2024, 2, 2)]);
        assert_eq!(list.get(0).unwrap().last_recurrence(), Some(date(2024, 2, 2)));
        assert_eq!(list.get(0).unwrap().date(), date(2024, 1, 31));
        assert_eq!(prompt.asked(), 1);
    }

    #[test]
    fn test_daily_exact_backlog_count() {
        let start = date(2023, 12, 20);
        for k in 1..=40u64 {
            let today = start + chrono::Days::new(k);
            let mut list = list_with(create_test_entry(RecurrenceFrequency::Daily, start, 20));
            let added = engine_at(today).catch_up(&mut list, 0);

            assert_eq!(added as u64, k);
            let expected: Vec<_> = (1..=k).map(|i| start + chrono::Days::new(i)).collect();
            assert_eq!(dates(&list), expected);
            assert_eq!(list.get(0).unwrap().last_recurrence(), Some(today));
        }
    }

    #[test]
    fn test_monthly_clamps_short_months() {
        let mut list = list_with(create_test_entry(
            RecurrenceFrequency::Monthly,
            date(2024, 1, 31),
            31,
        ));
        let added = engine_at(date(2024, 4, 1)).catch_up(&mut list, 0);

        assert_eq!(added, 2);
        assert_eq!(dates(&list), vec![date(2024, 2, 29), date(2024, 3, 31)]);
        assert_eq!(list.get(0).unwrap().last_recurrence(), Some(date(2024, 3, 31)));
    }

    #[test]
    fn test_monthly_clamps_non_leap_february() {
        let mut list = list_with(create_test_entry(
            RecurrenceFrequency::Monthly,
            date(2023, 1, 31),
            31,
        ));
        engine_at(date(2023, 5, 31)).catch_up(&mut list, 0);

        assert_eq!(
            dates(&list),
            vec![
                date(2023, 2, 28),
                date(2023, 3, 31),
                date(2023, 4, 30),
                date(2023, 5, 31),
            ]
        );
    }

    #[test]
    fn test_yearly_leap_anchor() {
        let mut list = list_with(create_test_entry(
            RecurrenceFrequency::Yearly,
            date(2020, 2, 29),
            29,
        ));
        let added = engine_at(date(2024, 3, 1)).catch_up(&mut list, 0);

        assert_eq!(added, 4);
        assert_eq!(
            dates(&list),
            vec![
                date(2021, 2, 28),
                date(2022, 2, 28),
                date(2023, 2, 28),
                date(2024, 2, 29),
            ]
        );
        assert_eq!(list.get(0).unwrap().last_recurrence(), Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_current_period_is_noop() {
        let cases = [
            (RecurrenceFrequency::Daily, date(2024, 5, 20), date(2024, 5, 20)),
            (RecurrenceFrequency::Monthly, date(2024, 5, 1), date(2024, 5, 20)),
            (RecurrenceFrequency::Yearly, date(2024, 1, 15), date(2024, 12, 31)),
        ];

        for (frequency, last, today) in cases {
            let original = create_test_entry(frequency, last, last.day());
            let mut list = list_with(original.clone());
            let engine = engine_at(today);
            let mut prompt = ScriptedPrompt::always(true);

            assert_eq!(engine.catch_up(&mut list, 0), 0);
            assert_eq!(engine.check_backlog(&mut list, 0, &mut prompt), 0);
            assert_eq!(list.len(), 1);
            assert_eq!(list.get(0).unwrap(), &original);
            assert_eq!(prompt.asked(), 0);
        }
    }

    #[test]
    fn test_next_candidate_in_future_is_noop() {
        // April 30th anchor, today is mid-May: May 30th not reached yet
        let original = create_test_entry(RecurrenceFrequency::Monthly, date(2024, 4, 30), 30);
        let mut list = list_with(original.clone());
        let mut prompt = ScriptedPrompt::always(true);

        let added = engine_at(date(2024, 5, 18)).check_backlog(&mut list, 0, &mut prompt);

        assert_eq!(added, 0);
        assert_eq!(list.get(0).unwrap(), &original);
        assert_eq!(prompt.asked(), 0);
    }

    #[test]
    fn test_decline_leaves_state_untouched() {
        let original = create_test_entry(RecurrenceFrequency::Daily, date(2024, 3, 1), 1);
        let mut list = list_with(original.clone());
        let mut prompt = ScriptedPrompt::new(["n"]);

        let added = engine_at(date(2024, 3, 4)).check_backlog(&mut list, 0, &mut prompt);

        assert_eq!(added, 0);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap(), &original);
        assert_eq!(prompt.asked(), 1);
    }

    #[test]
    fn test_never_materializes_future_dates() {
        let today = date(2024, 2, 10);
        let starts = [date(2019, 1, 31), date(2023, 8, 29), date(2024, 1, 30)];
        let frequencies = [
            RecurrenceFrequency::Daily,
            RecurrenceFrequency::Monthly,
            RecurrenceFrequency::Yearly,
        ];

        for start in starts {
            for frequency in frequencies {
                let mut list = list_with(create_test_entry(frequency, start, start.day()));
                engine_at(today).catch_up(&mut list, 0);
                assert!(list.iter().all(|e| e.date() <= today));
                let last = list.get(0).unwrap().last_recurrence().unwrap();
                assert!(last <= today);
            }
        }
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let mut list = list_with(create_test_entry(
            RecurrenceFrequency::Monthly,
            date(2023, 11, 15),
            15,
        ));
        let engine = engine_at(date(2024, 2, 20));

        assert_eq!(engine.catch_up_all(&mut list), 3);
        assert_eq!(engine.catch_up_all(&mut list), 0);
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_catch_up_all_skips_non_recurring() {
        let mut list = EntryList::new(EntryKind::Spending);
        list.push(Entry::one_off(EntryKind::Spending, 5.0, "coffee", date(2024, 1, 1), ""));
        list.push(create_test_entry(RecurrenceFrequency::Daily, date(2024, 1, 1), 1));

        let added = engine_at(date(2024, 1, 3)).catch_up_all(&mut list);

        assert_eq!(added, 2);
        assert_eq!(list.len(), 4);
        assert!(list.iter().skip(2).all(|e| !e.is_recurring()));
    }
}
