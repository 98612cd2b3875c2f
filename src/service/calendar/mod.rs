use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use crate::models::EarningEntry;

pub mod render;
pub mod selector;

/// The five weekdays a bucket carries, in column order.
pub const WEEKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// ISO week number plus ISO year, the key a week bucket lives under.
///
/// Ordering is chronological by week start, never lexical: week 52/2024
/// sorts before week 1/2025.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekKey {
    pub iso_week: u32,
    pub iso_year: i32,
}

impl WeekKey {
    pub fn for_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            iso_week: iso.week(),
            iso_year: iso.year(),
        }
    }

    /// Monday of this ISO week/year.
    pub fn week_start(&self) -> NaiveDate {
        // Keys built through for_date always name a valid ISO week; an
        // out-of-range hand-built key collapses to the epoch floor.
        NaiveDate::from_isoywd_opt(self.iso_year, self.iso_week, Weekday::Mon)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Sunday of this ISO week/year (weekend inclusive).
    pub fn week_end(&self) -> NaiveDate {
        self.week_start() + Duration::days(6)
    }

    /// Friday of this ISO week/year, the last populated column.
    pub fn last_weekday(&self) -> NaiveDate {
        self.week_start() + Duration::days(4)
    }
}

impl Ord for WeekKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.week_start().cmp(&other.week_start())
    }
}

impl PartialOrd for WeekKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.iso_week, self.iso_year)
    }
}

/// One calendar week of earnings entries, keyed Monday..Friday.
///
/// The five weekday slots exist from construction; there is nowhere for a
/// weekend entry to land, which is how weekend drops happen by design.
#[derive(Debug, Clone, Default)]
pub struct WeekBucket {
    days: [Vec<EarningEntry>; 5],
}

impl WeekBucket {
    fn slot(weekday: Weekday) -> Option<usize> {
        match weekday {
            Weekday::Sat | Weekday::Sun => None,
            day => Some(day.num_days_from_monday() as usize),
        }
    }

    /// Entries for the given weekday, in insertion order. None for Sat/Sun.
    pub fn day(&self, weekday: Weekday) -> Option<&[EarningEntry]> {
        Self::slot(weekday).map(|idx| self.days[idx].as_slice())
    }

    /// Weekday columns in Monday..Friday order.
    pub fn iter_days(&self) -> impl Iterator<Item = (Weekday, &[EarningEntry])> {
        WEEKDAYS
            .iter()
            .zip(self.days.iter())
            .map(|(day, entries)| (*day, entries.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.days.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Vec::is_empty)
    }
}

/// Group a flat entry list into ISO-week buckets of weekday columns.
///
/// O(n) over the input. Saturday/Sunday entries are dropped (earnings are
/// not reported on market-closed days) and logged at debug level. Duplicate
/// (ticker, date) entries are kept; intra-day ordering is left as received,
/// session ordering is a render-time concern.
pub fn bucket_by_week(
    entries: impl IntoIterator<Item = EarningEntry>,
) -> BTreeMap<WeekKey, WeekBucket> {
    let mut weeks: BTreeMap<WeekKey, WeekBucket> = BTreeMap::new();

    for entry in entries {
        let Some(slot) = WeekBucket::slot(entry.earnings_date.weekday()) else {
            debug!(
                "Dropping weekend earnings entry {} on {}",
                entry.ticker, entry.earnings_date
            );
            continue;
        };

        weeks
            .entry(WeekKey::for_date(entry.earnings_date))
            .or_default()
            .days[slot]
            .push(entry);
    }

    weeks
}
