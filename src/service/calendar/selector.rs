use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use super::{WeekBucket, WeekKey};

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorConfig {
    /// Also show the week immediately before the current one, when bucketed.
    pub show_last_week: bool,
}

/// The date week selection is anchored to.
///
/// On Saturday and Sunday the weekend already belongs to the upcoming week,
/// so the anchor advances seven days; weekdays anchor to themselves.
pub fn reference_date(today: NaiveDate) -> NaiveDate {
    match today.weekday() {
        Weekday::Sat | Weekday::Sun => today + Duration::days(7),
        _ => today,
    }
}

/// Weeks worth displaying, oldest first.
///
/// Fully past weeks (week end before the reference date) are dropped. The
/// returned keys sort chronologically by week start; callers typically
/// truncate to the first few for display.
pub fn selectable_weeks(
    weeks: &BTreeMap<WeekKey, WeekBucket>,
    today: NaiveDate,
    config: &SelectorConfig,
) -> Vec<WeekKey> {
    let reference = reference_date(today);

    // BTreeMap iterates in WeekKey order, which is chronological by week start.
    let mut keys: Vec<WeekKey> = weeks
        .keys()
        .copied()
        .filter(|key| key.week_end() >= reference)
        .collect();

    if config.show_last_week {
        let last_week = WeekKey::for_date(reference - Duration::days(7));
        if weeks.contains_key(&last_week) {
            keys.insert(0, last_week);
        }
    }

    keys
}
