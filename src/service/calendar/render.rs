//! Plain-text week grid, the fallback rendering surface.

use crate::models::EarningEntry;
use crate::service::favorites::FavoriteSet;

use super::{WeekBucket, WeekKey};

/// Entries of one day in display order: pre-market first, then after-close,
/// then TBA. Stable within a session, so feed order is preserved.
pub fn ordered_for_display(entries: &[EarningEntry]) -> Vec<&EarningEntry> {
    let mut ordered: Vec<&EarningEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.market_session.display_rank());
    ordered
}

/// "May 6 - May 10, 2024" style heading for a week (Monday through Friday).
pub fn week_title(key: WeekKey) -> String {
    let start = key.week_start();
    let end = key.last_weekday();
    format!(
        "{} - {}",
        start.format("%b %-d"),
        end.format("%b %-d, %Y")
    )
}

/// Render one week as a titled grid of weekday columns.
///
/// A ticker is starred when it is in the active favorite set or the feed
/// already joined it server-side (`isStarred`).
pub fn format_week(key: WeekKey, bucket: &WeekBucket, favorites: &FavoriteSet) -> String {
    let mut lines = Vec::new();
    lines.push(week_title(key));

    for (weekday, entries) in bucket.iter_days() {
        let date = key.week_start()
            + chrono::Duration::days(i64::from(weekday.num_days_from_monday()));
        lines.push(format!("  {} {}", weekday_name(weekday), date.format("%m/%d")));

        if entries.is_empty() {
            lines.push("    (no reports)".to_string());
            continue;
        }

        for entry in ordered_for_display(entries) {
            let starred = favorites.contains(&entry.ticker) || entry.is_starred == Some(true);
            let marker = if starred { "*" } else { " " };
            lines.push(format!(
                "    {} {} ({})",
                marker,
                entry.ticker,
                entry.market_session.short_label()
            ));
        }
    }

    lines.join("\n")
}

fn weekday_name(weekday: chrono::Weekday) -> &'static str {
    match weekday {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}
