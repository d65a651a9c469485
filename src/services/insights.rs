//! Derived rollups over the in-memory journal.
//!
//! Everything here is a pure function of the entry list and "today"; the
//! handler recomputes on each request.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::models::journal::{JournalEntry, Mood};

/// Column labels for `weekly_activity`, Sunday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["S", "M", "T", "W", "T", "F", "S"];

const RECENT_ENTRIES: usize = 5;

#[derive(Debug, Serialize)]
pub struct MoodCount {
    pub mood: Mood,
    pub count: u32,
}

#[derive(Debug, Serialize)]
pub struct InsightsSummary {
    pub current_streak: u32,
    pub total_entries: usize,
    pub week_start: NaiveDate,
    pub weekly_activity: [u32; 7],
    pub weekday_labels: [&'static str; 7],
    pub mood_breakdown: Vec<MoodCount>,
    pub recent_entries: Vec<JournalEntry>,
}

/// Consecutive days with at least one entry, anchored on the latest entry.
///
/// Returns 0 when the latest entry is neither today nor yesterday.
pub fn current_streak<I>(dates: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let days: BTreeSet<NaiveDate> = dates.into_iter().collect();
    let Some(&latest) = days.iter().next_back() else {
        return 0;
    };

    let yesterday = today - Duration::days(1);
    if latest != today && latest != yesterday {
        return 0;
    }

    let mut streak = 0;
    let mut check_date = latest;
    while days.contains(&check_date) {
        streak += 1;
        check_date -= Duration::days(1);
    }
    streak
}

/// Sunday of the calendar week containing `today`.
pub fn start_of_week(today: NaiveDate) -> NaiveDate {
    today - Duration::days(today.weekday().num_days_from_sunday() as i64)
}

/// Entry counts for the current week, Sunday through Saturday.
pub fn weekly_activity<I>(dates: I, today: NaiveDate) -> [u32; 7]
where
    I: IntoIterator<Item = NaiveDate>,
{
    let week_start = start_of_week(today);
    let mut activity = [0u32; 7];

    for date in dates {
        let offset = (date - week_start).num_days();
        if (0..7).contains(&offset) {
            activity[offset as usize] += 1;
        }
    }

    activity
}

pub fn mood_breakdown(entries: &[JournalEntry]) -> Vec<MoodCount> {
    Mood::ALL
        .into_iter()
        .map(|mood| MoodCount {
            mood,
            count: entries.iter().filter(|e| e.mood == mood).count() as u32,
        })
        .collect()
}

/// `entries` must be newest first, as the journal store keeps them.
pub fn summarize(entries: &[JournalEntry], today: NaiveDate) -> InsightsSummary {
    let dates: Vec<NaiveDate> = entries.iter().map(JournalEntry::local_date).collect();

    InsightsSummary {
        current_streak: current_streak(dates.iter().copied(), today),
        total_entries: entries.len(),
        week_start: start_of_week(today),
        weekly_activity: weekly_activity(dates, today),
        weekday_labels: WEEKDAY_LABELS,
        mood_breakdown: mood_breakdown(entries),
        recent_entries: entries.iter().take(RECENT_ENTRIES).cloned().collect(),
    }
}
