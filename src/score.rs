//! Turning a selection back into a week and rating how pleasant it is.

use crate::course::Catalog;
use crate::interval::{TimeRange, DAYS_PER_WEEK, MINUTES_PER_DAY};
use crate::scheduler::Selection;

/// Seven lists (Monday first) of `(start, end)` minutes of day, sorted by start.
pub type DayRanges = Vec<Vec<(u32, u32)>>;

/// Weights of the schedule heuristic. Lower scores are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Applied to every session's length term.
    pub duration: i64,
    /// Applied to every idle minute between two sessions of the same day.
    pub gap: i64,
    /// Subtracted once per day without sessions.
    pub free_day: i64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            duration: 1,
            gap: 4,
            free_day: 0,
        }
    }
}

/// All sessions attended under `selection`. Choices the catalog does not
/// know about contribute nothing.
pub fn expand(selection: &Selection, catalog: &Catalog) -> Vec<TimeRange> {
    selection
        .iter()
        .filter_map(|(code, &choice)| catalog.get_ranges(code, choice))
        .flatten()
        .collect()
}

pub fn to_day_ranges(selection: &Selection, catalog: &Catalog) -> DayRanges {
    let mut days: DayRanges = vec![Vec::new(); DAYS_PER_WEEK as usize];
    for range in expand(selection, catalog) {
        days[range.day() as usize].push(range.minutes_of_day());
    }
    for day in days.iter_mut() {
        day.sort_by_key(|&(start, _)| start);
    }
    days
}

pub fn score(days: &DayRanges, prefer_mornings: bool, weights: &ScoreWeights) -> i64 {
    let mut total = 0;
    for day in days {
        if day.is_empty() {
            total -= weights.free_day;
            continue;
        }

        let mut last_end: Option<u32> = None;
        for &(start, end) in day {
            let length = i64::from(end - start);
            total += if prefer_mornings {
                weights.duration * length
            } else {
                weights.duration * (i64::from(MINUTES_PER_DAY) - length)
            };

            if let Some(last_end) = last_end {
                total += weights.gap * (i64::from(start) - i64::from(last_end));
            }
            last_end = Some(end);
        }
    }
    total
}
