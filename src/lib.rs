//! Build a student's weekly timetable from class sessions.
//!
//! Sessions are grouped into a [`Catalog`] of course → group → subgroup
//! alternatives, every conflict-free combination is enumerated and the
//! combinations are ranked by [`score`](score::score); lower is better.
//!
//! ```rust,ignore
//! use coursefib::{best_timetable, EngineConfig, SessionRecord};
//!
//! let records = vec![
//!     SessionRecord::new("X", 10, 0, "09:00", 60),
//!     SessionRecord::new("Y", 10, 0, "10:00", 60),
//! ];
//! let best = best_timetable(&records, &["X", "Y"], &EngineConfig::default())?;
//! ```

pub mod config;
pub mod course;
pub mod error;
pub mod interval;
pub mod scheduler;
pub mod score;
pub mod serilize;
pub mod session;

pub use config::EngineConfig;
pub use course::{Catalog, Course, CourseTable, GroupSlot};
pub use error::{Error, Result};
pub use interval::{overlaps, TimeRange};
pub use scheduler::{Scheduler, ScoredTimetable, Selection};
pub use score::ScoreWeights;
pub use session::{records_from_api_json, records_from_json, Choice, SessionRecord};

/// Rank every conflict-free timetable for `courses`, best first.
///
/// Only records of the requested courses are read, so a malformed record of
/// another course does not fail the computation.
pub fn rank_timetables(
    records: &[SessionRecord],
    courses: &[&str],
    config: &EngineConfig,
) -> Result<Vec<ScoredTimetable>> {
    let wanted: Vec<SessionRecord> = records
        .iter()
        .filter(|record| courses.iter().any(|c| c.trim() == record.course.trim()))
        .cloned()
        .collect();
    let catalog = Catalog::from_records(&wanted)?;
    Scheduler::new(catalog, config.clone()).rank_timetables(courses)
}

/// The best timetable for `courses`, or `None` if they cannot be combined.
pub fn best_timetable(
    records: &[SessionRecord],
    courses: &[&str],
    config: &EngineConfig,
) -> Result<Option<Selection>> {
    Ok(rank_timetables(records, courses, config)?
        .into_iter()
        .next()
        .map(|timetable| timetable.selection))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn scenario() -> Vec<SessionRecord> {
        vec![
            SessionRecord::new("X", 10, 0, "09:00", 60),
            SessionRecord::new("X", 20, 0, "09:30", 60),
            SessionRecord::new("Y", 10, 0, "10:00", 60),
        ]
    }

    #[test]
    fn test_touching_group_is_chosen() {
        let config = EngineConfig::default();
        let ranked = rank_timetables(&scenario(), &["X", "Y"], &config).unwrap();
        assert_eq!(ranked.len(), 1);

        let best = best_timetable(&scenario(), &["X", "Y"], &config)
            .unwrap()
            .unwrap();
        let expected: BTreeMap<String, u32> =
            [("X".to_string(), 10), ("Y".to_string(), 10)].into_iter().collect();
        assert_eq!(best.packed(), expected);
    }

    #[test]
    fn test_empty_request() {
        let ranked = rank_timetables(&scenario(), &[], &EngineConfig::default()).unwrap();
        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].selection.is_empty());
        assert_eq!(ranked[0].score, 0);
    }

    #[test]
    fn test_no_feasible_timetable_is_not_an_error() {
        let records = vec![
            SessionRecord::new("X", 10, 0, "09:00", 60),
            SessionRecord::new("Y", 10, 0, "09:00", 60),
        ];
        let config = EngineConfig::default();
        assert_eq!(best_timetable(&records, &["X", "Y"], &config).unwrap(), None);
        assert_eq!(best_timetable(&records, &["X", "Z"], &config).unwrap(), None);
    }

    #[test]
    fn test_malformed_record_of_requested_course_fails() {
        let mut records = scenario();
        records.push(SessionRecord::new("Y", 20, 0, "ten", 60));
        records.push(SessionRecord::new("W", 10, 9, "10:00", 60));

        let config = EngineConfig::default();
        // W is never requested so its bad weekday is ignored
        assert!(best_timetable(&records, &["X"], &config).is_ok());
        assert!(matches!(
            best_timetable(&records, &["X", "Y"], &config),
            Err(Error::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_search_abort_is_distinct() {
        let config = EngineConfig::default().with_node_limit(Some(1));
        assert!(matches!(
            rank_timetables(&scenario(), &["X", "Y"], &config),
            Err(Error::SearchAborted { limit: 1 })
        ));
    }

    #[test]
    fn test_preference_changes_winner() {
        // X1: one long block, X2: two short blocks on different days
        let records = vec![
            SessionRecord::new("X", 10, 0, "08:00", 180),
            SessionRecord::new("X", 20, 1, "08:00", 60),
            SessionRecord::new("X", 20, 2, "08:00", 60),
        ];
        let mornings = EngineConfig::default();
        let afternoons = EngineConfig::default().with_prefer_mornings(false);

        let best = best_timetable(&records, &["X"], &mornings).unwrap().unwrap();
        assert_eq!(best["X"], Choice::Group(2));
        let best = best_timetable(&records, &["X"], &afternoons).unwrap().unwrap();
        assert_eq!(best["X"], Choice::Group(1));
    }

    #[test]
    fn test_zero_length_group_is_still_a_choice() {
        let records = vec![SessionRecord::new("X", 10, 0, "09:00", 0)];
        let best = best_timetable(&records, &["X"], &EngineConfig::default())
            .unwrap()
            .unwrap();
        let expected: BTreeMap<String, u32> = [("X".to_string(), 10)].into_iter().collect();
        assert_eq!(best.packed(), expected);
    }
}
