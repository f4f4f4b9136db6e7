use log::{info, warn};
use std::{collections::BTreeMap, fmt, ops::Deref, path::PathBuf};

use crate::config::EngineConfig;
use crate::course::{Catalog, Course, CourseTable};
use crate::error::{Error, Result};
use crate::interval::{overlaps, TimeRange};
use crate::score::{score, to_day_ranges};
use crate::session::Choice;

/// One choice per requested course.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Selection {
    // code -> choice
    choices: BTreeMap<String, Choice>,
}

impl Selection {
    pub fn new() -> Selection {
        Selection::default()
    }

    pub fn insert(&mut self, code: String, choice: Choice) {
        self.choices.insert(code, choice);
    }

    /// The legacy `group * 10 + subgroup` form, as used in timetable URLs.
    pub fn packed(&self) -> BTreeMap<String, u32> {
        self.choices
            .iter()
            .map(|(code, choice)| (code.clone(), choice.packed()))
            .collect()
    }
}

impl Deref for Selection {
    type Target = BTreeMap<String, Choice>;

    fn deref(&self) -> &Self::Target {
        &self.choices
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .choices
            .iter()
            .map(|(code, choice)| format!("{} {}", code, choice))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ScoredTimetable {
    pub selection: Selection,
    pub score: i64,
}

pub struct Scheduler {
    catalog: Catalog,
    config: EngineConfig,
}

impl Scheduler {
    pub fn new(catalog: Catalog, config: EngineConfig) -> Scheduler {
        Scheduler { catalog, config }
    }

    pub fn load(file_path: PathBuf, config: EngineConfig) -> Result<Scheduler> {
        let table = CourseTable::load(file_path)?;
        let catalog = Catalog::try_from(&table)?;
        Ok(Scheduler { catalog, config })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_prefer_mornings(&mut self, prefer_mornings: bool) {
        self.config.prefer_mornings = prefer_mornings;
    }

    /// Every selection of the requested courses with no two sessions
    /// overlapping. A course missing from the catalog makes the result empty.
    pub fn enumerate(&self, codes: &[&str]) -> Result<Vec<Selection>> {
        let mut requested: Vec<&str> = Vec::new();
        for code in codes.iter().map(|c| c.trim()) {
            if !requested.contains(&code) {
                requested.push(code);
            }
        }

        let mut courses: Vec<&Course> = Vec::with_capacity(requested.len());
        for code in requested.iter() {
            match self.catalog.get(*code) {
                Some(course) => courses.push(course),
                None => {
                    warn!("course {} has no sessions, no timetable is possible", code);
                    return Ok(Vec::new());
                }
            }
        }

        // fewest alternatives first so conflicts prune near the root
        courses.sort_by_key(|course| course.choices().len());

        let mut search = Search {
            courses,
            committed: Vec::new(),
            partial: Vec::new(),
            solutions: Vec::new(),
            nodes: 0,
            node_limit: self.config.node_limit,
        };
        search.visit(0)?;

        info!(
            "found {} timetables for {:?} ({} nodes)",
            search.solutions.len(),
            requested,
            search.nodes
        );
        Ok(search.solutions)
    }

    /// Score every selection and sort them, best (lowest) first. Ties keep
    /// their enumeration order.
    pub fn rank(&self, selections: Vec<Selection>) -> Vec<ScoredTimetable> {
        let mut scored: Vec<ScoredTimetable> = selections
            .into_iter()
            .map(|selection| {
                let days = to_day_ranges(&selection, &self.catalog);
                let score = score(&days, self.config.prefer_mornings, &self.config.weights);
                ScoredTimetable { selection, score }
            })
            .collect();
        scored.sort_by_key(|timetable| timetable.score);
        scored
    }

    pub fn rank_timetables(&self, codes: &[&str]) -> Result<Vec<ScoredTimetable>> {
        Ok(self.rank(self.enumerate(codes)?))
    }

    /// The best timetable, or `None` when the courses cannot be combined.
    pub fn best(&self, codes: &[&str]) -> Result<Option<ScoredTimetable>> {
        Ok(self.rank_timetables(codes)?.into_iter().next())
    }
}

/// Depth-first search state. `committed` and `partial` grow on the way down
/// and are cut back to their previous length on the way up.
struct Search<'a> {
    courses: Vec<&'a Course>,
    committed: Vec<TimeRange>,
    partial: Vec<Choice>,
    solutions: Vec<Selection>,
    nodes: u64,
    node_limit: Option<u64>,
}

impl<'a> Search<'a> {
    fn visit(&mut self, depth: usize) -> Result<()> {
        self.nodes += 1;
        if let Some(limit) = self.node_limit {
            if self.nodes > limit {
                return Err(Error::SearchAborted { limit });
            }
        }

        if depth == self.courses.len() {
            let mut selection = Selection::new();
            for (course, choice) in self.courses.iter().zip(self.partial.iter()) {
                selection.insert(course.code().to_string(), *choice);
            }
            self.solutions.push(selection);
            return Ok(());
        }

        let course: &'a Course = self.courses[depth];
        for (&group, slot) in course.iter() {
            if overlaps(&self.committed, slot.time()) {
                continue;
            }

            let mark = self.committed.len();
            self.committed.extend_from_slice(slot.time());
            let result = if slot.has_subgroups() {
                self.visit_subgroups(depth, group, slot.subgroups())
            } else {
                self.descend(depth, Choice::Group(group))
            };
            self.committed.truncate(mark);
            result?;
        }
        Ok(())
    }

    fn visit_subgroups(
        &mut self,
        depth: usize,
        group: u32,
        subgroups: &'a BTreeMap<u32, Vec<TimeRange>>,
    ) -> Result<()> {
        for (&subgroup, ranges) in subgroups.iter() {
            if overlaps(&self.committed, ranges) {
                continue;
            }

            let mark = self.committed.len();
            self.committed.extend_from_slice(ranges);
            let result = self.descend(depth, Choice::Subgroup(group, subgroup));
            self.committed.truncate(mark);
            result?;
        }
        Ok(())
    }

    fn descend(&mut self, depth: usize, choice: Choice) -> Result<()> {
        self.partial.push(choice);
        let result = self.visit(depth + 1);
        self.partial.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionRecord;

    fn scheduler(records: &[SessionRecord]) -> Scheduler {
        Scheduler::new(
            Catalog::from_records(records).unwrap(),
            EngineConfig::default(),
        )
    }

    fn two_by_two() -> Vec<SessionRecord> {
        vec![
            SessionRecord::new("A", 10, 0, "08:00", 60),
            SessionRecord::new("A", 20, 1, "08:00", 60),
            SessionRecord::new("B", 10, 2, "08:00", 60),
            SessionRecord::new("B", 20, 3, "08:00", 60),
        ]
    }

    #[test]
    fn test_enumerates_cartesian_product() {
        let selections = scheduler(&two_by_two()).enumerate(&["A", "B"]).unwrap();
        assert_eq!(selections.len(), 4);
    }

    #[test]
    fn test_conflict_removes_combinations() {
        let mut records = two_by_two();
        // B group 1 now collides with A group 1
        records[2] = SessionRecord::new("B", 10, 0, "08:30", 60);
        let selections = scheduler(&records).enumerate(&["A", "B"]).unwrap();
        assert_eq!(selections.len(), 3);
        assert!(!selections
            .iter()
            .any(|s| s["A"] == Choice::Group(1) && s["B"] == Choice::Group(1)));
    }

    #[test]
    fn test_subgroups_are_alternatives() {
        let records = vec![
            SessionRecord::new("A", 10, 0, "08:00", 60),
            SessionRecord::new("A", 11, 0, "09:00", 60),
            SessionRecord::new("A", 12, 0, "10:00", 60),
            SessionRecord::new("A", 13, 0, "08:30", 60),
            SessionRecord::new("B", 10, 0, "10:00", 60),
        ];
        let selections = scheduler(&records).enumerate(&["A", "B"]).unwrap();
        // subgroup 2 collides with B, subgroup 3 with its own group time
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0]["A"], Choice::Subgroup(1, 1));
        assert_eq!(selections[0]["B"], Choice::Group(1));
    }

    #[test]
    fn test_empty_request_yields_empty_selection() {
        let scheduler = scheduler(&two_by_two());
        let selections = scheduler.enumerate(&[]).unwrap();
        assert_eq!(selections, vec![Selection::new()]);

        let best = scheduler.best(&[]).unwrap().unwrap();
        assert_eq!(best.score, 0);
        assert!(best.selection.is_empty());

        let empty = Scheduler::new(Catalog::new(), EngineConfig::default());
        assert_eq!(empty.enumerate(&[]).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_course_yields_nothing() {
        let scheduler = scheduler(&two_by_two());
        assert!(scheduler.enumerate(&["A", "Z"]).unwrap().is_empty());
        assert!(scheduler.best(&["A", "Z"]).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_codes_are_requested_once() {
        let selections = scheduler(&two_by_two()).enumerate(&["A", " A", "B"]).unwrap();
        assert_eq!(selections.len(), 4);
        assert!(selections.iter().all(|s| s.len() == 2));
    }

    #[test]
    fn test_node_limit_aborts() {
        let mut scheduler = scheduler(&two_by_two());
        scheduler.config.node_limit = Some(3);
        assert!(matches!(
            scheduler.enumerate(&["A", "B"]),
            Err(Error::SearchAborted { limit: 3 })
        ));

        // root + 2 + 4 nodes
        scheduler.config.node_limit = Some(7);
        assert_eq!(scheduler.enumerate(&["A", "B"]).unwrap().len(), 4);
    }

    #[test]
    fn test_rank_is_ascending_and_stable() {
        let records = vec![
            SessionRecord::new("A", 10, 0, "08:00", 60),
            SessionRecord::new("A", 20, 0, "11:00", 60),
            SessionRecord::new("A", 30, 1, "08:00", 60),
            SessionRecord::new("B", 10, 0, "09:00", 60),
        ];
        let scheduler = scheduler(&records);
        let ranked = scheduler.rank_timetables(&["A", "B"]).unwrap();
        let scores: Vec<i64> = ranked.iter().map(|t| t.score).collect();
        // A1 packed next to B: 120; A3 on another day: 120; A2 one hour after B: 120 + 4*60
        assert_eq!(scores, vec![120, 120, 360]);
        assert_eq!(ranked[0].selection["A"], Choice::Group(1));
        assert_eq!(ranked[1].selection["A"], Choice::Group(3));
        assert_eq!(ranked[2].selection["A"], Choice::Group(2));
    }

    #[test]
    fn test_selection_packed_and_display() {
        let mut selection = Selection::new();
        selection.insert("PRO1".to_string(), Choice::Subgroup(1, 2));
        selection.insert("F".to_string(), Choice::Group(4));
        assert_eq!(selection.packed()["PRO1"], 12);
        assert_eq!(selection.packed()["F"], 40);
        assert_eq!(selection.to_string(), "{F 4, PRO1 1.2}");
    }
}
