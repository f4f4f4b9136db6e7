use crate::course::{Catalog, Course};
use crate::interval::{day_name, format_minutes, TimeRange};
use crate::scheduler::ScoredTimetable;

#[derive(serde::Serialize, Debug, PartialEq, Eq)]
pub struct Session {
    pub day: String,
    pub start: String,
    pub end: String,
}

impl From<&TimeRange> for Session {
    fn from(range: &TimeRange) -> Self {
        let (start, end) = range.minutes_of_day();
        Session {
            day: day_name(range.day()).to_string(),
            start: format_minutes(start),
            end: format_minutes(end),
        }
    }
}

fn sessions(ranges: &[TimeRange]) -> Vec<Session> {
    ranges.iter().map(Session::from).collect()
}

#[derive(serde::Serialize, Debug)]
pub struct ChoiceInfo {
    pub course: String,
    pub group: u32,
    pub subgroup: Option<u32>,
    pub packed: u32,
    pub sessions: Vec<Session>,
}

#[derive(serde::Serialize, Debug)]
pub struct TimetableInfo {
    pub score: i64,
    pub courses: Vec<ChoiceInfo>,
}

impl TimetableInfo {
    pub fn new(timetable: &ScoredTimetable, catalog: &Catalog) -> Self {
        let courses = timetable
            .selection
            .iter()
            .map(|(code, choice)| ChoiceInfo {
                course: code.clone(),
                group: choice.group(),
                subgroup: choice.subgroup(),
                packed: choice.packed(),
                sessions: catalog
                    .get_ranges(code, *choice)
                    .map(|ranges| sessions(&ranges))
                    .unwrap_or_default(),
            })
            .collect();

        TimetableInfo {
            score: timetable.score,
            courses,
        }
    }
}

#[derive(serde::Serialize, Debug)]
pub struct SubgroupInfo {
    pub subgroup: u32,
    pub sessions: Vec<Session>,
}

#[derive(serde::Serialize, Debug)]
pub struct GroupInfo {
    pub group: u32,
    pub sessions: Vec<Session>,
    pub subgroups: Vec<SubgroupInfo>,
}

#[derive(serde::Serialize, Debug)]
pub struct CourseInfo {
    pub code: String,
    pub groups: Vec<GroupInfo>,
}

impl From<&Course> for CourseInfo {
    fn from(course: &Course) -> Self {
        let groups = course
            .iter()
            .map(|(&group, slot)| GroupInfo {
                group,
                sessions: sessions(slot.time()),
                subgroups: slot
                    .subgroups()
                    .iter()
                    .map(|(&subgroup, ranges)| SubgroupInfo {
                        subgroup,
                        sessions: sessions(ranges),
                    })
                    .collect(),
            })
            .collect();

        CourseInfo {
            code: course.code().to_string(),
            groups,
        }
    }
}

#[derive(serde::Serialize, Debug)]
pub struct CourseList {
    pub courses: Vec<CourseInfo>,
}

impl From<&Catalog> for CourseList {
    fn from(catalog: &Catalog) -> Self {
        let mut courses = Vec::new();
        for course in catalog.values() {
            courses.push(CourseInfo::from(course));
        }

        CourseList { courses }
    }
}
