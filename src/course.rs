use log::{debug, warn};
use polars::{lazy::dsl::col, prelude::*};
use std::{
    clone,
    collections::{BTreeMap, BTreeSet},
    ops::Deref,
    path::PathBuf,
};

use crate::error::{Error, Result};
use crate::interval::{time_to_minutes, TimeRange, DAYS_PER_WEEK, MINUTES_PER_DAY};
use crate::session::{ApiClassRecord, Choice, SessionRecord};

pub const COURSE_COL: &str = "codi_assig";
pub const GROUP_COL: &str = "grup";
pub const WEEKDAY_COL: &str = "dia_setmana";
pub const START_COL: &str = "inici";
pub const DURATION_COL: &str = "durada";

/// Sessions of one main group: the ones everybody in the group attends and
/// the ones that depend on the chosen subgroup.
#[derive(Debug, serde::Serialize, clone::Clone, Default, PartialEq, Eq)]
pub struct GroupSlot {
    time: Vec<TimeRange>,
    // subgroup -> sessions
    subgroups: BTreeMap<u32, Vec<TimeRange>>,
}

impl GroupSlot {
    pub fn time(&self) -> &[TimeRange] {
        &self.time
    }

    pub fn subgroups(&self) -> &BTreeMap<u32, Vec<TimeRange>> {
        &self.subgroups
    }

    pub fn has_subgroups(&self) -> bool {
        !self.subgroups.is_empty()
    }

    fn add(&mut self, subgroup: Option<u32>, range: TimeRange) {
        match subgroup {
            None => self.time.push(range),
            Some(subgroup) => self.subgroups.entry(subgroup).or_default().push(range),
        }
    }

    fn register(&mut self, subgroup: Option<u32>) {
        if let Some(subgroup) = subgroup {
            self.subgroups.entry(subgroup).or_default();
        }
    }
}

#[derive(Debug, serde::Serialize, clone::Clone, PartialEq, Eq)]
pub struct Course {
    code: String,
    // group -> sessions
    groups: BTreeMap<u32, GroupSlot>,
}

impl Course {
    pub fn new(code: String) -> Course {
        Course {
            code,
            groups: BTreeMap::new(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn add_session(&mut self, choice: Choice, range: TimeRange) {
        self.groups
            .entry(choice.group())
            .or_default()
            .add(choice.subgroup(), range);
    }

    /// Make `choice` available without attaching any session to it.
    pub fn add_choice(&mut self, choice: Choice) {
        self.groups
            .entry(choice.group())
            .or_default()
            .register(choice.subgroup());
    }

    /// Every choice a student could make for this course.
    pub fn choices(&self) -> Vec<Choice> {
        let mut choices = Vec::new();
        for (&group, slot) in self.groups.iter() {
            if slot.has_subgroups() {
                choices.extend(slot.subgroups.keys().map(|&s| Choice::Subgroup(group, s)));
            } else {
                choices.push(Choice::Group(group));
            }
        }
        choices
    }

    /// Sessions attended when `choice` is picked, or `None` if the course
    /// has no such group or subgroup.
    pub fn ranges_for(&self, choice: Choice) -> Option<Vec<TimeRange>> {
        let slot = self.groups.get(&choice.group())?;
        let mut ranges = slot.time.clone();
        match choice.subgroup() {
            None if slot.has_subgroups() => return None,
            None => {}
            Some(subgroup) => ranges.extend(slot.subgroups.get(&subgroup)?),
        }
        Some(ranges)
    }
}

impl Deref for Course {
    type Target = BTreeMap<u32, GroupSlot>;

    fn deref(&self) -> &Self::Target {
        &self.groups
    }
}

/// Course code -> course. Built once per computation and only read afterwards.
#[derive(Debug, serde::Serialize, clone::Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    courses: BTreeMap<String, Course>,
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog::default()
    }

    pub fn from_records(records: &[SessionRecord]) -> Result<Catalog> {
        let mut catalog = Catalog::new();
        for (index, record) in records.iter().enumerate() {
            catalog.add_record(index, record)?;
        }
        debug!(
            "built catalog with {} courses from {} sessions",
            catalog.len(),
            records.len()
        );
        Ok(catalog)
    }

    /// Decode one record and accumulate its time range. `index` is only used
    /// to point at the offending record in errors.
    pub fn add_record(&mut self, index: usize, record: &SessionRecord) -> Result<()> {
        let code = record.course.trim();
        if code.is_empty() {
            return Err(Error::malformed(index, "empty course code"));
        }

        let choice = Choice::parse(&record.group).ok_or_else(|| {
            Error::malformed(index, format!("unparseable group {:?}", record.group))
        })?;

        if record.weekday >= DAYS_PER_WEEK {
            return Err(Error::malformed(
                index,
                format!("weekday {} out of range", record.weekday),
            ));
        }

        let start_of_day =
            time_to_minutes(&record.start).map_err(|e| Error::malformed(index, e.to_string()))?;

        // a zero-length session occupies no time but still offers its group
        let range = if record.duration_minutes == 0 {
            warn!(
                "zero-length session of {} group {} takes no time (record #{})",
                code, record.group, index
            );
            None
        } else {
            let start = record.weekday * MINUTES_PER_DAY + start_of_day;
            let end = start.checked_add(record.duration_minutes).ok_or_else(|| {
                Error::malformed(
                    index,
                    format!("duration {} overflows", record.duration_minutes),
                )
            })?;
            let range = TimeRange::new(start, end).ok_or_else(|| {
                Error::malformed(
                    index,
                    format!(
                        "session at {} lasting {} minutes runs past midnight",
                        record.start, record.duration_minutes
                    ),
                )
            })?;
            Some(range)
        };

        let course = self
            .courses
            .entry(code.to_string())
            .or_insert_with(|| Course::new(code.to_string()));
        match range {
            Some(range) => course.add_session(choice, range),
            None => course.add_choice(choice),
        }
        Ok(())
    }

    pub fn get_ranges(&self, code: &str, choice: Choice) -> Option<Vec<TimeRange>> {
        self.get(code).and_then(|course| course.ranges_for(choice))
    }
}

impl Deref for Catalog {
    type Target = BTreeMap<String, Course>;

    fn deref(&self) -> &Self::Target {
        &self.courses
    }
}

impl TryFrom<&CourseTable> for Catalog {
    type Error = Error;

    fn try_from(table: &CourseTable) -> Result<Self> {
        Catalog::from_records(&table.records()?)
    }
}

/// Raw class sessions in the API's column layout.
#[derive(Clone)]
pub struct CourseTable {
    df: DataFrame,
}

impl CourseTable {
    pub fn new(df: DataFrame) -> CourseTable {
        CourseTable { df }
    }

    pub fn load(file_path: PathBuf) -> Result<CourseTable> {
        let df = LazyCsvReader::new(file_path)
            .has_header(true)
            .finish()?
            .collect()?;

        Ok(CourseTable { df })
    }

    pub fn to_lazy(&self) -> LazyTable {
        LazyTable::new(self.df.clone().lazy())
    }

    /// Distinct course codes, sorted.
    pub fn course_codes(&self) -> Result<Vec<String>> {
        let codes = self.df.column(COURSE_COL)?;
        let mut unique = BTreeSet::new();
        for i in 0..codes.len() {
            let value = codes.get(i)?;
            if !matches!(value, AnyValue::Null) {
                unique.insert(value.to_string().replace('"', ""));
            }
        }
        Ok(unique.into_iter().collect())
    }

    /// Convert every row into a `SessionRecord`, failing on the first row
    /// with a missing or unparseable cell.
    pub fn records(&self) -> Result<Vec<SessionRecord>> {
        let df = self
            .df
            .select(&[COURSE_COL, GROUP_COL, WEEKDAY_COL, START_COL, DURATION_COL])?;

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let row = df
                .get(i)
                .ok_or_else(|| Error::malformed(i, "row out of bounds"))?;

            let cell = |column: usize, name: &str| -> Result<String> {
                match row.get(column) {
                    None | Some(AnyValue::Null) => {
                        Err(Error::malformed(i, format!("missing {}", name)))
                    }
                    Some(value) => Ok(value.to_string().replace('"', "")),
                }
            };
            let number = |column: usize, name: &str| -> Result<u32> {
                let text = cell(column, name)?;
                text.trim()
                    .parse::<u32>()
                    .map_err(|_| Error::malformed(i, format!("unparseable {} {:?}", name, text)))
            };

            let class = ApiClassRecord {
                codi_assig: cell(0, COURSE_COL)?,
                grup: cell(1, GROUP_COL)?,
                dia_setmana: number(2, WEEKDAY_COL)?,
                inici: cell(3, START_COL)?,
                durada: number(4, DURATION_COL)?,
            };
            let record =
                SessionRecord::try_from(class).map_err(|reason| Error::malformed(i, reason))?;
            records.push(record);
        }

        Ok(records)
    }
}

impl Deref for CourseTable {
    type Target = DataFrame;

    fn deref(&self) -> &Self::Target {
        &self.df
    }
}

impl std::fmt::Display for CourseTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.df)
    }
}

pub struct LazyTable {
    lf: LazyFrame,
}

impl LazyTable {
    pub fn new(lf: LazyFrame) -> Self {
        LazyTable { lf }
    }

    /// Keep the sessions whose course code starts with one of `codes`.
    /// No codes keeps nothing.
    pub fn contains(self, codes: &[&str]) -> Self {
        let predicate = codes
            .iter()
            .map(|code| col(COURSE_COL).str().starts_with(lit(*code)))
            .reduce(|acc, expr| acc.or(expr))
            .unwrap_or(lit(false));

        let df = self.lf.filter(predicate);

        LazyTable { lf: df }
    }

    pub fn collect(self) -> Result<CourseTable> {
        let df = self.lf.collect()?;
        Ok(CourseTable { df })
    }
}

impl Deref for LazyTable {
    type Target = LazyFrame;

    fn deref(&self) -> &Self::Target {
        &self.lf
    }
}
