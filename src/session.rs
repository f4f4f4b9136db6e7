use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// One class session as handed to the engine.
///
/// `weekday` counts from Monday = 0 and `start` is a clock time such as
/// "08:30". `group` keeps the packed group/subgroup number as text because
/// that is how data providers ship it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub course: String,
    #[serde(deserialize_with = "string_or_number")]
    pub group: String,
    pub weekday: u32,
    pub start: String,
    pub duration_minutes: u32,
}

impl SessionRecord {
    pub fn new(
        course: &str,
        group: impl ToString,
        weekday: u32,
        start: &str,
        duration_minutes: u32,
    ) -> SessionRecord {
        SessionRecord {
            course: course.to_string(),
            group: group.to_string(),
            weekday,
            start: start.to_string(),
            duration_minutes,
        }
    }
}

/// A class as served by the FIB timetable API: Monday is day 1 and
/// `durada` is given in hours.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiClassRecord {
    pub codi_assig: String,
    #[serde(deserialize_with = "string_or_number")]
    pub grup: String,
    pub dia_setmana: u32,
    pub inici: String,
    pub durada: u32,
}

impl TryFrom<ApiClassRecord> for SessionRecord {
    type Error = String;

    fn try_from(class: ApiClassRecord) -> std::result::Result<Self, Self::Error> {
        let weekday = class
            .dia_setmana
            .checked_sub(1)
            .ok_or_else(|| format!("dia_setmana {} is not a weekday", class.dia_setmana))?;
        let duration_minutes = class
            .durada
            .checked_mul(60)
            .ok_or_else(|| format!("durada {} hours overflows", class.durada))?;

        Ok(SessionRecord {
            course: class.codi_assig,
            group: class.grup,
            weekday,
            start: class.inici,
            duration_minutes,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApiPayload {
    List(Vec<serde_json::Value>),
    Page { results: Vec<serde_json::Value> },
}

/// Parse a JSON array of `SessionRecord`s.
pub fn records_from_json(json: &str) -> Result<Vec<SessionRecord>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|e| Error::malformed(index, e.to_string()))
        })
        .collect()
}

/// Parse the API's class listing, either the paginated `{"results": [...]}`
/// envelope or a bare array.
pub fn records_from_api_json(json: &str) -> Result<Vec<SessionRecord>> {
    let values = match serde_json::from_str::<ApiPayload>(json)? {
        ApiPayload::List(values) => values,
        ApiPayload::Page { results } => results,
    };

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let class: ApiClassRecord =
                serde_json::from_value(value).map_err(|e| Error::malformed(index, e.to_string()))?;
            SessionRecord::try_from(class).map_err(|reason| Error::malformed(index, reason))
        })
        .collect()
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Text(String),
        Number(u64),
    }

    Ok(match Field::deserialize(deserializer)? {
        Field::Text(s) => s,
        Field::Number(n) => n.to_string(),
    })
}

/// Which group, and possibly which subgroup, was picked for a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Choice {
    Group(u32),
    Subgroup(u32, u32),
}

impl Choice {
    /// Decode the legacy `group * 10 + subgroup` form.
    pub fn from_packed(packed: u32) -> Choice {
        match (packed / 10, packed % 10) {
            (group, 0) => Choice::Group(group),
            (group, subgroup) => Choice::Subgroup(group, subgroup),
        }
    }

    /// Parse a packed group field such as "11" or " 20 ".
    pub fn parse(field: &str) -> Option<Choice> {
        field.trim().parse::<u32>().ok().map(Choice::from_packed)
    }

    pub fn group(&self) -> u32 {
        match *self {
            Choice::Group(group) | Choice::Subgroup(group, _) => group,
        }
    }

    pub fn subgroup(&self) -> Option<u32> {
        match *self {
            Choice::Group(_) => None,
            Choice::Subgroup(_, subgroup) => Some(subgroup),
        }
    }

    pub fn packed(&self) -> u32 {
        self.group() * 10 + self.subgroup().unwrap_or(0)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Group(group) => write!(f, "{}", group),
            Choice::Subgroup(group, subgroup) => write!(f, "{}.{}", group, subgroup),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_packing() {
        assert_eq!(Choice::from_packed(10), Choice::Group(1));
        assert_eq!(Choice::from_packed(23), Choice::Subgroup(2, 3));
        assert_eq!(Choice::Subgroup(4, 1).packed(), 41);
        assert_eq!(Choice::Group(1).packed(), 10);
        assert_eq!(Choice::parse(" 12 "), Some(Choice::Subgroup(1, 2)));
        assert_eq!(Choice::parse("1a"), None);
        assert_eq!(Choice::parse(""), None);
    }

    #[test]
    fn test_choice_display() {
        assert_eq!(Choice::Group(3).to_string(), "3");
        assert_eq!(Choice::Subgroup(3, 2).to_string(), "3.2");
    }

    #[test]
    fn test_records_from_json() {
        let json = r#"[
            {"course": "PRO1", "group": 11, "weekday": 0, "start": "08:00", "duration_minutes": 120},
            {"course": "PRO1", "group": "10", "weekday": 2, "start": "10:00", "duration_minutes": 60}
        ]"#;
        let records = records_from_json(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].group, "11");
        assert_eq!(records[1], SessionRecord::new("PRO1", 10, 2, "10:00", 60));
    }

    #[test]
    fn test_records_from_json_reports_index() {
        let json = r#"[
            {"course": "PRO1", "group": 11, "weekday": 0, "start": "08:00", "duration_minutes": 120},
            {"course": "PRO1", "weekday": 2, "start": "10:00", "duration_minutes": 60}
        ]"#;
        match records_from_json(json) {
            Err(Error::MalformedRecord { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_records_from_api_json() {
        let page = r#"{
            "count": 2,
            "results": [
                {"codi_assig": "F", "grup": "10", "dia_setmana": 1, "inici": "08:00", "durada": 2, "tipus": "T"},
                {"codi_assig": "F", "grup": "11", "dia_setmana": 3, "inici": "12:00", "durada": 1, "tipus": "L"}
            ]
        }"#;
        let records = records_from_api_json(page).unwrap();
        assert_eq!(records[0], SessionRecord::new("F", 10, 0, "08:00", 120));
        assert_eq!(records[1], SessionRecord::new("F", 11, 2, "12:00", 60));

        let list = r#"[{"codi_assig": "IC", "grup": 20, "dia_setmana": 5, "inici": "09:00", "durada": 2}]"#;
        let records = records_from_api_json(list).unwrap();
        assert_eq!(records[0], SessionRecord::new("IC", 20, 4, "09:00", 120));
    }

    #[test]
    fn test_api_day_zero_is_malformed() {
        let list = r#"[{"codi_assig": "IC", "grup": 20, "dia_setmana": 0, "inici": "09:00", "durada": 2}]"#;
        assert!(matches!(
            records_from_api_json(list),
            Err(Error::MalformedRecord { index: 0, .. })
        ));
    }

    #[test]
    fn test_api_huge_durada_is_malformed() {
        let list = r#"[
            {"codi_assig": "IC", "grup": 20, "dia_setmana": 1, "inici": "09:00", "durada": 2},
            {"codi_assig": "IC", "grup": 20, "dia_setmana": 1, "inici": "09:00", "durada": 100000000}
        ]"#;
        match records_from_api_json(list) {
            Err(Error::MalformedRecord { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("overflows"));
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
    }
}
