use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::{
    canonical_id, NamedRef, ResolvedLessonEntry, StudentProfile, SubjectRef,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Id(pub String);

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Id(s)),
            Value::Number(n) => Ok(Id(n.to_string())),
            other => Err(serde::de::Error::custom(format!("unexpected id {other}"))),
        }
    }
}

fn id_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Id>, D::Error> {
    Ok(optional_id_list(deserializer)?.unwrap_or_default())
}

fn optional_id_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<Id>>, D::Error> {
    let ids = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(None),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(Id(s)),
                Value::Number(n) => Some(Id(n.to_string())),
                _ => None,
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Id(s.to_string()))
            .collect(),
        Value::Number(n) => vec![Id(n.to_string())],
        _ => Vec::new(),
    };
    Ok(Some(ids))
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn optional_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let count = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(count.and_then(|c| u32::try_from(c).ok()))
}

fn optional_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    })
}

/// Weekday pattern: `"10000"` style strings (Monday first) or an integer with
/// bit 0 for Monday.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DayMask(u8);

impl DayMask {
    pub fn includes(&self, date: NaiveDate) -> bool {
        let bit = date.weekday().num_days_from_monday();
        self.0 & (1 << bit) != 0
    }
}

impl<'de> Deserialize<'de> for DayMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mask = match Value::deserialize(deserializer)? {
            Value::String(s) => s
                .chars()
                .take(7)
                .enumerate()
                .filter(|(_, c)| *c == '1')
                .fold(0u8, |acc, (i, _)| acc | (1 << i)),
            Value::Number(n) => n.as_u64().map(|v| (v & 0x7f) as u8).unwrap_or(0),
            _ => 0,
        };
        Ok(DayMask(mask))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Period {
    pub id: Id,
    #[serde(default, deserialize_with = "text")]
    pub period: String,
    #[serde(default, deserialize_with = "text")]
    pub starttime: String,
    #[serde(default, deserialize_with = "text")]
    pub endtime: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subject {
    pub id: Id,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "text")]
    pub short: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchoolClass {
    pub id: Id,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "text")]
    pub short: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Teacher {
    pub id: Id,
    #[serde(default, deserialize_with = "text")]
    pub firstname: String,
    #[serde(default, deserialize_with = "text")]
    pub lastname: String,
    #[serde(default, deserialize_with = "text")]
    pub short: String,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
}

impl Teacher {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.firstname.trim(), self.lastname.trim());
        let full = full.trim();
        if !full.is_empty() {
            full.to_string()
        } else if !self.short.is_empty() {
            self.short.clone()
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Classroom {
    pub id: Id,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "text")]
    pub short: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonDefinition {
    pub id: Id,
    #[serde(default)]
    pub subjectid: Option<Id>,
    #[serde(default, deserialize_with = "id_list")]
    pub teacherids: Vec<Id>,
    #[serde(default, deserialize_with = "id_list")]
    pub classids: Vec<Id>,
    #[serde(default, deserialize_with = "optional_id_list")]
    pub studentids: Option<Vec<Id>>,
    #[serde(default, deserialize_with = "optional_count")]
    pub durationperiods: Option<u32>,
    #[serde(default, deserialize_with = "optional_date")]
    pub datefrom: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    pub dateto: Option<NaiveDate>,
}

impl LessonDefinition {
    fn valid_on(&self, date: NaiveDate) -> bool {
        self.datefrom.map_or(true, |from| date >= from)
            && self.dateto.map_or(true, |to| date <= to)
    }

    /// An empty list means the same as a missing one: the lesson is for whole classes.
    fn explicit_students(&self) -> Option<&[Id]> {
        self.studentids.as_deref().filter(|ids| !ids.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentRow {
    pub id: Id,
    #[serde(default)]
    pub classid: Option<Id>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleCard {
    pub id: Id,
    pub lessonid: Id,
    #[serde(default, deserialize_with = "text")]
    pub period: String,
    #[serde(default)]
    pub days: DayMask,
    #[serde(default, deserialize_with = "id_list")]
    pub classroomids: Vec<Id>,
}

#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    periods: Vec<Period>,
    subjects: HashMap<Id, Subject>,
    classes: HashMap<Id, SchoolClass>,
    teachers: HashMap<Id, Teacher>,
    classrooms: HashMap<Id, Classroom>,
    lessons: HashMap<Id, LessonDefinition>,
    /// Canonical student id to own class, from the roster table.
    student_classes: HashMap<String, Id>,
    valid_from: Option<NaiveDate>,
    valid_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct TimetableData {
    pub tables: LookupTables,
    pub cards: Vec<ScheduleCard>,
}

fn table_array(payload: &Value) -> Option<&Vec<Value>> {
    payload
        .pointer("/dbiAccessorRes/tables")
        .or_else(|| payload.get("tables"))
        .and_then(Value::as_array)
}

pub fn has_tables(payload: &Value) -> bool {
    table_array(payload).is_some()
}

fn rows<T: for<'de> Deserialize<'de>>(table_id: &str, rows: &[Value]) -> Vec<T> {
    rows.iter()
        .filter_map(|row| match serde_json::from_value::<T>(row.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!(table = table_id, error = %e, "skipping malformed row");
                None
            }
        })
        .collect()
}

fn date_field(payload: &Value, key: &str) -> Option<NaiveDate> {
    let raw = payload
        .get(key)
        .or_else(|| payload.pointer(&format!("/dbiAccessorRes/{key}")))?
        .as_str()?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

impl TimetableData {
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let tables = table_array(payload)?;
        let mut data = TimetableData::default();
        data.tables.valid_from = date_field(payload, "datefrom");
        data.tables.valid_to = date_field(payload, "dateto");

        for table in tables {
            let Some(table_id) = table.get("id").and_then(Value::as_str) else {
                continue;
            };
            let data_rows = table
                .get("data_rows")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let t = &mut data.tables;
            match table_id {
                "periods" => t.periods = rows(table_id, data_rows),
                "subjects" => t.subjects = keyed(rows(table_id, data_rows), |r: &Subject| &r.id),
                "classes" => t.classes = keyed(rows(table_id, data_rows), |r: &SchoolClass| &r.id),
                "teachers" => t.teachers = keyed(rows(table_id, data_rows), |r: &Teacher| &r.id),
                "classrooms" => {
                    t.classrooms = keyed(rows(table_id, data_rows), |r: &Classroom| &r.id)
                }
                "lessons" => {
                    t.lessons = keyed(rows(table_id, data_rows), |r: &LessonDefinition| &r.id)
                }
                "students" => {
                    t.student_classes = rows::<StudentRow>(table_id, data_rows)
                        .into_iter()
                        .filter_map(|row| {
                            let class = row.classid.filter(|c| !c.0.is_empty())?;
                            Some((canonical_id(&row.id.0), class))
                        })
                        .collect()
                }
                "cards" => data.cards = rows(table_id, data_rows),
                other => tracing::trace!(table = other, "ignoring unknown table"),
            }
        }

        Some(data)
    }

    pub fn resolve(&self, date: NaiveDate, student: &StudentProfile) -> Vec<ResolvedLessonEntry> {
        resolve(&self.tables, &self.cards, date, student)
    }
}

fn keyed<T>(items: Vec<T>, key: impl Fn(&T) -> &Id) -> HashMap<Id, T> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        map.entry(key(&item).clone()).or_insert(item);
    }
    map
}

fn normalize_time(raw: &str) -> String {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|_| raw.trim().to_string())
}

impl LookupTables {
    fn valid_on(&self, date: NaiveDate) -> bool {
        self.valid_from.map_or(true, |from| date >= from)
            && self.valid_to.map_or(true, |to| date <= to)
    }

    fn period_index(&self, reference: &str) -> Option<usize> {
        self.periods
            .iter()
            .position(|p| p.id.0 == reference)
            .or_else(|| self.periods.iter().position(|p| p.period == reference))
    }

    /// Start of the card's period and end of the last period the lesson spans.
    fn times(&self, card: &ScheduleCard, lesson: &LessonDefinition) -> (String, String) {
        let Some(start) = self.period_index(&card.period) else {
            return (String::new(), String::new());
        };
        let span = lesson.durationperiods.unwrap_or(1).max(1) as usize;
        let end = (start + span - 1).min(self.periods.len() - 1);
        (
            normalize_time(&self.periods[start].starttime),
            normalize_time(&self.periods[end].endtime),
        )
    }

    fn class_matches_label(&self, class_id: &Id, label: &str) -> bool {
        if class_id.0.eq_ignore_ascii_case(label) {
            return true;
        }
        self.classes.get(class_id).is_some_and(|class| {
            class.name.trim().eq_ignore_ascii_case(label)
                || class.short.trim().eq_ignore_ascii_case(label)
        })
    }

    fn is_student_class(&self, class_id: &Id, student: &StudentProfile) -> bool {
        let on_roster = student
            .canonical_id()
            .and_then(|id| self.student_classes.get(&id))
            .is_some_and(|own| own == class_id);
        on_roster
            || student
                .class_label
                .as_deref()
                .is_some_and(|label| self.class_matches_label(class_id, label))
    }

    fn is_relevant(&self, lesson: &LessonDefinition, student: &StudentProfile) -> bool {
        match lesson.explicit_students() {
            Some(ids) => student
                .canonical_id()
                .is_some_and(|wanted| ids.iter().any(|id| canonical_id(&id.0) == wanted)),
            None => lesson
                .classids
                .iter()
                .any(|class_id| self.is_student_class(class_id, student)),
        }
    }

    fn entry(
        &self,
        card: &ScheduleCard,
        lesson: &LessonDefinition,
        date: NaiveDate,
    ) -> ResolvedLessonEntry {
        let (start_time, end_time) = self.times(card, lesson);

        let subject = lesson
            .subjectid
            .as_ref()
            .and_then(|id| self.subjects.get(id))
            .map(|s| SubjectRef {
                name: s.name.clone(),
                short: s.short.clone(),
            })
            .unwrap_or_else(|| SubjectRef {
                name: "Unknown".to_string(),
                short: "?".to_string(),
            });

        let teacher = lesson
            .teacherids
            .first()
            .and_then(|id| self.teachers.get(id))
            .map(Teacher::display_name)
            .unwrap_or_default();

        let class = lesson
            .classids
            .first()
            .and_then(|id| self.classes.get(id))
            .map(|c| if c.name.is_empty() { c.short.clone() } else { c.name.clone() })
            .unwrap_or_default();

        let classroom = card
            .classroomids
            .iter()
            .filter_map(|id| self.classrooms.get(id))
            .map(|room| if room.name.is_empty() { room.short.as_str() } else { room.name.as_str() })
            .collect::<Vec<_>>()
            .join(", ");

        ResolvedLessonEntry {
            id: card.id.0.clone(),
            start_time,
            end_time,
            date,
            subject,
            classroom: NamedRef::new(classroom),
            teacher: NamedRef::new(teacher),
            class: NamedRef::new(class),
        }
    }
}

pub fn resolve(
    tables: &LookupTables,
    cards: &[ScheduleCard],
    date: NaiveDate,
    student: &StudentProfile,
) -> Vec<ResolvedLessonEntry> {
    if !tables.valid_on(date) {
        tracing::debug!(%date, "date outside timetable validity window");
        return Vec::new();
    }

    cards
        .iter()
        .filter(|card| card.days.includes(date))
        .filter_map(|card| {
            let lesson = tables.lessons.get(&card.lessonid)?;
            (lesson.valid_on(date) && tables.is_relevant(lesson, student))
                .then(|| tables.entry(card, lesson, date))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // 2026-10-19 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn sample_payload() -> Value {
        json!({
            "dbiAccessorRes": {
                "tables": [
                    {"id": "globals", "data_rows": [{"id": "1", "name": "ignored"}]},
                    {"id": "periods", "data_rows": [
                        {"id": "1", "period": "1", "starttime": "8:00", "endtime": "8:45"},
                        {"id": "2", "period": "2", "starttime": "8:55", "endtime": "9:40"},
                        {"id": "3", "period": "3", "starttime": "10:00", "endtime": "10:45"}
                    ]},
                    {"id": "subjects", "data_rows": [
                        {"id": "s1", "name": "Matematika", "short": "MAT"},
                        {"id": "s2", "name": "Fyzika", "short": "FYZ"},
                        {"id": "s3", "name": "Telesná výchova", "short": "TSV"}
                    ]},
                    {"id": "classes", "data_rows": [
                        {"id": "c1", "name": "1.B", "short": "1b"},
                        {"id": "c2", "name": "3.A", "short": "3a"}
                    ]},
                    {"id": "teachers", "data_rows": [
                        {"id": "t1", "firstname": "Ada", "lastname": "Novak", "short": "AN"},
                        {"id": "t2", "short": "BK"}
                    ]},
                    {"id": "classrooms", "data_rows": [
                        {"id": "r1", "name": "Ucebna 12", "short": "U12"},
                        {"id": "r2", "name": "", "short": "TEL"}
                    ]},
                    {"id": "lessons", "data_rows": [
                        {"id": "l1", "subjectid": "s1", "teacherids": ["t1"], "classids": ["c1"], "studentids": ["42"]},
                        {"id": "l2", "subjectid": "s2", "teacherids": ["t2", "t1"], "classids": ["c1"], "durationperiods": 2},
                        {"id": "l3", "subjectid": "s3", "teacherids": [], "classids": ["c2"], "studentids": []},
                        {"id": "l4", "subjectid": "s1", "teacherids": ["t1"], "classids": ["c1"],
                         "studentids": null, "datefrom": "2027-01-01"}
                    ]},
                    {"id": "cards", "data_rows": [
                        {"id": "k3", "lessonid": "l2", "period": "2", "days": "10000", "classroomids": ["r1", "r2"]},
                        {"id": "k1", "lessonid": "l1", "period": "1", "days": "10100", "classroomids": ["r1"]},
                        {"id": "k2", "lessonid": "l1", "period": "3", "days": "01000", "classroomids": []},
                        {"id": "k4", "lessonid": "l3", "period": "1", "days": 1, "classroomids": ["r2"]},
                        {"id": "k5", "lessonid": "l4", "period": "3", "days": "11111", "classroomids": []},
                        {"id": "k6", "lessonid": "missing", "period": "1", "days": "11111"}
                    ]}
                ]
            }
        })
    }

    fn data() -> TimetableData {
        TimetableData::from_payload(&sample_payload()).expect("tables present")
    }

    #[test]
    fn explicit_student_list_selects_matching_student_only() {
        let tables = data();
        let jane = StudentProfile::new(Some("-42".into()), "Jane Doe");
        let entries = tables.resolve(monday(), &jane);
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["k1"]);

        let first = &entries[0];
        assert_eq!(first.start_time, "08:00");
        assert_eq!(first.end_time, "08:45");
        assert_eq!(first.subject.short, "MAT");
        assert_eq!(first.teacher.name, "Ada Novak");
        assert_eq!(first.classroom.name, "Ucebna 12");
        assert_eq!(first.class.name, "1.B");

        let other = StudentProfile::new(Some("99".into()), "Other Kid");
        assert!(tables.resolve(monday(), &other).is_empty());
    }

    #[test]
    fn class_label_matches_when_student_list_absent() {
        let tables = data();
        let jane = StudentProfile::new(Some("7".into()), "Jane Doe, 1b");
        let entries = tables.resolve(monday(), &jane);
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        // l1 lists explicit students, so only the class-wide l2 card applies.
        assert_eq!(ids, vec!["k3"]);

        let fyz = &entries[0];
        assert_eq!(fyz.start_time, "08:55");
        assert_eq!(fyz.end_time, "10:45");
        assert_eq!(fyz.teacher.name, "BK");
        assert_eq!(fyz.classroom.name, "Ucebna 12, TEL");
    }

    #[test]
    fn class_id_itself_can_match_label() {
        let payload = json!({"tables": [
            {"id": "lessons", "data_rows": [{"id": "l", "subjectid": "s", "classids": ["1b"]}]},
            {"id": "cards", "data_rows": [{"id": "k", "lessonid": "l", "period": "9", "days": "1"}]}
        ]});
        let data = TimetableData::from_payload(&payload).unwrap();
        let jane = StudentProfile::new(Some("1".into()), "Jane Doe, 1b");
        let entries = data.resolve(monday(), &jane);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].subject.name, "Unknown");
        assert_eq!(entries[0].start_time, "");
    }

    #[test]
    fn roster_supplies_class_for_profile_without_label() {
        let payload = json!({"tables": [
            {"id": "classes", "data_rows": [{"id": "c1", "name": "1.B", "short": "1b"}]},
            {"id": "students", "data_rows": [
                {"id": "Student42", "classid": "c1"},
                {"id": "Student43", "classid": ""}
            ]},
            {"id": "lessons", "data_rows": [{"id": "l", "subjectid": "s", "classids": ["c1"]}]},
            {"id": "cards", "data_rows": [{"id": "k", "lessonid": "l", "period": "1", "days": "11111"}]}
        ]});
        let data = TimetableData::from_payload(&payload).unwrap();

        let me = StudentProfile::new(Some("Student42".into()), "Myself");
        assert_eq!(me.class_label, None);
        let entries = data.resolve(monday(), &me);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].class.name, "1.B");

        let unplaced = StudentProfile::new(Some("Student43".into()), "Myself");
        assert!(data.resolve(monday(), &unplaced).is_empty());
    }

    #[test]
    fn lesson_length_accepts_numbers_and_numeric_strings() {
        let payload = json!({"tables": [
            {"id": "periods", "data_rows": [
                {"id": "1", "period": "1", "starttime": "8:00", "endtime": "8:45"},
                {"id": "2", "period": "2", "starttime": "8:55", "endtime": "9:40"}
            ]},
            {"id": "lessons", "data_rows": [
                {"id": "a", "classids": ["1b"], "durationperiods": "2"},
                {"id": "b", "classids": ["1b"], "durationperiods": 2.0},
                {"id": "c", "classids": ["1b"], "durationperiods": "double"}
            ]},
            {"id": "cards", "data_rows": [
                {"id": "ka", "lessonid": "a", "period": "1", "days": "10000"},
                {"id": "kb", "lessonid": "b", "period": "1", "days": "10000"},
                {"id": "kc", "lessonid": "c", "period": "1", "days": "10000"}
            ]}
        ]});
        let data = TimetableData::from_payload(&payload).unwrap();
        let jane = StudentProfile::new(Some("1".into()), "Jane Doe, 1b");

        let ends: Vec<_> = data
            .resolve(monday(), &jane)
            .into_iter()
            .map(|e| (e.id, e.end_time))
            .collect();
        assert_eq!(
            ends,
            vec![
                ("ka".to_string(), "09:40".to_string()),
                ("kb".to_string(), "09:40".to_string()),
                ("kc".to_string(), "08:45".to_string()),
            ]
        );
    }

    #[test]
    fn empty_student_list_counts_as_class_lesson_and_numeric_days_work() {
        let tables = data();
        let tom = StudentProfile::new(Some("8".into()), "Tom Doe, 3A");
        let entries = tables.resolve(monday(), &tom);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "k4");
        assert_eq!(entries[0].teacher.name, "");
        assert_eq!(entries[0].classroom.name, "TEL");
    }

    #[test]
    fn day_bits_follow_weekday() {
        let tables = data();
        let jane = StudentProfile::new(Some("42".into()), "Jane Doe");
        let tuesday = monday().succ_opt().unwrap();
        let wednesday = tuesday.succ_opt().unwrap();
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 25).unwrap();

        assert_eq!(tables.resolve(tuesday, &jane)[0].id, "k2");
        assert_eq!(tables.resolve(wednesday, &jane)[0].id, "k1");
        assert!(tables.resolve(sunday, &jane).is_empty());
    }

    #[test]
    fn validity_windows_yield_empty_results() {
        let mut payload = sample_payload();
        payload["datefrom"] = json!("2026-09-01");
        payload["dateto"] = json!("2027-06-30");
        let data = TimetableData::from_payload(&payload).unwrap();
        let jane = StudentProfile::new(Some("42".into()), "Jane Doe, 1b");

        assert!(!data.resolve(monday(), &jane).is_empty());
        let summer = NaiveDate::from_ymd_opt(2027, 7, 5).unwrap();
        assert!(data.resolve(summer, &jane).is_empty());

        // l4 only becomes valid in 2027.
        let in_2027 = NaiveDate::from_ymd_opt(2027, 1, 4).unwrap();
        let ids: Vec<_> = data
            .resolve(in_2027, &jane)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert!(ids.contains(&"k5".to_string()));
        assert!(!data
            .resolve(monday(), &jane)
            .iter()
            .any(|e| e.id == "k5"));
    }

    #[test]
    fn payload_without_tables_is_rejected() {
        assert!(!has_tables(&json!({"ttitems": []})));
        assert!(TimetableData::from_payload(&json!({"ttitems": []})).is_none());
        assert!(has_tables(&sample_payload()));
    }
}
