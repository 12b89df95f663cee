use chrono::NaiveDate;
use serde::Serialize;

/// Placeholder session hash used when no heuristic could find the real one.
pub const SENTINEL_GSH: &str = "00000000";

/// Strips sign and any textual prefix from a portal identifier.
pub fn canonical_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let digits: String = trimmed
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    if digits.is_empty() {
        return trimmed.to_lowercase();
    }

    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Guardian,
    Student(String),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub subdomain: String,
    pub base_url: String,
    pub csrf_token: String,
    pub gsh: String,
    pub user_id: Option<String>,
    pub students: Vec<StudentProfile>,
    pub scope: Scope,
    degraded: bool,
}

impl Session {
    pub fn new(subdomain: &str, base_url: &str, csrf_token: String) -> Self {
        Self {
            subdomain: subdomain.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            csrf_token,
            gsh: String::new(),
            user_id: None,
            students: Vec::new(),
            scope: Scope::Guardian,
            degraded: false,
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Adopts `candidate` as the session hash if it is new and not the sentinel.
    /// Returns whether the stored hash changed.
    pub fn refresh_hash(&mut self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if candidate.is_empty() || candidate == SENTINEL_GSH || candidate == self.gsh {
            return false;
        }
        self.gsh = candidate.to_string();
        self.degraded = false;
        true
    }

    pub fn set_degraded(&mut self) {
        self.gsh = SENTINEL_GSH.to_string();
        self.degraded = true;
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn register_students(&mut self, found: Vec<StudentProfile>) {
        for profile in found {
            let known = self
                .students
                .iter()
                .any(|existing| existing.canonical_id() == profile.canonical_id());
            if !known {
                self.students.push(profile);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoFactorChallenge {
    pub subdomain: String,
    pub csrf_token: String,
    pub authentication_token: String,
    pub authentication_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentProfile {
    pub id: Option<String>,
    pub name: String,
    pub class_label: Option<String>,
}

impl StudentProfile {
    pub fn new(id: Option<String>, name: &str) -> Self {
        let name = name.trim().to_string();
        let class_label = derive_class_label(&name);
        Self {
            id,
            name,
            class_label,
        }
    }

    pub fn canonical_id(&self) -> Option<String> {
        self.id.as_deref().map(canonical_id)
    }
}

/// "Jane Doe, 1b" -> "1b"
pub fn derive_class_label(display_name: &str) -> Option<String> {
    let (_, label) = display_name.rsplit_once(',')?;
    let label = label.trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectRef {
    pub name: String,
    pub short: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRef {
    pub name: String,
}

impl NamedRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLessonEntry {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
    pub date: NaiveDate,
    pub subject: SubjectRef,
    pub classroom: NamedRef,
    pub teacher: NamedRef,
    pub class: NamedRef,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub student_id: Option<String>,
    pub name: String,
    pub class_name: String,
    pub timetable: Vec<ResolvedLessonEntry>,
    pub homework: Vec<serde_json::Value>,
    pub grades: Vec<serde_json::Value>,
    pub messages: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub students: Vec<StudentReport>,
    pub week_start: NaiveDate,
    pub week_dates: Vec<NaiveDate>,
}
