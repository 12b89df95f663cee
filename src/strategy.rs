use chrono::{Datelike, NaiveDate};
use serde_json::{json, Value};

use crate::envelope::{self, Decoded};
use crate::extract;
use crate::http::PortalTransport;
use crate::models::{canonical_id, Session, StudentProfile};

/// Page fragments the portal serves instead of data when a call is refused.
const IN_BODY_ERROR_MARKERS: &[&str] = &[
    "Nemáte oprávnenie",
    "You do not have permission",
    "login/?cmd=MainLogin",
];

/// Present in the final address when the session was dropped mid-run.
const LOGIN_REDIRECT_MARKER: &str = "bad=1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgShape {
    /// `[student, year, month, day]`
    StudentDate,
    /// `[null, "YYYY-MM-DD"]`; the server picks the scope from the session.
    SessionDate,
}

/// Known endpoints, most recently observed first.
const ENDPOINTS: &[(&str, ArgShape)] = &[
    (
        "timetable/server/ttviewer.js?__func=ttviewer_getDatePlan",
        ArgShape::StudentDate,
    ),
    (
        "timetable/server/ttviewer.js?__func=ttviewer_getTimetable",
        ArgShape::StudentDate,
    ),
    (
        "timetable/server/regulartt.js?__func=regularttGetData",
        ArgShape::SessionDate,
    ),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub endpoint: String,
    pub args: Vec<Value>,
}

impl Candidate {
    pub fn new(endpoint: &str, args: Vec<Value>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            args,
        }
    }

    fn identity(&self) -> String {
        let args: Vec<String> = self.args.iter().map(canonical_arg).collect();
        format!("{}|{}", self.endpoint, args.join("|"))
    }
}

/// Signed and unsigned integers, quoted or not, share one key.
fn canonical_arg(value: &Value) -> String {
    match value {
        Value::String(s) if is_integer_literal(s) => canonical_id(s),
        Value::Number(n) => canonical_id(&n.to_string()),
        other => other.to_string(),
    }
}

fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.trim().trim_start_matches('-');
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    Success { candidate: Candidate, payload: Value },
    AllFailed { attempted: usize },
}

pub fn dedup(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.identity()))
        .collect()
}

/// The spellings the portal has accepted for a student id over time, the
/// signed integer first when the id is one.
pub fn identifier_variants(raw: &str) -> Vec<Value> {
    let mut variants = Vec::new();
    if let Ok(signed) = raw.trim().parse::<i64>() {
        variants.push(json!(signed));
    }
    variants.push(Value::String(raw.to_string()));
    let canonical = canonical_id(raw);
    if let Ok(number) = canonical.parse::<i64>() {
        variants.push(json!(number));
        variants.push(Value::String(format!("-{canonical}")));
        variants.push(json!(-number));
    }
    variants
}

pub fn timetable_candidates(student: &StudentProfile, date: NaiveDate) -> Vec<Candidate> {
    let ids = match &student.id {
        Some(id) => identifier_variants(id),
        None => vec![Value::Null],
    };

    let mut candidates = Vec::new();
    for (endpoint, shape) in ENDPOINTS {
        match shape {
            ArgShape::StudentDate => {
                for id in &ids {
                    let args = vec![
                        id.clone(),
                        json!(date.year()),
                        json!(date.month()),
                        json!(date.day()),
                    ];
                    candidates.push(Candidate::new(endpoint, args));
                }
            }
            ArgShape::SessionDate => candidates.push(Candidate::new(
                endpoint,
                vec![Value::Null, json!(date.format("%Y-%m-%d").to_string())],
            )),
        }
    }
    dedup(candidates)
}

fn error_marker(body: &str) -> Option<&'static str> {
    IN_BODY_ERROR_MARKERS
        .iter()
        .copied()
        .find(|marker| body.contains(marker))
}

async fn attempt(
    transport: &dyn PortalTransport,
    session: &mut Session,
    candidate: &Candidate,
    is_usable: &(dyn Fn(&Value) -> bool + Sync),
) -> Option<Value> {
    let url = session.endpoint(&candidate.endpoint);
    let request = json!({ "__args": candidate.args, "__gsh": session.gsh });

    let response = match transport.post_json(&url, &request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(endpoint = %candidate.endpoint, error = %e, "candidate transport failure");
            return None;
        }
    };

    if !response.is_success() {
        tracing::debug!(endpoint = %candidate.endpoint, status = response.status, "candidate rejected");
        return None;
    }

    if response.final_url.contains(LOGIN_REDIRECT_MARKER) {
        tracing::debug!(endpoint = %candidate.endpoint, "candidate bounced to the login page");
        return None;
    }

    if let Some(fresh) = extract::session_hash(&response.body) {
        if session.refresh_hash(&fresh) {
            tracing::debug!("session hash refreshed from response");
        }
    }

    if let Some(marker) = error_marker(&response.body) {
        tracing::debug!(endpoint = %candidate.endpoint, marker, "candidate returned an error page");
        return None;
    }

    match envelope::decode(&response.body) {
        Ok(Decoded::Payload(payload)) if is_usable(&payload) => Some(payload),
        Ok(Decoded::Payload(_)) => {
            tracing::debug!(endpoint = %candidate.endpoint, "payload has an unexpected shape");
            None
        }
        Ok(Decoded::Empty { reason }) => {
            tracing::debug!(endpoint = %candidate.endpoint, ?reason, "candidate returned no data");
            None
        }
        Err(e) => {
            let prefix: String = response.body.chars().take(80).collect();
            tracing::debug!(endpoint = %candidate.endpoint, error = %e, %prefix, "candidate decode failure");
            None
        }
    }
}

pub async fn try_strategies(
    transport: &dyn PortalTransport,
    session: &mut Session,
    candidates: &[Candidate],
    is_usable: &(dyn Fn(&Value) -> bool + Sync),
) -> ChainOutcome {
    let candidates = dedup(candidates.to_vec());

    for (attempted, candidate) in candidates.iter().enumerate() {
        if let Some(payload) = attempt(transport, session, candidate, is_usable).await {
            tracing::info!(
                endpoint = %candidate.endpoint,
                attempt = attempted + 1,
                "timetable candidate succeeded"
            );
            return ChainOutcome::Success {
                candidate: candidate.clone(),
                payload,
            };
        }
    }

    tracing::warn!(attempted = candidates.len(), "all timetable candidates failed");
    ChainOutcome::AllFailed {
        attempted: candidates.len(),
    }
}
