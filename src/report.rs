use serde::Serialize;
use serde_json::{json, Value};

use crate::error::AuthError;
use crate::models::RunReport;

#[derive(Debug)]
pub enum Outcome {
    Success(RunReport),
    Rejected(AuthError),
    InvalidInput(String),
    Internal(anyhow::Error),
}

impl From<Result<RunReport, AuthError>> for Outcome {
    fn from(result: Result<RunReport, AuthError>) -> Self {
        match result {
            Ok(report) => Outcome::Success(report),
            Err(err) => Outcome::Rejected(err),
        }
    }
}

fn internal_error(err: impl std::fmt::Display + std::fmt::Debug) -> Value {
    json!({
        "error": format!("Internal Error: {err}"),
        "traceback": format!("{err:?}"),
    })
}

fn serialized<T: Serialize>(report: &T) -> (Value, i32) {
    match serde_json::to_value(report) {
        Ok(document) => (document, 0),
        Err(err) => (internal_error(err), 1),
    }
}

impl Outcome {
    pub fn render(&self) -> (Value, i32) {
        match self {
            Outcome::Success(report) => serialized(report),
            Outcome::Rejected(err) => (json!({ "error": err.to_string() }), 1),
            Outcome::InvalidInput(message) => (json!({ "error": message }), 1),
            Outcome::Internal(err) => (internal_error(err), 1),
        }
    }

    pub fn document(&self) -> Value {
        self.render().0
    }

    pub fn exit_code(&self) -> i32 {
        self.render().1
    }
}

pub fn lesson_counts(report: &RunReport) -> Vec<(String, usize)> {
    report
        .students
        .iter()
        .map(|student| (student.name.clone(), student.timetable.len()))
        .collect()
}
