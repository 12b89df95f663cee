use chrono::NaiveDate;

use crate::auth::{self, LoginOutcome};
use crate::config::{school_week, RunConfig};
use crate::context;
use crate::error::AuthError;
use crate::http::PortalTransport;
use crate::models::{ResolvedLessonEntry, RunReport, Session, StudentProfile, StudentReport};
use crate::strategy::{self, ChainOutcome};
use crate::timetable::{self, TimetableData};

/// Linked children, or the account itself when the portal listed none.
fn profiles_to_fetch(session: &Session) -> Vec<StudentProfile> {
    if !session.students.is_empty() {
        return session.students.clone();
    }
    tracing::warn!("no linked student profiles found, using the account itself");
    vec![StudentProfile::new(session.user_id.clone(), "Myself")]
}

pub async fn fetch_day(
    transport: &dyn PortalTransport,
    session: &mut Session,
    student: &StudentProfile,
    date: NaiveDate,
    budget: std::time::Duration,
) -> Vec<ResolvedLessonEntry> {
    let candidates = strategy::timetable_candidates(student, date);
    let chain = strategy::try_strategies(transport, session, &candidates, &timetable::has_tables);

    let outcome = match tokio::time::timeout(budget, chain).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(%date, student = %student.name, "time budget exhausted for date");
            return Vec::new();
        }
    };

    match outcome {
        ChainOutcome::Success { payload, .. } => match TimetableData::from_payload(&payload) {
            Some(data) => data.resolve(date, student),
            None => Vec::new(),
        },
        ChainOutcome::AllFailed { .. } => {
            tracing::info!(%date, student = %student.name, "no timetable data for date");
            Vec::new()
        }
    }
}

async fn fetch_student(
    transport: &dyn PortalTransport,
    session: &mut Session,
    student: &StudentProfile,
    dates: &[NaiveDate],
    budget: std::time::Duration,
) -> StudentReport {
    tracing::info!(student = %student.name, "fetching timetable");
    context::switch_to(transport, session, student).await;

    let mut lessons = Vec::new();
    for date in dates {
        lessons.extend(fetch_day(transport, session, student, *date, budget).await);
    }

    context::switch_back(transport, session).await;

    // Profiles without a ", <class>" suffix take the class their lessons name.
    let class_name = student
        .class_label
        .clone()
        .or_else(|| {
            lessons
                .iter()
                .map(|lesson| lesson.class.name.clone())
                .find(|name| !name.is_empty())
        })
        .unwrap_or_default();

    StudentReport {
        student_id: student.id.clone(),
        name: student.name.clone(),
        class_name,
        timetable: lessons,
        homework: Vec::new(),
        grades: Vec::new(),
        messages: Vec::new(),
    }
}

pub async fn run(
    config: &RunConfig,
    transport: &dyn PortalTransport,
) -> Result<RunReport, AuthError> {
    let outcome = auth::authenticate(
        transport,
        &config.credentials,
        &config.subdomain,
        config.base_url.as_ref(),
    )
    .await?;

    let mut session = match outcome {
        LoginOutcome::Authenticated(session) => session,
        LoginOutcome::TwoFactor(challenge) => {
            tracing::warn!(subdomain = %challenge.subdomain, "account requires two-factor login");
            return Err(AuthError::TwoFactorRequired);
        }
    };

    let (week_start, week_dates) = school_week(config.target_date);
    let mut students = Vec::new();
    for student in profiles_to_fetch(&session) {
        let report =
            fetch_student(transport, &mut session, &student, &week_dates, config.date_budget).await;
        students.push(report);
    }

    Ok(RunReport {
        students,
        week_start,
        week_dates,
    })
}
