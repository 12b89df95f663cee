use std::time::Duration;

use chrono::{Datelike, Duration as Days, NaiveDate, Utc};
use url::Url;

use crate::auth::Credentials;
use crate::error::ConfigError;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_DATE_BUDGET_SECS: u64 = 45;

/// Everything one run needs; built from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub credentials: Credentials,
    pub subdomain: String,
    pub base_url: Option<Url>,
    pub target_date: NaiveDate,
    pub request_timeout: Duration,
    pub date_budget: Duration,
}

pub fn parse_target_date(raw: Option<&str>) -> Result<NaiveDate, ConfigError> {
    match raw {
        Some(value) => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|_| ConfigError::InvalidDate),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Monday of `target`'s week and the five school days starting there.
pub fn school_week(target: NaiveDate) -> (NaiveDate, Vec<NaiveDate>) {
    let start = target - Days::days(target.weekday().num_days_from_monday() as i64);
    let days = (0..5).map(|offset| start + Days::days(offset)).collect();
    (start, days)
}
