use std::time::Duration;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;

mod auth;
mod batch;
mod config;
mod context;
mod envelope;
mod error;
mod extract;
mod http;
mod models;
mod report;
mod strategy;
mod timetable;

use auth::Credentials;
use config::{RunConfig, DEFAULT_DATE_BUDGET_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};
use report::Outcome;

#[derive(Parser)]
#[command(name = "edupage-timetable")]
#[command(about = "Weekly timetable extraction from an EduPage school portal", long_about = None)]
struct Cli {
    /// Portal login name
    #[arg(long, env = "EDUPAGE_USER")]
    username: String,
    /// Portal password
    #[arg(long, env = "EDUPAGE_PASSWORD", hide_env_values = true)]
    password: String,
    /// School subdomain, or the shared login host
    #[arg(long, env = "EDUPAGE_SUBDOMAIN", default_value = auth::SHARED_LOGIN)]
    subdomain: String,
    /// Any day of the wanted week (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<String>,
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,
    /// Upper bound on the time spent resolving a single date
    #[arg(long, default_value_t = DEFAULT_DATE_BUDGET_SECS)]
    date_budget_secs: u64,
    /// Serve every portal path from this origin instead of edupage.org
    #[arg(long, hide = true)]
    base_url: Option<Url>,
}

fn missing_credentials() -> Outcome {
    Outcome::InvalidInput("Missing credentials".to_string())
}

fn emit(outcome: Outcome) -> ! {
    let (document, code) = outcome.render();
    println!("{document}");
    std::process::exit(code);
}

async fn execute(cli: Cli) -> Outcome {
    if cli.username.trim().is_empty() || cli.password.is_empty() {
        return missing_credentials();
    }

    let target_date = match config::parse_target_date(cli.date.as_deref()) {
        Ok(date) => date,
        Err(err) => return Outcome::InvalidInput(err.to_string()),
    };

    let config = RunConfig {
        credentials: Credentials {
            username: cli.username,
            password: cli.password,
        },
        subdomain: cli.subdomain,
        base_url: cli.base_url,
        target_date,
        request_timeout: Duration::from_secs(cli.request_timeout_secs),
        date_budget: Duration::from_secs(cli.date_budget_secs),
    };

    let transport = match http::ReqwestTransport::new(config.request_timeout)
        .context("failed to build http client")
    {
        Ok(transport) => transport,
        Err(err) => return Outcome::Internal(err),
    };

    let outcome = Outcome::from(batch::run(&config, &transport).await);
    if let Outcome::Success(report) = &outcome {
        for (student, lessons) in report::lesson_counts(report) {
            tracing::info!(%student, lessons, "timetable extracted");
        }
    }
    outcome
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.kind() == ErrorKind::MissingRequiredArgument => emit(missing_credentials()),
        Err(err) => err.exit(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    emit(execute(cli).await);
}
