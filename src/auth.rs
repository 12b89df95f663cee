use std::fmt;

use serde_json::Value;
use url::Url;

use crate::envelope::{self, ENCODING_MARKER};
use crate::error::AuthError;
use crate::extract::{self, LOGIN_TOKEN_LADDER};
use crate::http::{portal_base, PortalTransport};
use crate::models::{Session, TwoFactorChallenge};

/// Subdomain of the portal-wide login, which redirects to the school's own.
pub const SHARED_LOGIN: &str = "login1";

const CAPTCHA_MARKERS: &[&str] = &["cap=1", "lerr=b43b43"];
const BAD_CREDENTIALS_MARKER: &str = "bad=1";
const TWO_FACTOR_MARKER: &str = "twofactor";

/// Pages that carry the session hash when the login response did not.
const HASH_FALLBACK_PAGES: &[&str] = &["user/", "dashboard", ""];

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(Session),
    TwoFactor(TwoFactorChallenge),
}

fn check_rejection(final_url: &str) -> Result<(), AuthError> {
    if CAPTCHA_MARKERS.iter().any(|marker| final_url.contains(marker)) {
        tracing::warn!("login rejected: captcha required");
        return Err(AuthError::CaptchaRequired);
    }
    if final_url.contains(BAD_CREDENTIALS_MARKER) {
        tracing::warn!("login rejected: bad credentials");
        return Err(AuthError::InvalidCredentials);
    }
    Ok(())
}

/// Text to scrape from the login response, plus a hash carried in its JSON form.
fn login_markup(body: &str) -> (String, Option<String>) {
    let Some(encoded) = body.trim().strip_prefix(ENCODING_MARKER) else {
        return (body.to_string(), None);
    };

    match envelope::unwrap_marker(encoded) {
        Ok(text) => {
            let hash = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|json| json.get("gsh")?.as_str().map(str::to_string));
            (text, hash)
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not decode encoded login response");
            (body.to_string(), None)
        }
    }
}

async fn two_factor_challenge(
    transport: &dyn PortalTransport,
    subdomain: &str,
    base: &str,
) -> Result<TwoFactorChallenge, AuthError> {
    tracing::info!("two-factor confirmation requested by portal");
    let page = transport
        .get(&format!("{base}/login/twofactor?sn=1"))
        .await?;

    let field = |name: &str| extract::form_field(&page.body, name).unwrap_or_default();
    Ok(TwoFactorChallenge {
        subdomain: subdomain.to_string(),
        csrf_token: field("csrfauth"),
        authentication_token: field("au"),
        authentication_endpoint: field("gu"),
    })
}

/// Retries hash extraction on the known post-login pages. Never fails.
async fn discover_hash_elsewhere(transport: &dyn PortalTransport, session: &mut Session) {
    for page in HASH_FALLBACK_PAGES {
        let url = session.endpoint(page);
        let response = match transport.get(&url).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::debug!(%url, status = response.status, "hash fallback page unavailable");
                continue;
            }
            Err(e) => {
                tracing::debug!(%url, error = %e, "hash fallback page failed");
                continue;
            }
        };

        if let Some(hash) = extract::session_hash(&response.body) {
            tracing::info!(%url, "session hash found on fallback page");
            session.refresh_hash(&hash);
            if session.students.is_empty() {
                session.register_students(extract::student_profiles(&response.body));
            }
            if session.user_id.is_none() {
                session.user_id = extract::user_id(&response.body);
            }
            return;
        }
    }
}

pub async fn authenticate(
    transport: &dyn PortalTransport,
    credentials: &Credentials,
    subdomain: &str,
    base_override: Option<&Url>,
) -> Result<LoginOutcome, AuthError> {
    let base = portal_base(subdomain, base_override);
    tracing::info!(%subdomain, "logging in");

    let login_page = transport
        .get(&format!("{base}/login/?cmd=MainLogin"))
        .await?;
    let csrf_token = match extract::first_match(LOGIN_TOKEN_LADDER, &login_page.body) {
        Some((heuristic, token)) => {
            tracing::debug!(heuristic, "anti-forgery token found");
            token
        }
        None => {
            tracing::warn!("no anti-forgery token on login page, submitting without one");
            String::new()
        }
    };

    let fields = vec![
        ("csrfauth".to_string(), csrf_token.clone()),
        ("username".to_string(), credentials.username.clone()),
        ("password".to_string(), credentials.password.clone()),
    ];
    let response = transport
        .post_form(&format!("{base}/login/edubarLogin.php"), &fields)
        .await?;
    check_rejection(&response.final_url)?;

    let (markup, embedded_hash) = login_markup(&response.body);

    let mut subdomain = subdomain.to_string();
    if subdomain == SHARED_LOGIN {
        if let Some(school) = extract::school_subdomain(&markup) {
            tracing::info!(%school, "shared login resolved to school portal");
            subdomain = school;
        }
    }
    let base = portal_base(&subdomain, base_override);

    if response.final_url.contains(TWO_FACTOR_MARKER) {
        let challenge = two_factor_challenge(transport, &subdomain, &base).await?;
        return Ok(LoginOutcome::TwoFactor(challenge));
    }

    let mut session = Session::new(&subdomain, &base, csrf_token);
    session.user_id = extract::user_id(&markup);
    session.register_students(extract::student_profiles(&markup));

    match embedded_hash.or_else(|| extract::session_hash(&markup)) {
        Some(hash) => {
            session.refresh_hash(&hash);
        }
        None => discover_hash_elsewhere(transport, &mut session).await,
    }

    if session.gsh.is_empty() {
        tracing::warn!("session hash not found, continuing with a degraded session");
        session.set_degraded();
    }

    tracing::info!(
        subdomain = %session.subdomain,
        students = session.students.len(),
        anti_forgery_token = !session.csrf_token.is_empty(),
        degraded = session.is_degraded(),
        "login complete"
    );
    Ok(LoginOutcome::Authenticated(session))
}
