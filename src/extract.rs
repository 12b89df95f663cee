use regex::Regex;

use crate::models::StudentProfile;

pub type Heuristic = (&'static str, fn(&str) -> Option<String>);

/// Runs `ladder` top to bottom and returns the winning heuristic name and value.
pub fn first_match(ladder: &[Heuristic], body: &str) -> Option<(&'static str, String)> {
    ladder.iter().find_map(|(name, heuristic)| {
        let value = heuristic(body)?;
        tracing::debug!(heuristic = name, "extraction heuristic matched");
        Some((*name, value))
    })
}

fn capture(pattern: &str, body: &str) -> Option<String> {
    let re = Regex::new(pattern).expect("valid regex");
    re.captures(body)?
        .get(1)
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
}

fn literal_after(body: &str, marker: &str) -> Option<String> {
    let (_, rest) = body.split_once(marker)?;
    let value = rest.split('"').next()?;
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// Login page anti-forgery token.

fn csrftoken_literal(body: &str) -> Option<String> {
    literal_after(body, "\"csrftoken\":\"")
}

fn csrftoken_pattern(body: &str) -> Option<String> {
    capture(r#""csrftoken"\s*:\s*"([^"]+)""#, body)
}

fn csrfauth_form_field(body: &str) -> Option<String> {
    capture(
        r#"name\s*=\s*["']csrfauth["'][^>]*?value\s*=\s*["']([^"']+)["']"#,
        body,
    )
}

pub const LOGIN_TOKEN_LADDER: &[Heuristic] = &[
    ("csrftoken_literal", csrftoken_literal),
    ("csrftoken_pattern", csrftoken_pattern),
    ("csrfauth_form_field", csrfauth_form_field),
];

// Session hash, oldest server format last.

fn gsh_assignment(body: &str) -> Option<String> {
    capture(r#"\bgsh\s*[:=]\s*["']([^"']+)["']"#, body)
}

fn gsh_json_key(body: &str) -> Option<String> {
    capture(r#""gsh"\s*:\s*"([^"]+)""#, body)
}

fn school_gsh(body: &str) -> Option<String> {
    capture(r#""school_gsh"\s*:\s*"([0-9a-fA-F]+)""#, body)
}

fn asc_gsechash(body: &str) -> Option<String> {
    capture(r#"ASC\.gsechash\s*=\s*["']([^"']+)["']"#, body)
}

fn gsechash_assignment(body: &str) -> Option<String> {
    capture(r#"gsechash\s*[:=]\s*["']([^"']+)["']"#, body)
}

pub const SESSION_HASH_LADDER: &[Heuristic] = &[
    ("gsh_assignment", gsh_assignment),
    ("gsh_json_key", gsh_json_key),
    ("school_gsh", school_gsh),
    ("asc_gsechash", asc_gsechash),
    ("gsechash_assignment", gsechash_assignment),
];

pub fn session_hash(body: &str) -> Option<String> {
    first_match(SESSION_HASH_LADDER, body).map(|(_, value)| value)
}

/// Hidden `<input name="..." value="...">` on the two-factor page, literal first.
pub fn form_field(body: &str, field: &str) -> Option<String> {
    literal_after(body, &format!("name=\"{field}\" value=\""))
        .or_else(|| {
            capture(
                &format!(
                    r#"name\s*=\s*["']{}["'][^>]*?value\s*=\s*["']([^"']*)["']"#,
                    regex::escape(field)
                ),
                body,
            )
        })
}

pub fn user_id(body: &str) -> Option<String> {
    capture(r#""userid"\s*:\s*"([^"]+)""#, body)
}

/// Shared-login responses open with a comment naming the school's subdomain.
pub fn school_subdomain(body: &str) -> Option<String> {
    let (head, _) = body.split_once("-->")?;
    let candidate = head.split_whitespace().last()?;
    let valid = !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    valid.then(|| candidate.to_string())
}

/// Linked child profiles from the profile switcher, de-duplicated by id.
pub fn student_profiles(body: &str) -> Vec<StudentProfile> {
    let re = Regex::new(
        r#"(?s)class="[^"]*edubarProfileChildBtn[^"]*"[^>]*data-sid="([^"]+)"[^>]*>.*?<span class="userName">([^<]+)</span>"#,
    )
    .expect("valid regex");

    let mut profiles: Vec<StudentProfile> = Vec::new();
    for cap in re.captures_iter(body) {
        let id = cap[1].to_string();
        if profiles.iter().any(|p| p.id.as_deref() == Some(id.as_str())) {
            continue;
        }
        profiles.push(StudentProfile::new(Some(id), &cap[2]));
    }
    profiles
}
