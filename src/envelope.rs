use base64::Engine;
use regex::Regex;
use serde_json::Value;

use crate::error::DecodeError;

pub const ENCODING_MARKER: &str = "eqz:";
pub const RESULT_KEY: &str = "r";
pub const ERROR_KEY: &str = "e";

#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Payload(Value),
    /// The portal answered, but with an application error or no data.
    Empty { reason: Option<String> },
}

pub fn decode(raw: &str) -> Result<Decoded, DecodeError> {
    let body = raw.trim();
    if body.is_empty() {
        return Err(DecodeError::EmptyBody);
    }

    let text = match body.strip_prefix(ENCODING_MARKER) {
        Some(encoded) => unwrap_marker(encoded)?,
        None => body.to_string(),
    };

    let value = parse_json_or_callback(&text)?;
    Ok(classify(value))
}

/// Base64 payload behind the `eqz:` marker, as text.
pub fn unwrap_marker(encoded: &str) -> Result<String, DecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
    Ok(String::from_utf8(bytes)?)
}

fn parse_json_or_callback(text: &str) -> Result<Value, DecodeError> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    let re = Regex::new(r"(?s)^\s*[A-Za-z_$][\w$.]*\s*\((.*)\)\s*;?\s*$").expect("valid regex");
    if let Some(inner) = re.captures(text).and_then(|cap| cap.get(1)) {
        if let Ok(value) = serde_json::from_str::<Value>(inner.as_str()) {
            return Ok(value);
        }
    }

    let snippet: String = text.chars().take(40).collect();
    Err(DecodeError::Unrecognized(snippet))
}

fn error_reason(value: &Value) -> Option<Option<String>> {
    let error = value.as_object()?.get(ERROR_KEY)?;
    Some(match error {
        Value::String(message) => Some(message.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

fn classify(value: Value) -> Decoded {
    if let Some(reason) = error_reason(&value) {
        tracing::warn!(reason = ?reason, "portal reported an application error");
        return Decoded::Empty { reason };
    }

    let inner = match value {
        Value::Object(mut map) if map.contains_key(RESULT_KEY) => {
            map.remove(RESULT_KEY).unwrap_or(Value::Null)
        }
        other => other,
    };

    if let Some(reason) = error_reason(&inner) {
        tracing::warn!(reason = ?reason, "portal reported an application error");
        return Decoded::Empty { reason };
    }

    match &inner {
        Value::Null => Decoded::Empty { reason: None },
        Value::Array(items) if items.is_empty() => Decoded::Empty { reason: None },
        _ => Decoded::Payload(inner),
    }
}
