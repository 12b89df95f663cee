use thiserror::Error;

/// Failures of the login phase. Every variant ends the run.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Wrong username or password")]
    InvalidCredentials,

    #[error("Captcha required - login manually first")]
    CaptchaRequired,

    #[error("2FA Required - Not supported in Kiosk mode. Please disable 2FA for this account.")]
    TwoFactorRequired,

    #[error("Network error during login: {0}")]
    Network(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("could not read response from {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("http client setup failed: {0}")]
    Setup(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("response body is empty")]
    EmptyBody,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("unrecognized envelope starting with {0:?}")]
    Unrecognized(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid date format. Use YYYY-MM-DD")]
    InvalidDate,
}
