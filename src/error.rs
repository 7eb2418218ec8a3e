use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Timeout,
    /// Login page did not carry the hidden `token` input.
    TokenNotFound,
    NoSessionCookie,
    /// Portal re-rendered the login form after the credential POST.
    LoginRejected,
    /// Portal kept rejecting the session after the re-authentication retry.
    SessionRejected,
    Status(u16),
    Schema(String),
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Timeout => write!(f, "request timed out"),
            Error::TokenNotFound => write!(f, "login token not found on portal page"),
            Error::NoSessionCookie => write!(f, "portal did not issue a session cookie"),
            Error::LoginRejected => write!(f, "login rejected by portal"),
            Error::SessionRejected => write!(f, "session rejected after re-authentication"),
            Error::Status(code) => write!(f, "unexpected HTTP status {code}"),
            Error::Schema(msg) => write!(f, "schema error: {msg}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::Http(e)
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
