use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::fmt::{self, Display, Formatter};
use std::io;

/// Every failure the session/transport core can surface. Feature modules
/// match on specific variants to branch their logic; nothing in the core
/// retries automatically. Variants carry the raw response where one exists
/// so a failed run can be diagnosed post-mortem.
#[derive(Debug)]
pub enum OkToolsError {
    /// Non-2xx terminal HTTP status.
    Transport {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },
    Network(reqwest::Error),
    Io(io::Error),
    Json(serde_json::Error),
    /// Account blocked or frozen by the provider. `verification_url` is set
    /// when the provider offered an unfreeze/verification flow.
    Blocked {
        account: String,
        details: String,
        verification_url: Option<String>,
    },
    /// Credentials rejected. Not worth retrying with the same pair.
    Unauthorized { account: String, details: String },
    /// Captcha challenge in the body, regardless of HTTP status.
    Captcha { account: String, body: String },
    /// Login failed without matching any known marker.
    LoginFailed { account: String, details: String },
    /// An expected page element or JSON field was absent. Usually means the
    /// provider changed markup or schema.
    ItemNotFound { details: String, body: String },
    /// The provider forbids this action for the current relationship/state.
    NotPermitted { details: String },
    Config(String),
}

pub type Result<T> = std::result::Result<T, OkToolsError>;

impl Display for OkToolsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OkToolsError::Transport { status, body, .. } => {
                write!(f, "transport failure: status {status}, body: {body}")
            }
            OkToolsError::Network(e) => write!(f, "network error: {e}"),
            OkToolsError::Io(e) => write!(f, "io error: {e}"),
            OkToolsError::Json(e) => write!(f, "json error: {e}"),
            OkToolsError::Blocked {
                account,
                details,
                verification_url,
            } => match verification_url {
                Some(url) => write!(f, "account {account} blocked: {details} (verify at {url})"),
                None => write!(f, "account {account} blocked: {details}"),
            },
            OkToolsError::Unauthorized { account, details } => {
                write!(f, "account {account} unauthorized: {details}")
            }
            OkToolsError::Captcha { account, .. } => {
                write!(f, "captcha challenge shown to account {account}")
            }
            OkToolsError::LoginFailed { account, details } => {
                write!(f, "login failed for account {account}: {details}")
            }
            OkToolsError::ItemNotFound { details, .. } => {
                write!(f, "expected item not found: {details}")
            }
            OkToolsError::NotPermitted { details } => write!(f, "not permitted: {details}"),
            OkToolsError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for OkToolsError {}

impl From<reqwest::Error> for OkToolsError {
    fn from(e: reqwest::Error) -> Self {
        OkToolsError::Network(e)
    }
}

impl From<io::Error> for OkToolsError {
    fn from(e: io::Error) -> Self {
        OkToolsError::Io(e)
    }
}

impl From<serde_json::Error> for OkToolsError {
    fn from(e: serde_json::Error) -> Self {
        OkToolsError::Json(e)
    }
}
