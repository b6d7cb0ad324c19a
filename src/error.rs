//! Unified client error model and normalization helpers.
//! Every failure the gateway, store or channel can produce is folded into this
//! one shape so pages only ever branch on the category and display `message`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientError {
    /// No token when one is required, bad credentials, or a session
    /// invalidated server-side (401/403).
    Auth { message: String, status: Option<u16> },
    /// Request could not complete, or the server answered with a status
    /// outside the validation range.
    Network { message: String, status: Option<u16> },
    /// Server rejected the payload; `message` is the server's text verbatim
    /// so forms can render it inline.
    Validation { message: String, status: Option<u16> },
    /// Operation not legal in the current session state (e.g. profile update
    /// while anonymous).
    State { message: String },
    /// Malformed response body or another condition that should not happen.
    Internal { message: String },
}

impl ClientError {
    pub fn message(&self) -> &str {
        match self {
            ClientError::Auth { message, .. }
            | ClientError::Network { message, .. }
            | ClientError::Validation { message, .. }
            | ClientError::State { message }
            | ClientError::Internal { message } => message.as_str(),
        }
    }

    /// HTTP status carried by the failure, when one exists.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Auth { status, .. }
            | ClientError::Network { status, .. }
            | ClientError::Validation { status, .. } => *status,
            ClientError::State { .. } | ClientError::Internal { .. } => None,
        }
    }

    pub fn auth<S: Into<String>>(msg: S) -> Self { ClientError::Auth { message: msg.into(), status: None } }
    pub fn auth_status<S: Into<String>>(msg: S, status: u16) -> Self { ClientError::Auth { message: msg.into(), status: Some(status) } }
    pub fn network<S: Into<String>>(msg: S) -> Self { ClientError::Network { message: msg.into(), status: None } }
    pub fn network_status<S: Into<String>>(msg: S, status: u16) -> Self { ClientError::Network { message: msg.into(), status: Some(status) } }
    pub fn validation<S: Into<String>>(msg: S) -> Self { ClientError::Validation { message: msg.into(), status: None } }
    pub fn validation_status<S: Into<String>>(msg: S, status: u16) -> Self { ClientError::Validation { message: msg.into(), status: Some(status) } }
    pub fn state<S: Into<String>>(msg: S) -> Self { ClientError::State { message: msg.into() } }
    pub fn internal<S: Into<String>>(msg: S) -> Self { ClientError::Internal { message: msg.into() } }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth { .. })
    }

    /// True when the server explicitly told us the session is dead.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Auth { status: Some(401), .. })
    }

    /// Map a non-2xx status plus the server's `{"error": ...}` text into the
    /// right category. The gateway is the only caller.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ClientError::Auth { message, status: Some(status) },
            400 | 404 | 409 | 422 => ClientError::Validation { message, status: Some(status) },
            _ => ClientError::Network { message, status: Some(status) },
        }
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ClientError {}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_category_mapping() {
        assert!(ClientError::from_status(401, "expired".into()).is_unauthorized());
        assert!(ClientError::from_status(403, "forbidden".into()).is_auth());
        assert!(matches!(ClientError::from_status(400, "bad".into()), ClientError::Validation { .. }));
        assert!(matches!(ClientError::from_status(409, "dup".into()), ClientError::Validation { .. }));
        assert!(matches!(ClientError::from_status(500, "boom".into()), ClientError::Network { status: Some(500), .. }));
    }

    #[test]
    fn message_and_status_accessors() {
        let e = ClientError::validation_status("title required", 400);
        assert_eq!(e.message(), "title required");
        assert_eq!(e.status_code(), Some(400));
        assert_eq!(e.to_string(), "title required");

        let e = ClientError::state("no active session");
        assert_eq!(e.status_code(), None);
        assert!(!e.is_auth());
    }

    #[test]
    fn failed_login_is_auth_but_not_forced_logout_shape() {
        // A 401 carries the status; a locally-raised missing-token error does not.
        assert!(ClientError::auth("authentication token not found").status_code().is_none());
        assert!(!ClientError::auth("authentication token not found").is_unauthorized());
        assert!(ClientError::auth_status("invalid credentials", 401).is_unauthorized());
    }
}
