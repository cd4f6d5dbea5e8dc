use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Holds a bearer token along with expiration information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(value: &str, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            value: value.to_string(),
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        if let Some(expiration) = &self.expires_at {
            Utc::now() > *expiration
        } else {
            false
        }
    }
}

/// Outcome of a remote introspection call.
///
/// `expires_in` is only populated when the remote side reported a
/// concrete expiry that lies in the future.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub valid: bool,
    pub expires_in: Option<i64>,
}

impl Validation {
    pub fn invalid() -> Self {
        Validation {
            valid: false,
            expires_in: None,
        }
    }
}
