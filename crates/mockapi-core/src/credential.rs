//! Bearer credential domain model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque bearer token issued by the credential exchange endpoint.
///
/// The `Debug` impl never prints the token itself.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the outbound `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<redacted, {} chars>)", self.0.len())
    }
}

/// The current credential: a token, or nothing (unauthenticated).
pub type Credential = Option<AccessToken>;

/// Successful body of `POST /token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: AccessToken,
    #[serde(default)]
    pub token_type: Option<String>,
}
