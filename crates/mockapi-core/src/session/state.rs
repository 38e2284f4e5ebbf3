use serde::{Deserialize, Serialize};

/// The authenticated user as reported by `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    pub email: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Authentication state of the console.
///
/// Views gate protected content on this value only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    /// A token is held. The identity is filled in once `/users/me` answers.
    Authenticated(Option<UserIdentity>),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        match self {
            Self::Authenticated(identity) => identity.as_ref(),
            Self::Unauthenticated => None,
        }
    }
}
