//! Session data read from the external auth provider.

use serde::{Deserialize, Serialize};

/// An authenticated user's session.
///
/// The token is kept for the lifetime of the request and never serialized.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Avatar URL.
    pub image: Option<String>,
    #[serde(skip)]
    pub token: String,
}

impl Session {
    /// First letter of the user's name, upper-cased, or `U`.
    pub fn initial(&self) -> String {
        self.name
            .as_deref()
            .and_then(|name| name.chars().next())
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_else(|| "U".to_string())
    }
}

/// Whether a request carries a session. Absence is an expected state with its
/// own sign-in prompt, not an error.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    Authenticated { user: Session },
    Anonymous { prompt: String },
}

impl SessionState {
    pub fn from_session(session: Option<Session>, prompt: &str) -> Self {
        match session {
            Some(user) => SessionState::Authenticated { user },
            None => SessionState::Anonymous {
                prompt: prompt.to_string(),
            },
        }
    }
}
