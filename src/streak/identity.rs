//! Authenticated identity marker

/// Opaque access token of an authenticated user session
#[derive(Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    /// Wrap a token. Blank tokens mean "not signed in" and yield `None`.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

// Tokens must never end up in logs
impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Identity(<redacted>)")
    }
}
