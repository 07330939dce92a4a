//! Error types for the session clock and streak synchronization

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the session clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClockError {
    /// A tick arrived while the clock was paused
    #[error("tick invoked while the session clock is not running")]
    SchedulerMisuse,
}

/// Errors returned by a remote counter service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The counter resource is missing, misconfigured or unreachable
    #[error("counter service unavailable: {0}")]
    Unavailable(String),

    /// The request reached the service but was refused
    #[error("counter service rejected the request: {0}")]
    Rejected(String),
}

/// Streak synchronization errors surfaced to consumers
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SyncError {
    /// No identity is available, or it changed while a request was in
    /// flight. This is a resting state and never stored as a status error.
    #[error("no authenticated identity")]
    Unauthenticated,

    #[error("streak counter unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("streak update failed: {0}")]
    RemoteRejected(String),
}

impl SyncError {
    /// Guidance to show the user when the error needs manual setup
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            SyncError::RemoteUnavailable(_) => Some(
                "The streak counter could not be found. Run the streak setup SQL \
                 (the `streaks` table and the `handle_streak_increment` function) \
                 in your database, then reload the API schema and reload the streak.",
            ),
            _ => None,
        }
    }
}

impl From<RemoteError> for SyncError {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::Unavailable(message) => SyncError::RemoteUnavailable(message),
            RemoteError::Rejected(message) => SyncError::RemoteRejected(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_errors_map_onto_sync_errors() {
        let unavailable: SyncError = RemoteError::Unavailable("no table".into()).into();
        assert_eq!(unavailable, SyncError::RemoteUnavailable("no table".into()));

        let rejected: SyncError = RemoteError::Rejected("HTTP 500".into()).into();
        assert_eq!(rejected, SyncError::RemoteRejected("HTTP 500".into()));
    }

    #[test]
    fn only_unavailable_carries_remediation() {
        assert!(SyncError::RemoteUnavailable("x".into()).remediation().is_some());
        assert!(SyncError::RemoteRejected("x".into()).remediation().is_none());
        assert!(SyncError::Unauthenticated.remediation().is_none());
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(SyncError::RemoteRejected("HTTP 503".into())).unwrap();
        assert_eq!(json["kind"], "remote_rejected");
        assert_eq!(json["message"], "HTTP 503");
    }
}
